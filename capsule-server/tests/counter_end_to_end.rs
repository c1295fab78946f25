use std::net::TcpStream;
use std::sync::Arc;

use capsule_codec::SyncTransport;
use capsule_server::builtin::Counter;
use capsule_server::value::ServerValue;
use capsule_server::ObjectTable;
use capsule_types::{Capsule, Command, EvaluateVariant, OperatorVariant, Response};
use tokio::net::TcpListener;

async fn spawn_server() -> std::net::SocketAddr {
    let table = Arc::new(ObjectTable::new());
    table.export("counter", ServerValue::object(Counter::new(20)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (socket, _) = listener.accept().await.unwrap();
            let table = Arc::clone(&table);
            tokio::spawn(async move { capsule_server::handle_connection(socket, table).await });
        }
    });
    addr
}

fn request(stream: &mut TcpStream, command: Command) -> Response {
    stream.send_message(&command.to_value()).unwrap();
    Response::from_value(&stream.recv_message().unwrap().unwrap()).unwrap()
}

#[tokio::test]
async fn attribute_read_write_and_method_call_round_trip() {
    let addr = spawn_server().await;
    let mut stream = TcpStream::connect(addr).unwrap();

    let Response::Handle { id: counter } = request(&mut stream, Command::Fetch { name: "counter".into() }) else {
        panic!("expected handle response");
    };

    let Response::Handle { id: value_attr } =
        request(&mut stream, Command::AttributeGet { id: counter, name: Capsule::string("value") })
    else {
        panic!("expected handle response");
    };
    let evaluated = request(&mut stream, Command::Evaluate { id: value_attr, variant: EvaluateVariant::Int });
    assert_eq!(evaluated, Response::Evaluation { data: Capsule::integer(20), variant: EvaluateVariant::Int });

    let set_response = request(
        &mut stream,
        Command::AttributeSet { id: counter, name: Capsule::string("value"), value: Capsule::integer(99) },
    );
    assert_eq!(set_response, Response::Empty);

    let Response::Handle { id: method } =
        request(&mut stream, Command::AttributeGet { id: counter, name: Capsule::string("method") })
    else {
        panic!("expected handle response");
    };
    let called = request(&mut stream, Command::Execute { id: method, args: Capsule::tuple(vec![Capsule::integer(1)]), kwargs: Capsule::dictionary(vec![]) });
    let Response::Handle { id: result } = called else { panic!("expected handle response") };
    let evaluated = request(&mut stream, Command::Evaluate { id: result, variant: EvaluateVariant::Int });
    assert_eq!(evaluated, Response::Evaluation { data: Capsule::integer(100), variant: EvaluateVariant::Int });
}

#[tokio::test]
async fn two_stores_of_the_same_value_compare_equal() {
    let addr = spawn_server().await;
    let mut stream = TcpStream::connect(addr).unwrap();

    let Response::Handle { id: first } = request(&mut stream, Command::Store { data: Capsule::integer(20) }) else {
        panic!("expected handle response");
    };
    let Response::Handle { id: second } = request(&mut stream, Command::Store { data: Capsule::integer(20) }) else {
        panic!("expected handle response");
    };
    let equal = request(
        &mut stream,
        Command::Operator { id: first, other: Capsule::Handle(second), variant: OperatorVariant::Equals.as_str().to_string() },
    );
    let Response::Handle { id: result } = equal else { panic!("expected handle response") };
    let evaluated = request(&mut stream, Command::Evaluate { id: result, variant: EvaluateVariant::Bool });
    assert_eq!(evaluated, Response::Evaluation { data: Capsule::boolean(true), variant: EvaluateVariant::Bool });
}

#[tokio::test]
async fn concurrent_method_calls_never_lose_an_increment() {
    let addr = spawn_server().await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            tokio::task::spawn_blocking(move || {
                let mut stream = TcpStream::connect(addr).unwrap();
                let Response::Handle { id: counter } =
                    request(&mut stream, Command::Fetch { name: "counter".into() })
                else {
                    panic!("expected handle response");
                };
                let Response::Handle { id: method } =
                    request(&mut stream, Command::AttributeGet { id: counter, name: Capsule::string("method") })
                else {
                    panic!("expected handle response");
                };
                for _ in 0..10 {
                    let response = request(
                        &mut stream,
                        Command::Execute {
                            id: method,
                            args: Capsule::tuple(vec![Capsule::integer(1)]),
                            kwargs: Capsule::dictionary(vec![]),
                        },
                    );
                    assert!(matches!(response, Response::Handle { .. }));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let mut stream = TcpStream::connect(addr).unwrap();
    let Response::Handle { id: counter } = request(&mut stream, Command::Fetch { name: "counter".into() }) else {
        panic!("expected handle response");
    };
    let Response::Handle { id: value_attr } =
        request(&mut stream, Command::AttributeGet { id: counter, name: Capsule::string("value") })
    else {
        panic!("expected handle response");
    };
    let evaluated = request(&mut stream, Command::Evaluate { id: value_attr, variant: EvaluateVariant::Int });
    assert_eq!(evaluated, Response::Evaluation { data: Capsule::integer(100), variant: EvaluateVariant::Int });
}

#[tokio::test]
async fn missing_attribute_is_an_attribute_error() {
    let addr = spawn_server().await;
    let mut stream = TcpStream::connect(addr).unwrap();

    let Response::Handle { id: counter } = request(&mut stream, Command::Fetch { name: "counter".into() }) else {
        panic!("expected handle response");
    };
    let response =
        request(&mut stream, Command::AttributeGet { id: counter, name: Capsule::string("does-not-exist") });
    assert!(matches!(response, Response::ErrorAttribute { .. }));
}

#[tokio::test]
async fn calling_a_method_with_the_wrong_arity_is_an_execution_error() {
    let addr = spawn_server().await;
    let mut stream = TcpStream::connect(addr).unwrap();

    let Response::Handle { id: counter } = request(&mut stream, Command::Fetch { name: "counter".into() }) else {
        panic!("expected handle response");
    };
    let Response::Handle { id: method } =
        request(&mut stream, Command::AttributeGet { id: counter, name: Capsule::string("method") })
    else {
        panic!("expected handle response");
    };
    let response = request(
        &mut stream,
        Command::Execute { id: method, args: Capsule::tuple(vec![]), kwargs: Capsule::dictionary(vec![]) },
    );
    assert!(matches!(response, Response::ErrorExecution { .. }));
}

#[tokio::test]
async fn release_then_use_is_an_access_error() {
    let addr = spawn_server().await;
    let mut stream = TcpStream::connect(addr).unwrap();

    let Response::Handle { id } = request(&mut stream, Command::Store { data: Capsule::integer(1) }) else {
        panic!("expected handle response");
    };
    assert_eq!(request(&mut stream, Command::Release { id }), Response::Empty);
    let response = request(&mut stream, Command::Evaluate { id, variant: EvaluateVariant::Int });
    assert!(matches!(response, Response::ErrorAccess { .. }));
}
