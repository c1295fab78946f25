use std::net::TcpStream;
use std::sync::Arc;

use capsule_client::ClientProxy;
use capsule_server::builtin::Counter;
use capsule_server::value::ServerValue;
use capsule_server::ObjectTable;
use capsule_types::{Capsule, ClientError};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

fn spawn_server() -> (std::net::SocketAddr, Runtime) {
    let runtime = Runtime::new().unwrap();
    let addr = runtime.block_on(async {
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
    });
    (addr, runtime)
}

#[test]
fn fetch_read_attribute_and_call_method_through_the_transparent_proxy() {
    let (addr, _runtime) = spawn_server();
    let stream = TcpStream::connect(addr).unwrap();
    let proxy = ClientProxy::new(stream);

    let counter = proxy.fetch("counter").unwrap();
    assert_eq!(counter.get_attr("value").unwrap().as_int().unwrap(), 20);

    counter.set_attr("value", 99i64).unwrap();
    assert_eq!(counter.get_attr("value").unwrap().as_int().unwrap(), 99);

    let method = counter.get_attr("method").unwrap();
    let result = method.call([Capsule::integer(1)], Vec::<(String, Capsule)>::new()).unwrap();
    assert_eq!(result.as_int().unwrap(), 100);
}

#[test]
fn store_then_evaluate_round_trips_a_string() {
    let (addr, _runtime) = spawn_server();
    let stream = TcpStream::connect(addr).unwrap();
    let proxy = ClientProxy::new(stream);

    let handle = proxy.store("hello").unwrap();
    assert_eq!(handle.as_string().unwrap(), "hello");
}

#[test]
fn two_stores_of_the_same_value_are_equal_remotely() {
    let (addr, _runtime) = spawn_server();
    let stream = TcpStream::connect(addr).unwrap();
    let proxy = ClientProxy::new(stream);

    let first = proxy.store(20i64).unwrap();
    let second = proxy.store(20i64).unwrap();
    assert!(first.equals(Capsule::Handle(second.id())).unwrap());
    assert_eq!(first, second);
}

#[test]
fn store_then_evaluate_round_trips_a_dictionary() {
    let (addr, _runtime) = spawn_server();
    let stream = TcpStream::connect(addr).unwrap();
    let proxy = ClientProxy::new(stream);

    let handle = proxy
        .store(Capsule::dictionary(vec![("qwe".to_string(), Capsule::integer(30)), ("asd".to_string(), Capsule::integer(40))]))
        .unwrap();

    let mut entries = handle.as_dict().unwrap();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(entries, vec![("asd".to_string(), Capsule::integer(40)), ("qwe".to_string(), Capsule::integer(30))]);
}

#[test]
fn missing_attribute_reconstitutes_as_a_client_attribute_error() {
    let (addr, _runtime) = spawn_server();
    let stream = TcpStream::connect(addr).unwrap();
    let proxy = ClientProxy::new(stream);

    let counter = proxy.fetch("counter").unwrap();
    let error = counter.get_attr("does-not-exist").unwrap_err();
    assert!(matches!(error, ClientError::Attribute { .. }));
}

#[test]
fn calling_a_method_with_the_wrong_arity_reconstitutes_as_a_client_execution_error() {
    let (addr, _runtime) = spawn_server();
    let stream = TcpStream::connect(addr).unwrap();
    let proxy = ClientProxy::new(stream);

    let counter = proxy.fetch("counter").unwrap();
    let method = counter.get_attr("method").unwrap();
    let error = method.call(Vec::<Capsule>::new(), Vec::<(String, Capsule)>::new()).unwrap_err();
    assert!(matches!(error, ClientError::Execution { .. }));
}

#[test]
fn release_then_evaluate_is_an_access_error() {
    let (addr, _runtime) = spawn_server();
    let stream = TcpStream::connect(addr).unwrap();
    let proxy = ClientProxy::new(stream);

    let handle = proxy.store(1i64).unwrap();
    let id = handle.id();
    handle.release().unwrap();

    let stale = proxy.handle(id);
    assert!(stale.as_int().is_err());
}
