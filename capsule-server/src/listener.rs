//! The accept loop: one Tokio task per incoming connection, all sharing a
//! single [`ObjectTable`].

use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};

use crate::handler::handle_connection;
use crate::table::ObjectTable;

/// Bind `addr` and serve connections until the process is killed. Each
/// accepted socket gets its own task; a misbehaving peer can only ever
/// bring down its own connection, never the listener or the table.
///
/// `TcpListener::bind` sets `SO_REUSEADDR` before binding, so a restarted
/// server can rebind the same address immediately.
pub async fn serve(addr: impl ToSocketAddrs, table: Arc<ObjectTable>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on {}", listener.local_addr()?);

    loop {
        let (socket, peer) = listener.accept().await?;
        log::debug!("accepted connection from {peer}");
        let table = Arc::clone(&table);
        tokio::spawn(async move {
            handle_connection(socket, table).await;
            log::debug!("connection from {peer} finished");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_codec::SyncTransport;
    use capsule_types::{Capsule, Command, EvaluateVariant, Response};
    use std::net::TcpStream;

    #[tokio::test]
    async fn accepts_a_connection_and_executes_one_round_trip() {
        let table = Arc::new(ObjectTable::new());
        table.export("greeting", crate::value::ServerValue::String("hi".into()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let table_for_server = Arc::clone(&table);
        tokio::spawn(async move {
            loop {
                let (socket, _) = listener.accept().await.unwrap();
                let table = Arc::clone(&table_for_server);
                tokio::spawn(async move { handle_connection(socket, table).await });
            }
        });

        let client_task = tokio::task::spawn_blocking(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            let fetch = Command::Fetch { name: "greeting".into() }.to_value();
            stream.send_message(&fetch).unwrap();
            let response = Response::from_value(&stream.recv_message().unwrap().unwrap()).unwrap();
            let Response::Handle { id } = response else { panic!("expected handle response") };

            let evaluate = Command::Evaluate { id, variant: EvaluateVariant::Str }.to_value();
            stream.send_message(&evaluate).unwrap();
            Response::from_value(&stream.recv_message().unwrap().unwrap()).unwrap()
        });

        let response = client_task.await.unwrap();
        assert_eq!(response, Response::Evaluation { data: Capsule::string("hi"), variant: EvaluateVariant::Str });
    }
}
