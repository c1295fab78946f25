//! Per-connection request/response loop.

use std::sync::Arc;

use capsule_codec::AsyncTransport;
use capsule_types::Command;

use crate::exec;
use crate::table::ObjectTable;

/// Serve one connection until the peer disconnects, the transport fails, or
/// a message cannot be decoded into a command. A decode failure is a
/// construction error: it is never reported back as a response, since the
/// client has no handle id the failure could even be attached to — the
/// connection is simply closed. A command that decodes but fails to
/// *execute* always gets a response; only the envelope itself can end the
/// loop.
pub async fn handle_connection<T: AsyncTransport>(mut transport: T, table: Arc<ObjectTable>) {
    loop {
        let message = match transport.recv_message().await {
            Ok(Some(message)) => message,
            Ok(None) => {
                log::debug!("connection closed by peer");
                return;
            }
            Err(error) => {
                log::warn!("transport error, dropping connection: {error}");
                return;
            }
        };

        let command = match Command::from_value(&message) {
            Ok(command) => command,
            Err(error) => {
                log::warn!("closing connection on malformed command: {error}");
                return;
            }
        };

        log::trace!("executing {command:?}");
        let response = exec::execute(command, &table);

        if let Err(error) = transport.send_message(&response.to_value()).await {
            log::warn!("failed to send response, dropping connection: {error}");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_types::{Capsule, EvaluateVariant, Response};

    #[tokio::test]
    async fn serves_a_store_then_evaluate_exchange_over_a_duplex_pipe() {
        let table = Arc::new(ObjectTable::new());
        let (server_side, mut client_side) = tokio::io::duplex(8192);

        let serving = tokio::spawn(async move {
            handle_connection(server_side, table).await;
        });

        let store = Command::Store { data: Capsule::integer(7) }.to_value();
        client_side.send_message(&store).await.unwrap();
        let stored = Response::from_value(&client_side.recv_message().await.unwrap().unwrap()).unwrap();
        let Response::Handle { id } = stored else { panic!("expected handle response") };

        let evaluate = Command::Evaluate { id, variant: EvaluateVariant::Int }.to_value();
        client_side.send_message(&evaluate).await.unwrap();
        let evaluated = Response::from_value(&client_side.recv_message().await.unwrap().unwrap()).unwrap();
        assert_eq!(evaluated, Response::Evaluation { data: Capsule::integer(7), variant: EvaluateVariant::Int });

        drop(client_side);
        serving.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_message_closes_the_connection_without_a_response() {
        let table = Arc::new(ObjectTable::new());
        let (server_side, mut client_side) = tokio::io::duplex(8192);

        let serving = tokio::spawn(async move {
            handle_connection(server_side, table).await;
        });

        client_side.send_message(&serde_json::json!({"serial": "not-a-real-command"})).await.unwrap();
        assert_eq!(client_side.recv_message().await.unwrap(), None);

        serving.await.unwrap();
    }
}
