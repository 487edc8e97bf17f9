//! Serving side: answer envelopes arriving on a listener.

use std::sync::Arc;

use switchboard_core::TransportError;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::envelope::Envelope;
use crate::transport::{Connection, TransportListener};

/// Produces the reply for one request envelope
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: Envelope) -> Result<Envelope, TransportError>;
}

#[async_trait::async_trait]
impl<F> Handler for F
where
    F: Fn(Envelope) -> Result<Envelope, TransportError> + Send + Sync,
{
    async fn handle(&self, request: Envelope) -> Result<Envelope, TransportError> {
        (self)(request)
    }
}

/// Replies with the request's own body and encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

#[async_trait::async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, request: Envelope) -> Result<Envelope, TransportError> {
        Ok(request.reply(request.body.clone()))
    }
}

/// Accept connections forever, answering each on its own task.
///
/// Returns only when accepting fails.
pub async fn serve<L, H>(listener: L, handler: Arc<H>) -> Result<(), TransportError>
where
    L: TransportListener,
    H: Handler + ?Sized + 'static,
{
    loop {
        let conn = listener.accept().await?;
        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_connection(conn, handler).await {
                tracing::debug!(error = %err, "connection ended with error");
            }
        });
    }
}

/// Answer requests on one connection until the peer hangs up
pub async fn serve_connection<S, H>(
    mut conn: Connection<S>,
    handler: Arc<H>,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: Handler + ?Sized,
{
    loop {
        let request = match conn.receive_envelope().await {
            Ok(request) => request,
            Err(TransportError::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err),
        };

        let id = request.id;
        tracing::debug!(id, procedure = request.procedure(), "handling request");
        let reply = match handler.handle(request).await {
            Ok(reply) => reply,
            Err(err) => Envelope::failure_for(id, err.to_string()),
        };
        conn.send_envelope(&reply).await?;
    }
}

#[cfg(test)]
mod tests {
    use switchboard_core::{Encoding, Status};
    use tokio::io::duplex;

    use super::*;

    #[tokio::test]
    async fn handler_errors_become_failure_replies() {
        let (a, b) = duplex(1024);
        let handler = Arc::new(|_request: Envelope| -> Result<Envelope, TransportError> {
            Err(TransportError::invalid_frame("unsupported procedure"))
        });
        tokio::spawn(serve_connection(Connection::new(b), handler));

        let mut client = Connection::new(a);
        let request = Envelope::request(11, "missing", Encoding::Json, b"{}".to_vec());
        let reply = client.round_trip(&request).await.unwrap();

        assert_eq!(reply.id, 11);
        assert_eq!(reply.status(), Status::Failure);
        assert!(String::from_utf8(reply.body)
            .unwrap()
            .contains("unsupported procedure"));
    }

    #[tokio::test]
    async fn connection_ends_cleanly_when_peer_hangs_up() {
        let (a, b) = duplex(1024);
        let task = tokio::spawn(serve_connection(Connection::new(b), Arc::new(EchoHandler)));
        drop(a);
        assert!(task.await.unwrap().is_ok());
    }
}
