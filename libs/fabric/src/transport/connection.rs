use std::time::Duration;

use switchboard_core::{TimeoutOp, TransportError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::envelope::{Envelope, MAX_FRAME_LEN};

/// A single stream connection with length-prefix framing
///
/// Frames are a 4-byte big-endian length prefix followed by the payload.
/// Dropping a connection closes the underlying socket.
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a stream with no timeouts
    pub fn new(stream: S) -> Self {
        Self::with_timeouts(stream, None, None)
    }

    pub fn with_timeouts(
        stream: S,
        send_timeout: Option<Duration>,
        receive_timeout: Option<Duration>,
    ) -> Self {
        Self {
            stream,
            send_timeout,
            receive_timeout,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Write one frame
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if bytes.len() > MAX_FRAME_LEN {
            return Err(TransportError::invalid_frame(format!(
                "Message too large: {} bytes",
                bytes.len()
            )));
        }

        let send_op = async {
            // Write length prefix (4 bytes, big-endian)
            self.stream.write_u32(bytes.len() as u32).await?;
            self.stream.write_all(bytes).await?;
            self.stream.flush().await?;
            Ok::<(), TransportError>(())
        };

        match self.send_timeout {
            Some(timeout) => tokio::time::timeout(timeout, send_op)
                .await
                .map_err(|_| TransportError::Timeout(TimeoutOp::Send))?,
            None => send_op.await,
        }
    }

    /// Read one frame
    pub async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        let receive_op = async {
            let len = self.stream.read_u32().await? as usize;

            if len > MAX_FRAME_LEN {
                return Err(TransportError::invalid_frame(format!(
                    "Message too large: {} bytes",
                    len
                )));
            }

            let mut buf = vec![0u8; len];
            self.stream.read_exact(&mut buf).await?;
            Ok::<Vec<u8>, TransportError>(buf)
        };

        match self.receive_timeout {
            Some(timeout) => tokio::time::timeout(timeout, receive_op)
                .await
                .map_err(|_| TransportError::Timeout(TimeoutOp::Receive))?,
            None => receive_op.await,
        }
    }

    pub async fn send_envelope(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        let bytes = envelope.to_bytes()?;
        tracing::trace!(id = envelope.id, bytes = bytes.len(), "writing envelope");
        self.send(&bytes).await
    }

    pub async fn receive_envelope(&mut self) -> Result<Envelope, TransportError> {
        let bytes = self.receive().await?;
        let envelope = Envelope::from_bytes(&bytes)?;
        tracing::trace!(id = envelope.id, bytes = bytes.len(), "read envelope");
        Ok(envelope)
    }

    /// Send a request and wait for the reply that answers it
    pub async fn round_trip(&mut self, request: &Envelope) -> Result<Envelope, TransportError> {
        self.send_envelope(request).await?;
        let reply = self.receive_envelope().await?;
        if reply.id != request.id {
            return Err(TransportError::CorrelationMismatch {
                expected: request.id,
                actual: reply.id,
            });
        }
        Ok(reply)
    }

    /// Shut down the write half
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
