use std::io;

use switchboard_core::{Destination, TransportError};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::envelope::Envelope;

pub mod connection;
pub mod loopback;
mod pool;
pub mod tcp;
#[cfg(unix)]
pub mod unix;

pub use self::connection::Connection;
pub use self::loopback::{CallCounter, LoopbackTransport};
pub use self::tcp::{TcpTransport, TcpTransportBuilder, TcpTransportListener};
#[cfg(unix)]
pub use self::unix::{UnixTransport, UnixTransportBuilder, UnixTransportListener};

/// Default number of idle connections kept per destination
pub const DEFAULT_MAX_IDLE: usize = 8;

/// Judges the result of a non-blocking one-byte read on an idle socket. Only "would
/// block" means the peer is still there with nothing unsent; end of stream,
/// stray bytes and errors all mark the socket dead.
pub(crate) fn still_open(read: io::Result<usize>) -> bool {
    matches!(read, Err(err) if err.kind() == io::ErrorKind::WouldBlock)
}

/// Transport trait: deliver one request envelope, return the one reply.
///
/// Implementations are shared by every call on a channel, so `send` takes
/// `&self` and must be safe to run concurrently. A request is never silently
/// dropped: it either yields a reply or a `TransportError`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round-trip to `destination`
    async fn send(
        &self,
        destination: &Destination,
        request: Envelope,
    ) -> Result<Envelope, TransportError>;

    /// Release any resources held by the transport
    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Listener trait for accepting framed connections
#[async_trait::async_trait]
pub trait TransportListener: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Accept the next incoming connection
    async fn accept(&self) -> Result<Connection<Self::Stream>, TransportError>;

    /// Stop listening
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_would_block_counts_as_open() {
        assert!(still_open(Err(io::ErrorKind::WouldBlock.into())));
        assert!(!still_open(Ok(0)));
        assert!(!still_open(Ok(1)));
        assert!(!still_open(Err(io::ErrorKind::ConnectionReset.into())));
    }
}
