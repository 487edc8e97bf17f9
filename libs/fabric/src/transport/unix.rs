use std::path::{Path, PathBuf};
use std::time::Duration;

use switchboard_core::{Destination, TimeoutOp, TransportError};
use tokio::net::{UnixListener, UnixStream};

use crate::envelope::Envelope;
use crate::transport::pool::Pool;
use crate::transport::{still_open, Connection, Transport, DEFAULT_MAX_IDLE};

/// Unix domain socket transport with length-prefix framing
///
/// Pools idle connections per socket path, like [`TcpTransport`](super::TcpTransport).
#[derive(Debug)]
pub struct UnixTransport {
    pool: Pool<PathBuf, UnixStream>,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl UnixTransport {
    /// A transport with no timeouts
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> UnixTransportBuilder {
        UnixTransportBuilder::new()
    }

    /// Number of idle pooled connections to `path`
    pub fn idle_connections(&self, path: impl AsRef<Path>) -> usize {
        self.pool.idle(&path.as_ref().to_path_buf())
    }

    async fn connect(&self, path: &Path) -> Result<Connection<UnixStream>, TransportError> {
        let connect_op = UnixStream::connect(path);

        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect_op)
                .await
                .map_err(|_| TransportError::Timeout(TimeoutOp::Connect))??,
            None => connect_op.await?,
        };

        tracing::debug!(path = %path.display(), "opened unix connection");
        Ok(Connection::with_timeouts(
            stream,
            self.send_timeout,
            self.receive_timeout,
        ))
    }
}

impl Default for UnixTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for UnixTransport {
    async fn send(
        &self,
        destination: &Destination,
        request: Envelope,
    ) -> Result<Envelope, TransportError> {
        let path = match destination {
            Destination::Unix(path) => path,
            other => return Err(TransportError::UnsupportedDestination(other.to_string())),
        };

        let idle = self.pool.checkout(path, |conn| {
            still_open(conn.get_ref().try_read(&mut [0u8; 1]))
        });
        let mut conn = match idle {
            Some(conn) => conn,
            None => self.connect(path).await?,
        };

        let reply = conn.round_trip(&request).await?;
        self.pool.checkin(path.clone(), conn);
        Ok(reply)
    }

    async fn close(&self) -> Result<(), TransportError> {
        for mut conn in self.pool.drain() {
            let _ = conn.close().await;
        }
        Ok(())
    }
}

/// Unix socket listener for accepting incoming connections
pub struct UnixTransportListener {
    listener: UnixListener,
    path: PathBuf,
}

impl UnixTransportListener {
    /// Bind to a Unix socket path
    pub async fn bind(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref().to_path_buf();

        // Remove existing socket file if it exists
        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let listener = UnixListener::bind(&path)?;
        Ok(Self { listener, path })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<Connection<UnixStream>, TransportError> {
        let (stream, _) = self.listener.accept().await?;
        Ok(Connection::new(stream))
    }

    /// Get the path this listener is bound to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the listener and remove the socket file
    pub async fn close(&mut self) -> Result<(), TransportError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Drop for UnixTransportListener {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.path);
    }
}

#[async_trait::async_trait]
impl crate::transport::TransportListener for UnixTransportListener {
    type Stream = UnixStream;

    async fn accept(&self) -> Result<Connection<UnixStream>, TransportError> {
        UnixTransportListener::accept(self).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        UnixTransportListener::close(self).await
    }
}

/// Builder for configuring Unix socket transport
#[derive(Debug)]
pub struct UnixTransportBuilder {
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    max_idle: usize,
}

impl Default for UnixTransportBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            send_timeout: None,
            receive_timeout: None,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }
}

impl UnixTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set the receive timeout
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Set all three timeouts at once; `None` leaves that leg unbounded
    pub fn timeouts(
        mut self,
        connect: Option<Duration>,
        send: Option<Duration>,
        receive: Option<Duration>,
    ) -> Self {
        self.connect_timeout = connect;
        self.send_timeout = send;
        self.receive_timeout = receive;
        self
    }

    /// Idle connections kept per socket path; 0 disables pooling
    pub fn max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn build(self) -> UnixTransport {
        UnixTransport {
            pool: Pool::new(self.max_idle),
            connect_timeout: self.connect_timeout,
            send_timeout: self.send_timeout,
            receive_timeout: self.receive_timeout,
        }
    }
}
