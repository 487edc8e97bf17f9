use std::net::SocketAddr;
use std::time::Duration;

use switchboard_core::{Destination, TimeoutOp, TransportError};
use tokio::net::{TcpListener, TcpStream};

use crate::envelope::Envelope;
use crate::transport::pool::Pool;
use crate::transport::{still_open, Connection, Transport, DEFAULT_MAX_IDLE};

/// TCP transport with length-prefix framing and an idle connection pool
///
/// Each call checks out its own connection, so at most one call is in flight
/// per socket. Connections go back to the pool only after a complete reply;
/// errors, timeouts and cancelled calls drop theirs.
#[derive(Debug)]
pub struct TcpTransport {
    pool: Pool<SocketAddr, TcpStream>,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    nodelay: bool,
}

impl TcpTransport {
    /// A transport with no timeouts
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::new()
    }

    /// Number of idle pooled connections to `addr`
    pub fn idle_connections(&self, addr: &SocketAddr) -> usize {
        self.pool.idle(addr)
    }

    async fn connect(&self, addr: SocketAddr) -> Result<Connection<TcpStream>, TransportError> {
        let connect_op = TcpStream::connect(addr);

        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect_op)
                .await
                .map_err(|_| TransportError::Timeout(TimeoutOp::Connect))??,
            None => connect_op.await?,
        };
        if self.nodelay {
            stream.set_nodelay(true)?;
        }

        tracing::debug!(%addr, "opened tcp connection");
        Ok(Connection::with_timeouts(
            stream,
            self.send_timeout,
            self.receive_timeout,
        ))
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(
        &self,
        destination: &Destination,
        request: Envelope,
    ) -> Result<Envelope, TransportError> {
        let addr = match destination {
            Destination::Socket(addr) => *addr,
            other => return Err(TransportError::UnsupportedDestination(other.to_string())),
        };

        let idle = self.pool.checkout(&addr, |conn| {
            still_open(conn.get_ref().try_read(&mut [0u8; 1]))
        });
        let mut conn = match idle {
            Some(conn) => conn,
            None => self.connect(addr).await?,
        };

        let reply = conn.round_trip(&request).await?;
        self.pool.checkin(addr, conn);
        Ok(reply)
    }

    async fn close(&self) -> Result<(), TransportError> {
        for mut conn in self.pool.drain() {
            // The peer may already be gone; the socket is released either way
            let _ = conn.close().await;
        }
        Ok(())
    }
}

/// TCP listener for accepting incoming connections
pub struct TcpTransportListener {
    listener: TcpListener,
}

impl TcpTransportListener {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<(Connection<TcpStream>, SocketAddr), TransportError> {
        let (stream, addr) = self.listener.accept().await?;
        Ok((Connection::new(stream), addr))
    }

    /// Get the local address this listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Close the listener
    ///
    /// Note: Tokio's TcpListener doesn't have an explicit close,
    /// cleanup happens on drop. This is a no-op for compatibility.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::transport::TransportListener for TcpTransportListener {
    type Stream = TcpStream;

    async fn accept(&self) -> Result<Connection<TcpStream>, TransportError> {
        let (conn, addr) = TcpTransportListener::accept(self).await?;
        tracing::debug!(%addr, "accepted tcp connection");
        Ok(conn)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        TcpTransportListener::close(self).await
    }
}

/// Builder for configuring TCP transport
#[derive(Debug)]
pub struct TcpTransportBuilder {
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    max_idle: usize,
    nodelay: bool,
}

impl Default for TcpTransportBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            send_timeout: None,
            receive_timeout: None,
            max_idle: DEFAULT_MAX_IDLE,
            nodelay: true,
        }
    }
}

impl TcpTransportBuilder {
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

    /// Idle connections kept per destination; 0 disables pooling
    pub fn max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    pub fn build(self) -> TcpTransport {
        TcpTransport {
            pool: Pool::new(self.max_idle),
            connect_timeout: self.connect_timeout,
            send_timeout: self.send_timeout,
            receive_timeout: self.receive_timeout,
            nodelay: self.nodelay,
        }
    }
}
