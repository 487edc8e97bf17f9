use std::fmt;
use std::net::SocketAddr;
#[cfg(unix)]
use std::path::PathBuf;

use switchboard_core::{Destination, Result};
use switchboard_fabric::inbound::Handler;
use switchboard_fabric::transport::{TcpTransport, Transport};
#[cfg(unix)]
use switchboard_fabric::transport::UnixTransport;
use switchboard_fabric::LoopbackTransport;

/// Builds the transport for one channel
///
/// Called exactly once, when the client is constructed. Any closure taking a
/// `&Destination` and returning `Result<impl Transport>` is a factory.
pub trait TransportFactory: Send {
    fn build(self: Box<Self>, destination: &Destination) -> Result<Box<dyn Transport>>;
}

impl<F, T> TransportFactory for F
where
    F: FnOnce(&Destination) -> Result<T> + Send,
    T: Transport + 'static,
{
    fn build(self: Box<Self>, destination: &Destination) -> Result<Box<dyn Transport>> {
        let transport = (*self)(destination)?;
        Ok(Box::new(transport))
    }
}

/// Everything needed to open one channel: where it goes and how to get there
pub struct Outbound {
    destination: Destination,
    factory: Box<dyn TransportFactory>,
}

impl Outbound {
    pub fn new(destination: impl Into<Destination>, factory: impl TransportFactory + 'static) -> Self {
        Self {
            destination: destination.into(),
            factory: Box::new(factory),
        }
    }

    /// Use an already constructed transport
    pub fn with_transport(
        destination: impl Into<Destination>,
        transport: impl Transport + 'static,
    ) -> Self {
        Self::new(destination, move |_: &Destination| -> Result<_> { Ok(transport) })
    }

    /// TCP with default settings
    pub fn tcp(addr: SocketAddr) -> Self {
        Self::new(addr, |_: &Destination| -> Result<TcpTransport> {
            Ok(TcpTransport::new())
        })
    }

    /// Unix domain socket with default settings
    #[cfg(unix)]
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), |_: &Destination| -> Result<UnixTransport> {
            Ok(UnixTransport::new())
        })
    }

    /// In-process peer named `name`, answered by `handler`
    pub fn loopback(name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::with_transport(Destination::Local(name.into()), LoopbackTransport::new(handler))
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub(crate) fn into_parts(self) -> (Destination, Box<dyn TransportFactory>) {
        (self.destination, self.factory)
    }
}

impl fmt::Debug for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbound")
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use switchboard_core::{Encoding, Error};
    use switchboard_fabric::inbound::EchoHandler;
    use switchboard_fabric::Envelope;

    use super::*;

    #[tokio::test]
    async fn loopback_factory_builds_a_working_transport() {
        let (destination, factory) = Outbound::loopback("peer", EchoHandler).into_parts();
        assert_eq!(destination, Destination::local("peer"));

        let transport = factory.build(&destination).unwrap();
        let request = Envelope::request(1, "echo", Encoding::Raw, b"hi".to_vec());
        let reply = transport.send(&destination, request).await.unwrap();
        assert_eq!(reply.body, b"hi");
    }

    #[test]
    fn factory_sees_the_destination() {
        let outbound = Outbound::new(
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap(),
            |destination: &Destination| -> Result<TcpTransport> {
                assert!(matches!(destination, Destination::Socket(_)));
                Ok(TcpTransport::new())
            },
        );
        let (destination, factory) = outbound.into_parts();
        assert!(factory.build(&destination).is_ok());
    }

    #[test]
    fn factory_errors_propagate() {
        let outbound = Outbound::new(
            Destination::local("nowhere"),
            |_: &Destination| -> Result<TcpTransport> { Err(Error::config("no route")) },
        );
        let (destination, factory) = outbound.into_parts();
        assert!(matches!(factory.build(&destination), Err(Error::Config(_))));
    }
}
