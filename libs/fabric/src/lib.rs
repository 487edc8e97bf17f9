//! Switchboard Fabric - codec, envelope and transport layer
//!
//! Provides codecs (raw bytes, JSON, bincode), the wire [`Envelope`], and
//! request/reply transports (TCP, Unix sockets, in-process loopback) for the
//! RPC client dispatch layer.
//!
//! # Example
//!
//! ```no_run
//! use switchboard_core::{Destination, Encoding};
//! use switchboard_fabric::{Envelope, transport::{TcpTransport, Transport}};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = TcpTransport::builder()
//!     .connect_timeout(std::time::Duration::from_secs(1))
//!     .build();
//! let destination = Destination::Socket("127.0.0.1:8080".parse()?);
//!
//! let request = Envelope::request(1, "echo/raw", Encoding::Raw, b"hello".to_vec());
//! let reply = transport.send(&destination, request).await?;
//! assert_eq!(reply.id, 1);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod envelope;
pub mod inbound;
pub mod transport;

// Re-exports for convenience
pub use codec::{BincodeCodec, Codec, JsonCodec, RawCodec};
pub use envelope::Envelope;
pub use inbound::{serve, EchoHandler, Handler};
pub use transport::{LoopbackTransport, Transport};
