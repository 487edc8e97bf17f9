//! Switchboard Core - shared types for the RPC dispatch layer
//!
//! Requests, responses, destinations, encodings, the per-call state machine
//! and the error taxonomy used by every other switchboard crate.

pub mod destination;
pub mod encoding;
pub mod error;
pub mod message;
pub mod state;

pub use destination::Destination;
pub use encoding::Encoding;
pub use error::{Error, Result, TimeoutOp, TransportError};
pub use message::{Headers, Request, Response, Status};
pub use state::{CallState, CallStateHandle};
