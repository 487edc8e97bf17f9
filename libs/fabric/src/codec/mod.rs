use switchboard_core::{Encoding, Result};

pub mod bincode;
mod finite;
pub mod json;
pub mod raw;

pub use self::bincode::BincodeCodec;
pub use self::json::JsonCodec;
pub use self::raw::RawCodec;

/// Codec trait for turning call bodies into wire bytes and back
///
/// Codecs are stateless; one instance may serve any number of concurrent calls.
pub trait Codec<T>: Send + Sync {
    /// Identifier written to the envelope's `encoding` header
    fn encoding(&self) -> Encoding;

    /// Encode a value into bytes
    fn encode(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode bytes into a value
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}
