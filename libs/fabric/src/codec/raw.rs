use switchboard_core::{Encoding, Error, Result};

use crate::codec::Codec;

/// Raw codec that passes bytes through untouched
///
/// Only works with `Vec<u8>` and `String` bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Codec<Vec<u8>> for RawCodec {
    fn encoding(&self) -> Encoding {
        Encoding::Raw
    }

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

impl Codec<String> for RawCodec {
    fn encoding(&self) -> Encoding {
        Encoding::Raw
    }

    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(Error::decoding::<String>)
    }
}
