use serde::de::DeserializeOwned;
use serde::Serialize;
use switchboard_core::{Encoding, Error, Result};

use crate::codec::{finite, Codec};

/// JSON codec using serde_json.
///
/// Encoding is strict: NaN and infinite floats are rejected instead of being
/// written as `null`, so a value always decodes back to what was sent.
///
/// ```
/// use switchboard_fabric::codec::{Codec, JsonCodec};
///
/// let bytes = JsonCodec.encode(&vec![1, 2, 3]).unwrap();
/// assert_eq!(&bytes, b"[1,2,3]");
///
/// assert!(JsonCodec.encode(&f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encoding(&self) -> Encoding {
        Encoding::Json
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        finite::check(value).map_err(Error::encoding::<T>)?;
        serde_json::to_vec(value).map_err(Error::encoding::<T>)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(Error::decoding::<T>)
    }
}
