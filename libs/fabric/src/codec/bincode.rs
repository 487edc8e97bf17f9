use serde::de::DeserializeOwned;
use serde::Serialize;
use switchboard_core::{Encoding, Error, Result};

use crate::codec::Codec;

/// Bincode codec for binary serialization
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<T> Codec<T> for BincodeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encoding(&self) -> Encoding {
        Encoding::Bincode
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(Error::encoding::<T>)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(Error::decoding::<T>)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
    struct Body {
        label: String,
        small: i64,
        large: u64,
        ratio: f64,
        bytes: Vec<u8>,
        nested: BTreeMap<String, BTreeMap<String, Vec<i64>>>,
    }

    fn bodies() -> Vec<Body> {
        let nested = BTreeMap::from([
            (
                "outer".to_string(),
                BTreeMap::from([("inner".to_string(), vec![-1, 0, 1])]),
            ),
            ("empty".to_string(), BTreeMap::new()),
        ]);
        vec![
            Body::default(),
            Body {
                label: "héllo wörld 🌍 日本語".to_string(),
                ..Body::default()
            },
            Body {
                small: i64::MIN,
                large: u64::MAX,
                ratio: f64::MAX,
                ..Body::default()
            },
            Body {
                small: -42,
                ratio: -0.5,
                bytes: (0..=255).collect(),
                nested,
                ..Body::default()
            },
        ]
    }

    #[test]
    fn table_roundtrip() {
        for body in bodies() {
            let bytes = BincodeCodec.encode(&body).unwrap();
            let decoded: Body = BincodeCodec.decode(&bytes).unwrap();
            assert_eq!(decoded, body);
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: u32,
        tags: Vec<String>,
    }

    #[test]
    fn roundtrip() {
        let value = Sample {
            id: 7,
            tags: vec!["a".into(), "b".into()],
        };
        let bytes = BincodeCodec.encode(&value).unwrap();
        let decoded: Sample = BincodeCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn truncated_input_fails_to_decode() {
        let bytes = BincodeCodec.encode(&Sample { id: 1, tags: vec!["x".into()] }).unwrap();
        let result: Result<Sample> = BincodeCodec.decode(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(Error::Decoding { .. })));
    }
}
