use serde::{Deserialize, Serialize};
use switchboard_core::message::{
    is_reserved_header, CALLER_HEADER, ENCODING_HEADER, PROCEDURE_HEADER, STATUS_HEADER,
};
use switchboard_core::{Encoding, Headers, Status, TransportError};

/// Largest frame a stream transport will accept (100MB)
pub const MAX_FRAME_LEN: usize = 100 * 1024 * 1024;

/// What actually crosses a transport: a header block plus the encoded body.
///
/// `id` correlates a reply with its request. Requests always carry the
/// `procedure` and `encoding` headers; replies carry `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: u64,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Envelope {
    pub fn request(id: u64, procedure: &str, encoding: Encoding, body: Vec<u8>) -> Self {
        let mut headers = Headers::new();
        headers.insert(PROCEDURE_HEADER.to_string(), procedure.to_string());
        headers.insert(ENCODING_HEADER.to_string(), encoding.to_string());
        Self { id, headers, body }
    }

    pub fn with_caller(mut self, caller: &str) -> Self {
        self.headers.insert(CALLER_HEADER.to_string(), caller.to_string());
        self
    }

    /// Merge caller supplied headers. Reserved keys are left alone.
    pub fn with_headers<'a>(
        mut self,
        headers: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Self {
        for (key, value) in headers {
            if !is_reserved_header(key) {
                self.headers.insert(key.clone(), value.clone());
            }
        }
        self
    }

    /// A successful reply to this envelope, in the same encoding
    pub fn reply(&self, body: Vec<u8>) -> Envelope {
        let mut headers = Headers::new();
        if let Some(encoding) = self.headers.get(ENCODING_HEADER) {
            headers.insert(ENCODING_HEADER.to_string(), encoding.clone());
        }
        headers.insert(STATUS_HEADER.to_string(), Status::Success.to_string());
        Envelope {
            id: self.id,
            headers,
            body,
        }
    }

    /// A failure reply; the message travels as UTF-8 in the body
    pub fn failure(&self, message: impl Into<String>) -> Envelope {
        Self::failure_for(self.id, message)
    }

    pub fn failure_for(id: u64, message: impl Into<String>) -> Envelope {
        let mut headers = Headers::new();
        headers.insert(STATUS_HEADER.to_string(), Status::Failure.to_string());
        Envelope {
            id,
            headers,
            body: message.into().into_bytes(),
        }
    }

    pub fn procedure(&self) -> Option<&str> {
        self.headers.get(PROCEDURE_HEADER).map(String::as_str)
    }

    pub fn caller(&self) -> Option<&str> {
        self.headers.get(CALLER_HEADER).map(String::as_str)
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.headers
            .get(ENCODING_HEADER)
            .and_then(|e| e.parse().ok())
    }

    /// Reply status. Envelopes without a status header count as successful.
    pub fn status(&self) -> Status {
        match self.headers.get(STATUS_HEADER).map(String::as_str) {
            Some("failure") => Status::Failure,
            _ => Status::Success,
        }
    }

    /// Headers minus the ones owned by the dispatch layer
    pub fn application_headers(&self) -> Headers {
        self.headers
            .iter()
            .filter(|(key, _)| !is_reserved_header(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TransportError> {
        bincode::serialize(self).map_err(|e| TransportError::invalid_frame(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        bincode::deserialize(bytes).map_err(|e| TransportError::invalid_frame(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_procedure_and_encoding() {
        let envelope = Envelope::request(9, "echo/raw", Encoding::Raw, b"hello7".to_vec())
            .with_caller("client");
        assert_eq!(envelope.procedure(), Some("echo/raw"));
        assert_eq!(envelope.encoding(), Some(Encoding::Raw));
        assert_eq!(envelope.caller(), Some("client"));
        assert_eq!(envelope.status(), Status::Success);
    }

    #[test]
    fn caller_headers_cannot_override_reserved_ones() {
        let extra = Headers::from([
            ("procedure".to_string(), "evil".to_string()),
            ("trace".to_string(), "t1".to_string()),
        ]);
        let envelope = Envelope::request(1, "echo", Encoding::Json, vec![]).with_headers(&extra);
        assert_eq!(envelope.procedure(), Some("echo"));
        assert_eq!(envelope.headers.get("trace").map(String::as_str), Some("t1"));
    }

    #[test]
    fn reply_keeps_id_and_encoding() {
        let request = Envelope::request(42, "echo", Encoding::Json, b"{}".to_vec());
        let reply = request.reply(b"[]".to_vec());
        assert_eq!(reply.id, 42);
        assert_eq!(reply.encoding(), Some(Encoding::Json));
        assert_eq!(reply.status(), Status::Success);
        assert!(reply.procedure().is_none());

        let failed = request.failure("no such procedure");
        assert_eq!(failed.id, 42);
        assert_eq!(failed.status(), Status::Failure);
        assert_eq!(failed.body, b"no such procedure");
    }

    #[test]
    fn survives_the_wire() {
        let envelope = Envelope::request(3, "echo", Encoding::Bincode, vec![0, 1, 2, 255]);
        let bytes = envelope.to_bytes().unwrap();
        assert_eq!(Envelope::from_bytes(&bytes).unwrap(), envelope);
    }

    #[test]
    fn garbage_is_an_invalid_frame() {
        let result = Envelope::from_bytes(&[1, 2, 3]);
        assert!(matches!(result, Err(TransportError::InvalidFrame(_))));
    }

    #[test]
    fn application_headers_strip_reserved_keys() {
        let mut reply = Envelope::request(1, "echo", Encoding::Raw, vec![]).reply(vec![]);
        reply.headers.insert("shard".into(), "7".into());
        let headers = reply.application_headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("shard").map(String::as_str), Some("7"));
    }
}
