use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::destination::Destination;
use crate::error::{Error, Result};

/// String headers attached to requests, replies and envelopes
pub type Headers = HashMap<String, String>;

/// Header naming the remote procedure
pub const PROCEDURE_HEADER: &str = "procedure";
/// Header naming the body's wire format
pub const ENCODING_HEADER: &str = "encoding";
/// Header naming the calling service
pub const CALLER_HEADER: &str = "caller";
/// Header carrying a reply's status
pub const STATUS_HEADER: &str = "status";

/// Header keys owned by the dispatch layer; callers may not set them
pub const RESERVED_HEADERS: [&str; 4] = [
    PROCEDURE_HEADER,
    ENCODING_HEADER,
    CALLER_HEADER,
    STATUS_HEADER,
];

pub fn is_reserved_header(key: &str) -> bool {
    RESERVED_HEADERS.contains(&key)
}

/// Outcome of a call as reported in a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Failure => "failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single outbound call: which procedure, what body, and optional routing hints.
///
/// Built with the `with_*` methods and then handed to a typed client, which
/// takes ownership. There is no way to mutate it afterwards.
#[derive(Debug, Clone)]
pub struct Request<B> {
    procedure: String,
    body: B,
    headers: Headers,
    destination: Option<Destination>,
    timeout: Option<Duration>,
}

impl<B> Request<B> {
    pub fn new(procedure: impl Into<String>, body: B) -> Self {
        Self {
            procedure: procedure.into(),
            body,
            headers: Headers::new(),
            destination: None,
            timeout: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Route this call somewhere other than the channel's own destination
    pub fn with_destination(mut self, destination: impl Into<Destination>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Bound the whole call, from encoding to decoded reply
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check the request can be dispatched at all. Runs before any encoding or I/O.
    pub fn validate(&self) -> Result<()> {
        if self.procedure.trim().is_empty() {
            return Err(Error::invalid_request("procedure must not be empty"));
        }
        if let Some(key) = self.headers.keys().find(|key| key.is_empty()) {
            return Err(Error::invalid_request(format!(
                "header key must not be empty (value {:?})",
                self.headers[key]
            )));
        }
        if let Some(key) = self.headers.keys().find(|key| is_reserved_header(key)) {
            return Err(Error::invalid_request(format!(
                "header {key:?} is reserved"
            )));
        }
        Ok(())
    }
}

/// The decoded reply to a call, owned by the caller
///
/// Only successful calls produce a `Response`, so `status` is always
/// [`Status::Success`]. A peer that replies with [`Status::Failure`] surfaces
/// as [`Error::Application`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<B> {
    pub body: B,
    pub status: Status,
    pub headers: Headers,
}

impl<B> Response<B> {
    pub fn success(body: B, headers: Headers) -> Self {
        Self {
            body,
            status: Status::Success,
            headers,
        }
    }

    pub fn into_body(self) -> B {
        self.body
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_procedure_is_rejected() {
        let err = Request::new("", b"hello".to_vec()).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        let err = Request::new("   ", ()).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn reserved_headers_are_rejected() {
        for key in RESERVED_HEADERS {
            let request = Request::new("echo", ()).with_header(key, "x");
            assert!(
                matches!(request.validate(), Err(Error::InvalidRequest(_))),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    fn empty_header_key_is_rejected() {
        let request = Request::new("echo", ()).with_header("", "x");
        assert!(matches!(request.validate(), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn responses_are_successful() {
        let response = Response::success(b"ok".to_vec(), Headers::new());
        assert!(response.status.is_success());
        assert_eq!(response.into_body(), b"ok");
    }

    #[test]
    fn builder_keeps_everything() {
        let request = Request::new("echo/raw", b"hello7".to_vec())
            .with_header("trace-id", "abc")
            .with_headers([("shard", "3")])
            .with_destination(Destination::local("peer"))
            .with_timeout(Duration::from_secs(1));

        request.validate().unwrap();
        assert_eq!(request.procedure(), "echo/raw");
        assert_eq!(request.body(), b"hello7");
        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.destination(), Some(&Destination::local("peer")));
        assert_eq!(request.timeout(), Some(Duration::from_secs(1)));
    }
}
