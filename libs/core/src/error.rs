use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced to the caller of an outbound call
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to encode {type_name}: {message}")]
    Encoding {
        type_name: &'static str,
        message: String,
    },

    #[error("failed to decode {type_name}: {message}")]
    Decoding {
        type_name: &'static str,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("procedure {procedure} failed: {message}")]
    Application { procedure: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn encoding<T: ?Sized>(msg: impl ToString) -> Self {
        Self::Encoding {
            type_name: std::any::type_name::<T>(),
            message: msg.to_string(),
        }
    }

    pub fn decoding<T: ?Sized>(msg: impl ToString) -> Self {
        Self::Decoding {
            type_name: std::any::type_name::<T>(),
            message: msg.to_string(),
        }
    }

    /// The transport failure behind this error, if any
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Which leg of a round-trip a transport-level timeout hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOp {
    Connect,
    Send,
    Receive,
}

impl std::fmt::Display for TimeoutOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutOp::Connect => write!(f, "connect"),
            TimeoutOp::Send => write!(f, "send"),
            TimeoutOp::Receive => write!(f, "receive"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("connection reset by peer: {0}")]
    PeerReset(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("{0} timeout exceeded")]
    Timeout(TimeoutOp),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("reply correlation mismatch: expected {expected}, got {actual}")]
    CorrelationMismatch { expected: u64, actual: u64 },

    #[error("unsupported destination: {0}")]
    UnsupportedDestination(String),

    #[error("IO error: {0}")]
    Io(io::Error),
}

impl TransportError {
    pub fn connection_refused(msg: impl Into<String>) -> Self {
        Self::ConnectionRefused(msg.into())
    }

    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused(err.to_string()),
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::PeerReset(err.to_string()),
            io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
            io::ErrorKind::TimedOut => Self::Timeout(TimeoutOp::Receive),
            _ => Self::Io(err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Transport(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
