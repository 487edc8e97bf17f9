use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Where a channel's transport delivers envelopes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// A TCP peer
    Socket(SocketAddr),
    /// A Unix domain socket path
    Unix(PathBuf),
    /// A logical, in-process peer name
    Local(String),
}

impl Destination {
    pub fn local(name: impl Into<String>) -> Self {
        Self::Local(name.into())
    }
}

impl From<SocketAddr> for Destination {
    fn from(addr: SocketAddr) -> Self {
        Self::Socket(addr)
    }
}

impl From<PathBuf> for Destination {
    fn from(path: PathBuf) -> Self {
        Self::Unix(path)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Socket(addr) => write!(f, "tcp://{addr}"),
            Destination::Unix(path) => write!(f, "unix://{}", path.display()),
            Destination::Local(name) => write!(f, "local://{name}"),
        }
    }
}
