//! Serializable client configuration.
//!
//! The library never reads files itself: deserialize a [`ClientConfig`] from
//! whatever source the service uses, then hand it to
//! [`RpcClient::from_config`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchboard_core::{Destination, Error, Result};
use switchboard_fabric::transport::{TcpTransport, DEFAULT_MAX_IDLE};
#[cfg(unix)]
use switchboard_fabric::transport::UnixTransport;

use crate::client::RpcClient;
use crate::outbound::Outbound;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub service_name: String,
    #[serde(default)]
    pub outbounds: HashMap<String, OutboundConfig>,
}

/// One channel's transport, tagged by `transport = "tcp" | "unix"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum OutboundConfig {
    Tcp {
        address: SocketAddr,
        connect_timeout_ms: Option<u64>,
        send_timeout_ms: Option<u64>,
        receive_timeout_ms: Option<u64>,
        max_idle: Option<usize>,
    },
    Unix {
        path: PathBuf,
        connect_timeout_ms: Option<u64>,
        send_timeout_ms: Option<u64>,
        receive_timeout_ms: Option<u64>,
        max_idle: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    connect: Option<Duration>,
    send: Option<Duration>,
    receive: Option<Duration>,
    max_idle: usize,
}

impl Limits {
    fn parse(
        connect_ms: Option<u64>,
        send_ms: Option<u64>,
        receive_ms: Option<u64>,
        max_idle: Option<usize>,
    ) -> Result<Self> {
        let millis = |field: &str, value: Option<u64>| match value {
            Some(0) => Err(Error::config(format!("{field} must be greater than zero"))),
            other => Ok(other.map(Duration::from_millis)),
        };
        Ok(Self {
            connect: millis("connect_timeout_ms", connect_ms)?,
            send: millis("send_timeout_ms", send_ms)?,
            receive: millis("receive_timeout_ms", receive_ms)?,
            max_idle: max_idle.unwrap_or(DEFAULT_MAX_IDLE),
        })
    }

    fn tcp(self) -> TcpTransport {
        TcpTransport::builder()
            .timeouts(self.connect, self.send, self.receive)
            .max_idle(self.max_idle)
            .build()
    }

    #[cfg(unix)]
    fn unix(self) -> UnixTransport {
        UnixTransport::builder()
            .timeouts(self.connect, self.send, self.receive)
            .max_idle(self.max_idle)
            .build()
    }
}

impl OutboundConfig {
    /// Validate and turn into an [`Outbound`]
    pub fn to_outbound(&self) -> Result<Outbound> {
        match self {
            OutboundConfig::Tcp {
                address,
                connect_timeout_ms,
                send_timeout_ms,
                receive_timeout_ms,
                max_idle,
            } => {
                let limits = Limits::parse(
                    *connect_timeout_ms,
                    *send_timeout_ms,
                    *receive_timeout_ms,
                    *max_idle,
                )?;
                Ok(Outbound::new(
                    *address,
                    move |_: &Destination| -> Result<TcpTransport> { Ok(limits.tcp()) },
                ))
            }
            OutboundConfig::Unix {
                path,
                connect_timeout_ms,
                send_timeout_ms,
                receive_timeout_ms,
                max_idle,
            } => {
                let limits = Limits::parse(
                    *connect_timeout_ms,
                    *send_timeout_ms,
                    *receive_timeout_ms,
                    *max_idle,
                )?;
                unix_outbound(path.clone(), limits)
            }
        }
    }
}

#[cfg(unix)]
fn unix_outbound(path: PathBuf, limits: Limits) -> Result<Outbound> {
    Ok(Outbound::new(
        path,
        move |_: &Destination| -> Result<UnixTransport> { Ok(limits.unix()) },
    ))
}

#[cfg(not(unix))]
fn unix_outbound(path: PathBuf, _limits: Limits) -> Result<Outbound> {
    Err(Error::config(format!(
        "unix socket {} is not supported on this platform",
        path.display()
    )))
}

impl RpcClient {
    /// Build a client from deserialized configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut outbounds = Vec::with_capacity(config.outbounds.len());
        for (name, outbound) in &config.outbounds {
            let outbound = outbound
                .to_outbound()
                .map_err(|err| Error::config(format!("channel {name:?}: {err}")))?;
            outbounds.push((name.clone(), outbound));
        }
        RpcClient::new(config.service_name.clone(), outbounds)
    }
}
