use std::collections::HashMap;

use switchboard_core::{Error, Result};
use switchboard_fabric::{BincodeCodec, JsonCodec, RawCodec};

use crate::channel::Channel;
use crate::outbound::Outbound;
use crate::typed::{BincodeClient, JsonClient, RawClient, TypedClient};

/// Registry of named channels, built once for a calling service
///
/// Every channel is opened when the client is constructed; afterwards the set
/// of channels never changes and lookups need no locking.
#[derive(Debug)]
pub struct RpcClient {
    service_name: String,
    channels: HashMap<String, Channel>,
}

impl RpcClient {
    /// Build a client with one channel per `(name, outbound)` pair
    pub fn new<K>(
        service_name: impl Into<String>,
        outbounds: impl IntoIterator<Item = (K, Outbound)>,
    ) -> Result<Self>
    where
        K: Into<String>,
    {
        let service_name = service_name.into();
        if service_name.trim().is_empty() {
            return Err(Error::config("service name must not be empty"));
        }

        let mut channels = HashMap::new();
        for (name, outbound) in outbounds {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(Error::config("channel name must not be empty"));
            }
            if channels.contains_key(&name) {
                return Err(Error::config(format!("duplicate channel {name:?}")));
            }

            let (destination, factory) = outbound.into_parts();
            let transport = factory.build(&destination).map_err(|err| match err {
                Error::Config(reason) => Error::config(format!("channel {name:?}: {reason}")),
                other => Error::config(format!("channel {name:?}: {other}")),
            })?;

            tracing::debug!(
                service = %service_name,
                channel = %name,
                %destination,
                "opened channel"
            );
            let channel = Channel::from_boxed(name.clone(), destination, transport);
            channels.insert(name, channel);
        }

        Ok(Self {
            service_name,
            channels,
        })
    }

    pub fn builder(service_name: impl Into<String>) -> RpcClientBuilder {
        RpcClientBuilder::new(service_name)
    }

    /// Name this client reports as the caller of every request
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Look up a channel by name
    pub fn channel(&self, name: &str) -> Result<&Channel> {
        self.channels
            .get(name)
            .ok_or_else(|| Error::UnknownChannel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Channel names, sorted
    pub fn channel_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.channels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// A client for `name` using any codec
    pub fn typed<C: Clone>(&self, name: &str, codec: C) -> Result<TypedClient<'_, C>> {
        let channel = self.channel(name)?;
        Ok(TypedClient::new(&self.service_name, channel, codec))
    }

    pub fn raw(&self, name: &str) -> Result<RawClient<'_>> {
        self.typed(name, RawCodec)
    }

    pub fn json(&self, name: &str) -> Result<JsonClient<'_>> {
        self.typed(name, JsonCodec)
    }

    pub fn bincode(&self, name: &str) -> Result<BincodeClient<'_>> {
        self.typed(name, BincodeCodec)
    }

    /// Close every channel. All channels are closed even if one fails; the
    /// first error is returned.
    pub async fn close(&self) -> Result<()> {
        let mut first_error = None;
        for channel in self.channels.values() {
            if let Err(err) = channel.close().await {
                tracing::warn!(channel = channel.name(), error = %err, "failed to close channel");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Builder for [`RpcClient`]
#[derive(Debug)]
pub struct RpcClientBuilder {
    service_name: String,
    outbounds: Vec<(String, Outbound)>,
}

impl RpcClientBuilder {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            outbounds: Vec::new(),
        }
    }

    /// Add a channel
    pub fn outbound(mut self, name: impl Into<String>, outbound: Outbound) -> Self {
        self.outbounds.push((name.into(), outbound));
        self
    }

    pub fn build(self) -> Result<RpcClient> {
        RpcClient::new(self.service_name, self.outbounds)
    }
}
