use switchboard_core::{Request, Response, Result};
use switchboard_fabric::{BincodeCodec, Codec, JsonCodec, RawCodec};

use crate::call::PreparedCall;
use crate::channel::Channel;

/// A channel paired with a codec
///
/// Cheap to create and borrow-only: the channel stays owned by the
/// [`RpcClient`](crate::RpcClient).
#[derive(Debug, Clone)]
pub struct TypedClient<'a, C> {
    service_name: &'a str,
    channel: &'a Channel,
    codec: C,
}

/// Bodies are bytes, passed through untouched
pub type RawClient<'a> = TypedClient<'a, RawCodec>;
/// Bodies are serde values, sent as JSON
pub type JsonClient<'a> = TypedClient<'a, JsonCodec>;
/// Bodies are serde values, sent as bincode
pub type BincodeClient<'a> = TypedClient<'a, BincodeCodec>;

impl<'a, C: Clone> TypedClient<'a, C> {
    pub fn new(service_name: &'a str, channel: &'a Channel, codec: C) -> Self {
        Self {
            service_name,
            channel,
            codec,
        }
    }

    pub fn channel(&self) -> &'a Channel {
        self.channel
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Bind `request` to this client without sending it
    pub fn prepare<Req, Resp>(&self, request: Request<Req>) -> PreparedCall<'a, C, Req, Resp>
    where
        C: Codec<Req> + Codec<Resp>,
        Req: Send + Sync,
    {
        PreparedCall::new(self.service_name, self.channel, self.codec.clone(), request)
    }

    /// Encode, send, and decode one call.
    ///
    /// Nothing is retried. A failed call surfaces exactly one error.
    pub async fn call<Req, Resp>(&self, request: Request<Req>) -> Result<Response<Resp>>
    where
        C: Codec<Req> + Codec<Resp>,
        Req: Send + Sync,
    {
        self.prepare(request).send().await
    }
}
