//! One outbound call, from request to decoded response.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use switchboard_core::{
    CallState, CallStateHandle, Error, Request, Response, Result, TransportError,
};
use switchboard_fabric::{Codec, Envelope};

use crate::channel::Channel;

type ReplyFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<Envelope, TransportError>> + Send + 'a>>;

/// A call that has been bound to a channel but not sent yet
///
/// Its [`CallStateHandle`] can be taken before sending and watched while the
/// call runs. Dropping the future returned by [`PreparedCall::send`] cancels
/// the call and marks it `Failed`.
pub struct PreparedCall<'a, C, Req, Resp> {
    service_name: &'a str,
    channel: &'a Channel,
    codec: C,
    request: Request<Req>,
    state: CallStateHandle,
    _response: PhantomData<fn() -> Resp>,
}

impl<'a, C, Req, Resp> PreparedCall<'a, C, Req, Resp>
where
    C: Codec<Req> + Codec<Resp>,
    Req: Send + Sync,
{
    pub(crate) fn new(
        service_name: &'a str,
        channel: &'a Channel,
        codec: C,
        request: Request<Req>,
    ) -> Self {
        Self {
            service_name,
            channel,
            codec,
            request,
            state: CallStateHandle::new(),
            _response: PhantomData,
        }
    }

    /// Another handle on this call's state
    pub fn state(&self) -> CallStateHandle {
        self.state.clone()
    }

    pub fn request(&self) -> &Request<Req> {
        &self.request
    }

    /// Run the call to completion.
    ///
    /// Applies the request's timeout, if any, to the whole call.
    pub async fn send(self) -> Result<Response<Resp>> {
        let _guard = FailOnDrop(self.state.clone());
        let call = dispatch::<C, Req, Resp>(
            self.service_name,
            self.channel,
            &self.codec,
            &self.request,
            &self.state,
        );

        let result = match self.request.timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(Error::Timeout(limit))),
            None => call.await,
        };

        if let Err(err) = &result {
            self.state.fail();
            tracing::debug!(
                channel = self.channel.name(),
                procedure = self.request.procedure(),
                error = %err,
                "call failed"
            );
        }
        result
    }
}

async fn dispatch<C, Req, Resp>(
    service_name: &str,
    channel: &Channel,
    codec: &C,
    request: &Request<Req>,
    state: &CallStateHandle,
) -> Result<Response<Resp>>
where
    C: Codec<Req> + Codec<Resp>,
    Req: Send + Sync,
{
    request.validate()?;

    state.advance(CallState::Encoding);
    let encoding = <C as Codec<Req>>::encoding(codec);
    let body = <C as Codec<Req>>::encode(codec, request.body())?;

    let id = channel.next_id();
    let envelope = Envelope::request(id, request.procedure(), encoding, body)
        .with_caller(service_name)
        .with_headers(request.headers());
    let destination = request.destination().unwrap_or(channel.destination());

    state.advance(CallState::Sending);
    tracing::debug!(
        channel = channel.name(),
        procedure = request.procedure(),
        id,
        %encoding,
        %destination,
        bytes = envelope.body.len(),
        "sending request"
    );
    let reply = AwaitReply {
        inner: channel.transport().send(destination, envelope),
        state,
    }
    .await?;

    // A transport that answered without ever yielding skips straight through
    state.advance(CallState::AwaitingReply);
    state.advance(CallState::Decoding);
    tracing::trace!(id, bytes = reply.body.len(), status = %reply.status(), "reply received");

    if !reply.status().is_success() {
        return Err(Error::Application {
            procedure: request.procedure().to_string(),
            message: String::from_utf8_lossy(&reply.body).into_owned(),
        });
    }

    let expected = <C as Codec<Resp>>::encoding(codec);
    if let Some(actual) = reply.encoding() {
        if actual != expected {
            return Err(Error::decoding::<Resp>(format!(
                "reply is {actual}, expected {expected}"
            )));
        }
    }

    let body = <C as Codec<Resp>>::decode(codec, &reply.body)?;
    let response = Response::success(body, reply.application_headers());
    state.advance(CallState::Complete);
    Ok(response)
}

/// Moves the call to `AwaitingReply` once the transport has to wait
struct AwaitReply<'a> {
    inner: ReplyFuture<'a>,
    state: &'a CallStateHandle,
}

impl Future for AwaitReply<'_> {
    type Output = std::result::Result<Envelope, TransportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let poll = self.inner.as_mut().poll(cx);
        if poll.is_pending() {
            self.state.advance(CallState::AwaitingReply);
        }
        poll
    }
}

struct FailOnDrop(CallStateHandle);

impl Drop for FailOnDrop {
    fn drop(&mut self) {
        if self.0.fail() {
            tracing::debug!("call dropped before completion");
        }
    }
}
