use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use switchboard_core::{Destination, TransportError};

use crate::envelope::Envelope;
use crate::inbound::{EchoHandler, Handler};
use crate::transport::Transport;

/// Counts the round-trips a [`LoopbackTransport`] has been asked to make
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

enum Responder {
    Handler(Box<dyn Handler>),
    Fault(Box<dyn Fn() -> TransportError + Send + Sync>),
}

/// In-process transport that hands every request straight to a [`Handler`]
///
/// Any destination is accepted. Handler errors come back as failure replies,
/// exactly as [`serve`](crate::inbound::serve) sends them over a socket.
/// Useful for tests and for wiring services together inside one process.
pub struct LoopbackTransport {
    responder: Responder,
    calls: CallCounter,
}

impl LoopbackTransport {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            responder: Responder::Handler(Box::new(handler)),
            calls: CallCounter::default(),
        }
    }

    /// Replies with the request body, unchanged
    pub fn echo() -> Self {
        Self::new(EchoHandler)
    }

    /// Replies to every request with the same body
    pub fn fixed(body: Vec<u8>) -> Self {
        Self::new(move |request: Envelope| -> Result<Envelope, TransportError> {
            Ok(request.reply(body.clone()))
        })
    }

    /// Fails every round-trip with the error built by `make_error`, as if
    /// the peer could not be reached. No handler runs.
    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> TransportError + Send + Sync + 'static,
    {
        Self {
            responder: Responder::Fault(Box::new(make_error)),
            calls: CallCounter::default(),
        }
    }

    /// A handle that keeps counting after the transport is moved into a channel
    pub fn counter(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait::async_trait]
impl Transport for LoopbackTransport {
    async fn send(
        &self,
        destination: &Destination,
        request: Envelope,
    ) -> Result<Envelope, TransportError> {
        self.calls.increment();
        tracing::trace!(%destination, id = request.id, "loopback dispatch");
        let handler = match &self.responder {
            Responder::Handler(handler) => handler,
            Responder::Fault(make_error) => return Err(make_error()),
        };

        let id = request.id;
        match handler.handle(request).await {
            Ok(reply) => Ok(reply),
            Err(err) => Ok(Envelope::failure_for(id, err.to_string())),
        }
    }
}
