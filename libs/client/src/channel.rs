use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use switchboard_core::{Destination, Result};
use switchboard_fabric::transport::Transport;

/// A named, ready-to-use route to one remote service
///
/// Owns its transport for the lifetime of the client. Channels are shared by
/// every call made through them; each call borrows the channel and gets its
/// own correlation id from [`Channel::next_id`].
pub struct Channel {
    name: String,
    destination: Destination,
    transport: Box<dyn Transport>,
    sequence: AtomicU64,
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        destination: Destination,
        transport: impl Transport + 'static,
    ) -> Self {
        Self::from_boxed(name, destination, Box::new(transport))
    }

    pub(crate) fn from_boxed(
        name: impl Into<String>,
        destination: Destination,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            name: name.into(),
            destination,
            transport,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where calls go unless a request overrides it
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Next correlation id. Unique per channel, never reused.
    pub fn next_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Release the transport's pooled connections
    pub async fn close(&self) -> Result<()> {
        tracing::debug!(channel = %self.name, "closing channel");
        self.transport.close().await?;
        Ok(())
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use switchboard_fabric::LoopbackTransport;

    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let channel = Channel::new("echo", Destination::local("echo"), LoopbackTransport::echo());
        let first = channel.next_id();
        let second = channel.next_id();
        let third = channel.next_id();
        assert!(first < second && second < third);
    }

    #[test]
    fn exposes_name_and_destination() {
        let channel = Channel::new("echo", Destination::local("peer"), LoopbackTransport::echo());
        assert_eq!(channel.name(), "echo");
        assert_eq!(channel.destination(), &Destination::local("peer"));
        assert!(format!("{channel:?}").contains("echo"));
    }
}
