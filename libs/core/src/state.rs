use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of one outbound call.
///
/// Calls move forward through `Building -> Encoding -> Sending -> AwaitingReply
/// -> Decoding -> Complete`; any stage may instead end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CallState {
    Building = 0,
    Encoding = 1,
    Sending = 2,
    AwaitingReply = 3,
    Decoding = 4,
    Complete = 5,
    Failed = 6,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Complete | CallState::Failed)
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_advance_to(&self, next: CallState) -> bool {
        use CallState::*;
        match (self, next) {
            (Complete | Failed, _) => false,
            (_, Failed) => true,
            (Building, Encoding)
            | (Encoding, Sending)
            | (Sending, AwaitingReply)
            | (AwaitingReply, Decoding)
            | (Decoding, Complete) => true,
            _ => false,
        }
    }

    fn from_u8(value: u8) -> CallState {
        match value {
            0 => CallState::Building,
            1 => CallState::Encoding,
            2 => CallState::Sending,
            3 => CallState::AwaitingReply,
            4 => CallState::Decoding,
            5 => CallState::Complete,
            _ => CallState::Failed,
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Building => "BUILDING",
            CallState::Encoding => "ENCODING",
            CallState::Sending => "SENDING",
            CallState::AwaitingReply => "AWAITING_REPLY",
            CallState::Decoding => "DECODING",
            CallState::Complete => "COMPLETE",
            CallState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Shared view of a call's state.
///
/// Cloning gives another observer of the same call. Only legal forward
/// transitions are applied; anything else is ignored, so a terminal state
/// sticks.
#[derive(Debug, Clone)]
pub struct CallStateHandle {
    state: Arc<AtomicU8>,
}

impl CallStateHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(CallState::Building as u8)),
        }
    }

    pub fn get(&self) -> CallState {
        CallState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to `next`. Returns false when the transition is not allowed.
    pub fn advance(&self, next: CallState) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                CallState::from_u8(current)
                    .can_advance_to(next)
                    .then_some(next as u8)
            })
            .is_ok()
    }

    pub fn fail(&self) -> bool {
        self.advance(CallState::Failed)
    }
}

impl Default for CallStateHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_happy_path() {
        let handle = CallStateHandle::new();
        assert_eq!(handle.get(), CallState::Building);
        for next in [
            CallState::Encoding,
            CallState::Sending,
            CallState::AwaitingReply,
            CallState::Decoding,
            CallState::Complete,
        ] {
            assert!(handle.advance(next), "could not enter {next}");
        }
        assert_eq!(handle.get(), CallState::Complete);
        assert!(handle.get().is_terminal());
    }

    #[test]
    fn cannot_skip_stages() {
        let handle = CallStateHandle::new();
        assert!(!handle.advance(CallState::Sending));
        assert!(!handle.advance(CallState::Complete));
        assert_eq!(handle.get(), CallState::Building);
    }

    #[test]
    fn failure_is_terminal() {
        let handle = CallStateHandle::new();
        handle.advance(CallState::Encoding);
        assert!(handle.fail());
        assert!(!handle.advance(CallState::Sending));
        assert!(!handle.fail());
        assert_eq!(handle.get(), CallState::Failed);
    }

    #[test]
    fn clones_observe_the_same_call() {
        let handle = CallStateHandle::new();
        let observer = handle.clone();
        handle.advance(CallState::Encoding);
        assert_eq!(observer.get(), CallState::Encoding);
    }
}
