use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use super::connection::Connection;

/// Idle connections keyed by destination.
///
/// A checked-out connection belongs to exactly one call until it is checked
/// back in. Only connections that finished a clean round-trip come back.
#[derive(Debug)]
pub(crate) struct Pool<K, S> {
    idle: Mutex<HashMap<K, Vec<Connection<S>>>>,
    max_idle: usize,
}

impl<K, S> Pool<K, S>
where
    K: Eq + Hash,
{
    pub(crate) fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(HashMap::new()),
            max_idle,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Vec<Connection<S>>>> {
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take an idle connection that passes `is_usable`. Ones that fail are
    /// dropped, closing their sockets.
    pub(crate) fn checkout<F>(&self, key: &K, is_usable: F) -> Option<Connection<S>>
    where
        F: Fn(&Connection<S>) -> bool,
    {
        let mut idle = self.lock();
        let slot = idle.get_mut(key)?;
        while let Some(conn) = slot.pop() {
            if is_usable(&conn) {
                return Some(conn);
            }
            tracing::debug!("discarding idle connection closed by peer");
        }
        None
    }

    /// Return a connection. Dropped (and closed) when the pool is full.
    pub(crate) fn checkin(&self, key: K, conn: Connection<S>) {
        let mut idle = self.lock();
        let slot = idle.entry(key).or_default();
        if slot.len() < self.max_idle {
            slot.push(conn);
        }
    }

    pub(crate) fn idle(&self, key: &K) -> usize {
        self.lock().get(key).map_or(0, Vec::len)
    }

    pub(crate) fn drain(&self) -> Vec<Connection<S>> {
        self.lock().drain().flat_map(|(_, conns)| conns).collect()
    }
}
