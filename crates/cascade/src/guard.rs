//! Reentrancy guard shared by every execution path.

use dashmap::DashSet;

use crate::key::ResourceKey;

/// Shared in-progress set making execution of any single resource safe
/// against reentrant re-entry.
///
/// A teardown action may, directly or through arbitrary call chains, ask the
/// tree to tear down the very resource that is currently executing. The
/// guard turns that nested request into a no-op: the key is added to the set
/// before the body runs and removed when the frame ends, so only the
/// outermost entry for a given key ever executes.
///
/// The set carries its own sharded locking, independent of the tree's
/// structural lock, so membership checks never contend with structural
/// mutation of unrelated subtrees, and unrelated guarded calls never block
/// on each other while user code runs.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    in_flight: DashSet<ResourceKey>,
}

impl ReentrancyGuard {
    /// Empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `body` unless `key` is already executing, in which case `None` is
    /// returned and `body` never runs.
    ///
    /// The key is held in the in-progress set only while `body` runs. It is
    /// released on normal return and on unwind alike.
    pub fn enter<T>(&self, key: ResourceKey, body: impl FnOnce() -> T) -> Option<T> {
        if !self.in_flight.insert(key) {
            return None;
        }
        let _slot = InFlight { guard: self, key };
        Some(body())
    }

    /// Whether `key` is currently executing.
    pub fn is_executing(&self, key: ResourceKey) -> bool {
        self.in_flight.contains(&key)
    }

    /// Number of executions currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Releases the key when the frame ends, unwind included.
struct InFlight<'a> {
    guard: &'a ReentrancyGuard,
    key: ResourceKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.remove(&self.key);
    }
}
