//! Authoritative snapshots as received and as applied.

use std::sync::Arc;

/// Holds the two snapshots the controller reasons about:
///
/// - **received**: the newest snapshot off the wire, even if it is still
///   buffered behind an animation. Superseding checks compare against it.
/// - **applied**: the snapshot the display is converging to. Buffered
///   snapshots are classified against it when they are released.
///
/// Snapshots are immutable and shared as `Arc`s; replacing one is a
/// pointer swap.
#[derive(Debug)]
pub struct SnapshotStore<S> {
    received: Option<Arc<S>>,
    applied: Option<Arc<S>>,
    valid_moves: Option<Vec<String>>,
    /// Number of snapshots received since the last clear.
    received_count: u64,
}

impl<S> Default for SnapshotStore<S> {
    fn default() -> Self {
        Self {
            received: None,
            applied: None,
            valid_moves: None,
            received_count: 0,
        }
    }
}

impl<S> SnapshotStore<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a snapshot off the wire and returns the one it replaces.
    pub fn receive(&mut self, snapshot: Arc<S>) -> Option<Arc<S>> {
        self.received_count += 1;
        self.received.replace(snapshot)
    }

    /// Marks a snapshot as applied and returns the previous one.
    pub fn apply(&mut self, snapshot: Arc<S>) -> Option<Arc<S>> {
        self.applied.replace(snapshot)
    }

    pub fn received(&self) -> Option<&Arc<S>> {
        self.received.as_ref()
    }

    pub fn applied(&self) -> Option<&Arc<S>> {
        self.applied.as_ref()
    }

    pub fn received_count(&self) -> u64 {
        self.received_count
    }

    /// Server-provided move hints from `game:start` (chess sends them as
    /// `"e2e4"`). Kept for display only.
    pub fn valid_moves(&self) -> Option<&[String]> {
        self.valid_moves.as_deref()
    }

    pub fn set_valid_moves(&mut self, moves: Option<Vec<String>>) {
        self.valid_moves = moves;
    }

    /// Forgets everything, so the next snapshot is a first snapshot.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
