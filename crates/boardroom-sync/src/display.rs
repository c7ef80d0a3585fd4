//! What the board currently shows.

use std::collections::BTreeMap;
use std::sync::Arc;

use boardroom_games::{GameKind, SubjectId};

/// The rendered state: the last snapshot the view has caught up with,
/// plus each subject's on-screen position.
///
/// While a token is animating, its position here trails the applied
/// snapshot one step at a time. Once the animation completes the
/// controller calls [`sync`](Self::sync) and the two converge.
pub struct DisplayState<G: GameKind> {
    snapshot: Option<Arc<G::State>>,
    positions: BTreeMap<SubjectId, G::Position>,
}

impl<G: GameKind> Default for DisplayState<G> {
    fn default() -> Self {
        Self {
            snapshot: None,
            positions: BTreeMap::new(),
        }
    }
}

impl<G: GameKind> DisplayState<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snaps the display to `snapshot`. Returns `false` when the display
    /// already shows this exact snapshot, so a repeated sync is a no-op.
    pub fn sync(&mut self, snapshot: Arc<G::State>) -> bool {
        if self
            .snapshot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &snapshot) || **current == *snapshot)
            && self.positions == G::positions(&snapshot)
        {
            return false;
        }
        self.positions = G::positions(&snapshot);
        self.snapshot = Some(snapshot);
        true
    }

    /// Moves one subject without touching the rest of the view.
    pub fn set_position(&mut self, subject: SubjectId, position: G::Position) {
        self.positions.insert(subject, position);
    }

    pub fn snapshot(&self) -> Option<&Arc<G::State>> {
        self.snapshot.as_ref()
    }

    pub fn position(&self, subject: SubjectId) -> Option<&G::Position> {
        self.positions.get(&subject)
    }

    pub fn positions(&self) -> &BTreeMap<SubjectId, G::Position> {
        &self.positions
    }

    /// Whether the view shows `state` exactly: same snapshot and every
    /// subject where `state` puts it.
    pub fn matches(&self, state: &G::State) -> bool {
        self.snapshot.as_deref() == Some(state) && self.positions == G::positions(state)
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
        self.positions.clear();
    }
}

impl<G: GameKind> std::fmt::Debug for DisplayState<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayState")
            .field("game", &G::NAME)
            .field("positions", &self.positions)
            .finish_non_exhaustive()
    }
}
