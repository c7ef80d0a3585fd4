//! What the runner tells the view.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use boardroom_cadence::CadenceMetrics;
use boardroom_games::{GameKind, SubjectId, TurnPhase};
use boardroom_protocol::{Outcome, RoomSnapshot};
use boardroom_sync::{Cue, ReconciliationController, Selection};
use boardroom_transport::ConnectionStatus;

/// Everything needed to paint the room once.
pub struct ViewFrame<G: GameKind> {
    /// The snapshot the board has caught up with.
    pub snapshot: Option<Arc<G::State>>,
    /// On-screen position of every animated subject.
    pub positions: BTreeMap<SubjectId, G::Position>,
    pub phase: TurnPhase,
    pub turn_owner: Option<usize>,
    pub local_seat: Option<usize>,
    pub animating: bool,
    pub room: RoomSnapshot,
    pub selection: Selection<G::Square>,
    /// Playback health so far (late and dropped steps).
    pub playback: CadenceMetrics,
}

impl<G: GameKind> ViewFrame<G> {
    pub(crate) fn capture(
        controller: &ReconciliationController<G>,
        playback: &CadenceMetrics,
    ) -> Self {
        let display = controller.display();
        let gate = controller.gate();
        Self {
            snapshot: display.snapshot().cloned(),
            positions: display.positions().clone(),
            phase: gate.phase(),
            turn_owner: gate.turn_owner(),
            local_seat: gate.local_seat(),
            animating: controller.is_animating(),
            room: controller.client().room().clone(),
            selection: controller.selection().clone(),
            playback: playback.clone(),
        }
    }

    /// Whether the local player may act now (ignoring which action).
    pub fn is_local_turn(&self) -> bool {
        self.local_seat.is_some() && self.turn_owner == self.local_seat && !self.animating
    }
}

impl<G: GameKind> Clone for ViewFrame<G> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            positions: self.positions.clone(),
            phase: self.phase,
            turn_owner: self.turn_owner,
            local_seat: self.local_seat,
            animating: self.animating,
            room: self.room.clone(),
            selection: self.selection.clone(),
            playback: self.playback.clone(),
        }
    }
}

/// One message from the runner to the view.
pub enum ViewUpdate<G: GameKind> {
    /// Channel health changed.
    Status(ConnectionStatus),
    /// Repaint with this frame.
    Frame(ViewFrame<G>),
    /// Play the sound for a special step.
    Cue(Cue),
    /// Show `message` for `ttl`, then hide it.
    Notice { message: String, ttl: Duration },
    /// The game ended.
    Outcome(Outcome),
    /// The room theme changed.
    Theme(String),
}

impl<G: GameKind> ViewUpdate<G> {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Frame(_) => "frame",
            Self::Cue(_) => "cue",
            Self::Notice { .. } => "notice",
            Self::Outcome(_) => "outcome",
            Self::Theme(_) => "theme",
        }
    }
}
