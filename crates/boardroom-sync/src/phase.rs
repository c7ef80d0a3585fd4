//! Turn-phase tracking and the action-validity gate.
//!
//! The phase is never inferred locally: it is whatever the last applied
//! snapshot declares. The only local bit is the *floor*: while this
//! client's animation plays, input is blocked.

use boardroom_games::TurnPhase;
use boardroom_protocol::ActionKind;
use tracing::debug;

/// Tracks the applied phase and answers "may the local player do this now?".
#[derive(Debug, Clone, Default)]
pub struct TurnPhaseStateMachine {
    phase: TurnPhase,
    turn_owner: Option<usize>,
    local_seat: Option<usize>,
    finished: bool,
    /// A local animation job holds the floor.
    floor: bool,
    /// `completeTurn` already sent during the current Animating episode.
    ack_latched: bool,
}

impl TurnPhaseStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the phase and owner from a newly applied snapshot.
    ///
    /// Leaving `Animating` re-arms the acknowledgement latch.
    pub fn observe(&mut self, phase: TurnPhase, turn_owner: Option<usize>, finished: bool) {
        if phase != self.phase {
            debug!(from = %self.phase, to = %phase, ?turn_owner, "phase changed");
        }
        self.phase = phase;
        self.turn_owner = turn_owner;
        if finished {
            self.finished = true;
        }
        if phase != TurnPhase::Animating {
            self.ack_latched = false;
        }
    }

    pub fn set_local_seat(&mut self, seat: Option<usize>) {
        self.local_seat = seat;
    }

    pub fn set_floor(&mut self, held: bool) {
        self.floor = held;
    }

    /// Terminal: disables every input-producing action.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Back to the state before the first snapshot. The local seat is kept.
    pub fn reset(&mut self) {
        *self = Self {
            local_seat: self.local_seat,
            ..Self::default()
        };
    }

    /// Whether `action` is valid right now. Denials are logged at debug
    /// and are never errors.
    pub fn permits(&self, action: ActionKind) -> bool {
        let denial = self.denial(action);
        if let Some(reason) = denial {
            debug!(%action, phase = %self.phase, reason, "action gated");
        }
        denial.is_none()
    }

    fn denial(&self, action: ActionKind) -> Option<&'static str> {
        if self.finished {
            return Some("room finished");
        }
        let Some(seat) = self.local_seat else {
            return Some("not seated");
        };
        let required: &[TurnPhase] = match action {
            ActionKind::Resign => return None,
            ActionKind::CompleteTurn => return Some("acknowledgements are automatic"),
            ActionKind::Roll => &[TurnPhase::AwaitingRoll, TurnPhase::Jail],
            ActionKind::Move | ActionKind::OfferDraw => &[TurnPhase::AwaitingMove],
            ActionKind::AcceptDraw | ActionKind::DeclineDraw => &[TurnPhase::DrawOffer],
            ActionKind::Buy | ActionKind::Pass => &[TurnPhase::Decision],
            ActionKind::PayBail => &[TurnPhase::Jail],
            ActionKind::EndTurn => &[TurnPhase::EndTurn],
        };
        if !required.contains(&self.phase) {
            return Some("wrong phase");
        }
        if self.turn_owner != Some(seat) {
            return Some("not our turn");
        }
        if self.floor {
            return Some("animation in progress");
        }
        None
    }

    /// Whether the server waits on an acknowledgement this client never
    /// sent: Animating for the local seat, no local job, latch open.
    pub fn needs_recovery(&self) -> bool {
        !self.finished
            && !self.floor
            && !self.ack_latched
            && self.phase == TurnPhase::Animating
            && self.local_seat.is_some()
            && self.turn_owner == self.local_seat
    }

    /// Closes the latch. Returns `false` if it was already closed, in
    /// which case no acknowledgement may be sent.
    pub fn latch_ack(&mut self) -> bool {
        !std::mem::replace(&mut self.ack_latched, true)
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn turn_owner(&self) -> Option<usize> {
        self.turn_owner
    }

    pub fn local_seat(&self) -> Option<usize> {
        self.local_seat
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn holds_floor(&self) -> bool {
        self.floor
    }

    /// Whether it is the local player's turn, ignoring the phase.
    pub fn is_local_turn(&self) -> bool {
        self.local_seat.is_some() && self.turn_owner == self.local_seat
    }
}
