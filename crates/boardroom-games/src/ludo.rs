//! Ludo.
//!
//! Snapshots carry each token's *relative progress* from its own seat's
//! start: `-1` in the yard, `0..=50` on the shared 52-cell ring, `51..=55`
//! in the seat's home lane, `56` finished. The ring cell of a token is
//! `(13 × seat + progress) mod 52`.

use std::collections::BTreeMap;
use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::{GameKind, Step, StepKind, SubjectId, TokenHint, TurnPhase};

pub const TOKENS_PER_SEAT: usize = 4;
pub const RING_CELLS: i8 = 52;
pub const SEAT_OFFSET: i8 = 13;
pub const YARD: i8 = -1;
pub const LANE_START: i8 = 51;
pub const FINISHED: i8 = 56;

/// The server's turn marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LudoPhase {
    Rolling,
    /// Rolled; the turn owner picks a token.
    Moving,
    Animating,
    Ended,
}

/// A ludo snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LudoState {
    /// Relative progress of every token, per seat.
    pub tokens: Vec<[i8; TOKENS_PER_SEAT]>,
    pub current_turn: usize,
    pub turn_phase: LudoPhase,
    #[serde(default)]
    pub dice: Option<u8>,
    #[serde(default)]
    pub winner: Option<usize>,
}

/// Where a ludo token stands on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LudoCell {
    Yard { seat: usize, token: usize },
    /// Absolute ring cell, `0..52`.
    Track(u8),
    Lane { seat: usize, index: u8 },
    Finish { seat: usize },
}

impl LudoCell {
    /// The cell for a token with the given relative progress.
    pub fn from_progress(subject: SubjectId, progress: i8) -> Self {
        match progress {
            p if p < 0 => Self::Yard {
                seat: subject.seat,
                token: subject.token,
            },
            p if p < LANE_START => {
                let offset = (SEAT_OFFSET as usize * subject.seat) % RING_CELLS as usize;
                Self::Track(((offset + p as usize) % RING_CELLS as usize) as u8)
            }
            p if p < FINISHED => Self::Lane {
                seat: subject.seat,
                index: (p - LANE_START) as u8,
            },
            _ => Self::Finish { seat: subject.seat },
        }
    }

    /// The relative progress of this cell for `seat`.
    pub fn progress(self, seat: usize) -> i8 {
        match self {
            Self::Yard { .. } => YARD,
            Self::Track(cell) => {
                let offset = (SEAT_OFFSET as usize * seat) % RING_CELLS as usize;
                ((cell as usize + RING_CELLS as usize - offset) % RING_CELLS as usize) as i8
            }
            Self::Lane { index, .. } => LANE_START + index as i8,
            Self::Finish { .. } => FINISHED,
        }
    }
}

/// Ludo.
pub struct Ludo;

impl GameKind for Ludo {
    type State = LudoState;
    type Position = LudoCell;
    type Square = Infallible;

    const NAME: &'static str = "ludo";

    fn phase(state: &LudoState) -> TurnPhase {
        match state.turn_phase {
            LudoPhase::Rolling => TurnPhase::AwaitingRoll,
            LudoPhase::Moving => TurnPhase::AwaitingMove,
            LudoPhase::Animating => TurnPhase::Animating,
            LudoPhase::Ended => TurnPhase::Idle,
        }
    }

    fn turn_owner(state: &LudoState) -> Option<usize> {
        (state.current_turn < state.tokens.len()).then_some(state.current_turn)
    }

    fn is_finished(state: &LudoState) -> bool {
        state.winner.is_some() || state.turn_phase == LudoPhase::Ended
    }

    fn positions(state: &LudoState) -> BTreeMap<SubjectId, LudoCell> {
        let mut out = BTreeMap::new();
        for (seat, tokens) in state.tokens.iter().enumerate() {
            for (token, &progress) in tokens.iter().enumerate() {
                let subject = SubjectId::new(seat, token);
                out.insert(subject, LudoCell::from_progress(subject, progress));
            }
        }
        out
    }

    /// Forward walk by progress, with zone transitions as special steps:
    /// leaving the yard is `Enter`, the first lane cell `LaneEntry`, the
    /// last cell `Finish`. Going back to the yard is one `Captured` step.
    fn path(
        _target: &LudoState,
        subject: SubjectId,
        from: &LudoCell,
        to: &LudoCell,
        _hint: Option<&TokenHint>,
    ) -> Vec<Step<LudoCell>> {
        let (from_p, to_p) = (from.progress(subject.seat), to.progress(subject.seat));
        if from_p == to_p {
            return Vec::new();
        }
        if to_p == YARD {
            return vec![Step::new(*to, StepKind::Captured)];
        }
        if to_p < from_p {
            return vec![Step::walk(*to)];
        }

        let mut steps = Vec::new();
        let mut start = from_p;
        if from_p == YARD {
            steps.push(Step::new(LudoCell::from_progress(subject, 0), StepKind::Enter));
            start = 0;
        }
        for p in start + 1..=to_p {
            let kind = match p {
                FINISHED => StepKind::Finish,
                LANE_START => StepKind::LaneEntry,
                _ => StepKind::Walk,
            };
            steps.push(Step::new(LudoCell::from_progress(subject, p), kind));
        }
        steps
    }

    fn acknowledges_animation() -> bool {
        true
    }

    fn step_delay() -> std::time::Duration {
        std::time::Duration::from_millis(250)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: SubjectId = SubjectId { seat: 0, token: 0 };
    const GREEN: SubjectId = SubjectId { seat: 1, token: 2 };

    fn cell(subject: SubjectId, p: i8) -> LudoCell {
        LudoCell::from_progress(subject, p)
    }

    fn state() -> LudoState {
        LudoState {
            tokens: vec![[-1; 4], [-1; 4]],
            current_turn: 0,
            turn_phase: LudoPhase::Rolling,
            dice: None,
            winner: None,
        }
    }

    fn path(subject: SubjectId, from: i8, to: i8) -> Vec<Step<LudoCell>> {
        Ludo::path(&state(), subject, &cell(subject, from), &cell(subject, to), None)
    }

    #[test]
    fn test_seat_offset_on_the_ring() {
        assert_eq!(cell(RED, 0), LudoCell::Track(0));
        assert_eq!(cell(GREEN, 0), LudoCell::Track(13));
        assert_eq!(cell(SubjectId::new(3, 0), 19), LudoCell::Track(6));
    }

    #[test]
    fn test_progress_round_trips_through_cells() {
        for p in -1..=FINISHED {
            assert_eq!(cell(GREEN, p).progress(GREEN.seat), p);
        }
    }

    #[test]
    fn test_leaving_yard_is_enter_step() {
        let steps = path(RED, YARD, 0);
        assert_eq!(steps, vec![Step::new(LudoCell::Track(0), StepKind::Enter)]);
    }

    #[test]
    fn test_walk_wraps_around_the_ring() {
        // Seat 3 starts at 39; progress 10..=14 crosses cell 51 → 0.
        let blue = SubjectId::new(3, 0);
        let steps = path(blue, 10, 14);
        let cells: Vec<LudoCell> = steps.iter().map(|s| s.position).collect();
        assert_eq!(
            cells,
            vec![
                LudoCell::Track(50),
                LudoCell::Track(51),
                LudoCell::Track(0),
                LudoCell::Track(1),
            ]
        );
    }

    #[test]
    fn test_entering_home_lane_and_finishing() {
        let steps = path(RED, 49, FINISHED);
        let kinds: Vec<StepKind> = steps.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Walk,      // 50
                StepKind::LaneEntry, // 51
                StepKind::Walk,
                StepKind::Walk,
                StepKind::Walk,
                StepKind::Walk,
                StepKind::Finish, // 56
            ]
        );
        assert_eq!(steps.last().unwrap().position, LudoCell::Finish { seat: 0 });
    }

    #[test]
    fn test_capture_is_single_step_home() {
        let steps = path(GREEN, 20, YARD);
        assert_eq!(
            steps,
            vec![Step::new(
                LudoCell::Yard { seat: 1, token: 2 },
                StepKind::Captured
            )]
        );
    }

    #[test]
    fn test_positions_cover_every_token() {
        let mut s = state();
        s.tokens[1][2] = 5;
        let positions = Ludo::positions(&s);
        assert_eq!(positions.len(), 8);
        assert_eq!(positions[&GREEN], LudoCell::Track(18));
    }

    #[test]
    fn test_moving_phase_awaits_token_choice() {
        let mut s = state();
        s.turn_phase = LudoPhase::Moving;
        assert_eq!(Ludo::phase(&s), TurnPhase::AwaitingMove);
    }
}
