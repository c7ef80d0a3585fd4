//! Snake-and-ladder.
//!
//! Cells run `1..=100`; `0` is the off-board start. Snakes and ladders are
//! jump tables carried in every snapshot (`{"16": 6}` means landing on 16
//! sends you to 6).

use std::collections::BTreeMap;
use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::{GameKind, Step, StepKind, SubjectId, TokenHint, TurnPhase};

/// The terminal cell.
pub const LAST_CELL: u32 = 100;

/// Largest single roll.
const MAX_ROLL: u32 = 6;

/// The server's turn marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnakesPhase {
    Rolling,
    Animating,
    Ended,
}

/// A snake-and-ladder snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnakesState {
    /// Cell of each seat's token.
    pub positions: Vec<u32>,
    pub current_turn: usize,
    pub turn_phase: SnakesPhase,
    #[serde(default)]
    pub last_roll: Option<u32>,
    #[serde(default)]
    pub snakes: BTreeMap<u32, u32>,
    #[serde(default)]
    pub ladders: BTreeMap<u32, u32>,
    /// Seat of the winner.
    #[serde(default)]
    pub winner: Option<usize>,
}

impl SnakesState {
    /// Where landing on `cell` sends you, with the teleport's step kind.
    fn jump_from(&self, cell: u32) -> Option<(u32, StepKind)> {
        if let Some(&to) = self.snakes.get(&cell) {
            return Some((to, StepKind::Chute));
        }
        self.ladders.get(&cell).map(|&to| (to, StepKind::Ladder))
    }
}

/// Snake-and-ladder.
pub struct SnakesAndLadders;

impl GameKind for SnakesAndLadders {
    type State = SnakesState;
    type Position = u32;
    type Square = Infallible;

    const NAME: &'static str = "snakes";

    fn phase(state: &SnakesState) -> TurnPhase {
        match state.turn_phase {
            SnakesPhase::Rolling => TurnPhase::AwaitingRoll,
            SnakesPhase::Animating => TurnPhase::Animating,
            SnakesPhase::Ended => TurnPhase::Idle,
        }
    }

    fn turn_owner(state: &SnakesState) -> Option<usize> {
        (state.current_turn < state.positions.len()).then_some(state.current_turn)
    }

    fn is_finished(state: &SnakesState) -> bool {
        state.winner.is_some() || state.turn_phase == SnakesPhase::Ended
    }

    fn positions(state: &SnakesState) -> BTreeMap<SubjectId, u32> {
        state
            .positions
            .iter()
            .enumerate()
            .map(|(seat, &cell)| (SubjectId::seat(seat), cell))
            .collect()
    }

    /// Walks cell by cell. If `to` is reachable only through a snake or
    /// ladder within one roll, walks to the trigger cell and then adds a
    /// single teleport step. The roll from a `game:tokenMove` hint picks
    /// the trigger when several would fit. A cell off the board is a
    /// single step.
    fn path(
        target: &SnakesState,
        _subject: SubjectId,
        from: &u32,
        to: &u32,
        hint: Option<&TokenHint>,
    ) -> Vec<Step<u32>> {
        let (from, to) = (*from, *to);
        if from == to {
            return Vec::new();
        }
        if from > LAST_CELL || to > LAST_CELL {
            return vec![Step::walk(to)];
        }

        let reach = from.saturating_add(MAX_ROLL).min(LAST_CELL);
        let hinted = hint.and_then(|h| from.checked_add(h.steps));
        if hinted == Some(to) {
            return walk(from, to);
        }

        let lands_on_to = |t: u32| target.jump_from(t).is_some_and(|(d, _)| d == to);
        let trigger = match hinted.filter(|&t| t <= reach && lands_on_to(t)) {
            Some(t) => Some(t),
            None if to > from && to <= reach => return walk(from, to),
            None => (from + 1..=reach).find(|&t| lands_on_to(t)),
        };

        if let Some(t) = trigger {
            let mut steps = walk(from, t);
            if let Some((_, kind)) = target.jump_from(t) {
                steps.push(Step::new(to, kind));
            }
            return steps;
        }

        if to > from {
            walk(from, to)
        } else {
            // Backwards without a snake (bounce-back or reset): one step.
            vec![Step::walk(to)]
        }
    }

    fn acknowledges_animation() -> bool {
        true
    }
}

/// Cells `from+1..=to`, the last one a `Finish` step on the terminal cell.
fn walk(from: u32, to: u32) -> Vec<Step<u32>> {
    (from + 1..=to)
        .map(|cell| {
            let kind = if cell == LAST_CELL {
                StepKind::Finish
            } else {
                StepKind::Walk
            };
            Step::new(cell, kind)
        })
        .collect()
}
