//! Monopoly.
//!
//! One token per player on a 40-cell ring. GO is cell 0, jail is cell 10
//! and "go to jail" is cell 30.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{GameKind, Step, StepKind, SubjectId, TokenHint, TurnPhase};

pub const BOARD_CELLS: u8 = 40;
pub const GO: u8 = 0;
pub const JAIL: u8 = 10;
pub const GO_TO_JAIL: u8 = 30;

/// Longest walk a roll of two dice can make.
const MAX_ROLL: u8 = 12;

/// The server's turn marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MonopolyPhase {
    Rolling,
    Animating,
    /// Landing effect being applied (rent, card).
    Resolving,
    /// Buy or pass on an unowned property.
    Decision,
    Jail,
    Debt,
    EndTurn,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonopolyPlayer {
    pub position: u8,
    pub money: i64,
    #[serde(default)]
    pub in_jail: bool,
    #[serde(default)]
    pub bankrupt: bool,
}

/// A monopoly snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonopolyState {
    pub players: Vec<MonopolyPlayer>,
    pub current_turn: usize,
    pub turn_phase: MonopolyPhase,
    #[serde(default)]
    pub dice: Option<[u8; 2]>,
    #[serde(default)]
    pub winner: Option<usize>,
}

/// Monopoly.
pub struct Monopoly;

impl GameKind for Monopoly {
    type State = MonopolyState;
    type Position = u8;
    type Square = Infallible;

    const NAME: &'static str = "monopoly";

    fn phase(state: &MonopolyState) -> TurnPhase {
        match state.turn_phase {
            MonopolyPhase::Rolling => TurnPhase::AwaitingRoll,
            MonopolyPhase::Animating => TurnPhase::Animating,
            MonopolyPhase::Resolving => TurnPhase::Resolving,
            MonopolyPhase::Decision => TurnPhase::Decision,
            MonopolyPhase::Jail => TurnPhase::Jail,
            MonopolyPhase::Debt => TurnPhase::Debt,
            MonopolyPhase::EndTurn => TurnPhase::EndTurn,
            MonopolyPhase::Ended => TurnPhase::Idle,
        }
    }

    fn turn_owner(state: &MonopolyState) -> Option<usize> {
        (state.current_turn < state.players.len()).then_some(state.current_turn)
    }

    fn is_finished(state: &MonopolyState) -> bool {
        state.winner.is_some() || state.turn_phase == MonopolyPhase::Ended
    }

    /// Bankrupt players leave the board and are not animated.
    fn positions(state: &MonopolyState) -> BTreeMap<SubjectId, u8> {
        state
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.bankrupt)
            .map(|(seat, p)| (SubjectId::seat(seat), p.position))
            .collect()
    }

    /// Walks forward around the ring. Passing or landing on GO is a
    /// `PassGo` step. Being sent to jail walks to the "go to jail" cell
    /// and then teleports with a `Jail` step. Moves longer than a roll
    /// (cards) are a single step.
    fn path(
        target: &MonopolyState,
        subject: SubjectId,
        from: &u8,
        to: &u8,
        _hint: Option<&TokenHint>,
    ) -> Vec<Step<u8>> {
        let (from, to) = (*from, *to);
        if from == to {
            return Vec::new();
        }
        if from >= BOARD_CELLS || to >= BOARD_CELLS {
            return vec![Step::walk(to)];
        }

        let jailed = target
            .players
            .get(subject.seat)
            .is_some_and(|p| p.in_jail);
        if jailed && to == JAIL {
            let to_trigger = distance(from, GO_TO_JAIL);
            if to_trigger > 0 && to_trigger <= MAX_ROLL {
                let mut steps = walk(from, to_trigger);
                steps.push(Step::new(JAIL, StepKind::Jail));
                return steps;
            }
            return vec![Step::new(JAIL, StepKind::Jail)];
        }

        let span = distance(from, to);
        if span <= MAX_ROLL {
            walk(from, span)
        } else {
            let kind = if to == GO { StepKind::PassGo } else { StepKind::Walk };
            vec![Step::new(to, kind)]
        }
    }

    fn acknowledges_animation() -> bool {
        true
    }

    fn step_delay() -> Duration {
        Duration::from_millis(200)
    }
}

/// Forward distance around the ring.
fn distance(from: u8, to: u8) -> u8 {
    (to + BOARD_CELLS - from) % BOARD_CELLS
}

/// `count` cells forward from `from`, wrapping at GO.
fn walk(from: u8, count: u8) -> Vec<Step<u8>> {
    (1..=count)
        .map(|i| {
            let cell = (from + i) % BOARD_CELLS;
            let kind = if cell == GO { StepKind::PassGo } else { StepKind::Walk };
            Step::new(cell, kind)
        })
        .collect()
}
