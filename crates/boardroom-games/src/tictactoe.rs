//! Tic-tac-toe. No animation; cells are claimed with `move {index}`.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::{GameKind, TurnPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicTacToeState {
    /// Nine cells, row by row.
    pub board: Vec<Option<Mark>>,
    pub current_turn: usize,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub is_draw: bool,
}

impl TicTacToeState {
    /// Whether `index` is on the board and unclaimed.
    pub fn is_open(&self, index: usize) -> bool {
        matches!(self.board.get(index), Some(None))
    }
}

pub struct TicTacToe;

impl GameKind for TicTacToe {
    type State = TicTacToeState;
    type Position = ();
    type Square = Infallible;

    const NAME: &'static str = "tictactoe";

    fn phase(state: &TicTacToeState) -> TurnPhase {
        if Self::is_finished(state) {
            TurnPhase::Idle
        } else {
            TurnPhase::AwaitingMove
        }
    }

    fn turn_owner(state: &TicTacToeState) -> Option<usize> {
        Some(state.current_turn)
    }

    fn is_finished(state: &TicTacToeState) -> bool {
        state.winner.is_some() || state.is_draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_board_with_nulls() {
        let json = r#"{"board":["X",null,null,null,"O",null,null,null,null],"currentTurn":0}"#;
        let s: TicTacToeState = serde_json::from_str(json).unwrap();
        assert!(!s.is_open(0));
        assert!(s.is_open(1));
        assert!(!s.is_open(9));
        assert_eq!(TicTacToe::phase(&s), TurnPhase::AwaitingMove);
    }

    #[test]
    fn test_draw_ends_the_game() {
        let s = TicTacToeState {
            board: vec![Some(Mark::X); 9],
            current_turn: 1,
            winner: None,
            is_draw: true,
        };
        assert_eq!(TicTacToe::phase(&s), TurnPhase::Idle);
    }
}
