//! Chess.
//!
//! The snapshot carries the position as FEN. Pieces don't animate: every
//! chess transition is a direct sync, and the client's job is advisory
//! move candidates ([`legal_targets`]) plus the selection flow in the
//! sync engine.

mod board;
mod legality;

use std::collections::BTreeSet;

use boardroom_protocol::ActionData;
use serde::{Deserialize, Serialize};

pub use board::{Board, Color, Piece, PieceKind, Square};
pub use legality::{is_promotion, legal_targets};

use crate::{GameKind, SquareRules, TurnPhase};

/// Per-side clocks. Absent when the room plays without a time control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeControl {
    pub white_ms: u64,
    pub black_ms: u64,
    #[serde(default)]
    pub increment_ms: u64,
}

/// A chess snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChessState {
    pub fen: String,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub is_draw: bool,
    /// Free-form reason (`"checkmate"`, `"resignation"`, ...).
    #[serde(default)]
    pub game_result: Option<String>,
    /// The side that offered a draw, while the offer is open.
    #[serde(default)]
    pub draw_offer: Option<Color>,
    #[serde(default)]
    pub time_control: Option<TimeControl>,
    /// Last move in coordinate notation (`"e2e4"`).
    #[serde(default)]
    pub last_move: Option<String>,
}

impl ChessState {
    /// Parses the FEN, logging when it can't be read.
    pub fn board(&self) -> Option<Board> {
        match Board::from_fen(&self.fen) {
            Ok(board) => Some(board),
            Err(e) => {
                tracing::warn!(fen = %self.fen, error = %e, "unreadable FEN in snapshot");
                None
            }
        }
    }
}

/// Chess.
pub struct Chess;

impl GameKind for Chess {
    type State = ChessState;
    type Position = Square;
    type Square = Square;

    const NAME: &'static str = "chess";

    fn phase(state: &ChessState) -> TurnPhase {
        if Self::is_finished(state) {
            TurnPhase::Idle
        } else if state.draw_offer.is_some() {
            TurnPhase::DrawOffer
        } else {
            TurnPhase::AwaitingMove
        }
    }

    /// The side to move, except while a draw offer is open: then the side
    /// that must answer it.
    fn turn_owner(state: &ChessState) -> Option<usize> {
        if let Some(offered_by) = state.draw_offer {
            return Some(offered_by.opponent().seat());
        }
        state.board().map(|b| b.active.seat())
    }

    fn is_finished(state: &ChessState) -> bool {
        state.winner.is_some() || state.is_draw || state.game_result.is_some()
    }
}

impl SquareRules for Chess {
    fn legal_targets(state: &ChessState, from: Square) -> BTreeSet<Square> {
        state
            .board()
            .map(|b| legal_targets(&b, from))
            .unwrap_or_default()
    }

    fn owner_of(state: &ChessState, square: Square) -> Option<usize> {
        state
            .board()
            .and_then(|b| b.color_at(square))
            .map(Color::seat)
    }

    fn is_promotion(state: &ChessState, from: Square, to: Square) -> bool {
        state.board().is_some_and(|b| is_promotion(&b, from, to))
    }

    fn promotion_choices() -> &'static [char] {
        &['q', 'r', 'b', 'n']
    }

    fn move_data(from: Square, to: Square, promotion: Option<char>) -> ActionData {
        ActionData::Move {
            from: from.to_string(),
            to: to.to_string(),
            promotion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn state(fen: &str) -> ChessState {
        ChessState {
            fen: fen.into(),
            winner: None,
            is_draw: false,
            game_result: None,
            draw_offer: None,
            time_control: None,
            last_move: None,
        }
    }

    #[test]
    fn test_side_to_move_owns_the_turn() {
        assert_eq!(Chess::turn_owner(&state(START)), Some(0));
        let black = state("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        assert_eq!(Chess::turn_owner(&black), Some(1));
        assert_eq!(Chess::phase(&black), TurnPhase::AwaitingMove);
    }

    #[test]
    fn test_draw_offer_hands_turn_to_responder() {
        let mut s = state(START);
        s.draw_offer = Some(Color::White);
        assert_eq!(Chess::phase(&s), TurnPhase::DrawOffer);
        assert_eq!(Chess::turn_owner(&s), Some(1));
    }

    #[test]
    fn test_finished_game_is_idle() {
        let mut s = state(START);
        s.game_result = Some("resignation".into());
        assert!(Chess::is_finished(&s));
        assert_eq!(Chess::phase(&s), TurnPhase::Idle);
    }

    #[test]
    fn test_unreadable_fen_yields_no_targets_and_no_owner() {
        let s = state("not a fen");
        let e2: Square = "e2".parse().unwrap();
        assert!(Chess::legal_targets(&s, e2).is_empty());
        assert_eq!(Chess::turn_owner(&s), None);
        assert_eq!(Chess::owner_of(&s, e2), None);
    }

    #[test]
    fn test_owner_of_uses_piece_colour() {
        let s = state(START);
        assert_eq!(Chess::owner_of(&s, "e2".parse().unwrap()), Some(0));
        assert_eq!(Chess::owner_of(&s, "e7".parse().unwrap()), Some(1));
        assert_eq!(Chess::owner_of(&s, "e4".parse().unwrap()), None);
    }

    #[test]
    fn test_no_positions_means_direct_sync() {
        assert!(Chess::positions(&state(START)).is_empty());
        assert!(!Chess::acknowledges_animation());
    }

    #[test]
    fn test_move_data_uses_square_names() {
        let data = Chess::move_data("e7".parse().unwrap(), "e8".parse().unwrap(), Some('q'));
        assert_eq!(
            data,
            ActionData::Move {
                from: "e7".into(),
                to: "e8".into(),
                promotion: Some('q'),
            }
        );
    }

    #[test]
    fn test_missing_time_control_decodes_as_disabled() {
        let s: ChessState = serde_json::from_str(&format!(r#"{{"fen":"{START}"}}"#)).unwrap();
        assert_eq!(s.time_control, None);
        assert_eq!(s.draw_offer, None);
        assert!(!s.is_draw);
    }

    #[test]
    fn test_decodes_draw_offer_colour() {
        let s: ChessState = serde_json::from_str(&format!(
            r#"{{"fen":"{START}","drawOffer":"black","timeControl":{{"whiteMs":60000,"blackMs":58000}}}}"#
        ))
        .unwrap();
        assert_eq!(s.draw_offer, Some(Color::Black));
        assert_eq!(s.time_control.unwrap().increment_ms, 0);
    }
}
