//! Game kinds for Boardroom.
//!
//! The server runs the rules; a room page only reads snapshots. This crate
//! describes, per game, how to read one:
//!
//! - [`GameKind`]: turn owner, [`TurnPhase`], animated subjects and the
//!   step path between two positions.
//! - [`SquareRules`]: advisory move candidates for square-based games.
//!
//! | Game | Animated | Acknowledges |
//! |---|---|---|
//! | [`SnakesAndLadders`] | one token per seat | yes |
//! | [`Ludo`] | four tokens per seat | yes |
//! | [`Monopoly`] | one token per seat | yes |
//! | [`Chess`] | no | no |
//! | [`TicTacToe`] | no | no |

pub mod chess;
mod error;
mod kind;
pub mod ludo;
pub mod monopoly;
pub mod snakes;
pub mod tictactoe;

pub use chess::{Chess, ChessState};
pub use error::FenError;
pub use kind::{GameKind, SquareRules, Step, StepKind, SubjectId, TokenHint, TurnPhase};
pub use ludo::{Ludo, LudoCell, LudoState};
pub use monopoly::{Monopoly, MonopolyState};
pub use snakes::{SnakesAndLadders, SnakesState};
pub use tictactoe::{TicTacToe, TicTacToeState};
