//! # Boardroom
//!
//! Client-side state reconciliation and animation sequencing for
//! multiplayer board-game rooms.
//!
//! The game server is authoritative: it pushes whole-state snapshots over
//! a real-time channel and accepts action requests. Boardroom keeps a
//! room page consistent with those snapshots while still animating token
//! movement step by step, gating the player's input by turn phase, and
//! recovering from reloads and reconnects without double-submitting.
//!
//! Pick a [`GameKind`](boardroom_games::GameKind), build a [`RoomRunner`],
//! run it, and paint whatever arrives on the [`RoomHandle`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boardroom::prelude::*;
//!
//! # async fn demo() -> Result<(), BoardroomError> {
//! boardroom::telemetry::init_tracing();
//!
//! let (runner, mut handle) = RoomRunnerBuilder::new()
//!     .room(RoomCode::new("K7QX"))
//!     .username("alice")
//!     .build::<SnakesAndLadders, _, _>(
//!         WebSocketConnector::new("ws://localhost:3001/socket"),
//!         HttpRoomApi::new("http://localhost:3001/api")?,
//!     )?;
//!
//! let view = async move {
//!     while let Some(update) = handle.next_update().await {
//!         if let ViewUpdate::Frame(frame) = update {
//!             if frame.is_local_turn() && handle.roll().await.is_err() {
//!                 break;
//!             }
//!         }
//!     }
//! };
//! let (result, ()) = tokio::join!(runner.run(), view);
//! result
//! # }
//! ```

mod error;
mod handle;
mod runner;
pub mod telemetry;
mod view;

pub use error::BoardroomError;
pub use handle::RoomHandle;
pub use runner::{RoomRunner, RoomRunnerBuilder, RunnerConfig};
pub use view::{ViewFrame, ViewUpdate};

pub use boardroom_cadence as cadence;
pub use boardroom_games as games;
pub use boardroom_protocol as protocol;
pub use boardroom_session as session;
pub use boardroom_sync as sync;
pub use boardroom_transport as transport;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::{
        BoardroomError, RoomHandle, RoomRunner, RoomRunnerBuilder, RunnerConfig, ViewFrame,
        ViewUpdate,
    };

    pub use boardroom_cadence::LatePolicy;
    pub use boardroom_games::{
        Chess, ChessState, GameKind, Ludo, LudoState, Monopoly, MonopolyState, SnakesAndLadders,
        SnakesState, SquareRules, StepKind, SubjectId, TicTacToe, TicTacToeState, TurnPhase,
    };
    pub use boardroom_protocol::{
        ActionData, ActionKind, Outcome, RoomCode, RoomSnapshot, RoomStatus, SessionId,
    };
    pub use boardroom_session::{HttpRoomApi, RoomApi, SessionIdentity};
    pub use boardroom_sync::{Cue, Selection, SyncConfig};
    pub use boardroom_transport::{Connection, ConnectionStatus, Connector};

    #[cfg(feature = "websocket")]
    pub use boardroom_transport::WebSocketConnector;
}
