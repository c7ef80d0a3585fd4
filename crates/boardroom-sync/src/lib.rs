//! Client-side state reconciliation for Boardroom rooms.
//!
//! The server is the only source of truth. This crate decides *how* each
//! new snapshot reaches the screen:
//!
//! - [`SnapshotStore`]: the last received and last applied snapshots.
//! - [`DisplayState`]: what the board currently shows.
//! - [`AnimationScheduler`]: step-by-step playback of one token move.
//! - [`TurnPhaseStateMachine`]: phase tracking and the action gate.
//! - [`Selection`]: the pending piece pick for square-based games.
//! - [`ReconciliationController`]: ties them together and turns every
//!   server event or cadence tick into a list of [`Effect`]s.
//!
//! Everything here is sans-IO. A runner owns the connection and the clock:
//!
//! ```text
//! ServerEvent ──► controller.handle() ──► Vec<Effect> ──► send / redraw / cue
//! cadence tick ─► controller.advance() ─► Vec<Effect>
//! ```

mod animation;
mod config;
mod controller;
mod display;
mod error;
mod phase;
mod selection;
mod store;

pub use animation::{AnimationJob, AnimationScheduler, CompletedJob, JobId, StepOutcome};
pub use config::SyncConfig;
pub use controller::{Cue, Effect, ReconciliationController};
pub use display::DisplayState;
pub use error::SyncError;
pub use phase::TurnPhaseStateMachine;
pub use selection::Selection;
pub use store::SnapshotStore;
