//! Error types for the sync layer.
//!
//! Most mistakes in this layer are *not* errors: an action sent in the
//! wrong phase is a silent no-op, a malformed frame never gets this far.
//! `SyncError` is for calls the embedding UI should never make.

use boardroom_session::SessionError;

/// Errors that can occur when driving a reconciliation controller.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Membership refused the operation (e.g. joining after leaving).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A promotion piece was chosen while no promotion was pending.
    #[error("no promotion is pending")]
    NoPendingPromotion,

    /// The chosen piece isn't one of the game's promotion choices.
    #[error("{0:?} is not a promotion choice")]
    InvalidPromotion(char),
}
