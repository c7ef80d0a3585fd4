//! Unified error type for Boardroom.

use boardroom_protocol::ProtocolError;
use boardroom_session::SessionError;
use boardroom_sync::SyncError;
use boardroom_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `boardroom` crate you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BoardroomError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (REST bootstrap, membership, identity).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A sync-level error (selection misuse).
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The channel could not be opened or written to.
    #[error("channel error: {0}")]
    Channel(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The runner builder is missing something.
    #[error("invalid runner configuration: {0}")]
    Config(&'static str),

    /// The room runner has stopped; the handle can no longer reach it.
    #[error("room runner has stopped")]
    RunnerClosed,
}

impl BoardroomError {
    /// Whether retrying cannot help: the room doesn't exist, the identity
    /// is unusable, or the session already left.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Session(
                    SessionError::NotFound(_)
                        | SessionError::InvalidUrl(_)
                        | SessionError::NotJoined(_)
                        | SessionError::EmptyUsername
                )
                | Self::Sync(SyncError::Session(SessionError::NotJoined(_)))
        )
    }
}
