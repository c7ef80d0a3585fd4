//! Error types for the session layer.

use boardroom_protocol::RoomCode;

/// Errors that can occur while joining, bootstrapping or leaving a room.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The HTTP request itself failed (DNS, TLS, connection reset, or a
    /// body that didn't decode into the expected shape).
    #[error("room API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server has no room with this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The server answered with a non-success status other than 404.
    #[error("room API returned status {status} for room {code}")]
    Status { code: RoomCode, status: u16 },

    /// The base URL (or a path built from it) is not a valid URL.
    #[error("invalid room API URL {0}")]
    InvalidUrl(String),

    /// The operation needs a joined room but the client hasn't joined or
    /// has already left.
    #[error("not joined to room {0}")]
    NotJoined(RoomCode),

    /// A username is required to join.
    #[error("username must not be empty")]
    EmptyUsername,
}
