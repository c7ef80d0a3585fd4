//! The local browser session: who this room page is.
//!
//! Every roster entry is keyed by a [`SessionId`]. The room page mints one
//! when it first loads and keeps it for as long as the page session lives,
//! so a reload or a dropped channel rejoins as the *same* player instead of
//! taking a new seat.

use boardroom_protocol::SessionId;
use rand::Rng;

use crate::SessionError;

/// The local player's identity: a stable session id plus a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Stable per browser session. Matches [`Player::session_id`] in the
    /// roster once joined.
    ///
    /// [`Player::session_id`]: boardroom_protocol::Player::session_id
    pub session_id: SessionId,

    /// Display name shown to the other players.
    pub username: String,
}

impl SessionIdentity {
    /// Creates an identity with a freshly generated session id.
    ///
    /// # Errors
    /// Returns [`SessionError::EmptyUsername`] if `username` is blank.
    pub fn generate(username: impl Into<String>) -> Result<Self, SessionError> {
        Self::with_session_id(generate_session_id(), username)
    }

    /// Creates an identity that reuses a known session id (e.g. one kept
    /// across page reloads).
    ///
    /// # Errors
    /// Returns [`SessionError::EmptyUsername`] if `username` is blank.
    pub fn with_session_id(
        session_id: SessionId,
        username: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let username = username.into().trim().to_owned();
        if username.is_empty() {
            return Err(SessionError::EmptyUsername);
        }
        Ok(Self {
            session_id,
            username,
        })
    }
}

/// Generates a random 32-character hex session id (128 bits of entropy).
///
/// `rand::rng()` returns a thread-local, cryptographically secure RNG
/// that is seeded from the OS, so ids are not guessable.
pub(crate) fn generate_session_id() -> SessionId {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    // `{:02x}` formats each byte as two lowercase hex digits.
    let hex = bytes.iter().map(|b| format!("{b:02x}")).collect();
    SessionId(hex)
}
