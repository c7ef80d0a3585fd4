//! Error types for the protocol layer.
//!
//! Each crate in Boardroom defines its own error enum. A `ProtocolError`
//! always means "this frame could not become a typed event", never a
//! network problem and never a game-rule problem.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into an event).
    ///
    /// Common causes: an unknown event name, a payload missing a required
    /// field, or a snapshot whose shape belongs to a different game.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event decoded but its payload breaks a protocol rule, e.g. a
    /// roster with two players sharing one session id, or a token-move
    /// hint of zero steps.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
