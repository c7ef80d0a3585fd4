//! Core protocol types for Boardroom's real-time channel.
//!
//! Every type here travels "on the wire": it is serialized by the game
//! server, pushed over the channel, and deserialized by the room page (or
//! the other way round for client events).
//!
//! Frames are JSON objects with two keys:
//!
//! ```text
//! { "event": "game:state", "data": { "state": { ... } } }
//! ```
//!
//! `event` names the variant, `data` carries that variant's payload. Each
//! event name maps to exactly one Rust variant with a fixed payload shape,
//! so a malformed payload is rejected at decode time instead of being cast
//! at the call site.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The short shareable code that identifies a room (e.g. `"K7QX"`).
///
/// A "newtype wrapper" around `String`: you can't pass a `SessionId` where a
/// `RoomCode` is expected, even though both are strings underneath.
/// `#[serde(transparent)]` keeps the JSON form a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Creates a room code, normalising it to upper case.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one browser session. Stable for the lifetime of the page
/// session and the identity key of a [`Player`] in every roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Room metadata
// ---------------------------------------------------------------------------

/// Top-level lifecycle of a room as declared by the server.
///
/// `#[serde(rename_all = "lowercase")]` matches the wire: `"waiting"`,
/// `"playing"`, `"finished"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Players are gathering; no game snapshot yet.
    #[default]
    Waiting,
    /// A game is running.
    Playing,
    /// The game ended. Terminal: no further input is accepted.
    Finished,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

fn connected_by_default() -> bool {
    true
}

/// A member of a room's roster.
///
/// A player's seat (white/black, token colour, turn slot) is NOT stored
/// here; it is the player's index in [`RoomSnapshot::players`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Unique, stable per browser session.
    pub session_id: SessionId,
    /// Display name.
    pub username: String,
    /// Whether this player created the room.
    #[serde(default)]
    pub is_host: bool,
    /// Whether the player's channel is currently live. Older servers omit
    /// the field; a listed player is then assumed connected.
    #[serde(default = "connected_by_default")]
    pub is_connected: bool,
}

/// Room metadata: code, lifecycle status, and the ordered roster.
///
/// Replaced wholesale on every `room:update`; never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    #[serde(default)]
    pub status: RoomStatus,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl RoomSnapshot {
    /// Creates an empty, waiting room.
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            status: RoomStatus::Waiting,
            players: Vec::new(),
        }
    }

    /// Returns the seat index of the given session, if it is seated.
    pub fn seat_of(&self, session: &SessionId) -> Option<usize> {
        self.players.iter().position(|p| &p.session_id == session)
    }

    /// Returns the player sitting at `seat`.
    pub fn player_at(&self, seat: usize) -> Option<&Player> {
        self.players.get(seat)
    }

    /// Returns the host, if the roster names one.
    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }
}

/// The REST bootstrap payload: room metadata plus the current game
/// snapshot when a game is already running.
///
/// `#[serde(flatten)]` inlines the room fields, matching the wire shape
/// `{ code, status, players, gameState? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>"))]
pub struct RoomBootstrap<S> {
    #[serde(flatten)]
    pub room: RoomSnapshot,
    #[serde(default, rename = "gameState")]
    pub game_state: Option<S>,
}

// ---------------------------------------------------------------------------
// Inbound payload pieces
// ---------------------------------------------------------------------------

/// The `move` part of a `game:tokenMove` hint: who moved, and which token
/// when the game has several per player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHint {
    /// Seat index of the moving player.
    pub player: usize,
    #[serde(default)]
    pub token: Option<usize>,
}

/// One row of a final leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(default)]
    pub score: Option<i64>,
}

/// The result announced by `game:winner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Username (or session id, depending on the game) of the winner.
    /// `None` on a draw.
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub is_draw: bool,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
}

// ---------------------------------------------------------------------------
// ServerEvent: everything the room page receives
// ---------------------------------------------------------------------------

/// Events pushed by the server, generic over the game's snapshot type `S`.
///
/// `#[serde(tag = "event", content = "data")]` is serde's "adjacently
/// tagged" representation: the variant name goes in `event`, its payload
/// in `data`. Each variant is renamed to the exact event name the server
/// uses (`"game:state"`, `"room:update"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent<S> {
    /// Roster or room status changed.
    #[serde(rename = "room:update")]
    RoomUpdate {
        players: Vec<Player>,
        status: RoomStatus,
    },

    /// A new game began. `valid_moves` is an optional server-side hint
    /// list (chess sends moves like `"e2e4"`).
    #[serde(rename = "game:start")]
    GameStart {
        state: S,
        #[serde(default, rename = "validMoves")]
        valid_moves: Option<Vec<String>>,
    },

    /// Full authoritative snapshot replacement.
    #[serde(rename = "game:state")]
    GameState { state: S },

    /// Explicit animation hint: the mover and how many steps it rolled.
    #[serde(rename = "game:tokenMove")]
    TokenMove {
        steps: u32,
        #[serde(rename = "move")]
        movement: MoveHint,
    },

    /// The game ended.
    #[serde(rename = "game:winner")]
    Winner(Outcome),

    /// Theme change broadcast. Passed through untouched.
    #[serde(rename = "room:theme")]
    Theme {
        #[serde(rename = "themeId")]
        theme_id: String,
    },

    /// A transport-level error message from the server.
    #[serde(rename = "error")]
    Error { message: String },
}

impl<S> ServerEvent<S> {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomUpdate { .. } => "room:update",
            Self::GameStart { .. } => "game:start",
            Self::GameState { .. } => "game:state",
            Self::TokenMove { .. } => "game:tokenMove",
            Self::Winner(_) => "game:winner",
            Self::Theme { .. } => "room:theme",
            Self::Error { .. } => "error",
        }
    }

    /// Checks rules that the type system alone can't express.
    ///
    /// Decoding already guarantees the payload *shape*; this checks the
    /// payload *content*:
    /// - every roster entry has a non-empty, unique session id;
    /// - a token-move hint moves at least one step.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::RoomUpdate { players, .. } => {
                let mut seen = HashSet::with_capacity(players.len());
                for player in players {
                    if player.session_id.0.is_empty() {
                        return Err(ProtocolError::InvalidMessage(
                            "roster entry without session id".into(),
                        ));
                    }
                    if !seen.insert(&player.session_id) {
                        return Err(ProtocolError::InvalidMessage(format!(
                            "duplicate session id {} in roster",
                            player.session_id
                        )));
                    }
                }
                Ok(())
            }
            Self::TokenMove { steps: 0, .. } => Err(
                ProtocolError::InvalidMessage("token move of zero steps".into()),
            ),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientEvent: everything the room page sends
// ---------------------------------------------------------------------------

/// The action verbs a room page can ask the server to perform.
///
/// Serialized as camelCase strings: `"roll"`, `"completeTurn"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Roll,
    Move,
    Resign,
    /// "My client finished animating the last move."
    CompleteTurn,
    OfferDraw,
    AcceptDraw,
    DeclineDraw,
    Buy,
    Pass,
    PayBail,
    EndTurn,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Roll => "roll",
            Self::Move => "move",
            Self::Resign => "resign",
            Self::CompleteTurn => "completeTurn",
            Self::OfferDraw => "offerDraw",
            Self::AcceptDraw => "acceptDraw",
            Self::DeclineDraw => "declineDraw",
            Self::Buy => "buy",
            Self::Pass => "pass",
            Self::PayBail => "payBail",
            Self::EndTurn => "endTurn",
        };
        f.write_str(name)
    }
}

/// Optional action arguments.
///
/// `#[serde(untagged)]` means no discriminator on the wire. The shape of
/// the object tells the variants apart (`{from, to}` vs `{tokenIndex}` vs
/// `{index}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionData {
    /// A square-to-square move (chess). `promotion` is the piece letter
    /// chosen when a pawn reaches the far rank.
    Move {
        from: String,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promotion: Option<char>,
    },
    /// Which of the player's tokens to move (ludo).
    Token {
        #[serde(rename = "tokenIndex")]
        token_index: usize,
    },
    /// A board cell (tic-tac-toe, sudoku).
    Cell { index: usize },
}

/// The payload of `game:action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub room_code: RoomCode,
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ActionData>,
}

/// Events the room page emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Enter a room's channel.
    #[serde(rename = "room:join")]
    Join {
        #[serde(rename = "roomCode")]
        room_code: RoomCode,
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        username: String,
    },

    /// Leave the room. Payload is an empty object.
    #[serde(rename = "room:leave")]
    Leave {},

    /// Ask the server to perform a game action.
    #[serde(rename = "game:action")]
    Action(ActionRequest),

    /// Change the room theme.
    #[serde(rename = "room:theme")]
    Theme {
        #[serde(rename = "themeId")]
        theme_id: String,
    },
}

impl ClientEvent {
    /// Shorthand for a `game:action` event.
    pub fn action(
        room_code: RoomCode,
        action: ActionKind,
        data: Option<ActionData>,
    ) -> Self {
        Self::Action(ActionRequest {
            room_code,
            action,
            data,
        })
    }

    /// The action verb, when this is a `game:action`.
    pub fn action_kind(&self) -> Option<ActionKind> {
        match self {
            Self::Action(req) => Some(req.action),
            _ => None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
