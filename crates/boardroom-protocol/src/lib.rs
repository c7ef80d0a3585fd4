//! Wire protocol for Boardroom.
//!
//! This crate defines the "language" a room page and the game server speak
//! over the real-time channel:
//!
//! - **Identity** ([`RoomCode`], [`SessionId`]) and room metadata
//!   ([`Player`], [`RoomSnapshot`], [`RoomStatus`]).
//! - **Events** ([`ServerEvent`], [`ClientEvent`]): one tagged variant per
//!   event name, each with a fixed payload shape.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong at the boundary.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw frames) and the sync
//! engine (snapshots and animation). It doesn't know about timers or
//! display state. It only knows how to turn frames into typed events and
//! reject the ones that don't fit.
//!
//! ```text
//! Transport (bytes) → Protocol (ServerEvent<S>) → Sync (snapshots, effects)
//! ```
//!
//! Game snapshots are generic: `ServerEvent<S>` carries whatever state type
//! the game kind declares, so a chess room decodes straight into its own
//! snapshot struct without an intermediate untyped value.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ActionData, ActionKind, ActionRequest, ClientEvent, LeaderboardEntry,
    MoveHint, Outcome, Player, RoomBootstrap, RoomCode, RoomSnapshot,
    RoomStatus, ServerEvent, SessionId,
};
