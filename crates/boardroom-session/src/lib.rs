//! Room membership and local identity for Boardroom.
//!
//! This crate handles everything a room page knows about *who* it is and
//! *which room* it sits in:
//!
//! 1. **Identity**: the local browser session ([`SessionIdentity`])
//! 2. **Membership**: joining, tracking and leaving a room ([`RoomClient`])
//! 3. **Bootstrap**: fetching the room over REST when the page mounts or
//!    the channel reconnects ([`RoomApi`], [`HttpRoomApi`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Sync Layer (above)     ← asks "which seat am I?" before gating input
//!     ↕
//! Session Layer (this crate)  ← identity, roster, join/leave
//!     ↕
//! Protocol Layer (below) ← RoomCode, SessionId, RoomSnapshot, ClientEvent
//! ```

#![allow(async_fn_in_trait)]

mod api;
mod client;
mod error;
mod identity;

pub use api::{HttpRoomApi, RoomApi};
pub use client::{Membership, RoomClient};
pub use error::SessionError;
pub use identity::SessionIdentity;
