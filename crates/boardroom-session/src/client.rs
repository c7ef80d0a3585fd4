//! Room membership: the page's view of the room it sits in.
//!
//! [`RoomClient`] owns the room metadata (code, status, roster) and the
//! local identity, and answers the one question every input gate needs:
//! *which seat am I?* A seat is never stored; it is the local session's
//! index in the roster and is re-derived on every roster replacement.
//!
//! ## Lifecycle
//!
//! ```text
//!   Idle ──join_event()──→ Joining ──bootstrap()/apply_update()──→ Joined
//!     │                       │                                      │
//!     └──────────────────── leave() ─────────────────────────────────┘
//!                                      ↓
//!                                    Left   (terminal, leave fires once)
//! ```

use boardroom_protocol::{
    ClientEvent, Player, RoomBootstrap, RoomCode, RoomSnapshot, RoomStatus,
};

use crate::{SessionError, SessionIdentity};

/// Where the client is in the join/leave lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Created, nothing sent yet.
    Idle,
    /// `room:join` sent; waiting for the room to come back.
    Joining,
    /// Room metadata received at least once.
    Joined,
    /// `room:leave` produced. Terminal.
    Left,
}

/// One room session: identity, room metadata and membership state.
#[derive(Debug, Clone)]
pub struct RoomClient {
    identity: SessionIdentity,
    room: RoomSnapshot,
    membership: Membership,
}

impl RoomClient {
    /// Creates a client for `code` that hasn't joined yet.
    pub fn new(code: RoomCode, identity: SessionIdentity) -> Self {
        Self {
            identity,
            room: RoomSnapshot::new(code),
            membership: Membership::Idle,
        }
    }

    /// The `room:join` event for this client.
    ///
    /// Can be produced again after a reconnect; the server treats a repeat
    /// join from the same session id as a rejoin.
    ///
    /// # Errors
    /// Returns [`SessionError::NotJoined`] once the client has left.
    pub fn join_event(&mut self) -> Result<ClientEvent, SessionError> {
        if self.membership == Membership::Left {
            return Err(SessionError::NotJoined(self.room.code.clone()));
        }
        if self.membership == Membership::Idle {
            self.membership = Membership::Joining;
        }
        tracing::info!(
            room = %self.room.code,
            session = %self.identity.session_id,
            "joining room"
        );
        Ok(ClientEvent::Join {
            room_code: self.room.code.clone(),
            session_id: self.identity.session_id.clone(),
            username: self.identity.username.clone(),
        })
    }

    /// Replaces room metadata from a REST bootstrap and returns the game
    /// snapshot, if any.
    ///
    /// A bootstrap for a different room code is ignored (logged) and
    /// yields `None`.
    pub fn bootstrap<S>(&mut self, bootstrap: RoomBootstrap<S>) -> Option<S> {
        if self.membership == Membership::Left {
            return None;
        }
        if bootstrap.room.code != self.room.code {
            tracing::warn!(
                room = %self.room.code,
                got = %bootstrap.room.code,
                "bootstrap for another room ignored"
            );
            return None;
        }
        self.room = bootstrap.room;
        self.membership = Membership::Joined;
        tracing::debug!(
            room = %self.room.code,
            seat = ?self.seat(),
            status = %self.room.status,
            "room bootstrapped"
        );
        bootstrap.game_state
    }

    /// Applies a `room:update`: the roster and status are replaced
    /// wholesale.
    ///
    /// Returns `true` if the local seat changed.
    pub fn apply_update(&mut self, players: Vec<Player>, status: RoomStatus) -> bool {
        if self.membership == Membership::Left {
            return false;
        }
        let before = self.seat();
        self.room.players = players;
        self.room.status = status;
        self.membership = Membership::Joined;
        let after = self.seat();
        if before != after {
            tracing::debug!(room = %self.room.code, ?before, ?after, "local seat changed");
        }
        before != after
    }

    /// Marks the room finished without a roster change (e.g. after a
    /// `game:winner`).
    pub fn mark_finished(&mut self) {
        self.room.status = RoomStatus::Finished;
    }

    /// Produces the `room:leave` event exactly once.
    ///
    /// Returns `None` if the client never sent a join or already left.
    pub fn leave(&mut self) -> Option<ClientEvent> {
        match self.membership {
            Membership::Idle | Membership::Left => {
                self.membership = Membership::Left;
                None
            }
            Membership::Joining | Membership::Joined => {
                self.membership = Membership::Left;
                tracing::info!(room = %self.room.code, "leaving room");
                Some(ClientEvent::Leave {})
            }
        }
    }

    /// The local player's seat: their index in the roster.
    pub fn seat(&self) -> Option<usize> {
        self.room.seat_of(&self.identity.session_id)
    }

    /// Whether the local player created the room.
    pub fn is_host(&self) -> bool {
        self.seat()
            .and_then(|seat| self.room.player_at(seat))
            .is_some_and(|p| p.is_host)
    }

    /// Whether the room has finished.
    pub fn is_finished(&self) -> bool {
        self.room.status == RoomStatus::Finished
    }

    pub fn code(&self) -> &RoomCode {
        &self.room.code
    }

    pub fn room(&self) -> &RoomSnapshot {
        &self.room
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn membership(&self) -> Membership {
        self.membership
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use boardroom_protocol::SessionId;

    use super::*;

    fn me() -> SessionIdentity {
        SessionIdentity::with_session_id(SessionId("me".into()), "alice").unwrap()
    }

    fn player(id: &str, host: bool) -> Player {
        Player {
            session_id: SessionId(id.into()),
            username: id.into(),
            is_host: host,
            is_connected: true,
        }
    }

    fn client() -> RoomClient {
        RoomClient::new(RoomCode::new("K7QX"), me())
    }

    // =====================================================================
    // Join
    // =====================================================================

    #[test]
    fn test_new_client_is_idle_without_seat() {
        let c = client();
        assert_eq!(c.membership(), Membership::Idle);
        assert_eq!(c.seat(), None);
        assert!(!c.is_finished());
    }

    #[test]
    fn test_join_event_carries_identity() {
        let mut c = client();
        let event = c.join_event().unwrap();
        assert_eq!(
            event,
            ClientEvent::Join {
                room_code: RoomCode::new("K7QX"),
                session_id: SessionId("me".into()),
                username: "alice".into(),
            }
        );
        assert_eq!(c.membership(), Membership::Joining);
    }

    #[test]
    fn test_join_after_leave_is_rejected() {
        let mut c = client();
        c.join_event().unwrap();
        c.leave();
        assert!(matches!(c.join_event(), Err(SessionError::NotJoined(_))));
    }

    // =====================================================================
    // Roster and seat
    // =====================================================================

    #[test]
    fn test_seat_is_roster_index() {
        let mut c = client();
        c.join_event().unwrap();
        let changed = c.apply_update(
            vec![player("host", true), player("me", false)],
            RoomStatus::Waiting,
        );
        assert!(changed);
        assert_eq!(c.seat(), Some(1));
        assert!(!c.is_host());
        assert_eq!(c.membership(), Membership::Joined);
    }

    #[test]
    fn test_seat_rederived_when_roster_reorders() {
        let mut c = client();
        c.apply_update(vec![player("a", true), player("me", false)], RoomStatus::Waiting);
        let changed = c.apply_update(vec![player("me", true)], RoomStatus::Playing);
        assert!(changed);
        assert_eq!(c.seat(), Some(0));
        assert!(c.is_host());
    }

    #[test]
    fn test_unchanged_seat_reports_false() {
        let mut c = client();
        c.apply_update(vec![player("me", false)], RoomStatus::Waiting);
        assert!(!c.apply_update(vec![player("me", false)], RoomStatus::Playing));
    }

    #[test]
    fn test_finished_status() {
        let mut c = client();
        c.apply_update(vec![player("me", false)], RoomStatus::Finished);
        assert!(c.is_finished());
    }

    // =====================================================================
    // Bootstrap
    // =====================================================================

    #[test]
    fn test_bootstrap_replaces_room_and_returns_game_state() {
        let mut c = client();
        let game = c.bootstrap(RoomBootstrap {
            room: RoomSnapshot {
                code: RoomCode::new("K7QX"),
                status: RoomStatus::Playing,
                players: vec![player("me", true)],
            },
            game_state: Some(42u32),
        });
        assert_eq!(game, Some(42));
        assert_eq!(c.seat(), Some(0));
        assert_eq!(c.room().status, RoomStatus::Playing);
    }

    #[test]
    fn test_bootstrap_for_other_room_is_ignored() {
        let mut c = client();
        let game = c.bootstrap(RoomBootstrap {
            room: RoomSnapshot::new(RoomCode::new("ZZZZ")),
            game_state: Some(1u32),
        });
        assert_eq!(game, None);
        assert_eq!(c.membership(), Membership::Idle);
    }

    // =====================================================================
    // Leave
    // =====================================================================

    #[test]
    fn test_leave_fires_exactly_once() {
        let mut c = client();
        c.join_event().unwrap();
        assert_eq!(c.leave(), Some(ClientEvent::Leave {}));
        assert_eq!(c.leave(), None);
        assert_eq!(c.membership(), Membership::Left);
    }

    #[test]
    fn test_leave_without_join_sends_nothing() {
        let mut c = client();
        assert_eq!(c.leave(), None);
    }

    #[test]
    fn test_updates_after_leave_are_ignored() {
        let mut c = client();
        c.join_event().unwrap();
        c.leave();
        assert!(!c.apply_update(vec![player("me", false)], RoomStatus::Playing));
        assert_eq!(c.seat(), None);
    }
}
