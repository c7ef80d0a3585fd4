//! REST bootstrap: fetching a room before (or instead of) the channel.
//!
//! The real-time channel only pushes *changes*. A page that mounts in the
//! middle of a game, or that reconnects after a drop, has missed everything
//! before that, so it first asks the server for the whole room over HTTP.
//!
//! Boardroom defines the [`RoomApi`] trait for this and ships
//! [`HttpRoomApi`], a `reqwest` implementation. Tests and embedders can
//! plug in their own (an in-memory fake, a cached copy, ...).

use boardroom_protocol::{RoomBootstrap, RoomCode};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{SessionError, SessionIdentity};

/// Fetches and joins rooms over the REST boundary.
///
/// # Trait bounds
///
/// - `Send + Sync` → one API client is shared by the runner across
///   reconnects.
/// - `'static` → it lives as long as the runner.
///
/// # Example
///
/// ```rust
/// use boardroom_protocol::{RoomBootstrap, RoomCode, RoomSnapshot};
/// use boardroom_session::{RoomApi, SessionError, SessionIdentity};
/// use serde::de::DeserializeOwned;
///
/// /// Always returns an empty waiting room.
/// struct EmptyRooms;
///
/// impl RoomApi for EmptyRooms {
///     async fn fetch_room<S: DeserializeOwned + Send>(
///         &self,
///         code: &RoomCode,
///     ) -> Result<RoomBootstrap<S>, SessionError> {
///         Ok(RoomBootstrap {
///             room: RoomSnapshot::new(code.clone()),
///             game_state: None,
///         })
///     }
///
///     async fn join_room(
///         &self,
///         _code: &RoomCode,
///         _identity: &SessionIdentity,
///     ) -> Result<(), SessionError> {
///         Ok(())
///     }
/// }
/// ```
pub trait RoomApi: Send + Sync + 'static {
    /// `GET {base}/rooms/{code}`: the room metadata plus the current game
    /// snapshot when a game is running.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] on 404, [`SessionError::Status`] on any
    /// other non-success status, [`SessionError::Http`] when the request
    /// or body decoding fails.
    async fn fetch_room<S: DeserializeOwned + Send>(
        &self,
        code: &RoomCode,
    ) -> Result<RoomBootstrap<S>, SessionError>;

    /// `POST {base}/rooms/{code}/join` with `{sessionId, username}`.
    async fn join_room(
        &self,
        code: &RoomCode,
        identity: &SessionIdentity,
    ) -> Result<(), SessionError>;
}

/// Body of the join request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinBody<'a> {
    session_id: &'a str,
    username: &'a str,
}

/// [`RoomApi`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRoomApi {
    client: reqwest::Client,
    base: String,
}

impl HttpRoomApi {
    /// Creates a client for `base` (e.g. `http://localhost:3001/api`).
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidUrl`] unless `base` is an `http` or
    /// `https` URL.
    pub fn new(base: impl Into<String>) -> Result<Self, SessionError> {
        Self::with_client(reqwest::Client::new(), base)
    }

    /// Like [`new`](Self::new) but reuses an existing `reqwest::Client`
    /// (connection pool, timeouts, proxy settings).
    pub fn with_client(
        client: reqwest::Client,
        base: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let base = base.into().trim_end_matches('/').to_owned();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(SessionError::InvalidUrl(base));
        }
        Ok(Self { client, base })
    }

    /// The base URL, without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn room_url(&self, code: &RoomCode) -> String {
        format!("{}/rooms/{}", self.base, code)
    }
}

/// Maps a non-success status to the matching error.
fn check_status(code: &RoomCode, status: StatusCode) -> Result<(), SessionError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::NOT_FOUND {
        Err(SessionError::NotFound(code.clone()))
    } else {
        Err(SessionError::Status {
            code: code.clone(),
            status: status.as_u16(),
        })
    }
}

impl RoomApi for HttpRoomApi {
    async fn fetch_room<S: DeserializeOwned + Send>(
        &self,
        code: &RoomCode,
    ) -> Result<RoomBootstrap<S>, SessionError> {
        let url = self.room_url(code);
        tracing::debug!(room = %code, %url, "fetching room");

        let response = self.client.get(&url).send().await?;
        check_status(code, response.status())?;
        let bootstrap = response.json::<RoomBootstrap<S>>().await?;

        tracing::debug!(
            room = %code,
            status = %bootstrap.room.status,
            players = bootstrap.room.players.len(),
            has_game = bootstrap.game_state.is_some(),
            "room fetched"
        );
        Ok(bootstrap)
    }

    async fn join_room(
        &self,
        code: &RoomCode,
        identity: &SessionIdentity,
    ) -> Result<(), SessionError> {
        let url = format!("{}/join", self.room_url(code));
        let body = JoinBody {
            session_id: identity.session_id.as_str(),
            username: &identity.username,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        check_status(code, response.status())?;

        tracing::info!(room = %code, session = %identity.session_id, "joined over REST");
        Ok(())
    }
}
