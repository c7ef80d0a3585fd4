//! `RoomRunner` builder and event loop.
//!
//! This is the entry point for running a room. It ties together all the
//! layers: transport → protocol → sync → view.
//!
//! The runner is one task with one `tokio::select!` loop over three
//! sources:
//!
//! ```text
//!   view commands ──┐
//!   channel frames ─┼─► ReconciliationController ─► Effects ─► channel / view
//!   cadence steps ──┘
//! ```
//!
//! Nothing is shared and nothing is locked: the controller is a plain
//! `&mut self` value owned by the loop.

use std::time::Duration;

use boardroom_cadence::{Cadence, CadenceConfig, LatePolicy};
use boardroom_games::GameKind;
use boardroom_protocol::{ClientEvent, Codec, JsonCodec, RoomCode, ServerEvent};
use boardroom_session::{RoomApi, RoomClient, SessionIdentity};
use boardroom_sync::{Effect, ReconciliationController, SyncConfig};
use boardroom_transport::{Connection, ConnectionStatus, Connector};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};

use crate::BoardroomError;
use crate::handle::{RoomCommand, RoomHandle};
use crate::view::{ViewFrame, ViewUpdate};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Runner settings.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub sync: SyncConfig,

    /// What to do when a step fires late. Skipping keeps the animation
    /// smooth; catching up keeps it short.
    pub late_policy: LatePolicy,

    /// First delay before reconnecting. Doubles on each failed attempt.
    pub reconnect_backoff: Duration,

    /// Upper bound for the reconnect delay.
    pub max_backoff: Duration,

    /// Treat the channel as dead after this long without a frame.
    /// `None` waits forever (a chess player may think for minutes).
    pub receive_timeout: Option<Duration>,

    /// Capacity of the command channel from the handle.
    pub command_buffer: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            late_policy: LatePolicy::default(),
            reconnect_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            receive_timeout: None,
            command_buffer: 32,
        }
    }
}

impl RunnerConfig {
    /// Fix out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        const MIN_BACKOFF: Duration = Duration::from_millis(10);
        if self.reconnect_backoff < MIN_BACKOFF {
            warn!(
                backoff_ms = self.reconnect_backoff.as_millis() as u64,
                "reconnect_backoff too small, clamping to 10ms"
            );
            self.reconnect_backoff = MIN_BACKOFF;
        }
        if self.max_backoff < self.reconnect_backoff {
            warn!("max_backoff below reconnect_backoff, raising it");
            self.max_backoff = self.reconnect_backoff;
        }
        if self.receive_timeout.is_some_and(|t| t.is_zero()) {
            warn!("receive_timeout is 0, disabling it");
            self.receive_timeout = None;
        }
        if self.command_buffer == 0 {
            warn!("command_buffer is 0, using 1");
            self.command_buffer = 1;
        }
        self
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.reconnect_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a room runner.
///
/// # Example
///
/// ```rust,ignore
/// use boardroom::prelude::*;
///
/// let (runner, mut handle) = RoomRunnerBuilder::new()
///     .room(RoomCode::new("K7QX"))
///     .username("alice")
///     .build::<SnakesAndLadders, _, _>(
///         WebSocketConnector::new("ws://localhost:3001/socket"),
///         HttpRoomApi::new("http://localhost:3001/api")?,
///     )?;
/// tokio::spawn(runner.run());
/// while let Some(update) = handle.next_update().await { /* paint */ }
/// ```
#[derive(Debug, Default)]
pub struct RoomRunnerBuilder {
    room: Option<RoomCode>,
    username: Option<String>,
    identity: Option<SessionIdentity>,
    config: RunnerConfig,
}

impl RoomRunnerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the room to join.
    pub fn room(mut self, code: RoomCode) -> Self {
        self.room = Some(code);
        self
    }

    /// Joins under a fresh session id with this display name.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Joins with a known identity (e.g. one kept across reloads). Takes
    /// precedence over [`username`](Self::username).
    pub fn identity(mut self, identity: SessionIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn sync_config(mut self, sync: SyncConfig) -> Self {
        self.config.sync = sync;
        self
    }

    pub fn late_policy(mut self, policy: LatePolicy) -> Self {
        self.config.late_policy = policy;
        self
    }

    pub fn reconnect_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.reconnect_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.config.receive_timeout = Some(timeout);
        self
    }

    /// Builds the runner and the handle the view uses to drive it.
    ///
    /// # Errors
    /// [`BoardroomError::Config`] without a room code or identity, or a
    /// session error for a blank username.
    pub fn build<G, C, A>(
        self,
        connector: C,
        api: A,
    ) -> Result<(RoomRunner<G, C, A>, RoomHandle<G>), BoardroomError>
    where
        G: GameKind,
        C: Connector,
        A: RoomApi,
    {
        let code = self.room.ok_or(BoardroomError::Config("room code is required"))?;
        let identity = match (self.identity, self.username) {
            (Some(identity), _) => identity,
            (None, Some(username)) => SessionIdentity::generate(username)?,
            (None, None) => return Err(BoardroomError::Config("username or identity is required")),
        };
        let config = self.config.validated();

        let client = RoomClient::new(code, identity);
        let controller = ReconciliationController::new(client, config.sync.clone());
        let cadence = Cadence::new(CadenceConfig {
            step_delay: controller.step_delay(),
            policy: config.late_policy,
            metrics_enabled: true,
        });

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let runner = RoomRunner {
            connector,
            api,
            codec: JsonCodec,
            controller,
            cadence,
            commands: command_rx,
            updates: update_tx,
            config,
            rest_joined: false,
        };
        Ok((runner, RoomHandle::new(command_tx, update_rx)))
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Why a live session ended.
enum SessionEnd {
    /// The view left or dropped its handle.
    Leave,
    /// The channel died; reconnect.
    Dropped,
}

/// A room session: connects, bootstraps, reconciles and reconnects until
/// the view leaves.
///
/// Call [`run()`](Self::run), usually on its own task.
pub struct RoomRunner<G: GameKind, C: Connector, A: RoomApi> {
    connector: C,
    api: A,
    codec: JsonCodec,
    controller: ReconciliationController<G>,
    cadence: Cadence,
    commands: mpsc::Receiver<RoomCommand<G>>,
    updates: mpsc::UnboundedSender<ViewUpdate<G>>,
    config: RunnerConfig,
    /// The REST join succeeded once; later bootstraps only fetch.
    rest_joined: bool,
}

impl<G, C, A> RoomRunner<G, C, A>
where
    G: GameKind,
    C: Connector,
    A: RoomApi,
{
    /// Creates a new builder.
    pub fn builder() -> RoomRunnerBuilder {
        RoomRunnerBuilder::new()
    }

    /// Runs the room until the view leaves.
    ///
    /// Connection drops are retried with backoff; every reconnect is a
    /// fresh bootstrap. Interrupted animations are dropped, never replayed.
    ///
    /// # Errors
    /// Only fatal errors end the loop early: an unknown room, or a session
    /// that can no longer join.
    pub async fn run(mut self) -> Result<(), BoardroomError> {
        let code = self.controller.client().code().clone();
        info!(room = %code, game = G::NAME, "room runner starting");

        let mut attempt: u32 = 0;
        loop {
            self.status(if attempt == 0 {
                ConnectionStatus::Connecting
            } else {
                ConnectionStatus::Reconnecting
            });

            let conn = match self.connect_and_bootstrap().await {
                Ok(conn) => conn,
                Err(e) if e.is_fatal() => {
                    warn!(room = %code, error = %e, "cannot join room");
                    self.controller.teardown();
                    self.status(ConnectionStatus::Disconnected);
                    return Err(e);
                }
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    warn!(room = %code, error = %e, attempt, "connect failed");
                    if !self.wait_backoff(attempt).await {
                        self.controller.teardown();
                        self.status(ConnectionStatus::Disconnected);
                        return Ok(());
                    }
                    continue;
                }
            };

            attempt = 0;
            self.status(ConnectionStatus::Connected);
            info!(room = %code, conn = %conn.id(), "room connected");

            match self.session(&conn).await {
                SessionEnd::Leave => {
                    self.teardown(&conn).await;
                    return Ok(());
                }
                SessionEnd::Dropped => {
                    warn!(room = %code, conn = %conn.id(), "channel dropped, reconnecting");
                    drop(conn);
                    self.cadence.disarm();
                    self.controller.reset_for_bootstrap();
                    self.frame();
                    attempt = 1;
                    if !self.wait_backoff(attempt).await {
                        self.controller.teardown();
                        self.status(ConnectionStatus::Disconnected);
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Opens a channel, fetches the room over REST, applies it and sends
    /// `room:join`.
    async fn connect_and_bootstrap(&mut self) -> Result<C::Connection, BoardroomError> {
        let conn = self
            .connector
            .connect()
            .await
            .map_err(|e| BoardroomError::Channel(Box::new(e)))?;

        let code = self.controller.client().code().clone();
        if !self.rest_joined {
            self.api
                .join_room(&code, self.controller.client().identity())
                .await?;
            self.rest_joined = true;
        }
        let bootstrap = self.api.fetch_room::<G::State>(&code).await?;
        debug!(room = %code, has_game = bootstrap.game_state.is_some(), "bootstrap fetched");

        let mut effects = self.controller.bootstrap(bootstrap);
        effects.insert(0, Effect::Emit(self.controller.join_event()?));
        self.apply(&conn, effects).await?;
        Ok(conn)
    }

    /// One live connection: the select loop.
    async fn session(&mut self, conn: &C::Connection) -> SessionEnd {
        let mut last_frame = Instant::now();
        loop {
            let idle_deadline = self.config.receive_timeout.map(|t| last_frame + t);

            let effects = tokio::select! {
                command = self.commands.recv() => match command {
                    None => {
                        debug!("room handle dropped");
                        return SessionEnd::Leave;
                    }
                    Some(RoomCommand::Leave) => return SessionEnd::Leave,
                    Some(command) => self.command(command),
                },
                frame = conn.recv() => match frame {
                    Ok(Some(bytes)) => {
                        last_frame = Instant::now();
                        self.inbound(&bytes)
                    }
                    Ok(None) => {
                        info!(conn = %conn.id(), "channel closed by server");
                        return SessionEnd::Dropped;
                    }
                    Err(e) => {
                        warn!(conn = %conn.id(), error = %e, "receive failed");
                        return SessionEnd::Dropped;
                    }
                },
                step = self.cadence.wait_for_step() => self.controller.advance_steps(step.steps_due),
                _ = time::sleep_until(idle_deadline.unwrap_or_else(Instant::now)), if idle_deadline.is_some() => {
                    warn!(conn = %conn.id(), "no frame within receive timeout");
                    return SessionEnd::Dropped;
                }
            };

            if let Err(e) = self.apply(conn, effects).await {
                warn!(conn = %conn.id(), error = %e, "send failed");
                return SessionEnd::Dropped;
            }
        }
    }

    fn command(&mut self, command: RoomCommand<G>) -> Vec<Effect> {
        match command {
            RoomCommand::Act { action, data } => self.controller.act(action, data),
            RoomCommand::Theme(theme_id) => vec![Effect::Emit(ClientEvent::Theme { theme_id })],
            RoomCommand::Pause => {
                self.cadence.pause();
                Vec::new()
            }
            RoomCommand::Resume => {
                self.cadence.resume();
                Vec::new()
            }
            RoomCommand::With(f) => f(&mut self.controller),
            // Handled by the loop.
            RoomCommand::Leave => Vec::new(),
        }
    }

    /// Decodes and validates one frame. Bad frames are logged and skipped.
    fn inbound(&mut self, bytes: &[u8]) -> Vec<Effect> {
        let event: ServerEvent<G::State> = match self.codec.decode(bytes) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "undecodable frame dropped");
                return Vec::new();
            }
        };
        if let Err(e) = event.validate() {
            warn!(event = event.name(), error = %e, "invalid event dropped");
            return Vec::new();
        }
        trace!(event = event.name(), "event received");
        self.controller.handle(event)
    }

    /// Carries out controller effects, then arms or disarms the cadence.
    async fn apply(&mut self, conn: &C::Connection, effects: Vec<Effect>) -> Result<(), BoardroomError> {
        let mut redraw = false;
        for effect in effects {
            match effect {
                Effect::Emit(event) => {
                    let bytes = self.codec.encode(&event)?;
                    conn.send(&bytes)
                        .await
                        .map_err(|e| BoardroomError::Channel(Box::new(e)))?;
                    trace!(action = ?event.action_kind(), "event sent");
                }
                Effect::Cue(cue) => self.publish(ViewUpdate::Cue(cue)),
                Effect::Notice(message) => self.publish(ViewUpdate::Notice {
                    message,
                    ttl: self.controller.notice_ttl(),
                }),
                Effect::Outcome(outcome) => self.publish(ViewUpdate::Outcome(outcome)),
                Effect::Theme(theme) => self.publish(ViewUpdate::Theme(theme)),
                Effect::Redraw => redraw = true,
            }
        }
        if redraw {
            self.frame();
        }

        if self.controller.is_animating() {
            self.cadence.arm();
        } else {
            self.cadence.disarm();
        }
        Ok(())
    }

    /// Sends `room:leave` once and closes the channel.
    async fn teardown(&mut self, conn: &C::Connection) {
        self.cadence.disarm();
        if let Some(leave) = self.controller.teardown() {
            match self.codec.encode(&leave) {
                Ok(bytes) => {
                    if let Err(e) = conn.send(&bytes).await {
                        debug!(error = %e, "room:leave not delivered");
                    }
                }
                Err(e) => debug!(error = %e, "room:leave not encoded"),
            }
        }
        if let Err(e) = conn.close().await {
            debug!(error = %e, "close failed");
        }
        self.status(ConnectionStatus::Disconnected);
        let playback = self.cadence.metrics();
        debug!(
            steps = playback.total_steps,
            late = playback.total_late,
            dropped = playback.total_dropped,
            max_late_ms = playback.max_lateness.as_millis() as u64,
            "playback metrics"
        );
        info!(room = %self.controller.client().code(), "room left");
    }

    /// Sleeps before a reconnect while still listening to the handle.
    /// Returns `false` if the view left in the meantime.
    async fn wait_backoff(&mut self, attempt: u32) -> bool {
        let delay = self.config.backoff(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "waiting before reconnect");
        let deadline = Instant::now() + delay;
        loop {
            tokio::select! {
                _ = time::sleep_until(deadline) => return true,
                command = self.commands.recv() => match command {
                    None | Some(RoomCommand::Leave) => return false,
                    Some(RoomCommand::Pause) => self.cadence.pause(),
                    Some(RoomCommand::Resume) => self.cadence.resume(),
                    Some(_) => debug!("command ignored while disconnected"),
                },
            }
        }
    }

    fn frame(&self) {
        self.publish(ViewUpdate::Frame(ViewFrame::capture(
            &self.controller,
            self.cadence.metrics(),
        )));
    }

    fn status(&self, status: ConnectionStatus) {
        self.publish(ViewUpdate::Status(status));
    }

    fn publish(&self, update: ViewUpdate<G>) {
        if self.updates.send(update).is_err() {
            trace!("view gone, update dropped");
        }
    }
}
