//! The reconciliation controller: one per room session.
//!
//! Every authoritative event goes through [`ReconciliationController::handle`]
//! and every cadence tick through [`ReconciliationController::advance`].
//! Both return [`Effect`]s for the runner to carry out. The controller does
//! no IO and owns no timers.
//!
//! # Classification
//!
//! A `game:state` snapshot is compared with the last applied one:
//!
//! | Situation | Result |
//! |---|---|
//! | first snapshot, nothing moved, no mover | direct sync |
//! | one subject moved (or one identifiable mover) | animated transition |
//! | the animating subject moved again | superseding: abandon, direct sync |
//! | anything else while animating | buffered until the job completes |

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use boardroom_games::{GameKind, SquareRules, StepKind, SubjectId, TokenHint, TurnPhase};
use boardroom_protocol::{ActionData, ActionKind, ClientEvent, Outcome, RoomBootstrap, ServerEvent};
use boardroom_session::{Membership, RoomClient};
use tracing::{debug, info, trace, warn};

use crate::animation::{AnimationScheduler, CompletedJob, JobId};
use crate::display::DisplayState;
use crate::phase::TurnPhaseStateMachine;
use crate::selection::Selection;
use crate::store::SnapshotStore;
use crate::{SyncConfig, SyncError};

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// A special step played: the view may play a sound for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub job: JobId,
    pub subject: SubjectId,
    pub kind: StepKind,
}

/// Something the runner must do after a controller call.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send this event to the server.
    Emit(ClientEvent),
    Cue(Cue),
    /// Show a transient notice for [`SyncConfig::notice_ttl`].
    Notice(String),
    /// The game ended.
    Outcome(Outcome),
    /// The room theme changed. Passed through.
    Theme(String),
    /// The display changed and should be repainted.
    Redraw,
}

/// Work held back behind the active animation, in received order.
#[derive(Debug)]
enum Deferred<S> {
    Snapshot {
        state: Arc<S>,
        hint: Option<TokenHint>,
    },
    Outcome(Outcome),
}

// ---------------------------------------------------------------------------
// ReconciliationController
// ---------------------------------------------------------------------------

/// Merges authoritative snapshots with in-flight animations for one room.
pub struct ReconciliationController<G: GameKind> {
    client: RoomClient,
    config: SyncConfig,
    step_delay: Duration,
    store: SnapshotStore<G::State>,
    display: DisplayState<G>,
    scheduler: AnimationScheduler<G::Position>,
    gate: TurnPhaseStateMachine,
    buffer: VecDeque<Deferred<G::State>>,
    /// Pending `game:tokenMove` hint, consumed by the next classification.
    hint: Option<TokenHint>,
    selection: Selection<G::Square>,
}

impl<G: GameKind> ReconciliationController<G> {
    pub fn new(client: RoomClient, config: SyncConfig) -> Self {
        let config = config.validated();
        let step_delay = config.step_delay.unwrap_or_else(G::step_delay);
        let mut gate = TurnPhaseStateMachine::new();
        gate.set_local_seat(client.seat());
        Self {
            client,
            config,
            step_delay,
            store: SnapshotStore::new(),
            display: DisplayState::new(),
            scheduler: AnimationScheduler::new(),
            gate,
            buffer: VecDeque::new(),
            hint: None,
            selection: Selection::None,
        }
    }

    /// The `room:join` event for this session.
    pub fn join_event(&mut self) -> Result<ClientEvent, SyncError> {
        Ok(self.client.join_event()?)
    }

    /// Applies one event from the server.
    pub fn handle(&mut self, event: ServerEvent<G::State>) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.client.membership() == Membership::Left {
            debug!(room = %self.client.code(), event = event.name(), "event after leave ignored");
            return effects;
        }

        match event {
            ServerEvent::RoomUpdate { players, status } => {
                self.client.apply_update(players, status);
                self.gate.set_local_seat(self.client.seat());
                if self.client.is_finished() {
                    self.gate.finish();
                    self.selection.clear();
                }
                effects.push(Effect::Redraw);
                self.recover(&mut effects);
            }
            ServerEvent::GameStart { state, valid_moves } => {
                info!(room = %self.client.code(), game = G::NAME, "game started");
                self.drop_animation();
                self.gate.reset();
                self.store.set_valid_moves(valid_moves);
                let state = Arc::new(state);
                self.store.receive(Arc::clone(&state));
                self.apply_direct(state, &mut effects);
                self.recover(&mut effects);
            }
            ServerEvent::GameState { state } => self.on_snapshot(Arc::new(state), &mut effects),
            ServerEvent::TokenMove { steps, movement } => {
                trace!(room = %self.client.code(), steps, player = movement.player, "token move hint");
                self.hint = Some(TokenHint { steps, movement });
            }
            ServerEvent::Winner(outcome) => {
                if self.scheduler.is_active() {
                    debug!(room = %self.client.code(), "outcome deferred behind animation");
                    self.buffer.push_back(Deferred::Outcome(outcome));
                } else {
                    self.announce(outcome, &mut effects);
                }
            }
            ServerEvent::Theme { theme_id } => effects.push(Effect::Theme(theme_id)),
            ServerEvent::Error { message } => {
                warn!(room = %self.client.code(), %message, "server error");
                effects.push(Effect::Notice(message));
            }
        }
        effects
    }

    /// Plays one animation step. Called by the cadence; a no-op when idle.
    pub fn advance(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.step(&mut effects);
        effects
    }

    /// Plays up to `due` steps of the active job (a late cadence catching
    /// up). Stops when that job completes: a job released from the buffer
    /// waits for its own first tick.
    pub fn advance_steps(&mut self, due: u32) -> Vec<Effect> {
        let mut effects = Vec::new();
        for _ in 0..due {
            if !self.step(&mut effects) {
                break;
            }
        }
        effects
    }

    /// Returns `false` when nothing was playing or the job just completed.
    fn step(&mut self, effects: &mut Vec<Effect>) -> bool {
        let Some(step) = self.scheduler.advance() else {
            return false;
        };
        trace!(job = %step.job, subject = %step.subject, index = step.index, kind = ?step.kind, "step");

        self.display.set_position(step.subject, step.position);
        if let Some(kind) = step.cue {
            effects.push(Effect::Cue(Cue {
                job: step.job,
                subject: step.subject,
                kind,
            }));
        }
        effects.push(Effect::Redraw);

        match step.completed {
            Some(done) => {
                self.complete(done, effects);
                false
            }
            None => true,
        }
    }

    /// Applies the REST bootstrap: room metadata, then the game snapshot
    /// (if any) as a direct sync.
    pub fn bootstrap(&mut self, bootstrap: RoomBootstrap<G::State>) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.scheduler.is_active() {
            self.drop_animation();
        }
        let state = self.client.bootstrap(bootstrap);
        self.gate.set_local_seat(self.client.seat());
        if self.client.is_finished() {
            self.gate.finish();
        }
        effects.push(Effect::Redraw);

        if let Some(state) = state {
            let state = Arc::new(state);
            self.store.receive(Arc::clone(&state));
            self.apply_direct(state, &mut effects);
        }
        self.recover(&mut effects);
        effects
    }

    /// Prepares for a fresh bootstrap after a reconnect. The interrupted
    /// animation is dropped and never replayed; the next snapshot is
    /// treated as a first snapshot.
    pub fn reset_for_bootstrap(&mut self) {
        info!(room = %self.client.code(), "resetting for bootstrap");
        self.drop_animation();
        self.gate.reset();
        if let Some(applied) = self.store.applied().cloned() {
            self.display.sync(applied);
        }
        self.store.clear();
    }

    /// Tears the session down and returns `room:leave`, once.
    pub fn teardown(&mut self) -> Option<ClientEvent> {
        self.drop_animation();
        self.client.leave()
    }

    /// Requests a game action. Returns nothing if the gate refuses it.
    pub fn act(&mut self, action: ActionKind, data: Option<ActionData>) -> Vec<Effect> {
        if self.client.membership() == Membership::Left || !self.gate.permits(action) {
            return Vec::new();
        }
        if action == ActionKind::Move {
            self.selection.clear();
        }
        debug!(room = %self.client.code(), %action, "action requested");
        vec![Effect::Emit(ClientEvent::action(self.client.code().clone(), action, data))]
    }

    pub fn resign(&mut self) -> Vec<Effect> {
        self.act(ActionKind::Resign, None)
    }

    // -- accessors ----------------------------------------------------------

    pub fn is_animating(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    pub fn notice_ttl(&self) -> Duration {
        self.config.notice_ttl
    }

    pub fn display(&self) -> &DisplayState<G> {
        &self.display
    }

    pub fn store(&self) -> &SnapshotStore<G::State> {
        &self.store
    }

    pub fn gate(&self) -> &TurnPhaseStateMachine {
        &self.gate
    }

    pub fn phase(&self) -> TurnPhase {
        self.gate.phase()
    }

    pub fn selection(&self) -> &Selection<G::Square> {
        &self.selection
    }

    pub fn client(&self) -> &RoomClient {
        &self.client
    }

    pub fn scheduler(&self) -> &AnimationScheduler<G::Position> {
        &self.scheduler
    }

    /// Snapshots and outcomes waiting behind the active animation.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    // -- internals ----------------------------------------------------------

    fn on_snapshot(&mut self, state: Arc<G::State>, effects: &mut Vec<Effect>) {
        self.selection.clear();
        let hint = self.hint.take();

        if let Some(subject) = self.scheduler.active().map(|job| job.subject) {
            let previous = self.store.receive(Arc::clone(&state));
            let moved = previous.is_none_or(|prev| {
                G::positions(&prev).get(&subject) != G::positions(&state).get(&subject)
            });
            if moved {
                self.supersede(state, effects);
            } else {
                self.defer(state, hint);
            }
            return;
        }

        self.store.receive(Arc::clone(&state));
        self.classify(state, hint, effects);
        self.recover(effects);
    }

    /// The animating subject moved again: stop where it is and show the
    /// new snapshot. Buffered snapshots are older than this one and go.
    fn supersede(&mut self, state: Arc<G::State>, effects: &mut Vec<Effect>) {
        if let Some(job) = self.scheduler.abandon() {
            debug!(
                room = %self.client.code(),
                job = %job.id,
                subject = %job.subject,
                played = job.current,
                of = job.steps.len(),
                "animation superseded"
            );
        }
        self.buffer.retain(|d| matches!(d, Deferred::Outcome(_)));
        self.apply_direct(state, effects);
        self.drain(effects);
        self.recover(effects);
    }

    fn defer(&mut self, state: Arc<G::State>, hint: Option<TokenHint>) {
        let snapshots = self
            .buffer
            .iter()
            .filter(|d| matches!(d, Deferred::Snapshot { .. }))
            .count();
        if snapshots >= self.config.max_buffered {
            if let Some(oldest) = self
                .buffer
                .iter()
                .position(|d| matches!(d, Deferred::Snapshot { .. }))
            {
                self.buffer.remove(oldest);
                warn!(
                    room = %self.client.code(),
                    max = self.config.max_buffered,
                    "snapshot buffer full, dropping oldest"
                );
            }
        }
        trace!(room = %self.client.code(), buffered = self.buffer.len() + 1, "snapshot buffered");
        self.buffer.push_back(Deferred::Snapshot { state, hint });
    }

    /// Decides between direct sync and an animated transition.
    fn classify(&mut self, state: Arc<G::State>, hint: Option<TokenHint>, effects: &mut Vec<Effect>) {
        let Some(previous) = self.store.applied().cloned() else {
            debug!(room = %self.client.code(), "first snapshot, direct sync");
            self.apply_direct(state, effects);
            return;
        };

        let Some((subject, from, to)) = find_mover::<G>(&previous, &state, hint.as_ref()) else {
            self.apply_direct(state, effects);
            return;
        };

        let hint = hint.as_ref().filter(|h| h.names(subject));
        let steps = G::path(&state, subject, &from, &to, hint);
        let ack_owed = G::acknowledges_animation()
            && G::phase(&state) == TurnPhase::Animating
            && self.client.seat() == Some(subject.seat);

        match self.scheduler.schedule(subject, steps, ack_owed) {
            Some(job) => {
                debug!(room = %self.client.code(), %job, %subject, ack_owed, "animated transition");
                self.store.apply(Arc::clone(&state));
                self.observe(&state);
                self.gate.set_floor(true);
            }
            None => self.apply_direct(state, effects),
        }
    }

    fn apply_direct(&mut self, state: Arc<G::State>, effects: &mut Vec<Effect>) {
        self.store.apply(Arc::clone(&state));
        self.observe(&state);
        self.gate.set_floor(false);
        if self.display.sync(state) {
            effects.push(Effect::Redraw);
        }
    }

    fn observe(&mut self, state: &G::State) {
        self.gate
            .observe(G::phase(state), G::turn_owner(state), G::is_finished(state));
    }

    fn complete(&mut self, done: CompletedJob, effects: &mut Vec<Effect>) {
        if let Some(applied) = self.store.applied().cloned() {
            self.display.sync(applied);
        }
        self.gate.set_floor(false);

        if done.ack_owed {
            let seat = self.client.seat();
            let still_waiting = self
                .store
                .received()
                .is_some_and(|s| G::phase(s) == TurnPhase::Animating && G::turn_owner(s) == seat);
            if still_waiting && self.gate.latch_ack() {
                debug!(room = %self.client.code(), job = %done.id, "acknowledging animation");
                effects.push(Effect::Emit(self.complete_turn()));
            } else {
                debug!(room = %self.client.code(), job = %done.id, "acknowledgement not needed");
            }
        }

        self.drain(effects);
        self.recover(effects);
    }

    /// Releases buffered work in order until a new animation starts.
    fn drain(&mut self, effects: &mut Vec<Effect>) {
        while !self.scheduler.is_active() {
            let Some(deferred) = self.buffer.pop_front() else {
                break;
            };
            match deferred {
                Deferred::Snapshot { state, hint } => self.classify(state, hint, effects),
                Deferred::Outcome(outcome) => self.announce(outcome, effects),
            }
        }
    }

    /// Self-issued acknowledgement when the server waits on an animation
    /// this client isn't playing (e.g. after a reload mid-animation).
    fn recover(&mut self, effects: &mut Vec<Effect>) {
        if self.scheduler.is_active() || !G::acknowledges_animation() || !self.gate.needs_recovery() {
            return;
        }
        if self.gate.latch_ack() {
            warn!(room = %self.client.code(), "animating for us without a local job, acknowledging");
            effects.push(Effect::Emit(self.complete_turn()));
        }
    }

    fn announce(&mut self, outcome: Outcome, effects: &mut Vec<Effect>) {
        info!(
            room = %self.client.code(),
            winner = ?outcome.winner,
            draw = outcome.is_draw,
            "game over"
        );
        self.client.mark_finished();
        self.gate.finish();
        self.selection.clear();
        effects.push(Effect::Outcome(outcome));
    }

    fn drop_animation(&mut self) {
        if let Some(job) = self.scheduler.abandon() {
            debug!(room = %self.client.code(), job = %job.id, "animation dropped");
        }
        self.buffer.clear();
        self.hint = None;
        self.selection.clear();
    }

    fn complete_turn(&self) -> ClientEvent {
        ClientEvent::action(self.client.code().clone(), ActionKind::CompleteTurn, None)
    }
}

// ---------------------------------------------------------------------------
// Square selection
// ---------------------------------------------------------------------------

impl<G: SquareRules> ReconciliationController<G> {
    /// Handles a click on `square`.
    ///
    /// - a highlighted candidate submits the move (or opens the promotion
    ///   choice);
    /// - one of the local player's pieces (re)selects it;
    /// - anything else deselects.
    pub fn select(&mut self, square: G::Square) -> Vec<Effect> {
        let Some(state) = self.store.applied().cloned() else {
            return Vec::new();
        };
        if !self.gate.permits(ActionKind::Move) {
            self.selection.clear();
            return Vec::new();
        }

        if let Selection::Picking { origin, .. } = &self.selection {
            if self.selection.is_candidate(&square) {
                let from = *origin;
                if G::is_promotion(&state, from, square) {
                    debug!(%from, to = %square, "promotion choice opened");
                    self.selection = Selection::Promoting { from, to: square };
                    return vec![Effect::Redraw];
                }
                self.selection.clear();
                return self.act(ActionKind::Move, Some(G::move_data(from, square, None)));
            }
        }

        let seat = self.gate.local_seat();
        if seat.is_some() && G::owner_of(&state, square) == seat {
            let candidates = G::legal_targets(&state, square);
            debug!(%square, candidates = candidates.len(), "piece selected");
            self.selection = Selection::Picking {
                origin: square,
                candidates,
            };
        } else {
            self.selection.clear();
        }
        vec![Effect::Redraw]
    }

    /// Completes a pending promotion with `piece` (`'q'`, `'r'`, ...).
    pub fn choose_promotion(&mut self, piece: char) -> Result<Vec<Effect>, SyncError> {
        let (from, to) = match &self.selection {
            Selection::Promoting { from, to } => (*from, *to),
            _ => return Err(SyncError::NoPendingPromotion),
        };
        if !G::promotion_choices().contains(&piece) {
            return Err(SyncError::InvalidPromotion(piece));
        }
        self.selection.clear();
        Ok(self.act(ActionKind::Move, Some(G::move_data(from, to, Some(piece)))))
    }

    pub fn cancel_selection(&mut self) -> Vec<Effect> {
        if self.selection.is_none() {
            return Vec::new();
        }
        self.selection.clear();
        vec![Effect::Redraw]
    }
}

// ---------------------------------------------------------------------------
// Mover detection
// ---------------------------------------------------------------------------

/// The subject to animate between two snapshots, with its old and new
/// position.
///
/// One changed subject is the mover. With several (a ludo capture), the
/// hint decides, else the single changed subject of the previous turn
/// owner. Anything ambiguous is no mover at all.
fn find_mover<G: GameKind>(
    previous: &G::State,
    next: &G::State,
    hint: Option<&TokenHint>,
) -> Option<(SubjectId, G::Position, G::Position)> {
    let before = G::positions(previous);
    let after = G::positions(next);
    let changed: Vec<SubjectId> = after
        .iter()
        .filter(|(subject, to)| before.get(subject).is_some_and(|from| from != *to))
        .map(|(subject, _)| *subject)
        .collect();

    let mover = match changed.as_slice() {
        [] => return None,
        [only] => *only,
        many => {
            let by_hint = hint.and_then(|h| single(many.iter().filter(|s| h.names(**s))));
            let by_owner = || {
                let owner = G::turn_owner(previous)?;
                single(many.iter().filter(|s| s.seat == owner))
            };
            match by_hint.or_else(by_owner) {
                Some(subject) => *subject,
                None => {
                    debug!(changed = many.len(), "no identifiable mover, direct sync");
                    return None;
                }
            }
        }
    };
    positions_of(&before, &after, mover)
}

fn positions_of<P: Clone>(
    before: &BTreeMap<SubjectId, P>,
    after: &BTreeMap<SubjectId, P>,
    subject: SubjectId,
) -> Option<(SubjectId, P, P)> {
    Some((subject, before.get(&subject)?.clone(), after.get(&subject)?.clone()))
}

/// The only item of `iter`, if it has exactly one.
fn single<T>(mut iter: impl Iterator<Item = T>) -> Option<T> {
    let first = iter.next()?;
    iter.next().is_none().then_some(first)
}
