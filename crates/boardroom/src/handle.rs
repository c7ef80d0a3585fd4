//! The view's end of a running room: send intents, receive updates.

use boardroom_games::{GameKind, SquareRules};
use boardroom_protocol::{ActionData, ActionKind};
use boardroom_sync::{Effect, ReconciliationController, SyncError};
use tokio::sync::{mpsc, oneshot};

use crate::BoardroomError;
use crate::view::ViewUpdate;

/// Work run against the controller on the runner's task.
pub(crate) type ControllerFn<G> =
    Box<dyn FnOnce(&mut ReconciliationController<G>) -> Vec<Effect> + Send>;

/// Commands sent from the handle to the runner.
///
/// Everything the view can ask for. Commands are processed in order on
/// the runner's task, interleaved with server events and cadence steps.
pub(crate) enum RoomCommand<G: GameKind> {
    /// Request a game action (gated by the turn phase).
    Act {
        action: ActionKind,
        data: Option<ActionData>,
    },

    /// Change the room theme.
    Theme(String),

    /// Pause animation playback (e.g. the page is hidden).
    Pause,

    /// Resume animation playback.
    Resume,

    /// Leave the room and stop the runner.
    Leave,

    /// Run a closure against the controller (selection commands).
    With(ControllerFn<G>),
}

/// Handle to a running room. Dropping it tears the room down: the runner
/// sends `room:leave`, closes the channel and exits.
pub struct RoomHandle<G: GameKind> {
    commands: mpsc::Sender<RoomCommand<G>>,
    updates: mpsc::UnboundedReceiver<ViewUpdate<G>>,
}

impl<G: GameKind> RoomHandle<G> {
    pub(crate) fn new(
        commands: mpsc::Sender<RoomCommand<G>>,
        updates: mpsc::UnboundedReceiver<ViewUpdate<G>>,
    ) -> Self {
        Self { commands, updates }
    }

    /// Waits for the next view update. `None` once the runner has stopped.
    pub async fn next_update(&mut self) -> Option<ViewUpdate<G>> {
        self.updates.recv().await
    }

    /// Requests a game action. Actions the turn phase doesn't allow are
    /// dropped by the runner without an error.
    pub async fn act(&self, action: ActionKind, data: Option<ActionData>) -> Result<(), BoardroomError> {
        self.send(RoomCommand::Act { action, data }).await
    }

    pub async fn roll(&self) -> Result<(), BoardroomError> {
        self.act(ActionKind::Roll, None).await
    }

    /// Moves a token (ludo) by index.
    pub async fn move_token(&self, token_index: usize) -> Result<(), BoardroomError> {
        self.act(ActionKind::Move, Some(ActionData::Token { token_index }))
            .await
    }

    pub async fn resign(&self) -> Result<(), BoardroomError> {
        self.act(ActionKind::Resign, None).await
    }

    pub async fn set_theme(&self, theme_id: impl Into<String>) -> Result<(), BoardroomError> {
        self.send(RoomCommand::Theme(theme_id.into())).await
    }

    pub async fn pause(&self) -> Result<(), BoardroomError> {
        self.send(RoomCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), BoardroomError> {
        self.send(RoomCommand::Resume).await
    }

    /// Leaves the room explicitly. Equivalent to dropping the handle, but
    /// the view keeps receiving updates until the runner stops.
    pub async fn leave(&self) -> Result<(), BoardroomError> {
        self.send(RoomCommand::Leave).await
    }

    async fn send(&self, command: RoomCommand<G>) -> Result<(), BoardroomError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| BoardroomError::RunnerClosed)
    }
}

impl<G: SquareRules> RoomHandle<G> {
    /// Clicks a square: picks a piece, submits a move or deselects.
    pub async fn select(&self, square: G::Square) -> Result<(), BoardroomError> {
        self.send(RoomCommand::With(Box::new(move |c: &mut ReconciliationController<G>| {
            c.select(square)
        })))
        .await
    }

    /// Completes a pending promotion.
    ///
    /// # Errors
    /// [`SyncError::NoPendingPromotion`] or [`SyncError::InvalidPromotion`]
    /// wrapped in [`BoardroomError::Sync`].
    pub async fn choose_promotion(&self, piece: char) -> Result<(), BoardroomError> {
        let (reply_tx, reply_rx) = oneshot::channel::<Result<(), SyncError>>();
        self.send(RoomCommand::With(Box::new(move |c: &mut ReconciliationController<G>| {
            match c.choose_promotion(piece) {
                Ok(effects) => {
                    let _ = reply_tx.send(Ok(()));
                    effects
                }
                Err(e) => {
                    let _ = reply_tx.send(Err(e));
                    Vec::new()
                }
            }
        })))
        .await?;
        reply_rx.await.map_err(|_| BoardroomError::RunnerClosed)??;
        Ok(())
    }

    pub async fn cancel_selection(&self) -> Result<(), BoardroomError> {
        self.send(RoomCommand::With(Box::new(|c: &mut ReconciliationController<G>| {
            c.cancel_selection()
        })))
        .await
    }
}
