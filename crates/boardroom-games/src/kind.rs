//! The `GameKind` trait: what the sync engine needs to know about a game.
//!
//! The server owns the rules. A room page only has to *read* a snapshot:
//! whose turn it is, which stage of the turn it's in, where every token
//! stands, and how a token walks from one cell to the next. Each game
//! answers those questions once by implementing [`GameKind`], and the
//! reconciliation engine works for every game unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use boardroom_protocol::{ActionData, MoveHint};
use serde::Serialize;
use serde::de::DeserializeOwned;

// ---------------------------------------------------------------------------
// TurnPhase
// ---------------------------------------------------------------------------

/// Server-declared stage of the current turn, unified across games.
///
/// Every game projects its own phase marker onto this enum so input
/// gating can be written once:
///
/// ```text
/// AwaitingRoll → AwaitingMove → Animating → Resolving/Decision → EndTurn
///       ↑                                                          │
///       └──────────────────────────────────────────────────────────┘
///
/// side branches: Jail, Debt (monopoly), DrawOffer (chess)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TurnPhase {
    /// No snapshot yet, or a game that has ended.
    #[default]
    Idle,
    AwaitingRoll,
    AwaitingMove,
    /// The server waits for the mover's client to finish playback.
    Animating,
    /// The server is applying the landing effect.
    Resolving,
    /// The turn owner must choose (buy or pass).
    Decision,
    EndTurn,
    Jail,
    Debt,
    /// A draw offer is pending; the other side must answer.
    DrawOffer,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingRoll => "awaiting-roll",
            Self::AwaitingMove => "awaiting-move",
            Self::Animating => "animating",
            Self::Resolving => "resolving",
            Self::Decision => "decision",
            Self::EndTurn => "end-turn",
            Self::Jail => "jail",
            Self::Debt => "debt",
            Self::DrawOffer => "draw-offer",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Subjects and steps
// ---------------------------------------------------------------------------

/// An animated entity: one token of one seat.
///
/// Games with a single token per player always use `token: 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId {
    pub seat: usize,
    pub token: usize,
}

impl SubjectId {
    pub fn new(seat: usize, token: usize) -> Self {
        Self { seat, token }
    }

    /// The only subject of a seat in a one-token game.
    pub fn seat(seat: usize) -> Self {
        Self { seat, token: 0 }
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat{}/token{}", self.seat, self.token)
    }
}

/// What kind of movement a step is. Everything except [`StepKind::Walk`]
/// is "special" and may trigger a cue (a sound) when it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKind {
    /// One cell forward along the track.
    Walk,
    /// Leaving the yard onto the start cell.
    Enter,
    /// First cell of the home lane.
    LaneEntry,
    /// Reaching the terminal cell.
    Finish,
    /// Sliding down a snake.
    Chute,
    /// Climbing a ladder.
    Ladder,
    /// Passing or landing on GO.
    PassGo,
    /// Sent to jail.
    Jail,
    /// Knocked back to the yard.
    Captured,
}

impl StepKind {
    /// Whether this step can fire a cue.
    pub fn is_special(self) -> bool {
        self != Self::Walk
    }
}

/// One intermediate position of an animation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<P> {
    pub position: P,
    pub kind: StepKind,
}

impl<P> Step<P> {
    pub fn new(position: P, kind: StepKind) -> Self {
        Self { position, kind }
    }

    pub fn walk(position: P) -> Self {
        Self::new(position, StepKind::Walk)
    }
}

/// A `game:tokenMove` hint: the mover and how far it rolled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHint {
    pub steps: u32,
    pub movement: MoveHint,
}

impl TokenHint {
    /// Whether the hint names `subject`. A hint without a token index
    /// names every token of the seat.
    pub fn names(&self, subject: SubjectId) -> bool {
        self.movement.player == subject.seat
            && self.movement.token.is_none_or(|t| t == subject.token)
    }
}

// ---------------------------------------------------------------------------
// GameKind
// ---------------------------------------------------------------------------

/// Read-only view of one game's snapshots.
///
/// Each associated type defines the shape of the game's data:
/// - `State`: the authoritative snapshot, decoded straight off the wire
/// - `Position`: where one animated subject stands
/// - `Square`: what a player picks when selecting a piece
///
/// All methods are associated functions (no `self`): a game kind is a
/// type-level tag, never instantiated with data.
pub trait GameKind: Send + Sync + 'static {
    /// The full snapshot the server sends in `game:start` / `game:state`.
    type State: Clone
        + PartialEq
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// A subject's position on the board.
    type Position: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// A selectable board square. Games without square selection use
    /// [`Infallible`](std::convert::Infallible).
    type Square: Copy + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Short name for logs.
    const NAME: &'static str;

    /// The snapshot's turn stage, projected onto [`TurnPhase`].
    fn phase(state: &Self::State) -> TurnPhase;

    /// The seat whose turn it is (or who must answer), if any.
    fn turn_owner(state: &Self::State) -> Option<usize>;

    /// Whether the snapshot declares the game over.
    fn is_finished(state: &Self::State) -> bool;

    /// Every animated subject and its position. Default: none, so every
    /// transition is a direct sync.
    fn positions(_state: &Self::State) -> BTreeMap<SubjectId, Self::Position> {
        BTreeMap::new()
    }

    /// The steps that carry `subject` from `from` to `to`, ending exactly
    /// on `to`. An empty path means "no playback".
    ///
    /// `target` is the snapshot being animated towards; `hint` is the
    /// pending token-move hint when it names this subject.
    fn path(
        _target: &Self::State,
        _subject: SubjectId,
        from: &Self::Position,
        to: &Self::Position,
        _hint: Option<&TokenHint>,
    ) -> Vec<Step<Self::Position>> {
        if from == to {
            Vec::new()
        } else {
            vec![Step::walk(to.clone())]
        }
    }

    /// Whether the mover's client must send `completeTurn` once its
    /// playback finishes.
    fn acknowledges_animation() -> bool {
        false
    }

    /// Delay between two animation steps.
    fn step_delay() -> Duration {
        Duration::from_millis(300)
    }
}

/// Games played by picking a piece on a square and a destination (chess).
///
/// Adds advisory move candidates on top of [`GameKind`]. Candidates are a
/// UI hint only; the server accepts or rejects the move.
pub trait SquareRules: GameKind {
    /// Candidate destinations for the piece on `from`. Empty when the
    /// square is empty or the snapshot can't be read.
    fn legal_targets(state: &Self::State, from: Self::Square) -> BTreeSet<Self::Square>;

    /// The seat owning the piece on `square`, if any.
    fn owner_of(state: &Self::State, square: Self::Square) -> Option<usize>;

    /// Whether moving `from → to` needs a promotion choice first.
    fn is_promotion(state: &Self::State, from: Self::Square, to: Self::Square) -> bool;

    /// The pieces a promotion may choose, as wire letters.
    fn promotion_choices() -> &'static [char];

    /// The `data` of the `move` action.
    fn move_data(from: Self::Square, to: Self::Square, promotion: Option<char>) -> ActionData;
}
