//! Reconciliation scenarios driven the way the runner drives them: server
//! events through `handle`, cadence ticks through `advance`.

use std::collections::BTreeMap;

use boardroom_games::ludo::LudoPhase;
use boardroom_games::snakes::SnakesPhase;
use boardroom_games::{
    GameKind, Ludo, LudoCell, LudoState, SnakesAndLadders, SnakesState, StepKind, SubjectId,
    TurnPhase,
};
use boardroom_protocol::{
    ActionKind, ClientEvent, MoveHint, Outcome, Player, RoomBootstrap, RoomCode, RoomSnapshot,
    RoomStatus, ServerEvent, SessionId,
};
use boardroom_session::{RoomClient, SessionIdentity};
use boardroom_sync::{Effect, ReconciliationController, SyncConfig, SyncError};

// =========================================================================
// Helpers
// =========================================================================

const ALICE: usize = 0;
const BOB: usize = 1;

fn player(id: &str) -> Player {
    Player {
        session_id: SessionId(id.into()),
        username: id.into(),
        is_host: id == "alice",
        is_connected: true,
    }
}

fn roster() -> Vec<Player> {
    vec![player("alice"), player("bob")]
}

fn client(local: &str) -> RoomClient {
    let identity = SessionIdentity::with_session_id(SessionId(local.into()), local).unwrap();
    RoomClient::new(RoomCode::new("K7QX"), identity)
}

/// A controller seated as alice (seat 0) in a playing room.
fn controller<G: GameKind>(config: SyncConfig) -> ReconciliationController<G> {
    let mut c = ReconciliationController::new(client("alice"), config);
    c.join_event().unwrap();
    c.handle(ServerEvent::RoomUpdate {
        players: roster(),
        status: RoomStatus::Playing,
    });
    c
}

fn snakes(positions: [u32; 2], turn: usize, phase: SnakesPhase) -> SnakesState {
    SnakesState {
        positions: positions.to_vec(),
        current_turn: turn,
        turn_phase: phase,
        last_roll: None,
        snakes: BTreeMap::from([(16, 6)]),
        ladders: BTreeMap::from([(4, 14)]),
        winner: None,
    }
}

fn started(state: SnakesState) -> ReconciliationController<SnakesAndLadders> {
    let mut c = controller(SyncConfig::default());
    c.handle(ServerEvent::GameStart {
        state,
        valid_moves: None,
    });
    c
}

fn acks(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| {
            matches!(e, Effect::Emit(ev) if ev.action_kind() == Some(ActionKind::CompleteTurn))
        })
        .count()
}

fn cues(effects: &[Effect]) -> Vec<StepKind> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Cue(cue) => Some(cue.kind),
            _ => None,
        })
        .collect()
}

/// Ticks until the active job is done. Returns every effect and the
/// number of ticks.
fn play_out<G: GameKind>(c: &mut ReconciliationController<G>) -> (Vec<Effect>, usize) {
    let mut effects = Vec::new();
    let mut ticks = 0;
    while c.is_animating() {
        effects.extend(c.advance());
        ticks += 1;
        assert!(ticks < 500, "animation never finished");
    }
    (effects, ticks)
}

fn shown<G: GameKind>(c: &ReconciliationController<G>, seat: usize) -> Option<G::Position> {
    c.display().position(SubjectId::seat(seat)).cloned()
}

// =========================================================================
// Direct sync
// =========================================================================

#[test]
fn test_direct_sync_is_idempotent() {
    let state = snakes([3, 5], ALICE, SnakesPhase::Rolling);
    let mut c = started(state.clone());
    assert!(c.display().matches(&state));

    let effects = c.handle(ServerEvent::GameState {
        state: state.clone(),
    });
    assert!(effects.is_empty());
    assert!(c.display().matches(&state));
    assert!(!c.is_animating());
}

#[test]
fn test_metadata_only_change_is_direct() {
    let mut c = started(snakes([3, 5], ALICE, SnakesPhase::Rolling));
    let next = snakes([3, 5], BOB, SnakesPhase::Rolling);
    let effects = c.handle(ServerEvent::GameState {
        state: next.clone(),
    });
    assert_eq!(effects, vec![Effect::Redraw]);
    assert!(c.display().matches(&next));
    assert_eq!(c.phase(), TurnPhase::AwaitingRoll);
}

// =========================================================================
// Animated transitions
// =========================================================================

#[test]
fn test_walk_from_start_to_seven_plays_seven_steps() {
    let mut c = started(snakes([0, 0], ALICE, SnakesPhase::Rolling));
    let target = snakes([7, 0], ALICE, SnakesPhase::Animating);
    c.handle(ServerEvent::GameState {
        state: target.clone(),
    });
    assert!(c.is_animating());
    assert_eq!(shown(&c, ALICE), Some(0));

    let mut seen = Vec::new();
    let mut effects = Vec::new();
    while c.is_animating() {
        effects.extend(c.advance());
        seen.extend(shown(&c, ALICE));
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    assert!(c.display().matches(&target));
    assert_eq!(acks(&effects), 1);
}

#[test]
fn test_input_blocked_while_local_job_plays() {
    let mut c = started(snakes([0, 0], ALICE, SnakesPhase::Rolling));
    assert_eq!(c.act(ActionKind::Roll, None).len(), 1);

    c.handle(ServerEvent::GameState {
        state: snakes([3, 0], ALICE, SnakesPhase::Animating),
    });
    assert!(c.gate().holds_floor());
    assert!(c.act(ActionKind::Roll, None).is_empty());
    assert_eq!(c.resign().len(), 1);
}

#[test]
fn test_chute_cue_fires_once() {
    let mut c = started(snakes([12, 0], ALICE, SnakesPhase::Rolling));
    c.handle(ServerEvent::GameState {
        state: snakes([6, 0], ALICE, SnakesPhase::Animating),
    });

    let (effects, ticks) = play_out(&mut c);
    // 13, 14, 15, 16, then the slide to 6.
    assert_eq!(ticks, 5);
    assert_eq!(cues(&effects), vec![StepKind::Chute]);
    assert_eq!(shown(&c, ALICE), Some(6));
}

#[test]
fn test_token_move_hint_picks_the_trigger() {
    let mut c = started(snakes([2, 0], ALICE, SnakesPhase::Rolling));
    c.handle(ServerEvent::TokenMove {
        steps: 2,
        movement: MoveHint {
            player: ALICE,
            token: None,
        },
    });
    c.handle(ServerEvent::GameState {
        state: snakes([14, 0], ALICE, SnakesPhase::Animating),
    });
    let (effects, ticks) = play_out(&mut c);
    // 3, 4, then the climb to 14.
    assert_eq!(ticks, 3);
    assert_eq!(cues(&effects), vec![StepKind::Ladder]);
}

#[test]
fn test_remote_mover_is_not_acknowledged() {
    let mut c = started(snakes([0, 0], BOB, SnakesPhase::Rolling));
    c.handle(ServerEvent::GameState {
        state: snakes([0, 4], BOB, SnakesPhase::Animating),
    });
    assert!(c.is_animating());
    let (effects, _) = play_out(&mut c);
    assert_eq!(acks(&effects), 0);
    assert_eq!(shown(&c, BOB), Some(4));
}

// =========================================================================
// Superseding and buffering
// =========================================================================

#[test]
fn test_superseded_job_stops_in_place() {
    let mut c = started(snakes([0, 0], BOB, SnakesPhase::Rolling));
    c.handle(ServerEvent::GameState {
        state: snakes([0, 5], BOB, SnakesPhase::Animating),
    });
    c.advance();
    c.advance();
    assert_eq!(shown(&c, BOB), Some(2));

    let newer = snakes([0, 9], ALICE, SnakesPhase::Rolling);
    let effects = c.handle(ServerEvent::GameState {
        state: newer.clone(),
    });
    assert!(effects.contains(&Effect::Redraw));
    assert!(!c.is_animating());
    assert!(c.display().matches(&newer));
    assert!(c.advance().is_empty());
    assert_eq!(shown(&c, BOB), Some(9));
}

#[test]
fn test_superseded_local_job_acknowledges_at_most_once() {
    let mut c = started(snakes([0, 0], ALICE, SnakesPhase::Rolling));
    let mut effects = c.handle(ServerEvent::GameState {
        state: snakes([5, 0], ALICE, SnakesPhase::Animating),
    });
    effects.extend(c.advance());
    effects.extend(c.advance());

    // The server still waits on us, with the token further along.
    effects.extend(c.handle(ServerEvent::GameState {
        state: snakes([8, 0], ALICE, SnakesPhase::Animating),
    }));
    effects.extend(c.handle(ServerEvent::GameState {
        state: snakes([8, 0], ALICE, SnakesPhase::Animating),
    }));
    let (rest, _) = play_out(&mut c);
    effects.extend(rest);

    assert_eq!(acks(&effects), 1);
}

#[test]
fn test_supersede_discards_buffered_snapshots() {
    let mut c = started(snakes([0, 0], BOB, SnakesPhase::Rolling));
    c.handle(ServerEvent::GameState {
        state: snakes([0, 5], BOB, SnakesPhase::Animating),
    });
    let mut pending = snakes([0, 5], BOB, SnakesPhase::Animating);
    pending.last_roll = Some(5);
    c.handle(ServerEvent::GameState { state: pending });
    assert_eq!(c.buffered_len(), 1);

    c.handle(ServerEvent::GameState {
        state: snakes([0, 11], ALICE, SnakesPhase::Rolling),
    });
    assert_eq!(c.buffered_len(), 0);
    assert!(!c.is_animating());
}

#[test]
fn test_unrelated_change_waits_for_completion() {
    let mut c = started(snakes([0, 0], BOB, SnakesPhase::Rolling));
    c.handle(ServerEvent::GameState {
        state: snakes([0, 3], BOB, SnakesPhase::Animating),
    });
    c.advance();

    let mut after = snakes([0, 3], ALICE, SnakesPhase::Rolling);
    after.last_roll = Some(3);
    c.handle(ServerEvent::GameState {
        state: after.clone(),
    });
    assert_eq!(c.buffered_len(), 1);
    assert!(!c.display().matches(&after));
    assert_eq!(c.phase(), TurnPhase::Animating);

    c.advance();
    assert!(!c.display().matches(&after));

    c.advance();
    assert!(!c.is_animating());
    assert_eq!(c.buffered_len(), 0);
    assert!(c.display().matches(&after));
    assert_eq!(c.phase(), TurnPhase::AwaitingRoll);
}

#[test]
fn test_buffer_cap_drops_oldest_snapshot() {
    let config = SyncConfig {
        max_buffered: 2,
        ..SyncConfig::default()
    };
    let mut c = controller::<SnakesAndLadders>(config);
    c.handle(ServerEvent::GameStart {
        state: snakes([0, 0], BOB, SnakesPhase::Rolling),
        valid_moves: None,
    });
    c.handle(ServerEvent::GameState {
        state: snakes([0, 4], BOB, SnakesPhase::Animating),
    });

    let mut last = None;
    for roll in 1..=3 {
        let mut s = snakes([0, 4], BOB, SnakesPhase::Animating);
        s.last_roll = Some(roll);
        last = Some(s.clone());
        c.handle(ServerEvent::GameState { state: s });
    }
    assert_eq!(c.buffered_len(), 2);
    assert!(c.is_animating());

    play_out(&mut c);
    assert!(c.display().matches(&last.unwrap()));
}

#[test]
fn test_display_converges_to_last_received() {
    let mut c = started(snakes([0, 0], ALICE, SnakesPhase::Rolling));
    let sequence = [
        snakes([4, 0], ALICE, SnakesPhase::Animating),
        snakes([14, 0], BOB, SnakesPhase::Rolling),
        snakes([14, 2], BOB, SnakesPhase::Animating),
        snakes([14, 2], ALICE, SnakesPhase::Rolling),
    ];
    for state in &sequence {
        c.handle(ServerEvent::GameState {
            state: state.clone(),
        });
        c.advance();
    }
    play_out(&mut c);
    let last = sequence.last().unwrap();
    assert!(c.display().matches(last));
    assert_eq!(c.store().received().map(|s| s.as_ref()), Some(last));
}

#[test]
fn test_catch_up_stops_at_job_boundary() {
    let mut c = started(snakes([0, 0], BOB, SnakesPhase::Rolling));
    c.handle(ServerEvent::GameState {
        state: snakes([0, 3], BOB, SnakesPhase::Animating),
    });
    c.handle(ServerEvent::GameState {
        state: snakes([2, 3], ALICE, SnakesPhase::Animating),
    });
    assert_eq!(c.buffered_len(), 1);

    // A late tick owing many steps finishes bob's walk only.
    c.advance_steps(10);
    assert_eq!(shown(&c, BOB), Some(3));
    assert!(c.is_animating());
    assert_eq!(shown(&c, ALICE), Some(0));

    c.advance_steps(1);
    assert_eq!(shown(&c, ALICE), Some(1));

    let effects = c.advance_steps(5);
    assert_eq!(shown(&c, ALICE), Some(2));
    assert_eq!(acks(&effects), 1);
    assert!(!c.is_animating());
}

// =========================================================================
// Recovery
// =========================================================================

fn bootstrap(state: Option<SnakesState>) -> RoomBootstrap<SnakesState> {
    RoomBootstrap {
        room: RoomSnapshot {
            code: RoomCode::new("K7QX"),
            status: RoomStatus::Playing,
            players: roster(),
        },
        game_state: state,
    }
}

#[test]
fn test_reload_mid_animation_acknowledges_once() {
    let mut c = ReconciliationController::<SnakesAndLadders>::new(
        client("alice"),
        SyncConfig::default(),
    );
    c.join_event().unwrap();

    let stuck = snakes([9, 0], ALICE, SnakesPhase::Animating);
    let effects = c.bootstrap(bootstrap(Some(stuck.clone())));
    assert_eq!(acks(&effects), 1);
    assert!(!c.is_animating());

    // The room:update that follows the join must not repeat it.
    let effects = c.handle(ServerEvent::RoomUpdate {
        players: roster(),
        status: RoomStatus::Playing,
    });
    assert_eq!(acks(&effects), 0);
    let effects = c.handle(ServerEvent::GameState { state: stuck });
    assert_eq!(acks(&effects), 0);

    let effects = c.handle(ServerEvent::GameState {
        state: snakes([9, 0], BOB, SnakesPhase::Rolling),
    });
    assert_eq!(acks(&effects), 0);
    assert_eq!(c.phase(), TurnPhase::AwaitingRoll);
}

#[test]
fn test_reconnect_drops_animation_and_rebootstraps() {
    let mut c = started(snakes([0, 0], BOB, SnakesPhase::Rolling));
    c.handle(ServerEvent::GameState {
        state: snakes([0, 6], BOB, SnakesPhase::Animating),
    });
    c.advance();
    c.reset_for_bootstrap();
    assert!(!c.is_animating());
    assert_eq!(shown(&c, BOB), Some(6));
    assert!(c.store().applied().is_none());

    let fresh = snakes([2, 6], ALICE, SnakesPhase::Rolling);
    c.bootstrap(bootstrap(Some(fresh.clone())));
    assert!(!c.is_animating());
    assert!(c.display().matches(&fresh));
}

// =========================================================================
// Ludo: several subjects change at once
// =========================================================================

fn ludo(tokens: [[i8; 4]; 2], turn: usize, phase: LudoPhase) -> LudoState {
    LudoState {
        tokens: tokens.to_vec(),
        current_turn: turn,
        turn_phase: phase,
        dice: None,
        winner: None,
    }
}

#[test]
fn test_capture_animates_mover_and_snaps_victim() {
    let mut c = controller::<Ludo>(SyncConfig::default());
    // Seat 0 at progress 10 (cell 10), seat 1 at progress 0 (cell 13).
    c.handle(ServerEvent::GameStart {
        state: ludo([[10, -1, -1, -1], [0, -1, -1, -1]], ALICE, LudoPhase::Moving),
        valid_moves: None,
    });
    let target = ludo([[13, -1, -1, -1], [-1, -1, -1, -1]], ALICE, LudoPhase::Animating);
    c.handle(ServerEvent::GameState {
        state: target.clone(),
    });
    assert_eq!(c.scheduler().active().map(|j| j.subject), Some(SubjectId::new(0, 0)));

    let victim = SubjectId::new(1, 0);
    c.advance();
    assert_eq!(c.display().position(victim), Some(&LudoCell::Track(13)));

    let (effects, ticks) = play_out(&mut c);
    assert_eq!(ticks, 2);
    assert_eq!(acks(&effects), 1);
    assert_eq!(
        c.display().position(victim),
        Some(&LudoCell::Yard { seat: 1, token: 0 })
    );
    assert!(c.display().matches(&target));
}

#[test]
fn test_ambiguous_change_is_direct() {
    let mut c = controller::<Ludo>(SyncConfig::default());
    c.handle(ServerEvent::GameStart {
        state: ludo([[10, 20, -1, -1], [-1; 4]], BOB, LudoPhase::Rolling),
        valid_moves: None,
    });
    // Two tokens of the previous owner's opponent moved: no mover.
    let next = ludo([[12, 22, -1, -1], [-1; 4]], BOB, LudoPhase::Rolling);
    c.handle(ServerEvent::GameState {
        state: next.clone(),
    });
    assert!(!c.is_animating());
    assert!(c.display().matches(&next));
}

// =========================================================================
// Outcome, notices, lifecycle
// =========================================================================

#[test]
fn test_winner_waits_for_animation() {
    let mut c = started(snakes([97, 0], ALICE, SnakesPhase::Rolling));
    let mut end = snakes([100, 0], ALICE, SnakesPhase::Ended);
    end.winner = Some(ALICE);
    c.handle(ServerEvent::GameState { state: end });

    let outcome = Outcome {
        winner: Some("alice".into()),
        is_draw: false,
        leaderboard: Vec::new(),
    };
    let effects = c.handle(ServerEvent::Winner(outcome.clone()));
    assert!(effects.is_empty());

    let (effects, _) = play_out(&mut c);
    assert_eq!(cues(&effects), vec![StepKind::Finish]);
    assert_eq!(effects.last(), Some(&Effect::Outcome(outcome)));
    assert!(c.client().is_finished());
    assert!(c.act(ActionKind::Roll, None).is_empty());
}

#[test]
fn test_error_event_becomes_notice() {
    let mut c = started(snakes([0, 0], ALICE, SnakesPhase::Rolling));
    let effects = c.handle(ServerEvent::Error {
        message: "not your turn".into(),
    });
    assert_eq!(effects, vec![Effect::Notice("not your turn".into())]);
    assert_eq!(c.notice_ttl(), SyncConfig::default().notice_ttl);
}

#[test]
fn test_game_start_resets_animation() {
    let mut c = started(snakes([0, 0], BOB, SnakesPhase::Rolling));
    c.handle(ServerEvent::GameState {
        state: snakes([0, 5], BOB, SnakesPhase::Animating),
    });
    let fresh = snakes([0, 0], ALICE, SnakesPhase::Rolling);
    let effects = c.handle(ServerEvent::GameStart {
        state: fresh.clone(),
        valid_moves: Some(vec!["roll".into()]),
    });
    assert_eq!(acks(&effects), 0);
    assert!(!c.is_animating());
    assert!(c.display().matches(&fresh));
    assert_eq!(c.store().valid_moves(), Some(&["roll".to_string()][..]));
}

#[test]
fn test_teardown_leaves_once_and_goes_quiet() {
    let mut c = started(snakes([0, 0], ALICE, SnakesPhase::Rolling));
    assert_eq!(c.teardown(), Some(ClientEvent::Leave {}));
    assert_eq!(c.teardown(), None);
    assert!(c.handle(ServerEvent::Error { message: "x".into() }).is_empty());
    assert!(c.act(ActionKind::Roll, None).is_empty());
    assert!(matches!(c.join_event(), Err(SyncError::Session(_))));
}

#[test]
fn test_step_delay_uses_game_default_unless_overridden() {
    let c = controller::<Ludo>(SyncConfig::default());
    assert_eq!(c.step_delay(), Ludo::step_delay());

    let config = SyncConfig {
        step_delay: Some(std::time::Duration::from_millis(120)),
        ..SyncConfig::default()
    };
    let c = controller::<SnakesAndLadders>(config);
    assert_eq!(c.step_delay(), std::time::Duration::from_millis(120));
}
