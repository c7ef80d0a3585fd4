//! Chess selection flow: pick a piece, see its candidates, submit a move.

use boardroom_games::chess::Square;
use boardroom_games::{Chess, ChessState};
use boardroom_protocol::{
    ActionData, ActionKind, ClientEvent, Player, RoomCode, RoomStatus, ServerEvent, SessionId,
};
use boardroom_session::{RoomClient, SessionIdentity};
use boardroom_sync::{Effect, ReconciliationController, Selection, SyncConfig, SyncError};

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn state(fen: &str) -> ChessState {
    ChessState {
        fen: fen.into(),
        winner: None,
        is_draw: false,
        game_result: None,
        draw_offer: None,
        time_control: None,
        last_move: None,
    }
}

/// White (seat 0) is the local player.
fn chess(fen: &str) -> ReconciliationController<Chess> {
    let identity = SessionIdentity::with_session_id(SessionId("white".into()), "white").unwrap();
    let client = RoomClient::new(RoomCode::new("CH55"), identity);
    let mut c = ReconciliationController::new(client, SyncConfig::default());
    c.join_event().unwrap();
    c.handle(ServerEvent::RoomUpdate {
        players: ["white", "black"]
            .into_iter()
            .map(|id| Player {
                session_id: SessionId(id.into()),
                username: id.into(),
                is_host: false,
                is_connected: true,
            })
            .collect(),
        status: RoomStatus::Playing,
    });
    c.handle(ServerEvent::GameStart {
        state: state(fen),
        valid_moves: None,
    });
    c
}

fn submitted_move(effects: &[Effect]) -> Option<ActionData> {
    effects.iter().find_map(|e| match e {
        Effect::Emit(ClientEvent::Action(req)) if req.action == ActionKind::Move => {
            req.data.clone()
        }
        _ => None,
    })
}

#[test]
fn test_select_then_move() {
    let mut c = chess(START);
    assert_eq!(c.select(sq("e2")), vec![Effect::Redraw]);
    match c.selection() {
        Selection::Picking { origin, candidates } => {
            assert_eq!(*origin, sq("e2"));
            assert_eq!(candidates.iter().map(ToString::to_string).collect::<Vec<_>>(), ["e3", "e4"]);
        }
        other => panic!("expected a pick, got {other:?}"),
    }

    let effects = c.select(sq("e4"));
    assert_eq!(
        submitted_move(&effects),
        Some(ActionData::Move {
            from: "e2".into(),
            to: "e4".into(),
            promotion: None,
        })
    );
    assert!(c.selection().is_none());
}

#[test]
fn test_selecting_own_piece_reselects() {
    let mut c = chess(START);
    c.select(sq("e2"));
    c.select(sq("g1"));
    assert_eq!(c.selection().origin(), Some(&sq("g1")));
    assert!(c.selection().is_candidate(&sq("f3")));
}

#[test]
fn test_selecting_elsewhere_deselects() {
    let mut c = chess(START);
    c.select(sq("e2"));
    let effects = c.select(sq("d5"));
    assert_eq!(effects, vec![Effect::Redraw]);
    assert!(c.selection().is_none());

    // Opponent pieces are not selectable.
    c.select(sq("e7"));
    assert!(c.selection().is_none());
}

#[test]
fn test_nothing_selectable_on_opponents_turn() {
    let mut c = chess("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
    assert!(c.select(sq("d2")).is_empty());
    assert!(c.selection().is_none());
}

#[test]
fn test_new_snapshot_clears_selection() {
    let mut c = chess(START);
    c.select(sq("b1"));
    assert!(!c.selection().is_none());
    c.handle(ServerEvent::GameState {
        state: state(START),
    });
    assert!(c.selection().is_none());
}

#[test]
fn test_promotion_waits_for_piece_choice() {
    let mut c = chess("8/4P3/8/8/8/8/8/4K2k w - - 0 1");
    c.select(sq("e7"));
    let effects = c.select(sq("e8"));
    assert_eq!(effects, vec![Effect::Redraw]);
    assert_eq!(
        c.selection(),
        &Selection::Promoting {
            from: sq("e7"),
            to: sq("e8"),
        }
    );

    assert!(matches!(
        c.choose_promotion('k'),
        Err(SyncError::InvalidPromotion('k'))
    ));
    let effects = c.choose_promotion('q').unwrap();
    assert_eq!(
        submitted_move(&effects),
        Some(ActionData::Move {
            from: "e7".into(),
            to: "e8".into(),
            promotion: Some('q'),
        })
    );
    assert!(c.selection().is_none());
}

#[test]
fn test_promotion_without_pending_move_is_an_error() {
    let mut c = chess(START);
    assert!(matches!(
        c.choose_promotion('q'),
        Err(SyncError::NoPendingPromotion)
    ));
}

#[test]
fn test_cancel_selection() {
    let mut c = chess(START);
    assert!(c.cancel_selection().is_empty());
    c.select(sq("e2"));
    assert_eq!(c.cancel_selection(), vec![Effect::Redraw]);
    assert!(c.selection().is_none());
}

#[test]
fn test_draw_offer_is_answered_by_the_other_side() {
    let mut c = chess(START);
    assert_eq!(c.act(ActionKind::OfferDraw, None).len(), 1);

    let mut offered = state(START);
    offered.draw_offer = Some(boardroom_games::chess::Color::Black);
    c.handle(ServerEvent::GameState { state: offered });
    assert_eq!(c.act(ActionKind::AcceptDraw, None).len(), 1);
    assert!(c.select(sq("e2")).is_empty());
}

#[test]
fn test_chess_never_animates() {
    let mut c = chess(START);
    c.handle(ServerEvent::GameState {
        state: state("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"),
    });
    assert!(!c.is_animating());
    assert!(c.advance().is_empty());
}
