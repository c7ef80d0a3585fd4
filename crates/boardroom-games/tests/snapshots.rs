//! Decoding real-looking server frames into each game's snapshot type and
//! reading them back through `GameKind`.

use boardroom_games::{
    Chess, GameKind, Ludo, LudoCell, LudoState, SnakesAndLadders, SnakesState,
    StepKind, SubjectId, SquareRules, TurnPhase,
};
use boardroom_protocol::{Codec, JsonCodec, ServerEvent};

// =========================================================================
// Snake-and-ladder
// =========================================================================

#[test]
fn test_snakes_state_frame_animates_mover() {
    let frame = br#"{"event":"game:state","data":{"state":{
        "positions":[7,0],"currentTurn":0,"turnPhase":"animating","lastRoll":4,
        "snakes":{"16":6},"ladders":{}
    }}}"#;
    let event: ServerEvent<SnakesState> = JsonCodec.decode(frame).unwrap();
    let ServerEvent::GameState { state } = event else {
        panic!("expected game:state");
    };

    assert_eq!(SnakesAndLadders::phase(&state), TurnPhase::Animating);
    let positions = SnakesAndLadders::positions(&state);
    let path = SnakesAndLadders::path(&state, SubjectId::seat(0), &3, &positions[&SubjectId::seat(0)], None);
    assert_eq!(path.len(), 4);
    assert_eq!(path.last().unwrap().position, 7);
}

#[test]
fn test_snake_path_fires_chute_once() {
    let frame = br#"{"positions":[6,0],"currentTurn":1,"turnPhase":"rolling",
        "snakes":{"16":6,"14":6},"ladders":{}}"#;
    let state: SnakesState = JsonCodec.decode(frame).unwrap();

    let path = SnakesAndLadders::path(&state, SubjectId::seat(0), &12, &6, None);
    let chutes = path.iter().filter(|s| s.kind == StepKind::Chute).count();
    assert_eq!(chutes, 1);
    // The nearest trigger within reach is used.
    assert_eq!(path.len(), 3);
}

// =========================================================================
// Ludo
// =========================================================================

#[test]
fn test_ludo_start_frame_puts_all_tokens_in_yards() {
    let frame = br#"{"event":"game:start","data":{"state":{
        "tokens":[[-1,-1,-1,-1],[-1,-1,-1,-1]],"currentTurn":0,"turnPhase":"rolling"
    }}}"#;
    let event: ServerEvent<LudoState> = JsonCodec.decode(frame).unwrap();
    let ServerEvent::GameStart { state, valid_moves } = event else {
        panic!("expected game:start");
    };
    assert_eq!(valid_moves, None);

    let positions = Ludo::positions(&state);
    assert!(
        positions
            .values()
            .all(|cell| matches!(cell, LudoCell::Yard { .. }))
    );
    assert_eq!(Ludo::turn_owner(&state), Some(0));
}

// =========================================================================
// Chess
// =========================================================================

#[test]
fn test_chess_start_frame_with_valid_moves() {
    let frame = br#"{"event":"game:start","data":{
        "state":{"fen":"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"},
        "validMoves":["e2e4","g1f3"]
    }}"#;
    let event: ServerEvent<boardroom_games::ChessState> = JsonCodec.decode(frame).unwrap();
    let ServerEvent::GameStart { state, valid_moves } = event else {
        panic!("expected game:start");
    };
    assert_eq!(valid_moves.map(|v| v.len()), Some(2));

    let g1 = "g1".parse().unwrap();
    let targets: Vec<String> = Chess::legal_targets(&state, g1)
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(targets, ["f3", "h3"]);
}
