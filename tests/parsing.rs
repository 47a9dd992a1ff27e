use sokofess::board::{Board, CellKind, ParseError};
use sokofess::core::coord::Coord;

#[test]
fn parses_the_full_symbol_set() {
    let board = Board::load("######\n#+*$.#\n# $  #\n######").unwrap();
    assert_eq!(board.width(), 6);
    assert_eq!(board.height(), 4);
    // `+`, `*`, and `.` all contribute targets.
    assert_eq!(board.targets().len(), 3);
    assert_eq!(board.boxes_start().len(), 3);
    let player = board.player_start();
    assert_eq!(board.coord_of(player).x, 1);
    assert_eq!(board.coord_of(player).y, 1);
}

#[test]
fn short_lines_are_padded_with_outside() {
    let board = Board::load("####\n#@ ###\n#$ ..#\n#$   #\n######").unwrap();
    // The ragged first row leaves cells beyond its walls; they must be
    // outside, not floor.
    let top_right = board.cell_at(Coord::new(5, 0)).unwrap();
    assert_eq!(board.kind(top_right), CellKind::Outside);
}

#[test]
fn exterior_floor_is_outside() {
    let board = Board::load("  #####\n  #@$.#\n  #####").unwrap();
    let corner = board.cell_at(Coord::new(0, 0)).unwrap();
    assert_eq!(board.kind(corner), CellKind::Outside);
    let inside = board.cell_at(Coord::new(3, 1)).unwrap();
    assert_eq!(board.kind(inside), CellKind::Floor);
}

#[test]
fn rejects_unknown_symbols() {
    let err = Board::load("#####\n#@x.#\n#####").unwrap_err();
    assert!(matches!(err, ParseError::UnknownSymbol { symbol: 'x', .. }));
}

#[test]
fn rejects_missing_player() {
    let err = Board::load("#####\n# $.#\n#####").unwrap_err();
    assert_eq!(err, ParseError::NoPlayer);
}

#[test]
fn rejects_second_player() {
    let err = Board::load("######\n#@@$.#\n######").unwrap_err();
    assert!(matches!(err, ParseError::MultiplePlayers { .. }));
}

#[test]
fn rejects_box_target_mismatch() {
    let err = Board::load("######\n#@$$.#\n######").unwrap_err();
    assert_eq!(
        err,
        ParseError::BoxTargetMismatch {
            boxes: 2,
            targets: 1
        }
    );
}

#[test]
fn rejects_unenclosed_player() {
    let err = Board::load("#####\n#@$.\n#####").unwrap_err();
    assert!(matches!(err, ParseError::Unenclosed { .. }));
}

#[test]
fn rejects_empty_text() {
    assert_eq!(Board::load("").unwrap_err(), ParseError::EmptyLevel);
    assert_eq!(Board::load("   \n  ").unwrap_err(), ParseError::EmptyLevel);
}

#[test]
fn accepts_a_boxless_level() {
    let board = Board::load("###\n#@#\n###").unwrap();
    assert!(board.targets().is_empty());
    assert!(board.boxes_start().is_empty());
    assert!(board.is_goal(&board.initial_state()));
}

#[test]
fn goal_detection_matches_boxes_to_targets() {
    let board = Board::load("#####\n#@* #\n#####").unwrap();
    assert!(board.is_goal(&board.initial_state()));

    let board = Board::load("#####\n#@$.#\n#####").unwrap();
    assert!(!board.is_goal(&board.initial_state()));
}
