//! Move classification: dead squares, freezes, and matching infeasibility.

use sokofess::analysis::analyze;
use sokofess::board::Board;
use sokofess::core::coord::Coord;
use sokofess::deadlock::{DeadlockDetector, MoveRejection};
use sokofess::search::movegen::macro_moves;

#[test]
fn pushes_onto_dead_squares_are_vetoed() {
    // Pushing the box up parks it on the top row, from which it can never
    // come back down to the target.
    let board = Board::load("#####\n#   #\n#@$ #\n# . #\n#####").unwrap();
    let analysis = analyze(&board);
    let mut detector = DeadlockDetector::new(&board, &analysis, true, true);

    let state = board.initial_state();
    let zone = board.player_zone(state.boxes(), state.player());
    let moves = macro_moves(&board, &state, &zone);

    let mut saw_dead_veto = false;
    for mv in &moves {
        if analysis.dead[mv.to.index()] {
            assert_eq!(
                detector.classify_move(&state, mv, None),
                Some(MoveRejection::DeadSquare)
            );
            saw_dead_veto = true;
        }
    }
    assert!(saw_dead_veto, "some candidate must end on a dead square");
}

#[test]
fn freeze_pair_against_a_wall_is_vetoed() {
    // Pushing the upper box left stacks it above the lower box in the wall
    // column; both freeze off their targets.
    let level = "\
#####
#  .#
# $ #
#$  #
#.@ #
#####";
    let board = Board::load(level).unwrap();
    let analysis = analyze(&board);
    let mut detector = DeadlockDetector::new(&board, &analysis, true, true);

    let state = board.initial_state();
    let zone = board.player_zone(state.boxes(), state.player());
    let moves = macro_moves(&board, &state, &zone);

    let from = board.cell_at(Coord::new(2, 2)).unwrap();
    let to = board.cell_at(Coord::new(1, 2)).unwrap();
    let mv = moves
        .iter()
        .find(|m| m.from == from && m.to == to)
        .expect("the left push is legal");

    assert_eq!(
        detector.classify_move(&state, mv, None),
        Some(MoveRejection::Freeze)
    );
}

#[test]
fn frozen_box_on_target_is_not_a_deadlock() {
    // Parking the box on the corner target freezes it, but frozen-on-target
    // is packed, not dead.
    let board = Board::load("#####\n#.$@#\n#   #\n#####").unwrap();
    let analysis = analyze(&board);
    let mut detector = DeadlockDetector::new(&board, &analysis, true, true);

    let state = board.initial_state();
    let zone = board.player_zone(state.boxes(), state.player());
    let moves = macro_moves(&board, &state, &zone);

    let target = board.cell_at(Coord::new(1, 1)).unwrap();
    let packing = moves
        .iter()
        .find(|m| m.to == target)
        .expect("the packing push is legal");

    assert_eq!(detector.classify_move(&state, packing, None), None);
}

#[test]
fn frozen_boxes_are_detected_transitively() {
    // The left box is wedged between the wall column and the corridor floor;
    // the right box is free.
    let board = Board::load("#######\n#.   .#\n#$@ $ #\n#######").unwrap();
    let analysis = analyze(&board);
    let detector = DeadlockDetector::new(&board, &analysis, true, true);

    let state = board.initial_state();
    let frozen = detector.frozen_boxes(state.boxes());
    assert_eq!(frozen, vec![true, false]);
}

#[test]
fn unmatchable_boxes_fail_the_bipartite_check() {
    // Both boxes can only ever reach the right-hand target; the alcove
    // target above is unreachable for every box. Any live push leaves two
    // boxes fighting over one target.
    let level = "\
#########
#    #.##
#@$ $  .#
#    ####
#########";
    let board = Board::load(level).unwrap();
    let analysis = analyze(&board);
    let mut strict = DeadlockDetector::new(&board, &analysis, true, true);
    let mut lax = DeadlockDetector::new(&board, &analysis, false, false);

    let state = board.initial_state();
    let zone = board.player_zone(state.boxes(), state.player());
    let moves = macro_moves(&board, &state, &zone);
    let mv = moves
        .iter()
        .find(|m| !analysis.dead[m.to.index()])
        .expect("some push stays on live squares");

    assert_eq!(
        strict.classify_move(&state, mv, None),
        Some(MoveRejection::Bipartite)
    );
    assert_eq!(lax.classify_move(&state, mv, None), None);
}
