//! Solution bundles survive a write/read cycle and replay to the goal.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use sokofess::solution::{
    manifest, pushes_from_manifest, read_bundle, replay, to_lurd, write_bundle,
};
use sokofess::{solve, Board, SolveOptions, SolveOutcome};

const LEVEL: &str = "\
#######
#     #
# $$. #
# .@  #
#     #
#######";

fn unique_temp_file(name: &str) -> PathBuf {
    let base = std::env::temp_dir().join("sokofess_tests").join(name);
    let _ = fs::create_dir_all(&base);

    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    base.join(format!("{pid}-{nanos}.json"))
}

#[test]
fn bundle_roundtrips_and_replays() {
    let options = SolveOptions::default();
    let report = solve(LEVEL, &options).unwrap();
    let SolveOutcome::Solved(solution) = report.outcome else {
        panic!("level must solve");
    };

    let bundle = manifest(LEVEL, &options, &solution, &report.stats);
    let path = unique_temp_file("roundtrip");
    write_bundle(&path, &bundle).unwrap();

    let loaded = read_bundle(&path).unwrap();
    assert_eq!(loaded.level, LEVEL);
    assert_eq!(loaded.seed, options.zobrist_seed);
    assert_eq!(loaded.pushes.len(), solution.pushes.len());
    assert_eq!(loaded.macro_moves.len(), solution.macro_moves.len());
    assert_eq!(loaded.stats.nodes_expanded, report.stats.nodes_expanded);

    // Replaying the loaded pushes reaches the goal.
    let board = Board::load(&loaded.level).unwrap();
    let pushes = pushes_from_manifest(&loaded).unwrap();
    let end = replay(&board, &pushes).unwrap();
    assert!(board.is_goal(&end));

    let _ = fs::remove_file(&path);
}

#[test]
fn unknown_version_is_rejected() {
    let options = SolveOptions::default();
    let report = solve(LEVEL, &options).unwrap();
    let SolveOutcome::Solved(solution) = report.outcome else {
        panic!("level must solve");
    };

    let mut bundle = manifest(LEVEL, &options, &solution, &report.stats);
    bundle.format_version = 999;
    let path = unique_temp_file("bad_version");
    write_bundle(&path, &bundle).unwrap();

    assert!(read_bundle(&path).is_err());
    let _ = fs::remove_file(&path);
}

#[test]
fn lurd_text_replays_like_the_push_list() {
    let report = solve(LEVEL, &SolveOptions::default()).unwrap();
    let SolveOutcome::Solved(solution) = report.outcome else {
        panic!("level must solve");
    };

    let board = Board::load(LEVEL).unwrap();
    let lurd = to_lurd(&board, &solution.pushes).unwrap();

    // The uppercase letters of the LURD text are exactly the pushes.
    let upper: Vec<char> = lurd.chars().filter(|c| c.is_ascii_uppercase()).collect();
    assert_eq!(upper.len(), solution.pushes.len());
    for (ch, push) in upper.iter().zip(&solution.pushes) {
        assert_eq!(*ch, push.dir.push_letter());
    }
}
