use std::path::PathBuf;

use sokofess::solution::{manifest, to_lurd, write_bundle};
use sokofess::{solve, LimitReason, SolveOptions, SolveOutcome};

fn usage() -> ! {
    eprintln!(
        "Usage: solve <level-file> [--max-nodes N] [--max-ms M] [--no-corral] \
         [--no-bipartite] [--seed S] [--export <path>]\n\n\
         Exit codes: 0 solved, 1 unsolvable, 2 limit exceeded, 3 malformed input, 4 cancelled"
    );
    std::process::exit(3);
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let level_path = &args[1];
    let mut options = SolveOptions::default();
    let mut export: Option<PathBuf> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--max-nodes" => {
                options.max_nodes = parse_value(&args, i, "--max-nodes");
                i += 2;
            }
            "--max-ms" => {
                options.max_millis = parse_value(&args, i, "--max-ms");
                i += 2;
            }
            "--seed" => {
                options.zobrist_seed = parse_value(&args, i, "--seed");
                i += 2;
            }
            "--no-corral" => {
                options.enable_corral_check = false;
                i += 1;
            }
            "--no-bipartite" => {
                options.enable_bipartite_check = false;
                i += 1;
            }
            "--export" => {
                let Some(path) = args.get(i + 1) else {
                    eprintln!("--export requires a path argument");
                    std::process::exit(3);
                };
                export = Some(PathBuf::from(path));
                i += 2;
            }
            unknown => {
                eprintln!("Unknown option: {unknown}");
                usage();
            }
        }
    }

    let level = match std::fs::read_to_string(level_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Failed to read {level_path}: {e}");
            std::process::exit(3);
        }
    };

    let report = match solve(&level, &options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Malformed level: {e}");
            std::process::exit(3);
        }
    };

    let stats = &report.stats;
    eprintln!(
        "nodes: {} expanded / {} generated; pruned: {} dead-square, {} freeze, \
         {} corral, {} bipartite, {} duplicate; {} feature cells; {} ms",
        stats.nodes_expanded,
        stats.nodes_generated,
        stats.dead_square_pruned,
        stats.freeze_pruned,
        stats.corral_pruned,
        stats.bipartite_pruned,
        stats.duplicates_pruned,
        stats.feature_cells,
        stats.wall_ms
    );

    match report.outcome {
        SolveOutcome::Solved(solution) => {
            eprintln!(
                "solved: {} macro moves, {} pushes",
                solution.macro_moves.len(),
                solution.pushes.len()
            );
            let board = sokofess::Board::load(&level).expect("level parsed once already");
            match to_lurd(&board, &solution.pushes) {
                Ok(lurd) => println!("{lurd}"),
                Err(e) => eprintln!("internal: solution failed to render: {e}"),
            }
            if let Some(path) = export {
                let bundle = manifest(&level, &options, &solution, stats);
                match write_bundle(&path, &bundle) {
                    Ok(()) => eprintln!("wrote solution bundle to {}", path.display()),
                    Err(e) => eprintln!("bundle export failed: {e}"),
                }
            }
            std::process::exit(0);
        }
        SolveOutcome::Unsolvable => {
            eprintln!("unsolvable");
            std::process::exit(1);
        }
        SolveOutcome::LimitExceeded(reason) => {
            let reason = match reason {
                LimitReason::Nodes => "node cap",
                LimitReason::Time => "deadline",
                LimitReason::Memory => "memory cap",
            };
            eprintln!("limit exceeded: {reason}");
            std::process::exit(2);
        }
        SolveOutcome::Cancelled => {
            eprintln!("cancelled");
            std::process::exit(4);
        }
    }
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T
where
    T::Err: std::fmt::Display,
{
    let Some(raw) = args.get(i + 1) else {
        eprintln!("{flag} requires an argument");
        std::process::exit(3);
    };
    match raw.parse() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("invalid {flag} {raw}: {e}");
            std::process::exit(3);
        }
    }
}
