//! Property test: randomly generated small solvable puzzles really solve.
//!
//! Puzzles are generated backwards: boxes start on the targets and the
//! player pulls them around for a while. Whatever configuration results is
//! solvable by construction (replay the pulls as pushes), so the solver must
//! find *some* solution and its pushes must replay to the goal.

use sokofess::solution::replay;
use sokofess::{solve, Board, SolveOptions, SolveOutcome};

/// Deterministic splitmix64 stream; no RNG crate needed for a fixed corpus.
struct Stream(u64);

impl Stream {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Tile {
    Floor,
    Target,
}

/// An open `w`x`h` room with a wall ring, boxes pulled off their targets.
struct Generator {
    w: usize,
    h: usize,
    tiles: Vec<Tile>,
    boxes: Vec<(usize, usize)>,
    player: (usize, usize),
}

impl Generator {
    fn new(stream: &mut Stream, w: usize, h: usize, box_count: usize) -> Option<Generator> {
        let mut tiles = vec![Tile::Floor; w * h];
        let mut used: Vec<(usize, usize)> = Vec::new();

        // Place targets (= initial box positions).
        let mut boxes = Vec::new();
        for _ in 0..box_count {
            for _ in 0..50 {
                let x = 1 + stream.below(w - 2);
                let y = 1 + stream.below(h - 2);
                if !used.contains(&(x, y)) {
                    used.push((x, y));
                    tiles[y * w + x] = Tile::Target;
                    boxes.push((x, y));
                    break;
                }
            }
        }
        if boxes.len() != box_count {
            return None;
        }

        // Place the player on a free cell.
        let player = loop {
            let x = 1 + stream.below(w - 2);
            let y = 1 + stream.below(h - 2);
            if !used.contains(&(x, y)) {
                break (x, y);
            }
        };

        Some(Generator {
            w,
            h,
            tiles,
            boxes,
            player,
        })
    }

    fn interior(&self, x: usize, y: usize) -> bool {
        x >= 1 && y >= 1 && x < self.w - 1 && y < self.h - 1
    }

    fn box_at(&self, x: usize, y: usize) -> Option<usize> {
        self.boxes.iter().position(|&b| b == (x, y))
    }

    /// One random pull: the player steps away from an adjacent box, dragging
    /// it into the player's old cell.
    fn pull(&mut self, stream: &mut Stream) -> bool {
        const DELTAS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
        let start = stream.below(4);
        for k in 0..4 {
            let (dx, dy) = DELTAS[(start + k) % 4];
            let (px, py) = self.player;
            // The box sits opposite the pull direction.
            let bx = px as i32 - dx;
            let by = py as i32 - dy;
            let nx = px as i32 + dx;
            let ny = py as i32 + dy;
            if bx < 0 || by < 0 || nx < 0 || ny < 0 {
                continue;
            }
            let (bx, by, nx, ny) = (bx as usize, by as usize, nx as usize, ny as usize);
            if !self.interior(nx, ny) || !self.interior(bx, by) {
                continue;
            }
            if self.box_at(nx, ny).is_some() {
                continue;
            }
            let Some(i) = self.box_at(bx, by) else {
                continue;
            };
            self.boxes[i] = (px, py);
            self.player = (nx, ny);
            return true;
        }
        // No pull available in any direction; take a plain step instead.
        let (dx, dy) = DELTAS[stream.below(4)];
        let nx = self.player.0 as i32 + dx;
        let ny = self.player.1 as i32 + dy;
        if nx >= 0 && ny >= 0 {
            let (nx, ny) = (nx as usize, ny as usize);
            if self.interior(nx, ny) && self.box_at(nx, ny).is_none() {
                self.player = (nx, ny);
            }
        }
        false
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for y in 0..self.h {
            for x in 0..self.w {
                let border = x == 0 || y == 0 || x == self.w - 1 || y == self.h - 1;
                let ch = if border {
                    '#'
                } else {
                    let target = self.tiles[y * self.w + x] == Tile::Target;
                    let has_box = self.box_at(x, y).is_some();
                    let has_player = self.player == (x, y);
                    match (target, has_box, has_player) {
                        (true, true, _) => '*',
                        (true, false, true) => '+',
                        (true, false, false) => '.',
                        (false, true, _) => '$',
                        (false, false, true) => '@',
                        (false, false, false) => ' ',
                    }
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

#[test]
fn generated_puzzles_solve_and_replay() {
    let mut stream = Stream(0x5eed);
    let mut checked = 0;

    for round in 0..40 {
        let w = 5 + round % 3; // 5..=7 including walls => 3x3..5x5 interior
        let h = 5 + (round / 3) % 3;
        let box_count = 1 + round % 3;

        let Some(mut generator) = Generator::new(&mut stream, w, h, box_count) else {
            continue;
        };
        for _ in 0..12 {
            generator.pull(&mut stream);
        }

        let level = generator.render();
        let board = match Board::load(&level) {
            Ok(board) => board,
            Err(e) => panic!("generated level failed to parse: {e}\n{level}"),
        };

        // The corral check may over-prune by design (budget exhaustion counts
        // as a deadlock); leave it off so every generated puzzle must solve.
        let options = SolveOptions {
            enable_corral_check: false,
            ..SolveOptions::default()
        };
        let report = solve(&level, &options).unwrap();
        let SolveOutcome::Solved(solution) = report.outcome else {
            panic!(
                "generated level must be solvable, got {:?}\n{level}",
                report.outcome
            );
        };

        let end = replay(&board, &solution.pushes).unwrap();
        assert!(board.is_goal(&end), "replay must reach the goal\n{level}");
        checked += 1;
    }

    assert!(checked >= 30, "only {checked} generated puzzles were checked");
}
