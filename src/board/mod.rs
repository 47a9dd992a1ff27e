//! Immutable puzzle geometry and ASCII level parsing.
//!
//! A [`Board`] is the static part of a puzzle: wall/floor/outside cells,
//! target cells, and the start placement. Everything derived from geometry
//! alone (dead squares, rooms, packing order, distances) lives in
//! [`crate::analysis`]; the dynamic part of a position lives in
//! [`crate::core::state::State`].

use std::fmt;

use crate::core::coord::{Cell, Coord, Dir, DIRS};
use crate::core::state::State;

pub mod zobrist;

/// Practical bound on either board axis.
pub const MAX_DIM: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Wall,
    Floor,
    /// Unreachable exterior; not part of the playing field.
    Outside,
}

/// Why a level failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    EmptyLevel,
    TooLarge {
        width: usize,
        height: usize,
    },
    UnknownSymbol {
        symbol: char,
        x: usize,
        y: usize,
    },
    NoPlayer,
    MultiplePlayers {
        x: usize,
        y: usize,
    },
    BoxTargetMismatch {
        boxes: usize,
        targets: usize,
    },
    /// A player, box, or target sits on floor not enclosed by walls.
    Unenclosed {
        x: usize,
        y: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyLevel => write!(f, "level text contains no rows"),
            ParseError::TooLarge { width, height } => write!(
                f,
                "level is {width}x{height}, larger than the {MAX_DIM}x{MAX_DIM} bound"
            ),
            ParseError::UnknownSymbol { symbol, x, y } => {
                write!(f, "unknown symbol {symbol:?} at ({x},{y})")
            }
            ParseError::NoPlayer => write!(f, "level has no player"),
            ParseError::MultiplePlayers { x, y } => {
                write!(f, "second player at ({x},{y})")
            }
            ParseError::BoxTargetMismatch { boxes, targets } => {
                write!(f, "{boxes} boxes but {targets} targets")
            }
            ParseError::Unenclosed { x, y } => {
                write!(f, "cell ({x},{y}) is not enclosed by walls")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parsed, immutable geometry of a puzzle.
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<CellKind>,
    targets: Vec<Cell>,
    is_target: Vec<bool>,
    player_start: Cell,
    boxes_start: Vec<Cell>,
}

impl Board {
    /// Parse the standard symbol set: `#` wall, ` ` floor, `@` player,
    /// `$` box, `.` target, `+` player-on-target, `*` box-on-target.
    ///
    /// Lines of unequal length are right-padded with outside cells. Floor
    /// connected to the grid border is outside; gameplay cells must be
    /// enclosed.
    pub fn load(text: &str) -> Result<Board, ParseError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .collect();
        let lines: Vec<&str> = {
            // Drop leading/trailing blank lines, keep interior ones.
            let first = lines.iter().position(|l| !l.trim().is_empty());
            let last = lines.iter().rposition(|l| !l.trim().is_empty());
            match (first, last) {
                (Some(a), Some(b)) => lines[a..=b].to_vec(),
                _ => return Err(ParseError::EmptyLevel),
            }
        };

        let height = lines.len();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if width == 0 {
            return Err(ParseError::EmptyLevel);
        }
        if width > MAX_DIM || height > MAX_DIM {
            return Err(ParseError::TooLarge { width, height });
        }

        let n = width * height;
        let mut wall = vec![false; n];
        let mut is_target = vec![false; n];
        let mut box_cells: Vec<Cell> = Vec::new();
        let mut player: Option<Cell> = None;

        for (y, line) in lines.iter().enumerate() {
            for (x, symbol) in line.chars().enumerate() {
                let cell = Cell::new(y * width + x);
                match symbol {
                    '#' => wall[cell.index()] = true,
                    ' ' => {}
                    '.' => is_target[cell.index()] = true,
                    '$' => box_cells.push(cell),
                    '*' => {
                        box_cells.push(cell);
                        is_target[cell.index()] = true;
                    }
                    '@' | '+' => {
                        if player.is_some() {
                            return Err(ParseError::MultiplePlayers { x, y });
                        }
                        player = Some(cell);
                        if symbol == '+' {
                            is_target[cell.index()] = true;
                        }
                    }
                    other => {
                        return Err(ParseError::UnknownSymbol {
                            symbol: other,
                            x,
                            y,
                        })
                    }
                }
            }
        }

        let player_start = player.ok_or(ParseError::NoPlayer)?;

        // Flood non-wall cells from the border: whatever is reached is
        // outside the walled interior.
        let mut outside = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        for x in 0..width {
            for &y in &[0, height - 1] {
                let i = y * width + x;
                if !wall[i] && !outside[i] {
                    outside[i] = true;
                    stack.push(i);
                }
            }
        }
        for y in 0..height {
            for &x in &[0, width - 1] {
                let i = y * width + x;
                if !wall[i] && !outside[i] {
                    outside[i] = true;
                    stack.push(i);
                }
            }
        }
        while let Some(i) = stack.pop() {
            let x = i % width;
            let y = i / width;
            let mut visit = |j: usize| {
                if !wall[j] && !outside[j] {
                    outside[j] = true;
                    stack.push(j);
                }
            };
            if x > 0 {
                visit(i - 1);
            }
            if x + 1 < width {
                visit(i + 1);
            }
            if y > 0 {
                visit(i - width);
            }
            if y + 1 < height {
                visit(i + width);
            }
        }

        let cells: Vec<CellKind> = (0..n)
            .map(|i| {
                if wall[i] {
                    CellKind::Wall
                } else if outside[i] {
                    CellKind::Outside
                } else {
                    CellKind::Floor
                }
            })
            .collect();

        let enclosed = |cell: Cell| cells[cell.index()] == CellKind::Floor;
        let coord_err = |cell: Cell| ParseError::Unenclosed {
            x: cell.index() % width,
            y: cell.index() / width,
        };
        if !enclosed(player_start) {
            return Err(coord_err(player_start));
        }
        for &b in &box_cells {
            if !enclosed(b) {
                return Err(coord_err(b));
            }
        }
        let mut targets: Vec<Cell> = Vec::new();
        for i in 0..n {
            if is_target[i] {
                let cell = Cell::new(i);
                if !enclosed(cell) {
                    return Err(coord_err(cell));
                }
                targets.push(cell);
            }
        }

        if box_cells.len() != targets.len() {
            return Err(ParseError::BoxTargetMismatch {
                boxes: box_cells.len(),
                targets: targets.len(),
            });
        }

        box_cells.sort_unstable();

        Ok(Board {
            width,
            height,
            cells,
            targets,
            is_target,
            player_start,
            boxes_start: box_cells,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn kind(&self, cell: Cell) -> CellKind {
        self.cells[cell.index()]
    }

    #[inline]
    pub fn is_floor(&self, cell: Cell) -> bool {
        self.cells[cell.index()] == CellKind::Floor
    }

    #[inline]
    pub fn is_target(&self, cell: Cell) -> bool {
        self.is_target[cell.index()]
    }

    /// Target cells, sorted ascending.
    #[inline]
    pub fn targets(&self) -> &[Cell] {
        &self.targets
    }

    /// Index of `cell` within [`Board::targets`], if it is a target.
    pub fn target_index(&self, cell: Cell) -> Option<usize> {
        self.targets.binary_search(&cell).ok()
    }

    #[inline]
    pub fn player_start(&self) -> Cell {
        self.player_start
    }

    #[inline]
    pub fn boxes_start(&self) -> &[Cell] {
        &self.boxes_start
    }

    pub fn initial_state(&self) -> State {
        State::new(self.boxes_start.clone(), self.player_start)
    }

    /// True iff every target holds a box. Box and target counts are equal by
    /// construction, so this is equivalent to `boxes == targets`.
    pub fn is_goal(&self, state: &State) -> bool {
        state.boxes() == self.targets.as_slice()
    }

    #[inline]
    pub fn coord_of(&self, cell: Cell) -> Coord {
        Coord::new(
            (cell.index() % self.width) as i32,
            (cell.index() / self.width) as i32,
        )
    }

    pub fn cell_at(&self, coord: Coord) -> Option<Cell> {
        if coord.x < 0
            || coord.y < 0
            || coord.x as usize >= self.width
            || coord.y as usize >= self.height
        {
            return None;
        }
        Some(Cell::new(coord.y as usize * self.width + coord.x as usize))
    }

    /// The neighboring cell one step in `dir`, if it is on the grid.
    pub fn neighbor(&self, cell: Cell, dir: Dir) -> Option<Cell> {
        self.cell_at(self.coord_of(cell) + dir.delta())
    }

    /// The neighboring cell, but only when it is playable floor.
    #[inline]
    pub fn floor_neighbor(&self, cell: Cell, dir: Dir) -> Option<Cell> {
        self.neighbor(cell, dir).filter(|&c| self.is_floor(c))
    }

    /// Iterator over all floor cells, in cell order.
    pub fn floor_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cells.len())
            .filter(move |&i| self.cells[i] == CellKind::Floor)
            .map(Cell::new)
    }

    /// Flood-fill the cells the player can reach from `start` without pushing
    /// anything; `boxes` must be sorted ascending.
    pub fn player_zone(&self, boxes: &[Cell], start: Cell) -> Zone {
        debug_assert!(self.is_floor(start));
        debug_assert!(boxes.binary_search(&start).is_err());
        let mut cells = vec![false; self.cell_count()];
        let mut canonical = start;
        let mut stack = vec![start];
        cells[start.index()] = true;
        while let Some(c) = stack.pop() {
            if c < canonical {
                canonical = c;
            }
            for dir in DIRS {
                let Some(nc) = self.floor_neighbor(c, dir) else {
                    continue;
                };
                if cells[nc.index()] || boxes.binary_search(&nc).is_ok() {
                    continue;
                }
                cells[nc.index()] = true;
                stack.push(nc);
            }
        }
        Zone { cells, canonical }
    }

    /// Canonical player cell and Zobrist fingerprint for a state. Two states
    /// with the same boxes whose players share a zone canonicalize equally.
    pub fn canonicalize(&self, zobrist: &zobrist::Zobrist, state: &State) -> (Cell, u64) {
        let zone = self.player_zone(state.boxes(), state.player());
        let hash = zobrist.hash(state.boxes(), zone.canonical);
        (zone.canonical, hash)
    }
}

/// A player-reachability region: membership mask plus its canonical
/// (smallest) cell, which identifies the zone for hashing and deduplication.
#[derive(Debug, Clone)]
pub struct Zone {
    pub cells: Vec<bool>,
    pub canonical: Cell,
}

impl Zone {
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells[cell.index()]
    }
}
