//! Room / tunnel decomposition of the playing field.
//!
//! A tunnel cell is a 1-wide corridor cell: blocked on both sides of one
//! axis. Rooms are the connected components of the remaining floor; tunnel
//! cells are the links between them. A link is *obstructed* when a box sits
//! on it, which is what the `f_room` feature counts.

use crate::board::Board;
use crate::core::coord::{Cell, Dir, DIRS};

pub const NO_ROOM: u16 = u16::MAX;

#[derive(Debug, Clone)]
pub struct Rooms {
    /// Per cell: room id, or [`NO_ROOM`] for walls, outside, and tunnel cells.
    pub room_of: Vec<u16>,
    /// Per cell: true for tunnel (link) cells.
    pub is_link: Vec<bool>,
    pub room_count: usize,
    pub link_count: usize,
}

impl Rooms {
    pub fn build(board: &Board) -> Rooms {
        let n = board.cell_count();
        let mut is_link = vec![false; n];
        let mut link_count = 0;

        let blocked = |cell: Cell, dir: Dir| match board.neighbor(cell, dir) {
            Some(c) => !board.is_floor(c),
            None => true,
        };

        for cell in board.floor_cells() {
            let horizontal = blocked(cell, Dir::Left) && blocked(cell, Dir::Right);
            let vertical = blocked(cell, Dir::Up) && blocked(cell, Dir::Down);
            if horizontal || vertical {
                is_link[cell.index()] = true;
                link_count += 1;
            }
        }

        // Rooms: components of non-tunnel floor.
        let mut room_of = vec![NO_ROOM; n];
        let mut room_count = 0usize;
        let mut stack: Vec<Cell> = Vec::new();
        for cell in board.floor_cells() {
            if is_link[cell.index()] || room_of[cell.index()] != NO_ROOM {
                continue;
            }
            let id = room_count as u16;
            room_count += 1;
            room_of[cell.index()] = id;
            stack.push(cell);
            while let Some(c) = stack.pop() {
                for dir in DIRS {
                    let Some(nc) = board.floor_neighbor(c, dir) else {
                        continue;
                    };
                    if is_link[nc.index()] || room_of[nc.index()] != NO_ROOM {
                        continue;
                    }
                    room_of[nc.index()] = id;
                    stack.push(nc);
                }
            }
        }

        Rooms {
            room_of,
            is_link,
            room_count,
            link_count,
        }
    }

    /// Number of links currently obstructed by a box (the `f_room` feature).
    pub fn obstructed_links(&self, boxes: &[Cell]) -> usize {
        boxes.iter().filter(|b| self.is_link[b.index()]).count()
    }
}
