//! Spatial model: the wall/floor grid and the room rectangles carved into it.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::RangeInclusive;

/// A single map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Cell {
    #[default]
    Wall,
    Floor,
}

/// Width x height matrix of cells, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid where every cell is a wall.
    pub fn filled(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Wall; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x])
    }

    pub fn is_floor(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == Some(Cell::Floor)
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    pub(crate) fn carve_room(&mut self, room: &Room) {
        for y in room.y..room.y + room.height {
            for x in room.x..room.x + room.width {
                self.set(x, y, Cell::Floor);
            }
        }
    }

    /// Coordinates of every floor cell, row by row.
    pub fn floor_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Floor)
            .map(move |(i, _)| (i % self.width, i / self.width))
    }

    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Floor).count()
    }

    /// Whether every floor cell can reach every other through 4-connected floor.
    ///
    /// A grid without floor counts as connected.
    pub fn is_floor_connected(&self) -> bool {
        let Some(start) = self.floor_cells().next() else {
            return true;
        };

        let mut visited = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();
        visited[start.1 * self.width + start.0] = true;
        queue.push_back(start);
        let mut reached = 1;

        while let Some((x, y)) = queue.pop_front() {
            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if !self.is_floor(nx, ny) {
                    continue;
                }
                let idx = ny * self.width + nx;
                if !visited[idx] {
                    visited[idx] = true;
                    reached += 1;
                    queue.push_back((nx, ny));
                }
            }
        }

        reached == self.floor_count()
    }
}

/// Axis-aligned room rectangle in grid coordinates.
///
/// Rooms are immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

impl Room {
    /// Build a room rectangle. The generator only produces rooms of at least
    /// 3x3, but callers may hand the placer smaller ones.
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Last column covered by the room.
    pub fn right(&self) -> usize {
        self.x + self.width - 1
    }

    /// Last row covered by the room.
    pub fn bottom(&self) -> usize {
        self.y + self.height - 1
    }

    pub fn center(&self) -> (usize, usize) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// The rectangle grown by `margin` cells on every side (clamped at 0).
    pub fn expanded(&self, margin: usize) -> Room {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        let right = self.right() + margin;
        let bottom = self.bottom() + margin;
        Room {
            x,
            y,
            width: right - x + 1,
            height: bottom - y + 1,
        }
    }

    pub fn intersects(&self, other: &Room) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Cells at least one step away from the room's edge, as column and row
    /// ranges. `None` when the room is too thin to have an interior.
    pub fn interior(&self) -> Option<(RangeInclusive<usize>, RangeInclusive<usize>)> {
        if self.width <= 2 || self.height <= 2 {
            return None;
        }
        Some((self.x + 1..=self.right() - 1, self.y + 1..=self.bottom() - 1))
    }

    pub fn interior_contains(&self, x: usize, y: usize) -> bool {
        self.interior()
            .map(|(cols, rows)| cols.contains(&x) && rows.contains(&y))
            .unwrap_or(false)
    }
}
