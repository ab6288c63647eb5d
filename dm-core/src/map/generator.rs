//! Room-and-corridor map generation.
//!
//! The algorithm:
//! 1. Start from an all-wall grid.
//! 2. Propose `2 * target` rectangular rooms at random, keeping each one that
//!    leaves at least one wall cell between itself and every accepted room.
//! 3. Join consecutive rooms (creation order) with L-shaped corridors between
//!    their centers, which keeps the whole floor connected.
//!
//! The theme is cosmetic only and never changes the grid.

use super::grid::{Cell, Grid, Room};
use crate::error::ErrorKind;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest accepted width or height.
pub const MIN_DIMENSION: usize = 5;

/// Largest accepted width or height.
pub const MAX_DIMENSION: usize = 50;

const MIN_ROOM_SIZE: usize = 3;
const MAX_ROOM_SIZE: usize = 6;

/// Errors from map generation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("Invalid map dimensions {width}x{height}: width and height must be between 5 and 50")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Unknown map theme: {0}")]
    UnknownTheme(String),
}

impl MapError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// Map theme. Only affects the description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Theme {
    #[default]
    Dungeon,
    Cave,
    Castle,
    Forest,
}

impl Theme {
    pub fn name(&self) -> &'static str {
        match self {
            Theme::Dungeon => "Dungeon",
            Theme::Cave => "Cave",
            Theme::Castle => "Castle",
            Theme::Forest => "Forest",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Theme::Dungeon => "A dark, stone-walled dungeon with flickering torchlight.",
            Theme::Cave => "A damp, stalactite-filled cave with echoing drips.",
            Theme::Castle => "A grand castle hall with tapestries and suits of armor.",
            Theme::Forest => "A dense forest clearing with overgrown paths.",
        }
    }

    pub fn all() -> &'static [Theme] {
        &[Theme::Dungeon, Theme::Cave, Theme::Castle, Theme::Forest]
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Theme {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Theme::all()
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MapError::UnknownTheme(s.to_string()))
    }
}

/// A generated map: the grid plus its rooms in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonMap {
    pub grid: Grid,
    pub rooms: Vec<Room>,
    pub theme: Theme,
}

impl DungeonMap {
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Human-readable summary of the map and its rooms (rooms numbered from 1).
    pub fn describe(&self) -> String {
        let mut desc = format!("{} Map ({}x{})\n", self.theme, self.width(), self.height());
        desc.push_str(&format!("Rooms: {}\n", self.rooms.len()));
        desc.push_str("Description:\n");
        desc.push_str(self.theme.description());
        desc.push_str("\n\nRoom Details:\n");
        for (i, room) in self.rooms.iter().enumerate() {
            desc.push_str(&format!(
                "Room {}: Position ({},{}), Size {}x{}\n",
                i + 1,
                room.x(),
                room.y(),
                room.width(),
                room.height()
            ));
        }
        desc
    }
}

/// Number of rooms the generator aims for on a `width` x `height` grid.
pub fn target_room_count(width: usize, height: usize) -> usize {
    (width * height / 100).max(3)
}

/// Generate a map using the thread-local RNG.
pub fn generate(width: usize, height: usize, theme: Theme) -> Result<DungeonMap, MapError> {
    generate_with_rng(width, height, theme, &mut rand::thread_rng())
}

/// Generate a map with a specific RNG (useful for testing).
pub fn generate_with_rng<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    theme: Theme,
    rng: &mut R,
) -> Result<DungeonMap, MapError> {
    let valid = MIN_DIMENSION..=MAX_DIMENSION;
    if !valid.contains(&width) || !valid.contains(&height) {
        return Err(MapError::InvalidDimensions { width, height });
    }

    let mut grid = Grid::filled(width, height);
    let rooms = place_rooms(width, height, rng);
    for room in &rooms {
        grid.carve_room(room);
    }
    connect_rooms(&mut grid, &rooms);

    log::info!(
        "Generated {theme} map {width}x{height} with {} rooms (target {})",
        rooms.len(),
        target_room_count(width, height)
    );

    Ok(DungeonMap { grid, rooms, theme })
}

fn place_rooms<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Vec<Room> {
    let attempts = target_room_count(width, height) * 2;
    let max_w = MAX_ROOM_SIZE.min(width - 2);
    let max_h = MAX_ROOM_SIZE.min(height - 2);
    let mut rooms: Vec<Room> = Vec::new();

    for attempt in 0..attempts {
        let room_w = rng.gen_range(MIN_ROOM_SIZE..=max_w);
        let room_h = rng.gen_range(MIN_ROOM_SIZE..=max_h);
        // Keep the outer ring of the grid solid.
        let x = rng.gen_range(1..=width - room_w - 1);
        let y = rng.gen_range(1..=height - room_h - 1);
        let candidate = Room::new(x, y, room_w, room_h);

        let padded = candidate.expanded(1);
        if rooms.iter().any(|accepted| padded.intersects(accepted)) {
            log::debug!("Room proposal {attempt} at ({x},{y}) {room_w}x{room_h} overlaps, discarded");
            continue;
        }
        rooms.push(candidate);
    }

    rooms
}

/// L-shaped corridors: horizontal along room i's center row, then vertical
/// along room i+1's center column.
fn connect_rooms(grid: &mut Grid, rooms: &[Room]) {
    for pair in rooms.windows(2) {
        let (cx1, cy1) = pair[0].center();
        let (cx2, cy2) = pair[1].center();

        for x in cx1.min(cx2)..=cx1.max(cx2) {
            grid.set(x, cy1, Cell::Floor);
        }
        for y in cy1.min(cy2)..=cy1.max(cy2) {
            grid.set(cx2, y, Cell::Floor);
        }
    }
}
