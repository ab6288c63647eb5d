//! Procedural dungeon maps.
//!
//! - [`grid`]: wall/floor cells and room rectangles
//! - [`generator`]: room-and-corridor generation
//! - [`render`]: ASCII and bitmap output of a map with its placements

pub mod generator;
pub mod grid;
pub mod render;

pub use generator::{generate, generate_with_rng, target_room_count, DungeonMap, MapError, Theme};
pub use grid::{Cell, Grid, Room};
pub use render::{export_png, render_ascii, render_image, RenderError};
