//! Map output: ASCII for terminals, RGB bitmaps for image export.
//!
//! Both renderers are pure functions of the map and its placements.

use super::generator::DungeonMap;
use super::grid::Cell;
use crate::encounter::Placement;
use crate::error::ErrorKind;
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;
use thiserror::Error;

const WALL_COLOR: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);
const FLOOR_COLOR: Rgb<u8> = Rgb([0xCC, 0xCC, 0xCC]);

/// Errors from map image export.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Tile size must be at least 1")]
    InvalidTileSize,

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::InvalidTileSize => ErrorKind::InvalidInput,
            RenderError::Image(_) => ErrorKind::PersistenceFailure,
        }
    }
}

/// Render the map as text, one line per row.
///
/// Walls are `#`, floor is `.`, and a placement shows the first letter of
/// its entity. When two placements share a cell the later one wins.
pub fn render_ascii(map: &DungeonMap, placements: &[Placement]) -> String {
    let width = map.width();
    let mut rows: Vec<Vec<char>> = (0..map.height())
        .map(|y| {
            (0..width)
                .map(|x| match map.grid.get(x, y) {
                    Some(Cell::Floor) => '.',
                    _ => '#',
                })
                .collect()
        })
        .collect();

    for p in placements {
        if let Some(cell) = rows.get_mut(p.y).and_then(|row| row.get_mut(p.x)) {
            *cell = p.glyph();
        }
    }

    let mut out = String::with_capacity((width + 1) * rows.len());
    for row in rows {
        out.extend(row);
        out.push('\n');
    }
    out
}

/// Render the map as an RGB image with `tile_size` pixels per cell.
pub fn render_image(
    map: &DungeonMap,
    placements: &[Placement],
    tile_size: u32,
) -> Result<RgbImage, RenderError> {
    if tile_size == 0 {
        return Err(RenderError::InvalidTileSize);
    }

    let mut img = RgbImage::from_pixel(
        map.width() as u32 * tile_size,
        map.height() as u32 * tile_size,
        WALL_COLOR,
    );

    for (x, y) in map.grid.floor_cells() {
        fill_tile(&mut img, x as u32, y as u32, tile_size, FLOOR_COLOR);
    }

    for p in placements {
        draw_marker(&mut img, p.x as u32, p.y as u32, tile_size, Rgb(p.entity_type.color()));
    }

    Ok(img)
}

/// Render and write the map as a PNG.
pub fn export_png(
    map: &DungeonMap,
    placements: &[Placement],
    tile_size: u32,
    path: impl AsRef<Path>,
) -> Result<(), RenderError> {
    let img = render_image(map, placements, tile_size)?;
    img.save_with_format(path.as_ref(), ImageFormat::Png)?;
    log::info!("Exported map image to {}", path.as_ref().display());
    Ok(())
}

fn fill_tile(img: &mut RgbImage, tx: u32, ty: u32, tile: u32, color: Rgb<u8>) {
    for py in ty * tile..(ty + 1) * tile {
        for px in tx * tile..(tx + 1) * tile {
            img.put_pixel(px, py, color);
        }
    }
}

/// Filled circle centered in the tile, inset by a quarter tile.
fn draw_marker(img: &mut RgbImage, tx: u32, ty: u32, tile: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let radius = (tile as f32 / 4.0).max(0.5);
    let cx = tx as f32 * tile as f32 + tile as f32 / 2.0;
    let cy = ty as f32 * tile as f32 + tile as f32 / 2.0;

    for py in ty * tile..(ty + 1) * tile {
        for px in tx * tile..(tx + 1) * tile {
            if px >= w || py >= h {
                continue;
            }
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                img.put_pixel(px, py, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityRecord, EntityType};
    use crate::map::{generate_with_rng, Theme};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_map() -> DungeonMap {
        generate_with_rng(5, 5, Theme::Dungeon, &mut ChaCha8Rng::seed_from_u64(1)).unwrap()
    }

    fn goblin_at(x: usize, y: usize) -> Placement {
        Placement {
            entity_type: EntityType::Monster,
            entity: EntityRecord::new("Goblin", EntityType::Monster),
            room_index: 0,
            x,
            y,
        }
    }

    #[test]
    fn test_ascii_layout() {
        let map = small_map();
        let text = render_ascii(&map, &[goblin_at(2, 2)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["#####", "#...#", "#.G.#", "#...#", "#####"]);
    }

    #[test]
    fn test_image_colors() {
        let map = small_map();
        let tile = 8;
        let img = render_image(&map, &[goblin_at(2, 2)], tile).unwrap();
        assert_eq!(img.dimensions(), (40, 40));
        assert_eq!(*img.get_pixel(0, 0), WALL_COLOR);
        assert_eq!(*img.get_pixel(8, 8), FLOOR_COLOR);
        // Center of the goblin's tile.
        assert_eq!(*img.get_pixel(20, 20), Rgb([0xFF, 0x00, 0x00]));
        // Tile corner stays floor.
        assert_eq!(*img.get_pixel(16, 16), FLOOR_COLOR);
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        let err = render_image(&small_map(), &[], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_export_png_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("map.png");
        export_png(&small_map(), &[], 4, &path).unwrap();
        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(reloaded.dimensions(), (20, 20));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("map.png");
        let err = export_png(&small_map(), &[], 4, &path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    }
}
