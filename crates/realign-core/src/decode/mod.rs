//! Image loading for the transform engine.
//!
//! This module provides functionality for:
//! - Decoding PNG, JPEG and TIFF images from disk or memory
//! - Applying EXIF orientation so the grid matches what a viewer shows
//! - The `PixelGrid` buffer every other module works on
//!
//! # Examples
//!
//! ```ignore
//! use realign_core::decode::load_grid;
//!
//! let grid = load_grid("field_a.png")?;
//! println!("Loaded {}x{} grid", grid.width, grid.height);
//! ```

mod file;
mod types;

pub use file::{decode_grid, grid_from_dynamic, load_grid};
pub use types::PixelGrid;
pub(crate) use types::{to_u16, to_u8, Orientation};
