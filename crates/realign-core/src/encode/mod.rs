//! Image encoding for saving aligned results.
//!
//! This module provides functionality for:
//! - Writing a grid to disk as PNG, TIFF or JPEG (format chosen by extension)
//! - Encoding a grid to PNG bytes for in-memory consumers
//!
//! # Examples
//!
//! ```ignore
//! use realign_core::encode::save_grid;
//!
//! save_grid(engine.data(), "field_b_aligned.png")?;
//! ```

mod raster;

pub use raster::{encode_png, save_grid};
