//! Image decoding with EXIF orientation handling.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{Orientation, PixelGrid};
use crate::error::{EngineError, Result};

/// Placeholder path reported for images decoded from memory.
const MEMORY_SOURCE: &str = "<memory>";

/// Load an image file into a `PixelGrid`, applying EXIF orientation.
///
/// # Errors
///
/// Returns `EngineError::Load` if the file does not exist, cannot be read,
/// or is not in a format the decoder understands.
pub fn load_grid(path: impl AsRef<Path>) -> Result<PixelGrid> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| EngineError::load(path, e))?;
    let grid = decode_with_source(&bytes, path)?;
    log::info!(
        "loaded {} ({}x{}, {} channel(s))",
        path.display(),
        grid.width,
        grid.height,
        grid.channels
    );
    Ok(grid)
}

/// Decode encoded image bytes (PNG, JPEG, TIFF) into a `PixelGrid`.
pub fn decode_grid(bytes: &[u8]) -> Result<PixelGrid> {
    decode_with_source(bytes, Path::new(MEMORY_SOURCE))
}

fn decode_with_source(bytes: &[u8], source: &Path) -> Result<PixelGrid> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| EngineError::load(source, e))?;

    let img = reader.decode().map_err(|e| EngineError::load(source, e))?;

    Ok(grid_from_dynamic(apply_orientation(img, orientation)))
}

/// Convert a decoded image into a normalized `f32` grid.
///
/// Images without colour become single-channel grids. Alpha is dropped.
pub fn grid_from_dynamic(img: DynamicImage) -> PixelGrid {
    let (width, height) = (img.width(), img.height());
    if img.color().has_color() {
        PixelGrid::new(width, height, 3, img.to_rgb32f().into_raw())
    } else {
        PixelGrid::new(width, height, 1, img.to_luma32f().into_raw())
    }
}

/// Extract EXIF orientation from encoded bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
