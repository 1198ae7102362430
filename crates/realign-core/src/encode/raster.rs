//! Raster encoding of pixel grids.
//!
//! PNG and TIFF outputs keep 16 bits per sample so a saved alignment result
//! loses as little precision as possible. Other formats fall back to 8 bits.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageError, ImageFormat, Luma, Rgb};

use crate::decode::{to_u16, to_u8, PixelGrid};
use crate::error::{EngineError, Result};

/// Write a grid to `path`, choosing the format from the file extension.
///
/// # Errors
///
/// Returns `EngineError::Io` if the path cannot be written and
/// `EngineError::Encode` if the extension is not a supported raster format.
pub fn save_grid(grid: &PixelGrid, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)
        .map_err(|_| EngineError::Encode(format!("unsupported extension: {}", path.display())))?;

    let img = to_dynamic(grid, wants_16_bit(format))?;
    img.save_with_format(path, format).map_err(|e| match e {
        ImageError::IoError(io) => EngineError::io(path, io),
        other => EngineError::Encode(other.to_string()),
    })?;

    log::info!(
        "saved {}x{} image to {}",
        grid.width,
        grid.height,
        path.display()
    );
    Ok(())
}

/// Encode a grid as PNG bytes.
pub fn encode_png(grid: &PixelGrid) -> Result<Vec<u8>> {
    let img = to_dynamic(grid, true)?;
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| EngineError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

fn wants_16_bit(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Png | ImageFormat::Tiff)
}

fn to_dynamic(grid: &PixelGrid, sixteen_bit: bool) -> Result<DynamicImage> {
    if grid.is_empty() {
        return Err(EngineError::Encode(format!(
            "cannot encode empty {}x{} image",
            grid.width, grid.height
        )));
    }

    let (w, h) = grid.dimensions();
    let mismatch = || EngineError::Encode("sample buffer does not match dimensions".to_string());

    let img = match (grid.channels, sixteen_bit) {
        (1, true) => {
            let raw = grid.data.iter().map(|&s| to_u16(s)).collect();
            DynamicImage::ImageLuma16(
                ImageBuffer::<Luma<u16>, _>::from_raw(w, h, raw).ok_or_else(mismatch)?,
            )
        }
        (1, false) => {
            let raw = grid.data.iter().map(|&s| to_u8(s)).collect();
            DynamicImage::ImageLuma8(
                ImageBuffer::<Luma<u8>, _>::from_raw(w, h, raw).ok_or_else(mismatch)?,
            )
        }
        (3, true) => {
            let raw = grid.data.iter().map(|&s| to_u16(s)).collect();
            DynamicImage::ImageRgb16(
                ImageBuffer::<Rgb<u16>, _>::from_raw(w, h, raw).ok_or_else(mismatch)?,
            )
        }
        (3, false) => {
            let raw = grid.data.iter().map(|&s| to_u8(s)).collect();
            DynamicImage::ImageRgb8(
                ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, raw).ok_or_else(mismatch)?,
            )
        }
        (channels, _) => {
            return Err(EngineError::Encode(format!(
                "unsupported channel count: {channels}"
            )))
        }
    };

    Ok(img)
}
