//! WASM-compatible wrapper types for image data.

use realign_core::transform::InterpolationFilter;
use realign_core::PixelGrid;
use wasm_bindgen::prelude::*;

/// An 8-bit RGB image handed to JavaScript for display.
///
/// The engine works on floating point samples; this is the quantized copy a
/// canvas can draw. Grayscale images are expanded to RGB.
#[wasm_bindgen]
pub struct JsImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 3)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array.
    ///
    /// This copies the buffer out of WASM memory.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsImage {
    pub(crate) fn from_grid(grid: &PixelGrid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            pixels: grid.to_rgb8(),
        }
    }
}

/// Convert a u8 filter value to the core InterpolationFilter.
///
/// Values:
/// - 0 = Nearest
/// - 1 = Bilinear
/// - 2 = Lanczos3
///
/// Any other value falls back to Bilinear.
pub(crate) fn filter_from_u8(value: u8) -> InterpolationFilter {
    match value {
        0 => InterpolationFilter::Nearest,
        2 => InterpolationFilter::Lanczos3,
        _ => InterpolationFilter::Bilinear,
    }
}
