//! Core pixel-buffer types.

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A 2D grid of pixel intensities.
///
/// Samples are `f32` normalized to `0.0..=1.0`, stored row-major with the
/// channels of each pixel interleaved. Grayscale grids have one channel,
/// colour grids have three.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    /// Grid width in pixels.
    pub width: u32,
    /// Grid height in pixels.
    pub height: u32,
    /// Samples per pixel (1 or 3).
    pub channels: u8,
    /// Length is `width * height * channels`.
    pub data: Vec<f32>,
}

impl PixelGrid {
    /// Create a grid from dimensions and sample data.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<f32>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * channels as usize,
            "Sample buffer size mismatch"
        );
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// A grid where every sample has the same value.
    pub fn filled(width: u32, height: u32, channels: u8, value: f32) -> Self {
        let len = width as usize * height as usize * channels as usize;
        Self::new(width, height, channels, vec![value; len])
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check whether two grids have identical width, height and channel count.
    pub fn same_shape(&self, other: &PixelGrid) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    /// Samples of the pixel at (x, y).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let c = self.channels as usize;
        let idx = (y as usize * self.width as usize + x as usize) * c;
        &self.data[idx..idx + c]
    }

    /// Convert to an 8-bit RGB display buffer (3 bytes per pixel).
    ///
    /// Grayscale grids are replicated across the three channels.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.data.chunks_exact(self.channels as usize) {
            if self.channels == 1 {
                let v = to_u8(px[0]);
                out.extend_from_slice(&[v, v, v]);
            } else {
                out.extend(px.iter().take(3).map(|&s| to_u8(s)));
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

#[inline]
pub(crate) fn to_u8(sample: f32) -> u8 {
    (sample.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
pub(crate) fn to_u16(sample: f32) -> u16 {
    (sample.clamp(0.0, 1.0) * 65535.0).round() as u16
}
