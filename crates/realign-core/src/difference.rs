//! Difference images for judging alignment.

use serde::{Deserialize, Serialize};

use crate::decode::PixelGrid;
use crate::error::{EngineError, Result};

/// Element-wise absolute difference `|a - b|`.
///
/// # Errors
///
/// `EngineError::DimensionMismatch` if the grids differ in width, height or
/// channel count. Bringing them onto the same grid is the caller's job.
pub fn difference(a: &PixelGrid, b: &PixelGrid) -> Result<PixelGrid> {
    if !a.same_shape(b) {
        return Err(EngineError::DimensionMismatch {
            left_width: a.width,
            left_height: a.height,
            left_channels: a.channels,
            right_width: b.width,
            right_height: b.height,
            right_channels: b.channels,
        });
    }

    let data = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(x, y)| (x - y).abs())
        .collect();
    Ok(PixelGrid::new(a.width, a.height, a.channels, data))
}

/// Summary of a difference image, lower is better aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DifferenceStats {
    pub mean: f64,
    pub max: f64,
    pub rms: f64,
}

impl DifferenceStats {
    pub fn from_grid(diff: &PixelGrid) -> Self {
        if diff.data.is_empty() {
            return Self::default();
        }

        let n = diff.data.len() as f64;
        let (sum, sum_sq, max) = diff.data.iter().fold((0.0, 0.0, 0.0f64), |(s, sq, m), &v| {
            let v = v as f64;
            (s + v, sq + v * v, m.max(v))
        });

        Self {
            mean: sum / n,
            max,
            rms: (sum_sq / n).sqrt(),
        }
    }
}
