//! Transform history records.

use serde::{Deserialize, Serialize};

use super::Affine2;
use crate::error::{EngineError, Result};

/// One recorded geometric operation.
///
/// Distances are in native pixel units (samplerate 1). Rotation and scale
/// act about the center of the native image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum TransformOp {
    /// Rotation in degrees, positive = counter-clockwise.
    Rotate { angle: f64 },
    /// Shift of the image content. Positive `tx` is right, positive `ty` is down.
    Translate {
        #[serde(default)]
        tx: f64,
        #[serde(default)]
        ty: f64,
    },
    /// Uniform scale; below 1 shrinks, above 1 enlarges.
    Scale { factor: f64 },
}

impl TransformOp {
    pub fn kind(&self) -> &'static str {
        match self {
            TransformOp::Rotate { .. } => "rotate",
            TransformOp::Translate { .. } => "translate",
            TransformOp::Scale { .. } => "scale",
        }
    }

    /// Reject parameters that would make the composed transform meaningless.
    pub fn validate(&self) -> Result<()> {
        match *self {
            TransformOp::Rotate { angle } if !angle.is_finite() => Err(
                EngineError::InvalidParameter(format!("rotation angle must be finite, got {angle}")),
            ),
            TransformOp::Translate { tx, ty } if !tx.is_finite() || !ty.is_finite() => {
                Err(EngineError::InvalidParameter(format!(
                    "translation must be finite, got ({tx}, {ty})"
                )))
            }
            TransformOp::Scale { factor } if !factor.is_finite() || factor <= 0.0 => Err(
                EngineError::InvalidParameter(format!("scale factor must be > 0, got {factor}")),
            ),
            _ => Ok(()),
        }
    }

    /// Matrix of this operation on a native `width` x `height` image.
    pub fn to_affine(&self, width: u32, height: u32) -> Affine2 {
        let center = image_center(width, height);
        match *self {
            TransformOp::Rotate { angle } => Affine2::rotation_about(center, angle),
            TransformOp::Translate { tx, ty } => Affine2::translation(tx, ty),
            TransformOp::Scale { factor } => Affine2::scale_about(center, factor),
        }
    }

    /// Convert a translation expressed at `samplerate` into native units.
    pub(crate) fn to_native(self, samplerate: u32) -> Self {
        match self {
            TransformOp::Translate { tx, ty } => {
                let k = samplerate as f64;
                TransformOp::Translate {
                    tx: tx / k,
                    ty: ty / k,
                }
            }
            other => other,
        }
    }
}

/// Center of the pixel grid, between the outermost pixel centers.
#[inline]
pub fn image_center(width: u32, height: u32) -> (f64, f64) {
    (
        (width as f64 - 1.0) / 2.0,
        (height as f64 - 1.0) / 2.0,
    )
}
