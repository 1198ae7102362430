//! Geometric transforms: composition and resampling.
//!
//! Every recorded operation becomes a 2x3 affine matrix in native pixel
//! coordinates. The history is folded into one matrix, followed by the map
//! onto the supersampled grid, and the original image is resampled once
//! through its inverse. Replaying a long history therefore costs a single
//! interpolation pass and never compounds interpolation error.
//!
//! # Coordinate System
//!
//! - Origin is the center of the top-left pixel, x right, y down
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Rotation and scale act about `((W - 1) / 2, (H - 1) / 2)`

mod affine;
mod ops;
mod warp;

pub use affine::Affine2;
pub use ops::{image_center, TransformOp};
pub use warp::{supersample_inverse, supersample_matrix, warp, InterpolationFilter};
