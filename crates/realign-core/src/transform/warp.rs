//! Inverse-mapping resampler with nearest, bilinear and Lanczos3 kernels.
//!
//! # Algorithm
//!
//! For each pixel of the output grid, the inverse transform gives the
//! source coordinate it comes from, and the source is interpolated there:
//!
//! ```text
//! (src_x, src_y) = inverse.apply(dst_x, dst_y)
//! ```
//!
//! A source pixel covers the unit square around its center, so sampling is
//! valid anywhere in `[-0.5, width - 0.5] x [-0.5, height - 0.5]`. Kernel
//! taps that fall outside the grid reuse the nearest edge pixel. Samples
//! whose coordinate lies outside the footprint get the background value.

use serde::{Deserialize, Serialize};

use super::Affine2;
use crate::decode::PixelGrid;

/// Tolerance on the footprint test, absorbs rounding in rotated coordinates.
const FOOTPRINT_EPSILON: f64 = 1e-9;

/// Interpolation filter for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationFilter {
    /// Nearest neighbor, no new intensity values are introduced.
    Nearest,
    /// Bilinear interpolation - the interactive default.
    #[default]
    Bilinear,
    /// Lanczos3 interpolation - sharper, six taps per axis.
    Lanczos3,
}

/// Map from the native grid to a grid `samplerate` times denser.
///
/// Native pixel `p` has its center at `k * (p + 0.5) - 0.5` on the dense grid.
pub fn supersample_matrix(samplerate: u32) -> Affine2 {
    let k = samplerate as f64;
    Affine2 {
        a: k,
        b: 0.0,
        tx: (k - 1.0) / 2.0,
        c: 0.0,
        d: k,
        ty: (k - 1.0) / 2.0,
    }
}

/// Inverse of [`supersample_matrix`]: dense pixel `g` maps to native
/// `(g + 0.5) / k - 0.5`.
pub fn supersample_inverse(samplerate: u32) -> Affine2 {
    let k = samplerate as f64;
    Affine2 {
        a: 1.0 / k,
        b: 0.0,
        tx: (1.0 - k) / (2.0 * k),
        c: 0.0,
        d: 1.0 / k,
        ty: (1.0 - k) / (2.0 * k),
    }
}

/// Resample `src` into a new `out_width` x `out_height` grid.
///
/// `inverse` maps output pixel coordinates to source pixel coordinates.
pub fn warp(
    src: &PixelGrid,
    out_width: u32,
    out_height: u32,
    inverse: &Affine2,
    filter: InterpolationFilter,
    background: f32,
) -> PixelGrid {
    // Fast path: nothing to resample
    if inverse.is_identity() && src.dimensions() == (out_width, out_height) {
        return src.clone();
    }

    let channels = src.channels as usize;
    let mut output = vec![background; out_width as usize * out_height as usize * channels];

    if src.is_empty() || output.is_empty() {
        return PixelGrid::new(out_width, out_height, src.channels, output);
    }

    let max_x = src.width as f64 - 0.5 + FOOTPRINT_EPSILON;
    let max_y = src.height as f64 - 0.5 + FOOTPRINT_EPSILON;
    let min = -0.5 - FOOTPRINT_EPSILON;

    for (dst_y, row) in output
        .chunks_exact_mut(out_width as usize * channels)
        .enumerate()
    {
        for (dst_x, pixel) in row.chunks_exact_mut(channels).enumerate() {
            let (x, y) = inverse.apply(dst_x as f64, dst_y as f64);

            if x < min || x > max_x || y < min || y > max_y {
                continue;
            }

            match filter {
                InterpolationFilter::Nearest => sample_nearest(src, x, y, pixel),
                InterpolationFilter::Bilinear => sample_bilinear(src, x, y, pixel),
                InterpolationFilter::Lanczos3 => sample_lanczos3(src, x, y, pixel),
            }
        }
    }

    PixelGrid::new(out_width, out_height, src.channels, output)
}

#[inline]
fn clamp_index(v: i64, len: u32) -> usize {
    v.clamp(0, len as i64 - 1) as usize
}

#[inline]
fn sample_at(src: &PixelGrid, px: usize, py: usize, channel: usize) -> f64 {
    let c = src.channels as usize;
    src.data[(py * src.width as usize + px) * c + channel] as f64
}

fn sample_nearest(src: &PixelGrid, x: f64, y: f64, out: &mut [f32]) {
    let px = clamp_index(x.round() as i64, src.width);
    let py = clamp_index(y.round() as i64, src.height);
    for (ch, v) in out.iter_mut().enumerate() {
        *v = sample_at(src, px, py, ch) as f32;
    }
}

/// Bilinear interpolation over the 4 nearest pixels.
fn sample_bilinear(src: &PixelGrid, x: f64, y: f64, out: &mut [f32]) {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let (xa, xb) = (clamp_index(x0, src.width), clamp_index(x0 + 1, src.width));
    let (ya, yb) = (clamp_index(y0, src.height), clamp_index(y0 + 1, src.height));

    for (ch, v) in out.iter_mut().enumerate() {
        let p00 = sample_at(src, xa, ya, ch);
        let p10 = sample_at(src, xb, ya, ch);
        let p01 = sample_at(src, xa, yb, ch);
        let p11 = sample_at(src, xb, yb, ch);

        let value = p00 * (1.0 - fx) * (1.0 - fy)
            + p10 * fx * (1.0 - fy)
            + p01 * (1.0 - fx) * fy
            + p11 * fx * fy;
        *v = value as f32;
    }
}

/// Lanczos3 interpolation over a 6x6 neighborhood.
fn sample_lanczos3(src: &PixelGrid, x: f64, y: f64, out: &mut [f32]) {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 3];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        let py = y0 + ky;
        let wy = lanczos_weight(y - py as f64, 3.0);
        let sy = clamp_index(py, src.height);

        for kx in -2..=3 {
            let px = x0 + kx;
            let weight = lanczos_weight(x - px as f64, 3.0) * wy;
            let sx = clamp_index(px, src.width);

            for (ch, acc) in sum.iter_mut().enumerate().take(out.len()) {
                *acc += sample_at(src, sx, sy, ch) * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum.abs() > f64::EPSILON {
        for (ch, v) in out.iter_mut().enumerate() {
            *v = (sum[ch] / weight_sum).clamp(0.0, 1.0) as f32;
        }
    }
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;

    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}
