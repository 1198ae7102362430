//! The transform engine: one image, its transform history and the cached
//! result of replaying that history.
//!
//! The history is the single source of truth. `data` is rebuilt from
//! `original`, `history` and `samplerate` on every change and is never
//! edited in place. Each operation computes the new state completely before
//! committing it, so a failed call leaves the engine untouched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::decode::{decode_grid, load_grid, PixelGrid};
use crate::difference::difference;
use crate::encode::{encode_png, save_grid};
use crate::error::{EngineError, Result};
use crate::history::TransformHistory;
use crate::samplerate::Samplerate;
use crate::transform::{supersample_inverse, warp, InterpolationFilter, TransformOp};

/// Resampling settings for an engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interpolation kernel used when replaying the history.
    pub filter: InterpolationFilter,
    /// Value written to pixels that fall outside the transformed image.
    pub background: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            filter: InterpolationFilter::Bilinear,
            background: 0.0,
        }
    }
}

/// A loaded image with a replayable, serializable transform history.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    original: PixelGrid,
    data: PixelGrid,
    samplerate: Samplerate,
    history: TransformHistory,
    config: EngineConfig,
    source: Option<PathBuf>,
}

impl TransformEngine {
    /// Load an image file and prepare it at `samplerate`.
    ///
    /// # Errors
    ///
    /// `EngineError::Load` if the file is missing or not a decodable image,
    /// `EngineError::InvalidParameter` if `samplerate` is not supported.
    pub fn from_file(path: impl AsRef<Path>, samplerate: u32) -> Result<Self> {
        let path = path.as_ref();
        let rate = Samplerate::try_from(samplerate)?;
        let grid = load_grid(path)?;
        let mut engine = Self::build(grid, rate)?;
        engine.source = Some(path.to_path_buf());
        Ok(engine)
    }

    /// Decode an in-memory image and prepare it at `samplerate`.
    pub fn from_bytes(bytes: &[u8], samplerate: u32) -> Result<Self> {
        let rate = Samplerate::try_from(samplerate)?;
        Self::build(decode_grid(bytes)?, rate)
    }

    /// Wrap an existing grid.
    pub fn from_grid(grid: PixelGrid, samplerate: u32) -> Result<Self> {
        let rate = Samplerate::try_from(samplerate)?;
        Self::build(grid, rate)
    }

    /// Builder form of [`set_config`](Self::set_config).
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        self.set_config(config)?;
        Ok(self)
    }

    fn build(original: PixelGrid, samplerate: Samplerate) -> Result<Self> {
        if original.is_empty() {
            return Err(EngineError::InvalidParameter(
                "image has no pixels".to_string(),
            ));
        }
        let config = EngineConfig::default();
        let data = render_base(&original, samplerate, &config)?;
        Ok(Self {
            original,
            data,
            samplerate,
            history: TransformHistory::new(),
            config,
            source: None,
        })
    }

    /// The current transformed pixel buffer.
    pub fn data(&self) -> &PixelGrid {
        &self.data
    }

    /// The pixel buffer as loaded, before any transform or supersampling.
    pub fn original(&self) -> &PixelGrid {
        &self.original
    }

    pub fn history(&self) -> &TransformHistory {
        &self.history
    }

    pub fn samplerate(&self) -> Samplerate {
        self.samplerate
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Path the image was loaded from, if it came from a file.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Dimensions of `data` (native dimensions times the samplerate).
    pub fn dimensions(&self) -> (u32, u32) {
        self.data.dimensions()
    }

    /// Change the resampling settings and re-render.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<()> {
        let data = render(&self.original, &self.history, self.samplerate, &config)?;
        self.config = config;
        self.data = data;
        Ok(())
    }

    /// Rotate about the image center, positive = counter-clockwise.
    ///
    /// An angle of 0 is still recorded.
    pub fn rotate(&mut self, angle_degrees: f64) -> Result<()> {
        self.append(TransformOp::Rotate {
            angle: angle_degrees,
        })
    }

    /// Shift the content by `(tx, ty)` pixels at the current samplerate.
    pub fn translate(&mut self, tx: f64, ty: f64) -> Result<()> {
        self.append(TransformOp::Translate { tx, ty })
    }

    pub fn translate_x(&mut self, tx: f64) -> Result<()> {
        self.translate(tx, 0.0)
    }

    pub fn translate_y(&mut self, ty: f64) -> Result<()> {
        self.translate(0.0, ty)
    }

    /// Scale the content about the image center.
    ///
    /// # Errors
    ///
    /// `EngineError::InvalidParameter` unless `factor` is finite and > 0.
    pub fn squeeze(&mut self, factor: f64) -> Result<()> {
        self.append(TransformOp::Scale { factor })
    }

    /// Drop every transform; `data` becomes the original at the current
    /// samplerate.
    pub fn reset(&mut self) {
        if self.history.is_empty() {
            return;
        }
        // The base image at this samplerate was renderable when it was set
        if let Ok(data) = render_base(&self.original, self.samplerate, &self.config) {
            self.history.clear();
            self.data = data;
            log::debug!("reset transform history");
        }
    }

    /// Change the supersampling factor and replay the history at the new
    /// density.
    ///
    /// # Errors
    ///
    /// `EngineError::InvalidParameter` unless `factor` is one of
    /// 1, 2, 4, 8, 16 or 32.
    pub fn supersample(&mut self, factor: u32) -> Result<()> {
        let rate = Samplerate::try_from(factor).inspect_err(|e| log::warn!("{e}"))?;
        let data = render(&self.original, &self.history, rate, &self.config)?;
        self.samplerate = rate;
        self.data = data;
        log::debug!(
            "supersample {} -> {}x{}",
            rate,
            self.data.width,
            self.data.height
        );
        Ok(())
    }

    /// Write the transform history to `path`.
    pub fn save_transforms(&self, path: impl AsRef<Path>) -> Result<()> {
        self.history.save(path, self.samplerate)
    }

    /// Replace the history with the one stored at `path` and replay it.
    ///
    /// The samplerate is left as it is. Returns the samplerate recorded in
    /// the file so callers can follow it.
    pub fn load_transforms(&mut self, path: impl AsRef<Path>) -> Result<Samplerate> {
        let (history, recorded) = TransformHistory::load(path)?;
        self.replace_history(history, recorded)
    }

    /// The history as the JSON document `save_transforms` writes.
    pub fn transforms_json(&self) -> Result<String> {
        self.history.to_json(self.samplerate)
    }

    /// Same as `load_transforms`, from a JSON string.
    pub fn load_transforms_json(&mut self, text: &str) -> Result<Samplerate> {
        let (history, recorded) = TransformHistory::from_json(text)?;
        self.replace_history(history, recorded)
    }

    /// Write the current `data` as a raster image.
    pub fn save_image(&self, path: impl AsRef<Path>) -> Result<()> {
        save_grid(&self.data, path)
    }

    /// The current `data` as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.data)
    }

    /// `|self.data - other.data|`, leaving both engines untouched.
    pub fn difference(&self, other: &TransformEngine) -> Result<PixelGrid> {
        difference(&self.data, &other.data)
    }

    fn replace_history(
        &mut self,
        history: TransformHistory,
        recorded: Samplerate,
    ) -> Result<Samplerate> {
        let data = render(&self.original, &history, self.samplerate, &self.config)?;
        if recorded != self.samplerate {
            log::debug!(
                "transform file was saved at {}, replaying at {}",
                recorded,
                self.samplerate
            );
        }
        self.history = history;
        self.data = data;
        log::debug!("replaced history with {} transform(s)", self.history.len());
        Ok(recorded)
    }

    fn append(&mut self, op: TransformOp) -> Result<()> {
        op.validate().inspect_err(|e| log::warn!("rejected {}: {e}", op.kind()))?;

        let mut history = self.history.clone();
        history.push(op.to_native(self.samplerate.get()));
        let data = render(&self.original, &history, self.samplerate, &self.config)?;

        self.history = history;
        self.data = data;
        log::debug!("applied {:?} ({} in history)", op, self.history.len());
        Ok(())
    }
}

/// Dimensions of `original` at `samplerate`, refusing sizes that overflow.
fn scaled_dimensions(original: &PixelGrid, samplerate: Samplerate) -> Result<(u32, u32)> {
    let k = samplerate.get();
    let too_large = || {
        EngineError::InvalidParameter(format!(
            "{}x{} image is too large to supersample at {}",
            original.width, original.height, samplerate
        ))
    };

    let width = original.width.checked_mul(k).ok_or_else(too_large)?;
    let height = original.height.checked_mul(k).ok_or_else(too_large)?;
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(original.channels as usize))
        .ok_or_else(too_large)?;
    Ok((width, height))
}

/// Replay `history` over `original` at `samplerate`.
fn render(
    original: &PixelGrid,
    history: &TransformHistory,
    samplerate: Samplerate,
    config: &EngineConfig,
) -> Result<PixelGrid> {
    if history.is_empty() {
        return render_base(original, samplerate, config);
    }

    let (width, height) = scaled_dimensions(original, samplerate)?;
    // Invert in native units so the answer does not depend on the samplerate
    let native_inverse = history
        .compose(original.width, original.height)
        .invert()
        .ok_or_else(|| {
            EngineError::InvalidParameter("accumulated transform is degenerate".to_string())
        })?;
    let inverse = supersample_inverse(samplerate.get()).then(&native_inverse);

    Ok(warp(
        original,
        width,
        height,
        &inverse,
        config.filter,
        config.background,
    ))
}

/// The untransformed original at `samplerate`.
fn render_base(
    original: &PixelGrid,
    samplerate: Samplerate,
    config: &EngineConfig,
) -> Result<PixelGrid> {
    if samplerate == Samplerate::NATIVE {
        return Ok(original.clone());
    }

    let (width, height) = scaled_dimensions(original, samplerate)?;
    let inverse = supersample_inverse(samplerate.get());

    Ok(warp(
        original,
        width,
        height,
        &inverse,
        config.filter,
        config.background,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Grid with a distinct value at every pixel.
    fn gradient(width: u32, height: u32) -> PixelGrid {
        let n = (width * height) as f32;
        let data = (0..width * height).map(|i| i as f32 / n).collect();
        PixelGrid::new(width, height, 1, data)
    }

    fn max_abs_diff(a: &PixelGrid, b: &PixelGrid) -> f32 {
        assert!(a.same_shape(b));
        a.data
            .iter()
            .zip(&b.data)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f32::max)
    }

    /// Largest difference over pixels at least `margin` away from the border.
    fn interior_max_diff(a: &PixelGrid, b: &PixelGrid, margin: u32) -> f32 {
        let mut max = 0.0f32;
        for y in margin..a.height - margin {
            for x in margin..a.width - margin {
                for (p, q) in a.pixel(x, y).iter().zip(b.pixel(x, y)) {
                    max = max.max((p - q).abs());
                }
            }
        }
        max
    }

    #[test]
    fn test_new_engine_matches_original() {
        let engine = TransformEngine::from_grid(gradient(10, 8), 1).unwrap();
        assert_eq!(engine.data(), engine.original());
        assert!(engine.history().is_empty());
        assert_eq!(engine.samplerate(), Samplerate::NATIVE);
        assert!(engine.source().is_none());
    }

    #[test]
    fn test_initial_samplerate_scales_data() {
        let engine = TransformEngine::from_grid(gradient(10, 8), 4).unwrap();
        assert_eq!(engine.dimensions(), (40, 32));
        assert_eq!(engine.original().dimensions(), (10, 8));
    }

    #[test]
    fn test_invalid_initial_samplerate() {
        let result = TransformEngine::from_grid(gradient(4, 4), 3);
        assert!(matches!(result, Err(EngineError::InvalidParameter(_))));
    }

    #[test]
    fn test_empty_grid_rejected() {
        let result = TransformEngine::from_grid(PixelGrid::new(0, 0, 1, vec![]), 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let result = TransformEngine::from_file("/no/such/image.png", 1);
        assert!(matches!(result, Err(EngineError::Load { .. })));
    }

    #[test]
    fn test_zero_rotation_is_recorded() {
        let mut engine = TransformEngine::from_grid(gradient(6, 6), 1).unwrap();
        engine.rotate(0.0).unwrap();
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.data(), engine.original());
    }

    #[test]
    fn test_rotate_90_matches_quarter_turn() {
        let original = gradient(7, 7);
        let mut engine = TransformEngine::from_grid(original.clone(), 1).unwrap();
        engine.rotate(90.0).unwrap();

        for y in 0..7 {
            for x in 0..7 {
                assert_eq!(engine.data().pixel(y, 6 - x), original.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_translate_fills_background() {
        let mut engine = TransformEngine::from_grid(PixelGrid::filled(5, 5, 1, 1.0), 1).unwrap();
        engine.translate(2.0, 0.0).unwrap();

        for y in 0..5 {
            assert_eq!(engine.data().pixel(0, y), &[0.0]);
            assert_eq!(engine.data().pixel(1, y), &[0.0]);
            assert_eq!(engine.data().pixel(2, y), &[1.0]);
        }
    }

    #[test]
    fn test_translate_single_axis() {
        let mut a = TransformEngine::from_grid(gradient(8, 8), 1).unwrap();
        let mut b = a.clone();
        a.translate_y(3.0).unwrap();
        b.translate(0.0, 3.0).unwrap();
        assert_eq!(a.data(), b.data());
        assert_eq!(a.history(), b.history());
    }

    #[test]
    fn test_translation_recorded_in_native_units() {
        let mut engine = TransformEngine::from_grid(gradient(8, 8), 4).unwrap();
        engine.translate(8.0, -4.0).unwrap();
        assert_eq!(
            engine.history().as_slice(),
            &[TransformOp::Translate { tx: 2.0, ty: -1.0 }]
        );
    }

    #[test]
    fn test_squeeze_rejects_non_positive() {
        let mut engine = TransformEngine::from_grid(gradient(8, 8), 1).unwrap();
        engine.rotate(10.0).unwrap();
        let before = engine.clone();

        for factor in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                engine.squeeze(factor),
                Err(EngineError::InvalidParameter(_))
            ));
        }
        assert_eq!(engine.data(), before.data());
        assert_eq!(engine.history(), before.history());
    }

    #[test]
    fn test_squeeze_shrinks_about_center() {
        let mut engine = TransformEngine::from_grid(PixelGrid::filled(9, 9, 1, 1.0), 1).unwrap();
        engine.squeeze(0.5).unwrap();
        // Shrunk content leaves the corners empty but keeps the center
        assert_eq!(engine.data().pixel(0, 0), &[0.0]);
        assert_eq!(engine.data().pixel(4, 4), &[1.0]);
    }

    #[test]
    fn test_supersample_rejects_unsupported() {
        let mut engine = TransformEngine::from_grid(gradient(8, 8), 2).unwrap();
        engine.translate(1.0, 0.0).unwrap();
        let before = engine.clone();

        assert!(matches!(
            engine.supersample(3),
            Err(EngineError::InvalidParameter(_))
        ));
        assert_eq!(engine.samplerate(), before.samplerate());
        assert_eq!(engine.data(), before.data());
        assert_eq!(engine.history(), before.history());
    }

    #[test]
    fn test_tiny_squeeze_accepted_at_native_rate() {
        let mut engine = TransformEngine::from_grid(gradient(8, 8), 1).unwrap();
        engine.squeeze(1e-8).unwrap();
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_heavy_squeeze_survives_samplerate_changes() {
        let mut engine = TransformEngine::from_grid(gradient(4, 4), 32).unwrap();
        engine.squeeze(3e-9).unwrap();

        engine.supersample(1).unwrap();
        assert_eq!(engine.dimensions(), (4, 4));
        engine.supersample(32).unwrap();
        assert_eq!(engine.dimensions(), (128, 128));
    }

    #[test]
    fn test_degenerate_accumulation_rejected() {
        let mut engine = TransformEngine::from_grid(gradient(4, 4), 2).unwrap();
        engine.squeeze(1e-100).unwrap();
        let before = engine.clone();

        assert!(matches!(
            engine.squeeze(1e-100),
            Err(EngineError::InvalidParameter(_))
        ));
        assert_eq!(engine.history(), before.history());
        assert_eq!(engine.data(), before.data());
    }

    #[test]
    fn test_load_tiny_scale_file() {
        let json = r#"{"format":"realign-transforms","version":1,"samplerate":1,
            "transforms":[{"kind":"scale","factor":1e-9}]}"#;
        let mut engine = TransformEngine::from_grid(gradient(6, 6), 1).unwrap();
        engine.load_transforms_json(json).unwrap();
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_supersample_round_trip_dimensions() {
        let mut engine = TransformEngine::from_grid(gradient(12, 9), 1).unwrap();
        engine.rotate(5.0).unwrap();
        let native = engine.data().clone();

        engine.supersample(8).unwrap();
        assert_eq!(engine.dimensions(), (96, 72));

        engine.supersample(1).unwrap();
        assert_eq!(engine.dimensions(), (12, 9));
        assert!(max_abs_diff(engine.data(), &native) < 1e-6);
    }

    #[test]
    fn test_supersampled_translation_matches_native() {
        // 2 pixels at 2x is 1 native pixel
        let mut dense = TransformEngine::from_grid(gradient(10, 10), 2).unwrap();
        dense.translate(2.0, 0.0).unwrap();
        dense.supersample(1).unwrap();

        let mut native = TransformEngine::from_grid(gradient(10, 10), 1).unwrap();
        native.translate(1.0, 0.0).unwrap();

        assert!(max_abs_diff(dense.data(), native.data()) < 1e-6);
    }

    #[test]
    fn test_reset_restores_original() {
        let mut engine = TransformEngine::from_grid(gradient(10, 10), 1).unwrap();
        engine.rotate(33.0).unwrap();
        engine.translate(1.5, -2.0).unwrap();
        engine.squeeze(1.1).unwrap();

        engine.reset();
        assert!(engine.history().is_empty());
        assert_eq!(engine.data(), engine.original());

        engine.reset();
        assert_eq!(engine.data(), engine.original());
    }

    #[test]
    fn test_reset_keeps_samplerate() {
        let mut engine = TransformEngine::from_grid(gradient(4, 4), 2).unwrap();
        let base = engine.data().clone();
        engine.rotate(12.0).unwrap();
        engine.reset();
        assert_eq!(engine.samplerate().get(), 2);
        assert_eq!(engine.data(), &base);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut a = TransformEngine::from_grid(gradient(16, 12), 2).unwrap();
        a.rotate(17.0).unwrap();
        a.translate(3.25, -1.5).unwrap();
        a.squeeze(0.9).unwrap();

        let first = a.data().clone();
        a.set_config(*a.config()).unwrap();
        assert_eq!(a.data(), &first);
    }

    #[test]
    fn test_translate_additivity() {
        let mut split = TransformEngine::from_grid(gradient(20, 20), 1).unwrap();
        split.translate(1.25, 0.0).unwrap();
        split.translate(2.5, 0.0).unwrap();

        let mut joined = TransformEngine::from_grid(gradient(20, 20), 1).unwrap();
        joined.translate(3.75, 0.0).unwrap();

        assert!(interior_max_diff(split.data(), joined.data(), 5) < 1e-6);
    }

    #[test]
    fn test_transforms_json_round_trip() {
        let mut engine = TransformEngine::from_grid(gradient(10, 10), 1).unwrap();
        engine.rotate(-7.5).unwrap();
        engine.translate(2.0, 1.0).unwrap();
        let json = engine.transforms_json().unwrap();

        let mut fresh = TransformEngine::from_grid(gradient(10, 10), 1).unwrap();
        fresh.load_transforms_json(&json).unwrap();
        assert_eq!(fresh.history(), engine.history());
        assert_eq!(fresh.data(), engine.data());
    }

    #[test]
    fn test_load_transforms_keeps_samplerate() {
        let mut source = TransformEngine::from_grid(gradient(8, 8), 4).unwrap();
        source.rotate(45.0).unwrap();
        let json = source.transforms_json().unwrap();

        let mut target = TransformEngine::from_grid(gradient(8, 8), 1).unwrap();
        let recorded = target.load_transforms_json(&json).unwrap();
        assert_eq!(recorded.get(), 4);
        assert_eq!(target.samplerate(), Samplerate::NATIVE);
        assert_eq!(target.dimensions(), (8, 8));
    }

    #[test]
    fn test_load_bad_json_leaves_state() {
        let mut engine = TransformEngine::from_grid(gradient(8, 8), 1).unwrap();
        engine.translate(1.0, 1.0).unwrap();
        let before = engine.clone();

        assert!(matches!(
            engine.load_transforms_json("{ broken"),
            Err(EngineError::Parse(_))
        ));
        assert_eq!(engine.history(), before.history());
        assert_eq!(engine.data(), before.data());
    }

    #[test]
    fn test_set_config_changes_background() {
        let mut engine = TransformEngine::from_grid(PixelGrid::filled(6, 6, 1, 0.5), 1).unwrap();
        engine.translate(3.0, 0.0).unwrap();
        engine
            .set_config(EngineConfig {
                background: 1.0,
                ..EngineConfig::default()
            })
            .unwrap();
        assert_eq!(engine.data().pixel(0, 0), &[1.0]);
    }

    #[test]
    fn test_with_config_nearest() {
        let engine = TransformEngine::from_grid(gradient(4, 4), 2)
            .unwrap()
            .with_config(EngineConfig {
                filter: InterpolationFilter::Nearest,
                ..EngineConfig::default()
            })
            .unwrap();
        // Nearest supersampling replicates each native pixel k x k times
        assert_eq!(engine.data().pixel(0, 0), engine.data().pixel(1, 1));
        assert_eq!(engine.data().pixel(2, 0), engine.original().pixel(1, 0));
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"filter":"lanczos3"}"#).unwrap();
        assert_eq!(config.filter, InterpolationFilter::Lanczos3);
        assert_eq!(config.background, 0.0);
    }
}
