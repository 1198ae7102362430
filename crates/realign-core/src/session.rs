//! Two-image alignment session.
//!
//! A session owns the reference engine (slot A) and the target engine
//! (slot B) and keeps them consistent: control actions move B only, scale
//! changes and resets apply to both, and loading a transform file into B
//! moves both onto the samplerate the file was saved at. The engines never refer to each other.
//!
//! # Example
//!
//! ```ignore
//! use realign_core::session::{AlignmentSession, Control, ControlInputs, Slot};
//!
//! let mut session = AlignmentSession::new();
//! session.load(Slot::A, "reference.png")?;
//! session.load(Slot::B, "target.png")?;
//! session.apply(Control::RotateLeft, ControlInputs { angle: 0.5, ..Default::default() })?;
//! let views = session.views();
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decode::PixelGrid;
use crate::difference::{difference, DifferenceStats};
use crate::engine::{EngineConfig, TransformEngine};
use crate::error::{EngineError, Result};
use crate::samplerate::Samplerate;

/// Which image of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// Reference image.
    A,
    /// Target image, the one the controls move.
    B,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

/// Control panel actions. All of them act on slot B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    RotateLeft,
    RotateRight,
    TranslateUp,
    TranslateLeft,
    TranslateRight,
    TranslateDown,
    ZoomIn,
    ZoomOut,
}

impl Control {
    pub const ALL: [Control; 8] = [
        Control::RotateLeft,
        Control::RotateRight,
        Control::TranslateUp,
        Control::TranslateLeft,
        Control::TranslateRight,
        Control::TranslateDown,
        Control::ZoomIn,
        Control::ZoomOut,
    ];
}

/// Step sizes read from the control panel at the moment of the action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlInputs {
    /// Translation step in pixels at the current samplerate.
    pub steps: f64,
    /// Rotation step in degrees.
    pub angle: f64,
    /// Zoom step; zoom in scales by `zoom`, zoom out by `1 / zoom`.
    pub zoom: f64,
}

impl Default for ControlInputs {
    fn default() -> Self {
        Self {
            steps: 1.0,
            angle: 0.5,
            zoom: 1.01,
        }
    }
}

/// Read-only snapshot of what the three views should display.
#[derive(Debug)]
pub struct Views<'a> {
    pub a: Option<&'a PixelGrid>,
    pub b: Option<&'a PixelGrid>,
    /// `|A - B|`, present when both images are loaded and share a shape.
    pub difference: Option<PixelGrid>,
}

/// Owner of the A/B engine pair.
#[derive(Debug, Default)]
pub struct AlignmentSession {
    a: Option<TransformEngine>,
    b: Option<TransformEngine>,
    samplerate: Samplerate,
    config: EngineConfig,
}

impl AlignmentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Samplerate new images are loaded at (the scale selector value).
    pub fn samplerate(&self) -> Samplerate {
        self.samplerate
    }

    pub fn engine(&self, slot: Slot) -> Option<&TransformEngine> {
        match slot {
            Slot::A => self.a.as_ref(),
            Slot::B => self.b.as_ref(),
        }
    }

    fn engine_mut(&mut self, slot: Slot) -> Result<&mut TransformEngine> {
        match slot {
            Slot::A => self.a.as_mut(),
            Slot::B => self.b.as_mut(),
        }
        .ok_or(EngineError::NotLoaded(slot))
    }

    fn loaded_mut(&mut self) -> impl Iterator<Item = &mut TransformEngine> {
        self.a.iter_mut().chain(self.b.iter_mut())
    }

    /// Load an image file into `slot`, replacing whatever was there.
    pub fn load(&mut self, slot: Slot, path: impl AsRef<Path>) -> Result<()> {
        let engine = TransformEngine::from_file(path, self.samplerate.get())?;
        self.install(slot, engine)
    }

    /// Load encoded image bytes into `slot`.
    pub fn load_bytes(&mut self, slot: Slot, bytes: &[u8]) -> Result<()> {
        let engine = TransformEngine::from_bytes(bytes, self.samplerate.get())?;
        self.install(slot, engine)
    }

    /// Put an already decoded grid into `slot`.
    pub fn load_grid(&mut self, slot: Slot, grid: PixelGrid) -> Result<()> {
        let engine = TransformEngine::from_grid(grid, self.samplerate.get())?;
        self.install(slot, engine)
    }

    fn install(&mut self, slot: Slot, engine: TransformEngine) -> Result<()> {
        let engine = if engine.config() == &self.config {
            engine
        } else {
            engine.with_config(self.config)?
        };
        log::debug!("slot {} now {}x{}", slot, engine.dimensions().0, engine.dimensions().1);
        match slot {
            Slot::A => self.a = Some(engine),
            Slot::B => self.b = Some(engine),
        }
        Ok(())
    }

    /// Route a control action to slot B.
    pub fn apply(&mut self, control: Control, inputs: ControlInputs) -> Result<()> {
        let b = self.engine_mut(Slot::B)?;
        match control {
            Control::RotateLeft => b.rotate(inputs.angle),
            Control::RotateRight => b.rotate(-inputs.angle),
            Control::TranslateUp => b.translate_y(-inputs.steps),
            Control::TranslateDown => b.translate_y(inputs.steps),
            Control::TranslateLeft => b.translate_x(-inputs.steps),
            Control::TranslateRight => b.translate_x(inputs.steps),
            Control::ZoomIn => b.squeeze(inputs.zoom),
            Control::ZoomOut => b.squeeze(1.0 / inputs.zoom),
        }
    }

    /// Change the scale selector: supersample every loaded image to `factor`.
    ///
    /// Either every loaded engine moves to the new samplerate or none does.
    pub fn set_samplerate(&mut self, factor: u32) -> Result<()> {
        let rate = Samplerate::try_from(factor)?;

        let mut a = self.a.clone();
        let mut b = self.b.clone();
        for engine in a.iter_mut().chain(b.iter_mut()) {
            engine.supersample(rate.get())?;
        }

        self.a = a;
        self.b = b;
        self.samplerate = rate;
        Ok(())
    }

    /// Reset both images to their originals.
    pub fn reset(&mut self) {
        for engine in self.loaded_mut() {
            engine.reset();
        }
    }

    /// Save B's transform history and, if `image_path` is given, B's image.
    pub fn save(&self, transforms_path: impl AsRef<Path>, image_path: Option<&Path>) -> Result<()> {
        let b = self.engine(Slot::B).ok_or(EngineError::NotLoaded(Slot::B))?;
        b.save_transforms(transforms_path)?;
        if let Some(path) = image_path {
            b.save_image(path)?;
        }
        Ok(())
    }

    /// Load a transform file into B and move both images to the samplerate
    /// recorded in the file.
    ///
    /// On failure neither image nor the session samplerate changes.
    pub fn load_transforms(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let mut b = self
            .engine(Slot::B)
            .cloned()
            .ok_or(EngineError::NotLoaded(Slot::B))?;
        let recorded = b.load_transforms(path)?;

        let mut a = self.a.clone();
        for engine in a.iter_mut().chain(std::iter::once(&mut b)) {
            if engine.samplerate() != recorded {
                engine.supersample(recorded.get())?;
            }
        }

        if recorded != self.samplerate {
            log::info!("scale follows transform file: {} -> {}", self.samplerate, recorded);
        }
        self.a = a;
        self.b = Some(b);
        self.samplerate = recorded;
        Ok(())
    }

    /// `|A - B|` for the current state.
    pub fn difference(&self) -> Result<PixelGrid> {
        let a = self.engine(Slot::A).ok_or(EngineError::NotLoaded(Slot::A))?;
        let b = self.engine(Slot::B).ok_or(EngineError::NotLoaded(Slot::B))?;
        difference(a.data(), b.data())
    }

    /// Numeric summary of `|A - B|`.
    pub fn difference_stats(&self) -> Result<DifferenceStats> {
        Ok(DifferenceStats::from_grid(&self.difference()?))
    }

    /// Everything the A, B and |A - B| views need.
    pub fn views(&self) -> Views<'_> {
        let difference = match self.difference() {
            Ok(diff) => Some(diff),
            Err(EngineError::DimensionMismatch { .. }) => {
                log::warn!("A and B differ in shape, no difference image");
                None
            }
            Err(_) => None,
        };
        Views {
            a: self.engine(Slot::A).map(TransformEngine::data),
            b: self.engine(Slot::B).map(TransformEngine::data),
            difference,
        }
    }
}
