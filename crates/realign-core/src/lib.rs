//! Realign Core - Image realignment library
//!
//! This crate provides the core functionality for aligning a target image
//! against a reference: decoding, a replayable transform history, supersampled
//! resampling, difference images and a two-slot alignment session.

pub mod decode;
pub mod difference;
pub mod encode;
pub mod engine;
pub mod error;
pub mod history;
pub mod samplerate;
pub mod session;
pub mod transform;

pub use decode::PixelGrid;
pub use difference::{difference, DifferenceStats};
pub use engine::{EngineConfig, TransformEngine};
pub use error::{EngineError, Result};
pub use history::TransformHistory;
pub use samplerate::Samplerate;
pub use session::{AlignmentSession, Control, ControlInputs, Slot, Views};
pub use transform::{InterpolationFilter, TransformOp};
