//! Transform history and its on-disk format.
//!
//! The history is stored as pretty-printed JSON so transform files diff
//! cleanly under version control:
//!
//! ```text
//! {
//!   "format": "realign-transforms",
//!   "version": 1,
//!   "samplerate": 2,
//!   "transforms": [
//!     { "kind": "rotate", "angle": 1.5 },
//!     { "kind": "translate", "tx": 3.0, "ty": -0.5 },
//!     { "kind": "scale", "factor": 1.02 }
//!   ]
//! }
//! ```
//!
//! Readers refuse newer versions, unknown kinds and unknown fields instead
//! of guessing at their meaning.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::samplerate::Samplerate;
use crate::transform::{Affine2, TransformOp};

/// Value of the `format` field.
pub const FORMAT_TAG: &str = "realign-transforms";

/// Newest file version this crate reads and the one it writes.
pub const FORMAT_VERSION: u32 = 1;

/// Ordered list of transform operations, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformHistory {
    ops: Vec<TransformOp>,
}

impl TransformHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: TransformOp) {
        self.ops.push(op);
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransformOp> {
        self.ops.iter()
    }

    pub fn as_slice(&self) -> &[TransformOp] {
        &self.ops
    }

    /// Fold every operation, in order, into one matrix for a native
    /// `width` x `height` image.
    pub fn compose(&self, width: u32, height: u32) -> Affine2 {
        self.ops.iter().fold(Affine2::identity(), |acc, op| {
            acc.then(&op.to_affine(width, height))
        })
    }

    /// Serialize to the versioned JSON document.
    pub fn to_json(&self, samplerate: Samplerate) -> Result<String> {
        let file = TransformFile {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            samplerate,
            transforms: self.ops.clone(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| EngineError::Parse(e.to_string()))
    }

    /// Parse a versioned JSON document.
    ///
    /// Returns the history together with the samplerate recorded when the
    /// file was written.
    pub fn from_json(text: &str) -> Result<(Self, Samplerate)> {
        // Check the header on its own so version errors are reported as such
        // rather than as a failure on some unknown record further down.
        let header: FileHeader =
            serde_json::from_str(text).map_err(|e| EngineError::Parse(e.to_string()))?;
        if header.format != FORMAT_TAG {
            return Err(EngineError::Parse(format!(
                "expected format \"{}\", found \"{}\"",
                FORMAT_TAG, header.format
            )));
        }
        if header.version == 0 || header.version > FORMAT_VERSION {
            return Err(EngineError::Parse(format!(
                "unsupported version {} (this build reads up to {})",
                header.version, FORMAT_VERSION
            )));
        }

        let file: TransformFile =
            serde_json::from_str(text).map_err(|e| EngineError::Parse(e.to_string()))?;

        for (index, op) in file.transforms.iter().enumerate() {
            op.validate()
                .map_err(|e| EngineError::Parse(format!("record {index}: {e}")))?;
        }

        let history = Self {
            ops: file.transforms,
        };
        // The linear part, and so invertibility, does not depend on the image size
        if history.compose(1, 1).invert().is_none() {
            return Err(EngineError::Parse(
                "accumulated transform is degenerate".to_string(),
            ));
        }

        Ok((history, file.samplerate))
    }

    /// Write the history to `path`.
    pub fn save(&self, path: impl AsRef<Path>, samplerate: Samplerate) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json(samplerate)?;
        std::fs::write(path, json + "\n").map_err(|e| EngineError::io(path, e))?;
        log::info!("saved {} transform(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a history from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, Samplerate)> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        let loaded = Self::from_json(&text)?;
        log::info!(
            "loaded {} transform(s) from {}",
            loaded.0.len(),
            path.display()
        );
        Ok(loaded)
    }
}

impl<'a> IntoIterator for &'a TransformHistory {
    type Item = &'a TransformOp;
    type IntoIter = std::slice::Iter<'a, TransformOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl FromIterator<TransformOp> for TransformHistory {
    fn from_iter<I: IntoIterator<Item = TransformOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

#[derive(Deserialize)]
struct FileHeader {
    format: String,
    version: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransformFile {
    format: String,
    version: u32,
    samplerate: Samplerate,
    transforms: Vec<TransformOp>,
}
