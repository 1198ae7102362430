//! Supersampling factor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Factors accepted by `supersample`.
pub const SUPPORTED_SAMPLERATES: [u32; 6] = [1, 2, 4, 8, 16, 32];

/// An integer supersampling factor applied to both axes.
///
/// Only the powers of two in [`SUPPORTED_SAMPLERATES`] can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Samplerate(u32);

impl Samplerate {
    pub const NATIVE: Samplerate = Samplerate(1);

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Samplerate {
    fn default() -> Self {
        Self::NATIVE
    }
}

impl TryFrom<u32> for Samplerate {
    type Error = EngineError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if SUPPORTED_SAMPLERATES.contains(&value) {
            Ok(Samplerate(value))
        } else {
            Err(EngineError::InvalidParameter(format!(
                "supersample factor must be one of {:?}, got {}",
                SUPPORTED_SAMPLERATES, value
            )))
        }
    }
}

impl From<Samplerate> for u32 {
    fn from(rate: Samplerate) -> Self {
        rate.0
    }
}

impl fmt::Display for Samplerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}
