//! WASM bindings for the transform engine.
//!
//! Every mutating call replays the history from the original image, exactly
//! as the native engine does. Errors surface in JavaScript as `Error`
//! objects carrying the engine's message.

use crate::js_error;
use crate::types::{filter_from_u8, JsImage};
use realign_core::{EngineConfig, TransformEngine};
use wasm_bindgen::prelude::*;

/// One image with its transform history.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const engine = new JsTransformEngine(bytes, 2);
/// engine.rotate(1.5);
/// engine.translate(4, 0);
/// localStorage.setItem('b.transforms', engine.transforms_json());
/// ```
#[wasm_bindgen]
pub struct JsTransformEngine {
    inner: TransformEngine,
}

#[wasm_bindgen]
impl JsTransformEngine {
    /// Decode an encoded image (PNG, JPEG or TIFF) at `samplerate`.
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: &[u8], samplerate: u32) -> Result<JsTransformEngine, JsValue> {
        TransformEngine::from_bytes(bytes, samplerate)
            .map(|inner| Self { inner })
            .map_err(js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.dimensions().0
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.dimensions().1
    }

    #[wasm_bindgen(getter)]
    pub fn samplerate(&self) -> u32 {
        self.inner.samplerate().get()
    }

    /// Number of operations in the history.
    #[wasm_bindgen(getter)]
    pub fn history_length(&self) -> usize {
        self.inner.history().len()
    }

    /// Rotate about the center, positive = counter-clockwise.
    pub fn rotate(&mut self, angle_degrees: f64) -> Result<(), JsValue> {
        self.inner.rotate(angle_degrees).map_err(js_error)
    }

    /// Shift by `(tx, ty)` pixels at the current samplerate.
    pub fn translate(&mut self, tx: f64, ty: f64) -> Result<(), JsValue> {
        self.inner.translate(tx, ty).map_err(js_error)
    }

    pub fn squeeze(&mut self, factor: f64) -> Result<(), JsValue> {
        self.inner.squeeze(factor).map_err(js_error)
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn supersample(&mut self, factor: u32) -> Result<(), JsValue> {
        self.inner.supersample(factor).map_err(js_error)
    }

    /// Select the interpolation kernel: 0 = nearest, 1 = bilinear,
    /// 2 = lanczos3.
    pub fn set_filter(&mut self, filter: u8) -> Result<(), JsValue> {
        let config = EngineConfig {
            filter: filter_from_u8(filter),
            ..*self.inner.config()
        };
        self.inner.set_config(config).map_err(js_error)
    }

    /// The history as the versioned JSON transform document.
    pub fn transforms_json(&self) -> Result<String, JsValue> {
        self.inner.transforms_json().map_err(js_error)
    }

    /// Replace the history with one from a transform document.
    pub fn load_transforms_json(&mut self, text: &str) -> Result<(), JsValue> {
        self.inner
            .load_transforms_json(text)
            .map(|_| ())
            .map_err(js_error)
    }

    /// The history as a plain JS array of `{ kind, ... }` records.
    pub fn history(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.history()).map_err(|e| e.into())
    }

    /// The current image as an RGB display buffer.
    pub fn image(&self) -> JsImage {
        JsImage::from_grid(self.inner.data())
    }

    /// The current image as PNG bytes (16-bit).
    pub fn encode_png(&self) -> Result<Vec<u8>, JsValue> {
        self.inner.encode_png().map_err(js_error)
    }
}

/// `|a - b|` as a display image.
///
/// Fails when the two engines differ in dimensions or channel count, for
/// instance when they are at different samplerates.
#[wasm_bindgen]
pub fn difference_image(a: &JsTransformEngine, b: &JsTransformEngine) -> Result<JsImage, JsValue> {
    a.inner
        .difference(&b.inner)
        .map(|diff| JsImage::from_grid(&diff))
        .map_err(js_error)
}
