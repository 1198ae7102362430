//! Realign WASM - WebAssembly bindings for the realignment engine
//!
//! This crate exposes the realign-core transform engine to JavaScript so a
//! browser front end can drive the same replayable history as native code.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data
//! - `engine` - Transform engine bindings (rotate, translate, squeeze, files)
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsTransformEngine, difference_image } from '@realign/wasm';
//!
//! await init();
//!
//! const a = new JsTransformEngine(new Uint8Array(await refFile.arrayBuffer()), 1);
//! const b = new JsTransformEngine(new Uint8Array(await targetFile.arrayBuffer()), 1);
//! b.rotate(0.5);
//! const diff = difference_image(a, b);
//! ```

use wasm_bindgen::prelude::*;

mod engine;
mod types;

pub use engine::{difference_image, JsTransformEngine};
pub use types::JsImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) finds the logger already installed
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Supersampling factors accepted by `JsTransformEngine::supersample`.
#[wasm_bindgen]
pub fn supported_samplerates() -> Vec<u32> {
    realign_core::samplerate::SUPPORTED_SAMPLERATES.to_vec()
}

pub(crate) fn js_error(err: realign_core::EngineError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}
