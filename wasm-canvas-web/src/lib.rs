/// WasmCanvas Web - browser binding for loading a compiled module into a canvas
///
/// Implements the host traits of `wasm-canvas-core` on top of `web-sys` and
/// exposes the [`WasmCanvas`] component and the shareable [`CanvasStore`] to
/// JavaScript.
///
/// ```javascript
/// import init, { CanvasStore, WasmCanvas } from './wasm_canvas_web.js';
///
/// await init();
/// const config = JSON.stringify({ moduleName: 'game', padding: '1px', graphics: 'webgl2' });
/// const store = CanvasStore.fromConfig(config);
/// const canvas = new WasmCanvas(config, store);
/// canvas.mount(document.getElementById('game'));
/// ```

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

mod component;
mod fetch;
mod host;
mod platform;
mod store;

pub use component::WasmCanvas;
pub use fetch::BrowserFetcher;
pub use host::{BrowserHost, JsInstantiation};
pub use platform::BrowserPlatform;
pub use store::CanvasStore;

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Setup panic hook for better error messages in browser console
    console_error_panic_hook::set_once();

    // A page may already have installed a logger through another module
    if console_log::init_with_level(log::Level::Info).is_ok() {
        log::debug!("wasm-canvas {} ready", env!("CARGO_PKG_VERSION"));
    }

    Ok(())
}

/// Best-effort text of a thrown JavaScript value
pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
