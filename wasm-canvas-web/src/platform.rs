//! Capability probes against the running browser
use wasm_bindgen::{JsCast, JsValue};
use wasm_canvas_core::{GraphicsCapability, Platform};
use web_sys::HtmlCanvasElement;

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserPlatform;

impl Platform for BrowserPlatform {
    fn supports_webassembly(&self) -> bool {
        js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("WebAssembly"))
            .map(|value| value.is_object())
            .unwrap_or(false)
    }

    fn supports_graphics(&self, capability: GraphicsCapability) -> bool {
        // Probe on a detached canvas so the real surface keeps its context free
        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            return false;
        };
        let canvas = match document.create_element("canvas") {
            Ok(element) => match element.dyn_into::<HtmlCanvasElement>() {
                Ok(canvas) => canvas,
                Err(_) => return false,
            },
            Err(_) => return false,
        };

        let supported = matches!(canvas.get_context(capability.context_id()), Ok(Some(_)));
        if !supported {
            log::warn!("{capability} context could not be created");
        }
        supported
    }

    fn now_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}
