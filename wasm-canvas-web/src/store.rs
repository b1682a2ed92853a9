//! JavaScript handle to the shared canvas store
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_canvas_core::{
    Action, CanvasConfig, CanvasRect, CanvasVisibility, Dispatch, LoadState, Store,
    SubscriptionId,
};

use crate::js_message;

/// Store shared between a [`WasmCanvas`](crate::WasmCanvas) and the page.
///
/// Getters act as selectors over the current state. The dispatch helpers are
/// meant for whatever measures the canvas geometry.
#[wasm_bindgen]
#[derive(Debug, Clone, Default)]
pub struct CanvasStore {
    inner: Rc<Store>,
}

#[wasm_bindgen]
impl CanvasStore {
    #[wasm_bindgen(constructor)]
    pub fn new() -> CanvasStore {
        CanvasStore::default()
    }

    /// Store seeded with the initial geometry of a component configuration
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config_json: &str) -> Result<CanvasStore, JsValue> {
        let config =
            CanvasConfig::from_json(config_json).map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(CanvasStore {
            inner: Rc::new(Store::with_state(config.initial_state())),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn loading(&self) -> bool {
        self.state().loading
    }

    #[wasm_bindgen(getter)]
    pub fn initialized(&self) -> bool {
        self.state().initialized
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.state().running
    }

    #[wasm_bindgen(getter, js_name = consoleOutput)]
    pub fn console_output(&self) -> js_sys::Array {
        self.state()
            .console_output
            .iter()
            .map(|line| JsValue::from_str(line))
            .collect()
    }

    #[wasm_bindgen(getter, js_name = consoleOutputDirty)]
    pub fn console_output_dirty(&self) -> bool {
        self.state().console_output_dirty
    }

    #[wasm_bindgen(getter, js_name = canvasWidth)]
    pub fn canvas_width(&self) -> f64 {
        self.state().canvas_width
    }

    #[wasm_bindgen(getter, js_name = canvasHeight)]
    pub fn canvas_height(&self) -> f64 {
        self.state().canvas_height
    }

    #[wasm_bindgen(getter, js_name = canvasTop)]
    pub fn canvas_top(&self) -> f64 {
        self.state().canvas_top
    }

    #[wasm_bindgen(getter, js_name = canvasLeft)]
    pub fn canvas_left(&self) -> f64 {
        self.state().canvas_left
    }

    #[wasm_bindgen(getter, js_name = canvasVisible)]
    pub fn canvas_visible(&self) -> bool {
        self.state().canvas_visible.is_visible()
    }

    #[wasm_bindgen(getter)]
    pub fn resize(&self) -> bool {
        self.state().resize
    }

    /// Call `callback` after every state change; returns an id for `unsubscribe`
    pub fn subscribe(&self, callback: js_sys::Function) -> Result<u32, JsValue> {
        let id = self.inner.subscribe(move |_| {
            if let Err(err) = callback.call0(&JsValue::NULL) {
                log::warn!("store subscriber threw: {}", js_message(&err));
            }
        });
        u32::try_from(id).map_err(|_| {
            self.inner.unsubscribe(id);
            JsValue::from_str("store ran out of subscription ids")
        })
    }

    pub fn unsubscribe(&self, id: u32) -> bool {
        self.inner.unsubscribe(SubscriptionId::from_u64(u64::from(id)))
    }

    /// Ask for the canvas geometry to be measured again
    #[wasm_bindgen(js_name = notifyResize)]
    pub fn notify_resize(&self) {
        self.inner.dispatch(Action::ResizeCallback);
    }

    #[wasm_bindgen(js_name = setCanvasSize)]
    pub fn set_canvas_size(&self, top: f64, left: f64, width: f64, height: f64) {
        self.inner
            .dispatch(Action::SetCanvasSize(CanvasRect::new(top, left, width, height)));
    }

    #[wasm_bindgen(js_name = setVisible)]
    pub fn set_visible(&self, visible: bool) {
        self.inner
            .dispatch(Action::SetCanvasVisibility(CanvasVisibility::from_visible(visible)));
    }
}

impl CanvasStore {
    pub fn state(&self) -> Rc<LoadState> {
        self.inner.state()
    }

    pub(crate) fn shared(&self) -> Rc<Store> {
        Rc::clone(&self.inner)
    }
}
