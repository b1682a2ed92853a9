//! The canvas component: owns the surface, loads the module once per mount
use std::rc::{Rc, Weak};

use futures::future::{abortable, AbortHandle};
use gloo::events::{EventListener, EventListenerOptions};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use wasm_canvas_core::{
    fit_to_container, needs_measurement, CanvasConfig, CanvasStyle, Dispatch, LoadState, Loader,
    MountPhase, Store, SubscriptionId,
};
use web_sys::{Element, HtmlCanvasElement};

use crate::fetch::BrowserFetcher;
use crate::host::BrowserHost;
use crate::platform::BrowserPlatform;
use crate::store::CanvasStore;

const CANVAS_ID: &str = "WasmCanvas";

#[wasm_bindgen]
pub struct WasmCanvas {
    config: CanvasConfig,
    store: Rc<Store>,
    mounted: Option<Mounted>,
    phase: MountPhase,
}

/// Everything that lives between mount and unmount
struct Mounted {
    canvas: HtmlCanvasElement,
    subscription: SubscriptionId,
    load: AbortHandle,
    _context_menu: EventListener,
}

#[wasm_bindgen]
impl WasmCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, store: &CanvasStore) -> Result<WasmCanvas, JsValue> {
        let config =
            CanvasConfig::from_json(config_json).map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(WasmCanvas {
            config,
            store: store.shared(),
            mounted: None,
            phase: MountPhase::default(),
        })
    }

    /// Create the canvas inside `parent` and start loading the module
    pub fn mount(&mut self, parent: &Element) -> Result<(), JsValue> {
        self.phase
            .begin()
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        let document = parent
            .owner_document()
            .ok_or_else(|| JsValue::from_str("parent is not attached to a document"))?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")?
            .dyn_into()
            .map_err(|_| JsValue::from_str("created element is not a canvas"))?;
        canvas.set_id(CANVAS_ID);

        let context_menu = EventListener::new_with_options(
            &canvas,
            "contextmenu",
            EventListenerOptions::enable_prevent_default(),
            |event| event.prevent_default(),
        );
        parent.append_child(&canvas)?;

        let subscription = self.subscribe(&canvas, parent);
        if self.config.fit_container {
            measure_container(parent, &*self.store);
        }
        render(&canvas, &self.config, &self.store.state())?;

        let load = self.start_load(&canvas);
        self.mounted = Some(Mounted {
            canvas,
            subscription,
            load,
            _context_menu: context_menu,
        });
        Ok(())
    }

    /// Cancel loading, stop rendering and remove the canvas
    pub fn unmount(&mut self) {
        self.phase.end();
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        mounted.load.abort();
        self.store.unsubscribe(mounted.subscription);
        mounted.canvas.remove();
        log::debug!("{} unmounted", self.config.module_name);
    }

    #[wasm_bindgen(getter)]
    pub fn mounted(&self) -> bool {
        self.mounted.is_some()
    }
}

impl WasmCanvas {
    fn subscribe(&self, canvas: &HtmlCanvasElement, parent: &Element) -> SubscriptionId {
        let canvas = canvas.clone();
        let parent = parent.clone();
        let config = self.config.clone();
        let store: Weak<Store> = Rc::downgrade(&self.store);

        self.store.subscribe(move |state| {
            if let Err(err) = render(&canvas, &config, state) {
                log::warn!("failed to render canvas: {err:?}");
            }
            if needs_measurement(&config, state) {
                if let Some(store) = store.upgrade() {
                    measure_container(&parent, &*store);
                }
            }
        })
    }

    fn start_load(&self, canvas: &HtmlCanvasElement) -> AbortHandle {
        let host = BrowserHost::new(canvas.clone());
        let session = host.session();
        let loader = Loader::new(BrowserPlatform, BrowserFetcher, host);
        let request = self.config.load_request();
        let store = Rc::clone(&self.store);

        let (load, handle) = abortable(async move { loader.load(request, &store).await });
        spawn_local(async move {
            match load.await {
                Ok(Ok(())) => log::info!("load session {session} finished"),
                // Already logged and reported to the store
                Ok(Err(_)) => {}
                Err(_) => log::debug!("load session {session} cancelled"),
            }
        });
        handle
    }
}

impl Drop for WasmCanvas {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn render(canvas: &HtmlCanvasElement, config: &CanvasConfig, state: &LoadState) -> Result<(), JsValue> {
    let ratio = web_sys::window()
        .map(|window| window.device_pixel_ratio())
        .unwrap_or(1.0);
    let style = CanvasStyle::compute(state, config, ratio);

    // Resizing the drawing buffer clears it, so only touch it on change
    if canvas.width() != style.backing_width {
        canvas.set_width(style.backing_width);
    }
    if canvas.height() != style.backing_height {
        canvas.set_height(style.backing_height);
    }

    let css = canvas.style();
    for (property, value) in style.declarations() {
        css.set_property(property, value)?;
    }
    Ok(())
}

fn measure_container(container: &Element, dispatcher: &dyn Dispatch) {
    let rect = container.get_bounding_client_rect();
    for action in fit_to_container(rect.width(), rect.height()) {
        dispatcher.dispatch(action);
    }
}
