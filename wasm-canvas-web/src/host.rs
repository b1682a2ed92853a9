//! The page-side `Module` object read by the companion script
//!
//! The companion script bootstraps from a global `Module` object, so only one
//! configuration can be published at a time. Each [`BrowserHost`] is one
//! session; installing a new session notifies the one it replaces.
use std::cell::{Cell, RefCell};

use gloo::events::EventListener;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_canvas_core::{HostEvent, HostEvents, HostRuntime, LoadError, RuntimeConfig};
use web_sys::{HtmlCanvasElement, HtmlScriptElement};

use crate::js_message;

const MODULE_GLOBAL: &str = "Module";

thread_local! {
    static NEXT_SESSION: Cell<u64> = Cell::new(1);
    /// Session whose configuration currently sits in `window.Module`
    static ACTIVE: RefCell<Option<(u64, HostEvents<JsInstantiation>)>> = RefCell::new(None);
}

/// Arguments of the runtime's `instantiateWasm` hook
pub struct JsInstantiation {
    imports: js_sys::Object,
    on_success: js_sys::Function,
}

struct Installation {
    module: js_sys::Object,
    script: Option<HtmlScriptElement>,
    print: Closure<dyn FnMut(JsValue)>,
    print_err: Closure<dyn FnMut(JsValue)>,
    initialized: Closure<dyn FnMut()>,
    instantiate: Closure<dyn FnMut(JsValue, js_sys::Function) -> JsValue>,
    _resize: Option<EventListener>,
}

pub struct BrowserHost {
    session: u64,
    canvas: HtmlCanvasElement,
    installed: RefCell<Option<Installation>>,
}

impl BrowserHost {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        let session = NEXT_SESSION.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Self {
            session,
            canvas,
            installed: RefCell::new(None),
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    fn claim_slot(&self, events: HostEvents<JsInstantiation>) {
        let previous = ACTIVE.with(|active| active.borrow_mut().replace((self.session, events)));
        if let Some((previous, sink)) = previous {
            if previous != self.session {
                log::warn!(
                    "load session {} replaces the runtime configuration of session {previous}",
                    self.session
                );
                sink.emit(HostEvent::Superseded);
            }
        }
    }

    /// Give up the global slot if this session still holds it
    fn release_slot(&self) -> bool {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            match active.as_ref() {
                Some((owner, _)) if *owner == self.session => {
                    active.take();
                    true
                }
                _ => false,
            }
        })
    }
}

impl HostRuntime for BrowserHost {
    type Instantiation = JsInstantiation;

    fn install(
        &self,
        config: &RuntimeConfig,
        events: HostEvents<JsInstantiation>,
    ) -> Result<(), LoadError> {
        self.uninstall();
        let window = web_sys::window().ok_or_else(|| host_error("no window"))?;

        let print = {
            let events = events.clone();
            Closure::wrap(Box::new(move |text: JsValue| {
                events.emit(HostEvent::Print(js_text(&text)));
            }) as Box<dyn FnMut(JsValue)>)
        };
        let print_err = {
            let events = events.clone();
            Closure::wrap(Box::new(move |text: JsValue| {
                events.emit(HostEvent::PrintErr(js_text(&text)));
            }) as Box<dyn FnMut(JsValue)>)
        };
        let initialized = {
            let events = events.clone();
            Closure::wrap(Box::new(move || {
                events.emit(HostEvent::RuntimeInitialized);
            }) as Box<dyn FnMut()>)
        };
        let instantiate = {
            let events = events.clone();
            Closure::wrap(Box::new(move |imports: JsValue, on_success: js_sys::Function| {
                events.emit(HostEvent::InstantiateRequested(JsInstantiation {
                    imports: imports.unchecked_into(),
                    on_success,
                }));
                // Empty exports: instantiation finishes asynchronously through on_success
                JsValue::from(js_sys::Object::new())
            }) as Box<dyn FnMut(JsValue, js_sys::Function) -> JsValue>)
        };

        let arguments: js_sys::Array = config
            .arguments
            .iter()
            .map(|argument| JsValue::from_str(argument))
            .collect();

        let module = js_sys::Object::new();
        set(&module, "doNotCaptureKeyboard", &JsValue::from_bool(!config.capture_keyboard))?;
        set(&module, "arguments", &arguments)?;
        set(&module, "print", print.as_ref())?;
        set(&module, "printErr", print_err.as_ref())?;
        set(&module, "canvas", &self.canvas)?;
        set(&module, "onRuntimeInitialized", initialized.as_ref())?;
        set(&module, "instantiateWasm", instantiate.as_ref())?;
        set(&window, MODULE_GLOBAL, &module)?;

        let resize = config.track_resize.then(|| {
            let events = events.clone();
            EventListener::new(&window, "resize", move |_| {
                events.emit(HostEvent::Resize);
            })
        });

        self.claim_slot(events);
        *self.installed.borrow_mut() = Some(Installation {
            module,
            script: None,
            print,
            print_err,
            initialized,
            instantiate,
            _resize: resize,
        });
        log::debug!("session {} installed runtime configuration", self.session);
        Ok(())
    }

    fn inject_script(&self, source: &str) -> Result<(), LoadError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| host_error("no document"))?;
        let body = document.body().ok_or_else(|| host_error("document has no body"))?;

        let script: HtmlScriptElement = document
            .create_element("script")
            .map_err(|err| host_error(js_message(&err)))?
            .dyn_into()
            .map_err(|_| host_error("created element is not a script"))?;
        script
            .set_text(source)
            .map_err(|err| host_error(js_message(&err)))?;

        // Appending runs the script, which may call back into the session right away
        body.append_child(&script)
            .map_err(|err| host_error(js_message(&err)))?;

        if let Some(installation) = self.installed.borrow_mut().as_mut() {
            installation.script = Some(script);
        }
        Ok(())
    }

    async fn instantiate(
        &self,
        binary: &[u8],
        request: JsInstantiation,
    ) -> Result<(), LoadError> {
        let promise = js_sys::WebAssembly::instantiate_buffer(binary, &request.imports);
        let output = JsFuture::from(promise)
            .await
            .map_err(|err| LoadError::Instantiation(js_message(&err)))?;
        let instance = js_sys::Reflect::get(&output, &JsValue::from_str("instance"))
            .map_err(|err| LoadError::Instantiation(js_message(&err)))?;

        request
            .on_success
            .call1(&JsValue::NULL, &instance)
            .map_err(|err| LoadError::Instantiation(js_message(&err)))?;
        Ok(())
    }

    fn uninstall(&self) {
        let Some(installation) = self.installed.borrow_mut().take() else {
            return;
        };

        if self.release_slot() {
            if let Some(window) = web_sys::window() {
                let ours: &JsValue = &installation.module;
                let current = js_sys::Reflect::get(&window, &JsValue::from_str(MODULE_GLOBAL));
                if matches!(current, Ok(value) if value == *ours) {
                    let _ = js_sys::Reflect::delete_property(&window, &JsValue::from_str(MODULE_GLOBAL));
                }
            }
        }
        if let Some(script) = installation.script {
            script.remove();
        }

        // A booted runtime keeps calling these; their sink is closed so the calls are no-ops
        installation.print.forget();
        installation.print_err.forget();
        installation.initialized.forget();
        installation.instantiate.forget();
        log::debug!("session {} withdrew runtime configuration", self.session);
    }
}

impl Drop for BrowserHost {
    fn drop(&mut self) {
        self.uninstall();
    }
}

fn set(target: &JsValue, key: &str, value: &JsValue) -> Result<(), LoadError> {
    js_sys::Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|err| host_error(format!("setting {key}: {}", js_message(&err))))
}

fn js_text(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn host_error(message: impl Into<String>) -> LoadError {
    LoadError::Host(message.into())
}
