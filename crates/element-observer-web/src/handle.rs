//! JS-facing observer class
//!
//! ```js
//! const observer = new ElementObserverHandle(el, {
//!   onEnter: (el, viewport) => el.classList.add("seen"),
//!   once: true,
//!   offsetYEnter: -100,
//! });
//! ```
//!
//! All observers created here share one `WindowViewport` per thread.
//!
//! `onEnter`/`onExit` are called as `callback(element, viewport)` with
//! `this` set to `null`; use the element argument, or close over the handle,
//! to reach either one. An exception thrown by a callback is logged and
//! raised again from whichever call ran it: the constructor, `check()`,
//! `refreshViewport()`, or the window's scroll/resize listener. A throwing
//! callback does not count as fired for `once`.

use std::cell::RefCell;
use std::rc::Rc;

use element_observer::{
    Callback, Container, ElementObserver, ObserverConfig, ObserverError, ObserverOptions,
    ObserverResult, ViewportState,
};
use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

use crate::dom::{DomGeometry, ThrownSlot, WindowViewport};

thread_local! {
    static VIEWPORT: RefCell<Option<Rc<WindowViewport>>> = const { RefCell::new(None) };
}

fn to_js(err: ObserverError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn shared_viewport() -> Result<Rc<WindowViewport>, JsValue> {
    VIEWPORT.with(|slot| {
        if let Some(viewport) = slot.borrow().as_ref() {
            return Ok(Rc::clone(viewport));
        }
        let viewport = Rc::new(WindowViewport::attach().map_err(to_js)?);
        *slot.borrow_mut() = Some(Rc::clone(&viewport));
        Ok(viewport)
    })
}

// =============================================================================
// OPTIONS
// =============================================================================

fn option(options: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(JsValue::UNDEFINED);
    }
    Reflect::get(options, &JsValue::from_str(key))
}

fn is_absent(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

fn number_option(options: &JsValue, key: &str) -> Result<f64, JsValue> {
    let value = option(options, key)?;
    if is_absent(&value) {
        return Ok(0.0);
    }
    value
        .as_f64()
        .ok_or_else(|| js_sys::TypeError::new(&format!("option '{key}' must be a number")).into())
}

fn function_option(options: &JsValue, key: &str) -> Result<Option<Function>, JsValue> {
    let value = option(options, key)?;
    if is_absent(&value) {
        return Ok(None);
    }
    value
        .dyn_into::<Function>()
        .map(Some)
        .map_err(|_| js_sys::TypeError::new(&format!("option '{key}' must be a function")).into())
}

fn read_config(options: &JsValue) -> Result<ObserverConfig, JsValue> {
    let mut config = ObserverConfig {
        once: option(options, "once")?.is_truthy(),
        ..ObserverConfig::default()
    };
    config.offsets.x_enter = number_option(options, "offsetXEnter")?;
    config.offsets.x_exit = number_option(options, "offsetXExit")?;
    config.offsets.y_enter = number_option(options, "offsetYEnter")?;
    config.offsets.y_exit = number_option(options, "offsetYExit")?;
    config.offsets.validate().map_err(to_js)?;
    Ok(config)
}

/// `container` may be omitted, the document body, or any element
fn read_container(
    options: &JsValue,
    geometry: &DomGeometry,
) -> Result<Container<Element>, JsValue> {
    let value = option(options, "container")?;
    if is_absent(&value) {
        return Ok(Container::Root);
    }
    let element = value
        .dyn_into::<Element>()
        .map_err(|_| js_sys::TypeError::new("option 'container' must be an element"))?;
    if geometry.body().as_ref() == Some(&element) {
        Ok(Container::Root)
    } else {
        Ok(Container::Element(element))
    }
}

/// Prefer the exception a JS callback threw over the error it was mapped to
fn rethrow<T>(viewport: &WindowViewport, result: ObserverResult<T>) -> Result<T, JsValue> {
    if let Some(thrown) = viewport.take_thrown() {
        return Err(thrown);
    }
    result.map_err(to_js)
}

fn js_callback(function: Function, thrown: ThrownSlot) -> Callback<Element> {
    Rc::new(move |element: &Element, state: &ViewportState| {
        let state = serde_wasm_bindgen::to_value(state).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not convert viewport state");
            JsValue::UNDEFINED
        });
        let target: &JsValue = element.as_ref();
        function.call2(&JsValue::NULL, target, &state).map_err(|err| {
            tracing::error!(?err, "observer callback threw");
            let message = format!("{err:?}");
            thrown.borrow_mut().get_or_insert(err);
            ObserverError::callback(message)
        })?;
        Ok(())
    })
}

/// Re-read the window and re-check every observer, e.g. after a layout
/// change that fired no scroll or resize event
#[wasm_bindgen(js_name = refreshViewport)]
pub fn refresh_viewport() -> Result<(), JsValue> {
    let viewport = shared_viewport()?;
    viewport.take_thrown();
    let result = viewport.refresh();
    rethrow(&viewport, result).map(|_| ())
}

// =============================================================================
// HANDLE
// =============================================================================

/// Observer for one element, exported to JS
///
/// Callbacks receive `(element, viewport)` with `this === null`, not the
/// handle.
#[wasm_bindgen]
pub struct ElementObserverHandle {
    observer: ElementObserver<DomGeometry>,
    viewport: Rc<WindowViewport>,
}

#[wasm_bindgen]
impl ElementObserverHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(element: Element, options: JsValue) -> Result<ElementObserverHandle, JsValue> {
        let viewport = shared_viewport()?;
        let geometry = DomGeometry::new().map_err(to_js)?;

        let mut observer_options = ObserverOptions::from(read_config(&options)?)
            .container(read_container(&options, &geometry)?);
        if let Some(function) = function_option(&options, "onEnter")? {
            observer_options.on_enter = Some(js_callback(function, viewport.thrown_slot()));
        }
        if let Some(function) = function_option(&options, "onExit")? {
            observer_options.on_exit = Some(js_callback(function, viewport.thrown_slot()));
        }

        // A failed eager check has already unsubscribed the observer
        viewport.take_thrown();
        let result = ElementObserver::new(geometry, element, observer_options, viewport.source());
        let observer = rethrow(&viewport, result)?;

        Ok(Self { observer, viewport })
    }

    /// Re-evaluate against the current window state; returns `entered`
    pub fn check(&self) -> Result<bool, JsValue> {
        let state = self.viewport.current_state().map_err(to_js)?;
        self.viewport.take_thrown();
        let result = self.observer.check(&state);
        rethrow(&self.viewport, result)?;
        Ok(self.observer.is_entered())
    }

    /// Stop tracking; returns false if already stopped
    pub fn destroy(&self) -> bool {
        self.observer.destroy()
    }

    #[wasm_bindgen(getter)]
    pub fn entered(&self) -> bool {
        self.observer.is_entered()
    }

    #[wasm_bindgen(getter)]
    pub fn active(&self) -> bool {
        self.observer.is_active()
    }
}
