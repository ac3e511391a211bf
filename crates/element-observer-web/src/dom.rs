//! DOM-backed geometry and window viewport source
//!
//! `DomGeometry` measures real elements with `getBoundingClientRect` and the
//! window's inner size. `WindowViewport` listens for `scroll` and `resize`
//! on the window and publishes a fresh snapshot to its hub for each event.
//! Scroll listeners use the capture phase so scrolls inside containers are
//! seen too (scroll events do not bubble).
//!
//! Exceptions thrown by JS callbacks during a dispatch are parked in the
//! viewport's [`ThrownSlot`] and raised again once the hub has finished
//! publishing, so they reach the browser's error reporting.

use std::cell::RefCell;
use std::rc::Rc;

use element_observer::{
    GeometryProvider, ObserverError, ObserverResult, Rect, ViewportHub, ViewportSource,
    ViewportState, WindowSize,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomRect, Element, Event, Window};

const VIEWPORT_EVENTS: [&str; 2] = ["scroll", "resize"];

/// First exception thrown by a JS callback since the slot was last drained
pub type ThrownSlot = Rc<RefCell<Option<JsValue>>>;

pub(crate) fn js_error(context: &str, err: JsValue) -> ObserverError {
    ObserverError::geometry(format!("{context}: {err:?}"))
}

fn browser_window() -> ObserverResult<Window> {
    web_sys::window().ok_or_else(|| ObserverError::geometry("no global window"))
}

fn dimension(value: Result<JsValue, JsValue>, name: &str) -> ObserverResult<f64> {
    value
        .map_err(|err| js_error(name, err))?
        .as_f64()
        .ok_or_else(|| ObserverError::geometry(format!("{name} is not a number")))
}

fn rect_from_dom(rect: &DomRect) -> Rect {
    Rect {
        top: rect.top(),
        bottom: rect.bottom(),
        left: rect.left(),
        right: rect.right(),
        width: rect.width(),
        height: rect.height(),
    }
}

/// Read the current viewport snapshot from the window
pub fn read_viewport_state(window: &Window) -> ObserverResult<ViewportState> {
    let width = dimension(window.inner_width(), "innerWidth")?;
    let height = dimension(window.inner_height(), "innerHeight")?;
    let scroll_x = window.scroll_x().map_err(|err| js_error("scrollX", err))?;
    let scroll_y = window.scroll_y().map_err(|err| js_error("scrollY", err))?;
    Ok(ViewportState::new(width, height).with_scroll(scroll_x, scroll_y))
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Geometry provider over the live DOM
#[derive(Debug, Clone)]
pub struct DomGeometry {
    window: Window,
}

impl DomGeometry {
    /// Use the global window
    pub fn new() -> ObserverResult<Self> {
        Ok(Self::from_window(browser_window()?))
    }

    pub fn from_window(window: Window) -> Self {
        Self { window }
    }

    /// The document body, which stands for the window as a container
    pub fn body(&self) -> Option<Element> {
        self.window
            .document()
            .and_then(|document| document.body())
            .map(Element::from)
    }
}

impl GeometryProvider for DomGeometry {
    type Element = Element;

    fn window_size(&self) -> ObserverResult<WindowSize> {
        Ok(WindowSize::new(
            dimension(self.window.inner_width(), "innerWidth")?,
            dimension(self.window.inner_height(), "innerHeight")?,
        ))
    }

    fn bounding_rect(&self, element: &Element) -> ObserverResult<Rect> {
        Ok(rect_from_dom(&element.get_bounding_client_rect()))
    }

    fn is_attached(&self, element: &Element) -> bool {
        element.parent_node().is_some()
    }
}

// =============================================================================
// WINDOW VIEWPORT
// =============================================================================

/// Feeds a [`ViewportHub`] from window scroll and resize events
///
/// Listeners are removed when this is dropped.
pub struct WindowViewport {
    window: Window,
    hub: Rc<ViewportHub>,
    thrown: ThrownSlot,
    on_event: Closure<dyn Fn(Event)>,
}

impl WindowViewport {
    /// Register on the global window
    pub fn attach() -> ObserverResult<Self> {
        Self::attach_to(browser_window()?)
    }

    pub fn attach_to(window: Window) -> ObserverResult<Self> {
        let hub = Rc::new(ViewportHub::new(read_viewport_state(&window)?));
        let thrown: ThrownSlot = Rc::new(RefCell::new(None));

        let on_event = {
            let hub = Rc::downgrade(&hub);
            let thrown = Rc::clone(&thrown);
            let window = window.clone();
            Closure::<dyn Fn(Event)>::new(move |_event: Event| {
                let Some(hub) = hub.upgrade() else {
                    return;
                };
                thrown.borrow_mut().take();
                match read_viewport_state(&window) {
                    Ok(state) => hub.publish(state),
                    Err(err) => tracing::warn!(error = %err, "WindowViewport: skipped update"),
                }
                drop(hub);

                // No borrows are live here; throwing unwinds straight to JS
                let pending = thrown.borrow_mut().take();
                if let Some(err) = pending {
                    wasm_bindgen::throw_val(err);
                }
            })
        };

        for name in VIEWPORT_EVENTS {
            window
                .add_event_listener_with_callback_and_bool(
                    name,
                    on_event.as_ref().unchecked_ref(),
                    true,
                )
                .map_err(|err| js_error(name, err))?;
        }
        tracing::info!("WindowViewport: scroll/resize listeners registered on window");

        Ok(Self {
            window,
            hub,
            thrown,
            on_event,
        })
    }

    /// The hub as the capability set observers subscribe to
    pub fn source(&self) -> Rc<dyn ViewportSource> {
        self.hub.clone()
    }

    /// Read the window now without publishing
    pub fn current_state(&self) -> ObserverResult<ViewportState> {
        read_viewport_state(&self.window)
    }

    /// Read the window and publish, e.g. after a DOM mutation moved things
    pub fn refresh(&self) -> ObserverResult<ViewportState> {
        let state = self.current_state()?;
        self.hub.publish(state);
        Ok(state)
    }

    /// Where JS callbacks park the exception they threw
    pub fn thrown_slot(&self) -> ThrownSlot {
        Rc::clone(&self.thrown)
    }

    /// Drain the parked exception, if any
    pub fn take_thrown(&self) -> Option<JsValue> {
        self.thrown.borrow_mut().take()
    }
}

impl Drop for WindowViewport {
    fn drop(&mut self) {
        for name in VIEWPORT_EVENTS {
            let _ = self.window.remove_event_listener_with_callback_and_bool(
                name,
                self.on_event.as_ref().unchecked_ref(),
                true,
            );
        }
        tracing::debug!("WindowViewport: listeners removed");
    }
}
