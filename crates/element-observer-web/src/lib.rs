//! Element Observer for the browser
//!
//! Binds `element-observer` to the live DOM:
//! - [`DomGeometry`] measures elements and the window
//! - [`WindowViewport`] publishes scroll/resize snapshots to a hub
//! - [`ElementObserverHandle`] is the class JS code constructs

pub mod dom;
pub mod handle;

pub use dom::{read_viewport_state, DomGeometry, ThrownSlot, WindowViewport};
pub use handle::{refresh_viewport, ElementObserverHandle};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    tracing::info!("element-observer-web loaded");
}
