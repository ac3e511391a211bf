//! Element Observer
//!
//! Tracks whether an element is visible inside the window or a scrollable
//! container and fires enter/exit callbacks as that changes.
//!
//! ```text
//! scroll / resize ──► ViewportSource ──► ElementObserver::check
//!                                              │
//!                              GeometryProvider│(rects, window size)
//!                                              ▼
//!                                       is_in_viewport
//!                                              │
//!                                   on_enter / on_exit
//! ```
//!
//! This crate has no browser dependency. `element-observer-web` provides the
//! DOM-backed [`GeometryProvider`] and feeds a [`ViewportHub`] from window
//! events.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use element_observer::testing::StaticLayout;
//! use element_observer::{
//!     ElementObserver, ObserverOptions, Rect, ViewportHub, ViewportSource, ViewportState,
//!     WindowSize,
//! };
//!
//! let layout = StaticLayout::new(WindowSize::new(800.0, 600.0));
//! let hero = layout.add(Rect::new(900.0, 0.0, 800.0, 200.0));
//! let hub = Rc::new(ViewportHub::new(ViewportState::new(800.0, 600.0)));
//!
//! let source: Rc<dyn ViewportSource> = hub.clone();
//! let observer = ElementObserver::new(
//!     layout.clone(),
//!     hero,
//!     ObserverOptions::new().on_enter(|_, state| println!("in view at {}", state.scroll_y)),
//!     source,
//! )?;
//! assert!(!observer.is_entered());
//!
//! layout.scroll_by(hero, 0.0, 400.0);
//! hub.publish(ViewportState::new(800.0, 600.0).with_scroll(0.0, 400.0));
//! assert!(observer.is_entered());
//! # Ok::<(), element_observer::ObserverError>(())
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod observer;
pub mod source;
pub mod testing;

pub use config::{Callback, ObserverConfig, ObserverOptions, Offsets};
pub use error::{ObserverError, ObserverResult};
pub use geometry::{is_in_viewport, Bounds, Container, GeometryProvider, Rect, WindowSize};
pub use observer::{CheckOutcome, ElementObserver};
pub use source::{Listener, SubscriptionId, ViewportHub, ViewportSource, ViewportState};
