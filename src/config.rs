//! Observer options and serializable configuration
//!
//! [`ObserverOptions`] is what [`ElementObserver::new`](crate::ElementObserver::new)
//! takes: callbacks, the `once` flag, per-edge offsets and the container.
//! [`ObserverConfig`] is the data-only part of it, loadable from JSON using
//! the same keys the browser options object uses:
//!
//! ```json
//! { "once": true, "offsetYEnter": -50, "offsetYExit": 0 }
//! ```

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{ObserverError, ObserverResult};
use crate::geometry::Container;
use crate::source::ViewportState;

/// Enter/exit callback, invoked with the element and the snapshot that
/// caused the transition
///
/// An `Err` is returned from the check that ran the callback, and keeps a
/// `once` observer subscribed.
pub type Callback<E> = Rc<dyn Fn(&E, &ViewportState) -> ObserverResult<()>>;

// =============================================================================
// OFFSETS
// =============================================================================

/// Per-edge tolerances in pixels
///
/// Positive values widen the visible region, negative values shrink it.
/// Enter offsets apply while the element is outside, exit offsets while it
/// is inside.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Offsets {
    #[serde(rename = "offsetXEnter")]
    pub x_enter: f64,
    #[serde(rename = "offsetXExit")]
    pub x_exit: f64,
    #[serde(rename = "offsetYEnter")]
    pub y_enter: f64,
    #[serde(rename = "offsetYExit")]
    pub y_exit: f64,
}

impl Offsets {
    /// Same tolerance for entering and exiting
    pub fn uniform(x: f64, y: f64) -> Self {
        Self {
            x_enter: x,
            x_exit: x,
            y_enter: y,
            y_exit: y,
        }
    }

    /// (offset_x, offset_y) to test with, given whether the element is in
    pub fn for_state(&self, entered: bool) -> (f64, f64) {
        if entered {
            (self.x_exit, self.y_exit)
        } else {
            (self.x_enter, self.y_enter)
        }
    }

    /// Reject NaN offsets; infinities are allowed and mean the edge always
    /// (or never) passes
    pub fn validate(&self) -> ObserverResult<()> {
        let named = [
            ("offsetXEnter", self.x_enter),
            ("offsetXExit", self.x_exit),
            ("offsetYEnter", self.y_enter),
            ("offsetYExit", self.y_exit),
        ];
        for (name, value) in named {
            if value.is_nan() {
                return Err(ObserverError::InvalidOffset { name });
            }
        }
        Ok(())
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Data-only observer configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Tear down after the first enter or exit callback
    pub once: bool,

    #[serde(flatten)]
    pub offsets: Offsets,
}

impl ObserverConfig {
    /// Parse and validate a JSON config; missing keys take their defaults
    pub fn from_json(json: &str) -> ObserverResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.offsets.validate()?;
        Ok(config)
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Everything an observer is constructed with
///
/// Defaults: no callbacks, `once = false`, all offsets 0, container is the
/// document root.
pub struct ObserverOptions<E> {
    pub on_enter: Option<Callback<E>>,
    pub on_exit: Option<Callback<E>>,
    pub once: bool,
    pub offsets: Offsets,
    pub container: Container<E>,
}

impl<E> Default for ObserverOptions<E> {
    fn default() -> Self {
        Self {
            on_enter: None,
            on_exit: None,
            once: false,
            offsets: Offsets::default(),
            container: Container::Root,
        }
    }
}

impl<E> ObserverOptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_enter(self, callback: impl Fn(&E, &ViewportState) + 'static) -> Self {
        self.try_on_enter(move |element, state| {
            callback(element, state);
            Ok(())
        })
    }

    pub fn on_exit(self, callback: impl Fn(&E, &ViewportState) + 'static) -> Self {
        self.try_on_exit(move |element, state| {
            callback(element, state);
            Ok(())
        })
    }

    /// Enter callback that can fail
    pub fn try_on_enter(
        mut self,
        callback: impl Fn(&E, &ViewportState) -> ObserverResult<()> + 'static,
    ) -> Self {
        self.on_enter = Some(Rc::new(callback));
        self
    }

    /// Exit callback that can fail
    pub fn try_on_exit(
        mut self,
        callback: impl Fn(&E, &ViewportState) -> ObserverResult<()> + 'static,
    ) -> Self {
        self.on_exit = Some(Rc::new(callback));
        self
    }

    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub fn offsets(mut self, offsets: Offsets) -> Self {
        self.offsets = offsets;
        self
    }

    pub fn container(mut self, container: Container<E>) -> Self {
        self.container = container;
        self
    }

    /// Take `once` and offsets from a loaded config, keeping callbacks and
    /// container
    pub fn with_config(mut self, config: ObserverConfig) -> Self {
        self.once = config.once;
        self.offsets = config.offsets;
        self
    }

    /// The data-only part of these options
    pub fn config(&self) -> ObserverConfig {
        ObserverConfig {
            once: self.once,
            offsets: self.offsets,
        }
    }
}

impl<E> From<ObserverConfig> for ObserverOptions<E> {
    fn from(config: ObserverConfig) -> Self {
        Self::default().with_config(config)
    }
}

impl<E: fmt::Debug> fmt::Debug for ObserverOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverOptions")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("once", &self.once)
            .field("offsets", &self.offsets)
            .field("container", &self.container)
            .finish()
    }
}
