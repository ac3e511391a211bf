//! Viewport-state sources
//!
//! A source owns the latest [`ViewportState`] and pushes every new snapshot
//! to its subscribers. Observers depend only on the [`ViewportSource`]
//! capability set; [`ViewportHub`] is the in-process implementation that the
//! browser binding feeds from scroll and resize events.
//!
//! Everything here is single-threaded: listeners run synchronously inside
//! [`ViewportHub::publish`], in subscription order.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Snapshot of the viewport, passed through to enter/exit callbacks
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl ViewportState {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }
}

/// Identifies one subscription on a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Receives each published snapshot
pub type Listener = Rc<dyn Fn(&ViewportState)>;

/// What an observer needs from a viewport-state source
pub trait ViewportSource {
    /// Latest snapshot
    fn state(&self) -> ViewportState;

    /// Deliver every later snapshot to `listener` until unsubscribed
    fn subscribe(&self, listener: Listener) -> SubscriptionId;

    /// Stop delivering to `id`; unknown ids are ignored
    fn unsubscribe(&self, id: SubscriptionId);
}

// =============================================================================
// HUB
// =============================================================================

/// In-process viewport-state source
///
/// A listener removed while a snapshot is being dispatched does not receive
/// the rest of that dispatch. A listener added during a dispatch first hears
/// about the next one.
#[derive(Default)]
pub struct ViewportHub {
    state: Cell<ViewportState>,
    listeners: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
}

/// One subscription; `live` is cleared on unsubscribe so in-flight
/// dispatch snapshots can skip it
#[derive(Clone)]
struct Entry {
    id: SubscriptionId,
    live: Rc<Cell<bool>>,
    listener: Listener,
}

impl ViewportHub {
    pub fn new(initial: ViewportState) -> Self {
        Self {
            state: Cell::new(initial),
            ..Self::default()
        }
    }

    /// Store `state` and deliver it to every current listener
    pub fn publish(&self, state: ViewportState) {
        self.state.set(state);

        // Snapshot so listeners can (un)subscribe while we iterate
        let listeners: Vec<Entry> = self.listeners.borrow().clone();
        tracing::trace!(
            listeners = listeners.len(),
            scroll_y = state.scroll_y,
            "publishing viewport state"
        );

        for entry in listeners {
            if entry.live.get() {
                (entry.listener)(&state);
            }
        }
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.listeners.borrow().iter().any(|entry| entry.id == id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl ViewportSource for ViewportHub {
    fn state(&self) -> ViewportState {
        self.state.get()
    }

    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push(Entry {
            id,
            live: Rc::new(Cell::new(true)),
            listener,
        });
        tracing::debug!(%id, "viewport listener subscribed");
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(index) = listeners.iter().position(|entry| entry.id == id) {
            let entry = listeners.remove(index);
            entry.live.set(false);
            tracing::debug!(%id, "viewport listener unsubscribed");
        }
    }
}

impl fmt::Debug for ViewportHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportHub")
            .field("state", &self.state.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
