//! Enter/exit tracking for a single element
//!
//! An [`ElementObserver`] is a two-state machine (out / in) driven by
//! viewport snapshots. Every snapshot re-runs the intersection test with the
//! offsets for the current state: enter offsets while out, exit offsets while
//! in. A change of result flips the state and fires the matching callback.
//!
//! The observer subscribes to its [`ViewportSource`] on construction and
//! stays subscribed until it is torn down, which happens when:
//! - the element is found detached from the document
//! - `once` is set and an enter or exit callback has run without error
//! - [`ElementObserver::destroy`] is called
//!
//! While subscribed, the source keeps the observer alive; dropping every
//! handle does not stop tracking. After teardown the observer holds no
//! reference to the element, the container or the source.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::{Callback, ObserverOptions, Offsets};
use crate::error::ObserverResult;
use crate::geometry::{is_in_viewport, Container, GeometryProvider};
use crate::source::{Listener, SubscriptionId, ViewportSource, ViewportState};

/// Result of one [`ElementObserver::check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Visibility matches the current state; nothing fired
    Unchanged,
    /// Out → in; `on_enter` ran if registered
    Entered,
    /// In → out; `on_exit` ran if registered
    Exited,
    /// Element left the document; the observer tore itself down
    Detached,
    /// Observer was already torn down
    Inactive,
}

impl CheckOutcome {
    /// Whether the entered state flipped
    pub fn is_transition(&self) -> bool {
        matches!(self, CheckOutcome::Entered | CheckOutcome::Exited)
    }
}

/// References dropped at teardown
struct Tracked<E> {
    element: E,
    container: Container<E>,
    on_enter: Option<Callback<E>>,
    on_exit: Option<Callback<E>>,
}

struct Subscription {
    source: Weak<dyn ViewportSource>,
    id: SubscriptionId,
}

struct ObserverInner<G: GeometryProvider> {
    geometry: G,
    once: bool,
    offsets: Offsets,
    entered: Cell<bool>,
    tracked: RefCell<Option<Tracked<G::Element>>>,
    subscription: RefCell<Option<Subscription>>,
}

/// Tracks one element against its container
///
/// Cloning gives another handle to the same observer.
pub struct ElementObserver<G: GeometryProvider> {
    inner: Rc<ObserverInner<G>>,
}

impl<G: GeometryProvider> Clone for ElementObserver<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<G> ElementObserver<G>
where
    G: GeometryProvider + 'static,
    G::Element: 'static,
{
    /// Register `element` with `source` and evaluate it once if attached
    ///
    /// Fails on NaN offsets, or when the initial check fails (measurement or
    /// callback); in both cases nothing stays subscribed.
    pub fn new(
        geometry: G,
        element: G::Element,
        options: ObserverOptions<G::Element>,
        source: Rc<dyn ViewportSource>,
    ) -> ObserverResult<Self> {
        options.offsets.validate()?;

        let ObserverOptions {
            on_enter,
            on_exit,
            once,
            offsets,
            container,
        } = options;

        let inner = Rc::new(ObserverInner {
            geometry,
            once,
            offsets,
            entered: Cell::new(false),
            tracked: RefCell::new(Some(Tracked {
                element,
                container,
                on_enter,
                on_exit,
            })),
            subscription: RefCell::new(None),
        });

        let target = Rc::clone(&inner);
        let listener: Listener = Rc::new(move |state: &ViewportState| {
            if let Err(err) = target.check(state) {
                tracing::warn!(error = %err, "viewport check failed");
            }
        });
        let id = source.subscribe(listener);
        *inner.subscription.borrow_mut() = Some(Subscription {
            source: Rc::downgrade(&source),
            id,
        });

        let observer = Self { inner };
        if observer.inner.is_attached() {
            if let Err(err) = observer.inner.check(&source.state()) {
                observer.inner.teardown("initial check failed");
                return Err(err);
            }
        }
        Ok(observer)
    }

    /// Re-evaluate against `state`, firing at most one callback
    ///
    /// Normally driven by the source; callable directly to force a check.
    /// A measurement error leaves the state as it was. A callback error is
    /// returned after the state has flipped, and `once` does not tear down.
    pub fn check(&self, state: &ViewportState) -> ObserverResult<CheckOutcome> {
        self.inner.check(state)
    }

    /// Stop tracking now. Returns false if already torn down.
    pub fn destroy(&self) -> bool {
        self.inner.teardown("destroyed by caller")
    }
}

impl<G: GeometryProvider> ElementObserver<G> {
    /// Result of the most recent completed check
    pub fn is_entered(&self) -> bool {
        self.inner.entered.get()
    }

    /// Still subscribed and holding the element
    pub fn is_active(&self) -> bool {
        self.inner.tracked.borrow().is_some()
    }

    /// The tracked element, until teardown
    pub fn element(&self) -> Option<G::Element> {
        self.inner
            .tracked
            .borrow()
            .as_ref()
            .map(|tracked| tracked.element.clone())
    }

    /// Offsets the observer was built with
    pub fn offsets(&self) -> Offsets {
        self.inner.offsets
    }

    pub fn is_once(&self) -> bool {
        self.inner.once
    }

    pub fn geometry(&self) -> &G {
        &self.inner.geometry
    }
}

impl<G: GeometryProvider> fmt::Debug for ElementObserver<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementObserver")
            .field("entered", &self.is_entered())
            .field("active", &self.is_active())
            .field("once", &self.inner.once)
            .field("offsets", &self.inner.offsets)
            .finish()
    }
}

impl<G: GeometryProvider> ObserverInner<G> {
    fn is_attached(&self) -> bool {
        self.tracked
            .borrow()
            .as_ref()
            .is_some_and(|tracked| self.geometry.is_attached(&tracked.element))
    }

    fn check(&self, state: &ViewportState) -> ObserverResult<CheckOutcome> {
        // Measure under the borrow, run the callback after releasing it so
        // the callback may call back into this observer.
        let step = {
            let guard = self.tracked.borrow();
            let Some(tracked) = guard.as_ref() else {
                return Ok(CheckOutcome::Inactive);
            };

            if self.geometry.is_attached(&tracked.element) {
                let entered = self.entered.get();
                let (offset_x, offset_y) = self.offsets.for_state(entered);
                let visible = is_in_viewport(
                    &self.geometry,
                    &tracked.element,
                    offset_x,
                    offset_y,
                    &tracked.container,
                )?;
                tracing::trace!(entered, visible, offset_x, offset_y, "element checked");

                match (entered, visible) {
                    (false, true) => Some((
                        CheckOutcome::Entered,
                        tracked.element.clone(),
                        tracked.on_enter.clone(),
                    )),
                    (true, false) => Some((
                        CheckOutcome::Exited,
                        tracked.element.clone(),
                        tracked.on_exit.clone(),
                    )),
                    _ => return Ok(CheckOutcome::Unchanged),
                }
            } else {
                None
            }
        };

        let Some((outcome, element, callback)) = step else {
            self.teardown("element detached from document");
            return Ok(CheckOutcome::Detached);
        };

        self.entered.set(outcome == CheckOutcome::Entered);
        tracing::debug!(?outcome, scroll_y = state.scroll_y, "element visibility changed");

        if let Some(callback) = callback {
            callback(&element, state)?;
            if self.once {
                self.teardown("once callback fired");
            }
        }
        Ok(outcome)
    }

    fn teardown(&self, reason: &'static str) -> bool {
        let subscription = self.subscription.borrow_mut().take();
        let tracked = self.tracked.borrow_mut().take();

        if let Some(subscription) = subscription {
            if let Some(source) = subscription.source.upgrade() {
                source.unsubscribe(subscription.id);
            }
        }

        let was_active = tracked.is_some();
        if was_active {
            tracing::info!(reason, "element observer torn down");
        }
        was_active
    }
}
