//! Scripted in-memory layout
//!
//! `StaticLayout` is a [`GeometryProvider`] whose window size and element
//! rects are set by hand. It stands in for the DOM in tests and in headless
//! hosts that compute layout themselves.
//!
//! Clones share the same layout, so a test can keep one handle and give
//! another to an observer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{ObserverError, ObserverResult};
use crate::geometry::{GeometryProvider, Rect, WindowSize};

/// Handle to an element in a [`StaticLayout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

#[derive(Debug)]
struct Slot {
    rect: Rect,
    attached: bool,
}

#[derive(Debug)]
struct LayoutInner {
    window: Cell<WindowSize>,
    slots: RefCell<Vec<Slot>>,
    failing: Cell<bool>,
}

/// In-memory geometry provider
#[derive(Debug, Clone)]
pub struct StaticLayout {
    inner: Rc<LayoutInner>,
}

impl StaticLayout {
    pub fn new(window: WindowSize) -> Self {
        Self {
            inner: Rc::new(LayoutInner {
                window: Cell::new(window),
                slots: RefCell::new(Vec::new()),
                failing: Cell::new(false),
            }),
        }
    }

    /// Add an attached element with the given rect
    pub fn add(&self, rect: Rect) -> ElementId {
        let mut slots = self.inner.slots.borrow_mut();
        slots.push(Slot {
            rect,
            attached: true,
        });
        ElementId(slots.len() - 1)
    }

    /// Move or resize an element
    pub fn set_rect(&self, id: ElementId, rect: Rect) {
        if let Some(slot) = self.inner.slots.borrow_mut().get_mut(id.0) {
            slot.rect = rect;
        }
    }

    /// Shift an element by (dx, dy), as scrolling its ancestor would
    pub fn scroll_by(&self, id: ElementId, dx: f64, dy: f64) {
        if let Some(slot) = self.inner.slots.borrow_mut().get_mut(id.0) {
            slot.rect = slot.rect.translate(-dx, -dy);
        }
    }

    /// Remove an element from the document; it keeps its last rect
    pub fn detach(&self, id: ElementId) {
        if let Some(slot) = self.inner.slots.borrow_mut().get_mut(id.0) {
            slot.attached = false;
        }
    }

    /// Put a detached element back into the document
    pub fn attach(&self, id: ElementId) {
        if let Some(slot) = self.inner.slots.borrow_mut().get_mut(id.0) {
            slot.attached = true;
        }
    }

    pub fn set_window_size(&self, window: WindowSize) {
        self.inner.window.set(window);
    }

    /// Make every measurement fail, to exercise error paths
    pub fn fail_measurements(&self, failing: bool) {
        self.inner.failing.set(failing);
    }

    fn check_failing(&self) -> ObserverResult<()> {
        if self.inner.failing.get() {
            Err(ObserverError::geometry("layout is not measurable"))
        } else {
            Ok(())
        }
    }
}

impl GeometryProvider for StaticLayout {
    type Element = ElementId;

    fn window_size(&self) -> ObserverResult<WindowSize> {
        self.check_failing()?;
        Ok(self.inner.window.get())
    }

    fn bounding_rect(&self, element: &ElementId) -> ObserverResult<Rect> {
        self.check_failing()?;
        self.inner
            .slots
            .borrow()
            .get(element.0)
            .map(|slot| slot.rect)
            .ok_or_else(|| ObserverError::geometry(format!("unknown element {}", element.0)))
    }

    fn is_attached(&self, element: &ElementId) -> bool {
        self.inner
            .slots
            .borrow()
            .get(element.0)
            .is_some_and(|slot| slot.attached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_layout() {
        let layout = StaticLayout::new(WindowSize::new(100.0, 100.0));
        let other = layout.clone();
        let el = layout.add(Rect::new(0.0, 0.0, 10.0, 10.0));

        other.scroll_by(el, 0.0, 30.0);
        assert_eq!(layout.bounding_rect(&el).unwrap().top, -30.0);

        other.detach(el);
        assert!(!layout.is_attached(&el));
        other.attach(el);
        assert!(layout.is_attached(&el));
    }

    #[test]
    fn test_unknown_element() {
        let layout = StaticLayout::new(WindowSize::default());
        let err = layout.bounding_rect(&ElementId(7)).unwrap_err();
        assert!(err.to_string().contains("unknown element 7"));
        assert!(!layout.is_attached(&ElementId(7)));
    }
}
