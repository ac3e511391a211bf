//! Rectangle geometry and the viewport intersection test
//!
//! All coordinates are client (viewport-relative) CSS pixels, the same space
//! `getBoundingClientRect` reports in: `top`/`left` grow towards the bottom
//! right of the window.
//!
//! The test is split in two layers:
//! - [`Bounds::intersects`] is pure arithmetic over four half-planes
//! - [`is_in_viewport`] measures through a [`GeometryProvider`] and picks
//!   the bounds for the given [`Container`]

use serde::{Deserialize, Serialize};

use crate::error::ObserverResult;

// =============================================================================
// RECT
// =============================================================================

/// Axis-aligned bounding rectangle of an element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rect from its top-left corner and size
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            bottom: top + height,
            left,
            right: left + width,
            width,
            height,
        }
    }

    /// Create a rect from its four edges; width and height are derived
    pub fn from_edges(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
            width: right - left,
            height: bottom - top,
        }
    }

    /// A rect with zero width or zero height is never rendered
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    /// Same size, moved by (dx, dy)
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.top + dy, self.left + dx, self.width, self.height)
    }
}

/// Inner size of the window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f64,
    pub height: f64,
}

impl WindowSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

// =============================================================================
// BOUNDS
// =============================================================================

/// Edges an element is tested against
///
/// The naming follows the comparison, not the box: `top` is the edge the
/// element's top must be above (the container's bottom edge), `bottom` is the
/// edge the element's bottom must be below (the container's top edge), and
/// likewise for `left`/`right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Bounds {
    /// Bounds of the window itself
    pub fn window(size: WindowSize) -> Self {
        Self {
            top: size.height,
            bottom: 0.0,
            left: size.width,
            right: 0.0,
        }
    }

    /// Bounds of a scroll container, from its bounding rect
    pub fn container(rect: &Rect) -> Self {
        Self {
            top: rect.bottom,
            bottom: rect.top,
            left: rect.right,
            right: rect.left,
        }
    }

    /// Four strict half-plane checks, widened (positive) or narrowed
    /// (negative) by the offsets
    pub fn intersects(&self, rect: &Rect, offset_x: f64, offset_y: f64) -> bool {
        rect.top < self.top + offset_y
            && rect.bottom > self.bottom - offset_y
            && rect.left < self.left + offset_x
            && rect.right > self.right - offset_x
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

/// Where an element is expected to be visible
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Container<E> {
    /// The document root, i.e. the window
    #[default]
    Root,
    /// A scrollable element
    Element(E),
}

impl<E> Container<E> {
    pub fn is_root(&self) -> bool {
        matches!(self, Container::Root)
    }
}

/// Source of window and element measurements
///
/// Abstracts the rendering environment so the observer can run against a
/// real DOM or a scripted layout in tests.
pub trait GeometryProvider {
    /// Handle to an element; cheap to clone
    type Element: Clone;

    /// Current inner size of the window
    fn window_size(&self) -> ObserverResult<WindowSize>;

    /// Client bounding rect of an element
    fn bounding_rect(&self, element: &Self::Element) -> ObserverResult<Rect>;

    /// Whether the element is still attached to the document
    fn is_attached(&self, element: &Self::Element) -> bool;
}

/// Decide whether `element` is visible within `container`, within tolerance
///
/// With an element container, an element that does not overlap the window
/// at all is rejected before the container is measured. The window check
/// uses strict inequalities, so an element flush with a window edge counts
/// as outside.
pub fn is_in_viewport<G: GeometryProvider>(
    geometry: &G,
    element: &G::Element,
    offset_x: f64,
    offset_y: f64,
    container: &Container<G::Element>,
) -> ObserverResult<bool> {
    let rect = geometry.bounding_rect(element)?;
    if rect.is_degenerate() {
        return Ok(false);
    }

    let window = Bounds::window(geometry.window_size()?);
    let bounds = match container {
        Container::Root => window,
        Container::Element(scroll_el) => {
            if !window.intersects(&rect, 0.0, 0.0) {
                return Ok(false);
            }
            Bounds::container(&geometry.bounding_rect(scroll_el)?)
        }
    };

    Ok(bounds.intersects(&rect, offset_x, offset_y))
}
