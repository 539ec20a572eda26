//! Pointer and container primitives plus the drag geometry used by every region.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPoint {
    pub x: f64,
    pub y: f64,
}

impl PointerPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box of a container in the same coordinate space as pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerBox {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// Pointer offset from a container's top-left corner, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorPosition {
    pub top: f64,
    pub left: f64,
}

impl AnchorPosition {
    /// Converts the pixel offset into `(top_pct, left_pct)` of `container`.
    pub fn to_percent(self, container: ContainerBox) -> (f64, f64) {
        if !container.has_area() {
            return (0.0, 0.0);
        }
        (
            self.top / container.height * 100.0,
            self.left / container.width * 100.0,
        )
    }
}

/// Region placement in percent of the owning container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionGeometry {
    pub top_pct: f64,
    pub left_pct: f64,
    pub width_pct: f64,
    pub height_pct: f64,
}

impl RegionGeometry {
    pub const fn at(top_pct: f64, left_pct: f64) -> Self {
        Self {
            top_pct,
            left_pct,
            width_pct: 0.0,
            height_pct: 0.0,
        }
    }

    pub fn fits_container(&self) -> bool {
        let in_range = |value: f64| (0.0..=100.0).contains(&value);
        in_range(self.top_pct)
            && in_range(self.left_pct)
            && in_range(self.width_pct)
            && in_range(self.height_pct)
            && self.left_pct + self.width_pct <= 100.0
            && self.top_pct + self.height_pct <= 100.0
    }

    pub fn to_css(&self) -> String {
        format!(
            "position: absolute; top: {}%; left: {}%; width: {}%; height: {}%;",
            self.top_pct, self.left_pct, self.width_pct, self.height_pct
        )
    }
}

pub fn compute_anchor_position(container: ContainerBox, pointer: PointerPoint) -> AnchorPosition {
    let max_left = container.width.max(0.0);
    let max_top = container.height.max(0.0);
    AnchorPosition {
        top: finite_or_zero(pointer.y - container.top).clamp(0.0, max_top),
        left: finite_or_zero(pointer.x - container.left).clamp(0.0, max_left),
    }
}

/// Computes the region geometry for a pointer at `current` during a gesture
/// that started at `anchor`.
///
/// The anchor is the fixed corner. A negative delta grows the region towards
/// the top/left edge and moves its origin, clamped at 0; a non-negative delta
/// keeps the origin. Size on each axis is limited to the room left between
/// the (possibly moved) origin and the far edge of the container.
pub fn compute_drag_geometry(
    container: ContainerBox,
    initial_top_pct: f64,
    initial_left_pct: f64,
    anchor: PointerPoint,
    current: PointerPoint,
) -> RegionGeometry {
    let initial_top_pct = finite_or_zero(initial_top_pct).clamp(0.0, 100.0);
    let initial_left_pct = finite_or_zero(initial_left_pct).clamp(0.0, 100.0);
    if !container.has_area() {
        return RegionGeometry::at(initial_top_pct, initial_left_pct);
    }

    let delta_x = finite_or_zero(current.x - anchor.x);
    let delta_y = finite_or_zero(current.y - anchor.y);
    let (left_pct, width_pct) = resolve_axis(container.width, initial_left_pct, delta_x);
    let (top_pct, height_pct) = resolve_axis(container.height, initial_top_pct, delta_y);

    RegionGeometry {
        top_pct,
        left_pct,
        width_pct,
        height_pct,
    }
}

fn resolve_axis(extent: f64, initial_pct: f64, delta: f64) -> (f64, f64) {
    let initial_px = initial_pct / 100.0 * extent;
    let origin_pct = if delta < 0.0 {
        ((initial_px + delta) / extent * 100.0).max(0.0)
    } else {
        initial_pct
    };
    let origin_px = origin_pct / 100.0 * extent;
    let room = (extent - origin_px).max(0.0);
    let size_pct = (delta.abs().min(room) / extent * 100.0)
        .min(100.0 - origin_pct)
        .max(0.0);
    (origin_pct, size_pct)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
