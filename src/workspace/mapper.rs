//! Conversions between viewport pointer coordinates, image-display space and
//! the native pixel grid of the source image.

use crate::geometry::{BoundingBox, DisplayRect, Point, Size};

/// Geometry of the image element as the host reports it at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSnapshot {
    /// Post-transform on-screen box of the image element.
    pub bounds: BoundingBox,
    /// Untransformed CSS box the image is laid out at.
    pub css_size: Size,
    /// Pixel dimensions of the decoded source image.
    pub natural_width: u32,
    pub natural_height: u32,
}

impl LayoutSnapshot {
    pub fn native_ratio(&self) -> Option<NativeRatio> {
        NativeRatio::new(
            self.css_size.width,
            self.css_size.height,
            self.natural_width,
            self.natural_height,
        )
    }
}

/// Anything that can report the image element's current geometry.
pub trait LayoutSource {
    fn layout(&self) -> LayoutSnapshot;
}

/// Per-axis factor from CSS pixels to native pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeRatio {
    pub x: f64,
    pub y: f64,
}

impl NativeRatio {
    pub fn new(
        css_width: f64,
        css_height: f64,
        native_width: u32,
        native_height: u32,
    ) -> Option<Self> {
        let usable = |side: f64| side.is_finite() && side > 0.0;
        if !usable(css_width) || !usable(css_height) {
            return None;
        }
        Some(Self {
            x: f64::from(native_width) / css_width,
            y: f64::from(native_height) / css_height,
        })
    }

    pub fn rect_to_native(&self, rect: DisplayRect) -> DisplayRect {
        DisplayRect::new(
            rect.x * self.x,
            rect.y * self.y,
            rect.w * self.x,
            rect.h * self.y,
        )
    }

    /// Inverse of [`NativeRatio::rect_to_native`] for a single point.
    /// Returns `None` when the ratio has a zero axis (empty source image).
    pub fn point_to_display(&self, point: Point) -> Option<Point> {
        if self.x == 0.0 || self.y == 0.0 {
            return None;
        }
        Some(Point::new(point.x / self.x, point.y / self.y))
    }
}

/// Pointer position relative to the rendered image, with the zoom divided
/// out. Not clamped: positions outside the image map outside its extent.
pub fn to_image_display_space(pointer: Point, bounds: BoundingBox, scale: f64) -> Point {
    let scale = if scale > 0.0 { scale } else { 1.0 };
    Point::new(
        (pointer.x - bounds.left) / scale,
        (pointer.y - bounds.top) / scale,
    )
}

/// Inverse of [`to_image_display_space`].
pub fn to_pointer_space(point: Point, bounds: BoundingBox, scale: f64) -> Point {
    let scale = if scale > 0.0 { scale } else { 1.0 };
    Point::new(point.x * scale + bounds.left, point.y * scale + bounds.top)
}

/// Scales a display-space rectangle onto the native pixel grid. `None` when
/// the CSS box is empty, since no ratio can be derived from it.
pub fn to_native_space(
    rect: DisplayRect,
    css_width: f64,
    css_height: f64,
    native_width: u32,
    native_height: u32,
) -> Option<DisplayRect> {
    NativeRatio::new(css_width, css_height, native_width, native_height)
        .map(|ratio| ratio.rect_to_native(rect))
}
