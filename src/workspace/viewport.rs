use crate::geometry::Point;

pub const VIEWPORT_SCALE_MIN: f64 = 0.5;
pub const VIEWPORT_SCALE_MAX: f64 = 5.0;
pub const DEFAULT_WHEEL_ZOOM_STEP: f64 = 0.1;
pub const DEFAULT_BUTTON_ZOOM_STEP: f64 = 0.2;

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(VIEWPORT_SCALE_MIN, VIEWPORT_SCALE_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel convention: scrolling up (negative delta) zooms in.
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y < 0.0 {
            Self::In
        } else {
            Self::Out
        }
    }
}

/// Pan/zoom state of the workspace canvas.
///
/// Rendered as `translate(pan) scale(scale)` with the transform origin at the
/// image element's top-left corner, so a pan delta always moves the image by
/// the same number of display pixels whatever the zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    scale: f64,
    pan: Point,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportTransform {
    pub const fn new() -> Self {
        Self {
            scale: 1.0,
            pan: Point::new(0.0, 0.0),
        }
    }

    pub const fn scale(&self) -> f64 {
        self.scale
    }

    pub const fn pan(&self) -> Point {
        self.pan
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.pan.x == 0.0 && self.pan.y == 0.0
    }

    pub fn zoom(&mut self, direction: ZoomDirection, intensity: f64) {
        let step = intensity.abs();
        let next = match direction {
            ZoomDirection::In => self.scale + step,
            ZoomDirection::Out => self.scale - step,
        };
        self.scale = clamp_scale(next);
    }

    pub fn pan_by(&mut self, delta_x: f64, delta_y: f64) {
        if delta_x == 0.0 && delta_y == 0.0 {
            return;
        }
        self.pan.x += delta_x;
        self.pan.y += delta_y;
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.pan = Point::new(0.0, 0.0);
    }

    /// Maps an image-display point to its offset from the untransformed
    /// element origin.
    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            self.pan.x + point.x * self.scale,
            self.pan.y + point.y * self.scale,
        )
    }

    /// CSS-equivalent transform string for hosts that render through a style
    /// attribute; pair it with `transform-origin: 0 0`.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.pan.x, self.pan.y, self.scale
        )
    }
}
