use crate::geometry::{DisplayRect, Point};

pub const MIN_SELECTION_SIZE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPhase {
    #[default]
    Idle,
    Dragging,
}

/// Rubber-band selection in image-display space.
///
/// At most one rectangle exists. It grows while `Dragging` and stays frozen in
/// `Idle` until a new drag starts or it is cleared.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    phase: SelectionPhase,
    anchor: Option<Point>,
    rect: Option<DisplayRect>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == SelectionPhase::Dragging
    }

    pub fn selection(&self) -> Option<DisplayRect> {
        self.rect
    }

    pub fn begin(&mut self, anchor: Point) {
        tracing::debug!(x = anchor.x, y = anchor.y, "selection drag started");
        self.phase = SelectionPhase::Dragging;
        self.anchor = Some(anchor);
        self.rect = Some(DisplayRect::at_point(anchor));
    }

    /// Grows the rectangle towards `current`. Returns `false` outside a drag.
    pub fn update(&mut self, current: Point) -> bool {
        let (SelectionPhase::Dragging, Some(anchor)) = (self.phase, self.anchor) else {
            return false;
        };
        self.rect = Some(DisplayRect::from_corners(anchor, current));
        true
    }

    /// Ends the drag and keeps the rectangle. Returns whether a drag was active.
    pub fn freeze(&mut self) -> bool {
        if self.phase != SelectionPhase::Dragging {
            return false;
        }
        self.phase = SelectionPhase::Idle;
        self.anchor = None;
        tracing::debug!(rect = ?self.rect, "selection frozen");
        true
    }

    pub fn clear(&mut self) {
        self.phase = SelectionPhase::Idle;
        self.anchor = None;
        self.rect = None;
    }

    /// The frozen rectangle if both sides reach `min_size`.
    pub fn confirmable(&self, min_size: f64) -> Option<DisplayRect> {
        if self.is_dragging() {
            return None;
        }
        self.rect.filter(|rect| rect.w >= min_size && rect.h >= min_size)
    }
}
