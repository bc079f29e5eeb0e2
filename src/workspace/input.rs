//! Discrete gesture messages consumed by the workspace controller.

use super::viewport::ZoomDirection;
use super::ToolMode;
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Maps a DOM-style `MouseEvent.button` index.
    pub const fn from_index(index: u16) -> Self {
        match index {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// What the pointer landed on. Interactive controls such as the extract
/// button sit on top of the canvas and keep their own presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Canvas,
    Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Space,
    Other,
}

/// Normalizes a `KeyboardEvent.code`-style key name.
pub fn normalize_key(code: &str) -> KeyCode {
    match code {
        "Space" | "space" | " " => KeyCode::Space,
        _ => KeyCode::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkspaceEvent {
    Wheel {
        delta_y: f64,
    },
    PointerDown {
        position: Point,
        button: PointerButton,
        target: PointerTarget,
    },
    PointerMove {
        position: Point,
    },
    PointerUp {
        position: Point,
    },
    PointerLeave,
    KeyDown {
        key: KeyCode,
        repeat: bool,
    },
    KeyUp {
        key: KeyCode,
    },
    SetTool(ToolMode),
    ZoomButton(ZoomDirection),
    ResetZoom,
    ToggleFullscreen,
}

impl WorkspaceEvent {
    pub const fn primary_down(position: Point) -> Self {
        Self::PointerDown {
            position,
            button: PointerButton::Primary,
            target: PointerTarget::Canvas,
        }
    }

    pub const fn key_down(key: KeyCode) -> Self {
        Self::KeyDown { key, repeat: false }
    }
}
