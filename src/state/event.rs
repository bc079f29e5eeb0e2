use super::model::ViewMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    ImageSelected,
    OpenUpload,
    OpenExtract,
    OpenGallery,
    CloseWorkspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewTransition {
    pub from: ViewMode,
    pub event: ViewEvent,
    pub to: ViewMode,
}

impl ViewTransition {
    pub const fn new(from: ViewMode, event: ViewEvent, to: ViewMode) -> Self {
        Self { from, event, to }
    }
}
