use super::error::{StateError, StateResult};
use super::{ViewEvent, ViewMode, ViewTransition};

#[derive(Debug)]
pub struct ViewStateMachine {
    mode: ViewMode,
    has_image: bool,
    transition_history: Vec<ViewTransition>,
}

impl ViewStateMachine {
    pub fn new() -> Self {
        Self {
            mode: ViewMode::default(),
            has_image: false,
            transition_history: Vec::new(),
        }
    }

    /// Machine for a restored session. Sessions that already hold products
    /// open on the gallery.
    pub fn resume(has_image: bool, product_count: usize) -> Self {
        let mode = if has_image && product_count > 0 {
            ViewMode::Gallery
        } else {
            ViewMode::Upload
        };
        tracing::debug!(?mode, has_image, product_count, "resume view state");
        Self {
            mode,
            has_image,
            transition_history: Vec::new(),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn has_image(&self) -> bool {
        self.has_image
    }

    pub fn history(&self) -> &[ViewTransition] {
        &self.transition_history
    }

    pub fn can_transition(&self, event: ViewEvent) -> bool {
        self.next_mode(event).is_some()
    }

    pub fn next_mode(&self, event: ViewEvent) -> Option<ViewMode> {
        use ViewEvent::*;
        match (self.mode, event) {
            (_, ImageSelected) => Some(ViewMode::Extract),
            (_, OpenUpload) => Some(ViewMode::Upload),
            (_, OpenExtract) if self.has_image => Some(ViewMode::Extract),
            (_, OpenGallery) if self.has_image => Some(ViewMode::Gallery),
            (ViewMode::Extract, CloseWorkspace) => Some(ViewMode::Upload),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: ViewEvent) -> StateResult<ViewMode> {
        tracing::debug!(from = ?self.mode, event = ?event, "request view transition");
        let next = self.next_mode(event).ok_or_else(|| {
            let from = self.mode;
            tracing::warn!(from = ?from, event = ?event, "invalid view transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        if event == ViewEvent::ImageSelected {
            self.has_image = true;
        }
        self.transition_history
            .push(ViewTransition::new(self.mode, event, next));
        self.mode = next;

        Ok(self.mode)
    }

    /// Forgets the loaded image and returns to the upload screen.
    pub fn reset(&mut self) {
        self.mode = ViewMode::Upload;
        self.has_image = false;
        self.transition_history.clear();
    }
}

impl Default for ViewStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ViewStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ViewMode::{:?}", self.mode)
    }
}
