/// Top-level screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Upload,
    Extract,
    Gallery,
}
