pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use error::{StateError, StateResult};
pub use event::{ViewEvent, ViewTransition};
pub use machine::ViewStateMachine;
pub use model::ViewMode;
