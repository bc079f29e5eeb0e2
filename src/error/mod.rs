use crate::config::ConfigPathError;
use crate::intelligence::IntelligenceError;
use crate::raster::RasterError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Intelligence(#[from] IntelligenceError),
    #[error(transparent)]
    ConfigPath(#[from] ConfigPathError),
    #[error("selection is too small or still being dragged")]
    NothingToExtract,
}
