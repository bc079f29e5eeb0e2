pub mod config;
pub mod error;
pub mod geometry;
pub mod intelligence;
pub mod logging;
pub mod products;
pub mod raster;
pub mod session;
pub mod state;
pub mod storage;
pub mod workspace;

use std::path::PathBuf;

use image::RgbaImage;

use crate::geometry::{DisplayRect, Point, Size};
use crate::raster::{encode_png, ImageRenderHost};
use crate::storage::SessionStore;
use crate::workspace::{mapper, LayoutSource, WorkspaceEvent};

pub use error::{AppError, AppResult};
pub use session::LeafletSession;

/// One headless extraction: a decoded leaflet and a selection drawn in
/// image-display pixels.
#[derive(Debug, Clone)]
pub struct CropRequest {
    pub source: RgbaImage,
    pub selection: DisplayRect,
    /// Display size of the image; the native size when absent.
    pub css_size: Option<Size>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropOutcome {
    pub product_id: String,
    pub image_path: PathBuf,
}

/// Entrypoint used by the CLI binding: crops one product into the stored session.
pub fn run(request: CropRequest) -> AppResult<CropOutcome> {
    logging::init();
    let app_config = config::load_app_config();
    let store = SessionStore::with_root(app_config.resolve_data_dir()?);
    tracing::info!(root = %store.root().display(), "starting leafcrop");

    let mut session = LeafletSession::open(store, app_config.workspace_settings())?;
    extract_selection(&mut session, request)
}

fn extract_selection(
    session: &mut LeafletSession,
    request: CropRequest,
) -> AppResult<CropOutcome> {
    let CropRequest {
        source,
        selection,
        css_size,
    } = request;
    let css_size = css_size.unwrap_or_else(|| {
        Size::new(f64::from(source.width()), f64::from(source.height()))
    });
    let original_png = encode_png(&source)?;
    let host = ImageRenderHost::with_css_size(source, css_size);
    session.select_image(original_png)?;

    // The drag is replayed as pointer input, so display corners are mapped
    // back through the current on-screen box first.
    let bounds = host.layout().bounds;
    let scale = session.workspace().viewport().scale();
    let from = mapper::to_pointer_space(Point::new(selection.x, selection.y), bounds, scale);
    let to = mapper::to_pointer_space(
        Point::new(selection.x + selection.w, selection.y + selection.h),
        bounds,
        scale,
    );
    session.dispatch(WorkspaceEvent::primary_down(from), &host);
    session.dispatch(WorkspaceEvent::PointerMove { position: to }, &host);
    session.dispatch(WorkspaceEvent::PointerUp { position: to }, &host);

    let product_id = session
        .extract(&host)?
        .ok_or(AppError::NothingToExtract)?;
    session.save()?;

    let image_path = session.store().product_image_path(&product_id)?;
    tracing::info!(%product_id, path = %image_path.display(), "product stored");
    Ok(CropOutcome {
        product_id,
        image_path,
    })
}
