//! Application session: ties the view state, the working leaflet, the crop
//! workspace and persistence together.

use crate::error::AppResult;
use crate::intelligence::{self, ImageIntelligence};
use crate::products::{EditTimeline, LeafletState, ProductDetails};
use crate::raster::RenderHost;
use crate::state::{ViewEvent, ViewMode, ViewStateMachine};
use crate::storage::SessionStore;
use crate::workspace::{
    DispatchOutcome, LayoutSource, WorkspaceController, WorkspaceEvent, WorkspaceSettings,
};

#[derive(Debug)]
pub struct LeafletSession {
    store: SessionStore,
    view: ViewStateMachine,
    leaflet: LeafletState,
    workspace: WorkspaceController,
}

impl LeafletSession {
    /// Restores the stored session if there is one.
    pub fn open(store: SessionStore, settings: WorkspaceSettings) -> AppResult<Self> {
        let leaflet = store.load_session()?.unwrap_or_default();
        let view = ViewStateMachine::resume(leaflet.has_image(), leaflet.products.len());
        tracing::info!(
            root = %store.root().display(),
            products = leaflet.products.len(),
            mode = ?view.mode(),
            "session opened"
        );
        Ok(Self {
            store,
            view,
            leaflet,
            workspace: WorkspaceController::new(settings),
        })
    }

    pub fn mode(&self) -> ViewMode {
        self.view.mode()
    }

    pub fn leaflet(&self) -> &LeafletState {
        &self.leaflet
    }

    pub fn workspace(&self) -> &WorkspaceController {
        &self.workspace
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Loads a new leaflet image and opens the crop workspace on it. Products
    /// cut from earlier images stay in the collection.
    pub fn select_image(&mut self, png: Vec<u8>) -> AppResult<()> {
        self.view.transition(ViewEvent::ImageSelected)?;
        self.leaflet.original_image = Some(png);
        self.workspace = WorkspaceController::new(self.workspace.settings());
        Ok(())
    }

    pub fn navigate(&mut self, event: ViewEvent) -> AppResult<ViewMode> {
        Ok(self.view.transition(event)?)
    }

    pub fn dispatch<L: LayoutSource + ?Sized>(
        &mut self,
        event: WorkspaceEvent,
        layout: &L,
    ) -> DispatchOutcome {
        if self.view.mode() != ViewMode::Extract {
            return DispatchOutcome::Ignored;
        }
        self.workspace.dispatch(event, layout)
    }

    /// Confirms the current selection into a new product.
    pub fn extract<H: RenderHost + ?Sized>(&mut self, host: &H) -> AppResult<Option<String>> {
        if self.view.mode() != ViewMode::Extract {
            return Ok(None);
        }
        Ok(self.workspace.extract_into(host, &mut self.leaflet.products)?)
    }

    pub fn enrich<I: ImageIntelligence + ?Sized>(
        &mut self,
        id: &str,
        intelligence: &I,
    ) -> AppResult<ProductDetails> {
        self.leaflet.is_analyzing = true;
        let result = intelligence::enrich_product(&mut self.leaflet.products, id, intelligence);
        self.leaflet.is_analyzing = false;
        Ok(result?)
    }

    pub fn edit<I: ImageIntelligence + ?Sized>(
        &mut self,
        id: &str,
        prompt: &str,
        intelligence: &I,
    ) -> AppResult<()> {
        Ok(intelligence::apply_image_edit(
            &mut self.leaflet.products,
            id,
            prompt,
            intelligence,
        )?)
    }

    /// Starts a version timeline for a product in the gallery.
    pub fn open_editor(&self, id: &str) -> Option<EditTimeline> {
        self.leaflet.products.get(id).map(EditTimeline::for_product)
    }

    pub fn edit_version<I: ImageIntelligence + ?Sized>(
        &self,
        timeline: &mut EditTimeline,
        prompt: &str,
        intelligence: &I,
    ) -> AppResult<()> {
        Ok(intelligence::edit_version(timeline, prompt, intelligence)?)
    }

    /// Keeps the selected timeline version; the original version reverts.
    pub fn save_version(&mut self, timeline: &EditTimeline) -> bool {
        self.leaflet.products.save_version(timeline)
    }

    pub fn save(&self) -> AppResult<()> {
        Ok(self.store.save_session(&self.leaflet)?)
    }

    /// Drops the leaflet, its products and every stored record.
    pub fn reset(&mut self) -> AppResult<()> {
        self.store.clear_all()?;
        self.leaflet = LeafletState::default();
        self.view.reset();
        self.workspace = WorkspaceController::new(self.workspace.settings());
        tracing::info!("session reset");
        Ok(())
    }
}
