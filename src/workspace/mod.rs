//! Interactive crop workspace: pan/zoom viewport, rubber-band selection and
//! the confirm pipeline that turns a selection into a native-resolution crop.

pub mod input;
pub mod mapper;
pub mod selection;
pub mod viewport;

use crate::geometry::{BoundingBox, DisplayRect, Point};
use crate::products::ProductSink;
use crate::raster::{self, CropPayload, RasterError, RasterResult, RenderHost};

pub use input::{normalize_key, KeyCode, PointerButton, PointerTarget, WorkspaceEvent};
pub use mapper::{LayoutSnapshot, LayoutSource, NativeRatio};
pub use selection::{SelectionPhase, SelectionTracker, MIN_SELECTION_SIZE};
pub use viewport::{
    ViewportTransform, ZoomDirection, DEFAULT_BUTTON_ZOOM_STEP, DEFAULT_WHEEL_ZOOM_STEP,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Select,
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkspaceSettings {
    pub wheel_zoom_step: f64,
    pub button_zoom_step: f64,
    pub min_selection_size: f64,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            wheel_zoom_step: DEFAULT_WHEEL_ZOOM_STEP,
            button_zoom_step: DEFAULT_BUTTON_ZOOM_STEP,
            min_selection_size: MIN_SELECTION_SIZE,
        }
    }
}

/// What a dispatched event changed, so the host knows what to redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchOutcome {
    Ignored,
    ViewportChanged,
    SelectionChanged,
    PanStarted,
    PanEnded,
    ModeChanged(ToolMode),
    FullscreenChanged(bool),
}

/// Image geometry captured when a selection drag starts. The whole drag maps
/// through it so a mid-gesture layout change cannot skew the rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GestureFrame {
    bounds: BoundingBox,
    scale: f64,
}

impl GestureFrame {
    fn map(&self, pointer: Point) -> Point {
        mapper::to_image_display_space(pointer, self.bounds, self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    None,
    Selecting(GestureFrame),
    Panning {
        last: Point,
    },
}

#[derive(Debug, Clone, Default)]
pub struct WorkspaceController {
    settings: WorkspaceSettings,
    viewport: ViewportTransform,
    selection: SelectionTracker,
    mode: ToolMode,
    gesture: Gesture,
    pointer_held: bool,
    last_pointer: Option<Point>,
    fullscreen: bool,
}

impl WorkspaceController {
    pub fn new(settings: WorkspaceSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> WorkspaceSettings {
        self.settings
    }

    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn selection(&self) -> Option<DisplayRect> {
        self.selection.selection()
    }

    pub fn selection_phase(&self) -> SelectionPhase {
        self.selection.phase()
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Whether the host should offer the extract button for the selection.
    pub fn can_confirm(&self) -> bool {
        self.mode == ToolMode::Select
            && !self.is_panning()
            && self
                .selection
                .confirmable(self.settings.min_selection_size)
                .is_some()
    }

    pub fn dispatch<L: LayoutSource + ?Sized>(
        &mut self,
        event: WorkspaceEvent,
        layout: &L,
    ) -> DispatchOutcome {
        let outcome = match event {
            WorkspaceEvent::Wheel { delta_y } => {
                let direction = ZoomDirection::from_wheel_delta(delta_y);
                self.viewport.zoom(direction, self.settings.wheel_zoom_step);
                self.viewport_changed()
            }
            WorkspaceEvent::ZoomButton(direction) => {
                self.viewport.zoom(direction, self.settings.button_zoom_step);
                self.viewport_changed()
            }
            WorkspaceEvent::ResetZoom => {
                if self.viewport.is_identity() {
                    return DispatchOutcome::Ignored;
                }
                self.viewport.reset();
                self.viewport_changed()
            }
            WorkspaceEvent::PointerDown {
                position,
                button,
                target,
            } => self.pointer_down(position, button, target, layout),
            WorkspaceEvent::PointerMove { position } => self.pointer_move(position),
            WorkspaceEvent::PointerUp { position } => {
                self.last_pointer = Some(position);
                self.pointer_released()
            }
            WorkspaceEvent::PointerLeave => self.pointer_released(),
            WorkspaceEvent::KeyDown {
                key: KeyCode::Space,
                repeat: false,
            } => self.space_pressed(),
            WorkspaceEvent::KeyUp {
                key: KeyCode::Space,
            } => self.space_released(),
            WorkspaceEvent::KeyDown { .. } | WorkspaceEvent::KeyUp { .. } => {
                DispatchOutcome::Ignored
            }
            WorkspaceEvent::SetTool(mode) => self.set_tool(mode),
            WorkspaceEvent::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                DispatchOutcome::FullscreenChanged(self.fullscreen)
            }
        };
        tracing::trace!(?event, ?outcome, mode = ?self.mode, "workspace event dispatched");
        outcome
    }

    fn viewport_changed(&self) -> DispatchOutcome {
        tracing::debug!(
            zoom_percent = self.viewport.zoom_percent(),
            transform = %self.viewport.css_transform(),
            "viewport updated"
        );
        DispatchOutcome::ViewportChanged
    }

    fn pointer_down<L: LayoutSource + ?Sized>(
        &mut self,
        position: Point,
        button: PointerButton,
        target: PointerTarget,
        layout: &L,
    ) -> DispatchOutcome {
        if target == PointerTarget::Control {
            return DispatchOutcome::Ignored;
        }
        self.pointer_held = true;
        self.last_pointer = Some(position);

        if self.mode == ToolMode::Pan || button == PointerButton::Middle {
            self.gesture = Gesture::Panning { last: position };
            return DispatchOutcome::PanStarted;
        }

        let frame = GestureFrame {
            bounds: layout.layout().bounds,
            scale: self.viewport.scale(),
        };
        self.selection.begin(frame.map(position));
        self.gesture = Gesture::Selecting(frame);
        DispatchOutcome::SelectionChanged
    }

    fn pointer_move(&mut self, position: Point) -> DispatchOutcome {
        self.last_pointer = Some(position);
        match self.gesture {
            Gesture::Panning { last } => {
                self.viewport.pan_by(position.x - last.x, position.y - last.y);
                self.gesture = Gesture::Panning { last: position };
                self.viewport_changed()
            }
            Gesture::Selecting(frame) => {
                if self.selection.update(frame.map(position)) {
                    DispatchOutcome::SelectionChanged
                } else {
                    DispatchOutcome::Ignored
                }
            }
            Gesture::None => DispatchOutcome::Ignored,
        }
    }

    fn pointer_released(&mut self) -> DispatchOutcome {
        self.pointer_held = false;
        match std::mem::take(&mut self.gesture) {
            Gesture::Panning { .. } => DispatchOutcome::PanEnded,
            Gesture::Selecting(_) => {
                self.selection.freeze();
                DispatchOutcome::SelectionChanged
            }
            Gesture::None => DispatchOutcome::Ignored,
        }
    }

    /// Space forces pan mode. A running selection drag freezes where it is and,
    /// while the button is still held, the same drag continues as a pan.
    fn space_pressed(&mut self) -> DispatchOutcome {
        if self.mode == ToolMode::Pan {
            return DispatchOutcome::Ignored;
        }
        self.mode = ToolMode::Pan;
        if let Gesture::Selecting(_) = self.gesture {
            self.selection.freeze();
            self.gesture = match (self.pointer_held, self.last_pointer) {
                (true, Some(last)) => Gesture::Panning { last },
                _ => Gesture::None,
            };
        }
        tracing::debug!("space held; pan mode forced");
        DispatchOutcome::ModeChanged(ToolMode::Pan)
    }

    /// Releasing space always returns to select mode, even when pan had been
    /// chosen from the toolbar before space was pressed.
    fn space_released(&mut self) -> DispatchOutcome {
        if self.mode == ToolMode::Select {
            return DispatchOutcome::Ignored;
        }
        self.mode = ToolMode::Select;
        DispatchOutcome::ModeChanged(ToolMode::Select)
    }

    fn set_tool(&mut self, mode: ToolMode) -> DispatchOutcome {
        if self.mode == mode {
            return DispatchOutcome::Ignored;
        }
        if self.mode == ToolMode::Select {
            if let Gesture::Selecting(_) = self.gesture {
                self.gesture = Gesture::None;
            }
            self.selection.clear();
        }
        self.mode = mode;
        tracing::debug!(?mode, "tool mode selected");
        DispatchOutcome::ModeChanged(mode)
    }

    /// Rasterizes the frozen selection at native resolution.
    ///
    /// `Ok(None)` when there is nothing to extract: pan mode, no selection, a
    /// drag still in progress, or a rectangle under the size threshold. On
    /// error the selection is kept so the user can retry.
    pub fn confirm<H: RenderHost + ?Sized>(
        &mut self,
        host: &H,
    ) -> RasterResult<Option<CropPayload>> {
        if self.mode != ToolMode::Select {
            return Ok(None);
        }
        let Some(rect) = self.selection.confirmable(self.settings.min_selection_size) else {
            tracing::debug!(selection = ?self.selection.selection(), "nothing to extract");
            return Ok(None);
        };

        // Read the css box now; it changes with zoom and layout.
        let layout = host.layout();
        let ratio = layout
            .native_ratio()
            .ok_or(RasterError::DegenerateLayout {
                width: layout.css_size.width,
                height: layout.css_size.height,
            })?;
        let native = ratio.rect_to_native(rect);
        let payload = raster::rasterize(host, native).inspect_err(|err| {
            tracing::warn!(%err, selection = ?rect, "crop extraction failed");
        })?;

        self.selection.clear();
        Ok(Some(payload))
    }

    /// Confirms and hands the crop to `sink`, returning the id it assigned.
    pub fn extract_into<H, S>(&mut self, host: &H, sink: &mut S) -> RasterResult<Option<String>>
    where
        H: RenderHost + ?Sized,
        S: ProductSink + ?Sized,
    {
        let Some(payload) = self.confirm(host)? else {
            return Ok(None);
        };
        let (width, height) = (payload.width, payload.height);
        let id = sink.receive(payload);
        tracing::info!(%id, width, height, "product crop extracted");
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::raster::ImageRenderHost;
    use image::RgbaImage;

    fn pattern_host(width: u32, height: u32, css: Size) -> ImageRenderHost {
        let source = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8, 255])
        });
        ImageRenderHost::with_css_size(source, css)
    }

    fn drag(
        controller: &mut WorkspaceController,
        host: &ImageRenderHost,
        from: Point,
        to: Point,
    ) {
        controller.dispatch(WorkspaceEvent::primary_down(from), host);
        controller.dispatch(WorkspaceEvent::PointerMove { position: to }, host);
        controller.dispatch(WorkspaceEvent::PointerUp { position: to }, host);
    }

    #[derive(Default)]
    struct RecordingSink {
        received: Vec<CropPayload>,
    }

    impl ProductSink for RecordingSink {
        fn receive(&mut self, payload: CropPayload) -> String {
            self.received.push(payload);
            format!("p{}", self.received.len())
        }
    }

    #[test]
    fn wheel_zoom_clamps_exactly_at_upper_bound() {
        let host = pattern_host(10, 10, Size::new(10.0, 10.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings {
            wheel_zoom_step: 0.4,
            ..WorkspaceSettings::default()
        });

        for _ in 0..9 {
            controller.dispatch(WorkspaceEvent::Wheel { delta_y: -1.0 }, &host);
        }
        assert!((controller.viewport().scale() - 4.6).abs() < 1e-9);

        controller.dispatch(WorkspaceEvent::Wheel { delta_y: -1.0 }, &host);
        assert!((controller.viewport().scale() - 5.0).abs() < 1e-9);

        controller.dispatch(WorkspaceEvent::Wheel { delta_y: -1.0 }, &host);
        assert_eq!(controller.viewport().scale(), 5.0);
    }

    #[test]
    fn zoom_sequences_stay_within_scale_range() {
        let host = pattern_host(10, 10, Size::new(10.0, 10.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        let deltas = [1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0];
        for delta_y in deltas.iter().cycle().take(200) {
            controller.dispatch(WorkspaceEvent::Wheel { delta_y: *delta_y }, &host);
            let scale = controller.viewport().scale();
            assert!((0.5..=5.0).contains(&scale));
        }
        for _ in 0..60 {
            controller.dispatch(WorkspaceEvent::ZoomButton(ZoomDirection::Out), &host);
            assert!((0.2..=5.0).contains(&controller.viewport().scale()));
        }
        for _ in 0..60 {
            controller.dispatch(WorkspaceEvent::ZoomButton(ZoomDirection::In), &host);
            assert!((0.2..=5.0).contains(&controller.viewport().scale()));
        }
    }

    #[test]
    fn reset_zoom_restores_identity_twice() {
        let host = pattern_host(10, 10, Size::new(10.0, 10.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        controller.dispatch(WorkspaceEvent::ZoomButton(ZoomDirection::In), &host);
        controller.dispatch(WorkspaceEvent::SetTool(ToolMode::Pan), &host);
        controller.dispatch(WorkspaceEvent::primary_down(Point::new(0.0, 0.0)), &host);
        controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(30.0, 10.0),
            },
            &host,
        );

        let expected = [DispatchOutcome::ViewportChanged, DispatchOutcome::Ignored];
        for outcome in expected {
            assert_eq!(controller.dispatch(WorkspaceEvent::ResetZoom, &host), outcome);
            assert_eq!(*controller.viewport(), ViewportTransform::new());
        }
    }

    #[test]
    fn drag_extracts_native_resolution_crop() {
        let host = pattern_host(2000, 3000, Size::new(500.0, 750.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        drag(
            &mut controller,
            &host,
            Point::new(100.0, 100.0),
            Point::new(200.0, 250.0),
        );
        assert_eq!(
            controller.selection(),
            Some(DisplayRect::new(100.0, 100.0, 100.0, 150.0))
        );
        assert!(controller.can_confirm());

        let payload = controller
            .confirm(&host)
            .expect("rasterization should succeed")
            .expect("selection is large enough");
        assert_eq!((payload.width, payload.height), (400, 600));
        let crop = image::load_from_memory(&payload.png)
            .expect("payload decodes")
            .to_rgba8();
        assert_eq!(crop.get_pixel(0, 0), host.source().get_pixel(400, 400));
        assert_eq!(crop.get_pixel(399, 599), host.source().get_pixel(799, 999));
        assert_eq!(controller.selection(), None);
    }

    #[test]
    fn selection_maps_through_zoom_and_pan() {
        let mut host = pattern_host(400, 400, Size::new(200.0, 200.0));
        host.set_element_origin(Point::new(50.0, 40.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        controller.dispatch(WorkspaceEvent::ZoomButton(ZoomDirection::In), &host);
        controller.dispatch(WorkspaceEvent::ZoomButton(ZoomDirection::In), &host);
        controller.dispatch(WorkspaceEvent::ZoomButton(ZoomDirection::In), &host);
        controller.dispatch(WorkspaceEvent::ZoomButton(ZoomDirection::In), &host);
        controller.dispatch(WorkspaceEvent::ZoomButton(ZoomDirection::In), &host);
        host.sync_viewport(controller.viewport());
        assert!((controller.viewport().scale() - 2.0).abs() < 1e-9);

        drag(
            &mut controller,
            &host,
            Point::new(70.0, 60.0),
            Point::new(150.0, 100.0),
        );
        let rect = controller.selection().expect("selection exists");
        assert!((rect.x - 10.0).abs() < 1e-9);
        assert!((rect.y - 10.0).abs() < 1e-9);
        assert!((rect.w - 40.0).abs() < 1e-9);
        assert!((rect.h - 20.0).abs() < 1e-9);
    }

    #[test]
    fn tiny_selection_confirm_is_a_no_op() {
        let host = pattern_host(100, 100, Size::new(100.0, 100.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        let mut sink = RecordingSink::default();
        drag(
            &mut controller,
            &host,
            Point::new(10.0, 10.0),
            Point::new(13.0, 13.0),
        );
        assert!(!controller.can_confirm());

        let result = controller
            .extract_into(&host, &mut sink)
            .expect("no-op is not an error");
        assert_eq!(result, None);
        assert!(sink.received.is_empty());
        assert_eq!(
            controller.selection(),
            Some(DisplayRect::new(10.0, 10.0, 3.0, 3.0))
        );
    }

    #[test]
    fn extract_into_emits_one_payload_and_clears_selection() {
        let host = pattern_host(100, 100, Size::new(100.0, 100.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        let mut sink = RecordingSink::default();
        drag(
            &mut controller,
            &host,
            Point::new(60.0, 60.0),
            Point::new(20.0, 30.0),
        );

        let id = controller
            .extract_into(&host, &mut sink)
            .expect("extraction succeeds");
        assert_eq!(id.as_deref(), Some("p1"));
        assert_eq!(sink.received.len(), 1);
        assert_eq!((sink.received[0].width, sink.received[0].height), (40, 30));
        assert_eq!(controller.selection(), None);

        let again = controller
            .extract_into(&host, &mut sink)
            .expect("second confirm is a no-op");
        assert_eq!(again, None);
        assert_eq!(sink.received.len(), 1);
    }

    #[test]
    fn failed_extraction_keeps_selection_for_retry() {
        let host = pattern_host(100, 100, Size::new(100.0, 100.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        drag(
            &mut controller,
            &host,
            Point::new(150.0, 150.0),
            Point::new(190.0, 190.0),
        );

        let err = controller
            .confirm(&host)
            .expect_err("selection lies outside the image");
        assert!(matches!(err, RasterError::RegionOutOfBounds { .. }));
        assert_eq!(
            controller.selection(),
            Some(DisplayRect::new(150.0, 150.0, 40.0, 40.0))
        );
    }

    struct SurfacelessHost {
        inner: ImageRenderHost,
    }

    impl LayoutSource for SurfacelessHost {
        fn layout(&self) -> LayoutSnapshot {
            self.inner.layout()
        }
    }

    impl RenderHost for SurfacelessHost {
        type Surface = RgbaImage;

        fn acquire_surface(&self, _width: u32, _height: u32) -> Option<RgbaImage> {
            None
        }

        fn draw_region(
            &self,
            surface: &mut RgbaImage,
            region: raster::SourceRegion,
        ) -> RasterResult<()> {
            self.inner.draw_region(surface, region)
        }

        fn encode(&self, surface: RgbaImage) -> RasterResult<Vec<u8>> {
            self.inner.encode(surface)
        }
    }

    #[test]
    fn unavailable_surface_keeps_selection_and_emits_nothing() {
        let host = SurfacelessHost {
            inner: pattern_host(100, 100, Size::new(100.0, 100.0)),
        };
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        let mut sink = RecordingSink::default();
        controller.dispatch(WorkspaceEvent::primary_down(Point::new(10.0, 20.0)), &host);
        controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(40.0, 35.0),
            },
            &host,
        );
        controller.dispatch(
            WorkspaceEvent::PointerUp {
                position: Point::new(40.0, 35.0),
            },
            &host,
        );

        let err = controller
            .extract_into(&host, &mut sink)
            .expect_err("host cannot provide a surface");
        assert!(matches!(
            err,
            RasterError::RenderSurfaceUnavailable {
                width: 30,
                height: 15
            }
        ));
        assert!(sink.received.is_empty());
        assert_eq!(
            controller.selection(),
            Some(DisplayRect::new(10.0, 20.0, 30.0, 15.0))
        );
        assert!(controller.can_confirm());
    }

    #[test]
    fn confirm_reports_degenerate_css_box() {
        let host = pattern_host(100, 100, Size::new(0.0, 100.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        drag(
            &mut controller,
            &host,
            Point::new(0.0, 0.0),
            Point::new(20.0, 20.0),
        );
        let err = controller.confirm(&host).expect_err("css box is empty");
        assert!(matches!(err, RasterError::DegenerateLayout { .. }));
        assert!(controller.selection().is_some());
    }

    #[test]
    fn spacebar_mid_drag_freezes_selection_and_pans() {
        let host = pattern_host(200, 200, Size::new(200.0, 200.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        controller.dispatch(WorkspaceEvent::primary_down(Point::new(10.0, 10.0)), &host);
        controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(50.0, 50.0),
            },
            &host,
        );
        let frozen = DisplayRect::new(10.0, 10.0, 40.0, 40.0);
        assert_eq!(controller.selection(), Some(frozen));

        let outcome = controller.dispatch(WorkspaceEvent::key_down(KeyCode::Space), &host);
        assert_eq!(outcome, DispatchOutcome::ModeChanged(ToolMode::Pan));
        assert_eq!(controller.mode(), ToolMode::Pan);
        assert_eq!(controller.selection_phase(), SelectionPhase::Idle);

        let outcome = controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(80.0, 65.0),
            },
            &host,
        );
        assert_eq!(outcome, DispatchOutcome::ViewportChanged);
        assert_eq!(controller.viewport().pan(), Point::new(30.0, 15.0));
        assert_eq!(controller.selection(), Some(frozen));
        assert!(!controller.can_confirm());

        controller.dispatch(
            WorkspaceEvent::PointerUp {
                position: Point::new(80.0, 65.0),
            },
            &host,
        );
        let outcome = controller.dispatch(
            WorkspaceEvent::KeyUp {
                key: KeyCode::Space,
            },
            &host,
        );
        assert_eq!(outcome, DispatchOutcome::ModeChanged(ToolMode::Select));
        assert_eq!(controller.selection(), Some(frozen));
        assert!(controller.can_confirm());
    }

    #[test]
    fn repeated_space_keydown_is_ignored() {
        let host = pattern_host(10, 10, Size::new(10.0, 10.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        controller.dispatch(WorkspaceEvent::key_down(KeyCode::Space), &host);
        let outcome = controller.dispatch(
            WorkspaceEvent::KeyDown {
                key: KeyCode::Space,
                repeat: true,
            },
            &host,
        );
        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(controller.mode(), ToolMode::Pan);
    }

    #[test]
    fn space_release_reverts_to_select_even_after_toolbar_pan() {
        let host = pattern_host(10, 10, Size::new(10.0, 10.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        controller.dispatch(WorkspaceEvent::SetTool(ToolMode::Pan), &host);
        assert_eq!(
            controller.dispatch(WorkspaceEvent::key_down(KeyCode::Space), &host),
            DispatchOutcome::Ignored
        );
        controller.dispatch(
            WorkspaceEvent::KeyUp {
                key: KeyCode::Space,
            },
            &host,
        );
        assert_eq!(controller.mode(), ToolMode::Select);
    }

    #[test]
    fn toolbar_switch_to_pan_clears_selection() {
        let host = pattern_host(100, 100, Size::new(100.0, 100.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        drag(
            &mut controller,
            &host,
            Point::new(0.0, 0.0),
            Point::new(30.0, 30.0),
        );
        assert!(controller.selection().is_some());

        controller.dispatch(WorkspaceEvent::SetTool(ToolMode::Pan), &host);
        assert_eq!(controller.selection(), None);
        assert_eq!(
            controller.confirm(&host).expect("pan mode confirm is disabled"),
            None
        );
    }

    #[test]
    fn pan_mode_drag_moves_viewport_not_selection() {
        let host = pattern_host(100, 100, Size::new(100.0, 100.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        controller.dispatch(WorkspaceEvent::SetTool(ToolMode::Pan), &host);
        assert_eq!(
            controller.dispatch(WorkspaceEvent::primary_down(Point::new(5.0, 5.0)), &host),
            DispatchOutcome::PanStarted
        );
        controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(25.0, -5.0),
            },
            &host,
        );
        controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(30.0, 0.0),
            },
            &host,
        );
        assert_eq!(
            controller.dispatch(WorkspaceEvent::PointerLeave, &host),
            DispatchOutcome::PanEnded
        );
        assert_eq!(controller.viewport().pan(), Point::new(25.0, -5.0));
        assert_eq!(controller.selection(), None);

        controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(90.0, 90.0),
            },
            &host,
        );
        assert_eq!(controller.viewport().pan(), Point::new(25.0, -5.0));
    }

    #[test]
    fn middle_button_pans_in_select_mode() {
        let host = pattern_host(100, 100, Size::new(100.0, 100.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        controller.dispatch(
            WorkspaceEvent::PointerDown {
                position: Point::new(0.0, 0.0),
                button: PointerButton::Middle,
                target: PointerTarget::Canvas,
            },
            &host,
        );
        controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(-12.0, 8.0),
            },
            &host,
        );
        controller.dispatch(
            WorkspaceEvent::PointerUp {
                position: Point::new(-12.0, 8.0),
            },
            &host,
        );
        assert_eq!(controller.mode(), ToolMode::Select);
        assert_eq!(controller.viewport().pan(), Point::new(-12.0, 8.0));
        assert_eq!(controller.selection(), None);
    }

    #[test]
    fn pointer_down_on_control_is_ignored() {
        let host = pattern_host(100, 100, Size::new(100.0, 100.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        drag(
            &mut controller,
            &host,
            Point::new(10.0, 10.0),
            Point::new(60.0, 60.0),
        );
        let outcome = controller.dispatch(
            WorkspaceEvent::PointerDown {
                position: Point::new(35.0, 70.0),
                button: PointerButton::Primary,
                target: PointerTarget::Control,
            },
            &host,
        );
        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(
            controller.selection(),
            Some(DisplayRect::new(10.0, 10.0, 50.0, 50.0))
        );
    }

    #[test]
    fn pointer_leave_freezes_selection() {
        let host = pattern_host(100, 100, Size::new(100.0, 100.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        controller.dispatch(WorkspaceEvent::primary_down(Point::new(10.0, 10.0)), &host);
        controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(30.0, 40.0),
            },
            &host,
        );
        controller.dispatch(WorkspaceEvent::PointerLeave, &host);
        controller.dispatch(
            WorkspaceEvent::PointerMove {
                position: Point::new(90.0, 90.0),
            },
            &host,
        );
        assert_eq!(controller.selection_phase(), SelectionPhase::Idle);
        assert_eq!(
            controller.selection(),
            Some(DisplayRect::new(10.0, 10.0, 20.0, 30.0))
        );
    }

    #[test]
    fn fullscreen_toggle_flips_flag() {
        let host = pattern_host(10, 10, Size::new(10.0, 10.0));
        let mut controller = WorkspaceController::new(WorkspaceSettings::default());
        assert_eq!(
            controller.dispatch(WorkspaceEvent::ToggleFullscreen, &host),
            DispatchOutcome::FullscreenChanged(true)
        );
        assert_eq!(
            controller.dispatch(WorkspaceEvent::ToggleFullscreen, &host),
            DispatchOutcome::FullscreenChanged(false)
        );
    }
}
