//! Editor session orchestration.

use crate::export::export_request;
use log::{error, info, warn};
use pdfmark_core::{
    AnnotationScene, Bitmap, Collaborator, Document, EditMode, EditorConfig, EditorError,
    EditorResult, InputEvent, NetworkError, NodeId, NotReadyReason,
};
#[cfg(feature = "pdfium")]
use pdfmark_render::PdfiumBackend;
use pdfmark_render::{
    CpuRenderer, LopdfBackend, PageRenderer, PdfBackend, PdfDocument, QueueOutcome, RenderContext,
    RenderQueue, Renderer, Surface, composite,
};
use std::sync::Arc;

const INVALID_UPLOAD_RESPONSE: &str = "Upload successful but server response is invalid.";
const MISSING_EXPORT_URL: &str = "Error exporting image: No URL received from server.";

/// Result of a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The page renders on the next [`EditorSession::poll_render`].
    Started(u32),
    /// Another render is in flight; this page is next in line.
    Queued(u32),
}

#[cfg(feature = "pdfium")]
fn default_backend() -> Box<dyn PdfBackend> {
    match PdfiumBackend::bind() {
        Ok(backend) => {
            info!("Rendering pages with PDFium");
            Box::new(backend)
        }
        Err(e) => {
            warn!("{}; falling back to blank-page lopdf rendering", e);
            Box::new(LopdfBackend::new())
        }
    }
}

#[cfg(not(feature = "pdfium"))]
fn default_backend() -> Box<dyn PdfBackend> {
    Box::new(LopdfBackend::new())
}

/// One editing session over one document at a time.
///
/// Owns every piece of mutable editor state. The page surface and the
/// overlay surface are reused across pages and always share dimensions once
/// a page is on stage.
pub struct EditorSession {
    config: EditorConfig,
    backend: Box<dyn PdfBackend>,
    collaborator: Arc<dyn Collaborator>,
    document: Option<Document>,
    pdf: Option<Box<dyn PdfDocument>>,
    pages: PageRenderer,
    queue: RenderQueue,
    scene: AnnotationScene,
    overlay: Surface,
    renderer: CpuRenderer,
    annotations_visible: bool,
    last_export_url: Option<String>,
}

impl EditorSession {
    /// Create a session with the default PDF backend.
    ///
    /// With the `pdfium` feature, pages are rasterized through PDFium when
    /// the library can be bound. Otherwise (feature off, or no PDFium found)
    /// the structural `lopdf` backend is used: page count and page sizes are
    /// exact, but every page renders as blank paper with a thin border.
    pub fn new(config: EditorConfig, collaborator: Arc<dyn Collaborator>) -> Self {
        Self::with_backend(config, default_backend(), collaborator)
    }

    pub fn with_backend(
        config: EditorConfig,
        backend: Box<dyn PdfBackend>,
        collaborator: Arc<dyn Collaborator>,
    ) -> Self {
        Self {
            pages: PageRenderer::new(config.render_scale),
            scene: AnnotationScene::new(config.clone()),
            config,
            backend,
            collaborator,
            document: None,
            pdf: None,
            queue: RenderQueue::new(),
            overlay: Surface::default(),
            renderer: CpuRenderer::new(),
            annotations_visible: false,
            last_export_url: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn scene(&self) -> &AnnotationScene {
        &self.scene
    }

    /// The rendered page raster.
    pub fn page_surface(&self) -> &Surface {
        self.pages.surface()
    }

    /// The annotation overlay raster.
    pub fn overlay(&self) -> &Surface {
        &self.overlay
    }

    /// Whether the annotation surface is shown. False after a load failure.
    pub fn annotations_visible(&self) -> bool {
        self.annotations_visible
    }

    /// URL returned by the most recent successful export.
    pub fn last_export_url(&self) -> Option<&str> {
        self.last_export_url.as_deref()
    }

    pub fn render_queue(&self) -> &RenderQueue {
        &self.queue
    }

    pub fn mode(&self) -> EditMode {
        self.scene.mode()
    }

    /// Whether a page is on stage and annotations can be placed.
    pub fn has_stage(&self) -> bool {
        self.document.is_some() && self.pages.rendered_page().is_some()
    }

    fn require_stage(&self) -> EditorResult<()> {
        if self.document.is_none() {
            return Err(EditorError::NotReady(NotReadyReason::NoDocument));
        }
        if !self.has_stage() {
            return Err(EditorError::NotReady(NotReadyReason::NoStage));
        }
        Ok(())
    }

    /// Upload a PDF to the collaborator, then open what was uploaded.
    pub async fn upload(&mut self, file_name: &str, bytes: Vec<u8>) -> EditorResult<()> {
        let collaborator = Arc::clone(&self.collaborator);
        let response = collaborator
            .upload(file_name, &bytes)
            .await
            .inspect_err(|e| error!("Upload failed: {}", e))?;
        let Some((url, filename)) = response.validated() else {
            error!("Invalid upload response: {:?}", response);
            return Err(NetworkError::invalid_response(INVALID_UPLOAD_RESPONSE).into());
        };
        info!("Uploaded {} as {}", file_name, url);
        let (url, filename) = (url.to_string(), filename.to_string());
        self.open_document(filename, Some(url), bytes)
    }

    /// Open a document from bytes, replacing any current one, and show page 1.
    pub fn load_document(&mut self, id: &str, bytes: Vec<u8>) -> EditorResult<()> {
        self.open_document(id.to_string(), None, bytes)
    }

    fn open_document(&mut self, id: String, url: Option<String>, bytes: Vec<u8>) -> EditorResult<()> {
        self.queue.reset();
        self.scene.clear();
        self.last_export_url = None;

        let pdf = match self.backend.open(bytes) {
            Ok(pdf) => pdf,
            Err(e) => {
                error!("Error loading PDF {}: {}", id, e);
                self.unload();
                return Err(e.into());
            }
        };

        let mut document = Document::new(id, pdf.page_count());
        if let Some(url) = url {
            document = document.with_url(url);
        }
        info!("Loaded document {} ({} pages)", document.id, document.page_count());
        self.document = Some(document);
        self.pdf = Some(pdf);
        self.annotations_visible = true;
        // A document whose first page cannot be shown did not load.
        let shown = self.go_to_page(1);
        if shown.is_err() {
            self.unload();
        }
        shown
    }

    fn unload(&mut self) {
        self.document = None;
        self.pdf = None;
        self.pages.clear();
        self.overlay.resize(0, 0);
        self.annotations_visible = false;
    }

    /// Ask for a page. Only one render is in flight at a time; while one is,
    /// the newest request waits and older waiting requests are dropped.
    pub fn request_page(&mut self, page: u32) -> EditorResult<RenderStatus> {
        let document = self
            .document
            .as_ref()
            .ok_or(EditorError::NotReady(NotReadyReason::NoDocument))?;
        document.check_page(page)?;
        Ok(match self.queue.request(page) {
            QueueOutcome::Started(page) => RenderStatus::Started(page),
            QueueOutcome::Queued { page, .. } => RenderStatus::Queued(page),
        })
    }

    /// Run the in-flight render to completion, then promote the pending
    /// request. Returns the page that was rendered, if any.
    pub fn poll_render(&mut self) -> EditorResult<Option<u32>> {
        let Some(page) = self.queue.in_flight() else {
            return Ok(None);
        };
        let result = self.render_page(page);
        self.queue.complete();
        result.map(|()| Some(page))
    }

    /// Request a page and drive the queue until idle.
    pub fn go_to_page(&mut self, page: u32) -> EditorResult<()> {
        self.request_page(page)?;
        let mut result = Ok(());
        while self.queue.is_busy() {
            if let Err(e) = self.poll_render() {
                result = Err(e);
            }
        }
        result
    }

    pub fn next_page(&mut self) -> EditorResult<()> {
        match &self.document {
            Some(doc) if doc.has_next() => self.go_to_page(doc.current_page() + 1),
            Some(_) => Ok(()),
            None => Err(EditorError::NotReady(NotReadyReason::NoDocument)),
        }
    }

    pub fn previous_page(&mut self) -> EditorResult<()> {
        match &self.document {
            Some(doc) if doc.has_previous() => self.go_to_page(doc.current_page() - 1),
            Some(_) => Ok(()),
            None => Err(EditorError::NotReady(NotReadyReason::NoDocument)),
        }
    }

    /// Clear the scene, rasterize the page and redraw the (empty) overlay.
    fn render_page(&mut self, page: u32) -> EditorResult<()> {
        let (Some(document), Some(pdf)) = (self.document.as_mut(), self.pdf.as_deref()) else {
            return Err(EditorError::NotReady(NotReadyReason::NoDocument));
        };
        document.set_current_page(page)?;
        self.scene.clear();
        if let Err(e) = self.pages.render(pdf, page) {
            error!("Error rendering page {}: {}", page, e);
            self.overlay.resize(0, 0);
            return Err(e.into());
        }
        self.redraw();
        Ok(())
    }

    /// Redraw the overlay at the page surface's size.
    fn redraw(&mut self) {
        let ctx = RenderContext::new(&self.scene, self.pages.surface().size());
        self.renderer.render(&ctx, &mut self.overlay);
    }

    /// Add a text node at the configured default position.
    ///
    /// Blank content is ignored and yields `Ok(None)`.
    pub fn add_text(&mut self, content: &str) -> EditorResult<Option<NodeId>> {
        self.require_stage()?;
        let id = self.scene.add_text(content, self.config.default_position);
        if id.is_some() {
            self.redraw();
        }
        Ok(id)
    }

    /// Add a decoded image at the configured default position.
    pub fn add_image(&mut self, bitmap: Bitmap) -> EditorResult<NodeId> {
        self.require_stage()?;
        let id = self.scene.add_image(bitmap, self.config.default_position);
        self.redraw();
        Ok(id)
    }

    /// Decode an image file and add it. Decode failures leave the scene as is.
    pub fn add_image_file(&mut self, name: &str, bytes: &[u8]) -> EditorResult<NodeId> {
        self.require_stage()?;
        let bitmap = Bitmap::decode(bytes).map_err(|e| {
            error!("Could not load image {}: {}", name, e);
            EditorError::Decode {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.add_image(bitmap)
    }

    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let removed = self.scene.remove(id).is_some();
        if removed {
            self.redraw();
        }
        removed
    }

    /// Flip between View and Edit. Ignored until a page is on stage.
    pub fn toggle_edit_mode(&mut self) -> Option<EditMode> {
        if !self.has_stage() {
            warn!("Edit mode toggle ignored: no page rendered");
            return None;
        }
        let mode = self.scene.toggle_edit_mode();
        info!("Edit mode: {:?}", mode);
        self.redraw();
        Some(mode)
    }

    /// Feed one pointer or key event. Returns whether anything changed.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        if !self.has_stage() {
            return false;
        }
        let changed = self.scene.handle_event(event);
        if changed {
            self.redraw();
        }
        changed
    }

    /// Flatten page and overlay with the transform handle hidden.
    ///
    /// The handle is restored afterwards; nothing is sent anywhere.
    pub fn composite(&mut self) -> EditorResult<Surface> {
        self.require_stage()?;
        let hidden = self.scene.hide_handle();
        self.redraw();
        let flattened = composite(self.pages.surface(), &self.overlay);
        if hidden {
            self.scene.show_handle();
        }
        self.redraw();
        Ok(flattened?)
    }

    /// Flatten, encode and hand the result to the export collaborator.
    ///
    /// Returns the URL the collaborator stored the image at. Fails with
    /// `NotReady` before any request when a document, a rendered page or a
    /// filename is missing.
    pub async fn export(&mut self) -> EditorResult<String> {
        let filename = match &self.document {
            None => return Err(EditorError::NotReady(NotReadyReason::NoDocument)),
            Some(doc) if doc.id.trim().is_empty() => {
                return Err(EditorError::NotReady(NotReadyReason::NoFilename));
            }
            Some(doc) => doc.id.clone(),
        };
        let flattened = self.composite().inspect_err(|e| error!("Export failed: {}", e))?;
        let request = export_request(&flattened, &filename)?;

        let collaborator = Arc::clone(&self.collaborator);
        let response = collaborator
            .export(&request)
            .await
            .inspect_err(|e| error!("Export failed: {}", e))?;
        if response.url.is_empty() {
            error!("{}", MISSING_EXPORT_URL);
            return Err(NetworkError::invalid_response(MISSING_EXPORT_URL).into());
        }
        info!("Exported {} to {}", filename, response.url);
        self.last_export_url = Some(response.url.clone());
        Ok(response.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;
    use image::{Rgba, RgbaImage};
    use kurbo::Point;
    use pdfmark_core::{KeyEvent, MemoryCollaborator, PointerEvent, SelectionState, UploadResponse};
    use pdfmark_render::fixtures::sample_pdf;

    const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn session() -> (EditorSession, Arc<MemoryCollaborator>) {
        init_logger();
        let collaborator = Arc::new(MemoryCollaborator::new());
        let session = EditorSession::new(EditorConfig::default(), collaborator.clone());
        (session, collaborator)
    }

    fn loaded(pages: u32) -> (EditorSession, Arc<MemoryCollaborator>) {
        let (mut session, collaborator) = session();
        let bytes = sample_pdf(pages, 200.0, 160.0).unwrap();
        session.load_document("report_1700000000", bytes).unwrap();
        (session, collaborator)
    }

    fn click(session: &mut EditorSession, at: Point) {
        session.handle_event(&PointerEvent::press(at).into());
        session.handle_event(&PointerEvent::release(at).into());
    }

    /// Enter Edit on an empty page, add "Hello" and click it into a single selection.
    fn select_hello(session: &mut EditorSession) -> NodeId {
        assert_eq!(session.toggle_edit_mode(), Some(EditMode::Edit));
        let id = session.add_text("Hello").unwrap().unwrap();
        click(session, Point::new(60.0, 60.0));
        assert_eq!(session.scene().selection().selected(), vec![id]);
        id
    }

    #[test]
    fn test_load_renders_first_page_with_matching_overlay() {
        let (session, _) = loaded(3);
        let doc = session.document().unwrap();
        assert_eq!(doc.current_page(), 1);
        assert_eq!(doc.page_count(), 3);
        assert_eq!(session.page_surface().size(), (300, 240));
        assert_eq!(session.overlay().size(), session.page_surface().size());
        assert!(session.annotations_visible());
        assert!(session.scene().is_empty());
    }

    #[test]
    fn test_overlay_matches_page_on_every_page() {
        let (mut session, _) = loaded(3);
        for page in 1..=3 {
            session.go_to_page(page).unwrap();
            assert_eq!(session.overlay().size(), session.page_surface().size());
        }
    }

    #[test]
    fn test_navigation_clears_scene_and_selection() {
        let (mut session, _) = loaded(2);
        session.add_text("Hello").unwrap();
        session.add_text("World").unwrap();
        session.toggle_edit_mode();
        assert_eq!(session.scene().selection().handle_count(), 1);

        session.next_page().unwrap();
        assert_eq!(session.document().unwrap().current_page(), 2);
        assert!(session.scene().is_empty());
        assert_eq!(session.scene().selection().state(), &SelectionState::Empty);
        assert!(!session.overlay().image().pixels().any(|p| p.0[3] != 0));
    }

    #[test]
    fn test_page_out_of_range() {
        let (mut session, _) = loaded(2);
        assert_eq!(
            session.go_to_page(3),
            Err(EditorError::PageOutOfRange { page: 3, page_count: 2 })
        );
        assert_eq!(session.document().unwrap().current_page(), 1);
        session.previous_page().unwrap();
        assert_eq!(session.document().unwrap().current_page(), 1);
    }

    #[test]
    fn test_render_queue_keeps_latest_request() {
        let (mut session, _) = loaded(4);
        assert_eq!(session.request_page(2).unwrap(), RenderStatus::Started(2));
        assert_eq!(session.request_page(3).unwrap(), RenderStatus::Queued(3));
        assert_eq!(session.request_page(4).unwrap(), RenderStatus::Queued(4));

        assert_eq!(session.poll_render().unwrap(), Some(2));
        assert_eq!(session.document().unwrap().current_page(), 2);
        assert_eq!(session.poll_render().unwrap(), Some(4));
        assert_eq!(session.document().unwrap().current_page(), 4);
        assert_eq!(session.poll_render().unwrap(), None);
    }

    #[test]
    fn test_failed_load_hides_annotations() {
        let (mut session, _) = loaded(1);
        let err = session.load_document("broken", b"garbage".to_vec()).unwrap_err();
        assert!(matches!(err, EditorError::Load(_)));
        assert!(!session.annotations_visible());
        assert!(session.document().is_none());
        assert!(!session.has_stage());

        // Still usable afterwards.
        session
            .load_document("fixed", sample_pdf(1, 100.0, 100.0).unwrap())
            .unwrap();
        assert!(session.annotations_visible());
    }

    #[test]
    fn test_oversized_image_is_capped() {
        let (mut session, _) = loaded(1);
        let bitmap = Bitmap::new(RgbaImage::from_pixel(800, 400, Rgba([0, 128, 0, 255])));
        let id = session.add_image(bitmap).unwrap();
        let size = session.scene().get(id).unwrap().size();
        assert!((size.width - 150.0).abs() < 1e-9);
        assert!((size.height - 75.0).abs() < 1e-9);
        assert_eq!(session.scene().get(id).unwrap().position(), Point::new(50.0, 50.0));
    }

    #[test]
    fn test_bad_image_file_is_decode_error() {
        let (mut session, _) = loaded(1);
        let err = session.add_image_file("cat.png", b"nope").unwrap_err();
        assert!(matches!(err, EditorError::Decode { ref name, .. } if name == "cat.png"));
        assert!(session.scene().is_empty());
    }

    #[test]
    fn test_adding_without_stage_is_not_ready() {
        let (mut session, _) = session();
        assert_eq!(
            session.add_text("Hello"),
            Err(EditorError::NotReady(NotReadyReason::NoDocument))
        );
        assert_eq!(session.toggle_edit_mode(), None);
        assert_eq!(session.mode(), EditMode::View);
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let (mut session, _) = loaded(1);
        assert_eq!(session.add_text("   ").unwrap(), None);
        assert!(session.scene().is_empty());
    }

    #[test]
    fn test_delete_selected_node() {
        let (mut session, _) = loaded(1);
        select_hello(&mut session);

        assert!(session.handle_event(&KeyEvent::Pressed("Backspace".to_string()).into()));
        assert!(session.scene().is_empty());
        assert_eq!(session.scene().selection().handle_count(), 0);
    }

    #[test]
    fn test_toggle_off_removes_handle() {
        let (mut session, _) = loaded(1);
        session.add_text("Hello").unwrap();
        assert_eq!(session.toggle_edit_mode(), Some(EditMode::Edit));
        assert!(session.overlay().image().pixels().any(|p| *p == YELLOW));
        assert_eq!(session.toggle_edit_mode(), Some(EditMode::View));
        assert_eq!(session.scene().selection().handle_count(), 0);
        assert!(!session.overlay().image().pixels().any(|p| *p == YELLOW));
    }

    #[test]
    fn test_export_hello_without_handles() {
        let (mut session, collaborator) = loaded(1);
        select_hello(&mut session);
        assert_eq!(session.scene().selection().handle_count(), 1);

        let url = pollster::block_on(session.export()).unwrap();
        assert_eq!(url, "memory://annotated/annotated_report_1700000000.png");
        assert_eq!(session.last_export_url(), Some(url.as_str()));

        let exports = collaborator.exports();
        assert_eq!(exports.len(), 1);
        let png = exports[0]
            .image_data
            .strip_prefix(pdfmark_core::PNG_DATA_URL_PREFIX)
            .unwrap();
        let png = BASE64_STANDARD.decode(png).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), session.page_surface().size());

        // 'H' top-left pixel at the default position, page paper elsewhere.
        assert_eq!(*image.get_pixel(50, 50), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(55, 50), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(20, 200), Rgba([255, 255, 255, 255]));
        assert!(!image.pixels().any(|p| *p == YELLOW));

        // The handle is back on the live overlay.
        assert_eq!(session.scene().selection().handle_count(), 1);
        assert!(session.scene().selection().handle().unwrap().is_visible());
        assert!(session.overlay().image().pixels().any(|p| *p == YELLOW));
    }

    #[test]
    fn test_export_without_document_sends_nothing() {
        let (mut session, collaborator) = session();
        assert_eq!(
            pollster::block_on(session.export()),
            Err(EditorError::NotReady(NotReadyReason::NoDocument))
        );
        assert_eq!(collaborator.request_count(), 0);
    }

    #[test]
    fn test_failed_export_keeps_scene() {
        let (mut session, collaborator) = loaded(1);
        session.add_text("Hello").unwrap();
        collaborator.fail_with(NetworkError::from_status(500, None));

        let err = pollster::block_on(session.export()).unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 500");
        assert_eq!(session.scene().len(), 1);
        assert_eq!(session.last_export_url(), None);

        collaborator.recover();
        assert!(pollster::block_on(session.export()).is_ok());
    }

    #[test]
    fn test_upload_opens_document() {
        let (mut session, collaborator) = session();
        let bytes = sample_pdf(2, 100.0, 100.0).unwrap();
        pollster::block_on(session.upload("report.pdf", bytes)).unwrap();
        let doc = session.document().unwrap();
        assert_eq!(doc.id, "report");
        assert_eq!(doc.pdf_url.as_deref(), Some("memory://pdfs/report.pdf"));
        assert_eq!(doc.page_count(), 2);
        assert_eq!(collaborator.uploads().len(), 1);
    }

    #[test]
    fn test_upload_with_invalid_response() {
        init_logger();
        let collaborator = Arc::new(
            MemoryCollaborator::new().with_upload_response(UploadResponse {
                pdf_url: Some("memory://pdfs/x.pdf".to_string()),
                filename: None,
            }),
        );
        let mut session = EditorSession::new(EditorConfig::default(), collaborator);
        let err = pollster::block_on(session.upload("x.pdf", sample_pdf(1, 10.0, 10.0).unwrap()))
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_UPLOAD_RESPONSE);
        assert!(session.document().is_none());
    }

    #[test]
    fn test_composite_restores_hidden_handle() {
        let (mut session, _) = loaded(1);
        session.add_text("Hello").unwrap();
        session.toggle_edit_mode();
        let flattened = session.composite().unwrap();
        assert!(!flattened.image().pixels().any(|p| *p == YELLOW));
        assert!(session.scene().selection().handle().unwrap().is_visible());
    }

    #[test]
    fn test_overlay_matches_page_at_every_scale() {
        init_logger();
        let bytes = sample_pdf(3, 201.0, 157.0).unwrap();
        for render_scale in [0.5, 1.0, 1.3, 2.25] {
            let config = EditorConfig {
                render_scale,
                ..EditorConfig::default()
            };
            let mut session = EditorSession::new(config, Arc::new(MemoryCollaborator::new()));
            session.load_document("scaled", bytes.clone()).unwrap();
            let expected = (
                (201.0 * render_scale).round() as u32,
                (157.0 * render_scale).round() as u32,
            );
            for page in 1..=3 {
                session.go_to_page(page).unwrap();
                assert_eq!(session.page_surface().size(), expected, "scale {render_scale}");
                assert_eq!(session.overlay().size(), session.page_surface().size());
            }
        }
    }

    #[test]
    fn test_oversized_page_fails_to_load() {
        let (mut session, _) = loaded(1);
        let err = session
            .load_document("huge", sample_pdf(1, 1e9, 1e9).unwrap())
            .unwrap_err();
        assert!(matches!(err, EditorError::Load(_)));
        assert!(session.document().is_none());
        assert!(!session.annotations_visible());
        assert!(session.page_surface().is_empty());
        assert!(session.overlay().is_empty());

        session
            .load_document("fixed", sample_pdf(1, 100.0, 100.0).unwrap())
            .unwrap();
        assert_eq!(session.page_surface().size(), (150, 150));
    }

    #[test]
    fn test_background_click_leaves_bulk_for_single_selection() {
        let (mut session, _) = loaded(1);
        let hello = session.add_text("Hello").unwrap().unwrap();
        let world = session.add_text("World").unwrap().unwrap();
        assert_eq!(session.toggle_edit_mode(), Some(EditMode::Edit));
        assert!(session.scene().selection().is_bulk());

        click(&mut session, Point::new(380.0, 580.0));
        assert_eq!(session.scene().selection().state(), &SelectionState::Empty);

        // Both sit at the default position; the newest is on top.
        click(&mut session, Point::new(60.0, 60.0));
        assert!(!session.scene().selection().is_bulk());
        assert_eq!(session.scene().selection().selected(), vec![world]);
        assert!(session.overlay().image().pixels().any(|p| *p == YELLOW));

        assert!(session.handle_event(&KeyEvent::Pressed("Delete".to_string()).into()));
        assert_eq!(session.scene().ids(), &[hello]);
        assert_eq!(session.scene().selection().handle_count(), 0);
    }

    #[test]
    fn test_default_backend_opens_documents() {
        let (mut session, _) = session();
        session
            .load_document("report", sample_pdf(2, 200.0, 160.0).unwrap())
            .unwrap();
        assert_eq!(session.document().unwrap().page_count(), 2);
        assert_eq!(session.page_surface().size(), (300, 240));
    }
}
