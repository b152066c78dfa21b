//! pdfmark Application
//!
//! The editor session: one object owning the loaded document, the page and
//! overlay surfaces, the annotation scene and the render queue, plus export
//! packaging for the storage collaborator.

mod export;
mod session;

pub use export::{encode_png, export_request};
pub use session::{EditorSession, RenderStatus};
