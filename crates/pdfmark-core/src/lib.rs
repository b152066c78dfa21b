//! pdfmark Core Library
//!
//! Platform-agnostic data model for the pdfmark annotation editor: the loaded
//! document, annotation nodes, the scene they live in, and the selection state
//! machine that drives transform handles.

pub mod config;
pub mod document;
pub mod error;
pub mod input;
pub mod manipulation;
pub mod nodes;
pub mod remote;
pub mod scene;
pub mod selection;

pub use config::EditorConfig;
pub use document::Document;
pub use error::{EditorError, EditorResult, NetworkError, NotReadyReason};
pub use input::{InputEvent, KeyEvent, PointerEvent};
pub use nodes::{AnnotationNode, Bitmap, ImageNode, NodeId, SerializableColor, TextNode};
pub use remote::{
    Collaborator, ErrorBody, ExportRequest, ExportResponse, HttpCollaborator, MemoryCollaborator,
    PNG_DATA_URL_PREFIX, UploadResponse,
};
pub use scene::AnnotationScene;
pub use selection::{
    EditMode, HandleFrame, HandleKind, SelectionController, SelectionState, TransformHandle,
};
