//! PDF layer of the form intelligence engine
//!
//! This crate owns everything that touches document bytes:
//! - `extract`: AcroForm field extraction into typed `FieldDefinition`s
//! - `write`: writing values back and refreshing appearances for download
//! - `overlay`: widget-annotation geometry and field binding for
//!   direct-manipulation editing
//! - `intel`: the Document Intelligence collaborator interface

pub mod error;
pub mod extract;
pub mod intel;
pub mod label;
pub mod overlay;
mod pdfutil;
pub mod write;

pub use error::FormPdfError;
pub use extract::{extract_fields, extract_with_intelligence, page_count, ExtractedForm};
pub use intel::{DetectedLabel, DocumentAnalysis, DocumentIntelligence, NoopIntelligence};
pub use overlay::{
    bind_annotations, collect_widgets, jump_target, InteractionShape, OverlayBinding, PixelRect,
    Rect, ViewTransform, WidgetAnnotation,
};
pub use write::fill_document;
