//! Semantic layer of the form intelligence engine
//!
//! Maps raw field names to canonical identities, groups character-box
//! runs into logical units, auto-populates values from a stored
//! profile, and validates the populated document against
//! destination-specific rules.

pub mod autofill;
pub mod cache;
pub mod grouper;
pub mod mapper;
pub mod validate;

pub use autofill::{apply_autofill, AutofillOutcome};
pub use cache::TtlCache;
pub use grouper::{completion_percentage, group_key, partition, FieldGroup};
pub use mapper::map_canonical;
pub use validate::{
    run_structured_validation, run_vision_validation, CachingVisionValidator,
    FieldContextResolver, HttpVisionValidator, StructuredReport, ValidationReport, VisionOutcome,
    VisionReport, VisionRequest, VisionValidator,
};
