//! Shared data model for the form intelligence engine
//!
//! Everything that crosses a crate boundary lives here: field
//! definitions extracted from a PDF, the canonical key vocabulary,
//! validation issues, draft snapshots and the applicant profile.

pub mod draft;
pub mod field;
pub mod profile;
pub mod validation;

pub use draft::{DraftSnapshot, DraftStatus, VersionEntry};
pub use field::{FieldAppearance, FieldDefinition, FieldKind, FieldSource};
pub use profile::{ApplicantProfile, DestinationContext};
pub use validation::{CanonicalKey, IssueKind, IssueSource, ValidationIssue};
