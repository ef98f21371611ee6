//! Two-pass validation
//!
//! The structured pass is local and deterministic; the vision pass is
//! delegated to an external service and may be absent or unavailable.
//! The two are carried side by side in [`ValidationReport`] and never
//! silently merged.

use serde::{Deserialize, Serialize};
use shared_types::{FieldDefinition, IssueKind};

pub mod rules;
pub mod structured;
pub mod vision;

pub use structured::{canonical_values, run_structured_validation, StructuredReport};
pub use vision::{
    CachingVisionValidator, HttpVisionValidator, VisionError, VisionReport, VisionRequest,
    VisionValidator,
};

/// Resolves a field's display name and navigable key, shared by both
/// passes so every issue points at its source field the same way.
#[derive(Debug, Clone)]
pub struct FieldContextResolver {
    entries: Vec<(String, String)>,
}

impl FieldContextResolver {
    pub fn new(fields: &[FieldDefinition]) -> Self {
        Self {
            entries: fields
                .iter()
                .map(|f| (f.name.clone(), f.label.clone()))
                .collect(),
        }
    }

    /// Display name for a field key: the label when one exists.
    pub fn display_name(&self, field_key: &str) -> Option<&str> {
        self.entries.iter().find(|(name, _)| name == field_key).map(
            |(name, label)| {
                if label.trim().is_empty() {
                    name.as_str()
                } else {
                    label.as_str()
                }
            },
        )
    }

    /// Field key for a query that may be a raw name or a display label.
    pub fn resolve(&self, query: &str) -> Option<&str> {
        let needle = query.trim();
        self.entries
            .iter()
            .find(|(name, label)| {
                name.eq_ignore_ascii_case(needle) || label.trim().eq_ignore_ascii_case(needle)
            })
            .map(|(name, _)| name.as_str())
    }
}

/// Vision half of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum VisionOutcome {
    /// Caller chose not to run the vision pass.
    NotRequested,
    /// The pass was attempted and failed; the structured half stands.
    Unavailable { reason: String },
    Ready { report: VisionReport },
}

/// One full validation run: both passes, kept apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub structured: StructuredReport,
    pub vision: VisionOutcome,
}

impl ValidationReport {
    /// True when the structured pass found at least one error. A draft
    /// may only transition to completed when this is false; vision
    /// findings are advisory and never block.
    pub fn has_blocking_errors(&self) -> bool {
        self.structured
            .issues
            .iter()
            .any(|issue| issue.kind == IssueKind::Error)
    }
}

/// Drive the vision pass and fold any failure into a soft outcome.
pub async fn run_vision_validation<V: VisionValidator>(
    validator: &V,
    request: &VisionRequest<'_>,
    resolver: &FieldContextResolver,
    completed_groups: usize,
    total_groups: usize,
) -> VisionOutcome {
    match validator.validate(request).await {
        Ok(mut report) => {
            vision::attach_field_keys(&mut report, resolver);
            vision::reconcile_with_groups(&mut report, completed_groups, total_groups);
            VisionOutcome::Ready { report }
        }
        Err(err) => {
            tracing::warn!(error = %err, "vision validation unavailable");
            VisionOutcome::Unavailable {
                reason: err.to_string(),
            }
        }
    }
}
