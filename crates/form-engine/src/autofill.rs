//! Autofill engine: populate empty fields from the stored profile

use crate::mapper::map_canonical;
use shared_types::{ApplicantProfile, CanonicalKey, DestinationContext, FieldDefinition, FieldSource};

/// Result of one autofill pass, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutofillOutcome {
    /// Number of fields whose value was written by this pass.
    pub filled: usize,
}

/// Fill empty fields whose canonical identity resolves to a non-empty
/// profile value.
///
/// Values already present are never overwritten: autofill only writes
/// fields whose current trimmed value is empty, which also makes the
/// pass idempotent. Persistence is the draft component's concern, not
/// this one's.
pub fn apply_autofill(
    fields: &mut [FieldDefinition],
    profile: &ApplicantProfile,
    ctx: &DestinationContext,
) -> AutofillOutcome {
    let mut filled = 0usize;

    for field in fields.iter_mut() {
        if field.is_filled() {
            continue;
        }
        let Some(key) = map_canonical(&field.name, &field.label) else {
            continue;
        };
        let value = match key {
            CanonicalKey::FullName => profile.full_name(),
            other => profile.autofill_value(other).map(|v| v.to_string()),
        };
        let Some(value) = value else { continue };

        field.value = value;
        field.source = FieldSource::Profile;
        filled += 1;
    }

    tracing::info!(
        filled,
        country = %ctx.country,
        visa_type = %ctx.visa_type,
        "autofill pass complete"
    );

    AutofillOutcome { filled }
}
