//! Structured validation: the local, deterministic pass
//!
//! Builds a canonical key → value map from the live field list (with a
//! group-level fallback for values split across character boxes), then
//! applies the destination's rule set: mandatory presence, date
//! layout, passport validity window.

use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{
    CanonicalKey, DestinationContext, FieldDefinition, IssueKind, IssueSource, ValidationIssue,
};
use std::collections::HashMap;

use crate::grouper::partition;
use crate::mapper::map_canonical;
use crate::validate::rules::{rules_for, CountryRuleSet};
use crate::validate::FieldContextResolver;

/// Result of one structured pass. Regenerated whole on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReport {
    pub overall_score: u8,
    pub completed_groups: usize,
    pub total_groups: usize,
    pub issues: Vec<ValidationIssue>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone)]
struct ResolvedValue {
    value: String,
    /// Name of the field (or first group member) the value came from.
    field_key: String,
}

const DATE_KEYS: &[CanonicalKey] = &[
    CanonicalKey::DateOfBirth,
    CanonicalKey::PassportIssueDate,
    CanonicalKey::PassportExpiryDate,
    CanonicalKey::ArrivalDate,
    CanonicalKey::DepartureDate,
];

fn is_date_key(key: CanonicalKey) -> bool {
    DATE_KEYS.contains(&key)
}

/// Canonical key → value map over the current fields.
///
/// Per-field mapping runs first (name, then label). Groups with more
/// than one member then override: a split value is reassembled from
/// its members, date segments joined with `/` so day/month/year boxes
/// come out as one parseable date.
pub fn canonical_values(fields: &[FieldDefinition]) -> HashMap<CanonicalKey, String> {
    resolved_values(fields)
        .into_iter()
        .map(|(key, resolved)| (key, resolved.value))
        .collect()
}

fn resolved_values(fields: &[FieldDefinition]) -> HashMap<CanonicalKey, ResolvedValue> {
    let mut map: HashMap<CanonicalKey, ResolvedValue> = HashMap::new();

    for field in fields {
        let Some(key) = map_canonical(&field.name, &field.label) else {
            continue;
        };
        let candidate = ResolvedValue {
            value: field.value.trim().to_string(),
            field_key: field.name.clone(),
        };
        match map.get(&key) {
            // First mapped field wins unless it was empty and this one is not.
            Some(existing) if !existing.value.is_empty() => {}
            _ if candidate.value.is_empty() && map.contains_key(&key) => {}
            _ => {
                map.insert(key, candidate);
            }
        }
    }

    for group in partition(fields) {
        if group.members.len() < 2 {
            continue;
        }
        let Some(key) = map_canonical(&group.key, "") else {
            continue;
        };
        let segments: Vec<&str> = group
            .members
            .iter()
            .filter_map(|name| fields.iter().find(|f| &f.name == name))
            .map(|f| f.value.trim())
            .filter(|v| !v.is_empty())
            .collect();
        if segments.is_empty() {
            continue;
        }
        let joined = if is_date_key(key) {
            segments.join("/")
        } else {
            segments.concat()
        };
        let field_key = group.members[0].clone();
        map.insert(
            key,
            ResolvedValue {
                value: joined,
                field_key,
            },
        );
    }

    map
}

/// Run the structured pass against today's date.
pub fn run_structured_validation(
    fields: &[FieldDefinition],
    ctx: &DestinationContext,
) -> StructuredReport {
    run_structured_validation_at(fields, ctx, Utc::now().date_naive())
}

pub(crate) fn run_structured_validation_at(
    fields: &[FieldDefinition],
    ctx: &DestinationContext,
    today: NaiveDate,
) -> StructuredReport {
    let rules = rules_for(&ctx.country);
    let resolver = FieldContextResolver::new(fields);
    let values = resolved_values(fields);

    let groups = partition(fields);
    let total_groups = groups.len();
    let completed_groups = groups.iter().filter(|g| g.filled).count();
    let overall_score = crate::grouper::completion_percentage(fields);

    let mut issues = Vec::new();
    check_mandatory(&rules, &values, &resolver, &mut issues);
    check_dates(&rules, &values, &resolver, &mut issues);
    check_passport_validity(&rules, &values, &resolver, today, &mut issues);

    let mut recommendations: Vec<String> = rules.notes.iter().map(|n| n.to_string()).collect();
    if completed_groups < total_groups {
        recommendations.push(format!(
            "{} of {} sections are still empty; complete them before submitting",
            total_groups - completed_groups,
            total_groups
        ));
    }

    tracing::info!(
        country = %ctx.country,
        score = overall_score,
        issues = issues.len(),
        "structured validation complete"
    );

    StructuredReport {
        overall_score,
        completed_groups,
        total_groups,
        issues,
        recommendations,
    }
}

fn display_name(resolver: &FieldContextResolver, key: CanonicalKey, field_key: &str) -> String {
    resolver
        .display_name(field_key)
        .map(str::to_string)
        .unwrap_or_else(|| key.display_name().to_string())
}

fn check_mandatory(
    rules: &CountryRuleSet,
    values: &HashMap<CanonicalKey, ResolvedValue>,
    resolver: &FieldContextResolver,
    issues: &mut Vec<ValidationIssue>,
) {
    for &key in rules.mandatory {
        match values.get(&key) {
            Some(resolved) if !resolved.value.is_empty() => {}
            Some(resolved) => {
                let issue = ValidationIssue::new(
                    display_name(resolver, key, &resolved.field_key),
                    IssueKind::Error,
                    format!("{} is required", key.display_name()),
                    IssueSource::Structured,
                )
                .with_field_key(resolved.field_key.clone());
                issues.push(issue);
            }
            None => {
                issues.push(ValidationIssue::new(
                    key.display_name(),
                    IssueKind::Error,
                    format!("{} is required", key.display_name()),
                    IssueSource::Structured,
                ));
            }
        }
    }
}

fn check_dates(
    rules: &CountryRuleSet,
    values: &HashMap<CanonicalKey, ResolvedValue>,
    resolver: &FieldContextResolver,
    issues: &mut Vec<ValidationIssue>,
) {
    for &key in DATE_KEYS {
        let Some(resolved) = values.get(&key) else {
            continue;
        };
        if resolved.value.is_empty() || rules.date_format.parse(&resolved.value).is_some() {
            continue;
        }
        let issue = ValidationIssue::new(
            display_name(resolver, key, &resolved.field_key),
            IssueKind::Error,
            format!(
                "{} does not match the expected {} format",
                key.display_name(),
                rules.date_format.hint()
            ),
            IssueSource::Structured,
        )
        .with_field_key(resolved.field_key.clone())
        .with_actual_value(resolved.value.clone())
        .with_suggestion(format!("Enter the date as {}", rules.date_format.hint()));
        issues.push(issue);
    }
}

fn check_passport_validity(
    rules: &CountryRuleSet,
    values: &HashMap<CanonicalKey, ResolvedValue>,
    resolver: &FieldContextResolver,
    today: NaiveDate,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(resolved) = values.get(&CanonicalKey::PassportExpiryDate) else {
        return;
    };
    let Some(expiry) = rules.date_format.parse(&resolved.value) else {
        // Unparseable values are already flagged by the date check.
        return;
    };

    let name = display_name(resolver, CanonicalKey::PassportExpiryDate, &resolved.field_key);

    if expiry < today {
        issues.push(
            ValidationIssue::new(
                name,
                IssueKind::Error,
                "Passport has expired",
                IssueSource::Structured,
            )
            .with_field_key(resolved.field_key.clone())
            .with_actual_value(resolved.value.clone()),
        );
        return;
    }

    // Validity window counts from the departure date when one is given.
    let reference = values
        .get(&CanonicalKey::DepartureDate)
        .and_then(|d| rules.date_format.parse(&d.value))
        .unwrap_or(today);
    let required = reference.checked_add_months(Months::new(rules.passport_validity_months));

    if let Some(required) = required {
        if expiry < required {
            issues.push(
                ValidationIssue::new(
                    name,
                    IssueKind::Warning,
                    format!(
                        "Passport should remain valid for at least {} months beyond your travel dates",
                        rules.passport_validity_months
                    ),
                    IssueSource::Structured,
                )
                .with_field_key(resolved.field_key.clone())
                .with_actual_value(resolved.value.clone()),
            );
        }
    }
}
