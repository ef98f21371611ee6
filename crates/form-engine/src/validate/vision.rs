//! Vision validation: the optional, externally delegated pass
//!
//! Page images and the structured value map go out to an analysis
//! service; a JSON verdict comes back. The service cannot see
//! logical-group boundaries, so its field counts are reconciled
//! against the locally computed ones before the report is surfaced.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use shared_types::{CanonicalKey, IssueKind, IssueSource, ValidationIssue};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::validate::FieldContextResolver;

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("vision service unreachable: {0}")]
    Unreachable(String),
    #[error("vision service returned an unusable response: {0}")]
    BadResponse(String),
}

impl From<reqwest::Error> for VisionError {
    fn from(err: reqwest::Error) -> Self {
        VisionError::Unreachable(err.to_string())
    }
}

/// What the service receives: rasterized pages plus the structured
/// view of what we believe is on them.
#[derive(Debug)]
pub struct VisionRequest<'a> {
    pub page_images: &'a [Vec<u8>],
    pub values: &'a HashMap<CanonicalKey, String>,
    pub country: &'a str,
    /// Synthesized document bytes, when the caller has them.
    pub filled_document: Option<&'a [u8]>,
}

/// Parsed verdict of one vision pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionReport {
    pub overall_score: u8,
    pub completed_fields: usize,
    pub total_fields: usize,
    pub issues: Vec<ValidationIssue>,
    pub recommendations: Vec<String>,
    pub country_specific_notes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    #[serde(default)]
    overall_score: f64,
    #[serde(default)]
    completed_fields: usize,
    #[serde(default)]
    total_fields: usize,
    #[serde(default)]
    issues: Vec<RawIssue>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    country_specific_notes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIssue {
    field_name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    message: String,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default)]
    actual_value: Option<String>,
}

fn issue_kind(raw: Option<&str>) -> IssueKind {
    match raw {
        Some("error") => IssueKind::Error,
        Some("warning") => IssueKind::Warning,
        _ => IssueKind::Info,
    }
}

pub(crate) fn parse_response(body: &str) -> Result<VisionReport, VisionError> {
    let raw: RawResponse =
        serde_json::from_str(body).map_err(|e| VisionError::BadResponse(e.to_string()))?;

    let issues = raw
        .issues
        .into_iter()
        .map(|issue| {
            let mut out = ValidationIssue::new(
                issue.field_name,
                issue_kind(issue.kind.as_deref()),
                issue.message,
                IssueSource::Vision,
            );
            out.suggestion = issue.suggestion;
            out.actual_value = issue.actual_value;
            out
        })
        .collect();

    Ok(VisionReport {
        overall_score: raw.overall_score.round().clamp(0.0, 100.0) as u8,
        completed_fields: raw.completed_fields,
        total_fields: raw.total_fields,
        issues,
        recommendations: raw.recommendations,
        country_specific_notes: raw.country_specific_notes,
    })
}

/// Point vision issues back at their source fields so the UI can
/// navigate to them, the same way structured issues are resolved.
pub(crate) fn attach_field_keys(report: &mut VisionReport, resolver: &FieldContextResolver) {
    for issue in &mut report.issues {
        if issue.field_key.is_none() {
            issue.field_key = resolver.resolve(&issue.field_name).map(str::to_string);
        }
    }
}

/// Local group counts win when the service disagrees; it counts raw
/// widgets, not logical groups.
pub(crate) fn reconcile_with_groups(
    report: &mut VisionReport,
    completed_groups: usize,
    total_groups: usize,
) {
    if report.total_fields == total_groups && report.completed_fields == completed_groups {
        return;
    }
    tracing::debug!(
        reported_total = report.total_fields,
        reported_completed = report.completed_fields,
        total_groups,
        completed_groups,
        "vision counts disagree with local groups; using local counts"
    );
    report.total_fields = total_groups;
    report.completed_fields = completed_groups;
    report.overall_score = if total_groups == 0 {
        0
    } else {
        ((completed_groups as f64 / total_groups as f64) * 100.0).round() as u8
    };
}

/// Pluggable vision transport.
pub trait VisionValidator {
    fn validate(
        &self,
        request: &VisionRequest<'_>,
    ) -> impl std::future::Future<Output = Result<VisionReport, VisionError>> + Send;
}

/// HTTP transport for the vision service.
#[derive(Debug, Clone)]
pub struct HttpVisionValidator {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePayload<'a> {
    images: Vec<String>,
    values: &'a HashMap<CanonicalKey, String>,
    country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filled_document: Option<String>,
}

impl HttpVisionValidator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl VisionValidator for HttpVisionValidator {
    async fn validate(&self, request: &VisionRequest<'_>) -> Result<VisionReport, VisionError> {
        let payload = WirePayload {
            images: request
                .page_images
                .iter()
                .map(|img| BASE64.encode(img))
                .collect(),
            values: request.values,
            country: request.country,
            filled_document: request.filled_document.map(|bytes| BASE64.encode(bytes)),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::Unreachable(format!(
                "vision endpoint answered {status}"
            )));
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

/// Destination-keyed TTL cache in front of a transport. The periodic
/// auto-validation timer re-runs the pass over values that often have
/// not changed; inside the TTL the last verdict is reused instead of
/// re-hitting the service. Failures are never cached.
#[derive(Debug)]
pub struct CachingVisionValidator<V> {
    inner: V,
    cache: Mutex<TtlCache<String, VisionReport>>,
}

impl<V> CachingVisionValidator<V> {
    pub fn new(inner: V, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Mutex::new(TtlCache::new(ttl)),
        }
    }

    fn cache_key(request: &VisionRequest<'_>) -> String {
        let mut parts: Vec<String> = request
            .values
            .iter()
            .map(|(key, value)| format!("{key:?}={value}"))
            .collect();
        parts.sort();
        format!(
            "{}|{}|{}",
            request.country,
            request.page_images.len(),
            parts.join("|")
        )
    }
}

impl<V: VisionValidator + Sync> VisionValidator for CachingVisionValidator<V> {
    async fn validate(&self, request: &VisionRequest<'_>) -> Result<VisionReport, VisionError> {
        let key = Self::cache_key(request);
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(report) = cache.get(&key) {
                tracing::debug!(country = request.country, "reusing cached vision verdict");
                return Ok(report.clone());
            }
        }

        let report = self.inner.validate(request).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, report.clone());
        }
        Ok(report)
    }
}
