//! Document Intelligence collaborator interface
//!
//! An external document-intelligence pass can supply per-position field
//! labels with confidence scores plus an optional markdown transcript.
//! Only the extractor consumes this; running without it is always valid.

use crate::overlay::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A label detected at a position on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedLabel {
    /// 1-based page number.
    pub page: u32,
    /// Position in PDF points, bottom-left origin.
    pub rect: Rect,
    pub text: String,
    /// 0.0..=1.0; the extractor only trusts labels at or above its
    /// confidence threshold.
    pub confidence: f64,
    /// Field type hint from the analysis service, when it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Result of a document-intelligence analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    #[serde(default)]
    pub labels: Vec<DetectedLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
}

#[derive(Error, Debug)]
pub enum IntelError {
    #[error("document intelligence service unavailable: {0}")]
    Unavailable(String),

    #[error("document intelligence returned an unreadable result: {0}")]
    BadResponse(String),
}

/// External document-intelligence service.
pub trait DocumentIntelligence {
    /// Analyze raw document bytes, optionally hinted with the visa type.
    fn analyze(
        &self,
        bytes: &[u8],
        visa_type_hint: Option<&str>,
    ) -> Result<DocumentAnalysis, IntelError>;
}

/// No-op collaborator: extraction proceeds on name heuristics alone.
pub struct NoopIntelligence;

impl DocumentIntelligence for NoopIntelligence {
    fn analyze(
        &self,
        _bytes: &[u8],
        _visa_type_hint: Option<&str>,
    ) -> Result<DocumentAnalysis, IntelError> {
        Ok(DocumentAnalysis::default())
    }
}
