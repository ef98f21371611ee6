//! Data models for the draft store API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{DraftSnapshot, DraftStatus, FieldDefinition, VersionEntry};
use sqlx::FromRow;

use crate::error::ApiError;

/// Draft row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct DbDraft {
    pub id: String,
    pub file_name: String,
    pub pdf_data: Option<Vec<u8>>,
    pub fields_json: String,
    pub country: String,
    pub visa_type: String,
    pub status: String,
    pub completion: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Version row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct DbVersion {
    pub id: String,
    pub draft_id: String,
    pub fields_json: String,
    pub completion: i64,
    pub saved_at: DateTime<Utc>,
}

impl DbVersion {
    pub fn entry(&self) -> VersionEntry {
        VersionEntry {
            snapshot_id: self.id.clone(),
            saved_at: self.saved_at,
            completion_percentage: self.completion.clamp(0, 100) as u8,
        }
    }
}

/// Request to save (create or update) a draft.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    #[serde(default)]
    pub form_id: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub file_name: String,
    /// Original document bytes; sent only on the first save.
    #[serde(default)]
    pub pdf_base64: Option<String>,
    pub country: String,
    pub visa_type: String,
}

/// Response to a save: the receipt the session applies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftResponse {
    pub form_id: String,
    pub version_id: String,
    pub versions: Vec<VersionEntry>,
    pub persisted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: DraftStatus,
}

pub fn parse_status(raw: &str) -> DraftStatus {
    match raw {
        "completed" => DraftStatus::Completed,
        _ => DraftStatus::Draft,
    }
}

/// Assemble the wire snapshot from a draft row and its versions.
pub fn snapshot_from(draft: &DbDraft, versions: Vec<VersionEntry>) -> Result<DraftSnapshot, ApiError> {
    let fields: Vec<FieldDefinition> = serde_json::from_str(&draft.fields_json)
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(DraftSnapshot {
        form_id: draft.id.clone(),
        file_name: draft.file_name.clone(),
        fields,
        updated_at: draft.updated_at,
        status: parse_status(&draft.status),
        completion_percentage: draft.completion.clamp(0, 100) as u8,
        version_history: versions,
    })
}
