//! Draft snapshots and version history

use crate::field::FieldDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a persisted draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Draft,
    Completed,
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftStatus::Draft => write!(f, "draft"),
            DraftStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One entry of a draft's bounded, most-recent-first version history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub snapshot_id: String,
    pub saved_at: DateTime<Utc>,
    pub completion_percentage: u8,
}

/// A persisted, resumable filling session for one uploaded document.
///
/// `form_id` is assigned on the first successful remote save; before
/// that the draft exists only in local memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub form_id: String,
    pub file_name: String,
    pub fields: Vec<FieldDefinition>,
    pub updated_at: DateTime<Utc>,
    pub status: DraftStatus,
    pub completion_percentage: u8,
    /// Most-recent-first, bounded by the store.
    #[serde(default)]
    pub version_history: Vec<VersionEntry>,
}
