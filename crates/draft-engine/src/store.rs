//! Draft store abstraction and in-memory double
//!
//! The session layer talks to persistence only through [`DraftStore`],
//! so the HTTP client and the in-memory double are interchangeable.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared_types::{DraftSnapshot, DraftStatus, FieldDefinition, VersionEntry};

use crate::error::DraftError;
use form_engine::completion_percentage;

/// Version history is bounded; oldest entries fall off.
pub const VERSION_HISTORY_LIMIT: usize = 20;

/// One save, as the store sees it. `pdf_bytes` travels only on the
/// first save of a session; `form_id` is absent until the store has
/// assigned one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub form_id: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_bytes: Option<Vec<u8>>,
    pub country: String,
    pub visa_type: String,
}

/// What the store answers a save with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub form_id: String,
    pub version_id: String,
    /// Most-recent-first version history after this save.
    pub versions: Vec<VersionEntry>,
    pub persisted: bool,
}

pub trait DraftStore {
    fn list_drafts(&self)
        -> impl Future<Output = Result<Vec<DraftSnapshot>, DraftError>> + Send;

    fn get_draft(
        &self,
        form_id: &str,
    ) -> impl Future<Output = Result<DraftSnapshot, DraftError>> + Send;

    fn save_draft(
        &self,
        request: SaveRequest,
    ) -> impl Future<Output = Result<SaveReceipt, DraftError>> + Send;

    fn restore_version(
        &self,
        form_id: &str,
        version_id: &str,
    ) -> impl Future<Output = Result<DraftSnapshot, DraftError>> + Send;

    fn update_status(
        &self,
        form_id: &str,
        status: DraftStatus,
    ) -> impl Future<Output = Result<(), DraftError>> + Send;

    fn delete_draft(&self, form_id: &str)
        -> impl Future<Output = Result<(), DraftError>> + Send;
}

#[derive(Debug)]
struct StoredDraft {
    snapshot: DraftSnapshot,
    /// Field snapshots per version id, for restore.
    field_versions: HashMap<String, Vec<FieldDefinition>>,
    has_pdf: bool,
}

/// In-memory store for tests and offline use.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<String, StoredDraft>>,
    fail_next_save: AtomicBool,
    pdf_payloads: AtomicUsize,
    save_calls: AtomicUsize,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `save_draft` call fail with a transport error.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// How many saves so far carried document bytes.
    pub fn pdf_payload_count(&self) -> usize {
        self.pdf_payloads.load(Ordering::SeqCst)
    }

    /// How many `save_draft` calls the store has received, failed
    /// ones included.
    pub fn save_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn has_pdf(&self, form_id: &str) -> bool {
        self.drafts
            .lock()
            .map(|drafts| drafts.get(form_id).is_some_and(|d| d.has_pdf))
            .unwrap_or(false)
    }
}

impl DraftStore for MemoryDraftStore {
    async fn list_drafts(&self) -> Result<Vec<DraftSnapshot>, DraftError> {
        let drafts = self
            .drafts
            .lock()
            .map_err(|_| DraftError::Transport("store poisoned".into()))?;
        let mut all: Vec<DraftSnapshot> =
            drafts.values().map(|d| d.snapshot.clone()).collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    async fn get_draft(&self, form_id: &str) -> Result<DraftSnapshot, DraftError> {
        let drafts = self
            .drafts
            .lock()
            .map_err(|_| DraftError::Transport("store poisoned".into()))?;
        drafts
            .get(form_id)
            .map(|d| d.snapshot.clone())
            .ok_or_else(|| DraftError::NotFound(form_id.to_string()))
    }

    async fn save_draft(&self, request: SaveRequest) -> Result<SaveReceipt, DraftError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(DraftError::Transport("injected save failure".into()));
        }

        let mut drafts = self
            .drafts
            .lock()
            .map_err(|_| DraftError::Transport("store poisoned".into()))?;

        let form_id = request
            .form_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let version_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let completion = completion_percentage(&request.fields);

        let entry = drafts.entry(form_id.clone()).or_insert_with(|| StoredDraft {
            snapshot: DraftSnapshot {
                form_id: form_id.clone(),
                file_name: request.file_name.clone(),
                fields: Vec::new(),
                updated_at: now,
                status: DraftStatus::Draft,
                completion_percentage: 0,
                version_history: Vec::new(),
            },
            field_versions: HashMap::new(),
            has_pdf: false,
        });

        entry.snapshot.fields = request.fields.clone();
        entry.snapshot.file_name = request.file_name;
        entry.snapshot.updated_at = now;
        entry.snapshot.completion_percentage = completion;
        entry.snapshot.version_history.insert(
            0,
            VersionEntry {
                snapshot_id: version_id.clone(),
                saved_at: now,
                completion_percentage: completion,
            },
        );
        entry.snapshot.version_history.truncate(VERSION_HISTORY_LIMIT);
        entry
            .field_versions
            .insert(version_id.clone(), request.fields);
        if request.pdf_bytes.is_some() {
            entry.has_pdf = true;
            self.pdf_payloads.fetch_add(1, Ordering::SeqCst);
        }

        Ok(SaveReceipt {
            form_id,
            version_id,
            versions: entry.snapshot.version_history.clone(),
            persisted: true,
        })
    }

    async fn restore_version(
        &self,
        form_id: &str,
        version_id: &str,
    ) -> Result<DraftSnapshot, DraftError> {
        let mut drafts = self
            .drafts
            .lock()
            .map_err(|_| DraftError::Transport("store poisoned".into()))?;
        let entry = drafts
            .get_mut(form_id)
            .ok_or_else(|| DraftError::NotFound(form_id.to_string()))?;
        let fields = entry
            .field_versions
            .get(version_id)
            .cloned()
            .ok_or_else(|| DraftError::RestoreFailed(format!("unknown version {version_id}")))?;

        entry.snapshot.fields = fields;
        entry.snapshot.completion_percentage = completion_percentage(&entry.snapshot.fields);
        entry.snapshot.updated_at = Utc::now();
        Ok(entry.snapshot.clone())
    }

    async fn update_status(&self, form_id: &str, status: DraftStatus) -> Result<(), DraftError> {
        let mut drafts = self
            .drafts
            .lock()
            .map_err(|_| DraftError::Transport("store poisoned".into()))?;
        let entry = drafts
            .get_mut(form_id)
            .ok_or_else(|| DraftError::NotFound(form_id.to_string()))?;
        entry.snapshot.status = status;
        entry.snapshot.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_draft(&self, form_id: &str) -> Result<(), DraftError> {
        let mut drafts = self
            .drafts
            .lock()
            .map_err(|_| DraftError::Transport("store poisoned".into()))?;
        drafts
            .remove(form_id)
            .map(|_| ())
            .ok_or_else(|| DraftError::NotFound(form_id.to_string()))
    }
}
