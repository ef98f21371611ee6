//! Live document session and its save state machine
//!
//! One session owns one document's field list. All field writes go
//! through [`DocumentSession::set_field_value`]; the `form_id` is
//! written exactly once, by the save path, when the store first
//! assigns it. Original document bytes travel only on the first
//! successful save.

use serde::Serialize;
use shared_types::{DraftStatus, FieldDefinition, FieldSource, VersionEntry};

use crate::error::DraftError;
use crate::store::{DraftStore, SaveReceipt, SaveRequest};
use form_engine::{completion_percentage, ValidationReport};

/// Save state machine: `Idle → Saving → {Saved | LocalOnly | Error}`,
/// re-entering `Saving` on the next qualifying edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    Idle,
    Saving,
    Saved,
    /// The save did not reach the store; in-memory state is intact and
    /// a manual retry is offered. Never retried automatically.
    LocalOnly,
    Error,
}

#[derive(Debug)]
pub struct DocumentSession<S> {
    store: S,
    file_name: String,
    country: String,
    visa_type: String,
    pdf_bytes: Vec<u8>,
    fields: Vec<FieldDefinition>,
    form_id: Option<String>,
    save_state: SaveState,
    original_pdf_uploaded: bool,
    latest_version_id: Option<String>,
    versions: Vec<VersionEntry>,
    dirty: bool,
    /// Supersession counter: a completing save whose generation is
    /// stale is discarded, not applied.
    save_generation: u64,
}

impl<S: DraftStore> DocumentSession<S> {
    /// Open a session over a freshly extracted document. Nothing is
    /// persisted until the first save; existing drafts are never
    /// overwritten implicitly.
    pub fn new(
        store: S,
        file_name: impl Into<String>,
        country: impl Into<String>,
        visa_type: impl Into<String>,
        pdf_bytes: Vec<u8>,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            store,
            file_name: file_name.into(),
            country: country.into(),
            visa_type: visa_type.into(),
            pdf_bytes,
            fields,
            form_id: None,
            save_state: SaveState::Idle,
            original_pdf_uploaded: false,
            latest_version_id: None,
            versions: Vec::new(),
            dirty: false,
            save_generation: 0,
        }
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn form_id(&self) -> Option<&str> {
        self.form_id.as_deref()
    }

    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    pub fn versions(&self) -> &[VersionEntry] {
        &self.versions
    }

    pub fn latest_version_id(&self) -> Option<&str> {
        self.latest_version_id.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn completion(&self) -> u8 {
        completion_percentage(&self.fields)
    }

    /// The single field update path. Returns false when no field of
    /// that name exists.
    pub fn set_field_value(&mut self, name: &str, value: impl Into<String>) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| f.name == name) else {
            return false;
        };
        field.value = value.into();
        field.source = if field.value.trim().is_empty() {
            FieldSource::None
        } else {
            FieldSource::Manual
        };
        self.dirty = true;
        true
    }

    /// Run profile autofill through the session's update path.
    pub fn apply_autofill(
        &mut self,
        profile: &shared_types::ApplicantProfile,
        ctx: &shared_types::DestinationContext,
    ) -> form_engine::AutofillOutcome {
        let outcome = form_engine::apply_autofill(&mut self.fields, profile, ctx);
        if outcome.filled > 0 {
            self.dirty = true;
        }
        outcome
    }

    /// Invalidate interest in any in-flight save result.
    pub fn supersede_saves(&mut self) {
        self.save_generation += 1;
    }

    pub(crate) fn begin_save(&mut self) -> (u64, SaveRequest) {
        self.save_generation += 1;
        self.save_state = SaveState::Saving;
        let request = SaveRequest {
            form_id: self.form_id.clone(),
            fields: self.fields.clone(),
            file_name: self.file_name.clone(),
            pdf_bytes: if self.original_pdf_uploaded {
                None
            } else {
                Some(self.pdf_bytes.clone())
            },
            country: self.country.clone(),
            visa_type: self.visa_type.clone(),
        };
        (self.save_generation, request)
    }

    pub(crate) fn complete_save(
        &mut self,
        generation: u64,
        result: Result<SaveReceipt, DraftError>,
    ) -> Result<(), DraftError> {
        if generation != self.save_generation {
            tracing::debug!(generation, "discarding superseded save result");
            return Ok(());
        }
        match result {
            Ok(receipt) => {
                // form_id is written here exactly once per session.
                if self.form_id.is_none() {
                    self.form_id = Some(receipt.form_id);
                }
                self.original_pdf_uploaded = true;
                self.latest_version_id = Some(receipt.version_id);
                self.versions = receipt.versions;
                self.save_state = SaveState::Saved;
                self.dirty = false;
                Ok(())
            }
            Err(err) => {
                self.save_state = match err {
                    DraftError::Transport(_) => SaveState::LocalOnly,
                    _ => SaveState::Error,
                };
                tracing::warn!(error = %err, state = ?self.save_state, "draft save failed");
                Err(DraftError::SaveFailed(err.to_string()))
            }
        }
    }

    /// Persist the current fields. Fires from the debounce timer or an
    /// explicit save action.
    pub async fn save(&mut self) -> Result<(), DraftError> {
        let (generation, request) = self.begin_save();
        let result = self.store.save_draft(request).await;
        self.complete_save(generation, result)
    }

    /// Manual retry after `LocalOnly`/`Error`. Same path as `save`.
    pub async fn retry_save(&mut self) -> Result<(), DraftError> {
        self.save().await
    }

    /// Replace the live fields with a stored version. `form_id` is
    /// preserved and the version list re-fetched; on failure the live
    /// state is left untouched.
    pub async fn restore_version(&mut self, version_id: &str) -> Result<(), DraftError> {
        let Some(form_id) = self.form_id.clone() else {
            return Err(DraftError::NoDraft);
        };
        let snapshot = self
            .store
            .restore_version(&form_id, version_id)
            .await
            .map_err(|err| match err {
                DraftError::RestoreFailed(_) | DraftError::NotFound(_) => err,
                other => DraftError::RestoreFailed(other.to_string()),
            })?;

        self.supersede_saves();
        self.fields = snapshot.fields;
        self.versions = snapshot.version_history;
        self.latest_version_id = Some(version_id.to_string());
        self.save_state = SaveState::Saved;
        self.dirty = false;
        Ok(())
    }

    /// Delete the draft outright, bypassing version history.
    pub async fn discard(&mut self) -> Result<(), DraftError> {
        self.supersede_saves();
        if let Some(form_id) = self.form_id.take() {
            self.store.delete_draft(&form_id).await?;
        }
        self.versions.clear();
        self.latest_version_id = None;
        self.original_pdf_uploaded = false;
        self.save_state = SaveState::Idle;
        self.dirty = false;
        Ok(())
    }

    /// Transition the draft to completed. Refused while the structured
    /// pass reports blocking errors.
    pub async fn complete(&mut self, report: &ValidationReport) -> Result<(), DraftError> {
        if report.has_blocking_errors() {
            let errors = report
                .structured
                .issues
                .iter()
                .filter(|i| i.kind == shared_types::IssueKind::Error)
                .count();
            return Err(DraftError::CompletionBlocked(errors));
        }
        let Some(form_id) = self.form_id.as_deref() else {
            return Err(DraftError::NoDraft);
        };
        self.store
            .update_status(form_id, DraftStatus::Completed)
            .await
    }
}
