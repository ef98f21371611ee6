//! HTTP handlers for the draft store API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use form_engine::{completion_percentage, run_structured_validation};
use shared_types::{
    DestinationContext, DraftSnapshot, DraftStatus, FieldDefinition, IssueKind, VersionEntry,
};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Version rows kept per draft; older ones are pruned on save.
const HISTORY_LIMIT: i64 = 20;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

async fn fetch_draft(state: &AppState, id: &str) -> Result<DbDraft, ApiError> {
    let draft: Option<DbDraft> = sqlx::query_as(
        r#"
        SELECT id, file_name, pdf_data, fields_json, country, visa_type,
               status, completion, created_at, updated_at
        FROM drafts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    draft.ok_or_else(|| ApiError::DraftNotFound(id.to_string()))
}

async fn fetch_versions(state: &AppState, draft_id: &str) -> Result<Vec<VersionEntry>, ApiError> {
    let rows: Vec<DbVersion> = sqlx::query_as(
        r#"
        SELECT id, draft_id, fields_json, completion, saved_at
        FROM draft_versions
        WHERE draft_id = ?
        ORDER BY saved_at DESC, id
        "#,
    )
    .bind(draft_id)
    .fetch_all(&state.db)
    .await?;

    Ok(rows.iter().map(DbVersion::entry).collect())
}

/// List all drafts, most recently updated first
pub async fn list_drafts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DraftSnapshot>>, ApiError> {
    let drafts: Vec<DbDraft> = sqlx::query_as(
        r#"
        SELECT id, file_name, pdf_data, fields_json, country, visa_type,
               status, completion, created_at, updated_at
        FROM drafts
        ORDER BY updated_at DESC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let mut snapshots = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        let versions = fetch_versions(&state, &draft.id).await?;
        snapshots.push(snapshot_from(draft, versions)?);
    }
    Ok(Json(snapshots))
}

/// Get one draft with its version history
pub async fn get_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DraftSnapshot>, ApiError> {
    let draft = fetch_draft(&state, &id).await?;
    let versions = fetch_versions(&state, &id).await?;
    Ok(Json(snapshot_from(&draft, versions)?))
}

/// Save a draft: create on first save, update afterwards. Every save
/// appends a version entry; history is pruned to the newest entries.
pub async fn save_draft(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveDraftRequest>,
) -> Result<Json<SaveDraftResponse>, ApiError> {
    let pdf_data = match &req.pdf_base64 {
        Some(encoded) => Some(
            BASE64
                .decode(encoded)
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid PDF base64: {}", e)))?,
        ),
        None => None,
    };

    let fields_json =
        serde_json::to_string(&req.fields).map_err(|e| ApiError::Internal(e.into()))?;
    let completion = completion_percentage(&req.fields) as i64;
    let now = Utc::now();

    let form_id = match &req.form_id {
        Some(id) => {
            // Updating a draft the store has never seen is refused:
            // drafts are created only by the store assigning an id.
            fetch_draft(&state, id).await?;
            sqlx::query(
                r#"
                UPDATE drafts
                SET file_name = ?, fields_json = ?, country = ?, visa_type = ?,
                    completion = ?, pdf_data = COALESCE(?, pdf_data), updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&req.file_name)
            .bind(&fields_json)
            .bind(&req.country)
            .bind(&req.visa_type)
            .bind(completion)
            .bind(&pdf_data)
            .bind(now.to_rfc3339())
            .bind(id)
            .execute(&state.db)
            .await?;
            id.clone()
        }
        None => {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                r#"
                INSERT INTO drafts (id, file_name, pdf_data, fields_json, country, visa_type,
                                    status, completion, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, 'draft', ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&req.file_name)
            .bind(&pdf_data)
            .bind(&fields_json)
            .bind(&req.country)
            .bind(&req.visa_type)
            .bind(completion)
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .execute(&state.db)
            .await?;
            id
        }
    };

    let version_id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO draft_versions (id, draft_id, fields_json, completion, saved_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&version_id)
    .bind(&form_id)
    .bind(&fields_json)
    .bind(completion)
    .bind(now.to_rfc3339())
    .execute(&state.db)
    .await?;

    // Bounded history: drop everything past the newest N entries.
    sqlx::query(
        r#"
        DELETE FROM draft_versions
        WHERE draft_id = ?
          AND id NOT IN (
            SELECT id FROM draft_versions
            WHERE draft_id = ?
            ORDER BY saved_at DESC, id
            LIMIT ?
          )
        "#,
    )
    .bind(&form_id)
    .bind(&form_id)
    .bind(HISTORY_LIMIT)
    .execute(&state.db)
    .await?;

    let versions = fetch_versions(&state, &form_id).await?;

    tracing::info!(
        "Saved draft {} ({} fields, {}% complete, {} versions)",
        form_id,
        req.fields.len(),
        completion,
        versions.len()
    );

    Ok(Json(SaveDraftResponse {
        form_id,
        version_id,
        versions,
        persisted: true,
    }))
}

/// Restore a stored version into the draft's live fields
pub async fn restore_version(
    State(state): State<Arc<AppState>>,
    Path((id, version_id)): Path<(String, String)>,
) -> Result<Json<DraftSnapshot>, ApiError> {
    let draft = fetch_draft(&state, &id).await?;

    let version: Option<DbVersion> = sqlx::query_as(
        r#"
        SELECT id, draft_id, fields_json, completion, saved_at
        FROM draft_versions
        WHERE id = ? AND draft_id = ?
        "#,
    )
    .bind(&version_id)
    .bind(&id)
    .fetch_optional(&state.db)
    .await?;

    let version = version.ok_or_else(|| ApiError::VersionNotFound(version_id.clone()))?;

    sqlx::query(
        r#"
        UPDATE drafts
        SET fields_json = ?, completion = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&version.fields_json)
    .bind(version.completion)
    .bind(Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    tracing::info!("Restored draft {} to version {}", id, version_id);

    let restored = DbDraft {
        fields_json: version.fields_json.clone(),
        completion: version.completion,
        ..draft
    };
    let versions = fetch_versions(&state, &id).await?;
    Ok(Json(snapshot_from(&restored, versions)?))
}

/// Update a draft's status. Completing is refused while the
/// structured validation pass still reports errors.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    let draft = fetch_draft(&state, &id).await?;

    if req.status == DraftStatus::Completed {
        let fields: Vec<FieldDefinition> = serde_json::from_str(&draft.fields_json)
            .map_err(|e| ApiError::Internal(e.into()))?;
        let ctx = DestinationContext {
            country: draft.country.clone(),
            visa_type: draft.visa_type.clone(),
        };
        let report = run_structured_validation(&fields, &ctx);
        let errors = report
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::Error)
            .count();
        if errors > 0 {
            return Err(ApiError::CompletionBlocked(errors));
        }
    }

    sqlx::query(
        r#"
        UPDATE drafts SET status = ?, updated_at = ? WHERE id = ?
        "#,
    )
    .bind(req.status.to_string())
    .bind(Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    tracing::info!("Draft {} status -> {}", id, req.status);
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a draft outright, version history included
pub async fn delete_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    // One transaction: version rows must not outlive their draft.
    let mut tx = state.db.begin().await?;
    let result = sqlx::query("DELETE FROM drafts WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::DraftNotFound(id));
    }
    sqlx::query("DELETE FROM draft_versions WHERE draft_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("Deleted draft {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Download the draft's document with current values written into its
/// interactive fields.
pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, [(String, String); 2], Vec<u8>), ApiError> {
    let draft = fetch_draft(&state, &id).await?;
    let pdf_data = draft.pdf_data.ok_or_else(|| {
        ApiError::InvalidRequest(format!("Draft {} has no stored document", id))
    })?;

    let fields: Vec<FieldDefinition> = serde_json::from_str(&draft.fields_json)
        .map_err(|e| ApiError::Internal(e.into()))?;

    let filled = form_pdf::fill_document(&pdf_data, &fields)
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            ("Content-Type".to_string(), "application/pdf".to_string()),
            (
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{}\"", draft.file_name),
            ),
        ],
        filled,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::FieldKind;

    async fn saved_draft(state: &Arc<AppState>) -> String {
        let mut field = FieldDefinition::new("surname", FieldKind::Text, "Surname");
        field.value = "Okafor".to_string();
        let req = SaveDraftRequest {
            form_id: None,
            fields: vec![field],
            file_name: "visa.pdf".to_string(),
            pdf_base64: None,
            country: "France".to_string(),
            visa_type: "Tourist".to_string(),
        };
        let Json(response) = save_draft(State(state.clone()), Json(req)).await.unwrap();
        response.form_id
    }

    #[tokio::test]
    async fn delete_removes_the_draft_and_its_versions() {
        let state = Arc::new(AppState::in_memory().await.unwrap());
        let id = saved_draft(&state).await;
        assert!(!fetch_versions(&state, &id).await.unwrap().is_empty());

        let status = delete_draft(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        assert!(matches!(
            fetch_draft(&state, &id).await,
            Err(ApiError::DraftNotFound(_))
        ));
        // No version rows survive their draft.
        assert!(fetch_versions(&state, &id).await.unwrap().is_empty());

        assert!(matches!(
            delete_draft(State(state), Path(id)).await,
            Err(ApiError::DraftNotFound(_))
        ));
    }
}
