//! HTTP implementation of the draft store

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use serde_json::json;
use shared_types::{DraftSnapshot, DraftStatus, FieldDefinition};

use crate::error::DraftError;
use crate::store::{DraftStore, SaveReceipt, SaveRequest};

#[derive(Debug, Clone)]
pub struct HttpDraftStore {
    client: reqwest::Client,
    base_url: String,
}

/// Save body on the wire: document bytes travel base64-encoded.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSaveRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    form_id: Option<&'a str>,
    fields: &'a [FieldDefinition],
    file_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pdf_base64: Option<String>,
    country: &'a str,
    visa_type: &'a str,
}

impl HttpDraftStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    async fn check(
        response: reqwest::Response,
        subject: &str,
    ) -> Result<reqwest::Response, DraftError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DraftError::NotFound(subject.to_string()));
        }
        if !status.is_success() {
            return Err(DraftError::Transport(format!(
                "draft store answered {status} for {subject}"
            )));
        }
        Ok(response)
    }
}

impl DraftStore for HttpDraftStore {
    async fn list_drafts(&self) -> Result<Vec<DraftSnapshot>, DraftError> {
        let response = self.client.get(self.url("drafts")).send().await?;
        Ok(Self::check(response, "drafts").await?.json().await?)
    }

    async fn get_draft(&self, form_id: &str) -> Result<DraftSnapshot, DraftError> {
        let response = self
            .client
            .get(self.url(&format!("drafts/{form_id}")))
            .send()
            .await?;
        Ok(Self::check(response, form_id).await?.json().await?)
    }

    async fn save_draft(&self, request: SaveRequest) -> Result<SaveReceipt, DraftError> {
        let body = WireSaveRequest {
            form_id: request.form_id.as_deref(),
            fields: &request.fields,
            file_name: &request.file_name,
            pdf_base64: request.pdf_bytes.as_deref().map(|b| BASE64.encode(b)),
            country: &request.country,
            visa_type: &request.visa_type,
        };
        let response = self
            .client
            .post(self.url("drafts"))
            .json(&body)
            .send()
            .await?;
        let subject = request.form_id.as_deref().unwrap_or("new draft");
        Ok(Self::check(response, subject).await?.json().await?)
    }

    async fn restore_version(
        &self,
        form_id: &str,
        version_id: &str,
    ) -> Result<DraftSnapshot, DraftError> {
        let response = self
            .client
            .post(self.url(&format!("drafts/{form_id}/versions/{version_id}/restore")))
            .send()
            .await?;
        let snapshot = Self::check(response, version_id)
            .await
            .map_err(|err| match err {
                DraftError::NotFound(_) => err,
                other => DraftError::RestoreFailed(other.to_string()),
            })?
            .json()
            .await?;
        Ok(snapshot)
    }

    async fn update_status(&self, form_id: &str, status: DraftStatus) -> Result<(), DraftError> {
        let response = self
            .client
            .put(self.url(&format!("drafts/{form_id}/status")))
            .json(&json!({ "status": status }))
            .send()
            .await?;
        Self::check(response, form_id).await?;
        Ok(())
    }

    async fn delete_draft(&self, form_id: &str) -> Result<(), DraftError> {
        let response = self
            .client
            .delete(self.url(&format!("drafts/{form_id}")))
            .send()
            .await?;
        Self::check(response, form_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_url_is_normalized() {
        let store = HttpDraftStore::new("http://localhost:3002///");
        assert_eq!(store.url("drafts"), "http://localhost:3002/api/drafts");
        assert_eq!(
            store.url("drafts/f1/versions/v2/restore"),
            "http://localhost:3002/api/drafts/f1/versions/v2/restore"
        );
    }

    #[test]
    fn wire_save_encodes_pdf_and_omits_empty_parts() {
        let body = WireSaveRequest {
            form_id: None,
            fields: &[],
            file_name: "visa.pdf",
            pdf_base64: Some(BASE64.encode(b"%PDF")),
            country: "France",
            visa_type: "Tourist",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("formId").is_none());
        assert_eq!(value["pdfBase64"], "JVBERg==");
        assert_eq!(value["fileName"], "visa.pdf");
        assert_eq!(value["visaType"], "Tourist");
    }
}
