// Case endpoints

use reqwest::Method;
use serde_json::json;

use crate::client::{ApiClient, Backend};
use crate::error::Error;
use crate::ids::EntityId;
use crate::models::{Case, CaseStatus, CreateCaseRequest};
use crate::types::{Attachment, ListQuery, Page};

impl ApiClient {
    pub async fn list_cases(&self, query: &ListQuery) -> Result<Page<Case>, Error> {
        self.get(Backend::General, &["cases"], query.to_params()).await
    }

    pub async fn get_case(&self, id: &EntityId) -> Result<Case, Error> {
        self.get(Backend::General, &["cases", id.path_segment().as_str()], Vec::new())
            .await
    }

    pub async fn create_case(&self, body: &CreateCaseRequest) -> Result<Case, Error> {
        self.post(Backend::General, &["cases"], body).await
    }

    pub async fn update_case_status(&self, id: &EntityId, status: CaseStatus) -> Result<Case, Error> {
        self.patch(
            Backend::General,
            &["cases", id.path_segment().as_str()],
            &json!({ "status": status }),
        )
        .await
    }

    /// Append an investigation note. Returns the case with its notes.
    pub async fn add_case_note(&self, id: &EntityId, text: &str) -> Result<Case, Error> {
        self.post(
            Backend::General,
            &["cases", id.path_segment().as_str(), "notes"],
            &json!({ "text": text }),
        )
        .await
    }

    /// Upload supporting evidence (multipart). Returns the updated case.
    pub async fn upload_case_attachment(
        &self,
        id: &EntityId,
        description: Option<&str>,
        attachment: Attachment,
    ) -> Result<Case, Error> {
        let fields = description
            .map(|d| vec![("description".to_owned(), d.to_owned())])
            .unwrap_or_default();
        let request = self
            .request(
                Method::POST,
                Backend::General,
                &["cases", id.path_segment().as_str(), "attachments"],
            )?
            .multipart(fields, attachment);
        self.send(&request).await
    }
}
