// DFSA regulatory report endpoints
//
// Served by the separate regulatory backend. Export returns the rendered
// document bytes rather than JSON.

use serde_json::json;

use crate::client::{ApiClient, Backend};
use crate::error::Error;
use crate::ids::EntityId;
use crate::models::{CreateReportRequest, Report, UpdateReportRequest};
use crate::types::{ExportFormat, ListQuery, Page};

impl ApiClient {
    pub async fn list_reports(&self, query: &ListQuery) -> Result<Page<Report>, Error> {
        self.get(Backend::Regulatory, &["dfsa", "reports"], query.to_params())
            .await
    }

    pub async fn get_report(&self, id: &EntityId) -> Result<Report, Error> {
        self.get(Backend::Regulatory, &["dfsa", "reports", id.path_segment().as_str()], Vec::new())
            .await
    }

    pub async fn create_report(&self, body: &CreateReportRequest) -> Result<Report, Error> {
        self.post(Backend::Regulatory, &["dfsa", "reports"], body).await
    }

    pub async fn update_report(
        &self,
        id: &EntityId,
        body: &UpdateReportRequest,
    ) -> Result<Report, Error> {
        self.patch(Backend::Regulatory, &["dfsa", "reports", id.path_segment().as_str()], body)
            .await
    }

    /// File the report with the regulator. The backend returns it as `submitted`.
    pub async fn submit_report(&self, id: &EntityId) -> Result<Report, Error> {
        self.post(
            Backend::Regulatory,
            &["dfsa", "reports", id.path_segment().as_str(), "submit"],
            &json!({}),
        )
        .await
    }

    /// Download the rendered report.
    pub async fn export_report(
        &self,
        id: &EntityId,
        format: ExportFormat,
    ) -> Result<bytes::Bytes, Error> {
        self.get_bytes(
            Backend::Regulatory,
            &["dfsa", "reports", id.path_segment().as_str(), "export"],
            vec![("format".to_owned(), format.to_string())],
        )
        .await
    }
}
