// Alert endpoints

use serde_json::json;

use crate::client::{ApiClient, Backend};
use crate::error::Error;
use crate::ids::EntityId;
use crate::models::{Alert, AlertStatus, Case};
use crate::types::{ListQuery, Page};

impl ApiClient {
    pub async fn list_alerts(&self, query: &ListQuery) -> Result<Page<Alert>, Error> {
        self.get(Backend::General, &["alerts"], query.to_params()).await
    }

    pub async fn get_alert(&self, id: &EntityId) -> Result<Alert, Error> {
        self.get(Backend::General, &["alerts", id.path_segment().as_str()], Vec::new())
            .await
    }

    /// Move an alert through triage, optionally recording why.
    pub async fn update_alert_status(
        &self,
        id: &EntityId,
        status: AlertStatus,
        comment: Option<&str>,
    ) -> Result<Alert, Error> {
        self.patch(
            Backend::General,
            &["alerts", id.path_segment().as_str()],
            &json!({ "status": status, "comment": comment }),
        )
        .await
    }

    pub async fn assign_alert(&self, id: &EntityId, assignee: &str) -> Result<Alert, Error> {
        self.post(
            Backend::General,
            &["alerts", id.path_segment().as_str(), "assign"],
            &json!({ "assigned_to": assignee }),
        )
        .await
    }

    /// Open an investigation case from an alert. Returns the new case.
    pub async fn escalate_alert(&self, id: &EntityId, reason: &str) -> Result<Case, Error> {
        self.post(
            Backend::General,
            &["alerts", id.path_segment().as_str(), "escalate"],
            &json!({ "reason": reason }),
        )
        .await
    }
}
