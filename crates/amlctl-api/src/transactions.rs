// Transaction endpoints

use serde_json::json;

use crate::client::{ApiClient, Backend};
use crate::error::Error;
use crate::ids::EntityId;
use crate::models::{Transaction, TransactionStatus};
use crate::types::{ListQuery, Page};

impl ApiClient {
    pub async fn list_transactions(&self, query: &ListQuery) -> Result<Page<Transaction>, Error> {
        self.get(Backend::General, &["transactions"], query.to_params())
            .await
    }

    pub async fn get_transaction(&self, id: &EntityId) -> Result<Transaction, Error> {
        self.get(Backend::General, &["transactions", id.path_segment().as_str()], Vec::new())
            .await
    }

    /// Mark a transaction as suspicious. The backend echoes the updated record.
    pub async fn flag_transaction(&self, id: &EntityId, reason: &str) -> Result<Transaction, Error> {
        self.post(
            Backend::General,
            &["transactions", id.path_segment().as_str(), "flag"],
            &json!({ "reason": reason }),
        )
        .await
    }

    pub async fn update_transaction_status(
        &self,
        id: &EntityId,
        status: TransactionStatus,
    ) -> Result<Transaction, Error> {
        self.patch(
            Backend::General,
            &["transactions", id.path_segment().as_str()],
            &json!({ "status": status }),
        )
        .await
    }
}
