// Customer endpoints

use reqwest::Method;
use serde_json::json;

use crate::client::{ApiClient, Backend};
use crate::error::Error;
use crate::ids::EntityId;
use crate::models::{CreateCustomerRequest, Customer, RiskLevel, UpdateCustomerRequest};
use crate::types::{Attachment, ListQuery, Page};

impl ApiClient {
    /// List customers matching the server-side query.
    ///
    /// `GET customers/?search=..&page=..`
    pub async fn list_customers(&self, query: &ListQuery) -> Result<Page<Customer>, Error> {
        self.get(Backend::General, &["customers"], query.to_params())
            .await
    }

    pub async fn get_customer(&self, id: &EntityId) -> Result<Customer, Error> {
        self.get(Backend::General, &["customers", id.path_segment().as_str()], Vec::new())
            .await
    }

    pub async fn create_customer(&self, body: &CreateCustomerRequest) -> Result<Customer, Error> {
        self.post(Backend::General, &["customers"], body).await
    }

    pub async fn update_customer(
        &self,
        id: &EntityId,
        body: &UpdateCustomerRequest,
    ) -> Result<Customer, Error> {
        self.patch(Backend::General, &["customers", id.path_segment().as_str()], body)
            .await
    }

    /// Override the computed risk rating, with an analyst justification.
    pub async fn update_customer_risk(
        &self,
        id: &EntityId,
        level: RiskLevel,
        justification: &str,
    ) -> Result<Customer, Error> {
        self.post(
            Backend::General,
            &["customers", id.path_segment().as_str(), "risk-assessment"],
            &json!({ "risk_level": level, "justification": justification }),
        )
        .await
    }

    /// Attach a KYC document (multipart upload). Returns the updated customer.
    pub async fn upload_customer_document(
        &self,
        id: &EntityId,
        document_type: &str,
        attachment: Attachment,
    ) -> Result<Customer, Error> {
        let request = self
            .request(
                Method::POST,
                Backend::General,
                &["customers", id.path_segment().as_str(), "documents"],
            )?
            .multipart(
                vec![("document_type".to_owned(), document_type.to_owned())],
                attachment,
            );
        self.send(&request).await
    }
}
