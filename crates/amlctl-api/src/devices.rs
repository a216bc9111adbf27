// Registered device endpoints

use serde_json::json;

use crate::client::{ApiClient, Backend};
use crate::error::Error;
use crate::ids::EntityId;
use crate::models::Device;
use crate::types::{ListQuery, Page};

impl ApiClient {
    pub async fn list_devices(&self, query: &ListQuery) -> Result<Page<Device>, Error> {
        self.get(Backend::General, &["devices"], query.to_params())
            .await
    }

    pub async fn get_device(&self, id: &EntityId) -> Result<Device, Error> {
        self.get(Backend::General, &["devices", id.path_segment().as_str()], Vec::new())
            .await
    }

    pub async fn set_device_trusted(&self, id: &EntityId, trusted: bool) -> Result<Device, Error> {
        self.patch(
            Backend::General,
            &["devices", id.path_segment().as_str()],
            &json!({ "trusted": trusted }),
        )
        .await
    }

    /// Revoke a device. The only endpoint that removes a record outright.
    pub async fn remove_device(&self, id: &EntityId) -> Result<(), Error> {
        self.delete(Backend::General, &["devices", id.path_segment().as_str()])
            .await
    }
}
