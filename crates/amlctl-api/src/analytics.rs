// Analytics endpoints (read-only aggregates)

use crate::client::{ApiClient, Backend};
use crate::error::Error;
use crate::models::{DashboardMetrics, RiskBucket, VolumePoint};

impl ApiClient {
    pub async fn dashboard_metrics(&self) -> Result<DashboardMetrics, Error> {
        self.get(Backend::General, &["analytics", "dashboard"], Vec::new())
            .await
    }

    pub async fn risk_distribution(&self) -> Result<Vec<RiskBucket>, Error> {
        self.get(Backend::General, &["analytics", "risk-distribution"], Vec::new())
            .await
    }

    /// Transaction volume bucketed by `period` (`day`, `week`, `month`).
    pub async fn transaction_volume(&self, period: &str) -> Result<Vec<VolumePoint>, Error> {
        self.get(
            Backend::General,
            &["analytics", "transaction-volume"],
            vec![("period".to_owned(), period.to_owned())],
        )
        .await
    }
}
