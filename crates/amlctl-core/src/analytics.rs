// ── Analytics panel state ──
//
// Read-only aggregates. Not a collection, so it has its own small state
// instead of a resource slice, but follows the same pending/fulfilled/
// rejected transitions.

use std::sync::Arc;

use amlctl_api::ApiClient;
use tokio::sync::watch;

use crate::error::CoreError;
use crate::model::{DashboardMetrics, RiskBucket, VolumePoint};
use crate::stream::StateStream;

#[derive(Debug, Clone, Default)]
pub struct AnalyticsState {
    pub dashboard: Option<DashboardMetrics>,
    pub risk_distribution: Vec<RiskBucket>,
    pub volume: Vec<VolumePoint>,
    pub volume_period: Option<String>,
    pub loading: bool,
    pub error: Option<CoreError>,
}

#[derive(Clone)]
pub struct AnalyticsHandle {
    api: Arc<ApiClient>,
    state: Arc<watch::Sender<Arc<AnalyticsState>>>,
}

impl AnalyticsHandle {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        let (state, _) = watch::channel(Arc::new(AnalyticsState::default()));
        Self {
            api,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> Arc<AnalyticsState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream<AnalyticsState> {
        StateStream::new(self.state.subscribe())
    }

    fn update(&self, f: impl FnOnce(&mut AnalyticsState)) {
        self.state.send_modify(|state| f(Arc::make_mut(state)));
    }

    fn begin(&self) {
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn fail(&self, err: amlctl_api::Error) -> CoreError {
        let error = CoreError::from(err);
        let stored = error.clone();
        self.update(|s| {
            s.loading = false;
            s.error = Some(stored);
        });
        error
    }

    pub async fn fetch_dashboard(&self) -> Result<DashboardMetrics, CoreError> {
        self.begin();
        let metrics = self
            .api
            .dashboard_metrics()
            .await
            .map_err(|e| self.fail(e))?;
        let stored = metrics.clone();
        self.update(|s| {
            s.loading = false;
            s.dashboard = Some(stored);
        });
        Ok(metrics)
    }

    pub async fn fetch_risk_distribution(&self) -> Result<Vec<RiskBucket>, CoreError> {
        self.begin();
        let buckets = self
            .api
            .risk_distribution()
            .await
            .map_err(|e| self.fail(e))?;
        let stored = buckets.clone();
        self.update(|s| {
            s.loading = false;
            s.risk_distribution = stored;
        });
        Ok(buckets)
    }

    pub async fn fetch_volume(&self, period: &str) -> Result<Vec<VolumePoint>, CoreError> {
        self.begin();
        let points = self
            .api
            .transaction_volume(period)
            .await
            .map_err(|e| self.fail(e))?;
        let stored = points.clone();
        let period = period.to_owned();
        self.update(|s| {
            s.loading = false;
            s.volume = stored;
            s.volume_period = Some(period);
        });
        Ok(points)
    }

    pub(crate) fn reset(&self) {
        self.state.send_replace(Arc::new(AnalyticsState::default()));
    }
}
