// ── Resource handles ──
//
// `ResourceHandle<R>` is the per-entity facade over a slice: it reads the
// slice verbatim, wraps every remote operation in the same
// pending/fulfilled/rejected sequence, and hands failures back to the
// caller after recording them on the slice.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use amlctl_api::{ApiClient, Attachment, ExportFormat, ListQuery, Page};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{
    Alert, AlertStatus, Case, CaseStatus, CreateCaseRequest, CreateCustomerRequest,
    CreateReportRequest, Customer, Device, EntityId, Record, Report, RiskLevel, Transaction,
    TransactionStatus, UpdateCustomerRequest, UpdateReportRequest,
};
use crate::store::{FilterPatch, ResourceAction, ResourceState, Slice};
use crate::stream::StateStream;

type ApiResult<T> = Result<T, amlctl_api::Error>;

/// A remotely listed entity collection.
pub trait Resource: Send + Sync + 'static {
    type Record: Record;

    /// Lower-case plural used in logs.
    const NAME: &'static str;

    fn list(
        api: &ApiClient,
        query: &ListQuery,
    ) -> impl Future<Output = ApiResult<Page<Self::Record>>> + Send;

    fn get(api: &ApiClient, id: &EntityId) -> impl Future<Output = ApiResult<Self::Record>> + Send;
}

macro_rules! resource {
    ($(#[$meta:meta])* $name:ident, $record:ty, $label:literal, $list:ident, $get:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Resource for $name {
            type Record = $record;
            const NAME: &'static str = $label;

            fn list(
                api: &ApiClient,
                query: &ListQuery,
            ) -> impl Future<Output = ApiResult<Page<$record>>> + Send {
                api.$list(query)
            }

            fn get(api: &ApiClient, id: &EntityId) -> impl Future<Output = ApiResult<$record>> + Send {
                api.$get(id)
            }
        }
    };
}

resource!(
    /// Customer (KYC subject) records.
    Customers, Customer, "customers", list_customers, get_customer
);
resource!(Transactions, Transaction, "transactions", list_transactions, get_transaction);
resource!(Alerts, Alert, "alerts", list_alerts, get_alert);
resource!(Cases, Case, "cases", list_cases, get_case);
resource!(
    /// DFSA regulatory reports, served by the regulatory backend.
    Reports, Report, "reports", list_reports, get_report
);
resource!(Devices, Device, "devices", list_devices, get_device);

/// View-model handle for one entity collection.
///
/// Cheap to clone; all clones share the same slice.
pub struct ResourceHandle<R: Resource> {
    api: Arc<ApiClient>,
    slice: Arc<Slice<R::Record>>,
    _resource: PhantomData<R>,
}

impl<R: Resource> Clone for ResourceHandle<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            slice: Arc::clone(&self.slice),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceHandle<R> {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            slice: Arc::new(Slice::new()),
            _resource: PhantomData,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn state(&self) -> Arc<ResourceState<R::Record>> {
        self.slice.snapshot()
    }

    pub fn subscribe(&self) -> StateStream<ResourceState<R::Record>> {
        self.slice.subscribe()
    }

    pub fn slice(&self) -> &Slice<R::Record> {
        &self.slice
    }

    // ── Synchronous transitions ──────────────────────────────────────

    pub fn set_filters(&self, patch: FilterPatch) {
        self.slice.dispatch(ResourceAction::SetFilters(patch));
    }

    /// Focus a record already in the collection. Unknown ids are ignored.
    pub fn select(&self, id: &EntityId) {
        self.slice.dispatch(ResourceAction::Select(id.clone()));
    }

    pub fn clear_selected(&self) {
        self.slice.dispatch(ResourceAction::ClearSelected);
    }

    pub fn clear_error(&self) {
        self.slice.dispatch(ResourceAction::ClearError);
    }

    pub(crate) fn reset(&self) {
        self.slice.dispatch(ResourceAction::Reset);
    }

    // ── Remote operations ────────────────────────────────────────────

    /// Fetch the page described by the current filters, replacing the
    /// collection.
    ///
    /// If a newer list request was issued meanwhile, this response is
    /// dropped and the slice keeps the newer one's outcome; the caller
    /// still receives `Ok`/`Err` for its own request.
    pub async fn fetch_list(&self) -> Result<Arc<ResourceState<R::Record>>, CoreError> {
        let seq = self.slice.begin_list();
        let query = self.slice.snapshot().filters.to_query();

        match R::list(&self.api, &query).await {
            Ok(page) => {
                if !self
                    .slice
                    .dispatch(ResourceAction::ListFulfilled { seq, page })
                {
                    debug!(resource = R::NAME, seq, "discarding stale list response");
                }
                Ok(self.slice.snapshot())
            }
            Err(e) => {
                let error = CoreError::from(e);
                self.slice.dispatch(ResourceAction::ListRejected {
                    seq,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Merge `patch` into the filters, then fetch.
    pub async fn fetch_list_with(
        &self,
        patch: FilterPatch,
    ) -> Result<Arc<ResourceState<R::Record>>, CoreError> {
        self.set_filters(patch);
        self.fetch_list().await
    }

    /// Fetch one record into `selected`.
    pub async fn fetch_one(&self, id: &EntityId) -> Result<Arc<R::Record>, CoreError> {
        self.run(R::get(&self.api, id), ResourceAction::ItemFetched)
            .await
    }

    /// Pending, then `apply` on success or `Rejected` on failure.
    ///
    /// The outcome is scoped to the epoch current at dispatch, so a result
    /// arriving after a sign-out never reaches the next session's slice.
    async fn perform<T, F>(
        &self,
        request: F,
        apply: impl FnOnce(&T) -> ResourceAction<R::Record>,
    ) -> Result<T, CoreError>
    where
        F: Future<Output = ApiResult<T>>,
    {
        let epoch = self.slice.begin();
        match request.await {
            Ok(value) => {
                if !self.slice.settle(epoch, apply(&value)) {
                    debug!(resource = R::NAME, epoch, "discarding result from a reset slice");
                }
                Ok(value)
            }
            Err(e) => Err(self.reject(epoch, e)),
        }
    }

    async fn run<T, F>(
        &self,
        request: F,
        apply: impl FnOnce(Arc<T>) -> ResourceAction<R::Record>,
    ) -> Result<Arc<T>, CoreError>
    where
        F: Future<Output = ApiResult<T>>,
    {
        self.perform(async move { request.await.map(Arc::new) }, |value| {
            apply(Arc::clone(value))
        })
        .await
    }

    async fn update_with<F>(&self, request: F) -> Result<Arc<R::Record>, CoreError>
    where
        F: Future<Output = ApiResult<R::Record>>,
    {
        self.run(request, ResourceAction::ItemUpdated).await
    }

    async fn create_with<F>(&self, request: F) -> Result<Arc<R::Record>, CoreError>
    where
        F: Future<Output = ApiResult<R::Record>>,
    {
        self.run(request, ResourceAction::Created).await
    }

    /// For operations whose result is not a record of this collection.
    async fn settle_with<T, F>(&self, request: F) -> Result<T, CoreError>
    where
        F: Future<Output = ApiResult<T>>,
    {
        self.perform(request, |_| ResourceAction::Settled).await
    }

    fn reject(&self, epoch: u64, err: amlctl_api::Error) -> CoreError {
        let error = CoreError::from(err);
        debug!(resource = R::NAME, error = %error, "operation rejected");
        self.slice
            .settle(epoch, ResourceAction::Rejected(error.clone()));
        error
    }

    /// Epoch that a result obtained from now on belongs to.
    pub(crate) fn epoch(&self) -> u64 {
        self.slice.snapshot().epoch
    }
}

// ── Entity-specific operations ───────────────────────────────────────

impl ResourceHandle<Customers> {
    pub async fn create(&self, body: &CreateCustomerRequest) -> Result<Arc<Customer>, CoreError> {
        self.create_with(self.api.create_customer(body)).await
    }

    pub async fn update(
        &self,
        id: &EntityId,
        body: &UpdateCustomerRequest,
    ) -> Result<Arc<Customer>, CoreError> {
        self.update_with(self.api.update_customer(id, body)).await
    }

    pub async fn update_risk_level(
        &self,
        id: &EntityId,
        level: RiskLevel,
        justification: &str,
    ) -> Result<Arc<Customer>, CoreError> {
        if justification.trim().is_empty() {
            return Err(self.reject_locally(CoreError::invalid(
                "justification",
                "A justification is required to override the risk level",
            )));
        }
        self.update_with(self.api.update_customer_risk(id, level, justification))
            .await
    }

    pub async fn upload_document(
        &self,
        id: &EntityId,
        document_type: &str,
        attachment: Attachment,
    ) -> Result<Arc<Customer>, CoreError> {
        self.update_with(
            self.api
                .upload_customer_document(id, document_type, attachment),
        )
        .await
    }
}

impl ResourceHandle<Transactions> {
    /// Mark a transaction suspicious. Both the collection entry and the
    /// selection pick up the echoed record.
    pub async fn flag(&self, id: &EntityId, reason: &str) -> Result<Arc<Transaction>, CoreError> {
        if reason.trim().is_empty() {
            return Err(self.reject_locally(CoreError::invalid(
                "reason",
                "A reason is required to flag a transaction",
            )));
        }
        self.update_with(self.api.flag_transaction(id, reason)).await
    }

    pub async fn update_status(
        &self,
        id: &EntityId,
        status: TransactionStatus,
    ) -> Result<Arc<Transaction>, CoreError> {
        self.update_with(self.api.update_transaction_status(id, status))
            .await
    }
}

impl ResourceHandle<Alerts> {
    pub async fn update_status(
        &self,
        id: &EntityId,
        status: AlertStatus,
        comment: Option<&str>,
    ) -> Result<Arc<Alert>, CoreError> {
        self.update_with(self.api.update_alert_status(id, status, comment))
            .await
    }

    pub async fn assign(&self, id: &EntityId, assignee: &str) -> Result<Arc<Alert>, CoreError> {
        self.update_with(self.api.assign_alert(id, assignee)).await
    }

    /// Open a case from the alert. The alert's own record is not returned
    /// by the backend, so the collection is left as-is; the case is returned
    /// for the caller to place.
    pub async fn escalate(&self, id: &EntityId, reason: &str) -> Result<Case, CoreError> {
        self.settle_with(self.api.escalate_alert(id, reason)).await
    }
}

impl ResourceHandle<Cases> {
    pub async fn create(&self, body: &CreateCaseRequest) -> Result<Arc<Case>, CoreError> {
        if body.title.trim().is_empty() {
            return Err(self.reject_locally(CoreError::invalid("title", "A case needs a title")));
        }
        self.create_with(self.api.create_case(body)).await
    }

    pub async fn update_status(
        &self,
        id: &EntityId,
        status: CaseStatus,
    ) -> Result<Arc<Case>, CoreError> {
        self.update_with(self.api.update_case_status(id, status))
            .await
    }

    pub async fn add_note(&self, id: &EntityId, text: &str) -> Result<Arc<Case>, CoreError> {
        if text.trim().is_empty() {
            return Err(self.reject_locally(CoreError::invalid("text", "A note cannot be empty")));
        }
        self.update_with(self.api.add_case_note(id, text)).await
    }

    pub async fn upload_attachment(
        &self,
        id: &EntityId,
        description: Option<&str>,
        attachment: Attachment,
    ) -> Result<Arc<Case>, CoreError> {
        self.update_with(self.api.upload_case_attachment(id, description, attachment))
            .await
    }

    /// Place a case created elsewhere (alert escalation) at the top,
    /// unless the slice was reset since `epoch`.
    pub(crate) fn insert_created(&self, epoch: u64, case: Case) {
        self.slice
            .settle(epoch, ResourceAction::Created(Arc::new(case)));
    }
}

impl ResourceHandle<Reports> {
    pub async fn create(&self, body: &CreateReportRequest) -> Result<Arc<Report>, CoreError> {
        self.create_with(self.api.create_report(body)).await
    }

    pub async fn update(
        &self,
        id: &EntityId,
        body: &UpdateReportRequest,
    ) -> Result<Arc<Report>, CoreError> {
        self.update_with(self.api.update_report(id, body)).await
    }

    pub async fn submit(&self, id: &EntityId) -> Result<Arc<Report>, CoreError> {
        self.update_with(self.api.submit_report(id)).await
    }

    pub async fn export(
        &self,
        id: &EntityId,
        format: ExportFormat,
    ) -> Result<bytes::Bytes, CoreError> {
        self.settle_with(self.api.export_report(id, format)).await
    }
}

impl ResourceHandle<Devices> {
    pub async fn set_trusted(&self, id: &EntityId, trusted: bool) -> Result<Arc<Device>, CoreError> {
        self.update_with(self.api.set_device_trusted(id, trusted))
            .await
    }

    /// Revoke a device and drop it from the collection.
    pub async fn remove(&self, id: &EntityId) -> Result<(), CoreError> {
        self.perform(self.api.remove_device(id), |_| {
            ResourceAction::Removed(id.clone())
        })
        .await
    }
}

impl<R: Resource> ResourceHandle<R> {
    /// Record a client-side rejection without touching the network.
    fn reject_locally(&self, error: CoreError) -> CoreError {
        self.slice.dispatch(ResourceAction::Rejected(error.clone()));
        error
    }
}
