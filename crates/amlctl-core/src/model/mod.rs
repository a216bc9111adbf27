// ── Domain records held by the slices ──
//
// The wire types from `amlctl-api` are the domain types; this module adds
// the two capabilities the state layer needs from them: a stable identity
// for in-place replacement and a set of named fields for client-side
// refinement.

mod fields;

pub use amlctl_api::EntityId;
pub use amlctl_api::models::{
    Alert, AlertStatus, Case, CaseNote, CaseStatus, CreateCaseRequest, CreateCustomerRequest,
    CreateReportRequest, Customer, DashboardMetrics, Device, RegisterRequest, Report,
    ReportStatus, RiskBucket, RiskLevel, Severity, Transaction, TransactionStatus,
    UpdateCustomerRequest, UpdateReportRequest, User, VolumePoint,
};

/// A record with server-assigned identity.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &EntityId;
}

/// Named, stringly-typed view of a record for client-side refinement.
pub trait Searchable {
    /// Text that free-form search matches against.
    fn search_text(&self) -> Vec<&str>;

    /// Value of a named field for exact-match filtering, if the record has it.
    fn field(&self, name: &str) -> Option<String>;
}

macro_rules! impl_record {
    ($($ty:ty),+ $(,)?) => {
        $(impl Record for $ty {
            fn id(&self) -> &EntityId {
                &self.id
            }
        })+
    };
}

impl_record!(Customer, Transaction, Alert, Case, Report, Device);
