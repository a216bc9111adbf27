//! Client-side state between `amlctl-api` and the views.
//!
//! - **[`Console`]**: explicit container owning the API client, one
//!   [`ResourceHandle`] per entity collection, the analytics panel and the
//!   session. Tests build an isolated one per case.
//!
//! - **[`Slice`]**: `watch`-backed state for one collection. All changes go
//!   through [`reduce`](store::reduce); list responses are fenced by a
//!   per-slice sequence number so an older response never overwrites a
//!   newer one.
//!
//! - **[`ResourceHandle<R>`]**: the per-entity facade. Every remote
//!   operation runs pending → fulfilled/rejected on the slice and returns
//!   the failure to the caller as a [`CoreError`].
//!
//! - **[`SessionHandle`]**: sign-in with optional MFA challenge, sign-out,
//!   sign-up, and reaction to expired sessions. [`guard`] gates routes on it.
//!
//! - **[`Refinement`]**: client-side narrowing of the page a slice holds.

pub mod analytics;
pub mod config;
pub mod console;
pub mod error;
pub mod model;
pub mod refine;
pub mod resource;
pub mod routes;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use amlctl_api::{Attachment, ExportFormat, FieldError, SortDirection};
pub use analytics::{AnalyticsHandle, AnalyticsState};
pub use config::{ConsoleConfig, CredentialStorage, TlsVerification};
pub use console::Console;
pub use error::CoreError;
pub use model::{EntityId, Record, Searchable};
pub use refine::Refinement;
pub use resource::{
    Alerts, Cases, Customers, Devices, Reports, Resource, ResourceHandle, Transactions,
};
pub use routes::{GuardDecision, Route, guard};
pub use session::{SessionHandle, SessionPhase, SessionState, SignInStep, is_valid_mfa_code};
pub use store::{FilterPatch, ListFilters, Pagination, ResourceAction, ResourceState, Slice};
pub use stream::StateStream;
