// amlctl-api: Async Rust client for the AML compliance backend

pub mod auth;
pub mod client;
pub mod error;
pub mod ids;
pub mod models;
pub mod transport;
pub mod types;

mod alerts;
mod analytics;
mod cases;
mod customers;
mod devices;
mod reports;
mod session;
mod transactions;

pub use auth::{
    AuthEvent, CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredentials,
};
pub use client::{ApiClient, Backend};
pub use error::Error;
pub use ids::EntityId;
pub use transport::{TlsMode, TransportConfig};
pub use types::{Attachment, ExportFormat, FieldError, ListQuery, Page, SortDirection};
