// ── Backend record types ──
//
// Records as the backend serialises them. Identity always comes from the
// server; unknown fields are kept in `extra` so nothing the backend adds
// is silently dropped on a round trip through the client state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::ids::EntityId;

// ── Shared enums ────────────────────────────────────────────────────

/// Customer / exposure risk rating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

/// Alert severity and case priority share one scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Flagged,
    UnderReview,
    Blocked,
    Cleared,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Investigating,
    Escalated,
    Resolved,
    FalsePositive,
    Closed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaseStatus {
    Open,
    InProgress,
    PendingReview,
    Escalated,
    Closed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportStatus {
    Draft,
    PendingReview,
    Submitted,
    Accepted,
    Rejected,
    #[serde(other)]
    Unknown,
}

// ── Session ─────────────────────────────────────────────────────────

/// The signed-in analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub mfa_enabled: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_owned(),
            (None, None) => self.email.clone(),
        }
    }
}

/// Token pair issued by sign-in, MFA verification or refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawTokens")]
pub struct AuthTokens {
    pub access: SecretString,
    pub refresh: Option<SecretString>,
    pub user: Option<User>,
}

#[derive(Deserialize)]
struct RawTokens {
    #[serde(alias = "access_token", alias = "token")]
    access: String,
    #[serde(default, alias = "refresh_token")]
    refresh: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

impl From<RawTokens> for AuthTokens {
    fn from(raw: RawTokens) -> Self {
        Self {
            access: SecretString::from(raw.access),
            refresh: raw.refresh.map(SecretString::from),
            user: raw.user,
        }
    }
}

/// Result of submitting credentials.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Tokens issued and persisted.
    Authenticated(AuthTokens),
    /// A second factor is required for this user before tokens are issued.
    MfaRequired { user_id: String },
}

/// Sign-up form. Field checks happen client-side before this is sent.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: Option<String>,
    pub password: SecretString,
    pub password_confirm: SecretString,
}

// ── Customers ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: EntityId,
    #[serde(alias = "full_name")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default = "unknown_risk")]
    pub risk_level: RiskLevel,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub kyc_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn unknown_risk() -> RiskLevel {
    RiskLevel::Unknown
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kyc_status: Option<String>,
}

// ── Transactions ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: EntityId,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    pub status: TransactionStatus,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub flag_reason: Option<String>,
    #[serde(default, alias = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// ── Alerts ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub alert_type: Option<String>,
    pub severity: Severity,
    pub status: AlertStatus,
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub transaction_id: Option<EntityId>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// ── Cases ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseNote {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(alias = "content")]
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: EntityId,
    #[serde(default)]
    pub case_number: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: CaseStatus,
    #[serde(default = "unknown_severity")]
    pub priority: Severity,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub alert_ids: Vec<EntityId>,
    #[serde(default)]
    pub notes: Vec<CaseNote>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn unknown_severity() -> Severity {
    Severity::Unknown
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCaseRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alert_ids: Vec<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

// ── DFSA regulatory reports ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: EntityId,
    #[serde(default)]
    pub reference: Option<String>,
    pub report_type: String,
    pub title: String,
    pub status: ReportStatus,
    #[serde(default)]
    pub reporting_period: Option<String>,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportRequest {
    pub report_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReportRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

// ── Devices ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub trusted: bool,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// ── Analytics ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardMetrics {
    pub total_customers: u64,
    pub high_risk_customers: u64,
    pub total_transactions: u64,
    pub flagged_transactions: u64,
    pub transaction_volume: f64,
    pub open_alerts: u64,
    pub open_cases: u64,
    pub pending_reports: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBucket {
    pub level: RiskLevel,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    pub period: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub amount: f64,
}

/// Decimal fields arrive as JSON numbers or as strings like `"1250.00"`.
mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Float(f64),
        Text(String),
    }

    impl Number {
        fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
            match self {
                Self::Float(f) => Ok(f),
                Self::Text(s) => s
                    .trim()
                    .parse()
                    .map_err(|_| E::custom(format!("invalid decimal: {s:?}"))),
            }
        }
    }

    pub(super) fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Number::deserialize(deserializer)?.into_f64()
    }

    pub(super) fn optional_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        match Option::<Number>::deserialize(deserializer)? {
            Some(n) => n.into_f64().map(Some),
            None => Ok(None),
        }
    }
}
