//! Clap derive structures for the `amlctl` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.
//! Compiled into `build.rs` as well, so it may only depend on clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// amlctl -- AML compliance console for the command line
#[derive(Debug, Parser)]
#[command(
    name = "amlctl",
    version,
    about = "Work AML alerts, cases and DFSA reports from the command line",
    long_about = "Command-line console for an anti-money-laundering compliance backend.\n\n\
        Review customers and transactions, triage alerts, work investigation\n\
        cases and file DFSA regulatory reports against the configured backends.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "AMLCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// General backend URL (overrides profile and AML_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// DFSA regulatory backend URL (overrides profile and AML_DFSA_API_URL)
    #[arg(long, global = true)]
    pub dfsa_api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AMLCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates (local test backends only)
    #[arg(long, short = 'k', env = "AMLCTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "AMLCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in (prompts for a second factor when the account has one)
    Login(LoginArgs),

    /// Sign out and forget stored tokens
    Logout,

    /// Show the signed-in analyst
    Whoami,

    /// Create an analyst account
    Register(RegisterArgs),

    /// Customer (KYC) records
    #[command(alias = "cust")]
    Customers(CustomersArgs),

    /// Monitored transactions
    #[command(alias = "tx")]
    Transactions(TransactionsArgs),

    /// Monitoring alerts
    Alerts(AlertsArgs),

    /// Investigation cases
    Cases(CasesArgs),

    /// DFSA regulatory reports
    Reports(ReportsArgs),

    /// Trusted devices of the signed-in analyst
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// Dashboard aggregates
    Analytics(AnalyticsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

/// Server-side paging/filtering plus client-side refinement of the page.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Server-side free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Server-side filter, repeatable (e.g. --filter risk_level=high)
    #[arg(long, short = 'f', value_parser = parse_key_val)]
    pub filter: Vec<(String, String)>,

    /// Field to order by
    #[arg(long)]
    pub sort: Option<String>,

    /// Descending order
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Records per page
    #[arg(long, short = 'l', default_value = "10")]
    pub page_size: u32,

    /// Narrow the fetched page by substring (no extra request)
    #[arg(long, short = 'g')]
    pub grep: Option<String>,

    /// Narrow the fetched page by exact field value, repeatable
    #[arg(long = "where", short = 'w', value_parser = parse_key_val)]
    pub where_: Vec<(String, String)>,
}

/// Parse `key=value`.
pub fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SESSION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Sign-in email (defaults to the profile's email)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Second-factor code (6-digit TOTP or 8-digit backup code)
    #[arg(long)]
    pub code: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub organization: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CUSTOMERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CustomersArgs {
    #[command(subcommand)]
    pub command: CustomersCommand,
}

#[derive(Debug, Subcommand)]
pub enum CustomersCommand {
    /// List customers
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one customer
    Get { id: String },

    /// Onboard a customer
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// individual, corporate, ...
        #[arg(long = "type")]
        customer_type: Option<String>,
        #[arg(long)]
        nationality: Option<String>,
    },

    /// Edit contact or status fields
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        kyc_status: Option<String>,
    },

    /// Override the risk rating
    Risk {
        id: String,
        /// low, medium, high, critical
        #[arg(long)]
        level: String,
        /// Why the rating changes (required)
        #[arg(long)]
        justification: String,
    },

    /// Attach a KYC document
    Upload {
        id: String,
        /// File to upload
        file: PathBuf,
        /// passport, proof_of_address, ...
        #[arg(long)]
        document_type: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TRANSACTIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TransactionsArgs {
    #[command(subcommand)]
    pub command: TransactionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TransactionsCommand {
    /// List transactions
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one transaction
    Get { id: String },

    /// Flag a transaction as suspicious
    Flag {
        id: String,
        #[arg(long, short = 'r')]
        reason: String,
    },

    /// Set the review status
    Status {
        id: String,
        /// pending, completed, flagged, under_review, blocked, cleared
        status: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ALERTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List alerts
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one alert
    Get { id: String },

    /// Move an alert through triage
    Status {
        id: String,
        /// open, investigating, escalated, resolved, false_positive, closed
        status: String,
        #[arg(long, short = 'm')]
        comment: Option<String>,
    },

    /// Assign an alert to an analyst
    Assign { id: String, assignee: String },

    /// Open a case from an alert
    Escalate {
        id: String,
        #[arg(long, short = 'r')]
        reason: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CASES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CasesArgs {
    #[command(subcommand)]
    pub command: CasesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CasesCommand {
    /// List cases
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one case with its notes
    Get { id: String },

    /// Open a case
    Create {
        #[arg(long)]
        title: String,
        /// low, medium, high, critical
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        customer: Option<String>,
        /// Linked alert, repeatable
        #[arg(long = "alert")]
        alerts: Vec<String>,
        #[arg(long)]
        assign: Option<String>,
    },

    /// Set the case status
    Status {
        id: String,
        /// open, in_progress, pending_review, escalated, closed
        status: String,
    },

    /// Add an investigation note
    Note { id: String, text: String },

    /// Attach evidence
    Attach {
        id: String,
        file: PathBuf,
        #[arg(long)]
        description: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REPORTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReportsArgs {
    #[command(subcommand)]
    pub command: ReportsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportsCommand {
    /// List regulatory reports
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one report
    Get { id: String },

    /// Draft a report
    Create {
        /// str, sar, ctr, ...
        #[arg(long = "type")]
        report_type: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        narrative: Option<String>,
        #[arg(long)]
        customer: Option<String>,
    },

    /// Edit a draft
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        narrative: Option<String>,
    },

    /// File a report with the regulator
    Submit { id: String },

    /// Download a report
    Export {
        id: String,
        #[arg(long, default_value = "pdf")]
        format: ExportFormatArg,
        /// Destination file (defaults to report-<id>.<ext>)
        #[arg(long, short = 'O')]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormatArg {
    Pdf,
    Excel,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one device
    Get { id: String },

    /// Mark a device as trusted
    Trust { id: String },

    /// Revoke trust from a device
    Untrust { id: String },

    /// Forget a device
    #[command(alias = "rm")]
    Remove { id: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ANALYTICS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    #[command(subcommand)]
    pub command: AnalyticsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AnalyticsCommand {
    /// Headline counters
    Dashboard,

    /// Customers per risk level
    Risk,

    /// Transaction volume over time
    Volume {
        /// daily, weekly, monthly
        #[arg(long, default_value = "monthly")]
        period: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a profile value
    Set {
        /// api_url, regulatory_url, email, insecure, timeout, ca_cert, credentials_file
        key: String,
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use { name: String },

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile to update (defaults to the active one)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
