//! Analytics command handlers.

use tabled::Tabled;

use amlctl_core::model::{DashboardMetrics, RiskBucket, VolumePoint};
use amlctl_core::{Console, Route};

use crate::cli::{AnalyticsArgs, AnalyticsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RiskRow {
    #[tabled(rename = "Risk level")]
    level: String,
    #[tabled(rename = "Customers")]
    count: u64,
}

#[derive(Tabled)]
struct VolumeRow {
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Transactions")]
    count: u64,
    #[tabled(rename = "Amount")]
    amount: String,
}

fn dashboard(m: &DashboardMetrics) -> String {
    output::detail(&[
        ("Customers", m.total_customers.to_string()),
        ("High-risk customers", m.high_risk_customers.to_string()),
        ("Transactions", m.total_transactions.to_string()),
        ("Flagged transactions", m.flagged_transactions.to_string()),
        ("Volume", format!("{:.2}", m.transaction_volume)),
        ("Open alerts", m.open_alerts.to_string()),
        ("Open cases", m.open_cases.to_string()),
        ("Pending reports", m.pending_reports.to_string()),
    ])
}

pub async fn handle(
    console: &Console,
    args: AnalyticsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require(console, Route::Analytics)?;
    let analytics = console.analytics();
    let color = output::should_color(&global.color);

    let out = match args.command {
        AnalyticsCommand::Dashboard => {
            let metrics = analytics.fetch_dashboard().await?;
            output::render_single(&global.output, &metrics, dashboard, |m| {
                format!("{} {}", m.open_alerts, m.open_cases)
            })
        }

        AnalyticsCommand::Risk => {
            let buckets = analytics.fetch_risk_distribution().await?;
            output::render_list(
                &global.output,
                &buckets,
                |b: &RiskBucket| RiskRow {
                    level: output::level(b.level, color),
                    count: b.count,
                },
                |b| format!("{} {}", b.level, b.count),
            )
        }

        AnalyticsCommand::Volume { period } => {
            let points = analytics.fetch_volume(&period).await?;
            output::render_list(
                &global.output,
                &points,
                |p: &VolumePoint| VolumeRow {
                    period: p.period.clone(),
                    count: p.count,
                    amount: format!("{:.2}", p.amount),
                },
                |p| format!("{} {}", p.period, p.count),
            )
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}
