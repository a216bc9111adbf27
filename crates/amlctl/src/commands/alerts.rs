//! Alert command handlers.

use std::sync::Arc;

use tabled::Tabled;

use amlctl_core::model::{Alert, AlertStatus};
use amlctl_core::{Console, Route};

use crate::cli::{AlertsArgs, AlertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Raised")]
    raised: String,
}

fn row(a: &Arc<Alert>, color: bool) -> AlertRow {
    AlertRow {
        id: a.id.to_string(),
        title: a.title.clone(),
        kind: util::or_dash(a.alert_type.as_deref()),
        severity: output::level(a.severity, color),
        status: output::level(a.status, color),
        assignee: util::or_dash(a.assigned_to.as_deref()),
        raised: util::when(a.created_at),
    }
}

fn detail(a: &Alert, color: bool) -> String {
    output::detail(&[
        ("ID", a.id.to_string()),
        ("Title", a.title.clone()),
        ("Description", util::or_dash(a.description.as_deref())),
        ("Type", util::or_dash(a.alert_type.as_deref())),
        ("Severity", output::level(a.severity, color)),
        ("Status", output::level(a.status, color)),
        (
            "Customer",
            a.customer_id.as_ref().map_or_else(|| "-".into(), ToString::to_string),
        ),
        (
            "Transaction",
            a.transaction_id
                .as_ref()
                .map_or_else(|| "-".into(), ToString::to_string),
        ),
        ("Assignee", util::or_dash(a.assigned_to.as_deref())),
        ("Raised", util::when(a.created_at)),
    ])
}

const STATUSES: &str = "open, investigating, escalated, resolved, false_positive, closed";

pub async fn handle(
    console: &Console,
    args: AlertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require(console, Route::Alerts)?;
    let alerts = console.alerts();
    let color = output::should_color(&global.color);

    match args.command {
        AlertsCommand::List(list) => util::list(alerts, &list, global, |a| row(a, color)).await,

        AlertsCommand::Get { id } => util::show(alerts, &id, global, |a| detail(a, color)).await,

        AlertsCommand::Status {
            id,
            status,
            comment,
        } => {
            let status: AlertStatus = util::parse_enum("status", &status, STATUSES)?;
            let updated = alerts
                .update_status(&util::parse_id(&id), status, comment.as_deref())
                .await?;
            output::done(
                &format!("Alert {id} is now {}", updated.status),
                global.quiet,
                color,
            );
            Ok(())
        }

        AlertsCommand::Assign { id, assignee } => {
            alerts.assign(&util::parse_id(&id), &assignee).await?;
            output::done(&format!("Alert {id} assigned to {assignee}"), global.quiet, color);
            Ok(())
        }

        AlertsCommand::Escalate { id, reason } => {
            if !util::confirm(&format!("Open a case from alert {id}?"), global.yes)? {
                return Ok(());
            }
            let case = console.escalate_alert(&util::parse_id(&id), &reason).await?;
            output::done(
                &format!(
                    "Alert {id} escalated to case {}",
                    case.case_number.clone().unwrap_or_else(|| case.id.to_string())
                ),
                global.quiet,
                color,
            );
            util::print_record(&case, global, |c| super::cases::detail(c, color));
            Ok(())
        }
    }
}
