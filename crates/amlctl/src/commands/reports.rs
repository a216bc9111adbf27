//! DFSA report command handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use amlctl_core::model::{CreateReportRequest, Report, UpdateReportRequest};
use amlctl_core::{Console, ExportFormat, Route};

use crate::cli::{ExportFormatArg, GlobalOpts, ReportsArgs, ReportsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Submitted")]
    submitted: String,
}

fn row(r: &Arc<Report>, color: bool) -> ReportRow {
    ReportRow {
        id: r.id.to_string(),
        reference: util::or_dash(r.reference.as_deref()),
        kind: r.report_type.to_uppercase(),
        title: r.title.clone(),
        period: util::or_dash(r.reporting_period.as_deref()),
        status: output::level(r.status, color),
        submitted: util::when(r.submitted_at),
    }
}

fn detail(r: &Report, color: bool) -> String {
    output::detail(&[
        ("ID", r.id.to_string()),
        ("Reference", util::or_dash(r.reference.as_deref())),
        ("Type", r.report_type.to_uppercase()),
        ("Title", r.title.clone()),
        ("Period", util::or_dash(r.reporting_period.as_deref())),
        ("Status", output::level(r.status, color)),
        (
            "Customer",
            r.customer_id.as_ref().map_or_else(|| "-".into(), ToString::to_string),
        ),
        ("Narrative", util::or_dash(r.narrative.as_deref())),
        ("Created", util::when(r.created_at)),
        ("Submitted", util::when(r.submitted_at)),
    ])
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Pdf => Self::Pdf,
            ExportFormatArg::Excel => Self::Excel,
        }
    }
}

fn spinner(message: String, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner().with_message(message);
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub async fn handle(
    console: &Console,
    args: ReportsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require(console, Route::Reports)?;
    let reports = console.reports();
    let color = output::should_color(&global.color);

    match args.command {
        ReportsCommand::List(list) => util::list(reports, &list, global, |r| row(r, color)).await,

        ReportsCommand::Get { id } => util::show(reports, &id, global, |r| detail(r, color)).await,

        ReportsCommand::Create {
            report_type,
            title,
            period,
            narrative,
            customer,
        } => {
            let body = CreateReportRequest {
                report_type,
                title,
                reporting_period: period,
                narrative,
                customer_id: customer.as_deref().map(util::parse_id),
            };
            let created = reports.create(&body).await?;
            output::done(&format!("Report {} drafted", created.id), global.quiet, color);
            util::print_record(created.as_ref(), global, |r| detail(r, color));
            Ok(())
        }

        ReportsCommand::Update {
            id,
            title,
            period,
            narrative,
        } => {
            let body = UpdateReportRequest {
                title,
                reporting_period: period,
                narrative,
            };
            let updated = reports.update(&util::parse_id(&id), &body).await?;
            output::done(&format!("Report {id} updated"), global.quiet, color);
            util::print_record(updated.as_ref(), global, |r| detail(r, color));
            Ok(())
        }

        ReportsCommand::Submit { id } => {
            if !util::confirm(&format!("Submit report {id} to the DFSA?"), global.yes)? {
                return Ok(());
            }
            let submitted = reports.submit(&util::parse_id(&id)).await?;
            output::done(
                &format!("Report {id} is now {}", submitted.status),
                global.quiet,
                color,
            );
            Ok(())
        }

        ReportsCommand::Export { id, format, out } => {
            let format = ExportFormat::from(format);
            let path = out.unwrap_or_else(|| {
                PathBuf::from(format!("report-{id}.{}", format.file_extension()))
            });

            let bar = spinner(format!("Exporting report {id} as {format}"), global.quiet);
            let result = reports.export(&util::parse_id(&id), format).await;
            bar.finish_and_clear();

            let bytes = result?;
            std::fs::write(&path, &bytes)?;
            output::done(
                &format!("Wrote {} ({} bytes)", path.display(), bytes.len()),
                global.quiet,
                color,
            );
            Ok(())
        }
    }
}
