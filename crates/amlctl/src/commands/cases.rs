//! Case command handlers.

use std::sync::Arc;

use tabled::Tabled;

use amlctl_core::model::{Case, CaseStatus, CreateCaseRequest, Severity};
use amlctl_core::{Console, Route};

use crate::cli::{CasesArgs, CasesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CaseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn row(c: &Arc<Case>, color: bool) -> CaseRow {
    CaseRow {
        id: c.id.to_string(),
        number: util::or_dash(c.case_number.as_deref()),
        title: c.title.clone(),
        priority: output::level(c.priority, color),
        status: output::level(c.status, color),
        assignee: util::or_dash(c.assigned_to.as_deref()),
        updated: util::when(c.updated_at.or(c.created_at)),
    }
}

pub(super) fn detail(c: &Case, color: bool) -> String {
    let mut out = output::detail(&[
        ("ID", c.id.to_string()),
        ("Number", util::or_dash(c.case_number.as_deref())),
        ("Title", c.title.clone()),
        ("Description", util::or_dash(c.description.as_deref())),
        ("Priority", output::level(c.priority, color)),
        ("Status", output::level(c.status, color)),
        ("Assignee", util::or_dash(c.assigned_to.as_deref())),
        (
            "Alerts",
            if c.alert_ids.is_empty() {
                "-".into()
            } else {
                c.alert_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        ),
        ("Opened", util::when(c.created_at)),
    ]);

    if !c.notes.is_empty() {
        out.push_str("\n\nNotes:");
        for note in &c.notes {
            out.push_str(&format!(
                "\n  [{}] {}: {}",
                util::when(note.created_at),
                note.author.as_deref().unwrap_or("unknown"),
                note.text
            ));
        }
    }
    out
}

const PRIORITIES: &str = "low, medium, high, critical";
const STATUSES: &str = "open, in_progress, pending_review, escalated, closed";

pub async fn handle(
    console: &Console,
    args: CasesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require(console, Route::Cases)?;
    let cases = console.cases();
    let color = output::should_color(&global.color);

    match args.command {
        CasesCommand::List(list) => util::list(cases, &list, global, |c| row(c, color)).await,

        CasesCommand::Get { id } => util::show(cases, &id, global, |c| detail(c, color)).await,

        CasesCommand::Create {
            title,
            priority,
            description,
            customer,
            alerts,
            assign,
        } => {
            let priority: Severity = util::parse_enum("priority", &priority, PRIORITIES)?;
            let body = CreateCaseRequest {
                title,
                description,
                priority,
                customer_id: customer.as_deref().map(util::parse_id),
                alert_ids: alerts.iter().map(|a| util::parse_id(a)).collect(),
                assigned_to: assign,
            };
            let created = cases.create(&body).await?;
            output::done(&format!("Case {} opened", created.id), global.quiet, color);
            util::print_record(created.as_ref(), global, |c| detail(c, color));
            Ok(())
        }

        CasesCommand::Status { id, status } => {
            let status: CaseStatus = util::parse_enum("status", &status, STATUSES)?;
            let updated = cases.update_status(&util::parse_id(&id), status).await?;
            output::done(
                &format!("Case {id} is now {}", updated.status),
                global.quiet,
                color,
            );
            Ok(())
        }

        CasesCommand::Note { id, text } => {
            let updated = cases.add_note(&util::parse_id(&id), &text).await?;
            output::done(
                &format!("Note added to case {id} ({} total)", updated.notes.len()),
                global.quiet,
                color,
            );
            Ok(())
        }

        CasesCommand::Attach {
            id,
            file,
            description,
        } => {
            let attachment = util::read_attachment(&file)?;
            cases
                .upload_attachment(&util::parse_id(&id), description.as_deref(), attachment)
                .await?;
            output::done(
                &format!("{} attached to case {id}", file.display()),
                global.quiet,
                color,
            );
            Ok(())
        }
    }
}
