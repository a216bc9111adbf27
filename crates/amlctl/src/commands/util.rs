//! Shared helpers for command handlers.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use amlctl_core::{
    Attachment, Console, EntityId, FilterPatch, GuardDecision, Pagination, Record, Refinement,
    Resource, ResourceHandle, Route, Searchable, SortDirection,
};

use crate::cli::{GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Session gate ────────────────────────────────────────────────────

/// Refuse to run a protected command without a session.
pub fn require(console: &Console, route: Route) -> Result<(), CliError> {
    match console.guard(route) {
        GuardDecision::Render => Ok(()),
        GuardDecision::Redirect(Route::SignIn) => Err(CliError::NotSignedIn),
        GuardDecision::Redirect(other) => Err(CliError::Internal(format!(
            "unexpected redirect to {other} for {route}"
        ))),
        GuardDecision::Wait => Err(CliError::Internal(
            "session check has not completed".into(),
        )),
    }
}

// ── Argument parsing ────────────────────────────────────────────────

pub fn parse_id(raw: &str) -> EntityId {
    EntityId::from(raw.trim())
}

/// Parse a snake_case enum value, listing the accepted words on failure.
pub fn parse_enum<T: FromStr>(field: &str, raw: &str, accepted: &str) -> Result<T, CliError> {
    raw.trim().parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("'{raw}' is not one of: {accepted}"),
    })
}

/// Server-side part of the list flags.
pub fn list_patch(args: &ListArgs) -> FilterPatch {
    let mut patch = FilterPatch::new()
        .query(args.search.clone().unwrap_or_default())
        .page(args.page)
        .page_size(args.page_size);
    for (key, value) in &args.filter {
        patch = patch.filter(key.clone(), value.clone());
    }
    if let Some(ref field) = args.sort {
        let direction = if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        patch = patch.sort(field.clone(), direction);
    }
    patch
}

/// Client-side part of the list flags.
pub fn refinement(args: &ListArgs) -> Refinement {
    let mut refinement = Refinement::new();
    if let Some(ref text) = args.grep {
        refinement = refinement.search(text.clone());
    }
    for (field, value) in &args.where_ {
        refinement = refinement.field(field.clone(), value.clone());
    }
    refinement
}

/// Read a file for a multipart upload.
pub fn read_attachment(path: &Path) -> Result<Attachment, CliError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::Validation {
            field: "file".into(),
            reason: format!("'{}' is not a file", path.display()),
        })?;
    Ok(Attachment {
        mime_type: mime_for(path).into(),
        file_name,
        bytes: bytes.into(),
    })
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

// ── Rendering shortcuts ─────────────────────────────────────────────

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}

pub fn when(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

/// Fetch a page with the list flags, refine it, and print it.
pub async fn list<R, Row>(
    handle: &ResourceHandle<R>,
    args: &ListArgs,
    global: &GlobalOpts,
    to_row: impl Fn(&Arc<R::Record>) -> Row,
) -> Result<(), CliError>
where
    R: Resource,
    R::Record: Searchable + Serialize,
    Row: Tabled,
{
    let state = handle.fetch_list_with(list_patch(args)).await?;
    let shown = refinement(args).apply(&state.items);

    let out = output::render_list(&global.output, &shown, to_row, |r| r.id().to_string());
    output::print_output(&out, global.quiet);

    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        eprintln!("{}", page_footer(&state.pagination, state.items.len(), shown.len()));
    }
    Ok(())
}

fn page_footer(pagination: &Pagination, fetched: usize, shown: usize) -> String {
    let mut footer = format!(
        "Page {}/{} · {} total",
        pagination.current_page,
        pagination.total_pages.max(1),
        pagination.total
    );
    if shown != fetched {
        footer.push_str(&format!(" · {shown} of {fetched} on this page match"));
    }
    footer
}

/// Fetch one record into the detail view and print it.
pub async fn show<R>(
    handle: &ResourceHandle<R>,
    id: &str,
    global: &GlobalOpts,
    detail_fn: impl Fn(&R::Record) -> String,
) -> Result<(), CliError>
where
    R: Resource,
    R::Record: Serialize,
{
    let record = handle.fetch_one(&parse_id(id)).await?;
    print_record(record.as_ref(), global, detail_fn);
    Ok(())
}

pub fn print_record<T: Record + Serialize>(
    record: &T,
    global: &GlobalOpts,
    detail_fn: impl Fn(&T) -> String,
) {
    let out = output::render_single(&global.output, record, detail_fn, |r| r.id().to_string());
    output::print_output(&out, global.quiet);
}
