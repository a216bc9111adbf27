//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders records in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// How alarming a risk level, severity or status word is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Calm,
    Notice,
    Warning,
    Danger,
    Neutral,
}

impl Tone {
    /// Tone of a snake_case level word such as `high` or `false_positive`.
    pub fn of(word: &str) -> Self {
        match word {
            "critical" | "blocked" | "rejected" => Self::Danger,
            "high" | "flagged" | "escalated" | "open" => Self::Warning,
            "medium" | "under_review" | "investigating" | "in_progress" | "pending_review"
            | "pending" => Self::Notice,
            "low" | "cleared" | "resolved" | "closed" | "false_positive" | "completed"
            | "accepted" | "submitted" => Self::Calm,
            _ => Self::Neutral,
        }
    }
}

pub fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match tone {
        Tone::Danger => text.red().bold().to_string(),
        Tone::Warning => text.red().to_string(),
        Tone::Notice => text.yellow().to_string(),
        Tone::Calm => text.green().to_string(),
        Tone::Neutral => text.to_owned(),
    }
}

/// Paint a level word by its own tone.
pub fn level(word: impl ToString, color: bool) -> String {
    let word = word.to_string();
    paint(&word, Tone::of(&word), color)
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of records in the chosen format.
///
/// - `table`: `to_row` builds one `Tabled` row per record
/// - `json` / `json-compact` / `yaml`: serializes the records via serde
/// - `plain`: one `id_fn` value per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render one record. Table format uses the pre-formatted `detail_fn` view.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// `Label:   value` lines with the values aligned.
pub fn detail(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;
    fields
        .iter()
        .map(|(label, value)| format!("{:<width$} {value}", format!("{label}:")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status line on stderr after a mutation.
pub fn done(message: &str, quiet: bool, color: bool) {
    if quiet {
        return;
    }
    if color {
        eprintln!("{} {message}", "✓".green());
    } else {
        eprintln!("✓ {message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).expect("serialization should not fail")
}

fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).expect("serialization should not fail")
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: 1, name: "Alice" }, Item { id: 2, name: "Bob" }]
    }

    #[test]
    fn plain_lists_one_id_per_line() {
        let out = render_list(
            &OutputFormat::Plain,
            &items(),
            |i| Row { name: i.name.into() },
            |i| i.id.to_string(),
        );
        assert_eq!(out, "1\n2");
    }

    #[test]
    fn table_has_header_and_rows() {
        let out = render_list(
            &OutputFormat::Table,
            &items(),
            |i| Row { name: i.name.into() },
            |i| i.id.to_string(),
        );
        assert!(out.contains("Name"));
        assert!(out.contains("Alice") && out.contains("Bob"));
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(
            &OutputFormat::JsonCompact,
            &items(),
            |i| Row { name: i.name.into() },
            |i| i.id.to_string(),
        );
        assert_eq!(out, r#"[{"id":1,"name":"Alice"},{"id":2,"name":"Bob"}]"#);
    }

    #[test]
    fn detail_aligns_values() {
        let out = detail(&[("ID", "7".into()), ("Status", "open".into())]);
        assert_eq!(out, "ID:     7\nStatus: open");
    }

    #[test]
    fn uncolored_level_is_verbatim() {
        assert_eq!(level("critical", false), "critical");
        assert_eq!(Tone::of("false_positive"), Tone::Calm);
    }
}
