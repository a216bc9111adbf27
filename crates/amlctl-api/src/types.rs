// ── Shared request/response shapes ──
//
// The uniform `{status, data, message, errors}` envelope is stripped in
// `client.rs`; what remains here are the pieces every endpoint shares.
// List endpoints return a page of records plus the server's own
// pagination counters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

// ── Field errors ────────────────────────────────────────────────────

/// A single field-level validation message.
///
/// The backend sends either bare strings or `{field, message}` objects;
/// both decode into this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldError {
    Text(String),
    Detailed {
        #[serde(default)]
        field: Option<String>,
        #[serde(alias = "detail", alias = "msg")]
        message: String,
    },
}

impl<'de> Deserialize<'de> for FieldError {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawFieldError::deserialize(deserializer)? {
            RawFieldError::Text(message) => Self {
                field: None,
                message,
            },
            RawFieldError::Detailed { field, message } => Self { field, message },
        })
    }
}

// ── Pagination ──────────────────────────────────────────────────────

/// One page of a list endpoint, exactly as the server reported it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(alias = "items")]
    pub results: Vec<T>,
    #[serde(alias = "total")]
    pub count: u64,
    #[serde(default = "first_page", alias = "current_page", alias = "page")]
    pub current_page: u32,
    #[serde(default, alias = "page_size")]
    pub page_size: Option<u32>,
    #[serde(default, alias = "total_pages")]
    pub total_pages: Option<u32>,
}

fn first_page() -> u32 {
    1
}

// ── List query ──────────────────────────────────────────────────────

/// Sort direction for server-side ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Server-side list parameters, serialised as query string pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    pub page: u32,
    pub page_size: u32,
}

impl ListQuery {
    /// Query-string pairs: `search`, each filter, `ordering`
    /// (`-field` for descending), `page` and `page_size`.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 4);
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search".to_owned(), search.to_owned()));
        }
        for (key, value) in &self.filters {
            if !value.is_empty() {
                params.push((key.clone(), value.clone()));
            }
        }
        if let Some(field) = &self.sort_field {
            let ordering = match self.sort_direction {
                SortDirection::Asc => field.clone(),
                SortDirection::Desc => format!("-{field}"),
            };
            params.push(("ordering".to_owned(), ordering));
        }
        if self.page > 0 {
            params.push(("page".to_owned(), self.page.to_string()));
        }
        if self.page_size > 0 {
            params.push(("page_size".to_owned(), self.page_size.to_string()));
        }
        params
    }
}

/// Report export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Excel,
}

impl ExportFormat {
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
        }
    }
}

/// File payload for multipart upload endpoints.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: bytes::Bytes,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_errors_accept_strings_and_objects() {
        let errors: Vec<FieldError> = serde_json::from_str(
            r#"["Name is required", {"field": "email", "message": "Enter a valid email"}]"#,
        )
        .unwrap();
        assert_eq!(errors[0].field, None);
        assert_eq!(errors[1], FieldError::new("email", "Enter a valid email"));
        assert_eq!(errors[1].to_string(), "email: Enter a valid email");
    }

    #[test]
    fn page_accepts_camel_and_snake_case() {
        let camel: Page<u32> = serde_json::from_str(
            r#"{"results":[1,2],"count":2,"currentPage":1,"pageSize":10,"totalPages":1}"#,
        )
        .unwrap();
        let snake: Page<u32> = serde_json::from_str(
            r#"{"results":[1,2],"count":2,"current_page":1,"page_size":10,"total_pages":1}"#,
        )
        .unwrap();
        assert_eq!(camel.page_size, Some(10));
        assert_eq!(snake.total_pages, Some(1));
        assert_eq!(camel.results, snake.results);
    }

    #[test]
    fn list_query_builds_descending_ordering() {
        let mut filters = BTreeMap::new();
        filters.insert("risk_level".to_owned(), "high".to_owned());
        filters.insert("status".to_owned(), String::new());
        let query = ListQuery {
            search: Some("Alice".into()),
            filters,
            sort_field: Some("created_at".into()),
            sort_direction: SortDirection::Desc,
            page: 2,
            page_size: 25,
        };

        assert_eq!(
            query.to_params(),
            vec![
                ("search".to_owned(), "Alice".to_owned()),
                ("risk_level".to_owned(), "high".to_owned()),
                ("ordering".to_owned(), "-created_at".to_owned()),
                ("page".to_owned(), "2".to_owned()),
                ("page_size".to_owned(), "25".to_owned()),
            ]
        );
    }

    #[test]
    fn export_format_parses_from_str() {
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert_eq!(ExportFormat::Pdf.to_string(), "pdf");
    }
}
