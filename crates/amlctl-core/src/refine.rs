// ── Client-side refinement ──
//
// Second, explicit filtering stage over the page already held by a slice.
// The server-side descriptor decides which page is fetched; a refinement
// only narrows what is shown from it and never triggers a request.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::Searchable;

/// Substring search plus exact-match field constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refinement {
    search: Option<String>,
    fields: BTreeMap<String, String>,
}

impl Refinement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring over each record's search text.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into().trim().to_lowercase();
        self.search = (!text.is_empty()).then_some(text);
        self
    }

    /// Require `field` to equal `value` (case-insensitive). The value `all`
    /// leaves the field unconstrained.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let field = field.into();
        if value.eq_ignore_ascii_case("all") || value.is_empty() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.fields.is_empty()
    }

    pub fn matches<T: Searchable + ?Sized>(&self, record: &T) -> bool {
        if let Some(needle) = &self.search {
            let hit = record
                .search_text()
                .iter()
                .any(|text| text.to_lowercase().contains(needle.as_str()));
            if !hit {
                return false;
            }
        }
        self.fields.iter().all(|(name, expected)| {
            record
                .field(name)
                .is_some_and(|actual| actual.eq_ignore_ascii_case(expected))
        })
    }

    /// Records of `items` that pass, in their original order.
    pub fn apply<T: Searchable>(&self, items: &[Arc<T>]) -> Vec<Arc<T>> {
        if self.is_empty() {
            return items.to_vec();
        }
        items
            .iter()
            .filter(|item| self.matches(item.as_ref()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Alert;
    use pretty_assertions::assert_eq;

    fn alert(id: &str, title: &str, severity: &str, status: &str) -> Arc<Alert> {
        Arc::new(
            serde_json::from_value(serde_json::json!({
                "id": id,
                "title": title,
                "severity": severity,
                "status": status,
            }))
            .unwrap(),
        )
    }

    fn ids(items: &[Arc<Alert>]) -> Vec<String> {
        items.iter().map(|a| a.id.to_string()).collect()
    }

    fn sample() -> Vec<Arc<Alert>> {
        vec![
            alert("A1", "Structuring pattern detected", "high", "open"),
            alert("A2", "Sanctions screening hit", "critical", "investigating"),
            alert("A3", "Rapid movement of funds", "high", "resolved"),
        ]
    }

    #[test]
    fn empty_refinement_keeps_everything() {
        assert_eq!(ids(&Refinement::new().apply(&sample())), vec!["A1", "A2", "A3"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let refined = Refinement::new().search("SCREENING").apply(&sample());
        assert_eq!(ids(&refined), vec!["A2"]);
    }

    #[test]
    fn fields_must_all_match() {
        let refined = Refinement::new()
            .field("severity", "HIGH")
            .field("status", "open")
            .apply(&sample());
        assert_eq!(ids(&refined), vec!["A1"]);
    }

    #[test]
    fn all_clears_a_field_constraint() {
        let refined = Refinement::new()
            .field("severity", "high")
            .field("severity", "all")
            .apply(&sample());
        assert_eq!(refined.len(), 3);
    }

    #[test]
    fn unknown_field_matches_nothing() {
        assert!(Refinement::new().field("colour", "red").apply(&sample()).is_empty());
    }

    #[test]
    fn refinement_preserves_identity() {
        let items = sample();
        let refined = Refinement::new().search("funds").apply(&items);
        assert!(Arc::ptr_eq(&refined[0], &items[2]));
    }
}
