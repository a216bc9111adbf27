// ── Server-side list descriptor and pagination ──

use std::collections::BTreeMap;

use amlctl_api::{ListQuery, Page, SortDirection};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Active server-side filter/sort descriptor of a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilters {
    pub query: Option<String>,
    pub filters: BTreeMap<String, String>,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            query: None,
            filters: BTreeMap::new(),
            sort_field: None,
            sort_direction: SortDirection::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListFilters {
    /// Shallow merge. Every field present in `patch` replaces the current
    /// value (the filter map as a whole). `page` falls back to 1 unless the
    /// patch names one.
    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(query) = patch.query {
            self.query = Some(query).filter(|q| !q.is_empty());
        }
        if let Some(filters) = patch.filters {
            self.filters = filters;
        }
        if let Some(field) = patch.sort_field {
            self.sort_field = Some(field).filter(|f| !f.is_empty());
        }
        if let Some(direction) = patch.sort_direction {
            self.sort_direction = direction;
        }
        if let Some(size) = patch.page_size {
            self.page_size = size.max(1);
        }
        self.page = patch.page.unwrap_or(1).max(1);
    }

    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            search: self.query.clone(),
            filters: self.filters.clone(),
            sort_field: self.sort_field.clone(),
            sort_direction: self.sort_direction,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Partial filter input. Absent fields leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub query: Option<String>,
    pub filters: Option<BTreeMap<String, String>>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Add one key to the replacement filter map.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = Some(direction);
        self
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }
}

/// Pagination block as reported by the last applied list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            total: 0,
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_pages: 0,
        }
    }
}

impl Pagination {
    /// Take the server's counters as-is. Only fields it omitted are filled
    /// in: page size from the request, page count from `ceil(total / size)`.
    pub fn from_page<T>(page: &Page<T>, requested_size: u32) -> Self {
        let page_size = page.page_size.unwrap_or(requested_size).max(1);
        let total_pages = page.total_pages.unwrap_or_else(|| {
            u32::try_from(page.count.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
        });
        Self {
            total: page.count,
            current_page: page.current_page,
            page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(count: u64, page_size: Option<u32>, total_pages: Option<u32>) -> Page<()> {
        Page {
            results: Vec::new(),
            count,
            current_page: 1,
            page_size,
            total_pages,
        }
    }

    #[test]
    fn merge_resets_page_when_absent() {
        let mut filters = ListFilters {
            page: 4,
            ..ListFilters::default()
        };
        filters.merge(FilterPatch::new().query("Alice"));
        assert_eq!(filters.page, 1);
        assert_eq!(filters.query.as_deref(), Some("Alice"));
    }

    #[test]
    fn merge_keeps_explicit_page() {
        let mut filters = ListFilters::default();
        filters.merge(FilterPatch::new().query("Alice").page(3));
        assert_eq!(filters.page, 3);
    }

    #[test]
    fn merge_is_shallow() {
        let mut filters = ListFilters::default();
        filters.merge(FilterPatch::new().filter("status", "open").sort("created_at", SortDirection::Desc));
        filters.merge(FilterPatch::new().filter("severity", "high"));

        assert_eq!(filters.filters.len(), 1);
        assert_eq!(filters.filters["severity"], "high");
        assert_eq!(filters.sort_field.as_deref(), Some("created_at"));
        assert_eq!(filters.sort_direction, SortDirection::Desc);
    }

    #[test]
    fn empty_query_clears_search() {
        let mut filters = ListFilters::default();
        filters.merge(FilterPatch::new().query("Alice"));
        filters.merge(FilterPatch::new().query(""));
        assert_eq!(filters.query, None);
    }

    #[test]
    fn server_counters_are_trusted() {
        // Deliberately inconsistent: the server's answer wins.
        let pagination = Pagination::from_page(&page(95, Some(10), Some(7)), 25);
        assert_eq!(pagination.page_size, 10);
        assert_eq!(pagination.total_pages, 7);
    }

    #[test]
    fn missing_counters_are_derived() {
        let pagination = Pagination::from_page(&page(95, None, None), 10);
        assert_eq!(pagination.page_size, 10);
        assert_eq!(pagination.total_pages, 10);
        assert_eq!(Pagination::from_page(&page(0, None, None), 10).total_pages, 0);
    }

    #[test]
    fn filters_translate_to_query() {
        let mut filters = ListFilters::default();
        filters.merge(FilterPatch::new().query("Alice").page(2).page_size(25));
        let query = filters.to_query();
        assert_eq!(query.search.as_deref(), Some("Alice"));
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 25);
    }
}
