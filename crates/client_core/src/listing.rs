//! Entity-agnostic search / filter / sort / paginate pipeline behind every
//! list screen.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Accessor for one optional text field of a record.
pub type FieldSelector<T> = fn(&T) -> Option<&str>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Value chosen in one categorical dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterSelection {
    #[default]
    All,
    Only(String),
}

impl FilterSelection {
    /// Blank input and any spelling of "all" select everything.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Which fields of `T` the pipeline searches, filters and sorts by.
pub struct ListFields<T> {
    search: Vec<FieldSelector<T>>,
    filters: Vec<(&'static str, FieldSelector<T>)>,
    timestamp: FieldSelector<T>,
}

impl<T> ListFields<T> {
    pub fn new(timestamp: FieldSelector<T>) -> Self {
        Self {
            search: Vec::new(),
            filters: Vec::new(),
            timestamp,
        }
    }

    pub fn search(mut self, field: FieldSelector<T>) -> Self {
        self.search.push(field);
        self
    }

    pub fn filter(mut self, name: &'static str, field: FieldSelector<T>) -> Self {
        self.filters.push((name, field));
        self
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.iter().map(|(name, _)| *name)
    }

    fn matches_search(&self, record: &T, term: &str) -> bool {
        self.search.iter().any(|field| {
            field(record)
                .map(|value| value.to_lowercase().contains(term))
                .unwrap_or(false)
        })
    }

    fn matches_filters(&self, record: &T, selections: &BTreeMap<String, FilterSelection>) -> bool {
        self.filters.iter().all(|(name, field)| {
            match selections.get(*name) {
                Some(FilterSelection::Only(expected)) => field(record) == Some(expected.as_str()),
                Some(FilterSelection::All) | None => true,
            }
        })
    }
}

/// The user-controlled inputs of one list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    search_term: String,
    filters: BTreeMap<String, FilterSelection>,
    sort_direction: SortDirection,
    page: usize,
    page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            filters: BTreeMap::new(),
            sort_direction: SortDirection::Descending,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filter(&self, name: &str) -> &FilterSelection {
        static ALL: FilterSelection = FilterSelection::All;
        self.filters.get(name).unwrap_or(&ALL)
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    pub fn set_filter(&mut self, name: impl Into<String>, selection: FilterSelection) {
        self.filters.insert(name.into(), selection);
        self.page = 1;
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.sort_direction = direction;
        self.page = 1;
    }

    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.set_search_term(term);
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, selection: FilterSelection) -> Self {
        self.set_filter(name, selection);
        self
    }

    pub fn with_sort_direction(mut self, direction: SortDirection) -> Self {
        self.set_sort_direction(direction);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    /// Moves to `page` if it lies in `[1, total_pages]`; other requests are
    /// ignored. Returns whether the page changed.
    pub fn go_to_page(&mut self, page: usize, total_pages: usize) -> bool {
        if page < 1 || page > total_pages.max(1) || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    /// Pulls a stored page back into range after the result set shrank.
    pub fn clamp_page(&mut self, total_pages: usize) {
        self.page = self.page.clamp(1, total_pages.max(1));
    }
}

/// One rendered page of a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub records: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
}

impl<T> ListView<T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Milliseconds since the epoch; anything unparseable or missing sorts as
/// epoch zero.
pub fn parse_timestamp(raw: Option<&str>) -> i64 {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return 0;
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.timestamp_millis();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.and_utc().timestamp_millis();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return parsed.and_utc().timestamp_millis();
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .unwrap_or(0)
}

/// Search, filter and stable-sort `records` without paginating.
pub fn filter_and_sort<T: Clone>(records: &[T], query: &ListQuery, fields: &ListFields<T>) -> Vec<T> {
    let term = query.search_term.trim().to_lowercase();

    let mut keyed: Vec<(i64, &T)> = records
        .iter()
        .filter(|record| term.is_empty() || fields.matches_search(record, &term))
        .filter(|record| fields.matches_filters(record, &query.filters))
        .map(|record| (parse_timestamp((fields.timestamp)(record)), record))
        .collect();

    // `sort_by` is stable, so equal timestamps keep collection order.
    keyed.sort_by(|(left, _), (right, _)| match query.sort_direction {
        SortDirection::Descending => right.cmp(left),
        SortDirection::Ascending => left.cmp(right),
    });

    keyed.into_iter().map(|(_, record)| record.clone()).collect()
}

/// Produces the page of `records` selected by `query`. Never fails: an
/// out-of-range page is clamped to the nearest valid one.
pub fn compute_view<T: Clone>(records: &[T], query: &ListQuery, fields: &ListFields<T>) -> ListView<T> {
    let filtered = filter_and_sort(records, query, fields);
    let filtered_count = filtered.len();
    let total_pages = total_pages(filtered_count, query.page_size);
    let page = query.page.clamp(1, total_pages);

    let start = (page - 1) * query.page_size;
    let records = filtered
        .into_iter()
        .skip(start)
        .take(query.page_size)
        .collect();

    ListView {
        records,
        page,
        total_pages,
        filtered_count,
    }
}

#[cfg(test)]
#[path = "tests/listing_tests.rs"]
mod tests;
