//! Client-side filtering, sorting and pagination of past calculations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shared::{HistoryQuery, HistoryRecord};

use crate::error::CoreError;
use crate::services::HistoryStore;

/// Upper bound on pages pulled by [`HistoryBrowser::load`].
pub const MAX_HISTORY_PAGES: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    CircuityAsc,
    CircuityDesc,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::CircuityAsc => "circuity_asc",
            SortKey::CircuityDesc => "circuity_desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            "circuity_asc" => Ok(SortKey::CircuityAsc),
            "circuity_desc" => Ok(SortKey::CircuityDesc),
            other => Err(format!("unknown sort key `{other}`")),
        }
    }
}

/// One page of the matched records.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryView<'a> {
    pub items: Vec<&'a HistoryRecord>,
    pub total_matched: usize,
    pub page: usize,
    pub total_pages: usize,
}

impl QueryView<'_> {
    pub fn has_prev(&self) -> bool {
        self.page > 1 && self.page <= self.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.page >= 1 && self.page < self.total_pages
    }
}

fn matches(record: &HistoryRecord, needle: &str) -> bool {
    record.origin.label().to_lowercase().contains(needle)
        || record.destination.label().to_lowercase().contains(needle)
        || record.circuity_factor.to_string().contains(needle)
        || record.id.to_string().contains(needle)
}

/// Filters, sorts and slices `records`. Pure: the input is never reordered.
///
/// Pages are 1-indexed; a page outside `1..=total_pages` yields no items and a `page_size`
/// of zero counts as one.
pub fn view<'a>(
    records: &'a [HistoryRecord],
    filter: &str,
    sort: SortKey,
    page: usize,
    page_size: usize,
) -> QueryView<'a> {
    let mut matched: Vec<&HistoryRecord> = if filter.trim().is_empty() {
        records.iter().collect()
    } else {
        let needle = filter.to_lowercase();
        records
            .iter()
            .filter(|record| matches(record, &needle))
            .collect()
    };

    match sort {
        SortKey::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Oldest => matched.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortKey::CircuityAsc => {
            matched.sort_by(|a, b| a.circuity_factor.total_cmp(&b.circuity_factor))
        }
        SortKey::CircuityDesc => {
            matched.sort_by(|a, b| b.circuity_factor.total_cmp(&a.circuity_factor))
        }
    }

    let page_size = page_size.max(1);
    let total_matched = matched.len();
    let total_pages = total_matched.div_ceil(page_size).max(1);

    let items = if (1..=total_pages).contains(&page) {
        matched
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect()
    } else {
        Vec::new()
    };

    QueryView {
        items,
        total_matched,
        page,
        total_pages,
    }
}

/// Page numbers for a pager showing at most `width` buttons around `current`.
pub fn page_window(current: usize, total_pages: usize, width: usize) -> Vec<usize> {
    let width = width.max(1);
    if total_pages <= width {
        return (1..=total_pages).collect();
    }
    let half = width / 2;
    let start = if current <= half + 1 {
        1
    } else if current + half >= total_pages {
        total_pages + 1 - width
    } else {
        current - half
    };
    (start..start + width).collect()
}

/// History screen state: the loaded records plus the user's filter, sort and page.
#[derive(Debug, Clone)]
pub struct HistoryBrowser {
    records: Vec<HistoryRecord>,
    filter: String,
    sort: SortKey,
    page: usize,
    page_size: usize,
}

impl HistoryBrowser {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            filter: String::new(),
            sort: SortKey::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn with_records(records: Vec<HistoryRecord>, page_size: usize) -> Self {
        Self {
            records,
            ..Self::new(page_size)
        }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.page = 1;
    }

    pub fn clear_filter(&mut self) {
        self.set_filter(String::new());
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.page = 1;
    }

    /// Moves to `page` if it exists; returns whether the page changed.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        let total_pages = self.view().total_pages;
        if page >= 1 && page <= total_pages && page != self.page {
            self.page = page;
            true
        } else {
            false
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        self.page > 1 && self.go_to_page(self.page - 1)
    }

    pub fn view(&self) -> QueryView<'_> {
        view(
            &self.records,
            &self.filter,
            self.sort,
            self.page,
            self.page_size,
        )
    }

    pub fn pager(&self, width: usize) -> Vec<usize> {
        page_window(self.page, self.view().total_pages, width)
    }

    /// Replaces the records with everything the store holds.
    ///
    /// Rows with invalid coordinates are skipped. On failure the browser is left empty.
    pub async fn load(&mut self, store: &dyn HistoryStore) -> Result<usize, CoreError> {
        let limit = u32::try_from(self.page_size).unwrap_or(u32::MAX);
        let mut rows = Vec::new();
        let mut page = 1;

        loop {
            let batch = match store.fetch_page(&HistoryQuery::page(page, limit)).await {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::warn!("loading history page {page} failed: {err}");
                    self.records.clear();
                    self.page = 1;
                    return Err(err);
                }
            };
            let more = batch.has_next && !batch.items.is_empty();
            rows.extend(batch.items);
            if !more {
                break;
            }
            if page >= MAX_HISTORY_PAGES {
                tracing::warn!("history has more than {MAX_HISTORY_PAGES} pages, stopping");
                break;
            }
            page += 1;
        }

        self.records = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                HistoryRecord::try_from(row)
                    .inspect_err(|err| tracing::warn!("skipping history row {id}: {err}"))
                    .ok()
            })
            .collect();
        self.page = 1;
        let loaded = self.records.len();
        tracing::info!("loaded {loaded} history records");
        Ok(loaded)
    }
}
