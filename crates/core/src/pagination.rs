//! Page windowing for list endpoints.

use serde::{Serialize, Serializer};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Upper bound on a requested page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Number of page links rendered around the current page.
pub const PAGE_WINDOW: u64 = 5;

/// A normalized page request (1-based page number).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Build a request, clamping the page to `>= 1` and the size to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of items to skip before this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One entry of the rendered page window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PageMarker {
    Number(u64),
    /// Pages were omitted at this end of the window.
    Gap,
}

impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageMarker::Number(n) => serializer.serialize_u64(*n),
            PageMarker::Gap => serializer.serialize_str("..."),
        }
    }
}

/// Total number of pages for `total` items.
pub fn page_count(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size.max(1))
}

/// Page numbers to render around `current`, at most `max_len` wide, with a
/// [`PageMarker::Gap`] at each truncated end.
pub fn page_window(total: u64, page_size: u64, current: u64, max_len: u64) -> Vec<PageMarker> {
    let half = max_len / 2;
    let last = page_count(total, page_size);

    let start = if current > half { current - half } else { 1 };
    let end = current.saturating_add(half).min(last);

    let mut pages = Vec::new();
    if start != 1 {
        pages.push(PageMarker::Gap);
    }
    pages.extend((start..=end).map(PageMarker::Number));
    if end != last {
        pages.push(PageMarker::Gap);
    }
    pages
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub current_page: u64,
    pub pages: Vec<PageMarker>,
    pub data: Vec<T>,
    pub last_page: u64,
}

impl<T> Page<T> {
    /// Slice `items` (already filtered and ordered) according to `request`.
    pub fn from_items(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len() as u64;
        let data = items
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(request.page_size()).unwrap_or(usize::MAX))
            .collect();

        Self {
            current_page: request.page(),
            pages: page_window(total, request.page_size(), request.page(), PAGE_WINDOW),
            data,
            last_page: page_count(total, request.page_size()),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            current_page: self.current_page,
            pages: self.pages,
            data: self.data.into_iter().map(f).collect(),
            last_page: self.last_page,
        }
    }
}
