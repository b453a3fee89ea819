//! Page links for ledger and webhook message lists.

use serde::Serialize;

pub const DEFAULT_TRANSACTIONS_DISPLAY_SIZE: u64 = 500;
pub const DEFAULT_DISPLAY_SIZE: u64 = 20;

/// How many numbered pages are shown either side of the current one.
const WINDOW: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLink {
    pub page_name: String,
    pub page_number: u64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub display_size: u64,
    pub total: u64,
    pub last_page: u64,
    /// 1-based index of the first and last result on this page.
    pub first_result: u64,
    pub last_result: u64,
    pub links: Vec<PageLink>,
}

impl Pagination {
    /// `page` is clamped into `1..=last_page`; a zero display size falls back
    /// to [`DEFAULT_DISPLAY_SIZE`].
    pub fn new(total: u64, page: u64, display_size: u64) -> Self {
        let display_size = if display_size == 0 { DEFAULT_DISPLAY_SIZE } else { display_size };
        let last_page = total.div_ceil(display_size).max(1);
        let page = page.clamp(1, last_page);

        let first_result = if total == 0 { 0 } else { (page - 1) * display_size + 1 };
        let last_result = (page * display_size).min(total);

        Self {
            page,
            display_size,
            total,
            last_page,
            first_result,
            last_result,
            links: build_links(page, last_page),
        }
    }

    pub fn has_multiple_pages(&self) -> bool {
        self.last_page > 1
    }
}

fn build_links(page: u64, last_page: u64) -> Vec<PageLink> {
    if last_page <= 1 {
        return Vec::new();
    }
    let mut links = Vec::new();
    if page > 1 {
        links.push(PageLink {
            page_name: "previous".into(),
            page_number: page - 1,
            active: false,
        });
    }
    let start = page.saturating_sub(WINDOW).max(1);
    let end = (page + WINDOW).min(last_page);
    for n in start..=end {
        links.push(PageLink {
            page_name: n.to_string(),
            page_number: n,
            active: n == page,
        });
    }
    if page < last_page {
        links.push(PageLink {
            page_name: "next".into(),
            page_number: page + 1,
            active: false,
        });
    }
    links
}
