//! Normalizer types

use serde::Serialize;

/// Wrapper element holding a feed's payload in SOAP responses
pub const RESPONSE_DATA: &str = "Response_Data";

/// Element holding paging counters in SOAP responses
pub const RESPONSE_RESULTS: &str = "Response_Results";

/// Paging counters reported by the remote system
///
/// The normalizer only reads them; deciding whether to fetch another page
/// is the harness's job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Records matching the request across all pages
    pub total_results: Option<u64>,
    /// Number of pages
    pub total_pages: Option<u64>,
    /// Records on this page
    pub page_results: Option<u64>,
    /// This page's number, starting at 1
    pub page: Option<u64>,
}

impl PageInfo {
    /// Whether a page after this one exists
    pub fn has_next_page(&self) -> bool {
        matches!((self.page, self.total_pages), (Some(page), Some(total)) if page < total)
    }

    /// Number of the following page, if any
    pub fn next_page(&self) -> Option<u64> {
        self.has_next_page().then(|| self.page.map_or(1, |p| p + 1))
    }
}
