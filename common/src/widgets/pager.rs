//! Pagination model: which page links to offer for the last response.

use std::any::Any;

use crate::{
    parameter_store::ParameterStore,
    search_const::DEFAULT_ROWS,
    search_result::SearchResponse,
    widgets::{StoreAction, Widget},
};

/// Pages are zero based.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageWindow {
    pub current: u64,
    pub last: u64,
    /// Consecutive pages around the current one.
    pub pages: Vec<u64>,
    /// Link to the first page ahead of the window.
    pub first_link: bool,
    pub leading_ellipsis: bool,
    pub trailing_ellipsis: bool,
    /// Link to the last page after the window.
    pub last_link: bool,
    pub has_prev: bool,
    pub has_next: bool,
}

/// The pager of `num_found` results shown `rows` at a time from `start`.
/// `None` when everything fits on one page. A `start` past the results
/// points at the last page.
pub fn page_window(rows: u64, start: u64, num_found: u64) -> Option<PageWindow> {
    let rows = if rows == 0 { DEFAULT_ROWS } else { rows };
    let last = num_found.div_ceil(rows).checked_sub(1).filter(|last| *last > 0)?;
    let current = start.div_ceil(rows).min(last);

    // window around the current page, shifted left near the end
    let (start_page, end_page) = if current.saturating_add(4) >= last {
        (last.saturating_sub(9), last)
    } else {
        let start_page = current.saturating_sub(4);
        (start_page, (start_page + 8).min(last))
    };

    Some(PageWindow {
        current,
        last,
        pages: (start_page..=end_page).collect(),
        first_link: start_page > 0,
        leading_ellipsis: start_page > 1,
        trailing_ellipsis: end_page + 1 < last,
        last_link: end_page < last,
        has_prev: current > 0,
        has_next: current < last,
    })
}

#[derive(Debug, Clone, Default)]
pub struct PagerWidget {
    id: String,
    rows: u64,
    window: Option<PageWindow>,
}

impl PagerWidget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rows: DEFAULT_ROWS,
            window: None,
        }
    }

    pub fn window(&self) -> Option<&PageWindow> {
        self.window.as_ref()
    }

    pub fn page(&self, page: u64) -> PageAction {
        PageAction {
            start: page.saturating_mul(self.rows),
        }
    }
}

/// Requests the page starting at `start`; always re-requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAction {
    pub start: u64,
}

impl StoreAction for PageAction {
    fn apply(&self, _store: &mut ParameterStore) -> bool {
        true
    }

    fn start(&self) -> Option<u64> {
        Some(self.start)
    }
}

impl Widget for PagerWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn after_request(&mut self, _store: &ParameterStore, response: &SearchResponse) {
        let header = &response.response_header;
        self.rows = header.param_u64("rows").filter(|rows| *rows > 0).unwrap_or(DEFAULT_ROWS);
        let start = header.param_u64("start").unwrap_or(0);
        self.window = page_window(self.rows, start, response.response.num_found);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn single_page_has_no_pager() {
        assert_eq!(page_window(10, 0, 0), None);
        assert_eq!(page_window(10, 0, 10), None);
        assert!(page_window(10, 0, 11).is_some());
    }

    #[test]
    fn window_at_the_beginning() {
        let window = page_window(10, 0, 1000).unwrap();
        assert_eq!(window.current, 0);
        assert_eq!(window.last, 99);
        assert_eq!(window.pages, (0..=8).collect::<Vec<_>>());
        assert!(!window.first_link && !window.leading_ellipsis);
        assert!(window.trailing_ellipsis && window.last_link);
        assert!(!window.has_prev && window.has_next);
    }

    #[test]
    fn window_in_the_middle() {
        let window = page_window(10, 500, 1000).unwrap();
        assert_eq!(window.current, 50);
        assert_eq!(window.pages, (46..=54).collect::<Vec<_>>());
        assert!(window.first_link && window.leading_ellipsis);
        assert!(window.trailing_ellipsis && window.last_link);
    }

    #[test]
    fn window_at_the_end() {
        let window = page_window(10, 990, 1000).unwrap();
        assert_eq!(window.current, 99);
        assert_eq!(window.pages, (90..=99).collect::<Vec<_>>());
        assert!(!window.trailing_ellipsis && !window.last_link);
        assert!(window.has_prev && !window.has_next);
    }

    #[test]
    fn few_pages_are_all_listed() {
        let window = page_window(20, 20, 45).unwrap();
        assert_eq!(window.current, 1);
        assert_eq!(window.last, 2);
        assert_eq!(window.pages, vec![0, 1, 2]);
        assert!(!window.first_link && !window.last_link);
    }

    #[test]
    fn start_past_the_results_lands_on_the_last_page() {
        let window = page_window(10, u64::MAX, 100).unwrap();
        assert_eq!(window.current, 9);
        assert_eq!(window.pages, (0..=9).collect::<Vec<_>>());
        assert!(!window.has_next);
        assert_eq!(page_window(10, i64::MAX as u64, 100).unwrap().current, 9);
    }

    #[test]
    fn huge_rows_and_counts() {
        assert_eq!(page_window(1 << 63, 0, 0), None);
        assert_eq!(page_window(u64::MAX, 0, u64::MAX), None);

        let window = page_window(1, u64::MAX, u64::MAX).unwrap();
        assert_eq!(window.last, u64::MAX - 1);
        assert_eq!(window.current, u64::MAX - 1);
        assert_eq!(window.pages.len(), 10);
        assert!(window.first_link && !window.last_link);
    }

    #[test]
    fn reads_huge_values_from_the_response() {
        let response: SearchResponse = serde_json::from_value(json!({
            "responseHeader": {"params": {"rows": "18446744073709551615", "start": "18446744073709551615"}},
            "response": {"numFound": 95}
        }))
        .unwrap();
        let mut pager = PagerWidget::new("pager");
        pager.after_request(&ParameterStore::new(), &response);
        assert_eq!(pager.window(), None);
        assert_eq!(pager.page(3).start, u64::MAX);
    }

    #[test]
    fn reads_rows_and_start_from_the_response() {
        let response: SearchResponse = serde_json::from_value(json!({
            "responseHeader": {"params": {"rows": "10", "start": "30"}},
            "response": {"numFound": 95}
        }))
        .unwrap();
        let mut pager = PagerWidget::new("pager");
        pager.after_request(&ParameterStore::new(), &response);

        assert_eq!(pager.window().unwrap().current, 3);
        assert_eq!(pager.window().unwrap().last, 9);
        assert_eq!(pager.page(5).start(), Some(50));
    }

    #[test]
    fn rows_default_to_twenty() {
        let response: SearchResponse = serde_json::from_value(json!({"response": {"numFound": 95}})).unwrap();
        let mut pager = PagerWidget::new("pager");
        pager.after_request(&ParameterStore::new(), &response);
        assert_eq!(pager.window().unwrap().last, 4);
        assert_eq!(pager.page(2).start, 40);
    }
}
