//! Page size model: the `from`-`to` of `count` summary and a `rows` switch.

use std::any::Any;

use crate::{
    parameter::ParamValue,
    parameter_store::ParameterStore,
    search_const::DEFAULT_ROWS,
    search_result::SearchResponse,
    widgets::{StoreAction, Widget},
};

/// One based, `to` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultRange {
    pub from: u64,
    pub to: u64,
    pub count: u64,
}

impl ResultRange {
    pub fn new(rows: u64, start: u64, num_found: u64) -> Self {
        let rows = if rows == 0 { DEFAULT_ROWS } else { rows };
        Self {
            from: start.saturating_add(1),
            to: start.saturating_add(rows).min(num_found),
            count: num_found,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultsPerPageWidget {
    id: String,
    range: Option<ResultRange>,
}

impl ResultsPerPageWidget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            range: None,
        }
    }

    pub fn range(&self) -> Option<ResultRange> {
        self.range
    }

    /// Whether a page size switch makes sense for the last response.
    pub fn offers_rows(&self) -> bool {
        self.range.is_some_and(|range| range.count > 0)
    }

    pub fn select(&self, rows: u64) -> RowsAction {
        RowsAction { rows }
    }
}

/// Changes the page size and re-requests from the first result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAction {
    pub rows: u64,
}

impl StoreAction for RowsAction {
    fn apply(&self, store: &mut ParameterStore) -> bool {
        let rows = ParamValue::from(self.rows);
        let entry = store.get("rows").primary_mut();
        if entry.val() == Some(&rows) {
            return false;
        }
        entry.set_val(rows);
        true
    }
}

impl Widget for ResultsPerPageWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn after_request(&mut self, _store: &ParameterStore, response: &SearchResponse) {
        let header = &response.response_header;
        let rows = header.param_u64("rows").unwrap_or(DEFAULT_ROWS);
        let start = header.param_u64("start").unwrap_or(0);
        self.range = Some(ResultRange::new(rows, start, response.response.num_found));
    }

    fn request_failed(&mut self, _error: &anyhow::Error) {
        self.range = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
