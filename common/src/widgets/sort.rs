//! Result order model driving `sort`.

use std::any::Any;

use crate::{
    parameter::ParamValue,
    parameter_store::ParameterStore,
    search_const::DEFAULT_SORT,
    search_result::SearchResponse,
    widgets::{StoreAction, Widget},
};


#[derive(Debug, Clone)]
pub struct SortWidget {
    id: String,
    default_sort: String,
    current: String,
}

impl SortWidget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            default_sort: DEFAULT_SORT.to_string(),
            current: DEFAULT_SORT.to_string(),
        }
    }

    pub fn with_default_sort(mut self, default_sort: impl Into<String>) -> Self {
        self.default_sort = default_sort.into();
        self.current = self.default_sort.clone();
        self
    }

    /// The order the last response was requested with.
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn select(&self, sort: &str) -> SortAction {
        SortAction {
            sort: sort.to_string(),
            default_sort: self.default_sort.clone(),
        }
    }
}

fn current_sort(store: &ParameterStore) -> Option<ParamValue> {
    store.entry("sort").and_then(|entry| entry.primary().val().cloned())
}

/// Switches the result order and re-requests from the first result. The
/// default order removes `sort` instead of sending it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortAction {
    pub sort: String,
    pub default_sort: String,
}

impl StoreAction for SortAction {
    fn apply(&self, store: &mut ParameterStore) -> bool {
        let before = current_sort(store);
        if self.sort == self.default_sort {
            store.remove("sort", None);
        } else {
            store.add_by_value("sort", self.sort.as_str());
        }
        before != current_sort(store)
    }
}

impl Widget for SortWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn after_request(&mut self, store: &ParameterStore, _response: &SearchResponse) {
        self.current = current_sort(store)
            .map(|sort| sort.joined())
            .unwrap_or_else(|| self.default_sort.clone());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
