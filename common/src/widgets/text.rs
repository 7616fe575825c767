//! Free-text widget model driving the main query `q`.

use std::any::Any;

use crate::{
    parameter::ParamValue,
    parameter_store::ParameterStore,
    search_result::SearchResponse,
    widgets::{StoreAction, Widget},
};


#[derive(Debug, Clone, Default)]
pub struct TextWidget {
    id: String,
    query: Option<String>,
}

impl TextWidget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: None,
        }
    }

    /// The main query the last response was requested with.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn click(&self, q: &str) -> TextAction {
        TextAction::Set(q.to_string())
    }

    pub fn unclick(&self) -> TextAction {
        TextAction::Clear
    }
}

fn current_query(store: &ParameterStore) -> Option<ParamValue> {
    store.entry("q").and_then(|entry| entry.primary().val().cloned())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextAction {
    Set(String),
    Clear,
}

impl StoreAction for TextAction {
    /// Compares `q` before and after, so setting the current query is no change.
    fn apply(&self, store: &mut ParameterStore) -> bool {
        let before = current_query(store);
        match self {
            Self::Set(q) => store.get("q").primary_mut().set_val(q.as_str()),
            Self::Clear => store.remove("q", None),
        }
        before != current_query(store)
    }
}

impl Widget for TextWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn after_request(&mut self, store: &ParameterStore, _response: &SearchResponse) {
        self.query = current_query(store).map(|q| q.joined());
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
    use super::*;

    #[test]
    fn set_and_clear_report_changes() {
        let widget = TextWidget::new("search");
        let mut store = ParameterStore::new();

        assert!(widget.click("hello").apply(&mut store));
        assert!(!widget.click("hello").apply(&mut store));
        assert_eq!(store.string(), "q=hello");

        assert!(widget.unclick().apply(&mut store));
        assert!(!widget.unclick().apply(&mut store));
        assert_eq!(store.string(), "");
    }

    #[test]
    fn remembers_the_requested_query() {
        let mut widget = TextWidget::new("search");
        let mut store = ParameterStore::new();
        widget.click("solr").apply(&mut store);
        widget.after_request(&store, &SearchResponse::default());
        assert_eq!(widget.query(), Some("solr"));
    }
}
