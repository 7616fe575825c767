//! Lists what the current search is restricted by, with a way to undo each part.

use std::{any::Any, sync::LazyLock};

use regex::Regex;

use crate::{
    parameter::Parameter,
    parameter_store::ParameterStore,
    search_result::SearchResponse,
    translator::Translator,
    widgets::{StoreAction, Widget},
};

static FQ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\{!.*?\})?(.*?):(.*)$").expect("filter query regex"));
static BRACKETS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[(\[]?(.*?)[\])]?$").expect("brackets regex"));
static ECHOED_LOCAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([^=]+)='?([^'=]+)'?\s*").expect("echoed local regex"));

/// Facet parameters whose echoed `key` local names a filter value.
const LABELLED_FACET_PARAMS: [&str; 3] = ["facet.field", "facet.query", "facet.date"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    /// Field without a leading `+`/`-`, or the keyword label for the main query.
    pub field: String,
    pub field_label: String,
    pub label: String,
    pub action: SelectionAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionAction {
    /// Puts the main query back to the given default.
    ResetQuery(String),
    RemoveFilter(String),
}

impl StoreAction for SelectionAction {
    fn apply(&self, store: &mut ParameterStore) -> bool {
        match self {
            Self::ResetQuery(default) => {
                store.get("q").primary_mut().set_val(default.as_str());
                true
            }
            Self::RemoveFilter(fq) => store.remove_by_value("fq", fq.as_str()).is_some(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurrentSelectionWidget {
    id: String,
    translator: Translator,
    default_query: String,
    keyword_text: String,
    items: Vec<SelectionItem>,
}

impl CurrentSelectionWidget {
    pub fn new(id: impl Into<String>, translator: Translator) -> Self {
        Self {
            id: id.into(),
            translator,
            default_query: String::new(),
            keyword_text: "keyword".to_string(),
            items: Vec::new(),
        }
    }

    /// A main query equal to this is not listed.
    pub fn with_default_query(mut self, q: impl Into<String>) -> Self {
        self.default_query = q.into();
        self
    }

    pub fn with_keyword_text(mut self, text: impl Into<String>) -> Self {
        self.keyword_text = text.into();
        self
    }

    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    /// The `key` the facet parameters gave `value`, otherwise its translation.
    fn label_of_value(&self, value: &str, response: &SearchResponse) -> String {
        let echo = Regex::new(&format!(r"^\{{!(.*)\}}\w+:{}", regex::escape(value)));
        if let Ok(echo) = echo {
            for name in LABELLED_FACET_PARAMS {
                for param in response.response_header.param_values(name) {
                    let Some(captures) = echo.captures(&param) else {
                        continue;
                    };
                    let key = ECHOED_LOCAL_RE
                        .captures_iter(&captures[1])
                        .find(|local| &local[1] == "key")
                        .map(|local| local[2].to_string());
                    if let Some(key) = key {
                        return key;
                    }
                }
            }
        }
        let bare = BRACKETS_RE.replace(value, "$1");
        self.translator.lookup(&bare, None)
    }

    fn item(&self, field: &str, label: String, action: SelectionAction) -> SelectionItem {
        let (field, label) = match field.chars().next() {
            Some(sign @ ('-' | '+')) => (&field[1..], format!("{}{}", sign, label)),
            _ => (field, label),
        };
        SelectionItem {
            field: field.to_string(),
            field_label: self.translator.lookup(field, None),
            label,
            action,
        }
    }
}

impl Widget for CurrentSelectionWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn after_request(&mut self, store: &ParameterStore, response: &SearchResponse) {
        let mut items = Vec::new();

        let q = store.entry("q").and_then(|entry| entry.primary().val()?.as_str());
        if let Some(q) = q.filter(|q| !q.is_empty() && *q != self.default_query) {
            let action = SelectionAction::ResetQuery(self.default_query.clone());
            items.push(self.item(&self.keyword_text, q.to_string(), action));
        }

        for fq in store.values("fq") {
            let Some(fq) = fq.as_str() else {
                continue;
            };
            if fq.is_empty() || store.is_hidden(&format!("fq={}", fq)) {
                continue;
            }
            let Some(captures) = FQ_RE.captures(fq) else {
                continue;
            };
            let (field, value) = (&captures[1], &captures[2]);
            let label = self.label_of_value(value, response);
            let action = SelectionAction::RemoveFilter(format!("{}:{}", field, Parameter::escape_value(value)));
            items.push(self.item(field, label, action));
        }

        self.items = items;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
