//! Spellcheck widget model collecting Solr's collation suggestions.

use std::any::Any;

use serde_json::Value;

use crate::{
    parameter::ParamValue,
    parameter_store::ParameterStore,
    search_result::SearchResponse,
    widgets::{Widget, text::TextAction},
};

#[derive(Debug, Clone)]
pub struct SpellcheckWidget {
    id: String,
    params: Vec<(String, ParamValue)>,
    suggestions: Vec<String>,
}

impl SpellcheckWidget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: vec![
                ("spellcheck".to_string(), true.into()),
                ("spellcheck.count".to_string(), 3_u64.into()),
                ("spellcheck.collate".to_string(), true.into()),
                ("spellcheck.onlyMorePopular".to_string(), false.into()),
                ("spellcheck.maxCollations".to_string(), 3_u64.into()),
                ("spellcheck.maxCollationTries".to_string(), 10_u64.into()),
            ],
            suggestions: Vec::new(),
        }
    }

    /// Overrides or adds a `spellcheck*` request parameter.
    pub fn with_param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        match self.params.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.params.push((name.to_string(), value)),
        }
        self
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Searches for a suggested collation instead.
    pub fn accept(&self, suggestion: &str) -> TextAction {
        TextAction::Set(suggestion.to_string())
    }
}

/// The entry following every `"collation"` marker of `spellcheck.suggestions`.
pub fn collations(spellcheck: &Value) -> Vec<String> {
    let Some(suggestions) = spellcheck.get("suggestions").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut collations = Vec::new();
    let mut entries = suggestions.iter();
    while let Some(entry) = entries.next() {
        if entry.as_str() != Some("collation") {
            continue;
        }
        let collation = match entries.next() {
            Some(Value::String(s)) => Some(s.clone()),
            // extended results wrap the query in an object
            Some(value) => value.get("collationQuery").and_then(Value::as_str).map(str::to_string),
            None => None,
        };
        collations.extend(collation);
    }
    collations
}

impl Widget for SpellcheckWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn init(&mut self, store: &mut ParameterStore) -> anyhow::Result<()> {
        for (name, value) in &self.params {
            store.add_by_value(name, value.clone());
        }
        Ok(())
    }

    fn before_request(&mut self, _store: &mut ParameterStore) {
        self.suggestions.clear();
    }

    fn after_request(&mut self, _store: &ParameterStore, response: &SearchResponse) {
        self.suggestions = response.spellcheck.as_ref().map(collations).unwrap_or_default();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
