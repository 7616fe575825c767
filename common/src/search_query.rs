//! Page-level search defaults: the parameters every request starts out with.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    parameter::ParamValue,
    parameter_store::ParameterStore,
    search_const::DEFAULT_SERVLET,
};


/// Configuration of one search page, usually supplied as JSON.
/// `params` are merged over [`default_params`] key by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchDefaults {
    pub exposed: Vec<String>,
    pub params: Map<String, Value>,
    /// Extra stored fields to return besides the default `fl` list.
    pub more_fields: Vec<String>,
    /// A filter sent with every request but never shown or persisted.
    pub extra_filter: Option<String>,
    pub servlet: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            exposed: ["fq", "q", "start", "sort"].map(String::from).to_vec(),
            params: Map::new(),
            more_fields: Vec::new(),
            extra_filter: None,
            servlet: DEFAULT_SERVLET.to_string(),
        }
    }
}

pub fn default_params() -> Map<String, Value> {
    let defaults = json!({
        "fl": [
            "id", "web", "topic", "type", "date",
            "container_id", "container_web", "container_topic", "container_title", "container_url",
            "icon", "title", "summary", "name", "url", "comment", "thumbnail",
            "field_TopicType_lst", "author"
        ],
        "qt": "edismax",
        "hl": true,
        "hl.fl": "text",
        "hl.snippets": 2,
        "hl.fragsize": 300,
        "hl.mergeContiguous": true,
        "hl.usePhraseHighlighter": true,
        "hl.highlightMultiTerm": true,
        "hl.alternateField": "text",
        "hl.maxAlternateFieldLength": 300,
        "hl.useFastVectorHighlighter": true,
        "rows": 10
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl SearchDefaults {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn merged_params(&self) -> Map<String, Value> {
        let mut params = default_params();
        for (name, value) in &self.params {
            params.insert(name.clone(), value.clone());
        }
        params
    }

    /// Writes the defaults into `store`. Fields already in `fl`, e.g. those
    /// facet widgets asked for, are kept in front of the configured ones.
    pub fn apply(&self, store: &mut ParameterStore) {
        store.exposed = self.exposed.clone();
        let params = self.merged_params();

        for (name, value) in params.iter().filter(|(name, _)| *name != "fl") {
            if let Some(value) = param_value(value) {
                store.add_by_value(name, value);
            }
        }

        let mut fields = Vec::<String>::new();
        let configured = params.get("fl").and_then(param_value);
        let candidates = store
            .values("fl")
            .into_iter()
            .chain(configured)
            .flat_map(|value| match value {
                ParamValue::List(items) => items,
                ParamValue::Single(s) => s.split(',').map(str::to_string).collect(),
            })
            .chain(self.more_fields.iter().cloned());
        for field in candidates {
            let field = field.trim();
            if !field.is_empty() && !fields.iter().any(|existing| existing == field) {
                fields.push(field.to_string());
            }
        }
        store.add_by_value("fl", fields);

        if let Some(filter) = self.extra_filter.as_deref().filter(|filter| !filter.is_empty()) {
            let hidden = format!("fq={}", filter);
            if !store.is_hidden(&hidden) {
                store.hidden.push(hidden);
            }
            store.add_by_value("fq", filter);
        }
    }

    pub fn build_store(&self) -> ParameterStore {
        let mut store = ParameterStore::new();
        self.apply(&mut store);
        store
    }
}

/// Scalars become single values, arrays lists of their scalar items.
fn param_value(value: &Value) -> Option<ParamValue> {
    match value {
        Value::Array(items) => Some(ParamValue::List(items.iter().filter_map(scalar).collect())),
        other => scalar(other).map(ParamValue::from),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn fields(store: &ParameterStore) -> Vec<String> {
        match store.values("fl").first() {
            Some(ParamValue::List(items)) => items.clone(),
            other => panic!("unexpected fl: {:?}", other),
        }
    }

    #[test]
    fn defaults_fill_an_empty_store() {
        let store = SearchDefaults::default().build_store();
        assert_eq!(store.exposed, vec!["fq", "q", "start", "sort"]);
        assert_eq!(store.values("qt"), vec![ParamValue::from("edismax")]);
        assert_eq!(store.values("rows"), vec![ParamValue::from("10")]);
        assert_eq!(store.values("hl"), vec![ParamValue::from("true")]);
        assert_eq!(fields(&store)[..3], ["id", "web", "topic"]);
    }

    #[test]
    fn page_params_override_defaults_key_by_key() {
        let defaults = SearchDefaults::from_json(
            r#"{"params": {"rows": 20, "facet.field": ["web", "type"]}, "moreFields": ["id", "preference"]}"#,
        )
        .unwrap();
        let store = defaults.build_store();

        assert_eq!(store.values("rows"), vec![ParamValue::from("20")]);
        assert_eq!(store.values("qt"), vec![ParamValue::from("edismax")]);
        assert_eq!(
            store.values("facet.field"),
            vec![ParamValue::from("web"), ParamValue::from("type")]
        );

        let fields = fields(&store);
        assert_eq!(fields.iter().filter(|field| *field == "id").count(), 1);
        assert_eq!(fields.last().map(String::as_str), Some("preference"));
    }

    #[test]
    fn fields_requested_earlier_come_first() {
        let mut store = ParameterStore::new();
        store.add_by_value("fl", vec!["score", "title"]);
        SearchDefaults::default().apply(&mut store);

        let fields = fields(&store);
        assert_eq!(fields[..2], ["score", "title"]);
        assert_eq!(fields.iter().filter(|field| *field == "title").count(), 1);
    }

    #[test]
    fn extra_filter_is_sent_but_hidden() {
        let defaults = SearchDefaults {
            extra_filter: Some("web:Main".to_string()),
            ..Default::default()
        };
        let mut store = defaults.build_store();
        defaults.apply(&mut store);

        assert_eq!(store.hidden, vec!["fq=web:Main"]);
        assert_eq!(store.values("fq"), vec![ParamValue::from("web:Main")]);
        assert!(store.string().contains("fq=web%3AMain"));
        assert_eq!(store.exposed_string(), "");
    }
}
