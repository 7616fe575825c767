//! Typed view of a Solr JSON response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchResponse {
    #[serde(rename = "responseHeader")]
    pub response_header: ResponseHeader,
    pub response: SearchResultDocuments,
    /// Keyed by `facet_fields`, `facet_dates`, `facet_queries` or `facet_ranges`.
    pub facet_counts: Option<Map<String, Value>>,
    pub spellcheck: Option<Value>,
    pub highlighting: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResponseHeader {
    pub status: i64,
    #[serde(rename = "QTime")]
    pub qtime: u64,
    /// Echo of the effective request parameters. Values are strings, or
    /// arrays of strings for repeated parameters.
    pub params: Map<String, Value>,
}

impl ResponseHeader {
    /// Every echoed value of `name`, whether Solr sent one or several.
    pub fn param_values(&self, name: &str) -> Vec<String> {
        match self.params.get(name) {
            Some(Value::Array(values)) => values.iter().filter_map(value_to_string).collect(),
            Some(value) => value_to_string(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Integer parameter like `rows` or `start`; unparsable values count as absent.
    pub fn param_u64(&self, name: &str) -> Option<u64> {
        self.param_values(name).first()?.trim().parse().ok()
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchResultDocuments {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    pub start: u64,
    pub docs: Vec<Value>,
}
