//! A single Solr request parameter with optional local parameters.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::url_encoding::{decode_component, encode_component};

static PARAMETER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^=]+)=(?:\{!([^}]*)\})?(.*)$").expect("parameter regex"));
static LOCAL_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:%20|\s)+").expect("local separator regex"));
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[{]\S+ TO \S+[\]}]").expect("range regex"));
static GROUPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["(].*[")]$"#).expect("grouped value regex"));

/// Ordered local parameters, e.g. `[("tag", "color"), ("q.op", "OR")]`.
pub type Locals = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

impl ParamValue {
    /// The value as it goes on the wire, lists joined with commas.
    pub fn joined(&self) -> String {
        match self {
            Self::Single(s) => s.clone(),
            Self::List(items) => items.join(","),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s.as_str()),
            Self::List(_) => None,
        }
    }

    /// An empty single value counts as unset; a list always counts as set.
    pub fn is_set(&self) -> bool {
        match self {
            Self::Single(s) => !s.is_empty(),
            Self::List(_) => true,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Single(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameter {
    name: String,
    value: Option<ParamValue>,
    locals: Locals,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            locals: Locals::new(),
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            locals: Locals::new(),
        }
    }

    pub fn with_locals(mut self, locals: Locals) -> Self {
        for (name, value) in locals {
            self.set_local(name, value);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn val(&self) -> Option<&ParamValue> {
        self.value.as_ref()
    }

    pub fn set_val(&mut self, value: impl Into<ParamValue>) {
        self.value = Some(value.into());
    }

    pub fn clear_val(&mut self) {
        self.value = None;
    }

    pub fn local(&self, name: &str) -> Option<&str> {
        self.locals
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn locals(&self) -> &Locals {
        &self.locals
    }

    /// Overwrites an existing local in place, otherwise appends it.
    pub fn set_local(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.locals.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.locals.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.locals.retain(|(key, _)| key != name);
    }

    /// The `name=value` query string pair, `{!k=v ...}` locals prepended to the value.
    ///
    /// A `q` without value but with locals turns into `q.alt={!...}*:*`, so that
    /// a query consisting of local params only still matches everything.
    pub fn string(&self) -> String {
        let pairs = self
            .locals
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{}={}", key, encode_component(value)))
            .collect::<Vec<_>>();
        let prefix = if pairs.is_empty() {
            String::new()
        } else {
            format!("{{!{}}}", pairs.join("%20"))
        };

        match &self.value {
            Some(value) if value.is_set() => {
                format!("{}={}{}", self.name, prefix, encode_component(&value.joined()))
            }
            _ if self.name == "q" && !prefix.is_empty() => {
                format!("q.alt={}{}", prefix, encode_component("*:*"))
            }
            _ => String::new(),
        }
    }

    /// Parses a pair produced by [`Parameter::string`]. Returns `None` if the
    /// input does not look like `name=value`.
    pub fn parse_string(s: &str) -> Option<Self> {
        let captures = PARAMETER_RE.captures(s)?;
        let mut param = Parameter::new(&captures[1]);

        if let Some(raw_locals) = captures.get(2) {
            for local in split_locals(raw_locals.as_str()) {
                let Some((key, value)) = local.split_once('=') else {
                    continue;
                };
                if !key.is_empty() {
                    param.set_local(decode_component(key), decode_component(value));
                }
            }
        }

        if param.name == "q.alt" {
            // q.alt only ever shows up for a q without value, see string()
            param.name = "q".to_string();
        } else {
            param.value = Some(parse_value_string(&captures[3]));
        }
        Some(param)
    }

    /// Wraps values containing a space or colon in double quotes, unless they
    /// are range expressions or already quoted/parenthesized.
    pub fn escape_value(value: &str) -> String {
        if value.contains([' ', ':']) && !RANGE_RE.is_match(value) && !GROUPED_RE.is_match(value) {
            return format!("\"{}\"", value);
        }
        value.to_string()
    }
}

/// Splits the still encoded `{!...}` section into `key=value` pairs. A piece
/// without `=`, or one inside an open single quote, belongs to the value
/// before it.
fn split_locals(raw: &str) -> Vec<String> {
    let mut locals: Vec<String> = Vec::new();
    let mut open_quote = false;
    for piece in LOCAL_SEPARATOR_RE.split(raw).filter(|piece| !piece.is_empty()) {
        match locals.last_mut() {
            Some(last) if open_quote || !piece.contains('=') => {
                last.push_str("%20");
                last.push_str(piece);
            }
            _ => locals.push(piece.to_string()),
        }
        open_quote = locals
            .last()
            .and_then(|local| local.split_once('='))
            .is_some_and(|(_, value)| is_open_quote(&decode_component(value)));
    }
    locals
}

fn is_open_quote(value: &str) -> bool {
    match value.strip_prefix('\'') {
        Some(rest) => !rest.ends_with('\'') || rest.ends_with("\\'"),
        None => false,
    }
}

fn parse_value_string(s: &str) -> ParamValue {
    let decoded = decode_component(s);
    if decoded.contains(',') {
        ParamValue::List(decoded.split(',').map(str::to_string).collect())
    } else {
        ParamValue::Single(decoded)
    }
}
