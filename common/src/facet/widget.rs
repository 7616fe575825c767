//! Facet widget model: request parameters, selection and counts of one field.

use std::any::Any;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::ConfigError,
    facet::{
        counts::{self, FacetCount, FacetType},
        selection::{FacetAction, FacetSelection},
    },
    parameter::ParamValue,
    parameter_store::ParameterStore,
    search_result::SearchResponse,
    widgets::{StoreAction, Widget},
};

/// Start, end and gap of date and range facets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub gap: Option<String>,
    pub hardend: Option<bool>,
    pub other: Option<String>,
    pub include: Option<String>,
}

/// A named sub-query of a query facet, e.g. `today` => `date:[NOW/DAY TO *]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetQuery {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "camelCase")]
pub enum FacetKind {
    /// Facet parameters are registered elsewhere; the layout is detected from
    /// the first response mentioning the field.
    Detect,
    #[default]
    Field,
    Date(RangeParams),
    Query(Vec<FacetQuery>),
    Range(RangeParams),
}

impl FacetKind {
    pub fn facet_type(&self) -> Option<FacetType> {
        match self {
            Self::Detect => None,
            Self::Field => Some(FacetType::FacetFields),
            Self::Date(_) => Some(FacetType::FacetDates),
            Self::Query(_) => Some(FacetType::FacetQueries),
            Self::Range(_) => Some(FacetType::FacetRanges),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FacetOptions {
    /// Sent as the `key` local of the facet parameter.
    pub label: Option<String>,
    pub multi_value: bool,
    pub union: bool,
    /// Keep this facet's counts unaffected by its own selection.
    pub exclusion: bool,
    pub tag: Option<String>,
    /// 0 turns off all filtering of the returned counts.
    pub mincount: u64,
    pub sort: Option<String>,
    pub prefix: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
    pub missing: Option<bool>,
    pub method: Option<String>,
    pub enum_cache_min_df: Option<u64>,
    /// Labels matching this pattern are dropped from the counts.
    pub exclude: Option<String>,
    /// Only labels matching this pattern are kept.
    pub include: Option<String>,
    pub sort_reverse: bool,
    /// Selected when the widget is initialized.
    pub default_value: Option<String>,
}

impl Default for FacetOptions {
    fn default() -> Self {
        Self {
            label: None,
            multi_value: false,
            union: false,
            exclusion: false,
            tag: None,
            mincount: 1,
            sort: None,
            prefix: None,
            limit: None,
            offset: None,
            missing: None,
            method: None,
            enum_cache_min_df: None,
            exclude: None,
            include: None,
            sort_reverse: false,
            default_value: None,
        }
    }
}

/// Facet capabilities used by rendering code.
pub trait FacetSelect {
    fn select(&self, value: &str) -> FacetAction;

    fn deselect(&self, value: &str) -> FacetAction;

    fn is_selected(&self, store: &ParameterStore, value: &str) -> bool;

    /// Counts of the last response, filtered by the widget options.
    fn counts(&self) -> &[FacetCount];
}

#[derive(Debug, Clone)]
pub struct FacetWidget {
    id: String,
    selection: FacetSelection,
    kind: FacetKind,
    options: FacetOptions,
    ex: Option<String>,
    exclude: Option<Regex>,
    include: Option<Regex>,
    facet_type: Option<FacetType>,
    counts: Vec<FacetCount>,
}

impl FacetWidget {
    pub fn new(id: impl Into<String>, field: impl Into<String>, kind: FacetKind, options: FacetOptions) -> Self {
        let field = field.into();
        let mut selection = FacetSelection::new(field.clone());
        selection.tag = options.tag.clone();
        if options.union {
            selection.multivalue = true;
            selection.union = true;
        }
        if options.multi_value {
            selection.multivalue = true;
            if selection.tag.is_none() {
                selection.tag = Some(field.clone());
            }
        }
        let mut ex = None;
        if options.exclusion {
            let tag = selection.tag.get_or_insert_with(|| field.clone());
            ex = Some(tag.clone());
        }

        Self {
            id: id.into(),
            facet_type: kind.facet_type(),
            selection,
            kind,
            options,
            ex,
            exclude: None,
            include: None,
            counts: Vec::new(),
        }
    }

    pub fn field(&self) -> &str {
        &self.selection.field
    }

    pub fn selection(&self) -> &FacetSelection {
        &self.selection
    }

    pub fn kind(&self) -> &FacetKind {
        &self.kind
    }

    pub fn options(&self) -> &FacetOptions {
        &self.options
    }

    /// The configured layout, or the one detected from an earlier response.
    pub fn facet_type(&self) -> Option<FacetType> {
        self.facet_type
    }

    fn queries(&self) -> &[FacetQuery] {
        match &self.kind {
            FacetKind::Query(queries) => queries,
            _ => &[],
        }
    }

    pub fn query_by_key(&self, key: &str) -> Option<&FacetQuery> {
        self.queries().iter().find(|query| query.key == key)
    }

    pub fn query_by_value(&self, value: &str) -> Option<&FacetQuery> {
        self.queries().iter().find(|query| query.value == value)
    }

    fn resolve<'a>(&'a self, value: &'a str) -> &'a str {
        self.query_by_key(value).map_or(value, |query| query.value.as_str())
    }

    /// Registers the facet parameters of the field with the store.
    pub fn init_store(&self, store: &mut ParameterStore) -> Result<(), ConfigError> {
        let field = self.field().to_string();
        store.add_by_value("facet", true);

        let param = match &self.kind {
            FacetKind::Detect => None,
            FacetKind::Field => store.add_by_value("facet.field", field.as_str()),
            FacetKind::Date(_) => store.add_by_value("facet.date", field.as_str()),
            FacetKind::Range(_) => store.add_by_value("facet.range", field.as_str()),
            FacetKind::Query(queries) => {
                if queries.is_empty() {
                    return Err(ConfigError::MissingFacetQueries { field });
                }
                for query in queries {
                    let Some(param) = store.add_by_value("facet.query", query.value.as_str()) else {
                        continue;
                    };
                    if !query.key.is_empty() {
                        param.set_local("key", quote_key(&query.key));
                        if let Some(ex) = &self.ex {
                            param.set_local("ex", ex);
                        }
                    }
                }
                None
            }
        };
        if let Some(param) = param {
            if let Some(label) = &self.options.label {
                param.set_local("key", label);
            }
            if let Some(ex) = &self.ex {
                param.set_local("ex", ex);
            }
        }

        for (name, value) in self.per_field_params() {
            store.add_by_value(&format!("f.{}.{}", field, name), value);
        }
        Ok(())
    }

    fn per_field_params(&self) -> Vec<(String, ParamValue)> {
        let options = &self.options;
        let mut params = Vec::new();
        let mut push = |name: &str, value: Option<ParamValue>| {
            if let Some(value) = value {
                params.push((name.to_string(), value));
            }
        };

        push("facet.prefix", options.prefix.clone().map(Into::into));
        push("facet.sort", options.sort.clone().map(Into::into));
        push("facet.limit", options.limit.map(Into::into));
        push("facet.offset", options.offset.map(Into::into));
        push("facet.mincount", Some(options.mincount.into()));
        push("facet.missing", options.missing.map(Into::into));
        push("facet.method", options.method.clone().map(Into::into));
        push("facet.enum.cache.minDf", options.enum_cache_min_df.map(Into::into));

        let (prefix, range) = match &self.kind {
            FacetKind::Date(range) => ("facet.date", range),
            FacetKind::Range(range) => ("facet.range", range),
            _ => return params,
        };
        push(&format!("{}.start", prefix), range.start.clone().map(Into::into));
        push(&format!("{}.end", prefix), range.end.clone().map(Into::into));
        push(&format!("{}.gap", prefix), range.gap.clone().map(Into::into));
        push(&format!("{}.hardend", prefix), range.hardend.map(Into::into));
        push(&format!("{}.other", prefix), range.other.clone().map(Into::into));
        push(&format!("{}.include", prefix), range.include.clone().map(Into::into));
        params
    }

    fn compile_patterns(&mut self) -> Result<(), ConfigError> {
        let compile = |option: &'static str, pattern: &Option<String>| {
            pattern
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|e| ConfigError::InvalidPattern {
                    id: self.id.clone(),
                    option,
                    message: e.to_string(),
                })
        };
        let exclude = compile("exclude", &self.options.exclude)?;
        let include = compile("include", &self.options.include)?;
        self.exclude = exclude;
        self.include = include;
        Ok(())
    }

    /// Lists the field in `fl`, keeping what other widgets put there.
    fn add_to_field_list(&self, store: &mut ParameterStore) {
        let fl = store.get("fl").primary_mut();
        let mut fields = match fl.val() {
            Some(ParamValue::List(items)) => items.clone(),
            Some(ParamValue::Single(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        };
        if !fields.iter().any(|f| f == self.field()) {
            fields.push(self.field().to_string());
        }
        fl.set_val(fields);
    }

    /// Normalized counts of the field in `response`, filtered by the options.
    pub fn facet_counts(&self, response: &SearchResponse) -> Vec<FacetCount> {
        let facet_counts = response.facet_counts.as_ref();
        let facet_type = self
            .facet_type
            .or_else(|| facet_counts.and_then(|map| FacetType::detect(map, self.field())));
        self.filter_counts(counts::facet_counts(facet_counts, facet_type, self.field()))
    }

    fn filter_counts(&self, counts: Vec<FacetCount>) -> Vec<FacetCount> {
        if self.options.mincount == 0 {
            return counts;
        }
        let mut counts = counts
            .into_iter()
            .filter(|count| count.count >= self.options.mincount)
            .filter(|count| !self.exclude.as_ref().is_some_and(|re| re.is_match(&count.facet)))
            .filter(|count| self.include.as_ref().is_none_or(|re| re.is_match(&count.facet)))
            .collect::<Vec<_>>();
        if self.options.sort_reverse {
            counts.reverse();
        }
        counts
    }
}

/// `key` locals of facet queries are single quoted.
fn quote_key(key: &str) -> String {
    format!("'{}'", key.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Drops everything up to and including the first colon.
fn strip_field_prefix(value: &str) -> &str {
    value.split_once(':').map_or(value, |(_, rest)| rest)
}

impl FacetSelect for FacetWidget {
    fn select(&self, value: &str) -> FacetAction {
        self.selection.click(self.resolve(value))
    }

    fn deselect(&self, value: &str) -> FacetAction {
        self.selection.unclick(self.resolve(value))
    }

    fn is_selected(&self, store: &ParameterStore, value: &str) -> bool {
        let value = strip_field_prefix(self.resolve(value));
        self.selection.in_query(store, value).is_some()
    }

    fn counts(&self) -> &[FacetCount] {
        &self.counts
    }
}

impl Widget for FacetWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn init(&mut self, store: &mut ParameterStore) -> anyhow::Result<()> {
        self.compile_patterns()?;
        self.init_store(store)?;
        self.add_to_field_list(store);
        if let Some(value) = self.options.default_value.clone() {
            self.select(&value).apply(store);
        }
        Ok(())
    }

    fn after_request(&mut self, _store: &ParameterStore, response: &SearchResponse) {
        if self.facet_type.is_none() {
            self.facet_type = response
                .facet_counts
                .as_ref()
                .and_then(|map| FacetType::detect(map, self.field()));
        }
        self.counts = self.facet_counts(response);
    }

    fn request_failed(&mut self, error: &anyhow::Error) {
        debug!("{}: dropping counts after failed request: {}", self.id, error);
        self.counts.clear();
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

    fn response(value: serde_json::Value) -> SearchResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn field_facet_registers_its_parameters() {
        let options = FacetOptions {
            label: Some("Type".into()),
            exclusion: true,
            limit: Some(10),
            ..Default::default()
        };
        let mut widget = FacetWidget::new("type-facet", "type", FacetKind::Field, options);
        let mut store = ParameterStore::new();
        widget.init(&mut store).unwrap();

        assert_eq!(
            store.string(),
            "facet=true&facet.field={!key=Type%20ex=type}type&f.type.facet.limit=10&f.type.facet.mincount=1&fl=type"
        );
        assert_eq!(widget.selection().tag.as_deref(), Some("type"));
    }

    #[test]
    fn range_facet_adds_range_parameters() {
        let range = RangeParams {
            start: Some("0".into()),
            end: Some("100".into()),
            gap: Some("10".into()),
            ..Default::default()
        };
        let widget = FacetWidget::new("price", "price", FacetKind::Range(range), FacetOptions::default());
        let mut store = ParameterStore::new();
        widget.init_store(&mut store).unwrap();

        assert_eq!(store.values("facet.range"), vec![ParamValue::from("price")]);
        assert_eq!(store.values("f.price.facet.range.gap"), vec![ParamValue::from("10")]);
        assert!(store.values("f.price.facet.range.hardend").is_empty());
    }

    #[test]
    fn query_facet_registers_one_query_each() {
        let queries = vec![
            FacetQuery { key: "today".into(), value: "date:[NOW/DAY TO *]".into() },
            FacetQuery { key: "it's old".into(), value: "date:[* TO NOW/YEAR]".into() },
        ];
        let options = FacetOptions { exclusion: true, ..Default::default() };
        let widget = FacetWidget::new("date", "date", FacetKind::Query(queries), options);
        let mut store = ParameterStore::new();
        widget.init_store(&mut store).unwrap();

        let params = store.entry("facet.query").unwrap().params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].local("key"), Some("'today'"));
        assert_eq!(params[0].local("ex"), Some("date"));
        assert_eq!(params[1].local("key"), Some(r"'it\'s old'"));
    }

    #[test]
    fn query_facet_without_queries_is_a_config_error() {
        let widget = FacetWidget::new("date", "date", FacetKind::Query(Vec::new()), FacetOptions::default());
        let err = widget.init_store(&mut ParameterStore::new()).unwrap_err();
        assert_eq!(err, ConfigError::MissingFacetQueries { field: "date".into() });
    }

    #[test]
    fn invalid_patterns_fail_init() {
        let options = FacetOptions { include: Some("(".into()), ..Default::default() };
        let mut widget = FacetWidget::new("w", "type", FacetKind::Field, options);
        let err = widget.init(&mut ParameterStore::new()).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::InvalidPattern { option: "include", .. })));
    }

    #[test]
    fn option_semantics() {
        let union = FacetWidget::new("a", "color", FacetKind::Field, FacetOptions { union: true, ..Default::default() });
        assert!(union.selection().multivalue && union.selection().union);
        assert_eq!(union.selection().tag, None);

        let multi = FacetWidget::new("b", "tags", FacetKind::Field, FacetOptions { multi_value: true, ..Default::default() });
        assert!(multi.selection().multivalue && !multi.selection().union);
        assert_eq!(multi.selection().tag.as_deref(), Some("tags"));

        let tagged = FacetOptions { tag: Some("t".into()), exclusion: true, ..Default::default() };
        let tagged = FacetWidget::new("c", "kind", FacetKind::Field, tagged);
        assert_eq!(tagged.selection().tag.as_deref(), Some("t"));
        assert_eq!(tagged.ex.as_deref(), Some("t"));
    }

    #[test]
    fn field_list_collects_every_facet_field() {
        let mut store = ParameterStore::new();
        store.add_by_value("fl", "id");
        for field in ["type", "author", "type"] {
            let mut widget = FacetWidget::new(field, field, FacetKind::Detect, FacetOptions::default());
            widget.init(&mut store).unwrap();
        }
        assert_eq!(store.values("fl"), vec![ParamValue::from(vec!["id", "type", "author"])]);
    }

    #[test]
    fn default_value_is_selected_at_init() {
        let options = FacetOptions { default_value: Some("doc".into()), ..Default::default() };
        let mut widget = FacetWidget::new("type", "type", FacetKind::Field, options);
        let mut store = ParameterStore::new();
        widget.init(&mut store).unwrap();
        assert_eq!(store.values("fq"), vec![ParamValue::from("type:doc")]);
        assert!(widget.is_selected(&store, "doc"));
        assert!(!widget.is_selected(&store, "pdf"));
    }

    #[test]
    fn counts_are_filtered_and_optionally_reversed() {
        let data = response(json!({
            "facet_counts": {"facet_fields": {"type": ["doc", 9, "draft", 4, "pdf", 0, "img", 2]}}
        }));
        let options = FacetOptions {
            exclude: Some("^draft$".into()),
            sort_reverse: true,
            ..Default::default()
        };
        let mut widget = FacetWidget::new("type", "type", FacetKind::Field, options);
        widget.init(&mut ParameterStore::new()).unwrap();
        widget.after_request(&ParameterStore::new(), &data);

        let labels = widget.counts().iter().map(|c| c.facet.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["img", "doc"]);
    }

    #[test]
    fn zero_mincount_disables_filtering() {
        let data = response(json!({"facet_counts": {"facet_fields": {"type": ["doc", 9, "pdf", 0]}}}));
        let options = FacetOptions {
            mincount: 0,
            include: Some("^doc$".into()),
            sort_reverse: true,
            ..Default::default()
        };
        let mut widget = FacetWidget::new("type", "type", FacetKind::Field, options);
        widget.init(&mut ParameterStore::new()).unwrap();
        assert_eq!(widget.facet_counts(&data).len(), 2);
        assert_eq!(widget.facet_counts(&data)[0].facet, "doc");
    }

    #[test]
    fn detected_type_is_remembered() {
        let data = response(json!({"facet_counts": {"facet_dates": {"created": [["2024", 3]]}}}));
        let mut widget = FacetWidget::new("created", "created", FacetKind::Detect, FacetOptions::default());
        assert_eq!(widget.facet_type(), None);
        widget.after_request(&ParameterStore::new(), &data);
        assert_eq!(widget.facet_type(), Some(FacetType::FacetDates));
        assert_eq!(widget.counts(), &[FacetCount { facet: "2024".into(), count: 3 }]);
    }

    #[test]
    fn failed_requests_clear_counts() {
        let data = response(json!({"facet_counts": {"facet_fields": {"type": ["doc", 1]}}}));
        let mut widget = FacetWidget::new("type", "type", FacetKind::Field, FacetOptions::default());
        widget.after_request(&ParameterStore::new(), &data);
        assert_eq!(widget.counts().len(), 1);
        widget.request_failed(&anyhow::anyhow!("boom"));
        assert!(widget.counts().is_empty());
    }

    #[test]
    fn named_queries_are_selected_by_key() {
        let queries = vec![FacetQuery { key: "today".into(), value: "date:[NOW/DAY TO *]".into() }];
        let widget = FacetWidget::new("date", "date", FacetKind::Query(queries), FacetOptions::default());
        let mut store = ParameterStore::new();

        assert!(widget.select("today").apply(&mut store));
        assert_eq!(store.values("fq"), vec![ParamValue::from("date:[NOW/DAY TO *]")]);
        assert!(widget.is_selected(&store, "today"));
        assert!(widget.deselect("today").apply(&mut store));
        assert!(!widget.is_selected(&store, "today"));
    }
}
