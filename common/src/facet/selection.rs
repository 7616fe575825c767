//! Selected values of one facet field, kept as `fq` entries of the store.
//!
//! A field is unselected when no `fq` matches `^-?field:`. Intersection
//! facets keep one `fq` per selected value; union facets keep a single
//! `field:(a b ...)` group evaluated with `q.op=OR`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    facet::filter::{build_fq, field_pattern, group_fq, group_pattern, selected_values},
    parameter::Parameter,
    parameter_store::{Found, ParamEntry, ParameterStore},
    widgets::StoreAction,
};

const FQ: &str = "fq";


#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacetSelection {
    pub field: String,
    /// More than one value may be selected at a time.
    pub multivalue: bool,
    /// Selected values are OR'ed inside one filter instead of AND'ed.
    pub union: bool,
    /// Tag put on the filters, so facets can exclude them from their counts.
    pub tag: Option<String>,
}

impl FacetSelection {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Default::default()
        }
    }

    pub fn fq(&self, value: &str, exclude: bool) -> String {
        build_fq(&self.field, value, exclude)
    }

    fn matching(&self, store: &ParameterStore) -> Vec<usize> {
        match store.find(FQ, field_pattern(&self.field)) {
            Some(Found::Indices(indices)) => indices,
            _ => Vec::new(),
        }
    }

    /// Index of the OR group that union operations rewrite.
    fn first_group(&self, store: &ParameterStore) -> Option<usize> {
        match store.find(FQ, group_pattern(&self.field)) {
            Some(Found::Indices(indices)) => indices.first().copied(),
            _ => None,
        }
    }

    fn fq_at(store: &mut ParameterStore, index: usize) -> Option<&mut Parameter> {
        store.entry_mut(FQ).and_then(|entry| entry.params_mut().get_mut(index))
    }

    pub fn is_empty(&self, store: &ParameterStore) -> bool {
        self.matching(store).is_empty()
    }

    /// The selected values, escaped as they appear in the filters.
    pub fn query_values(&self, store: &ParameterStore) -> Vec<String> {
        let params = store.entry(FQ).map(ParamEntry::params).unwrap_or_default();
        let fqs = self
            .matching(store)
            .into_iter()
            .filter_map(|index| params.get(index)?.val()?.as_str());
        selected_values(&self.field, self.union, fqs)
    }

    /// Position of `value` among [`FacetSelection::query_values`].
    pub fn in_query(&self, store: &ParameterStore, value: &str) -> Option<usize> {
        let escaped = Parameter::escape_value(value);
        self.query_values(store).iter().position(|selected| *selected == escaped)
    }

    /// Makes `value` the only selection of the field. Selecting the value that
    /// already is the only selection changes nothing.
    pub fn set(&self, store: &mut ParameterStore, value: &str) -> bool {
        let fq = self.fq(value, false);
        let matching = self.matching(store);
        if let [index] = matching[..] {
            let current = store.entry(FQ).and_then(|entry| entry.params().get(index)?.val()?.as_str());
            if current == Some(fq.as_str()) {
                debug!("{} is already set to {}", self.field, fq);
                return false;
            }
        }

        let removed = store.remove_by_value(FQ, field_pattern(&self.field)).is_some();
        let added = self.add_tagged(store, fq);
        removed || added
    }

    /// Adds one more filter; a value that is already selected changes nothing.
    pub fn add(&self, store: &mut ParameterStore, value: &str) -> bool {
        let fq = self.fq(value, false);
        self.add_tagged(store, fq)
    }

    fn add_tagged(&self, store: &mut ParameterStore, fq: String) -> bool {
        let Some(param) = store.add_by_value(FQ, fq) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            param.set_local("tag", tag);
        }
        true
    }

    /// Adds `value` to the field's OR group, creating the group if needed.
    pub fn append(&self, store: &mut ParameterStore, value: &str) -> bool {
        let value = Parameter::escape_value(value);

        let Some(first) = self.first_group(store) else {
            let Some(param) = store.add_by_value(FQ, group_fq(&self.field, &[value])) else {
                return false;
            };
            if let Some(tag) = &self.tag {
                param.set_local("tag", tag);
            }
            param.set_local("q.op", "OR");
            return true;
        };

        let mut values = self.query_values(store);
        if values.contains(&value) {
            return false;
        }
        values.push(value);
        let group = group_fq(&self.field, &values);
        match Self::fq_at(store, first) {
            Some(param) => {
                param.set_val(group);
                true
            }
            None => false,
        }
    }

    /// Deselects `value`. A union group losing its last member is removed.
    pub fn remove(&self, store: &mut ParameterStore, value: &str) -> bool {
        if self.multivalue && self.union {
            if let Some(first) = self.first_group(store) {
                let value = Parameter::escape_value(value);
                let values = self.query_values(store);
                if !values.contains(&value) {
                    return false;
                }
                let remaining = values.into_iter().filter(|v| *v != value).collect::<Vec<_>>();
                if remaining.is_empty() {
                    store.remove(FQ, Some(first));
                } else if let Some(param) = Self::fq_at(store, first) {
                    param.set_val(group_fq(&self.field, &remaining));
                }
                return true;
            }
        }

        store.remove_by_value(FQ, self.fq(value, false)).is_some()
    }

    /// Drops every filter of the field, union groups and negations included.
    pub fn clear(&self, store: &mut ParameterStore) -> bool {
        store.remove_by_value(FQ, field_pattern(&self.field)).is_some()
    }

    /// The operation a click on `value` performs, chosen by the selection mode.
    pub fn click(&self, value: &str) -> FacetAction {
        let op = match (self.multivalue, self.union) {
            (false, _) => FacetOp::Set,
            (true, false) => FacetOp::Add,
            (true, true) => FacetOp::Append,
        };
        self.action(op, value)
    }

    pub fn unclick(&self, value: &str) -> FacetAction {
        self.action(FacetOp::Remove, value)
    }

    pub fn action(&self, op: FacetOp, value: &str) -> FacetAction {
        FacetAction {
            selection: self.clone(),
            op,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacetOp {
    Set,
    Add,
    Append,
    Remove,
    Clear,
}

/// A deferred selection change, re-requesting from the first result when it
/// changed anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetAction {
    pub selection: FacetSelection,
    pub op: FacetOp,
    pub value: String,
}

impl StoreAction for FacetAction {
    fn apply(&self, store: &mut ParameterStore) -> bool {
        let selection = &self.selection;
        match self.op {
            FacetOp::Set => selection.set(store, &self.value),
            FacetOp::Add => selection.add(store, &self.value),
            FacetOp::Append => selection.append(store, &self.value),
            FacetOp::Remove => selection.remove(store, &self.value),
            FacetOp::Clear => selection.clear(store),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParamValue;

    fn union(field: &str) -> FacetSelection {
        FacetSelection {
            field: field.into(),
            multivalue: true,
            union: true,
            tag: Some(field.into()),
        }
    }

    fn intersection(field: &str) -> FacetSelection {
        FacetSelection {
            multivalue: true,
            ..FacetSelection::new(field)
        }
    }

    fn fqs(store: &ParameterStore) -> Vec<ParamValue> {
        store.values(FQ)
    }

    #[test]
    fn union_append_and_remove() {
        let mut store = ParameterStore::new();
        let color = union("color");
        assert!(color.append(&mut store, "A"));
        assert!(color.append(&mut store, "B"));
        assert!(color.remove(&mut store, "A"));
        assert_eq!(fqs(&store), vec![ParamValue::from("color:(B)")]);
    }

    #[test]
    fn union_group_carries_tag_and_or_operator() {
        let mut store = ParameterStore::new();
        let color = union("color");
        color.append(&mut store, "red");
        color.append(&mut store, "dark blue");
        assert_eq!(store.string(), "fq={!tag=color%20q.op=OR}color%3A(red%20%22dark%20blue%22)");
        assert_eq!(color.query_values(&store), vec!["red", "\"dark blue\""]);
        assert_eq!(color.in_query(&store, "dark blue"), Some(1));
    }

    #[test]
    fn union_append_of_a_member_is_a_no_op() {
        let mut store = ParameterStore::new();
        let color = union("color");
        color.append(&mut store, "red");
        assert!(!color.append(&mut store, "red"));
        assert_eq!(fqs(&store).len(), 1);
    }

    #[test]
    fn union_group_without_tag_still_uses_or() {
        let mut store = ParameterStore::new();
        let color = FacetSelection { tag: None, ..union("color") };
        color.append(&mut store, "red");
        assert_eq!(store.string(), "fq={!q.op=OR}color%3A(red)");
    }

    #[test]
    fn union_remove_of_the_last_member_drops_the_filter() {
        let mut store = ParameterStore::new();
        store.add_by_value(FQ, "type:doc");
        let color = union("color");
        color.append(&mut store, "red");
        assert!(!color.remove(&mut store, "green"));
        assert!(color.remove(&mut store, "red"));
        assert!(color.is_empty(&store));
        assert_eq!(fqs(&store), vec![ParamValue::from("type:doc")]);
    }

    #[test]
    fn union_operations_leave_negated_groups_alone() {
        let mut store = ParameterStore::new();
        store.add_by_value(FQ, "-color:(x)");
        let color = union("color");
        assert!(color.append(&mut store, "red"));
        assert!(color.append(&mut store, "blue"));
        assert_eq!(color.query_values(&store), vec!["red", "blue"]);
        assert!(!color.remove(&mut store, "x"));
        assert!(color.remove(&mut store, "red"));
        assert_eq!(
            fqs(&store),
            vec![ParamValue::from("-color:(x)"), ParamValue::from("color:(blue)")]
        );
    }

    #[test]
    fn intersection_add_and_remove() {
        let mut store = ParameterStore::new();
        let tags = intersection("tags");
        assert!(tags.add(&mut store, "A"));
        assert!(tags.add(&mut store, "B"));
        assert!(!tags.add(&mut store, "B"));
        assert!(tags.remove(&mut store, "A"));
        assert_eq!(fqs(&store), vec![ParamValue::from("tags:B")]);
        assert!(!tags.is_empty(&store));
        assert!(!tags.remove(&mut store, "A"));
    }

    #[test]
    fn set_replaces_the_selection() {
        let mut store = ParameterStore::new();
        let kind = FacetSelection {
            tag: Some("k".into()),
            ..FacetSelection::new("kind")
        };
        assert!(kind.set(&mut store, "a"));
        assert!(kind.set(&mut store, "b"));
        assert_eq!(store.string(), "fq={!tag=k}kind%3Ab");
    }

    // Decision point: setting the current single value is reported as no change.
    #[test]
    fn set_to_the_current_value_is_a_no_op() {
        let mut store = ParameterStore::new();
        let kind = FacetSelection::new("kind");
        assert!(kind.set(&mut store, "a"));
        assert!(!kind.set(&mut store, "a"));
        assert_eq!(fqs(&store), vec![ParamValue::from("kind:a")]);

        // two filters collapse into one even if one of them has the value
        store.add_by_value(FQ, "-kind:b");
        assert!(kind.set(&mut store, "a"));
        assert_eq!(fqs(&store), vec![ParamValue::from("kind:a")]);
    }

    #[test]
    fn clear_after_mixed_operations() {
        let mut store = ParameterStore::new();
        let tags = intersection("tags");
        tags.add(&mut store, "a");
        tags.set(&mut store, "b");
        tags.add(&mut store, "c");
        store.add_by_value(FQ, "-tags:d");
        union("tags").append(&mut store, "e");
        store.add_by_value(FQ, "other:x");

        assert!(tags.clear(&mut store));
        assert!(tags.is_empty(&store));
        assert_eq!(fqs(&store), vec![ParamValue::from("other:x")]);
        assert!(!tags.clear(&mut store));
    }

    #[test]
    fn quoted_values_are_matched_escaped() {
        let mut store = ParameterStore::new();
        let author = intersection("author");
        author.add(&mut store, "John Doe");
        assert_eq!(fqs(&store), vec![ParamValue::from("author:\"John Doe\"")]);
        assert_eq!(author.in_query(&store, "John Doe"), Some(0));
        assert!(author.remove(&mut store, "John Doe"));
    }

    #[test]
    fn click_picks_the_operation_from_the_mode() {
        assert_eq!(FacetSelection::new("f").click("x").op, FacetOp::Set);
        assert_eq!(intersection("f").click("x").op, FacetOp::Add);
        assert_eq!(union("f").click("x").op, FacetOp::Append);
        assert_eq!(union("f").unclick("x").op, FacetOp::Remove);
    }

    #[test]
    fn actions_report_whether_they_changed_the_store() {
        let mut store = ParameterStore::new();
        let action = intersection("tags").click("a");
        assert!(action.apply(&mut store));
        assert!(!action.apply(&mut store));
        assert_eq!(action.start(), Some(0));
    }
}
