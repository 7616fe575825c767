//! Ordered store of Solr parameters plus the persistence hooks built on it.

use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::{
    parameter::{Locals, ParamValue, Parameter},
    search_const::REPEATABLE_PARAMETERS,
    url_encoding::decode_component,
};


#[derive(Debug, Clone, PartialEq)]
pub enum ParamEntry {
    Single(Parameter),
    /// Never empty: the entry is dropped together with its last parameter.
    Multiple(Vec<Parameter>),
}

impl ParamEntry {
    pub fn params(&self) -> &[Parameter] {
        match self {
            Self::Single(param) => std::slice::from_ref(param),
            Self::Multiple(list) => list,
        }
    }

    pub fn params_mut(&mut self) -> &mut [Parameter] {
        match self {
            Self::Single(param) => std::slice::from_mut(param),
            Self::Multiple(list) => list,
        }
    }

    /// The single parameter, or the first of a repeatable list.
    pub fn primary(&self) -> &Parameter {
        &self.params()[0]
    }

    pub fn primary_mut(&mut self) -> &mut Parameter {
        &mut self.params_mut()[0]
    }
}

/// What to look for in [`ParameterStore::find`]: an exact value or a pattern
/// that is matched against single string values.
#[derive(Debug, Clone)]
pub enum ValueMatch {
    Exact(Option<ParamValue>),
    Pattern(Regex),
}

impl ValueMatch {
    pub fn matches(&self, value: Option<&ParamValue>) -> bool {
        match self {
            Self::Exact(expected) => expected.as_ref() == value,
            Self::Pattern(re) => value
                .and_then(ParamValue::as_str)
                .is_some_and(|s| re.is_match(s)),
        }
    }
}

impl From<&str> for ValueMatch {
    fn from(value: &str) -> Self {
        Self::Exact(Some(value.into()))
    }
}

impl From<String> for ValueMatch {
    fn from(value: String) -> Self {
        Self::Exact(Some(value.into()))
    }
}

impl From<ParamValue> for ValueMatch {
    fn from(value: ParamValue) -> Self {
        Self::Exact(Some(value))
    }
}

impl From<Regex> for ValueMatch {
    fn from(value: Regex) -> Self {
        Self::Pattern(value)
    }
}

impl From<&Regex> for ValueMatch {
    fn from(value: &Regex) -> Self {
        Self::Pattern(value.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    /// Positions inside a repeatable parameter list, ascending.
    Indices(Vec<usize>),
    /// The single-valued parameter matched.
    Name,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    params: Vec<(String, ParamEntry)>,
    /// Names of the parameters persisted in navigation state.
    pub exposed: Vec<String>,
    /// Literal `name=value` pairs that are always sent but never exposed.
    pub hidden: Vec<String>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exposed<I: IntoIterator<Item = S>, S: Into<String>>(mut self, exposed: I) -> Self {
        self.exposed = exposed.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hidden<I: IntoIterator<Item = S>, S: Into<String>>(mut self, hidden: I) -> Self {
        self.hidden = hidden.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_multiple(name: &str) -> bool {
        REPEATABLE_PARAMETERS.contains(&name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|(key, _)| key == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(name, _)| name.as_str())
    }

    pub fn entry(&self, name: &str) -> Option<&ParamEntry> {
        self.params.iter().find(|(key, _)| key == name).map(|(_, entry)| entry)
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut ParamEntry> {
        self.params.iter_mut().find(|(key, _)| key == name).map(|(_, entry)| entry)
    }

    /// Returns the entry for `name`, creating an empty one first if needed.
    pub fn get(&mut self, name: &str) -> &mut ParamEntry {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                let param = Parameter::new(name);
                let entry = if Self::is_multiple(name) {
                    ParamEntry::Multiple(vec![param])
                } else {
                    ParamEntry::Single(param)
                };
                self.params.push((name.to_string(), entry));
                self.params.len() - 1
            }
        };
        &mut self.params[index].1
    }

    /// All set values of `name`; zero or one element for single-valued names.
    pub fn values(&self, name: &str) -> Vec<ParamValue> {
        self.entry(name)
            .map(|entry| entry.params().iter().filter_map(|p| p.val().cloned()).collect())
            .unwrap_or_default()
    }

    /// Appends to a repeatable parameter unless an equal value is present
    /// (`None` is returned then); replaces a single-valued one.
    pub fn add(&mut self, name: &str, param: Parameter) -> Option<&mut Parameter> {
        let Some(index) = self.position(name) else {
            let entry = if Self::is_multiple(name) {
                ParamEntry::Multiple(vec![param])
            } else {
                ParamEntry::Single(param)
            };
            self.params.push((name.to_string(), entry));
            return self.params.last_mut().map(|(_, entry)| entry.primary_mut());
        };

        match &mut self.params[index].1 {
            ParamEntry::Multiple(list) => {
                if list.iter().any(|existing| existing.val() == param.val()) {
                    debug!("rejected duplicate value for {}: {:?}", name, param.val());
                    return None;
                }
                list.push(param);
                list.last_mut()
            }
            entry => {
                *entry = ParamEntry::Single(param);
                Some(entry.primary_mut())
            }
        }
    }

    /// Deletes the whole entry, or a single position of a repeatable list.
    pub fn remove(&mut self, name: &str, index: Option<usize>) {
        let Some(position) = self.position(name) else {
            return;
        };
        let Some(index) = index else {
            self.params.remove(position);
            return;
        };
        let now_empty = match &mut self.params[position].1 {
            ParamEntry::Multiple(list) => {
                if index < list.len() {
                    list.remove(index);
                }
                list.is_empty()
            }
            ParamEntry::Single(_) => index == 0,
        };
        if now_empty {
            self.params.remove(position);
        }
    }

    pub fn find(&self, name: &str, value: impl Into<ValueMatch>) -> Option<Found> {
        let value = value.into();
        match self.entry(name)? {
            ParamEntry::Multiple(list) => {
                let indices = list
                    .iter()
                    .enumerate()
                    .filter(|(_, param)| value.matches(param.val()))
                    .map(|(index, _)| index)
                    .collect::<Vec<_>>();
                (!indices.is_empty()).then_some(Found::Indices(indices))
            }
            ParamEntry::Single(param) => value.matches(param.val()).then_some(Found::Name),
        }
    }

    pub fn add_by_value(&mut self, name: &str, value: impl Into<ParamValue>) -> Option<&mut Parameter> {
        self.add_by_value_with_locals(name, value, Locals::new())
    }

    /// For repeatable names a list value is split into one parameter per item;
    /// the last one actually added is returned.
    pub fn add_by_value_with_locals(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
        locals: Locals,
    ) -> Option<&mut Parameter> {
        match value.into() {
            ParamValue::List(items) if Self::is_multiple(name) => {
                let mut added = false;
                for item in items {
                    let param = Parameter::with_value(name, item).with_locals(locals.clone());
                    added |= self.add(name, param).is_some();
                }
                if !added {
                    return None;
                }
                self.entry_mut(name).and_then(|entry| entry.params_mut().last_mut())
            }
            value => self.add(name, Parameter::with_value(name, value).with_locals(locals)),
        }
    }

    /// Removes every match and hands back what was found.
    pub fn remove_by_value(&mut self, name: &str, value: impl Into<ValueMatch>) -> Option<Found> {
        let found = self.find(name, value)?;
        match &found {
            Found::Indices(indices) => {
                for index in indices.iter().rev() {
                    self.remove(name, Some(*index));
                }
            }
            Found::Name => self.remove(name, None),
        }
        Some(found)
    }

    /// The full query string, in insertion order.
    pub fn string(&self) -> String {
        join_pairs(self.params.iter().flat_map(|(_, entry)| entry.params()))
    }

    /// Adds every `name=value` pair of `s`; empty and malformed segments are skipped.
    pub fn parse_string(&mut self, s: &str) {
        for pair in s.split('&').filter(|pair| !pair.is_empty()) {
            match Parameter::parse_string(pair) {
                Some(param) => {
                    let name = param.name().to_string();
                    self.add(&name, param);
                }
                None => debug!("skipping malformed parameter: {}", pair),
            }
        }
    }

    /// The exposed parameters as a query string, hidden ones left out.
    pub fn exposed_string(&self) -> String {
        let exposed = self
            .exposed
            .iter()
            .filter_map(|name| self.entry(name))
            .flat_map(ParamEntry::params)
            .filter(|param| !self.is_hidden_param(param));
        join_pairs(exposed)
    }

    /// Drops all exposed parameters and re-adds the hidden ones.
    pub fn exposed_reset(&mut self) {
        for name in self.exposed.clone() {
            self.remove(&name, None);
        }
        for hidden in self.hidden.clone() {
            if let Some(param) = Parameter::parse_string(&hidden) {
                let name = param.name().to_string();
                self.add(&name, param);
            }
        }
    }

    /// Exact match against the hidden list.
    pub fn is_hidden(&self, pair: &str) -> bool {
        self.hidden.iter().any(|hidden| hidden == pair)
    }

    pub fn is_hidden_param(&self, param: &Parameter) -> bool {
        self.is_hidden(&decode_component(&param.string()))
    }
}

fn join_pairs<'a>(params: impl Iterator<Item = &'a Parameter>) -> String {
    params
        .map(Parameter::string)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("&")
}

/// Persistence hooks around a [`ParameterStore`]. The plain store persists
/// nothing; [`crate::hash_store::ParameterHashStore`] uses the URL fragment.
pub trait StateStore {
    fn params(&self) -> &ParameterStore;

    fn params_mut(&mut self) -> &mut ParameterStore;

    /// One-time setup, called by the manager after the widgets are initialized.
    fn init(&mut self) {}

    /// Stores the exposed parameters. Called before every request.
    fn save(&mut self) {}

    /// The persisted query string to load from.
    fn stored_string(&self) -> String {
        String::new()
    }

    /// Loads persisted parameters. Resetting first makes sure a name that is
    /// absent from storage does not keep a stale value.
    fn load(&mut self, reset: bool) {
        if reset {
            self.params_mut().exposed_reset();
        }
        let stored = self.stored_string();
        self.params_mut().parse_string(&stored);
    }

    /// Whether the persisted state was changed by someone else since the last save.
    fn external_change(&self) -> bool {
        false
    }

    /// How often [`StateStore::external_change`] should be checked, if at all.
    fn poll_interval(&self) -> Option<Duration> {
        None
    }
}

impl StateStore for ParameterStore {
    fn params(&self) -> &ParameterStore {
        self
    }

    fn params_mut(&mut self) -> &mut ParameterStore {
        self
    }
}
