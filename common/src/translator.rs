//! Display translations for field names and facet values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::search_const::DEFAULT_DICTIONARY;


#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dictionary {
    pub id: String,
    pub data: HashMap<String, String>,
    /// Dictionary consulted for keys missing here.
    pub sub_dictionary: Option<String>,
}

impl Dictionary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_sub_dictionary(mut self, id: impl Into<String>) -> Self {
        self.sub_dictionary = Some(id.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.data.insert(key.trim().to_string(), value.into());
    }
}

/// Named dictionaries, looked up by id. Without an explicit `default`
/// dictionary the first one added takes its place.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    dictionaries: HashMap<String, Dictionary>,
    first: Option<String>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, dictionary: Dictionary) {
        if self.first.is_none() {
            self.first = Some(dictionary.id.clone());
        }
        self.dictionaries.insert(dictionary.id.clone(), dictionary);
    }

    pub fn with(mut self, dictionary: Dictionary) -> Self {
        self.add(dictionary);
        self
    }

    fn dictionary(&self, id: &str) -> Option<&Dictionary> {
        self.dictionaries.get(id).or_else(|| {
            if id == DEFAULT_DICTIONARY {
                self.dictionaries.get(self.first.as_deref()?)
            } else {
                None
            }
        })
    }

    /// Translates `key` with dictionary `id` (`default` when `None`). Unknown
    /// keys come back unchanged.
    pub fn lookup(&self, key: &str, id: Option<&str>) -> String {
        let Some(mut dictionary) = self.dictionary(id.unwrap_or(DEFAULT_DICTIONARY)) else {
            return key.to_string();
        };
        let key = key.trim();
        let mut visited = vec![dictionary.id.as_str()];
        loop {
            if let Some(value) = dictionary.data.get(key) {
                return value.clone();
            }
            let next = dictionary
                .sub_dictionary
                .as_deref()
                .filter(|sub| !visited.contains(sub))
                .and_then(|sub| self.dictionary(sub));
            match next {
                Some(sub) => {
                    visited.push(sub.id.as_str());
                    dictionary = sub;
                }
                None => return key.to_string(),
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        let mut fields = Dictionary::new("fields").with_sub_dictionary("common");
        fields.set("type", "Type");
        let mut common = Dictionary::new("common");
        common.set(" doc ", "Document");
        Translator::new().with(fields).with(common)
    }

    #[test]
    fn looks_up_with_fallback_to_the_sub_dictionary() {
        let translator = translator();
        assert_eq!(translator.lookup("type", Some("fields")), "Type");
        assert_eq!(translator.lookup("  doc ", Some("fields")), "Document");
        assert_eq!(translator.lookup("pdf", Some("fields")), "pdf");
    }

    #[test]
    fn first_dictionary_stands_in_for_default() {
        assert_eq!(translator().lookup("type", None), "Type");
        let mut default = Dictionary::new("default");
        default.set("type", "Kind");
        assert_eq!(translator().with(default).lookup("type", None), "Kind");
    }

    #[test]
    fn unknown_dictionaries_and_cycles_return_the_key() {
        assert_eq!(Translator::new().lookup(" as is ", None), " as is ");
        let a = Dictionary::new("a").with_sub_dictionary("b");
        let b = Dictionary::new("b").with_sub_dictionary("a");
        assert_eq!(Translator::new().with(a).with(b).lookup("x", Some("a")), "x");
    }
}
