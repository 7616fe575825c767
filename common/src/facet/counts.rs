//! Normalizes the four facet count layouts of a Solr response into one list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub facet: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetType {
    /// `["x", 3, "y", 5]`
    FacetFields,
    /// `[["x", 3], ["y", 5]]`
    FacetDates,
    /// `{"x": 3, "y": 5}`, not keyed by field
    FacetQueries,
    /// `{"counts": ["x", 3, "y", 5], ...}`
    FacetRanges,
}

impl FacetType {
    pub const ALL: [FacetType; 4] = [
        FacetType::FacetFields,
        FacetType::FacetDates,
        FacetType::FacetQueries,
        FacetType::FacetRanges,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::FacetFields => "facet_fields",
            Self::FacetDates => "facet_dates",
            Self::FacetQueries => "facet_queries",
            Self::FacetRanges => "facet_ranges",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|facet_type| facet_type.key() == key)
    }

    /// The first section of `facet_counts`, in response order, holding an entry for `field`.
    pub fn detect(facet_counts: &Map<String, Value>, field: &str) -> Option<Self> {
        facet_counts
            .iter()
            .filter(|(_, section)| section.get(field).is_some())
            .find_map(|(key, _)| Self::from_key(key))
    }
}

/// Counts of `field` from a response's `facet_counts`. Without a known type
/// the flat layout is assumed; missing sections yield an empty list.
pub fn facet_counts(facet_counts: Option<&Map<String, Value>>, facet_type: Option<FacetType>, field: &str) -> Vec<FacetCount> {
    let Some(facet_counts) = facet_counts else {
        return Vec::new();
    };
    let facet_type = facet_type.unwrap_or(FacetType::FacetFields);
    let Some(section) = facet_counts.get(facet_type.key()) else {
        return Vec::new();
    };

    match facet_type {
        FacetType::FacetQueries => parse_map(section),
        _ => {
            let Some(values) = section.get(field) else {
                return Vec::new();
            };
            match facet_type {
                FacetType::FacetDates => parse_pairs(values),
                FacetType::FacetRanges => parse_range(values),
                _ => parse_flat(values),
            }
        }
    }
}

pub fn parse_flat(values: &Value) -> Vec<FacetCount> {
    let Some(values) = values.as_array() else {
        return Vec::new();
    };
    values
        .chunks(2)
        .filter_map(|chunk| facet_count(&chunk[0], chunk.get(1)?))
        .collect()
}

pub fn parse_pairs(values: &Value) -> Vec<FacetCount> {
    let Some(values) = values.as_array() else {
        return Vec::new();
    };
    values
        .iter()
        .filter_map(|pair| {
            let pair = pair.as_array()?;
            facet_count(pair.first()?, pair.get(1)?)
        })
        .collect()
}

pub fn parse_map(values: &Value) -> Vec<FacetCount> {
    let Some(values) = values.as_object() else {
        return Vec::new();
    };
    values
        .iter()
        .filter_map(|(facet, count)| {
            Some(FacetCount {
                facet: facet.clone(),
                count: parse_count(count)?,
            })
        })
        .collect()
}

pub fn parse_range(values: &Value) -> Vec<FacetCount> {
    values.get("counts").map(parse_flat).unwrap_or_default()
}

fn facet_count(facet: &Value, count: &Value) -> Option<FacetCount> {
    Some(FacetCount {
        facet: label(facet),
        count: parse_count(count)?,
    })
}

/// `facet.missing` reports its bucket with a null label.
fn label(facet: &Value) -> String {
    match facet {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Integer coercion: numbers are truncated, strings are read up to the first
/// non-digit. Anything else, or a negative number, is no count at all.
pub fn parse_count(count: &Value) -> Option<u64> {
    match count {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(s) => {
            let s = s.trim_start();
            let s = s.strip_prefix('+').unwrap_or(s);
            let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
            s[..end].parse().ok()
        }
        _ => None,
    }
}
