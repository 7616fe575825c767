//! Building and taking apart `fq` values of a facet field.

use std::sync::LazyLock;

use regex::Regex;

use crate::{parameter::Parameter, string_list::parse_string_list};

static FIELD_EXPRESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\[].*:.*$").expect("field expression regex"));

fn compile(pattern: String) -> Regex {
    // only ever called with an escaped field name
    Regex::new(&pattern).expect("escaped field pattern")
}

/// Matches every `fq` value restricting `field`, negated ones included.
pub fn field_pattern(field: &str) -> Regex {
    compile(format!("^-?{}:", regex::escape(field)))
}

fn value_pattern(field: &str) -> Regex {
    compile(format!("^-?{}:(.*)", regex::escape(field)))
}

/// Matches the OR groups of `field`. Negated groups are not selections.
pub fn group_pattern(field: &str) -> Regex {
    compile(format!(r"^{}:\((.*)\)", regex::escape(field)))
}

/// Whether `value` already names a field, as in `type:doc`. Ranges such as
/// `[* TO 10:00]` do not count.
pub fn is_field_expression(value: &str) -> bool {
    FIELD_EXPRESSION_RE.is_match(value)
}

/// One filter for `field`. Field expressions keep their own field and only
/// their value part is escaped; `exclude` negates the filter.
pub fn build_fq(field: &str, value: &str, exclude: bool) -> String {
    let sign = if exclude { "-" } else { "" };
    match value.split_once(':') {
        Some((own_field, rest)) if is_field_expression(value) => {
            format!("{}{}:{}", sign, own_field, Parameter::escape_value(rest))
        }
        _ => format!("{}{}:{}", sign, field, Parameter::escape_value(value)),
    }
}

/// The OR group `field:(a b c)` of already escaped values.
pub fn group_fq(field: &str, values: &[String]) -> String {
    format!("{}:({})", field, values.join(" "))
}

/// The selected values found in `fq` values of `field`. In union mode only
/// the first OR group counts, split into its members; otherwise values that
/// do not fit the expected shape are skipped.
pub fn selected_values<'a>(field: &str, union: bool, fqs: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    if union {
        let pattern = group_pattern(field);
        return fqs
            .into_iter()
            .find_map(|fq| pattern.captures(fq).map(|captures| parse_string_list(&captures[1])))
            .unwrap_or_default();
    }
    let pattern = value_pattern(field);
    fqs.into_iter()
        .filter_map(|fq| Some(pattern.captures(fq)?[1].to_string()))
        .collect()
}
