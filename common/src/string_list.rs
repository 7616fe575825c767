//! Tokenizer for space separated value lists as found inside `field:(a "b c" d)`.

/// Splits on spaces, keeping `"..."` groups (quotes included) as one token.
pub fn parse_string_list(list: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = list.trim_matches(' ');
    while !rest.is_empty() {
        let end = quoted_token_end(rest).unwrap_or_else(|| rest.find(' ').unwrap_or(rest.len()));
        values.push(rest[..end].to_string());
        rest = rest[end..].trim_matches(' ');
    }
    values
}

fn quoted_token_end(s: &str) -> Option<usize> {
    let inner = s.strip_prefix('"')?;
    inner.find('"').map(|pos| pos + 2)
}
