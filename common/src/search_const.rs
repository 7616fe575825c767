//! Constants shared by the search state core.

use std::time::Duration;

/// Parameters Solr accepts more than once per request.
pub const REPEATABLE_PARAMETERS: &[&str] = &[
    "bf",
    "bq",
    "facet.date",
    "facet.date.other",
    "facet.date.include",
    "facet.field",
    "facet.pivot",
    "facet.range",
    "facet.range.other",
    "facet.range.include",
    "facet.query",
    "fq",
    "group.field",
    "group.func",
    "group.query",
    "pf",
    "qf",
];

pub const DEFAULT_HASH_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub const DEFAULT_SOLR_URL: &str = "http://localhost:8983/solr/";
pub const DEFAULT_SERVLET: &str = "select";

/// Page size assumed when a response does not echo `rows`.
pub const DEFAULT_ROWS: u64 = 20;

/// Solr's own result order, left out of requests.
pub const DEFAULT_SORT: &str = "score desc";

pub const DEFAULT_DICTIONARY: &str = "default";
