//! Environment based configuration of the Solr connection.

use common::search_const::{DEFAULT_SERVLET, DEFAULT_SOLR_URL};

pub const DEFAULT_PROXY_LISTEN: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrConfig {
    /// Base URL of the Solr core, ending with `/`.
    pub solr_url: String,
    /// When set, requests go through the proxy route instead of straight to Solr.
    pub proxy_url: Option<String>,
    pub servlet: String,
    pub listen: String,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            solr_url: DEFAULT_SOLR_URL.to_string(),
            proxy_url: None,
            servlet: DEFAULT_SERVLET.to_string(),
            listen: DEFAULT_PROXY_LISTEN.to_string(),
        }
    }
}

impl SolrConfig {
    pub fn from_env() -> Self {
        let solr_url = std::env::var("SOLR_URL").unwrap_or(DEFAULT_SOLR_URL.to_string());
        let proxy_url = std::env::var("SOLR_PROXY_URL").ok().filter(|url| !url.is_empty());
        Self {
            solr_url: with_trailing_slash(&solr_url),
            proxy_url: proxy_url.as_deref().map(with_trailing_slash),
            servlet: std::env::var("SOLR_SERVLET").unwrap_or(DEFAULT_SERVLET.to_string()),
            listen: std::env::var("SOLR_PROXY_LISTEN").unwrap_or(DEFAULT_PROXY_LISTEN.to_string()),
        }
    }
}

pub fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
