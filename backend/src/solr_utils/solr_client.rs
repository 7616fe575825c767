use common::manager::Transport;
use serde_json::Value;
use tracing::info;

use crate::config::{SolrConfig, with_trailing_slash};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    /// GET `{base}{servlet}?{query}&wt=json`
    Direct(String),
    /// POST `{base}{servlet}` with the query in the `query` form field.
    Proxy(String),
}

#[derive(Debug, Clone)]
pub struct SolrClient {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl SolrClient {
    pub fn direct(solr_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: Endpoint::Direct(with_trailing_slash(solr_url)),
        }
    }

    pub fn proxied(proxy_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: Endpoint::Proxy(with_trailing_slash(proxy_url)),
        }
    }

    pub fn from_config(config: &SolrConfig) -> Self {
        match &config.proxy_url {
            Some(proxy_url) => Self::proxied(proxy_url),
            None => Self::direct(&config.solr_url),
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(&SolrConfig::from_env())
    }

    /// Runs `query` against `servlet` and returns the raw response body.
    pub async fn select(&self, servlet: &str, query: &str) -> anyhow::Result<String> {
        let t0 = std::time::Instant::now();
        let response = match &self.endpoint {
            Endpoint::Direct(base) => self.client.get(select_url(base, servlet, query)).send().await?,
            Endpoint::Proxy(base) => {
                self.client
                    .post(format!("{}{}", base, servlet))
                    .form(&[("query", query)])
                    .send()
                    .await?
            }
        };
        let status = response.status();
        let response_txt = response.text().await?;
        if status.is_client_error() || status.is_server_error() {
            anyhow::bail!("Error: {}: {}", status, response_txt);
        }
        let dt_ms = t0.elapsed().as_millis() as u32;
        info!("SOLR RESPONSE: {} len = {} ({}ms)", servlet, response_txt.len(), dt_ms);
        Ok(response_txt)
    }
}

fn select_url(base: &str, servlet: &str, query: &str) -> String {
    if query.is_empty() {
        format!("{}{}?wt=json", base, servlet)
    } else {
        format!("{}{}?{}&wt=json", base, servlet, query)
    }
}

impl Transport for SolrClient {
    async fn execute(&self, servlet: &str, query: &str) -> anyhow::Result<Value> {
        let response_txt = self.select(servlet, query).await?;
        let response: Value = serde_json::from_str(&response_txt)?;
        Ok(response)
    }
}
