//! Sends the page's queries through the server's `/solr/{servlet}` proxy route.

use common::manager::Transport;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ProxyTransport {
    client: reqwest::Client,
    proxy_url: String,
}

impl ProxyTransport {
    pub fn new(proxy_url: &str) -> Self {
        let proxy_url = if proxy_url.ends_with('/') {
            proxy_url.to_string()
        } else {
            format!("{}/", proxy_url)
        };
        Self {
            client: reqwest::Client::new(),
            proxy_url,
        }
    }

    pub fn endpoint(&self, servlet: &str) -> String {
        format!("{}{}", self.proxy_url, servlet)
    }
}

impl Transport for ProxyTransport {
    async fn execute(&self, servlet: &str, query: &str) -> anyhow::Result<Value> {
        let response = self
            .client
            .post(self.endpoint(servlet))
            .form(&[("query", query)])
            .send()
            .await?;
        let status = response.status();
        let response_txt = response.text().await?;
        if status.is_client_error() || status.is_server_error() {
            anyhow::bail!("Error: {}: {}", status, response_txt);
        }
        debug!("search response: len = {}", response_txt.len());
        Ok(serde_json::from_str(&response_txt)?)
    }
}
