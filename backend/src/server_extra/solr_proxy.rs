use std::sync::Arc;

use axum::{
    Form, Router,
    body::Body,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::post,
};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::info;

use crate::solr_utils::solr_client::SolrClient;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProxyForm {
    pub query: String,
}

/// Servlet names are path segments of the Solr core, nothing else.
fn is_servlet_name(servlet: &str) -> bool {
    !servlet.is_empty() && servlet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

async fn _solr_proxy(client: &SolrClient, servlet: &str, query: &str) -> anyhow::Result<impl IntoResponse> {
    info!("Proxying solr request: {}?{}", servlet, query);
    let response_txt = client.select(servlet, query).await?;
    let headers = [("Content-Type", "application/json; charset=utf-8")];
    Ok((headers, response_txt))
}

pub async fn solr_proxy(
    State(client): State<Arc<SolrClient>>,
    Path(servlet): Path<String>,
    Form(form): Form<ProxyForm>,
) -> Response {
    if !is_servlet_name(&servlet) {
        return (StatusCode::BAD_REQUEST, Body::from(format!("invalid servlet: {}", servlet))).into_response();
    }
    match _solr_proxy(&client, &servlet, &form.query).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!("solr_proxy: request failed: {:#?}", e);
            return (StatusCode::BAD_GATEWAY, Body::from(e.to_string())).into_response();
        }
    }
}

/// `POST /solr/{servlet}` forwarding the `query` form field to Solr.
pub fn router(client: SolrClient) -> Router {
    Router::new()
        .route("/solr/{servlet}", post(solr_proxy))
        .with_state(Arc::new(client))
}


#[cfg(test)]
mod tests {
    use common::manager::Transport;

    use super::*;
    use crate::test_support::{fake_solr, serve};

    async fn proxy_in_front_of_fake_solr() -> SolrClient {
        let solr_url = serve(fake_solr()).await;
        let proxy_url = serve(router(SolrClient::direct(&solr_url))).await;
        SolrClient::proxied(&proxy_url)
    }

    #[test]
    fn only_plain_servlet_names_are_forwarded() {
        assert!(is_servlet_name("select"));
        assert!(is_servlet_name("spell_check"));
        assert!(!is_servlet_name(""));
        assert!(!is_servlet_name("admin%2Fcores"));
        assert!(!is_servlet_name("select?qt=x"));
    }

    #[tokio::test]
    async fn forwards_the_query_field() {
        let client = proxy_in_front_of_fake_solr().await;
        let response = client.execute("select", "q=hello&fq=web%3AMain").await.unwrap();
        assert_eq!(response["responseHeader"]["params"]["raw"], "q=hello&fq=web%3AMain&wt=json");
    }

    #[tokio::test]
    async fn upstream_failure_is_a_bad_gateway() {
        let client = proxy_in_front_of_fake_solr().await;
        let error = client.execute("broken", "q=x").await.unwrap_err();
        assert!(error.to_string().starts_with("Error: 502"));
    }
}
