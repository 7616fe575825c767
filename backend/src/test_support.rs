//! In-process HTTP fixtures for the transport and proxy tests.

use axum::{Json, Router, extract::RawQuery, http::StatusCode, routing::get};
use serde_json::json;

/// A Solr stand-in echoing the raw query string it received.
pub fn fake_solr() -> Router {
    Router::new()
        .route(
            "/solr/select",
            get(|RawQuery(raw): RawQuery| async move {
                Json(json!({
                    "responseHeader": {"status": 0, "QTime": 1, "params": {"raw": raw.unwrap_or_default()}},
                    "response": {"numFound": 1, "start": 0, "docs": [{"id": "Main.WebHome"}]}
                }))
            }),
        )
        .route("/solr/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route("/solr/text", get(|| async { "not json" }))
}

/// Serves `router` on an ephemeral port and returns its `/solr/` base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/solr/", addr)
}
