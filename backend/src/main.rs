//! `solr-proxy`: forwards search requests from the page to Solr.

use backend::{config::SolrConfig, server_extra::solr_proxy, solr_utils::solr_client::SolrClient};
use tracing::{info, subscriber::set_global_default};
use tracing_subscriber::EnvFilter;

const TRACING_SUBSCRIBER_ENV_FILTER_DEFAULT: &str = "info";

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|err| {
        if std::env::var("RUST_LOG").is_ok_and(|rust_log| !rust_log.is_empty()) {
            eprintln!("Failed to parse RUST_LOG environment variable: {}", err);
        }
        EnvFilter::new(TRACING_SUBSCRIBER_ENV_FILTER_DEFAULT)
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    set_global_default(subscriber)?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = SolrConfig::from_env();
    let app = solr_proxy::router(SolrClient::direct(&config.solr_url));
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!("solr proxy listening on {}, forwarding to {}", config.listen, config.solr_url);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
