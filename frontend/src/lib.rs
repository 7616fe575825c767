//! Browser side of the search page: keeps the search state in the URL
//! fragment and re-requests on back/forward navigation.

use std::rc::Rc;

use common::{
    facet::{FacetKind, FacetOptions, FacetWidget},
    hash_store::{HashLocation, ParameterHashStore},
    manager::Manager,
    search_query::SearchDefaults,
};
use futures_util::lock::Mutex;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::{browser_location::BrowserLocation, hash_change::HashChangeSubscription, proxy_transport::ProxyTransport};

pub mod browser_location;
pub mod hash_change;
pub mod proxy_transport;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    pub search: SearchDefaults,
    pub facets: Vec<FacetConfig>,
    pub proxy_url: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            search: SearchDefaults::default(),
            facets: Vec::new(),
            proxy_url: "/solr/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacetConfig {
    pub id: String,
    pub field: String,
    #[serde(default)]
    pub kind: FacetKind,
    #[serde(default)]
    pub options: FacetOptions,
}

pub type PageManager<L> = Manager<ProxyTransport, ParameterHashStore<L>>;

pub fn search_manager<L: HashLocation>(config: &PageConfig, location: L) -> PageManager<L> {
    let store = ParameterHashStore::new(config.search.build_store(), location);
    let mut manager = Manager::with_store(ProxyTransport::new(&config.proxy_url), store)
        .with_servlet(config.search.servlet.clone());
    for facet in &config.facets {
        let widget = FacetWidget::new(&facet.id, &facet.field, facet.kind.clone(), facet.options.clone());
        manager.add_widget(widget);
    }
    manager
}

/// Resolves a path against the page origin, as the HTTP client needs absolute URLs.
fn absolute_url(location: &BrowserLocation, url: &str) -> String {
    if !url.starts_with('/') {
        return url.to_string();
    }
    match location.window().location().origin() {
        Ok(origin) => format!("{}{}", origin, url),
        Err(_) => url.to_string(),
    }
}

async fn start(config: &str) -> anyhow::Result<()> {
    let mut config: PageConfig = serde_json::from_str(config)?;
    let location = BrowserLocation::new()?;
    config.proxy_url = absolute_url(&location, &config.proxy_url);
    let window = location.window().clone();

    let mut manager = search_manager(&config, location);
    manager.do_request(None, None).await?;

    let manager = Rc::new(Mutex::new(manager));
    HashChangeSubscription::subscribe(&window, manager)?.forget();
    Ok(())
}

/// Runs the first search of the page described by the JSON `config` and keeps
/// following navigation for the lifetime of the page.
#[wasm_bindgen]
pub async fn start_search(config: String) -> Result<(), JsValue> {
    start(&config).await.map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
