//! Facet value suggestions for text typed into a facet's filter box. A new
//! lookup aborts the one still in flight.

use std::sync::Mutex;

use common::{
    facet::{FacetCount, FacetType, counts::facet_counts},
    manager::Transport,
    parameter_store::ParameterStore,
    search_result::SearchResponse,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct FacetSuggester<T> {
    transport: T,
    servlet: String,
    limit: u64,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl<T: Transport> FacetSuggester<T> {
    pub fn new(transport: T, servlet: impl Into<String>) -> Self {
        Self {
            transport,
            servlet: servlet.into(),
            limit: 10,
            in_flight: Mutex::new(None),
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// The query asking Solr for the values of `field` starting with `prefix`.
    pub fn query(&self, field: &str, prefix: &str) -> String {
        let mut store = ParameterStore::new();
        store.add_by_value("q", "*:*");
        store.add_by_value("rows", 0_u64);
        store.add_by_value("facet", true);
        store.add_by_value("facet.field", field);
        store.add_by_value(&format!("f.{}.facet.prefix", field), prefix);
        store.add_by_value(&format!("f.{}.facet.limit", field), self.limit);
        store.add_by_value(&format!("f.{}.facet.mincount", field), 1_u64);
        store.string()
    }

    /// Replaces the in-flight token, cancelling the previous lookup.
    fn start_lookup(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = in_flight.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Values of `field` starting with `prefix`, or `None` when a newer
    /// lookup superseded this one.
    pub async fn suggest(&self, field: &str, prefix: &str) -> anyhow::Result<Option<Vec<FacetCount>>> {
        let token = self.start_lookup();
        let query = self.query(field, prefix);
        tokio::select! {
            _ = token.cancelled() => {
                debug!("suggestion for {}:{} superseded", field, prefix);
                Ok(None)
            }
            result = self.transport.execute(&self.servlet, &query) => {
                let response: SearchResponse = serde_json::from_value(result?)?;
                let counts = facet_counts(response.facet_counts.as_ref(), Some(FacetType::FacetFields), field);
                Ok(Some(counts))
            }
        }
    }
}
