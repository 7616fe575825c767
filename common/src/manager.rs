//! The request loop: serializes the store, talks to Solr through a
//! [`Transport`] and fans the response out to the registered widgets.

use std::future::Future;

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    parameter_store::{ParameterStore, StateStore},
    search_const::DEFAULT_SERVLET,
    search_result::SearchResponse,
    widgets::{StoreAction, Widget},
};

/// Sends a serialized query to a Solr servlet and hands back the decoded JSON.
pub trait Transport {
    fn execute(&self, servlet: &str, query: &str) -> impl Future<Output = anyhow::Result<Value>>;
}

pub struct Manager<T, S = ParameterStore> {
    store: S,
    transport: T,
    widgets: Vec<Box<dyn Widget>>,
    response: Option<SearchResponse>,
    initialized: bool,
    servlet: String,
}

impl<T: Transport> Manager<T, ParameterStore> {
    pub fn new(transport: T) -> Self {
        Self::with_store(transport, ParameterStore::new())
    }
}

impl<T: Transport, S: StateStore> Manager<T, S> {
    pub fn with_store(transport: T, store: S) -> Self {
        Self {
            store,
            transport,
            widgets: Vec::new(),
            response: None,
            initialized: false,
            servlet: DEFAULT_SERVLET.to_string(),
        }
    }

    pub fn with_servlet(mut self, servlet: impl Into<String>) -> Self {
        self.servlet = servlet.into();
        self
    }

    /// Swaps the store. Takes effect on the next request; an initialized
    /// manager does not load or initialize the new store again.
    pub fn set_store(&mut self, store: S) {
        self.store = store;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The last successfully decoded response, cleared by a failed request.
    pub fn response(&self) -> Option<&SearchResponse> {
        self.response.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Registers a widget. A widget with an id already in use replaces the
    /// old one at its position. Widgets added after [`Manager::init`] are not
    /// initialized.
    pub fn add_widget(&mut self, widget: impl Widget) {
        match self.widgets.iter().position(|existing| existing.id() == widget.id()) {
            Some(index) => self.widgets[index] = Box::new(widget),
            None => self.widgets.push(Box::new(widget)),
        }
    }

    pub fn widget(&self, id: &str) -> Option<&dyn Widget> {
        self.widgets.iter().find(|widget| widget.id() == id).map(|widget| widget.as_ref())
    }

    pub fn widget_as<W: Widget>(&self, id: &str) -> Option<&W> {
        self.widget(id)?.as_any().downcast_ref::<W>()
    }

    pub fn widget_as_mut<W: Widget>(&mut self, id: &str) -> Option<&mut W> {
        let widget = self.widgets.iter_mut().find(|widget| widget.id() == id)?;
        widget.as_any_mut().downcast_mut::<W>()
    }

    /// Loads the persisted state, then initializes the widgets and the store.
    /// Does nothing once it has succeeded.
    pub fn init(&mut self) -> anyhow::Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.store.load(false);
        for widget in self.widgets.iter_mut() {
            widget
                .init(self.store.params_mut())
                .with_context(|| format!("initializing widget {}", widget.id()))?;
        }
        self.store.init();
        self.initialized = true;
        info!("search manager initialized with {} widgets", self.widgets.len());
        Ok(())
    }

    pub async fn do_request(&mut self, start: Option<u64>, servlet: Option<&str>) -> anyhow::Result<()> {
        self.init()?;
        if let Some(start) = start {
            self.store.params_mut().get("start").primary_mut().set_val(start);
        }
        self.store.save();
        for widget in self.widgets.iter_mut() {
            widget.before_request(self.store.params_mut());
        }

        let servlet = servlet.unwrap_or(self.servlet.as_str()).to_string();
        let query = self.store.params().string();
        debug!("solr request: {}?{}", servlet, query);
        match self.transport.execute(&servlet, &query).await {
            Ok(data) => self.handle_response(data),
            Err(error) => {
                self.handle_failure(&error);
                Err(error)
            }
        }
    }

    /// Decodes and keeps `data`, then runs every widget's post-request hook.
    pub fn handle_response(&mut self, data: Value) -> anyhow::Result<()> {
        let response = match serde_json::from_value::<SearchResponse>(data) {
            Ok(response) => response,
            Err(error) => {
                let error = anyhow::Error::from(error).context("decoding solr response");
                self.handle_failure(&error);
                return Err(error);
            }
        };
        debug!("solr response: {} documents found", response.response.num_found);

        let response = self.response.insert(response);
        for widget in self.widgets.iter_mut() {
            widget.after_request(self.store.params(), response);
        }
        Ok(())
    }

    /// Runs every widget's failure hook in place of the post-request hook.
    pub fn handle_failure(&mut self, error: &anyhow::Error) {
        warn!("solr request failed: {:#}", error);
        self.response = None;
        for widget in self.widgets.iter_mut() {
            widget.request_failed(error);
        }
    }

    /// Applies a widget action and re-requests when it changed the store.
    pub async fn perform(&mut self, action: &impl StoreAction) -> anyhow::Result<bool> {
        self.init()?;
        if !action.apply(self.store.params_mut()) {
            return Ok(false);
        }
        self.do_request(action.start(), None).await?;
        Ok(true)
    }

    /// Reloads from storage and re-requests if the persisted state was changed
    /// by someone else, e.g. the back button.
    pub async fn on_navigation(&mut self) -> anyhow::Result<bool> {
        if !self.initialized || !self.store.external_change() {
            return Ok(false);
        }
        self.store.load(true);
        self.do_request(None, None).await?;
        Ok(true)
    }
}
