//! Drives [`Manager::on_navigation`] from the browser's `hashchange` event.

use std::rc::Rc;

use common::{
    manager::{Manager, Transport},
    parameter_store::StateStore,
};
use futures_util::lock::Mutex;
use wasm_bindgen::{JsCast, closure::Closure};
use tracing::warn;

pub type SharedManager<T, S> = Rc<Mutex<Manager<T, S>>>;

/// Keeps the listener registered; dropping it unsubscribes.
pub struct HashChangeSubscription {
    window: web_sys::Window,
    callback: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

impl HashChangeSubscription {
    pub fn subscribe<T, S>(window: &web_sys::Window, manager: SharedManager<T, S>) -> anyhow::Result<Self>
    where
        T: Transport + 'static,
        S: StateStore + 'static,
    {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            let manager = manager.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let mut manager = manager.lock().await;
                if let Err(e) = manager.on_navigation().await {
                    warn!("reloading after navigation failed: {:#}", e);
                }
            });
        });
        window
            .add_event_listener_with_callback("hashchange", callback.as_ref().unchecked_ref())
            .map_err(|e| anyhow::anyhow!("subscribing to hashchange failed: {:?}", e))?;
        Ok(Self {
            window: window.clone(),
            callback: Some(callback),
        })
    }

    /// Leaves the listener registered for the lifetime of the page.
    pub fn forget(mut self) {
        if let Some(callback) = self.callback.take() {
            callback.forget();
        }
    }
}

impl Drop for HashChangeSubscription {
    fn drop(&mut self) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        if let Err(e) = self
            .window
            .remove_event_listener_with_callback("hashchange", callback.as_ref().unchecked_ref())
        {
            warn!("unsubscribing from hashchange failed: {:?}", e);
        }
    }
}
