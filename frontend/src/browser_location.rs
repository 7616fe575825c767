//! The browser's `window.location` as a [`HashLocation`].

use anyhow::Context;
use common::hash_store::HashLocation;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct BrowserLocation {
    window: web_sys::Window,
}

impl BrowserLocation {
    pub fn new() -> anyhow::Result<Self> {
        let window = web_sys::window().context("no browser window")?;
        Ok(Self { window })
    }

    pub fn window(&self) -> &web_sys::Window {
        &self.window
    }
}

impl HashLocation for BrowserLocation {
    fn href(&self) -> String {
        match self.window.location().href() {
            Ok(href) => href,
            Err(e) => {
                warn!("reading location.href failed: {:?}", e);
                String::new()
            }
        }
    }

    fn set_hash(&mut self, hash: &str) {
        if let Err(e) = self.window.location().set_hash(hash) {
            warn!("setting location.hash failed: {:?}", e);
        }
    }

    fn replace(&mut self, href: &str) {
        if let Err(e) = self.window.location().replace(href) {
            warn!("location.replace failed: {:?}", e);
        }
    }
}
