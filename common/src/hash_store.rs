//! Parameter store that keeps the exposed parameters in the URL fragment.

use std::{
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex},
    time::Duration,
};

use tracing::debug;

use crate::{
    parameter_store::{ParameterStore, StateStore},
    search_const::DEFAULT_HASH_POLL_INTERVAL,
    url_encoding::decode_component,
};

/// The navigation API the hash store talks to.
pub trait HashLocation {
    /// The full current URL. Unlike a decoded fragment accessor this is left
    /// alone by every browser, so the fragment is read from here.
    fn href(&self) -> String;

    /// Sets the fragment, creating a new history entry.
    fn set_hash(&mut self, hash: &str);

    /// Navigates to `href` replacing the current history entry.
    fn replace(&mut self, href: &str);
}

pub struct ParameterHashStore<L> {
    params: ParameterStore,
    location: L,
    /// The last fragment written by this store.
    hash: String,
    interval: Duration,
    watching: bool,
}

impl<L: HashLocation> ParameterHashStore<L> {
    pub fn new(params: ParameterStore, location: L) -> Self {
        Self {
            params,
            location,
            hash: String::new(),
            interval: DEFAULT_HASH_POLL_INTERVAL,
            watching: false,
        }
    }

    /// Setting this too low risks reloading while a load and save are still in flight.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut L {
        &mut self.location
    }
}

impl<L> Deref for ParameterHashStore<L> {
    type Target = ParameterStore;

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

impl<L> DerefMut for ParameterHashStore<L> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.params
    }
}

impl<L: HashLocation> StateStore for ParameterHashStore<L> {
    fn params(&self) -> &ParameterStore {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }

    fn init(&mut self) {
        self.watching = !self.params.exposed.is_empty();
    }

    /// Pushes a history entry if a fragment is already present; otherwise
    /// replaces the hash-less initial entry.
    fn save(&mut self) {
        self.hash = self.params.exposed_string();
        if self.stored_string().is_empty() {
            let href = self.location.href().replacen('#', "", 1);
            self.location.replace(&format!("{}#{}", href, self.hash));
        } else {
            self.location.set_hash(&self.hash);
        }
    }

    fn stored_string(&self) -> String {
        let href = self.location.href();
        match href.find('#') {
            Some(index) => href[index + 1..].to_string(),
            None => String::new(),
        }
    }

    fn external_change(&self) -> bool {
        let stored = self.stored_string();
        let changed = self.hash != stored && decode_component(&self.hash) != decode_component(&stored);
        if changed {
            debug!("url fragment changed: {:?} -> {:?}", self.hash, stored);
        }
        changed
    }

    fn poll_interval(&self) -> Option<Duration> {
        self.watching.then_some(self.interval)
    }
}

#[derive(Debug, Default)]
struct MemoryHistory {
    entries: Vec<String>,
    current: usize,
}

/// In-process [`HashLocation`] with a history stack. Clones share the same
/// history, like several handles on one browser tab.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    history: Arc<Mutex<MemoryHistory>>,
}

impl MemoryLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            history: Arc::new(Mutex::new(MemoryHistory {
                entries: vec![href.into()],
                current: 0,
            })),
        }
    }

    fn with_history<R>(&self, f: impl FnOnce(&mut MemoryHistory) -> R) -> R {
        let mut history = self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if history.entries.is_empty() {
            history.entries.push(String::new());
        }
        f(&mut history)
    }

    /// Number of history entries.
    pub fn len(&self) -> usize {
        self.with_history(|history| history.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn back(&self) -> bool {
        self.with_history(|history| {
            if history.current == 0 {
                return false;
            }
            history.current -= 1;
            true
        })
    }

    pub fn forward(&self) -> bool {
        self.with_history(|history| {
            if history.current + 1 >= history.entries.len() {
                return false;
            }
            history.current += 1;
            true
        })
    }

    /// Simulates the user typing a new URL or following a bookmark.
    pub fn navigate(&self, href: impl Into<String>) {
        let href = href.into();
        self.with_history(|history| push_entry(history, href));
    }
}

fn push_entry(history: &mut MemoryHistory, href: String) {
    history.entries.truncate(history.current + 1);
    history.entries.push(href);
    history.current = history.entries.len() - 1;
}

impl HashLocation for MemoryLocation {
    fn href(&self) -> String {
        self.with_history(|history| history.entries[history.current].clone())
    }

    /// Setting the fragment it already has does not add an entry.
    fn set_hash(&mut self, hash: &str) {
        self.with_history(|history| {
            let current = &history.entries[history.current];
            let base = current.split('#').next().unwrap_or_default();
            let href = format!("{}#{}", base, hash);
            if href != *current {
                push_entry(history, href);
            }
        });
    }

    fn replace(&mut self, href: &str) {
        self.with_history(|history| {
            let current = history.current;
            history.entries[current] = href.to_string();
        });
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParamValue;

    fn hash_store(href: &str) -> ParameterHashStore<MemoryLocation> {
        let params = ParameterStore::new().with_exposed(["fq", "q"]);
        ParameterHashStore::new(params, MemoryLocation::new(href))
    }

    #[test]
    fn first_save_replaces_the_initial_entry() {
        let mut store = hash_store("http://example.org/search");
        store.add_by_value("q", "hello");
        store.save();
        assert_eq!(store.location().href(), "http://example.org/search#q=hello");
        assert_eq!(store.location().len(), 1);
    }

    #[test]
    fn later_saves_push_history_entries() {
        let mut store = hash_store("http://example.org/search#q=hello");
        store.add_by_value("q", "world");
        store.save();
        assert_eq!(store.location().href(), "http://example.org/search#q=world");
        assert_eq!(store.location().len(), 2);
    }

    #[test]
    fn stored_string_is_everything_after_the_first_hash() {
        let store = hash_store("http://example.org/#fq=a%3A1#x");
        assert_eq!(store.stored_string(), "fq=a%3A1#x");
        assert_eq!(hash_store("http://example.org/").stored_string(), "");
    }

    #[test]
    fn external_change_compares_decoded_forms() {
        let mut store = hash_store("http://example.org/");
        store.add_by_value("fq", "type:doc");
        store.save();
        assert!(!store.external_change());

        // same state, spelled with a literal colon by some browser
        store.location_mut().replace("http://example.org/#fq=type:doc");
        assert!(!store.external_change());

        store.location().navigate("http://example.org/#fq=type%3Apdf");
        assert!(store.external_change());
    }

    #[test]
    fn back_button_restores_previous_state_on_load() {
        let mut store = hash_store("http://example.org/");
        store.add_by_value("q", "first");
        store.save();
        store.get("q").primary_mut().set_val("second");
        store.save();

        assert!(store.location().back());
        assert!(store.external_change());
        store.load(true);
        assert_eq!(store.values("q"), vec![ParamValue::from("first")]);
    }

    #[test]
    fn watching_requires_exposed_parameters() {
        let mut store = ParameterHashStore::new(ParameterStore::new(), MemoryLocation::new("http://x/"));
        store.init();
        assert_eq!(store.poll_interval(), None);

        let mut store = hash_store("http://x/").with_interval(Duration::from_millis(10));
        assert_eq!(store.poll_interval(), None);
        store.init();
        assert_eq!(store.poll_interval(), Some(Duration::from_millis(10)));
    }
}
