//! Widget hooks driven by the manager, and the non-rendering widget models.

use std::any::Any;

use crate::{parameter_store::ParameterStore, search_result::SearchResponse};

pub mod current_selection;
pub mod pager;
pub mod results_per_page;
pub mod sort;
pub mod spellcheck;
pub mod text;

/// A passive participant in the request loop. Hooks run in registration order.
pub trait Widget: Any {
    fn id(&self) -> &str;

    /// Called once, after the store loaded its persisted state. Errors abort
    /// the manager's initialization.
    fn init(&mut self, _store: &mut ParameterStore) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the store was saved and before the request is sent.
    fn before_request(&mut self, _store: &mut ParameterStore) {}

    fn after_request(&mut self, _store: &ParameterStore, _response: &SearchResponse) {}

    /// Runs instead of [`Widget::after_request`] when the request or its decoding failed.
    fn request_failed(&mut self, _error: &anyhow::Error) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A change to the store produced by user interaction, applied through
/// [`crate::manager::Manager::perform`].
pub trait StoreAction {
    /// Returns whether the store changed.
    fn apply(&self, store: &mut ParameterStore) -> bool;

    /// Offset of the request following a change.
    fn start(&self) -> Option<u64> {
        Some(0)
    }
}
