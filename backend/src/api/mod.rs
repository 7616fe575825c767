//! Search API helpers used by the server routes.

mod suggest;
pub use suggest::FacetSuggester;
