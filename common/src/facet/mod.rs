//! Facet selection model and facet count normalization.

pub mod counts;
pub mod filter;
pub mod selection;
pub mod widget;

pub use counts::{FacetCount, FacetType};
pub use selection::{FacetAction, FacetOp, FacetSelection};
pub use widget::{FacetKind, FacetOptions, FacetQuery, FacetSelect, FacetWidget, RangeParams};
