//! Search state shared between frontend and backend: Solr parameters, facet
//! selections and the request loop.

extern crate serde;


pub mod error;
pub mod facet;
pub mod hash_store;
pub mod manager;
pub mod parameter;
pub mod parameter_store;
pub mod search_const;
pub mod search_query;
pub mod search_result;
pub mod string_list;
pub mod translator;
pub mod url_encoding;
pub mod widgets;
