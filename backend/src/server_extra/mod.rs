//! Routes served next to the search page.

pub mod solr_proxy;
