//! Server side of the search: the Solr transport, the proxy route and the
//! navigation watcher.

pub mod api;
pub mod config;
pub mod hash_watch;
pub mod server_extra;
pub mod solr_utils;

#[cfg(test)]
mod test_support;
