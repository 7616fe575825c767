//! Talking to Solr over HTTP.

pub mod solr_client;
