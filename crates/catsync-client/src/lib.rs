//! Catsync Client - HTTP clients for external APIs
//!
//! This crate provides HTTP clients for interacting with:
//!
//! - [`catalog`] - the product-data API serving categories and parts
//! - [`elastic`] - the Elasticsearch index the records are written to
//!
//! # Overview
//!
//! The clients handle authentication, request building, response parsing,
//! and error handling for their respective APIs. They implement the
//! `EntityFetcher` and `SearchIndex` traits from `catsync-core`.

pub mod catalog;
pub mod elastic;
mod http;

// Re-export main client types
pub use catalog::{CatalogApiClient, DEFAULT_CATALOG_API_URL};
pub use elastic::{DEFAULT_INDEX, ElasticsearchClient, IndexSettings};
