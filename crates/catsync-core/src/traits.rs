//! Trait definitions for external dependencies.
//!
//! The pipeline never talks to MySQL, the catalog API or Elasticsearch directly.
//! It goes through these traits, which gives:
//!
//! - **Testability**: in-memory fakes for the pipeline tests
//! - **Flexibility**: a different identifier source or search backend is one impl away
//! - **Decoupling**: `catsync-core` has no HTTP or SQL driver in its public API
//!
//! # Example
//!
//! ```
//! use catsync_core::traits::{EntityFetcher, SearchIndex};
//! use catsync_core::{AppError, EntityKind};
//!
//! async fn copy_one<F, X>(fetcher: &F, index: &X, id: i64) -> Result<(), AppError>
//! where
//!     F: EntityFetcher,
//!     X: SearchIndex,
//! {
//!     let record = fetcher.fetch(EntityKind::Part, id).await?;
//!     index.index(EntityKind::Part, id, &record).await
//! }
//! ```

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppError, EntityId, EntityKind, EntityRecord};

/// Source of the identifiers eligible for synchronization.
pub trait IdentifierSource: Send + Sync + Clone {
    /// Lists distinct identifiers for the given entity kind.
    ///
    /// An error here aborts the run for that kind before any window starts.
    fn list_ids(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<EntityId>, AppError>> + Send;
}

/// Fetches the full representation of a single entity.
pub trait EntityFetcher: Send + Sync + Clone {
    /// Fetches one entity record.
    ///
    /// # Arguments
    ///
    /// * `kind` - Which entity type to fetch
    /// * `id` - The entity identifier
    fn fetch(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> impl Future<Output = Result<EntityRecord, AppError>> + Send;
}

/// One hit returned by [`SearchIndex::search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub index: String,
    pub doc_type: Option<String>,
    pub id: String,
    pub score: Option<f64>,
    pub source: Value,
}

/// Document store used for full-text search, keyed by entity type and identifier.
///
/// Writes always carry the full record; there are no partial updates.
pub trait SearchIndex: Send + Sync + Clone {
    /// Returns whether a document exists for `(kind, id)`.
    fn exists(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Updates an existing document with the full record.
    fn update(
        &self,
        kind: EntityKind,
        id: EntityId,
        record: &EntityRecord,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Inserts or replaces the document for `(kind, id)`.
    fn index(
        &self,
        kind: EntityKind,
        id: EntityId,
        record: &EntityRecord,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Runs a free-text query across all document types.
    ///
    /// # Arguments
    ///
    /// * `query` - Query string syntax, e.g. `ball mount`
    /// * `limit` - Maximum number of hits
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SearchHit>, AppError>> + Send;
}
