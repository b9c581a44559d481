//! Catsync Core - Domain types, pipeline logic, and services.
//!
//! This crate provides the core functionality for catsync, including:
//!
//! - **Domain models**: [`Category`], [`Part`], [`EntityRecord`], [`EntityKind`]
//! - **Pipeline**: [`SyncService`] runs the windowed upsert of catalog entities
//!   into the search index, [`BatchScheduler`] bounds its concurrency
//! - **Outcomes**: [`RunReport`] and the thread-safe [`RunAggregator`]
//! - **Traits**: [`IdentifierSource`], [`EntityFetcher`], [`SearchIndex`] for dependency injection
//! - **Progress reporting**: [`ProgressReporter`] trait for decoupled logging
//!
//! # Architecture
//!
//! This crate is designed to be reusable by different frontends. The pipeline
//! is decoupled from I/O concerns through traits:
//!
//! - [`IdentifierSource`] - abstracts the relational store (e.g., MySQL)
//! - [`EntityFetcher`] - abstracts the product-data API
//! - [`SearchIndex`] - abstracts the search engine (e.g., Elasticsearch)
//!
//! # Example
//!
//! ```ignore
//! use catsync_core::{EntityKind, SyncConfig, SyncService};
//! use catsync_core::progress::TracingReporter;
//!
//! let service = SyncService::with_config(repo, catalog, elastic, SyncConfig::default());
//! let summary = service
//!     .sync_all(&EntityKind::ALL, &TracingReporter, CancellationToken::new())
//!     .await;
//! println!("{} items, {} failed", summary.total_items(), summary.total_failed());
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod scheduler;
pub mod sync;
pub mod traits;

// Configuration
pub use config::{DEFAULT_WINDOW_SIZE, DbConfig, HttpConfig, SyncConfig, WritePolicy};

// Error handling
pub use error::AppError;

// Domain models
pub use models::{Category, EntityId, EntityKind, EntityRecord, Part};

// Outcomes and aggregation
pub use sync::{
    BatchSyncSummary, EntitySyncResult, ItemError, ItemOutcome, OperationOutcome, RunAggregator,
    RunReport, SyncStatus,
};

// Scheduling
pub use scheduler::{BatchScheduler, ScheduleOutcome, WindowSpan, window_count, windows};

// Progress reporting
pub use progress::{ProgressReporter, SilentReporter, SyncEvent, TracingReporter};

// Traits for dependency injection
pub use traits::{EntityFetcher, IdentifierSource, SearchHit, SearchIndex};

// Services (generic over trait implementations)
pub use pipeline::SyncService;
