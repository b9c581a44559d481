//! Sync service: copies catalog entities into the search index.
//!
//! # Architecture
//!
//! The [`SyncService`] is generic over three traits:
//! - [`IdentifierSource`] - lists the identifiers to sync
//! - [`EntityFetcher`] - loads one full record from the catalog API
//! - [`SearchIndex`] - existence check and writes against the index
//!
//! Identifiers are driven through the [`BatchScheduler`] in windows of
//! `SyncConfig::window_size`. Each identifier goes through the upsert worker:
//!
//! 1. Fetch the record. A fetch error or timeout is `FetchFailed`.
//! 2. Validate it (`id > 0`, parts also `status > 0`). Invalid records are `Skipped`.
//! 3. Check whether the index already holds a document for `(kind, id)`.
//! 4. Update it when it exists, index it when it does not. A write error or
//!    timeout is `WriteFailed`.
//!
//! No retries are made; every identifier gets a single attempt per run.
//!
//! # Write Policy
//!
//! [`WritePolicy::UpdateOrInsert`] issues exactly one write per identifier.
//! [`WritePolicy::AlwaysReindex`] additionally re-indexes documents after
//! updating them, which is reported as `Updated`.
//!
//! # Cancellation Support
//!
//! The `*_cancellable` methods accept a `CancellationToken`. The token is
//! checked between windows only: a started window always completes and its
//! outcomes are part of the returned report, which carries
//! [`SyncStatus::Cancelled`].

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{SyncConfig, WritePolicy};
use crate::progress::{ProgressReporter, SilentReporter, SyncEvent};
use crate::scheduler::BatchScheduler;
use crate::sync::{
    BatchSyncSummary, EntitySyncResult, ItemOutcome, RunAggregator, RunReport, SyncStatus,
};
use crate::traits::{EntityFetcher, IdentifierSource, SearchIndex};
use crate::{AppError, EntityId, EntityKind};

/// Service for synchronizing catalog entities into a search index.
///
/// This service encapsulates the windowed upsert pipeline, decoupled from
/// CLI concerns.
///
/// # Type Parameters
///
/// * `I` - Identifier source implementation (e.g., `IdentifierRepository`)
/// * `F` - Entity fetcher implementation (e.g., `CatalogApiClient`)
/// * `X` - Search index implementation (e.g., `ElasticsearchClient`)
///
/// # Example
///
/// ```ignore
/// use catsync_core::pipeline::SyncService;
///
/// let service = SyncService::new(repo, catalog, elastic);
/// let report = service.sync_kind(EntityKind::Part).await?;
/// println!("{} inserted, {} updated", report.inserted, report.updated);
/// ```
pub struct SyncService<I, F, X>
where
    I: IdentifierSource,
    F: EntityFetcher,
    X: SearchIndex,
{
    source: I,
    fetcher: F,
    index: X,
    config: SyncConfig,
}

impl<I, F, X> Clone for SyncService<I, F, X>
where
    I: IdentifierSource,
    F: EntityFetcher,
    X: SearchIndex,
{
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            fetcher: self.fetcher.clone(),
            index: self.index.clone(),
            config: self.config.clone(),
        }
    }
}

impl<I, F, X> SyncService<I, F, X>
where
    I: IdentifierSource,
    F: EntityFetcher,
    X: SearchIndex,
{
    /// Creates a new sync service with default configuration.
    pub fn new(source: I, fetcher: F, index: X) -> Self {
        Self::with_config(source, fetcher, index, SyncConfig::default())
    }

    /// Creates a sync service with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `source` - Identifier source
    /// * `fetcher` - Entity fetcher for the catalog API
    /// * `index` - Search index client
    /// * `config` - Window size, per-call timeout and write policy
    pub fn with_config(source: I, fetcher: F, index: X, config: SyncConfig) -> Self {
        Self {
            source,
            fetcher,
            index,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Synchronizes every identifier of one entity kind.
    ///
    /// # Errors
    ///
    /// Returns an error only when the identifier list cannot be loaded. Per-item
    /// failures are recorded in the returned [`RunReport`].
    pub async fn sync_kind(&self, kind: EntityKind) -> Result<RunReport, AppError> {
        self.sync_kind_with_progress(kind, &SilentReporter).await
    }

    /// Same as [`sync_kind`](Self::sync_kind), but emits progress events.
    pub async fn sync_kind_with_progress<R: ProgressReporter>(
        &self,
        kind: EntityKind,
        reporter: &R,
    ) -> Result<RunReport, AppError> {
        self.sync_kind_cancellable(kind, reporter, CancellationToken::new())
            .await
    }

    /// Synchronizes one entity kind with progress reporting and cancellation.
    pub async fn sync_kind_cancellable<R: ProgressReporter>(
        &self,
        kind: EntityKind,
        reporter: &R,
        cancel_token: CancellationToken,
    ) -> Result<RunReport, AppError> {
        reporter.report(SyncEvent::RunStarted { kind });

        let ids = self.source.list_ids(kind).await?;
        reporter.report(SyncEvent::IdentifiersFound {
            kind,
            count: ids.len(),
        });

        Ok(self
            .sync_ids_with_progress(kind, &ids, reporter, cancel_token)
            .await)
    }

    /// Synchronizes an explicit list of identifiers, bypassing the identifier source.
    pub async fn sync_ids(&self, kind: EntityKind, ids: &[EntityId]) -> RunReport {
        self.sync_ids_with_progress(kind, ids, &SilentReporter, CancellationToken::new())
            .await
    }

    /// Runs the windowed upsert pipeline over `ids`.
    ///
    /// Every dispatched identifier produces exactly one outcome. Windows that
    /// were never started because of cancellation contribute nothing.
    pub async fn sync_ids_with_progress<R: ProgressReporter>(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
        reporter: &R,
        cancel_token: CancellationToken,
    ) -> RunReport {
        let aggregator = RunAggregator::new(kind);
        let scheduler = BatchScheduler::new(self.config.window_size);
        debug!(
            %kind,
            ids = ids.len(),
            window_size = scheduler.window_size(),
            "Dispatching identifiers"
        );

        let outcome = scheduler
            .run(
                ids,
                &cancel_token,
                |id| {
                    let aggregator = &aggregator;
                    async move {
                        let item = self.upsert(kind, id).await;
                        aggregator.record(&item);
                        item
                    }
                },
                |span| {
                    reporter.report(SyncEvent::WindowStarted {
                        kind,
                        window: span.index,
                        total_windows: span.total_windows,
                        size: span.size,
                    });
                },
                |span, items: Vec<ItemOutcome>| {
                    for item in &items {
                        if let Some(error) = item.error.as_deref() {
                            reporter.report(SyncEvent::ItemFailed {
                                kind,
                                id: item.id,
                                error,
                            });
                        }
                    }
                    reporter.report(SyncEvent::WindowCompleted {
                        kind,
                        window: span.index,
                        total_windows: span.total_windows,
                        processed: span.processed,
                        total: span.total,
                    });
                },
            )
            .await;

        if outcome.cancelled {
            let report = aggregator.finish(SyncStatus::Cancelled);
            reporter.report(SyncEvent::RunCancelled { report: &report });
            report
        } else {
            let report = aggregator.finish(SyncStatus::Completed);
            reporter.report(SyncEvent::RunCompleted { report: &report });
            report
        }
    }

    /// Synchronizes several entity kinds in order with error isolation.
    ///
    /// An identifier source failure for one kind is recorded in the summary and
    /// does not stop the remaining kinds. Once the token fires, no further kind
    /// is started.
    pub async fn sync_all<R: ProgressReporter>(
        &self,
        kinds: &[EntityKind],
        reporter: &R,
        cancel_token: CancellationToken,
    ) -> BatchSyncSummary {
        let mut summary = BatchSyncSummary::new();

        for &kind in kinds {
            if cancel_token.is_cancelled() {
                warn!(%kind, "Shutdown requested, not starting remaining kinds");
                break;
            }

            match self
                .sync_kind_cancellable(kind, reporter, cancel_token.clone())
                .await
            {
                Ok(report) => summary.add(EntitySyncResult::success(report)),
                Err(e) => {
                    let error = e.to_string();
                    reporter.report(SyncEvent::KindFailed {
                        kind,
                        error: &error,
                    });
                    summary.add(EntitySyncResult::failure(kind, error));
                }
            }
        }

        reporter.report(SyncEvent::BatchCompleted { summary: &summary });
        summary
    }

    /// Resolves one identifier to its final index state.
    async fn upsert(&self, kind: EntityKind, id: EntityId) -> ItemOutcome {
        if id <= 0 {
            debug!(%kind, entity_id = id, "Invalid identifier, skipping");
            return ItemOutcome::skipped(id);
        }

        let record = match self.bounded(self.fetcher.fetch(kind, id)).await {
            Ok(record) => record,
            Err(e) => {
                debug!(%kind, entity_id = id, error = %e, "Fetch failed");
                return ItemOutcome::fetch_failed(id, e.to_string());
            }
        };

        if !record.is_indexable() {
            debug!(%kind, entity_id = id, "Record failed validation, skipping");
            return ItemOutcome::skipped(id);
        }

        // Documents are keyed by the requested id, which must be the record's own.
        if record.kind() != kind || record.id() != id {
            let message = format!(
                "Catalog API returned {} {} when {} {} was requested",
                record.kind(),
                record.id(),
                kind,
                id
            );
            warn!(%kind, entity_id = id, returned_id = record.id(), "Record id mismatch");
            return ItemOutcome::fetch_failed(id, message);
        }

        let exists = match self.bounded(self.index.exists(kind, id)).await {
            Ok(exists) => exists,
            Err(e) => {
                // Indexing replaces the whole document, so inserting is safe either way.
                warn!(%kind, entity_id = id, error = %e, "Existence check failed, inserting");
                false
            }
        };

        if !exists {
            return match self.bounded(self.index.index(kind, id, &record)).await {
                Ok(()) => ItemOutcome::inserted(id),
                Err(e) => ItemOutcome::write_failed(id, e.to_string()),
            };
        }

        if let Err(e) = self.bounded(self.index.update(kind, id, &record)).await {
            return ItemOutcome::write_failed(id, e.to_string());
        }

        if self.config.write_policy == WritePolicy::AlwaysReindex {
            if let Err(e) = self.bounded(self.index.index(kind, id, &record)).await {
                return ItemOutcome::write_failed(id, e.to_string());
            }
        }

        ItemOutcome::updated(id)
    }

    /// Applies the per-call deadline to one collaborator call.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::timeout_after(self.config.call_timeout)),
        }
    }
}
