//! Progress reporting for sync runs.
//!
//! The pipeline emits [`SyncEvent`]s through a [`ProgressReporter`] instead of
//! logging directly, so library callers decide how (and whether) to surface them.

use tracing::{info, warn};

use crate::models::{EntityId, EntityKind};
use crate::sync::{BatchSyncSummary, RunReport};

/// Events emitted while a sync run progresses.
#[derive(Debug, Clone)]
pub enum SyncEvent<'a> {
    /// A run for one entity kind started.
    RunStarted { kind: EntityKind },
    /// The identifier source returned its list.
    IdentifiersFound { kind: EntityKind, count: usize },
    /// A window was dispatched.
    WindowStarted {
        kind: EntityKind,
        window: usize,
        total_windows: usize,
        size: usize,
    },
    /// Every worker of a window reported an outcome.
    WindowCompleted {
        kind: EntityKind,
        window: usize,
        total_windows: usize,
        processed: usize,
        total: usize,
    },
    /// One identifier failed to fetch or write.
    ItemFailed {
        kind: EntityKind,
        id: EntityId,
        error: &'a str,
    },
    /// The run for one kind finished every window.
    RunCompleted { report: &'a RunReport },
    /// The run for one kind stopped between windows.
    RunCancelled { report: &'a RunReport },
    /// The identifier source failed; nothing was dispatched for this kind.
    KindFailed { kind: EntityKind, error: &'a str },
    /// All requested kinds were processed.
    BatchCompleted { summary: &'a BatchSyncSummary },
}

/// Trait for reporting sync progress.
pub trait ProgressReporter: Send + Sync {
    /// Called when a sync event occurs.
    ///
    /// The default implementation does nothing (silent mode).
    fn report(&self, event: SyncEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Tracing-based reporter for CLI logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: SyncEvent<'_>) {
        match event {
            SyncEvent::RunStarted { kind } => {
                info!(%kind, "Starting {} sync", kind);
            }
            SyncEvent::IdentifiersFound { kind, count } => {
                info!(%kind, count, "Found {} {} identifiers", count, kind);
            }
            SyncEvent::WindowStarted {
                kind,
                window,
                total_windows,
                size,
            } => {
                tracing::debug!(%kind, window, total_windows, size, "Window started");
            }
            SyncEvent::WindowCompleted {
                kind,
                window,
                total_windows,
                processed,
                total,
            } => {
                // Every window at debug, roughly every 10% at info.
                let step = (total_windows / 10).max(1);
                if (window + 1) % step == 0 || window + 1 == total_windows {
                    info!(
                        %kind,
                        window = window + 1,
                        total_windows,
                        "Progress: {}/{} {} identifiers",
                        processed,
                        total,
                        kind
                    );
                } else {
                    tracing::debug!(%kind, window = window + 1, total_windows, "Window completed");
                }
            }
            SyncEvent::ItemFailed { kind, id, error } => {
                warn!(%kind, entity_id = id, error, "Item failed");
            }
            SyncEvent::RunCompleted { report } => {
                info!(
                    kind = %report.kind,
                    successful = report.successful,
                    failed = report.failed,
                    updated = report.updated,
                    inserted = report.inserted,
                    skipped = report.skipped,
                    "Sync completed"
                );
            }
            SyncEvent::RunCancelled { report } => {
                warn!(
                    kind = %report.kind,
                    processed = report.total(),
                    "Sync cancelled between windows"
                );
            }
            SyncEvent::KindFailed { kind, error } => {
                warn!(%kind, error, "Could not load identifiers");
            }
            SyncEvent::BatchCompleted { summary } => {
                info!(
                    kinds = summary.results.len(),
                    items = summary.total_items(),
                    failed_kinds = summary.failed_kinds(),
                    "All entity kinds processed"
                );
            }
        }
    }
}
