//! Per-item outcomes and run-level aggregation.
//!
//! Workers never touch shared counters directly: each returns an [`ItemOutcome`]
//! and the [`RunAggregator`] folds it in. The aggregator is safe to share across
//! the concurrently running workers of a window.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::models::{EntityId, EntityKind};

/// Final state of one identifier after a worker finished with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    /// No document existed; the record was indexed.
    Inserted,
    /// A document existed and was updated.
    Updated,
    /// The entity could not be fetched from the catalog API.
    FetchFailed,
    /// An index write failed.
    WriteFailed,
    /// The record failed the validity predicate and was not written.
    Skipped,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Inserted | Self::Updated)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::WriteFailed)
    }
}

/// Result returned by the upsert worker for a single identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub id: EntityId,
    pub outcome: OperationOutcome,
    /// Error message for `FetchFailed` and `WriteFailed`.
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn inserted(id: EntityId) -> Self {
        Self {
            id,
            outcome: OperationOutcome::Inserted,
            error: None,
        }
    }

    pub fn updated(id: EntityId) -> Self {
        Self {
            id,
            outcome: OperationOutcome::Updated,
            error: None,
        }
    }

    pub fn skipped(id: EntityId) -> Self {
        Self {
            id,
            outcome: OperationOutcome::Skipped,
            error: None,
        }
    }

    pub fn fetch_failed(id: EntityId, error: impl Into<String>) -> Self {
        Self {
            id,
            outcome: OperationOutcome::FetchFailed,
            error: Some(error.into()),
        }
    }

    pub fn write_failed(id: EntityId, error: impl Into<String>) -> Self {
        Self {
            id,
            outcome: OperationOutcome::WriteFailed,
            error: Some(error.into()),
        }
    }
}

/// An error message linked to the identifier that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub id: EntityId,
    pub outcome: OperationOutcome,
    pub message: String,
}

/// Whether a run processed every window or stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Completed,
    Cancelled,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Completed => "completed",
            SyncStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncStatus::Cancelled)
    }
}

/// Summary of one pipeline invocation for a single entity kind.
///
/// `successful == inserted + updated` always holds. `skipped` is tracked for
/// diagnostics only and is not part of either `successful` or `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub kind: EntityKind,
    pub successful: usize,
    pub failed: usize,
    pub updated: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub errors: Vec<ItemError>,
    pub status: SyncStatus,
}

impl RunReport {
    /// An empty, completed report.
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            successful: 0,
            failed: 0,
            updated: 0,
            inserted: 0,
            skipped: 0,
            errors: Vec::new(),
            status: SyncStatus::Completed,
        }
    }

    /// Number of identifiers that produced an outcome.
    pub fn total(&self) -> usize {
        self.successful + self.failed + self.skipped
    }

    /// The flat list of error messages, in recording order.
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }
}

/// Thread-safe accumulator for the outcomes of one run.
#[derive(Debug)]
pub struct RunAggregator {
    kind: EntityKind,
    successful: AtomicUsize,
    failed: AtomicUsize,
    updated: AtomicUsize,
    inserted: AtomicUsize,
    skipped: AtomicUsize,
    errors: Mutex<Vec<ItemError>>,
}

impl RunAggregator {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            successful: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            updated: AtomicUsize::new(0),
            inserted: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Folds one worker outcome into the running totals.
    pub fn record(&self, item: &ItemOutcome) {
        if item.outcome.is_success() {
            self.successful.fetch_add(1, Ordering::Relaxed);
        }

        match item.outcome {
            OperationOutcome::Inserted => {
                self.inserted.fetch_add(1, Ordering::Relaxed);
            }
            OperationOutcome::Updated => {
                self.updated.fetch_add(1, Ordering::Relaxed);
            }
            OperationOutcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            OperationOutcome::FetchFailed | OperationOutcome::WriteFailed => {}
        }

        if item.outcome.is_failure() {
            self.failed.fetch_add(1, Ordering::Relaxed);
            let message = item
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            // A poisoned lock still holds valid data; keep collecting.
            let mut errors = self.errors.lock().unwrap_or_else(|p| p.into_inner());
            errors.push(ItemError {
                id: item.id,
                outcome: item.outcome,
                message,
            });
        }
    }

    /// Returns the totals recorded so far.
    pub fn snapshot(&self) -> RunReport {
        let errors = self
            .errors
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        RunReport {
            kind: self.kind,
            successful: self.successful.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            inserted: self.inserted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors,
            status: SyncStatus::Completed,
        }
    }

    /// Consumes the aggregator and produces the final report.
    pub fn finish(self, status: SyncStatus) -> RunReport {
        let errors = self.errors.into_inner().unwrap_or_else(|p| p.into_inner());
        RunReport {
            kind: self.kind,
            successful: self.successful.into_inner(),
            failed: self.failed.into_inner(),
            updated: self.updated.into_inner(),
            inserted: self.inserted.into_inner(),
            skipped: self.skipped.into_inner(),
            errors,
            status,
        }
    }
}

/// Result of syncing one entity kind as part of a larger run.
#[derive(Debug, Clone)]
pub struct EntitySyncResult {
    pub kind: EntityKind,
    /// Report when the identifier list could be loaded.
    pub report: Option<RunReport>,
    /// Identifier source error that aborted this kind before any window started.
    pub error: Option<String>,
}

impl EntitySyncResult {
    pub fn success(report: RunReport) -> Self {
        Self {
            kind: report.kind,
            report: Some(report),
            error: None,
        }
    }

    pub fn failure(kind: EntityKind, error: String) -> Self {
        Self {
            kind,
            report: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.report.is_some()
    }
}

/// Aggregated results from syncing several entity kinds in one process.
#[derive(Debug, Clone, Default)]
pub struct BatchSyncSummary {
    pub results: Vec<EntitySyncResult>,
}

impl BatchSyncSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: EntitySyncResult) {
        self.results.push(result);
    }

    /// Entity kinds whose identifier list could not be loaded.
    pub fn failed_kinds(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// Identifiers that produced an outcome, across all kinds.
    pub fn total_items(&self) -> usize {
        self.reports().map(RunReport::total).sum()
    }

    pub fn total_successful(&self) -> usize {
        self.reports().map(|r| r.successful).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.reports().map(|r| r.failed).sum()
    }

    pub fn is_cancelled(&self) -> bool {
        self.reports().any(RunReport::is_cancelled)
    }

    fn reports(&self) -> impl Iterator<Item = &RunReport> {
        self.results.iter().filter_map(|r| r.report.as_ref())
    }
}
