//! Test utilities and mock implementations for integration tests.
//!
//! Provides in-memory implementations of the core traits for testing
//! `SyncService` in isolation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use catsync_core::progress::{ProgressReporter, SyncEvent};
use catsync_core::traits::{EntityFetcher, IdentifierSource, SearchHit, SearchIndex};
use catsync_core::{AppError, Category, EntityId, EntityKind, EntityRecord, Part};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// =============================================================================
// MockIdentifierSource
// =============================================================================

/// Identifier source backed by fixed lists, with optional per-kind failures.
#[derive(Clone, Default)]
pub struct MockIdentifierSource {
    ids: HashMap<EntityKind, Vec<EntityId>>,
    failing: HashSet<EntityKind>,
}

impl MockIdentifierSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, kind: EntityKind, ids: Vec<EntityId>) -> Self {
        self.ids.insert(kind, ids);
        self
    }

    /// Makes `list_ids` fail for `kind`, like a lost database connection.
    #[allow(dead_code)]
    pub fn failing(mut self, kind: EntityKind) -> Self {
        self.failing.insert(kind);
        self
    }
}

impl IdentifierSource for MockIdentifierSource {
    async fn list_ids(&self, kind: EntityKind) -> Result<Vec<EntityId>, AppError> {
        if self.failing.contains(&kind) {
            return Err(AppError::Generic(format!(
                "connection refused while listing {}",
                kind
            )));
        }
        Ok(self.ids.get(&kind).cloned().unwrap_or_default())
    }
}

// =============================================================================
// MockEntityFetcher
// =============================================================================

/// Timing of one fetch call, measured on the tokio clock.
#[derive(Clone, Copy, Debug)]
pub struct FetchTiming {
    pub id: EntityId,
    pub started: Instant,
    pub finished: Instant,
}

/// Catalog API stand-in.
///
/// Every identifier resolves to a valid record unless configured otherwise:
/// categories get `category_id = id`, parts get `part_id = id` and status 800.
#[derive(Clone, Default)]
pub struct MockEntityFetcher {
    statuses: HashMap<EntityId, i32>,
    failing: HashSet<EntityId>,
    hanging: HashSet<EntityId>,
    delays: HashMap<EntityId, Duration>,
    renumbered: HashMap<EntityId, EntityId>,
    timings: Arc<Mutex<Vec<FetchTiming>>>,
}

impl MockEntityFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the status returned for a part.
    #[allow(dead_code)]
    pub fn with_part_status(mut self, id: EntityId, status: i32) -> Self {
        self.statuses.insert(id, status);
        self
    }

    /// Makes the fetch of `id` fail with a transport error.
    #[allow(dead_code)]
    pub fn failing(mut self, id: EntityId) -> Self {
        self.failing.insert(id);
        self
    }

    /// Makes the fetch of `id` never return.
    #[allow(dead_code)]
    pub fn hanging(mut self, id: EntityId) -> Self {
        self.hanging.insert(id);
        self
    }

    /// Delays the fetch of `id` before answering.
    #[allow(dead_code)]
    pub fn delayed(mut self, id: EntityId, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    /// Answers the fetch of `id` with a record carrying `returned_id`.
    #[allow(dead_code)]
    pub fn returning_id(mut self, id: EntityId, returned_id: EntityId) -> Self {
        self.renumbered.insert(id, returned_id);
        self
    }

    pub fn calls(&self) -> usize {
        self.timings.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn timing(&self, id: EntityId) -> FetchTiming {
        *self
            .timings
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .unwrap()
    }
}

impl EntityFetcher for MockEntityFetcher {
    async fn fetch(&self, kind: EntityKind, id: EntityId) -> Result<EntityRecord, AppError> {
        let started = Instant::now();

        if self.hanging.contains(&id) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }

        self.timings.lock().unwrap().push(FetchTiming {
            id,
            started,
            finished: Instant::now(),
        });

        if self.failing.contains(&id) {
            return Err(AppError::NetworkError(format!(
                "connection reset while fetching {} {}",
                kind, id
            )));
        }

        let record_id = self.renumbered.get(&id).copied().unwrap_or(id);
        Ok(match kind {
            EntityKind::Category => EntityRecord::Category(Category {
                category_id: record_id,
                title: format!("Category {}", id),
                ..Default::default()
            }),
            EntityKind::Part => EntityRecord::Part(Part {
                part_id: record_id,
                status: self.statuses.get(&id).copied().unwrap_or(800),
                short_desc: format!("Part {}", id),
                ..Default::default()
            }),
        })
    }
}

// =============================================================================
// MockSearchIndex
// =============================================================================

/// A write issued against the mock index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexCall {
    Update(EntityKind, EntityId),
    Index(EntityKind, EntityId),
}

/// In-memory search index keyed by `(kind, id)`.
#[derive(Clone, Default)]
pub struct MockSearchIndex {
    docs: Arc<Mutex<HashMap<(EntityKind, EntityId), Value>>>,
    calls: Arc<Mutex<Vec<IndexCall>>>,
    failing_exists: HashSet<EntityId>,
    failing_writes: HashSet<EntityId>,
}

impl MockSearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document, as if a previous run had indexed it.
    #[allow(dead_code)]
    pub fn with_document(self, kind: EntityKind, id: EntityId) -> Self {
        self.docs
            .lock()
            .unwrap()
            .insert((kind, id), serde_json::json!({ "seeded": true }));
        self
    }

    #[allow(dead_code)]
    pub fn failing_exists(mut self, id: EntityId) -> Self {
        self.failing_exists.insert(id);
        self
    }

    #[allow(dead_code)]
    pub fn failing_writes(mut self, id: EntityId) -> Self {
        self.failing_writes.insert(id);
        self
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn contains(&self, kind: EntityKind, id: EntityId) -> bool {
        self.docs.lock().unwrap().contains_key(&(kind, id))
    }

    #[allow(dead_code)]
    pub fn document(&self, kind: EntityKind, id: EntityId) -> Option<Value> {
        self.docs.lock().unwrap().get(&(kind, id)).cloned()
    }

    pub fn calls(&self) -> Vec<IndexCall> {
        self.calls.lock().unwrap().clone()
    }

    fn store(&self, kind: EntityKind, id: EntityId, record: &EntityRecord) -> Result<(), AppError> {
        if self.failing_writes.contains(&id) {
            return Err(AppError::IndexError(format!("HTTP 500 writing {}", id)));
        }
        let doc = serde_json::to_value(record)?;
        self.docs.lock().unwrap().insert((kind, id), doc);
        Ok(())
    }
}

impl SearchIndex for MockSearchIndex {
    async fn exists(&self, kind: EntityKind, id: EntityId) -> Result<bool, AppError> {
        if self.failing_exists.contains(&id) {
            return Err(AppError::IndexError("HTTP 503 on HEAD".to_string()));
        }
        Ok(self.contains(kind, id))
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: EntityId,
        record: &EntityRecord,
    ) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(IndexCall::Update(kind, id));
        if !self.contains(kind, id) {
            return Err(AppError::IndexError(format!("document {} missing", id)));
        }
        self.store(kind, id, record)
    }

    async fn index(
        &self,
        kind: EntityKind,
        id: EntityId,
        record: &EntityRecord,
    ) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(IndexCall::Index(kind, id));
        self.store(kind, id, record)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .filter(|(_, doc)| doc.to_string().contains(query))
            .take(limit)
            .map(|((kind, id), doc)| SearchHit {
                index: "curt".to_string(),
                doc_type: Some(kind.to_string()),
                id: id.to_string(),
                score: Some(1.0),
                source: doc.clone(),
            })
            .collect())
    }
}

// =============================================================================
// Reporters
// =============================================================================

/// Reporter that keeps a compact log of the events it saw.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: SyncEvent<'_>) {
        let line = match event {
            SyncEvent::RunStarted { kind } => format!("run_started:{}", kind),
            SyncEvent::IdentifiersFound { kind, count } => format!("ids_found:{}:{}", kind, count),
            SyncEvent::WindowStarted { window, size, .. } => {
                format!("window_started:{}:{}", window, size)
            }
            SyncEvent::WindowCompleted {
                window, processed, ..
            } => format!("window_completed:{}:{}", window, processed),
            SyncEvent::ItemFailed { id, .. } => format!("item_failed:{}", id),
            SyncEvent::RunCompleted { report } => format!("run_completed:{}", report.kind),
            SyncEvent::RunCancelled { report } => format!("run_cancelled:{}", report.kind),
            SyncEvent::KindFailed { kind, .. } => format!("kind_failed:{}", kind),
            SyncEvent::BatchCompleted { .. } => "batch_completed".to_string(),
        };
        self.events.lock().unwrap().push(line);
    }
}

/// Reporter that fires a cancellation token once the first window completes.
pub struct CancelAfterFirstWindow {
    pub token: CancellationToken,
}

impl ProgressReporter for CancelAfterFirstWindow {
    fn report(&self, event: SyncEvent<'_>) {
        if let SyncEvent::WindowCompleted { .. } = event {
            self.token.cancel();
        }
    }
}
