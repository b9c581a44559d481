//! Integration tests for SyncService.
//!
//! These tests drive the windowed upsert pipeline against in-memory mocks.

use std::time::Duration;

use catsync_core::{EntityKind, OperationOutcome, SyncConfig, SyncService, SyncStatus};
use tokio_util::sync::CancellationToken;

use crate::integration::common::{
    CancelAfterFirstWindow, IndexCall, MockEntityFetcher, MockIdentifierSource, MockSearchIndex,
    RecordingReporter,
};

const SIX_IDS: [i64; 6] = [101, 102, 103, 104, 105, 106];

fn part_source(ids: &[i64]) -> MockIdentifierSource {
    MockIdentifierSource::new().with_ids(EntityKind::Part, ids.to_vec())
}

/// Six identifiers with a window of five: the trailing identifier gets its own
/// window and every record lands in an empty index as an insert.
#[tokio::test]
async fn test_six_ids_all_inserted_across_two_windows() {
    let index = MockSearchIndex::new();
    let reporter = RecordingReporter::default();
    let service = SyncService::new(part_source(&SIX_IDS), MockEntityFetcher::new(), index.clone());

    let report = service
        .sync_kind_with_progress(EntityKind::Part, &reporter)
        .await
        .unwrap();

    assert_eq!(report.inserted, 6);
    assert_eq!(report.updated, 0);
    assert_eq!(report.successful, 6);
    assert_eq!(report.failed, 0);
    assert_eq!(report.status, SyncStatus::Completed);
    assert_eq!(index.len(), 6);
    assert!(index.contains(EntityKind::Part, 106));

    assert_eq!(reporter.count("window_started"), 2);
    let events = reporter.events.lock().unwrap();
    assert!(events.contains(&"window_started:0:5".to_string()));
    assert!(events.contains(&"window_started:1:1".to_string()));
    assert!(events.contains(&"window_completed:1:6".to_string()));
}

/// A transport error for one identifier is recorded and does not stop the window.
#[tokio::test]
async fn test_fetch_failure_is_isolated() {
    let index = MockSearchIndex::new();
    let fetcher = MockEntityFetcher::new().failing(103);
    let reporter = RecordingReporter::default();
    let service = SyncService::new(part_source(&SIX_IDS), fetcher, index.clone());

    let report = service
        .sync_kind_with_progress(EntityKind::Part, &reporter)
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.successful, 5);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].id, 103);
    assert_eq!(report.errors[0].outcome, OperationOutcome::FetchFailed);
    assert!(report.errors[0].message.contains("103"));
    assert!(!index.contains(EntityKind::Part, 103));
    assert_eq!(reporter.count("item_failed:103"), 1);
}

/// A part with status 0 is skipped and touches none of the four counters.
#[tokio::test]
async fn test_inactive_part_is_skipped() {
    let index = MockSearchIndex::new();
    let fetcher = MockEntityFetcher::new().with_part_status(107, 0);
    let service = SyncService::new(part_source(&[107]), fetcher, index.clone());

    let report = service.sync_kind(EntityKind::Part).await.unwrap();

    assert_eq!(report.successful, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(report.updated, 0);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 1);
    assert!(report.errors.is_empty());
    assert_eq!(index.len(), 0);
    assert!(index.calls().is_empty());
}

/// Non-positive identifiers never reach the catalog API or the index.
#[tokio::test]
async fn test_non_positive_ids_skipped_without_calls() {
    let fetcher = MockEntityFetcher::new();
    let index = MockSearchIndex::new();
    let service = SyncService::new(MockIdentifierSource::new(), fetcher.clone(), index.clone());

    let report = service.sync_ids(EntityKind::Category, &[0, -4]).await;

    assert_eq!(report.skipped, 2);
    assert_eq!(report.total(), 2);
    assert_eq!(fetcher.calls(), 0);
    assert!(index.calls().is_empty());
}

/// A record whose own id differs from the requested one is never written.
#[tokio::test]
async fn test_record_id_mismatch_is_fetch_failure() {
    let index = MockSearchIndex::new();
    let fetcher = MockEntityFetcher::new().returning_id(103, 1030);
    let service = SyncService::new(part_source(&SIX_IDS), fetcher, index.clone());

    let report = service.sync_kind(EntityKind::Part).await.unwrap();

    assert_eq!(report.successful, 5);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].id, 103);
    assert_eq!(report.errors[0].outcome, OperationOutcome::FetchFailed);
    assert!(report.errors[0].message.contains("1030"));
    assert!(!index.contains(EntityKind::Part, 103));
    assert!(!index.contains(EntityKind::Part, 1030));
    assert!(
        !index
            .calls()
            .iter()
            .any(|call| matches!(call, IndexCall::Index(_, 103) | IndexCall::Update(_, 103)))
    );
}

/// Running twice against unchanged data turns every insert into an update.
#[tokio::test]
async fn test_second_run_updates_instead_of_inserting() {
    let index = MockSearchIndex::new();
    let service = SyncService::new(
        MockIdentifierSource::new().with_ids(EntityKind::Category, SIX_IDS.to_vec()),
        MockEntityFetcher::new(),
        index.clone(),
    );

    let first = service.sync_kind(EntityKind::Category).await.unwrap();
    assert_eq!(first.inserted, 6);

    let second = service.sync_kind(EntityKind::Category).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 6);
    assert_eq!(second.successful, second.inserted + second.updated);
    assert_eq!(index.len(), 6);

    let doc = index.document(EntityKind::Category, 101).unwrap();
    assert_eq!(doc["CategoryId"], 101);
}

/// Update-or-insert issues exactly one write per identifier.
#[tokio::test]
async fn test_existing_document_gets_update_only() {
    let index = MockSearchIndex::new().with_document(EntityKind::Part, 101);
    let service = SyncService::new(part_source(&[101, 102]), MockEntityFetcher::new(), index.clone());

    let report = service.sync_kind(EntityKind::Part).await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.inserted, 1);
    let calls = index.calls();
    assert!(calls.contains(&IndexCall::Update(EntityKind::Part, 101)));
    assert!(!calls.contains(&IndexCall::Index(EntityKind::Part, 101)));
    assert!(calls.contains(&IndexCall::Index(EntityKind::Part, 102)));
    assert!(!calls.contains(&IndexCall::Update(EntityKind::Part, 102)));

    // The seeded document was replaced by the full record.
    let doc = index.document(EntityKind::Part, 101).unwrap();
    assert_eq!(doc["PartId"], 101);
}

/// Always-reindex updates and then re-indexes existing documents.
#[tokio::test]
async fn test_always_reindex_writes_twice() {
    let index = MockSearchIndex::new().with_document(EntityKind::Part, 101);
    let config = SyncConfig::default().with_always_reindex();
    let service = SyncService::with_config(
        part_source(&[101]),
        MockEntityFetcher::new(),
        index.clone(),
        config,
    );

    let report = service.sync_kind(EntityKind::Part).await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.inserted, 0);
    assert_eq!(
        index.calls(),
        vec![
            IndexCall::Update(EntityKind::Part, 101),
            IndexCall::Index(EntityKind::Part, 101),
        ]
    );
}

/// A failing existence check falls through to an insert.
#[tokio::test]
async fn test_exists_error_treated_as_absent() {
    let index = MockSearchIndex::new().failing_exists(102);
    let service = SyncService::new(part_source(&[102]), MockEntityFetcher::new(), index.clone());

    let report = service.sync_kind(EntityKind::Part).await.unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed, 0);
    assert!(index.contains(EntityKind::Part, 102));
}

/// A rejected index write is reported as WriteFailed with its message.
#[tokio::test]
async fn test_write_failure_recorded() {
    let index = MockSearchIndex::new().failing_writes(105);
    let service = SyncService::new(part_source(&SIX_IDS), MockEntityFetcher::new(), index);

    let report = service.sync_kind(EntityKind::Part).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.successful, 5);
    assert_eq!(report.errors[0].id, 105);
    assert_eq!(report.errors[0].outcome, OperationOutcome::WriteFailed);
    assert_eq!(report.error_messages(), vec!["Search index error: HTTP 500 writing 105"]);
}

/// Window k+1 never starts before every worker of window k has finished.
#[tokio::test(start_paused = true)]
async fn test_window_barrier_with_staggered_delays() {
    let fetcher = MockEntityFetcher::new()
        .delayed(101, Duration::from_millis(50))
        .delayed(102, Duration::from_millis(10))
        .delayed(103, Duration::from_millis(40))
        .delayed(104, Duration::from_millis(30))
        .delayed(105, Duration::from_millis(20))
        .delayed(106, Duration::from_millis(5));
    let service = SyncService::new(part_source(&SIX_IDS), fetcher.clone(), MockSearchIndex::new());

    let report = service.sync_kind(EntityKind::Part).await.unwrap();
    assert_eq!(report.inserted, 6);

    let first_window: Vec<_> = SIX_IDS[..5].iter().map(|&id| fetcher.timing(id)).collect();
    let second = fetcher.timing(106);

    let window_start = first_window[0].started;
    let window_end = first_window.iter().map(|t| t.finished).max().unwrap();

    // The first window ran concurrently: everything started together.
    assert!(first_window.iter().all(|t| t.started == window_start));
    assert!(window_end - window_start < Duration::from_millis(60));

    // Barrier: the trailing identifier started only after the slowest one finished.
    assert!(second.started >= window_end);
}

/// A call that never returns is cut off by the per-call timeout.
#[tokio::test(start_paused = true)]
async fn test_hanging_fetch_times_out() {
    let fetcher = MockEntityFetcher::new().hanging(104);
    let config = SyncConfig::default().with_call_timeout(Duration::from_secs(2));
    let service = SyncService::with_config(
        part_source(&SIX_IDS),
        fetcher,
        MockSearchIndex::new(),
        config,
    );

    let report = service.sync_kind(EntityKind::Part).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.successful, 5);
    assert_eq!(report.errors[0].id, 104);
    assert_eq!(report.errors[0].outcome, OperationOutcome::FetchFailed);
    assert!(report.errors[0].message.contains("timed out"));
}

/// A sub-second deadline still reports a non-zero timeout.
#[tokio::test(start_paused = true)]
async fn test_sub_second_timeout_message() {
    let fetcher = MockEntityFetcher::new().hanging(101);
    let config = SyncConfig::default().with_call_timeout(Duration::from_millis(500));
    let service =
        SyncService::with_config(part_source(&[101]), fetcher, MockSearchIndex::new(), config);

    let report = service.sync_kind(EntityKind::Part).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].message, "Request timed out after 1 seconds");
}

/// Cancellation stops the run between windows and keeps the finished window.
#[tokio::test]
async fn test_cancellation_between_windows() {
    let ids: Vec<i64> = (201..=212).collect();
    let index = MockSearchIndex::new();
    let service = SyncService::new(part_source(&ids), MockEntityFetcher::new(), index.clone());
    let token = CancellationToken::new();
    let reporter = CancelAfterFirstWindow {
        token: token.clone(),
    };

    let report = service
        .sync_kind_cancellable(EntityKind::Part, &reporter, token)
        .await
        .unwrap();

    assert!(report.is_cancelled());
    assert_eq!(report.inserted, 5);
    assert_eq!(report.total(), 5);
    assert_eq!(index.len(), 5);
}

/// A token cancelled up front dispatches nothing.
#[tokio::test]
async fn test_cancelled_before_start() {
    let fetcher = MockEntityFetcher::new();
    let service = SyncService::new(part_source(&SIX_IDS), fetcher.clone(), MockSearchIndex::new());
    let token = CancellationToken::new();
    token.cancel();

    let report = service
        .sync_ids_with_progress(
            EntityKind::Part,
            &SIX_IDS,
            &RecordingReporter::default(),
            token,
        )
        .await;

    assert_eq!(report.status, SyncStatus::Cancelled);
    assert_eq!(report.total(), 0);
    assert_eq!(fetcher.calls(), 0);
}

/// An identifier source failure surfaces as an error for that kind only.
#[tokio::test]
async fn test_sync_kind_propagates_source_error() {
    let service = SyncService::new(
        MockIdentifierSource::new().failing(EntityKind::Category),
        MockEntityFetcher::new(),
        MockSearchIndex::new(),
    );

    let result = service.sync_kind(EntityKind::Category).await;
    assert!(result.is_err());
}

/// sync_all keeps going after one kind fails to list its identifiers.
#[tokio::test]
async fn test_sync_all_isolates_kind_failures() {
    let source = MockIdentifierSource::new()
        .with_ids(EntityKind::Category, vec![1, 2, 3])
        .failing(EntityKind::Part);
    let index = MockSearchIndex::new();
    let reporter = RecordingReporter::default();
    let service = SyncService::new(source, MockEntityFetcher::new(), index.clone());

    let summary = service
        .sync_all(&EntityKind::ALL, &reporter, CancellationToken::new())
        .await;

    assert_eq!(summary.results.len(), 2);
    assert_eq!(summary.failed_kinds(), 1);
    assert_eq!(summary.total_successful(), 3);
    assert!(summary.results[0].is_success());
    assert_eq!(summary.results[1].kind, EntityKind::Part);
    assert!(
        summary.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("connection refused")
    );
    assert_eq!(index.len(), 3);
    assert_eq!(reporter.count("kind_failed:part"), 1);
    assert_eq!(reporter.count("batch_completed"), 1);
}

/// An empty identifier list produces an empty, completed report.
#[tokio::test]
async fn test_empty_identifier_list() {
    let reporter = RecordingReporter::default();
    let service = SyncService::new(
        MockIdentifierSource::new(),
        MockEntityFetcher::new(),
        MockSearchIndex::new(),
    );

    let report = service
        .sync_kind_with_progress(EntityKind::Category, &reporter)
        .await
        .unwrap();

    assert_eq!(report.total(), 0);
    assert_eq!(report.status, SyncStatus::Completed);
    assert_eq!(reporter.count("window_started"), 0);
    assert_eq!(reporter.count("run_completed:category"), 1);
}

/// Mixed outcomes keep the counter invariants.
#[tokio::test]
async fn test_counter_invariants_with_mixed_outcomes() {
    let ids: Vec<i64> = (1..=23).collect();
    let fetcher = MockEntityFetcher::new()
        .failing(4)
        .failing(17)
        .with_part_status(9, 0)
        .with_part_status(21, -1);
    let index = MockSearchIndex::new()
        .with_document(EntityKind::Part, 2)
        .with_document(EntityKind::Part, 3)
        .failing_writes(12);
    let config = SyncConfig::default().with_window_size(4);
    let service = SyncService::with_config(part_source(&ids), fetcher, index, config);

    let report = service.sync_kind(EntityKind::Part).await.unwrap();

    assert_eq!(report.successful, report.inserted + report.updated);
    assert_eq!(report.inserted, report.successful - report.updated);
    assert_eq!(report.updated, 2);
    assert_eq!(report.failed, 3);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.total(), 23);

    let mut failed_ids: Vec<i64> = report.errors.iter().map(|e| e.id).collect();
    failed_ids.sort_unstable();
    assert_eq!(failed_ids, vec![4, 12, 17]);
}
