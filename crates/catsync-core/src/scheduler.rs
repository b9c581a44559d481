//! Windowed batch scheduling.
//!
//! Identifiers are split into consecutive windows of `window_size`. All workers
//! of a window run concurrently; the next window starts only after every worker
//! of the current one has returned. This bounds the number of in-flight calls
//! against the catalog API and the search index to `window_size`.
//!
//! ```text
//! ids:      [101 102 103 104 105 | 106]
//! window 0:  101..105 concurrently ──join──┐
//! window 1:                                └─> 106
//! ```

use std::future::Future;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::models::EntityId;

/// Number of windows needed to cover `len` identifiers.
///
/// A window size of zero is treated as one.
pub fn window_count(len: usize, window_size: usize) -> usize {
    len.div_ceil(window_size.max(1))
}

/// Splits `ids` into consecutive windows; the last one may be shorter.
pub fn windows(ids: &[EntityId], window_size: usize) -> std::slice::Chunks<'_, EntityId> {
    ids.chunks(window_size.max(1))
}

/// Position of a finished window within the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpan {
    /// Zero-based window index.
    pub index: usize,
    pub total_windows: usize,
    /// Identifiers dispatched in this window.
    pub size: usize,
    /// Identifiers dispatched so far, including this window.
    pub processed: usize,
    /// Identifiers in the whole run.
    pub total: usize,
}

/// What the scheduler managed to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub windows_run: usize,
    pub dispatched: usize,
    /// True when the token fired before every window was started.
    pub cancelled: bool,
}

/// Runs workers over identifiers one window at a time.
#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    window_size: usize,
}

impl BatchScheduler {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Drives `worker` over every identifier.
    ///
    /// `on_window_start` is called before a window is dispatched and
    /// `on_window_done` after all of its workers returned, with their outputs in
    /// dispatch order. Cancellation is checked only between windows, so a
    /// started window always runs to completion.
    ///
    /// The workers of a window are polled concurrently on the calling task.
    /// Their network calls overlap, while CPU work such as decoding a response
    /// runs one worker at a time. Workers are I/O bound, so no task is spawned
    /// per identifier.
    pub async fn run<T, W, Fut, S, D>(
        &self,
        ids: &[EntityId],
        cancel: &CancellationToken,
        worker: W,
        mut on_window_start: S,
        mut on_window_done: D,
    ) -> ScheduleOutcome
    where
        W: Fn(EntityId) -> Fut,
        Fut: Future<Output = T>,
        S: FnMut(WindowSpan),
        D: FnMut(WindowSpan, Vec<T>),
    {
        let total = ids.len();
        let total_windows = window_count(total, self.window_size);
        let mut outcome = ScheduleOutcome {
            windows_run: 0,
            dispatched: 0,
            cancelled: false,
        };

        for (index, window) in windows(ids, self.window_size).enumerate() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let mut span = WindowSpan {
                index,
                total_windows,
                size: window.len(),
                processed: outcome.dispatched,
                total,
            };
            on_window_start(span);

            let results = join_all(window.iter().map(|&id| worker(id))).await;

            outcome.windows_run += 1;
            outcome.dispatched += window.len();
            span.processed = outcome.dispatched;
            on_window_done(span, results);
        }

        outcome
    }
}
