use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// A named pipeline stage began.
    StageStarted { stage: &'static str },
    /// A named pipeline stage produced its output dataset.
    StageFinished {
        stage: &'static str,
        output_rows: usize,
        elapsed: Duration,
    },
    /// A named pipeline stage returned an error.
    StageFailed { stage: &'static str, error: String },
    /// A chunked data-parallel operation began.
    RunStarted { operation: &'static str, rows: usize },
    ThrottleWaited { duration: Duration },
    ChunkStarted { start_row: usize, row_count: usize },
    ChunkFinished { output_rows: usize },
    RunFinished {
        operation: &'static str,
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to `tracing`: stages at `info`, runs at `debug`, chunks at `trace`.
#[derive(Debug, Default)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::StageStarted { stage } => tracing::info!(stage, "stage started"),
            ExecutionEvent::StageFinished {
                stage,
                output_rows,
                elapsed,
            } => tracing::info!(stage, output_rows, ?elapsed, "stage finished"),
            ExecutionEvent::StageFailed { stage, error } => {
                tracing::error!(stage, error = %error, "stage failed")
            }
            ExecutionEvent::RunStarted { operation, rows } => {
                tracing::debug!(operation, rows, "parallel run started")
            }
            ExecutionEvent::RunFinished {
                operation,
                elapsed,
                metrics,
            } => tracing::debug!(operation, ?elapsed, %metrics, "parallel run finished"),
            ExecutionEvent::ThrottleWaited { duration } => {
                tracing::trace!(?duration, "waited for chunk permit")
            }
            ExecutionEvent::ChunkStarted {
                start_row,
                row_count,
            } => tracing::trace!(start_row, row_count, "chunk started"),
            ExecutionEvent::ChunkFinished { output_rows } => {
                tracing::trace!(output_rows, "chunk finished")
            }
        }
    }
}

/// Cumulative metrics for everything an engine has executed.
///
/// The engine updates these counters during execution; callers can snapshot them at any time,
/// including while stages are still running.
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    runs_started: AtomicU64,
    runs_finished: AtomicU64,
    stages_finished: AtomicU64,

    rows_processed: AtomicU64,
    chunks_started: AtomicU64,
    chunks_finished: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_chunks: AtomicUsize,
    max_active_chunks: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin_run(&self) {
        self.runs_started.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn end_run(&self) {
        self.runs_finished.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn on_stage_finished(&self) {
        self.stages_finished.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn on_rows_processed(&self, n: usize) {
        self.rows_processed.fetch_add(n as u64, Ordering::SeqCst);
    }

    pub(crate) fn on_chunk_start(&self) {
        self.chunks_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_chunks.fetch_max(now, Ordering::SeqCst);
    }

    pub(crate) fn on_chunk_end(&self) {
        self.chunks_finished.fetch_add(1, Ordering::SeqCst);
        self.active_chunks.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn on_throttle_wait(&self, d: Duration) {
        let add = d.as_nanos().min(u64::MAX as u128) as u64;
        self.throttle_wait_ns.fetch_add(add, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        ExecutionMetricsSnapshot {
            runs_started: self.runs_started.load(Ordering::SeqCst),
            runs_finished: self.runs_finished.load(Ordering::SeqCst),
            stages_finished: self.stages_finished.load(Ordering::SeqCst),
            rows_processed: self.rows_processed.load(Ordering::SeqCst),
            chunks_started: self.chunks_started.load(Ordering::SeqCst),
            chunks_finished: self.chunks_finished.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_chunks: self.max_active_chunks.load(Ordering::SeqCst),
        }
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub runs_started: u64,
    pub runs_finished: u64,
    pub stages_finished: u64,
    pub rows_processed: u64,
    pub chunks_started: u64,
    pub chunks_finished: u64,
    pub throttle_wait: Duration,
    pub max_active_chunks: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs={}/{}, stages={}, rows_processed={}, chunks={}/{}, max_active_chunks={}, throttle_wait={:?}",
            self.runs_finished,
            self.runs_started,
            self.stages_finished,
            self.rows_processed,
            self.chunks_finished,
            self.chunks_started,
            self.max_active_chunks,
            self.throttle_wait,
        )
    }
}
