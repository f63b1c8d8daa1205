//! Execution engine: the explicit handle every pipeline run is given.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - Parallel (chunked) execution for row-wise operations (filter, derived columns)
//! - Concurrent execution of independent stages ([`ExecutionEngine::join`])
//! - Resource limits / throttling (in-flight chunks, shared across concurrent stages)
//! - Real-time metrics + observer hooks for monitoring

mod observer;
mod semaphore;

use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::error::{ExecutionError, ProcessingResult};
use crate::processing::ColumnDerivation;
use crate::types::{DataSet, Field, Value};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, TracingExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of rows per chunk.
    pub chunk_size: usize,
    /// Upper bound on concurrently executing chunks, across all stages of the engine.
    pub max_in_flight_chunks: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = available_parallelism();
        Self {
            num_threads: Some(n),
            chunk_size: 4_096,
            max_in_flight_chunks: n,
        }
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// A configurable execution engine for in-memory [`DataSet`] pipelines.
///
/// Owns the worker pool; nothing is global, so several engines can coexist (e.g. in tests).
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
    throttle: Semaphore,
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("opts", &self.opts)
            .field("observer_set", &self.observer.is_some())
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails if `chunk_size == 0`, `max_in_flight_chunks == 0`, `num_threads == Some(0)`, or the
    /// thread pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> Result<Self, ExecutionError> {
        if opts.chunk_size == 0 {
            return Err(invalid("chunk_size must be > 0"));
        }
        if opts.max_in_flight_chunks == 0 {
            return Err(invalid("max_in_flight_chunks must be > 0"));
        }
        if opts.num_threads == Some(0) {
            return Err(invalid("num_threads must be > 0 when set"));
        }

        let n_threads = opts.num_threads.unwrap_or_else(available_parallelism).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("taxi-reports-{i}"))
            .build()?;

        Ok(Self {
            pool,
            throttle: Semaphore::new(opts.max_in_flight_chunks),
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run two independent closures concurrently on the engine's pool and wait for both.
    pub fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        self.pool.install(|| rayon::join(a, b))
    }

    /// Run one named pipeline stage, reporting start/finish (or failure) to the observer.
    pub fn run_stage<F>(&self, stage: &'static str, f: F) -> ProcessingResult<DataSet>
    where
        F: FnOnce() -> ProcessingResult<DataSet>,
    {
        let span = tracing::info_span!("stage", stage);
        let _entered = span.enter();
        let start = Instant::now();
        self.emit(ExecutionEvent::StageStarted { stage });

        let result = f();
        match &result {
            Ok(ds) => {
                self.metrics.on_stage_finished();
                self.emit(ExecutionEvent::StageFinished {
                    stage,
                    output_rows: ds.row_count(),
                    elapsed: start.elapsed(),
                });
            }
            Err(e) => self.emit(ExecutionEvent::StageFailed {
                stage,
                error: e.to_string(),
            }),
        }
        result
    }

    /// Execute a parallel filter over the dataset. Output keeps input row order.
    pub fn filter_parallel<F>(&self, dataset: &DataSet, predicate: F) -> DataSet
    where
        F: Fn(&[Value]) -> bool + Send + Sync,
    {
        let per_chunk = self.run_chunks("filter", dataset.row_count(), |range| {
            dataset.rows[range]
                .iter()
                .filter(|row| predicate(row.as_slice()))
                .cloned()
                .collect::<Vec<_>>()
        });
        let rows = per_chunk.into_iter().flatten().collect();
        DataSet::new(dataset.schema.clone(), rows)
    }

    /// Parallel version of [`crate::processing::with_column`], with identical output.
    ///
    /// The first failing row (in row order) determines the returned error.
    pub fn with_column_parallel<F>(&self, dataset: &DataSet, field: Field, expr: F) -> ProcessingResult<DataSet>
    where
        F: Fn(&[Value]) -> ProcessingResult<Value> + Send + Sync,
    {
        let derivation = ColumnDerivation::new(&dataset.schema, field);
        let per_chunk = self.run_chunks("with_column", dataset.row_count(), |range| {
            dataset.rows[range]
                .iter()
                .map(|row| derivation.apply(row, expr(row)?))
                .collect::<ProcessingResult<Vec<_>>>()
        });

        let mut rows = Vec::with_capacity(dataset.row_count());
        for chunk in per_chunk {
            rows.extend(chunk?);
        }
        Ok(DataSet::new(derivation.schema, rows))
    }

    fn run_chunks<T, F>(&self, operation: &'static str, row_count: usize, per_chunk: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Send + Sync,
    {
        self.pool.install(|| {
            let start = Instant::now();
            self.metrics.begin_run();
            self.emit(ExecutionEvent::RunStarted {
                operation,
                rows: row_count,
            });

            let out: Vec<T> = chunk_ranges(row_count, self.opts.chunk_size)
                .into_par_iter()
                .map(|range| {
                    let (_permit, waited) = self.throttle.acquire();
                    if waited > Duration::ZERO {
                        self.metrics.on_throttle_wait(waited);
                        self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                    }

                    let len = range.end - range.start;
                    self.metrics.on_chunk_start();
                    self.emit(ExecutionEvent::ChunkStarted {
                        start_row: range.start,
                        row_count: len,
                    });

                    let result = per_chunk(range);

                    self.metrics.on_rows_processed(len);
                    self.emit(ExecutionEvent::ChunkFinished { output_rows: len });
                    self.metrics.on_chunk_end();
                    result
                })
                .collect();

            self.metrics.end_run();
            self.emit(ExecutionEvent::RunFinished {
                operation,
                elapsed: start.elapsed(),
                metrics: self.metrics.snapshot(),
            });
            out
        })
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn invalid(message: &str) -> ExecutionError {
    ExecutionError::InvalidOptions {
        message: message.to_string(),
    }
}

fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    (0..row_count)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(row_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{chunk_ranges, ExecutionEngine, ExecutionOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::error::{ExecutionError, ProcessingError};
    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn dataset_of_n(n: usize) -> DataSet {
        let schema = Schema::new(vec![Field::new("id", DataType::Int64)]);
        let rows = (0..n as i64).map(|i| vec![Value::Int64(i)]).collect();
        DataSet::new(schema, rows)
    }

    fn engine(threads: usize, chunk_size: usize, in_flight: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(threads),
            chunk_size,
            max_in_flight_chunks: in_flight,
        })
        .unwrap()
    }

    fn plus_one(row: &[Value]) -> Result<Value, ProcessingError> {
        Ok(match row[0] {
            Value::Int64(x) => Value::Int64(x + 1),
            _ => Value::Null,
        })
    }

    #[test]
    fn chunk_ranges_cover_all_rows() {
        assert_eq!(chunk_ranges(0, 4), Vec::<std::ops::Range<usize>>::new());
        assert_eq!(chunk_ranges(10, 4), vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let err = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(1),
            chunk_size: 0,
            max_in_flight_chunks: 1,
        })
        .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidOptions { .. }));
    }

    #[test]
    fn with_column_parallel_keeps_row_order() {
        let ds = dataset_of_n(1_000);
        let out = engine(4, 7, 4)
            .with_column_parallel(&ds, Field::new("next", DataType::Int64), plus_one)
            .unwrap();
        assert_eq!(out.row_count(), 1_000);
        for (i, row) in out.rows.iter().enumerate() {
            assert_eq!(row, &vec![Value::Int64(i as i64), Value::Int64(i as i64 + 1)]);
        }
    }

    #[test]
    fn with_column_parallel_propagates_errors() {
        let ds = dataset_of_n(50);
        let err = engine(2, 8, 2)
            .with_column_parallel(&ds, Field::new("next", DataType::Utf8), plus_one)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::TypeMismatch { .. }));
    }

    #[test]
    fn filter_parallel_keeps_matching_rows_in_order() {
        let ds = dataset_of_n(333);
        let out = engine(3, 10, 3).filter_parallel(&ds, |row| matches!(row[0], Value::Int64(v) if v % 2 == 0));
        let expected: Vec<Vec<Value>> = (0..333).step_by(2).map(|v| vec![Value::Int64(v)]).collect();
        assert_eq!(out.schema, ds.schema);
        assert_eq!(out.rows, expected);
    }

    #[test]
    fn with_column_parallel_runs_with_concurrency() {
        let ds = dataset_of_n(400);
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let (active2, max_active2) = (Arc::clone(&active), Arc::clone(&max_active));
        let out = engine(4, 1, 4)
            .with_column_parallel(&ds, Field::new("next", DataType::Int64), move |row| {
                let now = active2.fetch_add(1, Ordering::SeqCst) + 1;
                max_active2.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(2));
                active2.fetch_sub(1, Ordering::SeqCst);
                plus_one(row)
            })
            .unwrap();

        assert_eq!(out.row_count(), ds.row_count());
        assert!(max_active.load(Ordering::SeqCst) > 1);
    }

    #[derive(Default)]
    struct ConcurrencyObserver {
        active_chunks: AtomicUsize,
        max_active_chunks: AtomicUsize,
        stages: AtomicUsize,
    }

    impl ExecutionObserver for ConcurrencyObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::ChunkStarted { .. } => {
                    let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_active_chunks.fetch_max(now, Ordering::SeqCst);
                }
                ExecutionEvent::ChunkFinished { .. } => {
                    self.active_chunks.fetch_sub(1, Ordering::SeqCst);
                }
                ExecutionEvent::StageFinished { .. } => {
                    self.stages.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn max_in_flight_chunks_throttles_across_concurrent_stages() {
        let ds = dataset_of_n(60);
        let observer = Arc::new(ConcurrencyObserver::default());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = engine(4, 1, 1).with_observer(obs_trait);

        let slow = |row: &[Value]| {
            std::thread::sleep(Duration::from_millis(1));
            plus_one(row)
        };
        let (a, b) = engine.join(
            || {
                engine.run_stage("left", || {
                    engine.with_column_parallel(&ds, Field::new("a", DataType::Int64), slow)
                })
            },
            || {
                engine.run_stage("right", || {
                    engine.with_column_parallel(&ds, Field::new("b", DataType::Int64), slow)
                })
            },
        );

        assert_eq!(a.unwrap().row_count(), 60);
        assert_eq!(b.unwrap().row_count(), 60);
        assert_eq!(observer.max_active_chunks.load(Ordering::SeqCst), 1);
        assert_eq!(observer.stages.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn metrics_accumulate_across_runs() {
        let ds = dataset_of_n(60);
        let engine = engine(4, 1, 1);
        let metrics = engine.metrics();

        let slow = |row: &[Value]| {
            std::thread::sleep(Duration::from_millis(2));
            plus_one(row)
        };
        engine
            .with_column_parallel(&ds, Field::new("a", DataType::Int64), slow)
            .unwrap();
        let _ = engine.filter_parallel(&ds, |_| true);

        let snap = metrics.snapshot();
        assert_eq!(snap.runs_started, 2);
        assert_eq!(snap.runs_finished, 2);
        assert_eq!(snap.rows_processed, 120);
        assert_eq!(snap.chunks_started, 120);
        assert_eq!(snap.chunks_finished, 120);
        assert_eq!(snap.max_active_chunks, 1);
        assert!(snap.throttle_wait > Duration::ZERO);
    }
}
