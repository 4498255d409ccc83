//! Bounded worker pool over the planned chunks.
//!
//! `min(concurrency, chunks)` threads pull chunks from a shared queue; each
//! thread keeps one curl handle for all its chunks so connections are reused.
//! Results go through an unbounded channel, so a worker never blocks on send
//! after the orchestrator has stopped listening.

use std::collections::VecDeque;
use std::sync::atomic::AtomicU64;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::DownloadError;
use crate::http::RequestSpec;
use crate::segmenter::Chunk;
use crate::storage::{OffsetWriter, StorageWriter};

use super::chunk::fetch_chunk;

/// How often the orchestrator re-checks the cancel token while waiting on workers.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared, read-only inputs for every worker.
pub(super) struct PoolJob {
    pub request: RequestSpec,
    pub storage: StorageWriter,
    pub counter: Arc<AtomicU64>,
}

type WorkQueue = Arc<Mutex<VecDeque<(usize, Chunk)>>>;
type ChunkResult = (usize, Result<(), DownloadError>);

/// Fetches all `chunks` with at most `concurrency` in flight.
///
/// Returns on the first worker error, on cancellation, or once every chunk
/// succeeded. In the first two cases the remaining workers are told to stop
/// and are joined before returning.
pub(super) fn run_pool(
    job: Arc<PoolJob>,
    chunks: &[Chunk],
    concurrency: usize,
    cancel: &CancelToken,
) -> Result<(), DownloadError> {
    let count = chunks.len();
    if count == 0 {
        return Ok(());
    }

    let work: WorkQueue = Arc::new(Mutex::new(chunks.iter().copied().enumerate().collect()));
    let abort = cancel.child();
    let (tx, rx) = mpsc::channel::<ChunkResult>();
    let num_workers = concurrency.clamp(1, count);
    tracing::debug!(workers = num_workers, chunks = count, "starting chunk workers");

    let mut handles = Vec::with_capacity(num_workers);
    for worker in 0..num_workers {
        let job = Arc::clone(&job);
        let work = Arc::clone(&work);
        let tx = tx.clone();
        let abort = abort.clone();
        handles.push(std::thread::spawn(move || {
            worker_loop(worker, &job, &work, &tx, &abort)
        }));
    }
    drop(tx);

    let mut outcome = collect(&rx, count, cancel);
    abort.cancel();
    for h in handles {
        if h.join().is_err() && outcome.is_ok() {
            outcome = Err(DownloadError::WorkerPanicked);
        }
    }
    outcome
}

fn worker_loop(
    worker: usize,
    job: &PoolJob,
    work: &WorkQueue,
    tx: &mpsc::Sender<ChunkResult>,
    abort: &CancelToken,
) {
    let mut easy = curl::easy::Easy::new();
    if let Err(e) = job.request.configure(&mut easy) {
        if let Some((index, _)) = pop(work) {
            let _ = tx.send((index, Err(e.into())));
        }
        return;
    }

    while !abort.is_canceled() {
        let Some((index, chunk)) = pop(work) else {
            break;
        };
        tracing::debug!(worker, chunk = index, range = %chunk.range_header_value(), "fetching chunk");
        let mut writer = OffsetWriter::new(job.storage.clone(), chunk.start);
        let res = fetch_chunk(&mut easy, &chunk, &mut writer, &job.counter, abort).map(|_| ());
        if tx.send((index, res)).is_err() {
            break;
        }
    }
}

fn pop(work: &WorkQueue) -> Option<(usize, Chunk)> {
    work.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

/// Waits for `count` results; the first error or a cancellation wins.
fn collect(
    rx: &mpsc::Receiver<ChunkResult>,
    count: usize,
    cancel: &CancelToken,
) -> Result<(), DownloadError> {
    let mut remaining = count;
    while remaining > 0 {
        if cancel.is_canceled() {
            tracing::warn!(remaining, "download canceled");
            return Err(DownloadError::Canceled);
        }
        match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
            Ok((index, Ok(()))) => {
                remaining -= 1;
                tracing::debug!(chunk = index, remaining, "chunk complete");
            }
            Ok((index, Err(e))) => {
                tracing::warn!(chunk = index, error = %e, "chunk failed, aborting download");
                return Err(e);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Err(DownloadError::WorkerPanicked),
        }
    }
    Ok(())
}
