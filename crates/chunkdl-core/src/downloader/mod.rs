//! Download session: probe, plan, preallocate, then fetch chunks concurrently.
//!
//! `init()` probes the resource. A server without range support sends the whole
//! body during the probe and the session is complete at that point. Otherwise
//! the chunk plan is computed from the caller's settings or the default policy,
//! and `start()` preallocates the destination and runs the bounded worker pool
//! until the first error, cancellation, or completion.

mod chunk;
mod pool;

pub use chunk::fetch_chunk;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use crate::cancel::CancelToken;
use crate::error::DownloadError;
use crate::http::{Header, RequestSpec, TransportOptions};
use crate::probe::{self, ProbeOutcome};
use crate::progress::ProgressHandle;
use crate::segmenter::{default_chunk_size, default_concurrency, plan_chunks, Chunk};
use crate::storage::StorageWriterBuilder;
use crate::url_model::resolve_destination;

use pool::PoolJob;

/// Size and range capability of the remote resource, fixed once probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Total size for a rangeable resource; bytes received by the probe otherwise.
    pub total_size: u64,
    pub rangeable: bool,
}

/// Lifecycle of a `Download`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// Rangeable resource probed and chunks planned; `start()` fetches them.
    Planned,
    Running,
    Completed,
    Failed,
    Canceled,
}

/// One resource to fetch. Fill in the public fields, then call `init()` and `start()`.
pub struct Download {
    pub url: String,
    /// Directory the file is written to.
    pub dir: PathBuf,
    /// Explicit filename; otherwise taken from Content-Disposition or the URL.
    pub dest: Option<String>,
    pub concurrency: Option<usize>,
    pub chunk_size: Option<u64>,
    /// Lower bound for the default chunk size (ignored when `chunk_size` is set).
    pub min_chunk_size: Option<u64>,
    /// Upper bound for the default chunk size (ignored when `chunk_size` is set).
    pub max_chunk_size: Option<u64>,
    /// Extra request headers, applied in order after the default User-Agent.
    pub headers: Vec<Header>,
    pub transport: TransportOptions,
    cancel: CancelToken,
    progress: ProgressHandle,
    path: Option<PathBuf>,
    content_disposition: Option<String>,
    info: Option<ResourceInfo>,
    chunks: Vec<Chunk>,
    state: SessionState,
}

impl Download {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dir: PathBuf::new(),
            dest: None,
            concurrency: None,
            chunk_size: None,
            min_chunk_size: None,
            max_chunk_size: None,
            headers: Vec::new(),
            transport: TransportOptions::default(),
            cancel: CancelToken::new(),
            progress: ProgressHandle::new(),
            path: None,
            content_disposition: None,
            info: None,
            chunks: Vec::new(),
            state: SessionState::Uninitialized,
        }
    }

    /// Binds the session (probe, every chunk request and the wait in `start()`) to `cancel`.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Probes the resource and plans chunks.
    ///
    /// For a server without range support this already downloads the whole file;
    /// `start()` then only checks for cancellation.
    pub fn init(&mut self) -> Result<(), DownloadError> {
        if self.state != SessionState::Uninitialized {
            return Err(DownloadError::InvalidState("init called twice"));
        }

        self.progress.restart();
        let request = self.request_spec();
        let probed = probe::probe(&request, &self.progress.bytes, &self.cancel, |cd| {
            resolve_destination(&self.dir, self.dest.as_deref(), &self.url, cd)
        });
        let probed = match probed {
            Ok(p) => p,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };
        self.path = Some(probed.path);
        self.content_disposition = probed.content_disposition;

        match probed.outcome {
            ProbeOutcome::FullyDownloaded { bytes } => {
                self.set_info(bytes, false);
                self.state = SessionState::Completed;
                tracing::info!(
                    url = %self.url,
                    bytes,
                    path = %self.path().display(),
                    "server ignored range request; body downloaded by probe"
                );
            }
            ProbeOutcome::RangeSupported { total_size } => {
                let concurrency = self
                    .concurrency
                    .filter(|c| *c > 0)
                    .unwrap_or_else(default_concurrency);
                let chunk_size = self
                    .chunk_size
                    .filter(|c| *c > 0)
                    .unwrap_or_else(|| {
                        default_chunk_size(
                            total_size,
                            self.min_chunk_size.unwrap_or(0),
                            self.max_chunk_size.unwrap_or(0),
                            concurrency as u64,
                        )
                    })
                    .max(1);
                self.concurrency = Some(concurrency);
                self.chunk_size = Some(chunk_size);
                self.chunks = plan_chunks(total_size, chunk_size);
                self.set_info(total_size, true);
                self.state = SessionState::Planned;
                tracing::info!(
                    url = %self.url,
                    total_size,
                    chunk_size,
                    chunks = self.chunks.len(),
                    concurrency,
                    "planned range download"
                );
            }
        }
        Ok(())
    }

    /// Fetches the planned chunks into the preallocated destination.
    ///
    /// Returns the first worker error or `Canceled`, whichever is observed first.
    /// On failure the partially written file is left in place.
    pub fn start(&mut self) -> Result<(), DownloadError> {
        match self.state {
            SessionState::Planned => {}
            SessionState::Completed if !self.is_rangeable() => {
                return if self.cancel.is_canceled() {
                    Err(DownloadError::Canceled)
                } else {
                    Ok(())
                };
            }
            SessionState::Uninitialized => {
                return Err(DownloadError::InvalidState("start called before init"))
            }
            _ => return Err(DownloadError::InvalidState("download already started")),
        }

        self.state = SessionState::Running;
        let result = self.run_chunks();
        match &result {
            Ok(()) => self.state = SessionState::Completed,
            Err(e) => self.fail(e),
        }
        result
    }

    fn run_chunks(&self) -> Result<(), DownloadError> {
        if self.cancel.is_canceled() {
            return Err(DownloadError::Canceled);
        }
        let path = self.path();
        let mut builder = StorageWriterBuilder::create(&path).map_err(DownloadError::Write)?;
        builder
            .preallocate(self.total_size())
            .map_err(DownloadError::Write)?;

        let storage = builder.build();
        let job = Arc::new(PoolJob {
            request: self.request_spec(),
            storage: storage.clone(),
            counter: Arc::clone(&self.progress.bytes),
        });
        let started = Instant::now();
        pool::run_pool(job, &self.chunks, self.concurrency.unwrap_or(1), &self.cancel)?;
        storage.sync().map_err(DownloadError::Write)?;

        tracing::info!(
            bytes = self.size(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            path = %path.display(),
            "range download complete"
        );
        Ok(())
    }

    fn request_spec(&self) -> RequestSpec {
        RequestSpec {
            url: self.url.clone(),
            headers: self.headers.clone(),
            transport: self.transport.clone(),
        }
    }

    fn set_info(&mut self, total_size: u64, rangeable: bool) {
        self.info = Some(ResourceInfo {
            total_size,
            rangeable,
        });
        self.progress.total.store(total_size, Ordering::Relaxed);
    }

    fn fail(&mut self, e: &DownloadError) {
        self.state = if e.is_canceled() {
            SessionState::Canceled
        } else {
            SessionState::Failed
        };
    }

    fn is_rangeable(&self) -> bool {
        self.info.is_some_and(|i| i.rangeable)
    }

    /// Destination path. Fixed by `init()`; before that, the name the URL alone gives.
    pub fn path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            resolve_destination(
                &self.dir,
                self.dest.as_deref(),
                &self.url,
                self.content_disposition.as_deref(),
            )
        })
    }

    /// Bytes received so far (probe body plus every chunk body).
    pub fn size(&self) -> u64 {
        self.progress.bytes_done()
    }

    /// Expected size; 0 until `init()` succeeded.
    pub fn total_size(&self) -> u64 {
        self.info.map(|i| i.total_size).unwrap_or(0)
    }

    pub fn info(&self) -> Option<ResourceInfo> {
        self.info
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Handle for reading progress from another thread while `start()` runs.
    pub fn progress(&self) -> ProgressHandle {
        self.progress.clone()
    }
}
