//! Convenience entry points that assemble a `Download` and run it.

use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::downloader::Download;
use crate::error::DownloadError;
use crate::http::TransportOptions;

/// Shared transport settings and cancellation scope for one or more downloads.
#[derive(Debug, Clone, Default)]
pub struct Chunkdl {
    pub transport: TransportOptions,
    cancel: CancelToken,
}

impl Chunkdl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client whose downloads stop when `cancel` is canceled.
    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self {
            transport: TransportOptions::default(),
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Downloads `url` to the file `dest` (directory part and filename).
    pub fn download(&self, url: &str, dest: impl AsRef<Path>) -> Result<(), DownloadError> {
        let dest = dest.as_ref();
        let mut dl = self.session(url);
        dl.dir = dest.parent().map(Path::to_path_buf).unwrap_or_default();
        dl.dest = dest
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.run(&mut dl)
    }

    /// New session for `url` bound to this client's transport and cancel token.
    pub fn session(&self, url: &str) -> Download {
        let mut dl = Download::new(url).with_cancel(self.cancel.clone());
        dl.transport = self.transport.clone();
        dl
    }

    /// Runs `init()` then `start()` on a prepared session.
    pub fn run(&self, dl: &mut Download) -> Result<(), DownloadError> {
        dl.init()?;
        dl.start()
    }
}

/// Downloads `url` into `dir`. `dest` of `None` derives the filename from the
/// response or URL; `chunk_size` of 0 uses the default policy.
pub fn fetch(
    url: &str,
    dir: impl Into<PathBuf>,
    dest: Option<&str>,
    chunk_size: u64,
) -> Result<(), DownloadError> {
    let client = Chunkdl::new();
    let mut dl = client.session(url);
    dl.dir = dir.into();
    dl.dest = dest.map(str::to_string);
    dl.chunk_size = (chunk_size > 0).then_some(chunk_size);
    client.run(&mut dl)
}
