//! One-byte range probe that doubles as the whole-file download.
//!
//! Issues `GET` with `Range: bytes=0-0`. A server that honors the range answers
//! `206` with a single byte and a Content-Range carrying the total size. A
//! server that ignores it streams the full body, which lands in the destination
//! file right away, so no second request is needed.

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cancel::CancelToken;
use crate::error::DownloadError;
use crate::http::{self, parse_content_range_total, RequestSpec, ResponseHead};
use crate::storage::{OffsetWriter, StorageWriterBuilder};

/// What the probe learned about the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Server honored the one-byte range; chunks still have to be fetched.
    RangeSupported { total_size: u64 },
    /// Server sent the whole body; it is already on disk.
    FullyDownloaded { bytes: u64 },
}

#[derive(Debug, Clone)]
pub struct Probe {
    pub outcome: ProbeOutcome,
    /// Raw Content-Disposition of the final response, if any.
    pub content_disposition: Option<String>,
    /// Destination the probe created.
    pub path: PathBuf,
}

/// Runs the probe.
///
/// `resolve_path` maps the response's Content-Disposition (if any) to the
/// destination path; it is called once the response head is complete.
/// Bytes of a full-body response are added to `counter` as they arrive; the
/// single byte of a honored range is not counted, since chunk 0 fetches it again.
pub fn probe<F>(
    request: &RequestSpec,
    counter: &AtomicU64,
    cancel: &CancelToken,
    resolve_path: F,
) -> Result<Probe, DownloadError>
where
    F: Fn(Option<&str>) -> PathBuf,
{
    if cancel.is_canceled() {
        return Err(DownloadError::Canceled);
    }

    let mut easy = curl::easy::Easy::new();
    request.configure(&mut easy)?;
    easy.range("0-0")?;

    let head = RefCell::new(ResponseHead::default());
    let sink: RefCell<Option<(PathBuf, OffsetWriter)>> = RefCell::new(None);
    let failure: RefCell<Option<DownloadError>> = RefCell::new(None);
    let received = Cell::new(0u64);
    let partial = Cell::new(false);

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            head.borrow_mut().push_line(data);
            true
        })?;
        transfer.write_function(|data| {
            if sink.borrow().is_none() {
                let head = head.borrow();
                let status = head.status().unwrap_or(0);
                if status >= 300 {
                    failure.replace(Some(DownloadError::RequestFailed(status)));
                    return Ok(0);
                }
                partial.set(status == 206);
                let path = resolve_path(head.content_disposition());
                match create_destination(&path) {
                    Ok(writer) => {
                        sink.replace(Some((path, writer)));
                    }
                    Err(e) => {
                        failure.replace(Some(DownloadError::Write(e)));
                        return Ok(0);
                    }
                }
            }

            let mut guard = sink.borrow_mut();
            let Some((_, writer)) = guard.as_mut() else {
                return Ok(0);
            };
            if let Err(e) = writer.write_all(data) {
                failure.replace(Some(DownloadError::Write(e)));
                return Ok(0);
            }
            let n = data.len() as u64;
            received.set(received.get() + n);
            if !partial.get() {
                counter.fetch_add(n, Ordering::Relaxed);
            }
            Ok(data.len())
        })?;
        transfer.progress_function(|_, _, _, _| !cancel.is_canceled())?;

        if let Err(e) = transfer.perform() {
            return Err(http::transfer_error(e, failure.take(), cancel));
        }
    }

    let head = head.into_inner();
    let status = head.status().unwrap_or(0);
    tracing::debug!(
        status,
        content_range = head.content_range(),
        received = received.get(),
        "probe response"
    );
    if status >= 300 {
        return Err(DownloadError::RequestFailed(status));
    }

    let content_disposition = head.content_disposition().map(str::to_string);
    let path = match sink.into_inner() {
        Some((path, _writer)) => path,
        None => {
            // Empty body: the destination still has to exist.
            let path = resolve_path(content_disposition.as_deref());
            create_destination(&path).map_err(DownloadError::Write)?;
            path
        }
    };

    let received = received.get();
    let partial = status == 206;
    let outcome = classify(&head, partial, received)?;
    if partial {
        if let ProbeOutcome::FullyDownloaded { bytes } = outcome {
            counter.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    Ok(Probe {
        outcome,
        content_disposition,
        path,
    })
}

/// Decides the outcome from the final response head and body length.
fn classify(head: &ResponseHead, partial: bool, received: u64) -> Result<ProbeOutcome, DownloadError> {
    let fully = ProbeOutcome::FullyDownloaded { bytes: received };
    let Some(content_range) = head.content_range() else {
        return Ok(fully);
    };
    let total = parse_content_range_total(content_range)
        .ok_or_else(|| DownloadError::InvalidRangeHeader(content_range.to_string()))?;

    if received == total || !partial {
        Ok(fully)
    } else if received == 1 {
        Ok(ProbeOutcome::RangeSupported { total_size: total })
    } else {
        Err(DownloadError::RangeLengthMismatch {
            range: "bytes=0-0".to_string(),
            expected: 1,
            received: Some(received),
        })
    }
}

fn create_destination(path: &Path) -> io::Result<OffsetWriter> {
    let storage = StorageWriterBuilder::create(path)?.build();
    Ok(OffsetWriter::new(storage, 0))
}
