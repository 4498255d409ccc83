//! Fetch worker: one range GET written through the chunk's offset writer.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cancel::CancelToken;
use crate::error::DownloadError;
use crate::http::{self, ResponseHead};
use crate::segmenter::Chunk;
use crate::storage::OffsetWriter;

/// Downloads `chunk` on an already configured handle into `writer`.
///
/// The response must announce a Content-Length equal to the chunk length; it is
/// checked before the first body byte is written. Every written byte is added
/// to `counter`. Returns the number of bytes copied (always `chunk.len()`).
pub fn fetch_chunk(
    easy: &mut curl::easy::Easy,
    chunk: &Chunk,
    writer: &mut OffsetWriter,
    counter: &AtomicU64,
    cancel: &CancelToken,
) -> Result<u64, DownloadError> {
    if cancel.is_canceled() {
        return Err(DownloadError::Canceled);
    }
    easy.range(&chunk.curl_range())?;

    let expected = chunk.len();
    let head = RefCell::new(ResponseHead::default());
    let validated = Cell::new(false);
    let failure: RefCell<Option<DownloadError>> = RefCell::new(None);
    let copied = Cell::new(0u64);

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            head.borrow_mut().push_line(data);
            true
        })?;
        transfer.write_function(|data| {
            if !validated.get() {
                if let Err(e) = validate(&head.borrow(), chunk) {
                    failure.replace(Some(e));
                    return Ok(0);
                }
                validated.set(true);
            }
            let done = copied.get();
            let n = data.len() as u64;
            if n > expected - done {
                failure.replace(Some(DownloadError::RangeLengthMismatch {
                    range: chunk.range_header_value(),
                    expected,
                    received: Some(done + n),
                }));
                return Ok(0);
            }
            if let Err(e) = writer.write_all(data) {
                failure.replace(Some(DownloadError::Write(e)));
                return Ok(0);
            }
            copied.set(done + n);
            counter.fetch_add(n, Ordering::Relaxed);
            Ok(data.len())
        })?;
        transfer.progress_function(|_, _, _, _| !cancel.is_canceled())?;

        if let Err(e) = transfer.perform() {
            if e.is_partial_file() && failure.borrow().is_none() {
                return Err(DownloadError::Read {
                    expected,
                    received: copied.get(),
                });
            }
            return Err(http::transfer_error(e, failure.take(), cancel));
        }
    }

    if !validated.get() {
        validate(&head.borrow(), chunk)?;
    }
    let copied = copied.get();
    if copied != expected {
        return Err(DownloadError::Read {
            expected,
            received: copied,
        });
    }
    Ok(copied)
}

/// Status must be below 300 and Content-Length must match the requested range.
fn validate(head: &ResponseHead, chunk: &Chunk) -> Result<(), DownloadError> {
    let status = head.status().unwrap_or(0);
    if status >= 300 {
        return Err(DownloadError::RequestFailed(status));
    }
    match head.content_length() {
        Some(n) if n == chunk.len() => Ok(()),
        received => Err(DownloadError::RangeLengthMismatch {
            range: chunk.range_header_value(),
            expected: chunk.len(),
            received,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(lines: &[&str]) -> ResponseHead {
        let mut h = ResponseHead::default();
        for l in lines {
            h.push_line(l.as_bytes());
        }
        h
    }

    #[test]
    fn validate_accepts_matching_length() {
        let chunk = Chunk { start: 250, end: 499 };
        let h = head(&["HTTP/1.1 206 Partial Content", "Content-Length: 250"]);
        assert!(validate(&h, &chunk).is_ok());
    }

    #[test]
    fn validate_rejects_full_body() {
        let chunk = Chunk { start: 250, end: 499 };
        let h = head(&["HTTP/1.1 200 OK", "Content-Length: 1000"]);
        match validate(&h, &chunk) {
            Err(DownloadError::RangeLengthMismatch {
                range,
                expected,
                received,
            }) => {
                assert_eq!(range, "bytes=250-499");
                assert_eq!(expected, 250);
                assert_eq!(received, Some(1000));
            }
            other => panic!("expected RangeLengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_missing_length_and_error_status() {
        let chunk = Chunk { start: 0, end: 9 };
        let h = head(&["HTTP/1.1 206 Partial Content", "Transfer-Encoding: chunked"]);
        assert!(matches!(
            validate(&h, &chunk),
            Err(DownloadError::RangeLengthMismatch { received: None, .. })
        ));
        let h = head(&["HTTP/1.1 416 Range Not Satisfiable", "Content-Length: 10"]);
        assert!(matches!(
            validate(&h, &chunk),
            Err(DownloadError::RequestFailed(416))
        ));
    }

    #[test]
    fn canceled_token_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let storage = crate::storage::StorageWriterBuilder::create(&dir.path().join("c.bin"))
            .unwrap()
            .build();
        let mut writer = OffsetWriter::new(storage, 0);
        let counter = AtomicU64::new(0);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut easy = curl::easy::Easy::new();
        let res = fetch_chunk(
            &mut easy,
            &Chunk { start: 0, end: 9 },
            &mut writer,
            &counter,
            &cancel,
        );
        assert!(matches!(res, Err(DownloadError::Canceled)));
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }
}
