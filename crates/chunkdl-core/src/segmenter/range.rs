//! Chunk type and range planning.

/// A single chunk: inclusive byte range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: u64,
    pub end: u64,
}

impl Chunk {
    /// Length in bytes (`end - start + 1`).
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }

    /// Range in curl's form (`start-end`, no unit).
    pub(crate) fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Plans chunks of `chunk_size` bytes covering `[0, total_size)`.
///
/// Uses ceiling division; only the last chunk may be shorter. A chunk size at
/// or above the total yields a single chunk. Returns an empty vec if either
/// argument is 0.
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> Vec<Chunk> {
    if total_size == 0 || chunk_size == 0 {
        return Vec::new();
    }

    let count = total_size.div_ceil(chunk_size);
    (0..count)
        .map(|i| {
            let start = i * chunk_size;
            let end = start.saturating_add(chunk_size).min(total_size) - 1;
            Chunk { start, end }
        })
        .collect()
}
