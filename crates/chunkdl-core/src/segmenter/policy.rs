//! Defaults for concurrency and chunk size when the caller leaves them unset.

/// Lower bound for the default concurrency.
pub const MIN_DEFAULT_CONCURRENCY: usize = 4;
/// Upper bound for the default concurrency.
pub const MAX_DEFAULT_CONCURRENCY: usize = 20;
/// Minimum chunk size used when no explicit minimum is given (2 MiB).
pub const DEFAULT_MIN_CHUNK_SIZE: u64 = 2_097_152;
/// Per-worker share at or above which the chunk size is halved (~100 MB).
pub const HUGE_CHUNK_THRESHOLD: u64 = 102_400_000;

/// Concurrency for a machine reporting `parallelism` threads: `3 * parallelism`
/// clamped to `[4, 20]`.
pub fn concurrency_for(parallelism: usize) -> usize {
    parallelism
        .saturating_mul(3)
        .clamp(MIN_DEFAULT_CONCURRENCY, MAX_DEFAULT_CONCURRENCY)
}

/// Default concurrency from the available parallelism (1 when unknown).
pub fn default_concurrency() -> usize {
    let parallelism = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    concurrency_for(parallelism)
}

/// Default chunk size for a resource of `total_size` bytes.
///
/// `min`/`max` of 0 mean unset. The result never exceeds `total_size / 2`, so a
/// rangeable resource of two or more bytes always gets at least two chunks.
pub fn default_chunk_size(total_size: u64, min: u64, max: u64, concurrency: u64) -> u64 {
    let mut cs = total_size / concurrency.max(1);
    if cs >= HUGE_CHUNK_THRESHOLD {
        cs /= 2;
    }

    let mut min = min;
    if min == 0 {
        min = DEFAULT_MIN_CHUNK_SIZE;
        if min >= total_size {
            min = total_size / 2;
        }
    }
    cs = cs.max(min);

    if max > 0 && cs > max {
        cs = max;
    }
    // A 2 MiB minimum on a 2-4 MiB file would otherwise leave one oversized
    // chunk and a short tail.
    if cs > total_size / 2 {
        cs = total_size / 2;
    }
    cs
}
