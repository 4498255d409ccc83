//! Range math and chunk planning.
//!
//! Splits a rangeable resource into inclusive byte-range chunks that tile
//! `[0, total_size)` exactly, and computes the default concurrency and chunk
//! size when the caller leaves them unset.

mod policy;
mod range;

pub use policy::{
    concurrency_for, default_chunk_size, default_concurrency, DEFAULT_MIN_CHUNK_SIZE,
    HUGE_CHUNK_THRESHOLD, MAX_DEFAULT_CONCURRENCY, MIN_DEFAULT_CONCURRENCY,
};
pub use range::{plan_chunks, Chunk};
