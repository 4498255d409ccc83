//! Destination file lifecycle.
//!
//! Creates (truncating) the destination, preallocates it to the resource size
//! (fallocate on Unix when available, else set_len), and hands out writers that
//! support concurrent positional writes (pwrite). Each chunk writes through its
//! own `OffsetWriter`, so no cursor is shared between workers.

mod builder;
mod writer;

pub use builder::StorageWriterBuilder;
pub use writer::{OffsetWriter, StorageWriter};
