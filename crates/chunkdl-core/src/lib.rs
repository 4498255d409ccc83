pub mod config;
pub mod logging;

pub mod cancel;
pub mod client;
pub mod downloader;
pub mod error;
pub mod http;
pub mod probe;
pub mod progress;
pub mod segmenter;
pub mod storage;
pub mod url_model;

pub use cancel::CancelToken;
pub use client::{fetch, Chunkdl};
pub use downloader::{Download, ResourceInfo, SessionState};
pub use error::DownloadError;
pub use http::{Header, TransportOptions, DEFAULT_USER_AGENT};
pub use segmenter::Chunk;
