//! Outbound request construction on top of libcurl.
//!
//! Every request carries the default User-Agent (overridable through
//! `TransportOptions::user_agent`) followed by the caller's headers in order,
//! so a caller `User-Agent` header wins over the default as well.

mod head;

pub use head::{parse_content_range_total, ResponseHead};

use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::DownloadError;

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("chunkdl/", env!("CARGO_PKG_VERSION"));

/// One extra request header, applied after the default User-Agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parses a `Key: Value` line (as given on the command line).
    pub fn parse(line: &str) -> Option<Self> {
        let (key, value) = line.split_once(':')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key, value.trim()))
    }
}

/// curl handle configuration shared by the probe and every chunk worker.
///
/// curl picks up `http_proxy` / `https_proxy` / `no_proxy` from the
/// environment when `proxy` is `None`.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// TCP connect plus TLS handshake budget.
    pub connect_timeout: Duration,
    /// Abort if throughput stays below this many bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Hard wall-clock limit per request; `None` disables it.
    pub timeout: Option<Duration>,
    pub max_redirections: u32,
    pub tcp_keepalive: bool,
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            timeout: None,
            max_redirections: 10,
            tcp_keepalive: true,
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Everything needed to issue a GET against the resource.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub url: String,
    pub headers: Vec<Header>,
    pub transport: TransportOptions,
}

impl RequestSpec {
    /// Applies URL, transport options and headers to `easy`. Progress callbacks are
    /// enabled so transfers can observe cancellation. The handle can then be reused
    /// for several requests, keeping its connection cache.
    pub fn configure(&self, easy: &mut curl::easy::Easy) -> Result<(), curl::Error> {
        let t = &self.transport;
        easy.url(&self.url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(t.max_redirections)?;
        easy.connect_timeout(t.connect_timeout)?;
        easy.low_speed_limit(t.low_speed_limit)?;
        easy.low_speed_time(t.low_speed_time)?;
        if let Some(timeout) = t.timeout {
            easy.timeout(timeout)?;
        }
        easy.tcp_keepalive(t.tcp_keepalive)?;
        if let Some(proxy) = &t.proxy {
            easy.proxy(proxy)?;
        }
        easy.useragent(&t.user_agent)?;

        let lines = self.header_lines();
        if !lines.is_empty() {
            let mut list = curl::easy::List::new();
            for line in &lines {
                list.append(line)?;
            }
            easy.http_headers(list)?;
        }
        easy.progress(true)?;
        Ok(())
    }

    /// Caller headers as `Key: Value` lines, in order.
    ///
    /// A caller `Range` is dropped: curl would send it instead of the range the
    /// probe and chunk requests set themselves.
    fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .filter(|h| {
                let is_range = h.key.trim().eq_ignore_ascii_case("range");
                if is_range {
                    tracing::warn!(value = %h.value, "ignoring caller Range header");
                }
                !is_range
            })
            .map(|h| format!("{}: {}", h.key.trim(), h.value.trim()))
            .collect()
    }
}

/// Maps a failed `perform()` to the session error.
///
/// A failure recorded by one of our callbacks takes precedence over curl's own
/// "aborted by callback" / "write error"; an abort while the token is canceled
/// is a cancellation.
pub(crate) fn transfer_error(
    err: curl::Error,
    recorded: Option<DownloadError>,
    cancel: &CancelToken,
) -> DownloadError {
    if let Some(e) = recorded {
        return e;
    }
    if cancel.is_canceled() && err.is_aborted_by_callback() {
        return DownloadError::Canceled;
    }
    DownloadError::Transport(err)
}
