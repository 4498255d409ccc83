//! Minimal HTTP/1.1 server with Range GET support for integration tests.
//!
//! Serves a single static body at any path. Answers `Range: bytes=A-B` with
//! 206 Partial Content, or with 200 and the full body when ranges are off.
//! Every response closes the connection.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body
    /// and no Content-Range.
    pub support_ranges: bool,
    /// Answer every request with this status and a short text body.
    pub status: Option<u16>,
    /// Content-Disposition value sent with every successful response.
    pub content_disposition: Option<String>,
    /// The range starting at this offset gets a body one byte short, with a
    /// matching (wrong) Content-Length.
    pub mismatch_at: Option<u64>,
    /// Ranges other than the 0-0 probe send their headers and one byte, then hang.
    pub stall: bool,
    /// Pause before answering a non-probe range, so concurrent requests overlap.
    pub delay: Option<Duration>,
}

impl RangeServerOptions {
    pub fn ranged() -> Self {
        Self {
            support_ranges: true,
            ..Self::default()
        }
    }
}

/// Request counters observed by the server.
#[derive(Debug, Default)]
pub struct ServerStats {
    requests: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    heads: Mutex<Vec<Vec<(String, String)>>>,
}

impl ServerStats {
    /// All requests seen, probe included.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Highest number of non-probe range requests being served at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Header lines of every request seen, in arrival order.
    pub fn request_headers(&self) -> Vec<Vec<(String, String)>> {
        self.heads.lock().unwrap().clone()
    }
}

/// Values of header `name` (case-insensitive) in one request, in send order.
pub fn header_values<'a>(head: &'a [(String, String)], name: &str) -> Vec<&'a str> {
    head.iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
        .collect()
}

pub struct RangeServer {
    base: String,
    pub stats: Arc<ServerStats>,
}

impl RangeServer {
    /// URL for `name` on this server, e.g. "http://127.0.0.1:12345/name".
    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.base, name)
    }
}

/// Starts a range-capable server in a background thread serving `body`.
/// The server runs until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::ranged())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    let stats = Arc::new(ServerStats::default());
    let server_stats = Arc::clone(&stats);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = Arc::clone(&opts);
            let stats = Arc::clone(&server_stats);
            thread::spawn(move || handle(stream, &body, &opts, &stats));
        }
    });
    RangeServer {
        base: format!("http://127.0.0.1:{}/", port),
        stats,
    }
}

fn handle(mut stream: TcpStream, body: &[u8], opts: &RangeServerOptions, stats: &ServerStats) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    stats.heads.lock().unwrap().push(header_lines(&request));
    stats.requests.fetch_add(1, Ordering::SeqCst);
    let (method, range) = parse_request(&request);

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    if let Some(code) = opts.status {
        let text = b"error";
        let response = format!(
            "HTTP/1.1 {} Error\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            code,
            text.len()
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(text);
        return;
    }

    let disposition = opts
        .content_disposition
        .as_ref()
        .map(|v| format!("Content-Disposition: {}\r\n", v))
        .unwrap_or_default();
    let total = body.len() as u64;

    let range = range.filter(|_| opts.support_ranges);
    let Some((start, end_incl)) = range else {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
            total, disposition
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(body);
        return;
    };

    let end_incl = end_incl.min(total.saturating_sub(1));
    if start > end_incl {
        let response = format!(
            "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    let is_probe = start == 0 && end_incl == 0;
    if !is_probe {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = opts.delay {
            thread::sleep(delay);
        }
    }

    let mut slice = &body[start as usize..=end_incl as usize];
    if !is_probe && opts.mismatch_at == Some(start) {
        slice = &slice[..slice.len() - 1];
    }
    let response = format!(
        "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\n{}Connection: close\r\n\r\n",
        slice.len(),
        start,
        end_incl,
        total,
        disposition
    );
    let _ = stream.write_all(response.as_bytes());
    if !is_probe && opts.stall {
        let _ = stream.write_all(&slice[..1]);
        let _ = stream.flush();
        thread::sleep(Duration::from_secs(10));
    } else {
        let _ = stream.write_all(slice);
    }

    if !is_probe {
        stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Reads until the end of the request head.
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8(data).ok()
}

fn header_lines(request: &str) -> Vec<(String, String)> {
    request
        .lines()
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Returns (method, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, range)
}
