//! Response head collected from curl's header callback.

/// Status line and header fields of the final response.
///
/// curl reports the headers of every hop (redirects, `100 Continue`); a new
/// status line resets the collected fields so only the last response remains.
#[derive(Debug, Default, Clone)]
pub struct ResponseHead {
    status: Option<u32>,
    fields: Vec<(String, String)>,
}

impl ResponseHead {
    /// Feeds one raw header line as passed to curl's header function.
    pub fn push_line(&mut self, data: &[u8]) {
        let line = String::from_utf8_lossy(data);
        let line = line.trim_end();
        if line.starts_with("HTTP/") {
            self.fields.clear();
            self.status = line
                .split_whitespace()
                .nth(1)
                .and_then(|code| code.parse().ok());
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            self.fields
                .push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    pub fn status(&self) -> Option<u32> {
        self.status
    }

    /// Last value of header `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.get("content-length").and_then(|v| v.parse().ok())
    }

    pub fn content_range(&self) -> Option<&str> {
        self.get("content-range")
    }

    pub fn content_disposition(&self) -> Option<&str> {
        self.get("content-disposition")
    }
}

/// Total size from a Content-Range value: `bytes A-B/TOTAL` or `bytes */TOTAL`.
/// Returns `None` for anything else, including an unknown total (`*`).
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let rest = value.trim().strip_prefix("bytes")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (range, total) = rest.trim().split_once('/')?;
    let range = range.trim();
    if range != "*" {
        let (a, b) = range.split_once('-')?;
        let start: u64 = a.trim().parse().ok()?;
        let end: u64 = b.trim().parse().ok()?;
        if start > end {
            return None;
        }
    }
    total.trim().parse().ok()
}
