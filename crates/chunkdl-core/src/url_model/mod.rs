//! Destination filename resolution.
//!
//! The name comes from, in order: the caller's explicit destination, the
//! Content-Disposition header of the probe response (if it parses and is free
//! of path components), then the URL path. The result is joined onto the
//! destination directory.

mod content_disposition;
mod path;
mod sanitize;

pub use content_disposition::{filename_from_header, parse_content_disposition_filename};
pub use path::filename_from_url;
pub use sanitize::sanitize_filename;

use std::path::{Path, PathBuf};

/// Filename used when the URL path has no usable last segment with an extension.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Resolves the destination path for a download.
pub fn resolve_destination(
    dir: &Path,
    dest: Option<&str>,
    url: &str,
    content_disposition: Option<&str>,
) -> PathBuf {
    let name = match dest.filter(|d| !d.is_empty()) {
        Some(d) => d.to_string(),
        None => content_disposition
            .and_then(filename_from_header)
            .unwrap_or_else(|| filename_from_url(url)),
    };
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dest_wins() {
        let p = resolve_destination(
            Path::new("/tmp/dl"),
            Some("mine.iso"),
            "https://example.com/archive.zip",
            Some("attachment; filename=\"report.pdf\""),
        );
        assert_eq!(p, Path::new("/tmp/dl/mine.iso"));
    }

    #[test]
    fn header_name_beats_url() {
        let p = resolve_destination(
            Path::new("out"),
            None,
            "https://example.com/archive.zip",
            Some("attachment; filename=\"real-name.tar.gz\""),
        );
        assert_eq!(p, Path::new("out/real-name.tar.gz"));
    }

    #[test]
    fn unsafe_header_falls_back_to_url() {
        let p = resolve_destination(
            Path::new(""),
            None,
            "https://example.com/archive.zip",
            Some("attachment; filename=\"../../etc/passwd\""),
        );
        assert_eq!(p, Path::new("archive.zip"));
    }

    #[test]
    fn nothing_usable_gives_default() {
        let p = resolve_destination(Path::new("d"), Some(""), "https://example.com/", None);
        assert_eq!(p, Path::new("d").join(DEFAULT_FILENAME));
    }
}
