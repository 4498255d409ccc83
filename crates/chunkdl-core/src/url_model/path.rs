//! Filename from the URL path.

use super::DEFAULT_FILENAME;

/// Last path segment of `url` when it carries an extension, else `DEFAULT_FILENAME`.
///
/// Query and fragment are ignored; percent-encoding in the segment is kept as-is.
pub fn filename_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            let segment = parsed.path().rsplit('/').next()?.to_string();
            has_extension(&segment).then_some(segment)
        })
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

fn has_extension(segment: &str) -> bool {
    match segment.rfind('.') {
        Some(dot) => dot + 1 < segment.len() && segment != ".." && segment != ".",
        None => false,
    }
}
