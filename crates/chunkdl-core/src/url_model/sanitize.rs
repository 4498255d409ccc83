//! Filename cleanup for names taken from response headers.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Replaces NUL and control characters with `_`, trims surrounding whitespace
/// and dots, and limits the result to 255 bytes on a char boundary.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if c == '\0' || c.is_control() { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == '_');

    let mut take = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}
