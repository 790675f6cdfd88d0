//! UTF-16 index helpers and plain-text normalization.
//!
//! Browser selection APIs report offsets in UTF-16 code units while Rust
//! strings are indexed by UTF-8 bytes. Every offset stored on a field is a
//! UTF-16 offset, so all slicing of the flattened text goes through here.

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Converts a UTF-8 byte index to its corresponding UTF-16 code unit index.
///
/// `byte_idx` must lie on a char boundary; indices past the end clamp to the
/// full UTF-16 length.
pub fn byte_to_utf16_idx(s: &str, byte_idx: usize) -> usize {
    let byte_idx = byte_idx.min(s.len());
    s[..byte_idx].chars().map(char::len_utf16).sum()
}

/// Converts a UTF-16 code unit index to its corresponding UTF-8 byte index.
///
/// An index that falls inside a surrogate pair resolves to the start of that
/// character. Indices past the end resolve to `s.len()`.
pub fn utf16_to_byte_idx(s: &str, utf16_idx: usize) -> usize {
    let mut units = 0;
    for (byte_idx, ch) in s.char_indices() {
        if units >= utf16_idx {
            return byte_idx;
        }
        units += ch.len_utf16();
        if units > utf16_idx {
            return byte_idx;
        }
    }
    s.len()
}

/// Returns the substring covering UTF-16 units `[start, end)`, or `None` when
/// the range is reversed or runs past the end of `s`.
pub fn slice_utf16(s: &str, start: usize, end: usize) -> Option<&str> {
    if start > end || end > utf16_len(s) {
        return None;
    }
    let from = utf16_to_byte_idx(s, start);
    let to = utf16_to_byte_idx(s, end);
    Some(&s[from..to])
}

/// Counts of leading and trailing whitespace in UTF-16 units.
///
/// For an all-whitespace string the leading count covers everything and the
/// trailing count is zero, so `leading + trailing` never exceeds the length.
pub fn whitespace_margins(s: &str) -> (usize, usize) {
    let trimmed_start = s.trim_start();
    let leading = utf16_len(&s[..s.len() - trimmed_start.len()]);
    if trimmed_start.is_empty() {
        return (leading, 0);
    }
    let trimmed = trimmed_start.trim_end();
    let trailing = utf16_len(&trimmed_start[trimmed.len()..]);
    (leading, trailing)
}

/// Collapses every whitespace run into a single space and trims both ends.
///
/// This is the display form of a document's text. It is not an offset space.
pub fn extract_plain_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
