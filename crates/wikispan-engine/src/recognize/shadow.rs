//! Shadow buffers.
//!
//! A shadow is a byte copy of a region in which non-ASCII bytes and every
//! already-recognized nested construct are overwritten. Structural scans
//! then only ever see the region's own markup, and offsets into the shadow
//! are offsets into the text.

use std::ops::Range;

/// Byte used to hide recognized constructs.
pub const MASK: u8 = b'_';

/// Byte used to hide comments. Whitespace keeps headings and list markers
/// that carry trailing comments recognizable.
pub const COMMENT_MASK: u8 = b' ';

/// Byte used in the external-link shadow; it terminates bare URLs.
pub const LINK_STOP: u8 = 0;

/// ASCII copy of `text` with every non-ASCII byte masked.
pub fn ascii(text: &str) -> Vec<u8> {
    text.bytes()
        .map(|b| if b.is_ascii() { b } else { MASK })
        .collect()
}

/// Overwrites `range` with `byte`, clamped to the shadow length.
pub fn mask(shadow: &mut [u8], range: Range<usize>, byte: u8) {
    let end = range.end.min(shadow.len());
    if range.start < end {
        shadow[range.start..end].fill(byte);
    }
}

/// Lossless view of an ASCII shadow as `&str`.
///
/// Shadows only ever contain ASCII, so this never allocates in practice.
pub fn as_str(shadow: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(shadow)
}

/// Splits a shadow into lines, returning local ranges that exclude `\n`.
pub fn line_ranges(shadow: &[u8]) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in shadow.iter().enumerate() {
        if b == b'\n' {
            lines.push(start..i);
            start = i + 1;
        }
    }
    lines.push(start..shadow.len());
    lines
}

/// Finds `needle` in `haystack` starting at `from`.
pub fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}
