use std::ops::Range;

use super::shadow;

pub const OPEN: &[u8; 4] = b"<!--";
pub const CLOSE: &[u8; 3] = b"-->";

/// Finds `<!-- ... -->` comments, returning local ranges.
///
/// An unclosed comment extends to the end of the slice when the rest of the
/// slice is within `max_unclosed_scan` bytes; past that limit the opener is
/// left as literal text.
pub fn find(s: &[u8], max_unclosed_scan: usize) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(start) = shadow::find(s, OPEN, from) {
        match shadow::find(s, CLOSE, start + OPEN.len()) {
            Some(close) => {
                let end = close + CLOSE.len();
                found.push(start..end);
                from = end;
            }
            None if s.len() - start <= max_unclosed_scan => {
                found.push(start..s.len());
                break;
            }
            None => {
                log::warn!(
                    "unclosed comment at byte {start}: {} bytes exceed the scan limit of {max_unclosed_scan}",
                    s.len() - start
                );
                from = start + OPEN.len();
            }
        }
    }
    found
}
