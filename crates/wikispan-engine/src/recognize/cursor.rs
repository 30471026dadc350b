/// A byte cursor over a shadow or text slice.
///
/// Tracks the absolute position in the buffer through `base` so matches can
/// be reported without a second translation step.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The bytes being scanned.
    pub s: &'a [u8],
    /// Absolute offset of `s[0]`.
    pub base: usize,
    /// Current local index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a [u8], base: usize) -> Self {
        Self { s, base, i: 0 }
    }

    /// Creates a cursor positioned at local index `i`.
    pub fn at(s: &'a [u8], base: usize, i: usize) -> Self {
        Self { s, base, i }
    }

    /// Returns the current absolute byte position.
    pub fn pos(&self) -> usize {
        self.base + self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.s.get(self.i).copied()
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.get(self.i..).is_some_and(|rest| rest.starts_with(pat))
    }

    /// Case-insensitive ASCII prefix check.
    pub fn starts_with_ignore_case(&self, pat: &[u8]) -> bool {
        self.s
            .get(self.i..self.i + pat.len())
            .is_some_and(|rest| rest.eq_ignore_ascii_case(pat))
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Advances while `pred` holds and returns the local range consumed.
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> std::ops::Range<usize> {
        let start = self.i;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.i += 1;
        }
        start..self.i
    }

    /// Skips ASCII whitespace, returning how many bytes were skipped.
    pub fn skip_ws(&mut self) -> usize {
        self.eat_while(|b| b.is_ascii_whitespace()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new(b"<ref>", 10);
        assert_eq!(cur.pos(), 10);
        assert_eq!(cur.bump(), Some(b'<'));
        assert!(cur.starts_with_ignore_case(b"REF"));
        assert_eq!(cur.eat_while(|b| b.is_ascii_alphabetic()), 1..4);
        assert_eq!(cur.pos(), 14);
        assert_eq!(cur.peek(), Some(b'>'));
    }

    #[test]
    fn starts_with_past_end() {
        let cur = Cursor::at(b"ab", 0, 1);
        assert!(!cur.starts_with(b"bc"));
        assert!(!cur.starts_with_ignore_case(b"bc"));
        assert!(cur.starts_with(b"b"));
    }

    #[test]
    fn eof_after_bump_n() {
        let mut cur = Cursor::new(b"  x", 0);
        assert_eq!(cur.skip_ws(), 2);
        cur.bump_n(1);
        assert!(cur.eof());
        assert_eq!(cur.bump(), None);
    }
}
