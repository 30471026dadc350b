use super::span::Span;

/// A single line of a text slice with its byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRef<'a> {
    /// Byte span of this line (includes the newline if present).
    pub span: Span,
    /// The line text, newline included.
    pub text: &'a str,
}

impl<'a> LineRef<'a> {
    /// The line without its trailing `\n`.
    pub fn content(&self) -> &'a str {
        self.text.strip_suffix('\n').unwrap_or(self.text)
    }

    /// End offset of the line content, before any newline.
    pub fn content_end(&self) -> usize {
        self.span.start + self.content().len()
    }
}

/// Returns an iterator over lines with their byte spans, offset by `base`.
///
/// Newlines are kept so the spans tile the input exactly.
pub fn lines_with_spans(text: &str, base: usize) -> impl Iterator<Item = LineRef<'_>> + '_ {
    let mut offset = base;
    text.split_inclusive('\n').map(move |line| {
        let start = offset;
        offset += line.len();
        LineRef {
            span: Span::new(start, offset),
            text: line,
        }
    })
}
