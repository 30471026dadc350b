//! The text buffer every node reads from and writes to.

pub mod lines;
pub mod span;

use std::borrow::Cow;
use std::ops::Range;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

pub use span::Span;

/// Mutable wikitext shared by a document and all of its nodes.
///
/// Edits go through [`Buffer::replace`] as xi-rope deltas; offsets are
/// UTF-8 byte offsets.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    rope: Rope,
}

impl Buffer {
    pub fn new(text: &str) -> Self {
        Buffer {
            rope: Rope::from(text),
        }
    }

    pub fn len(&self) -> usize {
        self.rope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len() == 0
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text of `span`, clamped to the buffer.
    pub fn slice(&self, span: Span) -> Cow<'_, str> {
        let len = self.rope.len();
        let start = span.start.min(len);
        let end = span.end.min(len).max(start);
        self.rope.slice_to_cow(start..end)
    }

    /// True when `at` is the buffer start or follows a newline.
    pub fn is_line_start(&self, at: usize) -> bool {
        at == 0 || self.slice(Span::new(at - 1, at)) == "\n"
    }

    /// Replaces `range` with `text`, returning the applied delta.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Delta<RopeInfo> {
        let mut builder = Builder::new(self.rope.len());
        builder.replace(range, Rope::from(text));
        let delta = builder.build();
        self.rope = delta.apply(&self.rope);
        delta
    }
}
