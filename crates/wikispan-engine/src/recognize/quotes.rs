//! Bold and italic spans from apostrophe runs, one line at a time.
//!
//! Runs are normalised first: four apostrophes are one literal apostrophe
//! plus a bold marker, more than five are literal apostrophes plus a
//! bold-italic marker. When both bold and italic counts are odd, one bold
//! marker is reinterpreted as an apostrophe followed by an italic marker.

use std::ops::Range;

use crate::registry::NodeKind;

/// A bold or italic span local to its line, with marker widths.
///
/// `open` is zero when the span was reopened after a shared closing
/// marker; `close` is zero when the line ended first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundQuote {
    pub kind: NodeKind,
    pub span: Range<usize>,
    pub open: u8,
    pub close: u8,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    len: usize,
}

impl Run {
    fn end(&self) -> usize {
        self.start + self.len
    }
}

fn runs(line: &[u8]) -> Vec<Run> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < line.len() {
        if line[i] != b'\'' {
            i += 1;
            continue;
        }
        let start = i;
        while i < line.len() && line[i] == b'\'' {
            i += 1;
        }
        let len = i - start;
        match len {
            1 => {}
            4 => out.push(Run { start: start + 1, len: 3 }),
            n if n > 5 => out.push(Run { start: start + n - 5, len: 5 }),
            n => out.push(Run { start, len: n }),
        }
    }
    out
}

/// Rewrites one bold run as an apostrophe plus an italic marker when both
/// counts are odd. Prefers a run after a single-letter word, then one after
/// a longer word, then one after a space.
fn balance(line: &[u8], runs: &mut [Run]) {
    let italics = runs.iter().filter(|r| r.len == 2 || r.len == 5).count();
    let bolds = runs.iter().filter(|r| r.len == 3 || r.len == 5).count();
    if italics % 2 == 0 || bolds % 2 == 0 {
        return;
    }

    let mut single_letter = None;
    let mut multi_letter = None;
    let mut space = None;
    let mut prev_end = 0;
    for (k, run) in runs.iter().enumerate() {
        let segment = &line[prev_end..run.start];
        prev_end = run.end();
        if run.len != 3 {
            continue;
        }
        let x1 = segment.last();
        let x2 = if segment.len() >= 2 {
            segment.get(segment.len() - 2)
        } else {
            segment.first()
        };
        if x1 == Some(&b' ') {
            space.get_or_insert(k);
        } else if x2 == Some(&b' ') {
            single_letter = Some(k);
            break;
        } else {
            multi_letter.get_or_insert(k);
        }
    }

    if let Some(k) = single_letter.or(multi_letter).or(space) {
        runs[k].start += 1;
        runs[k].len = 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Plain,
    Bold,
    Italic,
    /// Bold opened, then italic.
    BoldItalic,
    /// Italic opened, then bold.
    ItalicBold,
    /// A five-apostrophe run whose nesting is not known yet.
    Both,
}

#[derive(Default)]
struct Spans {
    found: Vec<FoundQuote>,
    bold: (usize, u8),
    italic: (usize, u8),
    both: usize,
}

impl Spans {
    fn emit(&mut self, kind: NodeKind, start: usize, end: usize, open: u8, close: u8) {
        if start < end {
            self.found.push(FoundQuote {
                kind,
                span: start..end,
                open,
                close,
            });
        }
    }

    fn close_bold(&mut self, end: usize, close: u8) {
        let (start, open) = self.bold;
        self.emit(NodeKind::Bold, start, end, open, close);
    }

    fn close_italic(&mut self, end: usize, close: u8) {
        let (start, open) = self.italic;
        self.emit(NodeKind::Italic, start, end, open, close);
    }
}

/// Finds bold and italic spans in one line (no newline).
pub fn find(line: &[u8]) -> Vec<FoundQuote> {
    let mut runs = runs(line);
    balance(line, &mut runs);

    let mut spans = Spans::default();
    let mut state = State::Plain;
    for run in runs {
        let (start, end) = (run.start, run.end());
        state = match (run.len, state) {
            (2, State::Italic) => {
                spans.close_italic(end, 2);
                State::Plain
            }
            (2, State::BoldItalic) => {
                spans.close_italic(end, 2);
                State::Bold
            }
            (2, State::ItalicBold) => {
                spans.close_bold(end, 2);
                spans.close_italic(end, 2);
                spans.bold = (end, 0);
                State::Bold
            }
            (2, State::Both) => {
                spans.emit(NodeKind::Italic, spans.both + 3, end, 2, 2);
                spans.bold = (spans.both, 3);
                State::Bold
            }
            (2, State::Bold) => {
                spans.italic = (start, 2);
                State::BoldItalic
            }
            (2, _) => {
                spans.italic = (start, 2);
                State::Italic
            }
            (3, State::Bold) => {
                spans.close_bold(end, 3);
                State::Plain
            }
            (3, State::BoldItalic) => {
                spans.close_italic(end, 3);
                spans.close_bold(end, 3);
                spans.italic = (end, 0);
                State::Italic
            }
            (3, State::ItalicBold) => {
                spans.close_bold(end, 3);
                State::Italic
            }
            (3, State::Both) => {
                spans.emit(NodeKind::Bold, spans.both + 2, end, 3, 3);
                spans.italic = (spans.both, 2);
                State::Italic
            }
            (3, State::Italic) => {
                spans.bold = (start, 3);
                State::ItalicBold
            }
            (3, _) => {
                spans.bold = (start, 3);
                State::Bold
            }
            (_, State::Bold) => {
                spans.close_bold(start + 3, 3);
                spans.italic = (start + 3, 2);
                State::Italic
            }
            (_, State::Italic) => {
                spans.close_italic(start + 2, 2);
                spans.bold = (start + 2, 3);
                State::Bold
            }
            (_, State::BoldItalic) => {
                spans.close_italic(start + 2, 2);
                spans.close_bold(end, 3);
                State::Plain
            }
            (_, State::ItalicBold) => {
                spans.close_bold(start + 3, 3);
                spans.close_italic(end, 2);
                State::Plain
            }
            (_, State::Both) => {
                let both = spans.both;
                spans.emit(NodeKind::Italic, both, end, 2, 2);
                spans.emit(NodeKind::Bold, both + 2, end - 2, 3, 3);
                State::Plain
            }
            (_, State::Plain) => {
                spans.both = start;
                State::Both
            }
        };
    }

    let eol = line.len();
    match state {
        State::Plain => {}
        State::Bold => spans.close_bold(eol, 0),
        State::Italic => spans.close_italic(eol, 0),
        State::BoldItalic | State::ItalicBold => {
            spans.close_italic(eol, 0);
            spans.close_bold(eol, 0);
        }
        State::Both => {
            let both = spans.both;
            spans.emit(NodeKind::Italic, both, eol, 2, 0);
            spans.emit(NodeKind::Bold, both + 2, eol, 3, 0);
        }
    }
    spans.found
}

/// Like [`find`], but the bytes of `hidden` (comments) are left out, so
/// apostrophes on both sides of a comment form one run. Spans are mapped
/// back to `line`.
pub fn find_around(line: &[u8], hidden: &[Range<usize>]) -> Vec<FoundQuote> {
    if hidden.is_empty() {
        return find(line);
    }
    let kept: Vec<usize> = (0..line.len())
        .filter(|i| !hidden.iter().any(|h| h.contains(i)))
        .collect();
    let compact: Vec<u8> = kept.iter().map(|&i| line[i]).collect();
    find(&compact)
        .into_iter()
        .map(|q| FoundQuote {
            span: kept[q.span.start]..kept[q.span.end - 1] + 1,
            ..q
        })
        .collect()
}
