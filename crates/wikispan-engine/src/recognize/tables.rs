//! Table discovery and row/cell structure.
//!
//! Both operate on shadows, so markup inside nested constructs never starts
//! a row or splits a cell. A table spans from the start of its `{|` line to
//! the end of its `|}`; an unclosed table runs to the end of its region.

use std::ops::Range;

use super::shadow;

/// Finds tables in a region shadow, outer before inner.
pub fn find(s: &[u8], at_line_start: bool) -> Vec<Range<usize>> {
    let mut open: Vec<usize> = Vec::new();
    let mut found = Vec::new();

    for (k, line) in shadow::line_ranges(s).into_iter().enumerate() {
        if k == 0 && !at_line_start {
            continue;
        }
        let text = &s[line.clone()];
        let indent = text
            .iter()
            .take_while(|b| matches!(b, b' ' | b'\t' | b':'))
            .count();
        if text[indent..].starts_with(b"{|") {
            open.push(line.start);
            continue;
        }
        let ws = text.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
        if text[ws..].starts_with(b"|}") {
            if let Some(start) = open.pop() {
                found.push(start..line.start + ws + 2);
            }
        }
    }
    while let Some(start) = open.pop() {
        found.push(start..s.len());
    }
    found.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    found
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCell {
    /// From the cell's separator through the end of its last line.
    pub span: Range<usize>,
    pub header: bool,
    /// Introduced by `||` or `!!` rather than at the start of a line.
    pub inline: bool,
    pub attrs: Option<Range<usize>>,
    /// Cell data, without the trailing newline.
    pub value: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub span: Range<usize>,
    /// Text after the `|-` marker, when the row has one.
    pub attrs: Option<Range<usize>>,
    pub cells: Vec<ParsedCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCaption {
    pub attrs: Option<Range<usize>>,
    pub text: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTable {
    /// Text after `{|` on the first line.
    pub attrs: Range<usize>,
    pub caption: Option<ParsedCaption>,
    pub rows: Vec<ParsedRow>,
}

impl ParsedTable {
    pub fn cells(&self) -> impl Iterator<Item = &ParsedCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }
}

/// Splits `body` on the first `|` into attributes and data.
fn split_attrs(s: &[u8], body: Range<usize>) -> (Option<Range<usize>>, Range<usize>) {
    match s[body.clone()].iter().position(|&b| b == b'|') {
        Some(p) => (Some(body.start..body.start + p), body.start + p + 1..body.end),
        None => (None, body),
    }
}

struct OpenRow {
    start: usize,
    attrs: Option<Range<usize>>,
    cells: Vec<ParsedCell>,
}

struct Parser<'a> {
    s: &'a [u8],
    rows: Vec<ParsedRow>,
    row: Option<OpenRow>,
    /// The cell still accepting continuation lines.
    cell: Option<ParsedCell>,
    caption: Option<ParsedCaption>,
    caption_open: bool,
}

impl Parser<'_> {
    fn line_end_with_newline(&self, end: usize) -> usize {
        if self.s.get(end) == Some(&b'\n') { end + 1 } else { end }
    }

    fn finish_cell(&mut self) {
        if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
            row.cells.push(cell);
        }
    }

    fn finish_row(&mut self) {
        self.finish_cell();
        let Some(row) = self.row.take() else {
            return;
        };
        if let Some(end) = row.cells.last().map(|c| c.span.end) {
            self.rows.push(ParsedRow {
                span: row.start..end,
                attrs: row.attrs,
                cells: row.cells,
            });
        }
    }

    fn cell_line(&mut self, line: Range<usize>, at: usize) {
        self.finish_cell();
        self.caption_open = false;
        let header = self.s[at] == b'!';
        if self.row.is_none() {
            self.row = Some(OpenRow {
                start: at,
                attrs: None,
                cells: Vec::new(),
            });
        }

        let mut seps = vec![(at, 1)];
        let mut i = at + 1;
        while i + 1 < line.end {
            let pair = &self.s[i..i + 2];
            if pair == b"||" || (header && pair == b"!!") {
                seps.push((i, 2));
                i += 2;
            } else {
                i += 1;
            }
        }

        for (k, &(sep, width)) in seps.iter().enumerate() {
            let last = k + 1 == seps.len();
            let end = seps.get(k + 1).map_or(line.end, |&(next, _)| next);
            let (attrs, value) = split_attrs(self.s, sep + width..end);
            let cell = ParsedCell {
                span: sep..if last { self.line_end_with_newline(end) } else { end },
                header,
                inline: width == 2,
                attrs,
                value,
            };
            if last {
                self.cell = Some(cell);
            } else if let Some(row) = self.row.as_mut() {
                row.cells.push(cell);
            }
        }
    }

    fn continuation(&mut self, line: Range<usize>) {
        let with_newline = self.line_end_with_newline(line.end);
        if let Some(cell) = self.cell.as_mut() {
            cell.value.end = line.end;
            cell.span.end = with_newline;
        } else if self.caption_open {
            if let Some(caption) = self.caption.as_mut() {
                caption.text.end = line.end;
            }
        }
    }
}

/// Parses rows, cells and caption of one table shadow (nested tables
/// already masked). Ranges are local to `s`.
pub fn parse(s: &[u8]) -> ParsedTable {
    let lines = shadow::line_ranges(s);
    let mut p = Parser {
        s,
        rows: Vec::new(),
        row: None,
        cell: None,
        caption: None,
        caption_open: false,
    };

    let attrs = lines
        .first()
        .and_then(|first| {
            shadow::find(&s[first.clone()], b"{|", 0).map(|o| first.start + o + 2..first.end)
        })
        .unwrap_or(0..0);

    for line in lines.into_iter().skip(1) {
        let indent = s[line.clone()]
            .iter()
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count();
        let at = line.start + indent;
        let rest = &s[at..line.end];

        if rest.starts_with(b"|}") {
            break;
        } else if rest.starts_with(b"|-") {
            p.finish_row();
            p.caption_open = false;
            let dashes = rest[1..].iter().take_while(|&&b| b == b'-').count();
            p.row = Some(OpenRow {
                start: at,
                attrs: Some(at + 1 + dashes..line.end),
                cells: Vec::new(),
            });
        } else if rest.starts_with(b"|+") {
            if p.caption.is_none() && p.rows.is_empty() && p.row.is_none() {
                let (attrs, text) = split_attrs(s, at + 2..line.end);
                p.caption = Some(ParsedCaption { attrs, text });
                p.caption_open = true;
            } else {
                // A late caption line is dropped along with its continuation.
                p.finish_cell();
                p.caption_open = false;
            }
        } else if rest.starts_with(b"|") || rest.starts_with(b"!") {
            p.cell_line(line, at);
        } else {
            p.continuation(line);
        }
    }
    p.finish_row();

    ParsedTable {
        attrs,
        caption: p.caption,
        rows: p.rows,
    }
}
