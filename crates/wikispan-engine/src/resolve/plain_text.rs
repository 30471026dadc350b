//! Plain-text rendering.
//!
//! Rendering works on a private copy of the node's text: every construct
//! marks which of its bytes survive, and the survivors are joined at the
//! end. Nothing is written back to the node's buffer.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use wikispan_config::Config;

use crate::document::{Document, NodeRef, inner};
use crate::error::Result;
use crate::nodes::tag::TagParts;
use crate::nodes::table::DataOptions;
use crate::nodes::{ParserFunction, Table, Template, WS, WikiLink, WikiNode, region_shadow};
use crate::registry::Detail;

/// What happens to templates or parser functions.
pub enum Replacement<T> {
    Keep,
    Remove,
    /// Replaced by the returned text.
    Map(Box<dyn Fn(&T) -> String>),
}

impl<T> Replacement<T> {
    pub fn map(f: impl Fn(&T) -> String + 'static) -> Self {
        Replacement::Map(Box::new(f))
    }
}

impl<T> fmt::Debug for Replacement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Keep => f.write_str("Keep"),
            Replacement::Remove => f.write_str("Remove"),
            Replacement::Map(_) => f.write_str("Map(..)"),
        }
    }
}

/// Which markup [`render`] strips. Everything is stripped by default.
#[derive(Debug)]
pub struct PlainTextOptions {
    pub templates: Replacement<Template>,
    pub parser_functions: Replacement<ParserFunction>,
    /// Parameters render as their default, or vanish.
    pub parameters: bool,
    pub tags: bool,
    pub external_links: bool,
    pub wikilinks: bool,
    pub bold_italic: bool,
    /// Tables render as their caption and rows of tab-separated cells,
    /// padded to the column width, between blank lines.
    pub tables: bool,
    pub unescape_html: bool,
}

impl Default for PlainTextOptions {
    fn default() -> Self {
        PlainTextOptions {
            templates: Replacement::Remove,
            parser_functions: Replacement::Remove,
            parameters: true,
            tags: true,
            external_links: true,
            wikilinks: true,
            bold_italic: true,
            tables: true,
            unescape_html: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Byte,
    Gone,
    Text(String),
}

/// Per-byte fate of the copied text.
struct Pieces<'a> {
    text: &'a str,
    pieces: Vec<Piece>,
}

impl<'a> Pieces<'a> {
    fn new(text: &'a str) -> Self {
        Pieces {
            text,
            pieces: vec![Piece::Byte; text.len()],
        }
    }

    fn set(&mut self, range: Range<usize>, piece: &Piece) {
        let end = range.end.min(self.pieces.len());
        let start = range.start.min(end);
        for p in &mut self.pieces[start..end] {
            *p = piece.clone();
        }
    }

    fn remove(&mut self, range: Range<usize>) {
        self.set(range, &Piece::Gone);
    }

    /// Replaces the byte at `at` with `text`.
    fn put(&mut self, at: usize, text: &str) {
        if let Some(p) = self.pieces.get_mut(at) {
            *p = Piece::Text(text.to_string());
        }
    }

    fn is_gone(&self, at: usize) -> bool {
        self.pieces.get(at).is_none_or(|p| *p == Piece::Gone)
    }

    fn render(self) -> String {
        let bytes = self.text.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        for (i, piece) in self.pieces.iter().enumerate() {
            match piece {
                Piece::Byte => out.push(bytes[i]),
                Piece::Text(t) => out.extend_from_slice(t.as_bytes()),
                Piece::Gone => {}
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

fn replace<T: WikiNode>(pieces: &mut Pieces<'_>, nodes: Vec<T>, replacement: &Replacement<T>) -> Result<()> {
    for node in nodes {
        let span = node.span()?;
        match replacement {
            Replacement::Keep => return Ok(()),
            Replacement::Remove => pieces.remove(span.range()),
            Replacement::Map(f) => {
                if pieces.is_gone(span.start) {
                    continue;
                }
                pieces.put(span.start, &f(&node));
                pieces.remove(span.start + 1..span.end);
            }
        }
    }
    Ok(())
}

/// Plain text of a caption or cell value, trimmed.
fn fragment(text: &str, options: &PlainTextOptions, config: &Config) -> Result<String> {
    let doc = Document::parse_with_config(text, Arc::new(config.clone()));
    Ok(render(doc.node(), options)?.trim_matches(WS).to_string())
}

/// Replaces a table with its caption and data rows. Cells are joined with
/// tabs and padded to their column's width, except the last of each row.
/// A table without rows leaves nothing behind.
fn table(pieces: &mut Pieces<'_>, table: &Table, options: &PlainTextOptions, config: &Config) -> Result<()> {
    let span = table.span()?;
    if pieces.is_gone(span.start) {
        return Ok(());
    }
    let mut rows = Vec::new();
    for row in table.data(DataOptions::default())? {
        rows.push(
            row.iter()
                .map(|value| fragment(value, options, config))
                .collect::<Result<Vec<_>>>()?,
        );
    }
    pieces.remove(span.range());
    if rows.is_empty() {
        return Ok(());
    }

    let mut widths: Vec<usize> = Vec::new();
    for row in &rows {
        for (k, cell) in row.iter().enumerate() {
            let width = cell.chars().count();
            match widths.get_mut(k) {
                Some(w) => *w = (*w).max(width),
                None => widths.push(width),
            }
        }
    }

    let mut out = String::from("\n");
    if let Some(caption) = table.caption()? {
        out.push_str(&fragment(&caption, options, config)?);
        out.push_str("\n\n");
    }
    for row in &rows {
        let last = row.len().saturating_sub(1);
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(k, cell)| {
                if k == last {
                    cell.clone()
                } else {
                    format!("{cell:<width$}", width = widths[k])
                }
            })
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    pieces.put(span.start, &out);
    Ok(())
}

fn is_image(config: &Config, title: &str) -> bool {
    let Some((namespace, name)) = title.trim().split_once(':') else {
        return false;
    };
    let namespace = namespace.trim();
    (namespace.eq_ignore_ascii_case("file") || namespace.eq_ignore_ascii_case("image"))
        && config.has_image_extension(name)
}

/// True for an image parameter such as `thumb` or `200px`.
fn is_image_option(segment: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "thumb", "thumbnail", "frame", "framed", "frameless", "border", "left", "right",
        "center", "centre", "none", "upright", "baseline", "middle", "sub", "super", "top",
        "text-top", "bottom", "text-bottom",
    ];
    const PREFIXES: &[&str] = &["alt=", "link=", "upright=", "page=", "class=", "lang="];
    let s = segment.trim().to_ascii_lowercase();
    let size = s
        .strip_suffix("px")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit() || b == b'x'));
    size || KEYWORDS.contains(&s.as_str()) || PREFIXES.iter().any(|p| s.starts_with(p))
}

/// Keeps a link's text, or its target when it has none. Images keep only
/// their caption and vanish without one.
fn wikilink(pieces: &mut Pieces<'_>, link: &WikiLink, config: &Config) -> Result<()> {
    let span = link.span()?;
    let text = link.string()?;
    let body = inner(text.len(), 2, 2);
    let s = region_shadow(link.node(), &text, body.clone());
    let pipes: Vec<usize> = body.clone().filter(|&i| s[i] == b'|').collect();

    let kept = if is_image(config, &link.title()?) {
        pipes
            .last()
            .map(|&last| last + 1..body.end)
            .filter(|caption| !is_image_option(&text[caption.clone()]))
    } else {
        match pipes.first() {
            Some(&first) => Some(first + 1..body.end),
            None => Some(body),
        }
    };
    match kept {
        Some(kept) => {
            pieces.remove(span.start..span.start + kept.start);
            pieces.remove(span.start + kept.end..span.end);
        }
        None => pieces.remove(span.range()),
    }
    Ok(())
}

/// Text of `node` with markup stripped according to `options`.
pub fn render(node: &NodeRef, options: &PlainTextOptions) -> Result<String> {
    let text = node.string()?;
    let config = node.config();
    let doc = Document::parse_with_config(&text, Arc::new(config.clone()));
    let mut pieces = Pieces::new(&text);

    if options.tables {
        for t in doc.tables()? {
            table(&mut pieces, &t, options, &config)?;
        }
    }
    for comment in doc.comments()? {
        pieces.remove(comment.span()?.range());
    }
    replace(&mut pieces, doc.templates()?, &options.templates)?;
    replace(&mut pieces, doc.parser_functions()?, &options.parser_functions)?;

    if options.external_links {
        for link in doc.external_links()? {
            if !link.in_brackets()? {
                continue;
            }
            let span = link.span()?;
            match link.text()? {
                Some(label) => {
                    pieces.remove(span.start..span.end - 1 - label.len());
                    pieces.remove(span.end - 1..span.end);
                }
                None => pieces.remove(span.range()),
            }
        }
    }
    if options.bold_italic {
        for run in doc.bolds_and_italics()? {
            let span = run.span()?;
            if let Detail::Quote { open, close } = run.node().detail()? {
                pieces.remove(span.start..span.start + usize::from(open));
                pieces.remove(span.end - usize::from(close)..span.end);
            }
        }
    }
    if options.parameters {
        for parameter in doc.parameters()? {
            let span = parameter.span()?;
            match parameter.default()? {
                Some(default) => {
                    pieces.remove(span.start..span.end - 3 - default.len());
                    pieces.remove(span.end - 3..span.end);
                }
                None => pieces.remove(span.range()),
            }
        }
    }
    if options.tags {
        for tag in doc.tags(None)? {
            let span = tag.span()?;
            match TagParts::parse(&tag.string()?).and_then(|parts| parts.content) {
                Some(content) => {
                    pieces.remove(span.start..span.start + content.start);
                    pieces.remove(span.start + content.end..span.end);
                }
                None => pieces.remove(span.range()),
            }
        }
    }
    if options.wikilinks {
        for link in doc.wikilinks()? {
            wikilink(&mut pieces, &link, &config)?;
        }
    }

    let out = pieces.render();
    Ok(if options.unescape_html {
        html_escape::decode_html_entities(&out).into_owned()
    } else {
        out
    })
}

/// `text` parsed on its own and rendered with the default options.
pub fn remove_markup(text: &str) -> Result<String> {
    Document::parse(text).plain_text(&PlainTextOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("a ''b'' '''c''' d", "a b c d")]
    #[case("[[d|e]] [[f]] [[g#h]]", "e f g#h")]
    #[case("x {{g|1}} <!-- h --> y", "x   y")]
    #[case("[https://x.y z] [https://x.y] https://x.y", "z  https://x.y")]
    #[case("<b>i</b><br/>", "i")]
    #[case("{{{p|q}}} {{{r}}}", "q ")]
    #[case("a &amp; b", "a & b")]
    #[case("{{#if:a|b}}c", "c")]
    fn strips_markup(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(remove_markup(text).as_deref(), Ok(expected));
    }

    #[test]
    fn tables_render_as_padded_columns() {
        let text = "a\n{|\n|[[Orange]]\n|Apple\n|-\n|Bread\n|Pie\n|-\n|Butter\n|Ice cream \n|}\nb";
        assert_eq!(
            remove_markup(text).as_deref(),
            Ok("a\n\nOrange\tApple\nBread \tPie\nButter\tIce cream\n\nb")
        );
    }

    #[test]
    fn table_captions_come_first() {
        let text = "{|\n|+ cap\n|-\n! h1 !! h2\n|-\n| a || b\n|}";
        assert_eq!(remove_markup(text).as_deref(), Ok("\ncap\n\nh1\th2\na \tb\n"));
    }

    #[test]
    fn spanning_cells_repeat_in_every_column() {
        let text = "{|\n!colspan=\"2\"|List\n|-\n|rowspan=\"2\"|Bread &amp; Butter\n|Pie\n|-\n|Cheese\n|}";
        assert_eq!(
            remove_markup(text).as_deref(),
            Ok("\nList          \tList\nBread & Butter\tPie\nBread & Butter\tCheese\n")
        );
    }

    #[test]
    fn tables_without_rows_vanish() {
        assert_eq!(remove_markup("x{{t|a=v}}\n{|{{t1|a=v}}\n|}").as_deref(), Ok("x\n"));
    }

    #[test]
    fn images_keep_only_captions() {
        let text = "[[File:a.jpg|thumb|A cat]] [[File:b.png|thumb]]";
        assert_eq!(remove_markup(text).as_deref(), Ok("A cat "));
    }

    #[test]
    fn templates_can_be_kept_or_mapped() {
        let doc = Document::parse("x {{a|b}} y");
        let keep = PlainTextOptions {
            templates: Replacement::Keep,
            ..PlainTextOptions::default()
        };
        assert_eq!(doc.plain_text(&keep).as_deref(), Ok("x {{a|b}} y"));
        let map = PlainTextOptions {
            templates: Replacement::map(|t: &Template| t.name().unwrap_or_default()),
            ..PlainTextOptions::default()
        };
        assert_eq!(doc.plain_text(&map).as_deref(), Ok("x a y"));
        assert_eq!(doc.text(), "x {{a|b}} y");
    }

    #[test]
    fn mapping_closures_can_capture() {
        let doc = Document::parse("{{a}} and {{b|c}}");
        let marker = String::from("T:");
        let options = PlainTextOptions {
            templates: Replacement::Map(Box::new(move |t: &Template| {
                format!("{marker}{}", t.name().unwrap_or_default())
            })),
            ..PlainTextOptions::default()
        };
        assert_eq!(doc.plain_text(&options).as_deref(), Ok("T:a and T:b"));
    }

    #[test]
    fn mapped_outer_templates_hide_inner_ones() {
        let doc = Document::parse("{{tt|{{#if:}}}}");
        let options = PlainTextOptions {
            templates: Replacement::map(|_: &Template| "T".to_string()),
            parser_functions: Replacement::map(|_: &ParserFunction| "P".to_string()),
            ..PlainTextOptions::default()
        };
        assert_eq!(doc.plain_text(&options).as_deref(), Ok("T"));
    }

    #[test]
    fn switches_leave_markup_alone() {
        let doc = Document::parse("''a'' &amp;");
        let options = PlainTextOptions {
            bold_italic: false,
            unescape_html: false,
            ..PlainTextOptions::default()
        };
        assert_eq!(doc.plain_text(&options).as_deref(), Ok("''a'' &amp;"));
    }

    #[test]
    fn nodes_render_their_own_text() {
        let doc = Document::parse("a [[b|''c'']] d");
        let link = doc.wikilinks().expect("query").remove(0);
        assert_eq!(link.plain_text(&PlainTextOptions::default()).as_deref(), Ok("c"));
    }
}
