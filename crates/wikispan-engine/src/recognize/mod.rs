//! Recognizer: finds every construct in a slice of text.
//!
//! Recognition works on shadows (see [`shadow`]). Comments and extension
//! tags are found and masked first, then brace and bracket pairs innermost
//! first, then external links. Each brace body is a region of its own in
//! which tags, tables, lists and quotes are found on a shadow that hides
//! the nested pairs. Sections are found on the outermost region only.
//!
//! A final pass keeps the results well nested: constructs that can be
//! dropped or shortened without changing the rest are, when they would
//! partially overlap another one.

pub mod attrs;
pub mod braces;
pub mod comments;
pub mod cursor;
pub mod external_links;
pub mod lists;
pub mod quotes;
pub mod sections;
pub mod shadow;
pub mod tables;
pub mod tags;

use std::ops::Range;
use std::sync::Arc;

use regex::Regex;
use wikispan_config::Config;

use crate::buffer::Span;
use crate::registry::{Detail, NodeKind};
use external_links::LinkPatterns;
use shadow::{COMMENT_MASK, LINK_STOP, MASK};

/// True when the ranges share bytes and neither contains the other.
pub(crate) fn crosses(a: &Range<usize>, b: &Range<usize>) -> bool {
    Span::from(a.clone()).straddles(Span::from(b.clone()))
}

/// One recognized construct with its absolute span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    pub kind: NodeKind,
    pub span: Span,
    pub detail: Detail,
}

/// Everything recognized in one slice.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub found: Vec<Found>,
    /// Sections that run to the next heading of the same or higher rank.
    pub sections: Vec<Found>,
    /// Sections that end at the next heading of any level.
    pub flat_sections: Vec<Found>,
}

impl Scan {
    pub fn of(&self, kind: NodeKind) -> impl Iterator<Item = &Found> + '_ {
        self.found.iter().filter(move |f| f.kind == kind)
    }

    pub fn sections(&self, include_subsections: bool) -> &[Found] {
        if include_subsections {
            &self.sections
        } else {
            &self.flat_sections
        }
    }
}

/// A stretch of text scanned with its own shadow.
#[derive(Debug)]
struct Region {
    start: usize,
    shadow: Vec<u8>,
    at_line_start: bool,
    /// Comment ranges local to `shadow`.
    comments: Vec<Range<usize>>,
}

#[derive(Debug, Clone)]
struct Raw {
    kind: NodeKind,
    range: Range<usize>,
    detail: Detail,
    /// End of the start tag of a paired HTML tag, which may be demoted to
    /// its start tag.
    start_tag_end: Option<usize>,
}

impl Raw {
    fn new(kind: NodeKind, range: Range<usize>) -> Self {
        Raw {
            kind,
            range,
            detail: Detail::None,
            start_tag_end: None,
        }
    }

    fn with_detail(kind: NodeKind, range: Range<usize>, detail: Detail) -> Self {
        Raw {
            detail,
            ..Raw::new(kind, range)
        }
    }

    fn is_quote(&self) -> bool {
        matches!(self.kind, NodeKind::Bold | NodeKind::Italic)
    }

    fn is_html_tag(&self) -> bool {
        self.kind == NodeKind::Tag && self.start_tag_end.is_some()
    }
}

#[derive(Debug, Default)]
struct Collected {
    found: Vec<Raw>,
    regions: Vec<Region>,
    ext_links: Vec<Range<usize>>,
}

/// Finds constructs according to a [`Config`].
#[derive(Debug, Clone)]
pub struct Recognizer {
    config: Arc<Config>,
    links: Option<LinkPatterns>,
    default_lists: Vec<(&'static str, Regex)>,
}

impl Recognizer {
    pub fn new(config: Arc<Config>) -> Self {
        let links = match LinkPatterns::new(&config) {
            Ok(links) => Some(links),
            Err(e) => {
                log::error!("url schemes do not compile, external links disabled: {e}");
                None
            }
        };
        let default_lists = lists::DEFAULT_PATTERNS
            .iter()
            .filter_map(|p| lists::compile(p).ok().map(|re| (*p, re)))
            .collect();
        Recognizer {
            config,
            links,
            default_lists,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scans `text`, which starts at absolute offset `base`.
    ///
    /// `at_line_start` tells whether the first byte of `text` begins a line
    /// of the buffer. The lead section is only reported when `lead_section`.
    pub fn scan(&self, text: &str, base: usize, at_line_start: bool, lead_section: bool) -> Scan {
        let mut out = Collected::default();
        let top = self.collect(text, 0, at_line_start, &mut out);

        for region in &out.regions {
            for (pattern, re) in &self.default_lists {
                out_lists(&mut out.found, region, &out.ext_links, &self.config, pattern, re);
            }
        }

        let mut heading_shadow = top;
        for raw in out.found.iter().filter(|r| r.kind == NodeKind::Table) {
            shadow::mask(&mut heading_shadow, raw.range.clone(), MASK);
        }
        let headings = sections::headings(&heading_shadow, at_line_start);
        let to_found = |include| -> Vec<Found> {
            sections::sections(text.len(), &headings, include, lead_section)
                .into_iter()
                .map(|s| Found {
                    kind: NodeKind::Section,
                    span: Span::from(s.span).offset(base),
                    detail: Detail::None,
                })
                .collect()
        };
        let nested = to_found(true);
        let flat = to_found(false);

        let boundaries: Vec<Range<usize>> = nested
            .iter()
            .chain(flat.iter())
            .map(|f| f.span.relative_to(base).range())
            .collect();
        settle(&mut out.found, &boundaries);

        let mut found: Vec<Found> = out
            .found
            .into_iter()
            .map(|r| Found {
                kind: r.kind,
                span: Span::from(r.range).offset(base),
                detail: r.detail,
            })
            .collect();
        sort_found(&mut found);
        Scan {
            found,
            sections: nested,
            flat_sections: flat,
        }
    }

    /// Lists matching `pattern` in `text`.
    pub fn lists(
        &self,
        text: &str,
        base: usize,
        at_line_start: bool,
        pattern: &str,
    ) -> Result<Vec<Found>, regex::Error> {
        let re = lists::compile(pattern)?;
        let mut out = Collected::default();
        self.collect(text, 0, at_line_start, &mut out);
        let mut raw = Vec::new();
        for region in &out.regions {
            out_lists(&mut raw, region, &out.ext_links, &self.config, pattern, &re);
        }
        raw.retain(|l| {
            !out.found.iter().any(|o| {
                matches!(o.kind, NodeKind::Table | NodeKind::Row | NodeKind::Cell)
                    && crosses(&l.range, &o.range)
            })
        });
        let mut found: Vec<Found> = raw
            .into_iter()
            .map(|r| Found {
                kind: r.kind,
                span: Span::from(r.range).offset(base),
                detail: r.detail,
            })
            .collect();
        sort_found(&mut found);
        Ok(found)
    }

    /// Structural shadow of `text`: comments, extension tags and every
    /// brace or bracket pair masked.
    pub fn shadow(&self, text: &str) -> Vec<u8> {
        let mut out = Collected::default();
        self.collect(text, 0, false, &mut out)
    }

    /// Items of the list whose text is `text`.
    pub fn list_items(&self, text: &str, pattern: &str) -> Result<lists::ListItems, regex::Error> {
        let re = lists::compile(pattern)?;
        let mut out = Collected::default();
        let mut s = self.collect(text, 0, true, &mut out);
        for link in &out.ext_links {
            shadow::mask(&mut s, link.clone(), MASK);
        }
        join_tag_lines(&mut s, &self.config);
        Ok(lists::items(&s, &re))
    }

    /// Rows, cells and caption of the table whose text is `text`.
    pub fn table(&self, text: &str) -> tables::ParsedTable {
        let mut out = Collected::default();
        let mut s = self.collect(text, 0, true, &mut out);
        for nested in tables::find(&s, true) {
            if nested.start > 0 {
                shadow::mask(&mut s, nested, MASK);
            }
        }
        tables::parse(&s)
    }

    /// Recognizes everything in `text` (placed at `offset` within the
    /// scanned slice), returning its shadow after brace masking.
    fn collect(&self, text: &str, offset: usize, at_line_start: bool, out: &mut Collected) -> Vec<u8> {
        let config = &*self.config;
        let mut s = shadow::ascii(text);
        let mut link_shadow = s.clone();
        let mut guards: Vec<Range<usize>> = Vec::new();
        let found_comments = comments::find(&s, config.max_unclosed_scan);

        for comment in found_comments.clone() {
            shadow::mask(&mut s, comment.clone(), COMMENT_MASK);
            shadow::mask(&mut link_shadow, comment.clone(), LINK_STOP);
            out.found.push(Raw::new(NodeKind::Comment, shift(&comment, offset)));
            guards.push(comment);
        }

        for tag in tags::find_extension_tags(&s, config) {
            if let Some(content) = tag.content.clone() {
                if config.is_parsable_tag(&tag.name) {
                    let starts_line = (content.start == 0 && at_line_start)
                        || (content.start > 0 && s[content.start - 1] == b'\n');
                    self.collect(&text[content.clone()], offset + content.start, starts_line, out);
                }
            }
            shadow::mask(&mut s, tag.span.clone(), MASK);
            shadow::mask(&mut link_shadow, tag.span.clone(), LINK_STOP);
            out.found.push(Raw::new(NodeKind::Tag, shift(&tag.span, offset)));
            guards.push(tag.span);
        }

        let braces = braces::recognize(text, &mut s, config);
        for (kind, range) in &braces.found {
            match kind {
                NodeKind::WikiLink => shadow::mask(&mut link_shadow, range.clone(), LINK_STOP),
                _ => {
                    let width = if *kind == NodeKind::Parameter { 3 } else { 2 };
                    shadow::mask(&mut link_shadow, range.start..range.start + width, b' ');
                    shadow::mask(&mut link_shadow, range.end - width..range.end, b' ');
                }
            }
            out.found.push(Raw::new(*kind, shift(range, offset)));
            guards.push(range.clone());
        }
        for arg in &braces.arguments {
            out.found.push(Raw::new(NodeKind::Argument, shift(arg, offset)));
            guards.push(arg.clone());
        }

        if let Some(links) = &self.links {
            for link in links.find(&link_shadow, &guards) {
                let link = shift(&link, offset);
                out.ext_links.push(link.clone());
                out.found.push(Raw::new(NodeKind::ExternalLink, link));
            }
        }

        let mut regions = vec![Region {
            start: offset,
            shadow: s.clone(),
            at_line_start,
            comments: found_comments.clone(),
        }];
        regions.extend(braces.regions.into_iter().map(|(inner, shadow)| Region {
            start: offset + inner.start,
            comments: found_comments
                .iter()
                .filter(|c| inner.start <= c.start && c.end <= inner.end)
                .map(|c| c.start - inner.start..c.end - inner.start)
                .collect(),
            shadow,
            at_line_start: false,
        }));
        for region in &regions {
            region_constructs(config, region, &mut out.found);
        }
        out.regions.extend(regions);
        s
    }
}

fn shift(range: &Range<usize>, offset: usize) -> Range<usize> {
    range.start + offset..range.end + offset
}

/// Tags, tables with their rows and cells, and quotes of one region.
fn region_constructs(config: &Config, region: &Region, found: &mut Vec<Raw>) {
    let s = &region.shadow;
    let base = region.start;

    for tag in tags::find_html_tags(s, config) {
        found.push(Raw {
            start_tag_end: tag.content.as_ref().map(|c| base + c.start),
            ..Raw::new(NodeKind::Tag, shift(&tag.span, base))
        });
    }

    let tables = tables::find(s, region.at_line_start);
    for table in &tables {
        found.push(Raw::new(NodeKind::Table, shift(table, base)));
        let mut table_shadow = s[table.clone()].to_vec();
        for nested in tables.iter().filter(|t| *t != table && table.start <= t.start && t.end <= table.end) {
            shadow::mask(&mut table_shadow, nested.start - table.start..nested.end - table.start, MASK);
        }
        let at = base + table.start;
        for row in tables::parse(&table_shadow).rows {
            found.push(Raw::new(NodeKind::Row, shift(&row.span, at)));
            for cell in row.cells {
                found.push(Raw::with_detail(
                    NodeKind::Cell,
                    shift(&cell.span, at),
                    Detail::Cell {
                        header: cell.header,
                        inline: cell.inline,
                    },
                ));
            }
        }
    }

    for line in shadow::line_ranges(s) {
        let hidden: Vec<Range<usize>> = region
            .comments
            .iter()
            .filter(|c| c.start < line.end && line.start < c.end)
            .filter(|c| s[(*c).clone()].iter().all(|&b| b == COMMENT_MASK))
            .map(|c| c.start.max(line.start) - line.start..c.end.min(line.end) - line.start)
            .collect();
        for q in quotes::find_around(&s[line.clone()], &hidden) {
            found.push(Raw::with_detail(
                q.kind,
                shift(&q.span, base + line.start),
                Detail::Quote {
                    open: q.open,
                    close: q.close,
                },
            ));
        }
    }
}

/// Masks the newlines inside start and end tags, so a tag written over
/// several lines does not end a list item. Tag contents keep theirs.
fn join_tag_lines(s: &mut [u8], config: &Config) {
    for tag in tags::find_html_tags(s, config) {
        let (open, close) = match &tag.content {
            Some(content) => (tag.span.start..content.start, content.end..tag.span.end),
            None => (tag.span.clone(), tag.span.end..tag.span.end),
        };
        for i in open.chain(close) {
            if s[i] == b'\n' {
                s[i] = MASK;
            }
        }
    }
}

fn out_lists(
    found: &mut Vec<Raw>,
    region: &Region,
    ext_links: &[Range<usize>],
    config: &Config,
    pattern: &str,
    re: &Regex,
) {
    let mut s = region.shadow.clone();
    let end = region.start + s.len();
    for link in ext_links.iter().filter(|l| l.start < end && l.end > region.start) {
        let local = link.start.saturating_sub(region.start)..link.end.min(end) - region.start;
        shadow::mask(&mut s, local, MASK);
    }
    join_tag_lines(&mut s, config);
    for list in lists::find(&s, region.at_line_start, re) {
        found.push(Raw::with_detail(
            NodeKind::WikiList,
            shift(&list, region.start),
            Detail::List {
                pattern: pattern.to_string(),
            },
        ));
    }
}

/// Drops or shortens constructs that would partially overlap others.
fn settle(found: &mut Vec<Raw>, sections: &[Range<usize>]) {
    let crosses_any = |r: &Raw, others: &[Raw], skip: &dyn Fn(&Raw) -> bool| {
        others.iter().any(|o| !skip(o) && crosses(&r.range, &o.range))
            || sections.iter().any(|s| crosses(&r.range, s))
    };

    let structural: Vec<Raw> = found
        .iter()
        .filter(|r| matches!(r.kind, NodeKind::Table | NodeKind::Row | NodeKind::Cell))
        .cloned()
        .collect();
    found.retain(|r| {
        r.kind != NodeKind::WikiList || !structural.iter().any(|t| crosses(&r.range, &t.range))
    });

    let others = found.clone();
    found.retain(|r| {
        let keep = r.kind != NodeKind::ExternalLink
            || !crosses_any(r, &others, &|o: &Raw| o.is_quote() || o.is_html_tag());
        if !keep {
            log::debug!("dropping external link at {:?}: it crosses another construct", r.range);
        }
        keep
    });

    let others = found.clone();
    found.retain(|r| !r.is_quote() || !crosses_any(r, &others, &|o: &Raw| o.is_quote() || o.is_html_tag()));

    let others = found.clone();
    for r in found.iter_mut().filter(|r| r.is_html_tag()) {
        if crosses_any(r, &others, &|o: &Raw| o.is_html_tag()) {
            if let Some(end) = r.start_tag_end.take() {
                log::debug!("demoting tag at {:?} to its start tag", r.range);
                r.range = r.range.start..end;
            }
        }
    }
}

fn sort_found(found: &mut [Found]) {
    found.sort_by(|a, b| {
        Span::document_order(&a.span, &b.span).then(a.kind.rank().cmp(&b.kind.rank()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recognizer() -> Recognizer {
        Recognizer::new(Arc::new(Config::default()))
    }

    fn texts(text: &str, kind: NodeKind) -> Vec<&str> {
        recognizer()
            .scan(text, 0, true, true)
            .of(kind)
            .map(|f| &text[f.span.range()])
            .collect()
    }

    #[test]
    fn comments_hide_markup() {
        assert_eq!(texts("<!--{{a}}-->{{b}}", NodeKind::Template), vec!["{{b}}"]);
    }

    #[test]
    fn unparsable_tags_hide_markup_but_parsable_tags_do_not() {
        let text = "<nowiki>{{a}}</nowiki><ref>{{b}}</ref>";
        assert_eq!(texts(text, NodeKind::Template), vec!["{{b}}"]);
        assert_eq!(
            texts(text, NodeKind::Tag),
            vec!["<nowiki>{{a}}</nowiki>", "<ref>{{b}}</ref>"]
        );
    }

    #[test]
    fn arguments_are_found_in_nested_pairs() {
        assert_eq!(
            texts("{{a|b={{c|d}}}}", NodeKind::Argument),
            vec!["|b={{c|d}}", "|d"]
        );
    }

    #[test]
    fn lists_inside_templates() {
        assert_eq!(
            texts("{{a|\n* b\n* c\n}}", NodeKind::WikiList),
            vec!["* b\n* c\n"]
        );
    }

    #[test]
    fn headings_inside_tables_do_not_start_sections() {
        let scan = recognizer().scan("a\n{|\n|\n== b ==\n|}\n== c ==\n", 0, true, true);
        assert_eq!(scan.sections.len(), 2);
        assert_eq!(scan.sections[1].span, Span::new(18, 26));
    }

    #[test]
    fn external_link_inside_template_argument() {
        assert_eq!(
            texts("{{a|[http://x y]}}", NodeKind::ExternalLink),
            vec!["[http://x y]"]
        );
    }

    #[test]
    fn crossing_bold_demotes_html_tag() {
        let text = "'''b<S>r'''c</S>";
        assert_eq!(texts(text, NodeKind::Bold), vec!["'''b<S>r'''"]);
        assert_eq!(texts(text, NodeKind::Tag), vec!["<S>"]);
    }

    #[test]
    fn italic_crossing_an_argument_is_dropped() {
        assert!(texts("{{a|''x|y''}}", NodeKind::Italic).is_empty());
    }

    #[test]
    fn spans_are_absolute() {
        let scan = recognizer().scan("{{a}}", 10, false, false);
        let spans: Vec<Span> = scan.of(NodeKind::Template).map(|f| f.span).collect();
        assert_eq!(spans, vec![Span::new(10, 15)]);
    }

    #[test]
    fn table_parse_masks_nested_tables() {
        let text = "{|\n|a\n{|\n|b\n|}\n|}";
        let table = recognizer().table(text);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells.len(), 1);
    }
}
