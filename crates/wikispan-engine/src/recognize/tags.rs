//! Start/end tag parsing plus extension-tag and HTML-tag discovery.

use std::ops::Range;

use wikispan_config::Config;

use super::attrs::{self, Attr};
use super::cursor::Cursor;

/// A parsed `<name attrs>` or `<name attrs/>`, with local ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub span: Range<usize>,
    pub name: Range<usize>,
    /// Attributes, relative to the start of `s` passed to [`start_tag`].
    pub attrs: Vec<Attr>,
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTag {
    pub span: Range<usize>,
    pub name: Range<usize>,
}

/// A tag discovered in a slice (local ranges).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundTag {
    pub span: Range<usize>,
    pub name: String,
    pub extension: bool,
    /// Between the start and end tag; `None` for self-closing and unclosed
    /// tags.
    pub content: Option<Range<usize>>,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// Parses a start tag at `at`. `limit` bounds how far the closing `>` is
/// searched for.
pub fn start_tag(s: &[u8], at: usize, limit: usize) -> Option<StartTag> {
    let mut cur = Cursor::at(s, 0, at);
    if cur.bump()? != b'<' || !cur.peek()?.is_ascii_alphabetic() {
        return None;
    }
    let name = cur.eat_while(is_name_byte);
    match cur.peek() {
        Some(b) if b.is_ascii_whitespace() || b == b'/' || b == b'>' => {}
        _ => return None,
    }

    let rest_end = s.len().min(cur.i.saturating_add(limit));
    let rest = &s[cur.i..rest_end];
    let (mut tag_attrs, close) = attrs::parse_until_close(rest);
    let close = cur.i + close?;
    for a in &mut tag_attrs {
        let offset = cur.i;
        a.name = a.name.start + offset..a.name.end + offset;
        a.value = a.value.take().map(|v| v.start + offset..v.end + offset);
        a.span = a.span.start + offset..a.span.end + offset;
    }
    let self_closing = s[..close].trim_ascii_end().last() == Some(&b'/');
    Some(StartTag {
        span: at..close + 1,
        name,
        attrs: tag_attrs,
        self_closing,
    })
}

/// Parses an end tag `</name >` at `at`.
pub fn end_tag(s: &[u8], at: usize) -> Option<EndTag> {
    let mut cur = Cursor::at(s, 0, at);
    if !cur.starts_with(b"</") {
        return None;
    }
    cur.bump_n(2);
    let name = cur.eat_while(is_name_byte);
    if name.is_empty() {
        return None;
    }
    cur.skip_ws();
    (cur.bump()? == b'>').then(|| EndTag {
        span: at..cur.i,
        name,
    })
}

/// Finds the first `</name\s*>` at or after `from`, matching case-insensitively.
pub fn find_end_tag(s: &[u8], name: &[u8], from: usize, limit: usize) -> Option<EndTag> {
    let stop = s.len().min(from.saturating_add(limit));
    let mut i = from;
    while i < stop {
        if s[i] == b'<' {
            match end_tag(s, i) {
                Some(end) if s[end.name.clone()].eq_ignore_ascii_case(name) => return Some(end),
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Finds extension tags (`<ref>`, `<nowiki>`, ...), left to right. The
/// first matching end tag closes a tag; nothing nests inside the same name.
pub fn find_extension_tags(s: &[u8], config: &Config) -> Vec<FoundTag> {
    let limit = config.max_unclosed_scan;
    let mut found = Vec::new();
    let mut i = 0;
    while i < s.len() {
        if s[i] != b'<' {
            i += 1;
            continue;
        }
        let Some(start) = start_tag(s, i, limit) else {
            i += 1;
            continue;
        };
        let name = String::from_utf8_lossy(&s[start.name.clone()]).into_owned();
        if !config.is_extension_tag(&name) {
            i += 1;
            continue;
        }
        if start.self_closing {
            i = start.span.end;
            found.push(FoundTag {
                span: start.span,
                name,
                extension: true,
                content: None,
            });
            continue;
        }
        match find_end_tag(s, name.as_bytes(), start.span.end, limit) {
            Some(end) => {
                i = end.span.end;
                found.push(FoundTag {
                    span: start.span.start..end.span.end,
                    name,
                    extension: true,
                    content: Some(start.span.end..end.span.start),
                });
            }
            None => {
                if s.len() - start.span.end > limit {
                    log::warn!(
                        "no </{name}> within {limit} bytes of byte {}; treating as unclosed",
                        start.span.start
                    );
                }
                i = start.span.end;
                found.push(FoundTag {
                    span: start.span,
                    name,
                    extension: true,
                    content: None,
                });
            }
        }
    }
    found
}

/// Finds HTML tags in a shadow whose nested constructs are already masked.
///
/// Start tags are paired, last first, with the first unclaimed end tag of
/// the same name that follows them. A pair that would partially overlap an
/// already accepted pair is reported as a lone start tag instead.
pub fn find_html_tags(s: &[u8], config: &Config) -> Vec<FoundTag> {
    let limit = config.max_unclosed_scan;
    let mut starts: Vec<(StartTag, String)> = Vec::new();
    let mut ends: Vec<(EndTag, String)> = Vec::new();

    let mut i = 0;
    while i < s.len() {
        if s[i] != b'<' {
            i += 1;
            continue;
        }
        if let Some(end) = end_tag(s, i) {
            let name = String::from_utf8_lossy(&s[end.name.clone()]).to_ascii_lowercase();
            if config.is_html_tag(&name) && !config.is_extension_tag(&name) {
                i = end.span.end;
                ends.push((end, name));
                continue;
            }
        } else if let Some(start) = start_tag(s, i, limit) {
            let name = String::from_utf8_lossy(&s[start.name.clone()]).into_owned();
            if config.is_html_tag(&name) && !config.is_extension_tag(&name) {
                i = start.span.end;
                starts.push((start, name));
                continue;
            }
        }
        i += 1;
    }

    let mut claimed = vec![false; ends.len()];
    let mut accepted: Vec<Range<usize>> = Vec::new();
    let mut found = Vec::with_capacity(starts.len());
    for (start, name) in starts.into_iter().rev() {
        let partner = if start.self_closing {
            None
        } else {
            ends.iter().enumerate().find(|(k, (end, end_name))| {
                !claimed[*k]
                    && end.span.start >= start.span.end
                    && end_name.eq_ignore_ascii_case(&name)
            })
        };
        let pair = partner.and_then(|(k, (end, _))| {
            let span = start.span.start..end.span.end;
            let straddles = accepted.iter().any(|a| super::crosses(a, &span));
            (!straddles).then_some((k, span, start.span.end..end.span.start))
        });
        match pair {
            Some((k, span, content)) => {
                claimed[k] = true;
                accepted.push(span.clone());
                found.push(FoundTag {
                    span,
                    name,
                    extension: false,
                    content: Some(content),
                });
            }
            None => found.push(FoundTag {
                span: start.span,
                name,
                extension: false,
                content: None,
            }),
        }
    }
    found.sort_by(|a, b| a.span.start.cmp(&b.span.start).then(b.span.end.cmp(&a.span.end)));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn html(s: &str) -> Vec<(&str, Option<&str>)> {
        find_html_tags(s.as_bytes(), &Config::default())
            .into_iter()
            .map(|t| (&s[t.span], t.content.map(|c| &s[c])))
            .collect()
    }

    fn ext(s: &str) -> Vec<&str> {
        find_extension_tags(s.as_bytes(), &Config::default())
            .into_iter()
            .map(|t| &s[t.span])
            .collect()
    }

    #[test]
    fn start_tag_with_attrs() {
        let s = br#"<ref name="a b" group=x>"#;
        let tag = start_tag(s, 0, 1000).expect("start tag");
        assert_eq!(tag.span, 0..s.len());
        assert_eq!(tag.name, 1..4);
        assert_eq!(tag.attrs.len(), 2);
        assert_eq!(tag.attrs[0].value, Some(11..14));
        assert!(!tag.self_closing);
    }

    #[rstest]
    #[case("<br/>", true)]
    #[case("<references />", true)]
    #[case("<a title='/'>", false)]
    fn self_closing_detection(#[case] input: &str, #[case] expected: bool) {
        let tag = start_tag(input.as_bytes(), 0, 1000).expect("start tag");
        assert_eq!(tag.self_closing, expected);
    }

    #[rstest]
    #[case("<1>")]
    #[case("< a>")]
    #[case("<a")]
    #[case("<a-b>")]
    fn not_a_start_tag(#[case] input: &str) {
        assert_eq!(start_tag(input.as_bytes(), 0, 1000), None);
    }

    #[test]
    fn end_tag_allows_trailing_space() {
        assert_eq!(end_tag(b"</ref >", 0).map(|e| e.span), Some(0..7));
        assert_eq!(end_tag(b"</ref x>", 0), None);
    }

    #[test]
    fn extension_tags_close_at_first_end_tag() {
        assert_eq!(
            ext("a<ref name=x>b</REF>c<references/><nowiki>"),
            vec!["<ref name=x>b</REF>", "<references/>", "<nowiki>"]
        );
    }

    #[test]
    fn html_tags_pair_innermost_first() {
        assert_eq!(
            html("<br><s><b>sb</b></s>"),
            vec![
                ("<br>", None),
                ("<s><b>sb</b></s>", Some("<b>sb</b>")),
                ("<b>sb</b>", Some("sb")),
            ]
        );
    }

    #[test]
    fn same_name_tags_pair_in_order() {
        assert_eq!(
            html("<s></s><s></s>"),
            vec![("<s></s>", Some("")), ("<s></s>", Some(""))]
        );
    }

    #[test]
    fn crossing_tags_demote_outer_start() {
        assert_eq!(
            html("<b><i></b></i>"),
            vec![("<b>", None), ("<i></b></i>", Some("</b>"))]
        );
    }

    #[test]
    fn unknown_names_are_ignored() {
        assert!(html("<foo>x</foo>").is_empty());
    }
}
