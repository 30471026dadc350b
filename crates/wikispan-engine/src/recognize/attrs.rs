//! HTML-style attribute lists, as found in tags and table markup.

use std::collections::BTreeMap;
use std::ops::Range;

use super::cursor::Cursor;

/// One attribute, with local ranges into the scanned slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: Range<usize>,
    /// Value without its quotes; `None` for a bare attribute name.
    pub value: Option<Range<usize>>,
    pub quote: Option<u8>,
    /// Name through the closing quote (or the end of an unquoted value).
    pub span: Range<usize>,
}

/// Parses every attribute in `s`, stopping at a `>` outside quotes.
pub fn parse(s: &[u8]) -> Vec<Attr> {
    parse_until_close(s).0
}

/// Like [`parse`], also returning the local index of the terminating `>`
/// (`None` when the slice ends first).
pub fn parse_until_close(s: &[u8]) -> (Vec<Attr>, Option<usize>) {
    let mut cur = Cursor::new(s, 0);
    let mut attrs = Vec::new();

    loop {
        cur.eat_while(|b| b.is_ascii_whitespace() || b == b'/');
        match cur.peek() {
            None => return (attrs, None),
            Some(b'>') => return (attrs, Some(cur.i)),
            _ => {}
        }
        let name = cur.eat_while(|b| !b.is_ascii_whitespace() && !matches!(b, b'/' | b'>' | b'='));
        if name.is_empty() {
            // A stray `=`.
            cur.bump();
            continue;
        }

        let after_name = cur.i;
        cur.skip_ws();
        if cur.peek() != Some(b'=') {
            cur.i = after_name;
            attrs.push(Attr {
                span: name.clone(),
                name,
                value: None,
                quote: None,
            });
            continue;
        }
        cur.bump();
        cur.skip_ws();

        let (value, quote) = match cur.peek() {
            Some(q @ (b'"' | b'\'')) => {
                cur.bump();
                let value = cur.eat_while(|b| b != q);
                cur.bump();
                (value, Some(q))
            }
            _ => (cur.eat_while(|b| !b.is_ascii_whitespace() && b != b'>'), None),
        };
        attrs.push(Attr {
            span: name.start..cur.i.min(s.len()),
            name,
            value: Some(value),
            quote,
        });
    }
}

/// Builds a name to value map; later duplicates win.
pub fn to_map(text: &str, attrs: &[Attr]) -> BTreeMap<String, String> {
    attrs
        .iter()
        .map(|a| {
            let value = a.value.clone().map(|v| text[v].to_string()).unwrap_or_default();
            (text[a.name.clone()].to_string(), value)
        })
        .collect()
}

/// The last attribute named `name`.
pub fn find<'a>(text: &str, attrs: &'a [Attr], name: &str) -> Option<&'a Attr> {
    attrs.iter().rev().find(|a| &text[a.name.clone()] == name)
}

/// Renders `name="value"`, switching to single quotes when the value holds
/// a double quote.
pub fn render(name: &str, value: &str) -> String {
    if value.contains('"') {
        format!("{name}='{value}'")
    } else {
        format!("{name}=\"{value}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn pairs(s: &str) -> Vec<(String, Option<String>)> {
        parse(s.as_bytes())
            .into_iter()
            .map(|a| (s[a.name].to_string(), a.value.map(|v| s[v].to_string())))
            .collect()
    }

    #[test]
    fn quoted_unquoted_and_bare() {
        assert_eq!(
            pairs(r#" class="a b" id=x hidden style='c:d'"#),
            vec![
                ("class".into(), Some("a b".into())),
                ("id".into(), Some("x".into())),
                ("hidden".into(), None),
                ("style".into(), Some("c:d".into())),
            ]
        );
    }

    #[test]
    fn stops_at_closing_angle() {
        assert_eq!(pairs(r#"name="r" />tail x=y"#), vec![("name".into(), Some("r".into()))]);
    }

    #[rstest]
    #[case(r#"a = "1""#, "a", "1")]
    #[case("colspan=2", "colspan", "2")]
    #[case(r#"a="x>y""#, "a", "x>y")]
    fn value_forms(#[case] input: &str, #[case] name: &str, #[case] value: &str) {
        let map = to_map(input, &parse(input.as_bytes()));
        assert_eq!(map.get(name).map(String::as_str), Some(value));
    }

    #[test]
    fn later_duplicates_win() {
        let s = r#"a="1" a="2""#;
        let attrs = parse(s.as_bytes());
        assert_eq!(to_map(s, &attrs)["a"], "2");
        assert_eq!(find(s, &attrs, "a").map(|a| a.span.clone()), Some(6..11));
    }

    #[test]
    fn reports_close_position() {
        assert_eq!(parse_until_close(br#" a="x>" />"#).1, Some(9));
        assert_eq!(parse_until_close(b" a=1").1, None);
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        assert_eq!(pairs(r#"a="open"#), vec![("a".into(), Some("open".into()))]);
    }

    #[test]
    fn render_picks_quote() {
        assert_eq!(render("a", "b"), r#"a="b""#);
        assert_eq!(render("a", r#"say "hi""#), r#"a='say "hi"'"#);
    }
}
