use std::ops::Range;

use regex::Regex;
use wikispan_config::Config;

use super::shadow;

/// Bytes allowed in a URL after its scheme.
const URL_CHARS: &str = r#"[^\x00-\x20\x7f<>\[\]"{}|]"#;

/// Compiled external-link patterns for one URL-scheme list.
#[derive(Debug, Clone)]
pub struct LinkPatterns {
    bracket: Regex,
    bare: Regex,
}

impl LinkPatterns {
    pub fn new(config: &Config) -> Result<Self, regex::Error> {
        let schemes = config
            .url_schemes
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let bracket = Regex::new(&format!(
            r"(?i)\[(?:{schemes}|//){URL_CHARS}+(?:[ \t][^\]\n]*)?\]"
        ))?;
        let bare = Regex::new(&format!(r"(?i)\b(?:{schemes}){URL_CHARS}+"))?;
        Ok(Self { bracket, bare })
    }

    /// Finds bracketed and bare links in a link shadow (local ranges).
    ///
    /// `guards` are constructs a link may contain or avoid but never cross;
    /// a bracketed match crossing one falls back to its bare URL.
    pub fn find(&self, link_shadow: &[u8], guards: &[Range<usize>]) -> Vec<Range<usize>> {
        let s = shadow::as_str(link_shadow);
        let crosses_guard = |r: &Range<usize>| guards.iter().any(|g| super::crosses(g, r));

        let mut found: Vec<Range<usize>> = self
            .bracket
            .find_iter(&s)
            .map(|m| m.range())
            .filter(|r| !crosses_guard(r))
            .collect();

        let bare: Vec<Range<usize>> = self
            .bare
            .find_iter(&s)
            .map(|m| trim_bare_url(&s, m.range()))
            .filter(|r| !r.is_empty() && r.end - r.start > scheme_only_len(&s[r.clone()]))
            .filter(|r| !found.iter().any(|f| f.start <= r.start && r.end <= f.end))
            .filter(|r| !crosses_guard(r))
            .collect();
        found.extend(bare);
        found.sort_by_key(|r| r.start);
        found
    }
}

/// End of the URL that starts at `from` in a link shadow.
pub fn url_end(link_shadow: &[u8], from: usize) -> usize {
    let is_url_byte = |b: u8| b > 0x20 && b != 0x7f && !b"<>[]\"{}|".contains(&b);
    link_shadow
        .get(from..)
        .map_or(from, |rest| from + rest.iter().take_while(|&&b| is_url_byte(b)).count())
}

fn scheme_only_len(url: &str) -> usize {
    url.find(':').map_or(0, |c| {
        c + 1 + url[c + 1..].bytes().take_while(|&b| b == b'/').count()
    })
}

/// Applies the bare-URL end rules: stop before `''`, drop trailing
/// punctuation, and drop a trailing `)` unless the URL holds a `(`.
fn trim_bare_url(s: &str, range: Range<usize>) -> Range<usize> {
    let url = &s[range.clone()];
    let mut end = url.find("''").unwrap_or(url.len());
    loop {
        let Some(&last) = url.as_bytes()[..end].last() else {
            break;
        };
        let strip = matches!(last, b'.' | b',' | b';' | b':' | b'!' | b'?')
            || (last == b')' && !url[..end].contains('('));
        if !strip {
            break;
        }
        end -= 1;
    }
    range.start..range.start + end
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn links(text: &str) -> Vec<&str> {
        let patterns = LinkPatterns::new(&Config::default()).expect("patterns compile");
        patterns
            .find(text.as_bytes(), &[])
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    #[test]
    fn url_end_stops_at_space_and_bracket() {
        assert_eq!(url_end(b"[http://a.b c]", 1), 11);
        assert_eq!(url_end(b"[http://a.b]", 1), 11);
        assert_eq!(url_end(b"http://a.b", 0), 10);
    }

    #[rstest]
    #[case("see [https://wikimedia.org/ wm] now", vec!["[https://wikimedia.org/ wm]"])]
    #[case("[//example.org x]", vec!["[//example.org x]"])]
    #[case("[HTTP://a.b]", vec!["[HTTP://a.b]"])]
    #[case("a http://a.b/c. b", vec!["http://a.b/c"])]
    #[case("(http://a.b/c)", vec!["http://a.b/c"])]
    #[case("http://a.b/(c)", vec!["http://a.b/(c)"])]
    #[case("''http://a.b''", vec!["http://a.b"])]
    #[case("mailto:someone@example.org", vec!["mailto:someone@example.org"])]
    #[case("xhttp://a.b", vec![])]
    #[case("http://", vec![])]
    #[case("[[a]]", vec![])]
    fn finds(#[case] text: &str, #[case] expected: Vec<&str>) {
        assert_eq!(links(text), expected);
    }

    #[test]
    fn bracket_link_crossing_a_guard_falls_back_to_bare() {
        let text = "{{a|[http://x b}}]";
        let patterns = LinkPatterns::new(&Config::default()).expect("patterns compile");
        let found = patterns.find(text.as_bytes(), &[0..17]);
        assert_eq!(found, vec![5..13]);
    }
}
