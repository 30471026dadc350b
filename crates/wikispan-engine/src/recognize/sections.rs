use std::ops::Range;

use super::shadow;

pub const MAX_LEVEL: usize = 6;

/// A heading line (local range, newline excluded) and its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub line: Range<usize>,
    pub level: usize,
}

/// A section: its range and level, `0` for the lead section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundSection {
    pub span: Range<usize>,
    pub level: usize,
}

/// Level of a `== title ==` line, if it is one.
///
/// The level is the shorter of the two `=` runs, capped at six, and the
/// runs must leave something between them.
pub fn heading_level(line: &[u8]) -> Option<usize> {
    let t = line.trim_ascii_end();
    let lead = t.iter().take_while(|&&b| b == b'=').count();
    let trail = t.iter().rev().take_while(|&&b| b == b'=').count();
    if lead == 0 || t.len() < 3 {
        return None;
    }
    let level = lead
        .min(trail)
        .min(MAX_LEVEL)
        .min((t.len() - 1) / 2);
    (level > 0).then_some(level)
}

/// Title range of a heading line, untrimmed.
pub fn title_range(line: &[u8], level: usize) -> Range<usize> {
    let t = line.trim_ascii_end();
    level..t.len() - level
}

pub fn headings(s: &[u8], at_line_start: bool) -> Vec<Heading> {
    shadow::line_ranges(s)
        .into_iter()
        .enumerate()
        .filter(|(k, _)| *k > 0 || at_line_start)
        .filter_map(|(_, line)| {
            heading_level(&s[line.clone()]).map(|level| Heading { line, level })
        })
        .collect()
}

/// Builds sections from headings in a region of `len` bytes.
///
/// With `include_subsections` a section ends at the next heading of the
/// same or a higher rank; otherwise at the next heading of any level. The
/// lead section (text before the first heading) is included when `lead`.
pub fn sections(
    len: usize,
    headings: &[Heading],
    include_subsections: bool,
    lead: bool,
) -> Vec<FoundSection> {
    let mut found = Vec::with_capacity(headings.len() + 1);
    if lead {
        let end = headings.first().map_or(len, |h| h.line.start);
        found.push(FoundSection {
            span: 0..end,
            level: 0,
        });
    }
    for (i, h) in headings.iter().enumerate() {
        let end = headings[i + 1..]
            .iter()
            .find(|next| !include_subsections || next.level <= h.level)
            .map_or(len, |next| next.line.start);
        found.push(FoundSection {
            span: h.line.start..end,
            level: h.level,
        });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("== a ==", Some(2))]
    #[case("=== a ==", Some(2))]
    #[case("= a =  ", Some(1))]
    #[case("======= a =======", Some(6))]
    #[case("====", Some(1))]
    #[case("==", None)]
    #[case("a == b ==", None)]
    #[case("== a", None)]
    fn levels(#[case] line: &str, #[case] expected: Option<usize>) {
        assert_eq!(heading_level(line.as_bytes()), expected);
    }

    #[test]
    fn title_is_between_level_runs() {
        let line = b"=== a ==";
        assert_eq!(&line[title_range(line, 2)], b"= a ");
    }

    #[test]
    fn sections_with_and_without_subsections() {
        let text = "lead\n== a ==\nx\n=== b ===\ny\n== c ==\nz";
        let hs = headings(text.as_bytes(), true);
        let spans = |incl| -> Vec<&str> {
            sections(text.len(), &hs, incl, true)
                .into_iter()
                .map(|s| &text[s.span])
                .collect()
        };
        assert_eq!(
            spans(true),
            vec![
                "lead\n",
                "== a ==\nx\n=== b ===\ny\n",
                "=== b ===\ny\n",
                "== c ==\nz"
            ]
        );
        assert_eq!(
            spans(false),
            vec!["lead\n", "== a ==\nx\n", "=== b ===\ny\n", "== c ==\nz"]
        );
    }

    #[test]
    fn lead_section_may_be_empty() {
        let hs = headings(b"== a ==", true);
        let found = sections(7, &hs, true, true);
        assert_eq!(found[0].span, 0..0);
        assert_eq!(found[1].span, 0..7);
    }
}
