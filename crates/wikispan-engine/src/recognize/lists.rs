//! List discovery and item structure.
//!
//! A list is a run of consecutive lines whose start matches the list's
//! pattern. Lines whose text after the marker starts with another marker
//! character belong to a sub-list of the preceding item.

use std::ops::Range;

use regex::Regex;

use super::shadow;

/// Patterns used when the caller gives none.
pub const DEFAULT_PATTERNS: &[&str] = &[r"\#", r"\*", "[:;]"];

const SUB_MARKERS: &[u8] = b":;#*";

/// Compiles a list pattern anchored at the line start.
pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

fn marker_len(re: &Regex, line: &[u8]) -> Option<usize> {
    re.find(&shadow::as_str(line))
        .map(|m| m.end())
        .filter(|&len| len > 0)
}

fn with_newline(s: &[u8], end: usize) -> usize {
    if s.get(end) == Some(&b'\n') { end + 1 } else { end }
}

/// Finds lists in a shadow (local ranges, each ending after the newline of
/// its last line when there is one).
pub fn find(s: &[u8], at_line_start: bool, re: &Regex) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut current: Option<Range<usize>> = None;
    for (k, line) in shadow::line_ranges(s).into_iter().enumerate() {
        let is_item = (k > 0 || at_line_start) && marker_len(re, &s[line.clone()]).is_some();
        match (is_item, current.as_mut()) {
            (true, Some(list)) => list.end = with_newline(s, line.end),
            (true, None) => current = Some(line.start..with_newline(s, line.end)),
            (false, _) => found.extend(current.take()),
        }
    }
    found.extend(current);
    found.retain(|r| !r.is_empty());
    found
}

/// Items of one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItems {
    /// Item text after the marker, newline excluded.
    pub items: Vec<Range<usize>>,
    /// Each item with its marker and the sub-list lines that follow it.
    pub fullitems: Vec<Range<usize>>,
    /// Marker range of every line, sub-list lines included.
    pub markers: Vec<Range<usize>>,
}

/// Splits the list in `s` into items. A definition line (`;term:def`)
/// yields two items.
pub fn items(s: &[u8], re: &Regex) -> ListItems {
    let mut out = ListItems::default();
    let mut current: Option<usize> = None;

    for line in shadow::line_ranges(s) {
        let text = &s[line.clone()];
        let Some(len) = marker_len(re, text) else {
            continue;
        };
        out.markers.push(line.start..line.start + len);
        let rest = line.start + len;
        let line_end = with_newline(s, line.end);

        if s.get(rest).is_some_and(|b| SUB_MARKERS.contains(b)) {
            match current {
                Some(i) => out.fullitems[i].end = line_end,
                None => {
                    out.items.push(rest..rest);
                    out.fullitems.push(line.start..line_end);
                    current = Some(out.fullitems.len() - 1);
                }
            }
            continue;
        }

        out.fullitems.push(line.start..line_end);
        current = Some(out.fullitems.len() - 1);
        let definition = text[..len].trim_ascii_end().last() == Some(&b';');
        let colon = definition
            .then(|| s[rest..line.end].iter().position(|&b| b == b':'))
            .flatten()
            .map(|p| rest + p);
        match colon {
            Some(c) => {
                out.items.push(rest..c);
                out.items.push(c + 1..line.end);
                out.fullitems.push(c..line.end);
            }
            None => out.items.push(rest..line.end),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lists<'a>(text: &'a str, pattern: &str) -> Vec<&'a str> {
        let re = compile(pattern).expect("pattern");
        find(text.as_bytes(), true, &re)
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    fn item_texts<'a>(text: &'a str, pattern: &str) -> (Vec<&'a str>, Vec<&'a str>) {
        let re = compile(pattern).expect("pattern");
        let parsed = items(text.as_bytes(), &re);
        (
            parsed.items.into_iter().map(|r| &text[r]).collect(),
            parsed.fullitems.into_iter().map(|r| &text[r]).collect(),
        )
    }

    #[test]
    fn consecutive_lines_form_one_list() {
        assert_eq!(lists("*a\n*b\nx\n*c", r"\*"), vec!["*a\n*b\n", "*c"]);
    }

    #[test]
    fn first_line_of_a_nested_region_is_not_a_line_start() {
        let re = compile(r"\*").expect("pattern");
        assert!(find(b"*a", false, &re).is_empty());
    }

    #[test]
    fn definition_line_gives_two_items() {
        let (items, full) = item_texts("; Item 1 : definition 1\n", r"[:;]\s*");
        assert_eq!(items, vec!["Item 1 ", " definition 1"]);
        assert_eq!(full, vec!["; Item 1 : definition 1\n", ": definition 1"]);
    }

    #[test]
    fn mixed_definition_lists() {
        let text = "; Mixed definition lists\n\
                    ; item 1 : definition\n\
                    :; sub-item 1 plus term\n\
                    :: two colons plus definition\n\
                    :; sub-item 2 : colon plus definition\n\
                    ; item 2 \n\
                    : back to the main list\n";
        let (items, _) = item_texts(text, r"[:;]\s*");
        assert_eq!(
            items,
            vec![
                "Mixed definition lists",
                "item 1 ",
                " definition",
                "item 2 ",
                "back to the main list"
            ]
        );
    }

    #[test]
    fn leading_sub_line_makes_an_empty_first_item() {
        let (items, full) = item_texts("###b\n###c\n##d\n#e", r"\#");
        assert_eq!(items, vec!["", "e"]);
        assert_eq!(full, vec!["###b\n###c\n##d\n", "#e"]);
    }
}
