//! # Pair Matcher - Counted Delimiter Matching
//!
//! Matches `{{ }}`, `{{{ }}}` and `[[ ]]`. Each delimiter family keeps its
//! own stack of unmatched openers, so an unbalanced opener of one family
//! never blocks a closer of the other.
//!
//! ## Algorithm
//!
//! Brackets are matched first. A closing run pairs with the bracket opener
//! on top of the bracket stack, two at a time.
//!
//! Braces are matched second. Every matched link pushes a barrier on the
//! brace stack when it opens and drops everything above that barrier when
//! it closes, so brace pairs never cross a link boundary:
//!
//! - three braces are taken when both runs have at least three left (a
//!   parameter), otherwise two (a template);
//! - a closer meeting a barrier is literal text.
//!
//! An opener whose remaining count drops below two is popped; leftover
//! delimiters stay literal. Unclosed openers at the end of input produce
//! nothing, but constructs already matched inside them are kept.

use std::ops::Range;

use crate::lexer::{Token, TokenKind, lex};

/// The delimiter family of a matched pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairKind {
    /// `{{ ... }}`: a template or parser function
    DoubleBrace,
    /// `{{{ ... }}}`: a template parameter
    TripleBrace,
    /// `[[ ... ]]`: a wikilink
    DoubleBracket,
}

impl PairKind {
    /// Width of the opening (and closing) delimiter.
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            PairKind::TripleBrace => 3,
            PairKind::DoubleBrace | PairKind::DoubleBracket => 2,
        }
    }
}

/// A matched delimiter pair covering `span` (delimiters included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub kind: PairKind,
    pub span: Range<usize>,
}

#[derive(Debug)]
struct Opener {
    start: usize,
    count: usize,
}

/// An entry of the brace stack.
#[derive(Debug)]
enum Slot {
    Open(Opener),
    /// Start of a matched link.
    Barrier,
}

/// Brace tokens and link boundaries in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Event {
    LinkClose,
    CloseBraces,
    OpenBraces,
    LinkOpen,
}

/// Match all delimiter pairs in `input`.
///
/// Results are ordered by ascending start, outer pairs before the pairs
/// they contain.
pub fn match_pairs(input: &str) -> Vec<Pair> {
    let tokens = lex(input);
    let links = match_links(&tokens);
    let mut pairs = match_braces(&tokens, &links);
    pairs.extend(links);

    pairs.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then(b.span.end.cmp(&a.span.end))
    });
    pairs
}

fn match_links(tokens: &[Token<'_>]) -> Vec<Pair> {
    let mut stack: Vec<Opener> = Vec::new();
    let mut links = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::OpenBrackets => stack.push(Opener {
                start: token.span.start,
                count: token.len(),
            }),
            TokenKind::CloseBrackets => {
                let mut pos = token.span.start;
                let mut remaining = token.len();
                while remaining >= 2 {
                    let Some(top) = stack.last_mut() else {
                        break;
                    };
                    links.push(Pair {
                        kind: PairKind::DoubleBracket,
                        span: top.start + top.count - 2..pos + 2,
                    });
                    top.count -= 2;
                    if top.count < 2 {
                        stack.pop();
                    }
                    pos += 2;
                    remaining -= 2;
                }
            }
            _ => {}
        }
    }
    links
}

fn match_braces(tokens: &[Token<'_>], links: &[Pair]) -> Vec<Pair> {
    let mut events: Vec<(usize, Event, Range<usize>)> = tokens
        .iter()
        .filter_map(|t| match t.kind {
            TokenKind::OpenBraces => Some((t.span.start, Event::OpenBraces, t.span.clone())),
            TokenKind::CloseBraces => Some((t.span.start, Event::CloseBraces, t.span.clone())),
            _ => None,
        })
        .collect();
    for link in links {
        events.push((link.span.start, Event::LinkOpen, link.span.clone()));
        events.push((link.span.end, Event::LinkClose, link.span.clone()));
    }
    events.sort_by_key(|(pos, event, _)| (*pos, *event));

    let mut stack: Vec<Slot> = Vec::new();
    let mut pairs = Vec::new();
    for (_, event, span) in events {
        match event {
            Event::LinkOpen => stack.push(Slot::Barrier),
            Event::LinkClose => {
                while let Some(slot) = stack.pop() {
                    if matches!(slot, Slot::Barrier) {
                        break;
                    }
                }
            }
            Event::OpenBraces => stack.push(Slot::Open(Opener {
                start: span.start,
                count: span.len(),
            })),
            Event::CloseBraces => close_braces(&mut stack, &mut pairs, span),
        }
    }
    pairs
}

fn close_braces(stack: &mut Vec<Slot>, pairs: &mut Vec<Pair>, run: Range<usize>) {
    let mut pos = run.start;
    let mut remaining = run.len();

    while remaining >= 2 {
        let Some(Slot::Open(top)) = stack.last_mut() else {
            break;
        };

        let (kind, width) = if top.count >= 3 && remaining >= 3 {
            (PairKind::TripleBrace, 3)
        } else {
            (PairKind::DoubleBrace, 2)
        };

        pairs.push(Pair {
            kind,
            span: top.start + top.count - width..pos + width,
        });

        top.count -= width;
        if top.count < 2 {
            stack.pop();
        }
        pos += width;
        remaining -= width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn spans(input: &str) -> Vec<(PairKind, &str)> {
        match_pairs(input)
            .into_iter()
            .map(|p| (p.kind, &input[p.span]))
            .collect()
    }

    #[test]
    fn simple_template() {
        assert_eq!(spans("a {{b}} c"), vec![(PairKind::DoubleBrace, "{{b}}")]);
    }

    #[test]
    fn nested_templates_close_innermost_first() {
        assert_eq!(
            spans("{{text|value1{{text|value2}}}}"),
            vec![
                (PairKind::DoubleBrace, "{{text|value1{{text|value2}}}}"),
                (PairKind::DoubleBrace, "{{text|value2}}"),
            ]
        );
    }

    #[rstest]
    #[case("{{{a}}}", vec![(PairKind::TripleBrace, "{{{a}}}")])]
    #[case("{{{a}}", vec![(PairKind::DoubleBrace, "{{a}}")])]
    #[case("{{{{a}}}", vec![(PairKind::TripleBrace, "{{{a}}}")])]
    #[case("{{{a}}}}}", vec![(PairKind::TripleBrace, "{{{a}}}")])]
    #[case("{{{{a}}}}", vec![(PairKind::TripleBrace, "{{{a}}}")])]
    fn brace_runs_split_like_mediawiki(
        #[case] input: &str,
        #[case] expected: Vec<(PairKind, &str)>,
    ) {
        assert_eq!(spans(input), expected);
    }

    #[test]
    fn pipe_and_braces_inside_link_do_not_close_template() {
        assert_eq!(
            spans("{{text |[[A|}}]] }}"),
            vec![
                (PairKind::DoubleBrace, "{{text |[[A|}}]] }}"),
                (PairKind::DoubleBracket, "[[A|}}]]"),
            ]
        );
    }

    #[test]
    fn unclosed_openers_keep_inner_pairs() {
        assert_eq!(spans("{{a|{{b}}"), vec![(PairKind::DoubleBrace, "{{b}}")]);
        assert_eq!(spans("[[a {{b}}"), vec![(PairKind::DoubleBrace, "{{b}}")]);
    }

    #[test]
    fn mismatched_closer_is_literal() {
        assert_eq!(spans("{{a]]}}"), vec![(PairKind::DoubleBrace, "{{a]]}}")]);
        assert_eq!(spans("[[a}}]]"), vec![(PairKind::DoubleBracket, "[[a}}]]")]);
    }

    #[rstest]
    #[case("{{a|[[b}}", vec![(PairKind::DoubleBrace, "{{a|[[b}}")])]
    #[case("{{a|[[x}} {{b}}", vec![(PairKind::DoubleBrace, "{{a|[[x}}"), (PairKind::DoubleBrace, "{{b}}")])]
    #[case("[[a|{{b]]", vec![(PairKind::DoubleBracket, "[[a|{{b]]")])]
    #[case("[[a|{{b]] c}}", vec![(PairKind::DoubleBracket, "[[a|{{b]]")])]
    #[case("{{a|[[b|{{c]] d}}", vec![(PairKind::DoubleBrace, "{{a|[[b|{{c]] d}}"), (PairKind::DoubleBracket, "[[b|{{c]]")])]
    fn unbalanced_openers_of_the_other_family_are_literal(
        #[case] input: &str,
        #[case] expected: Vec<(PairKind, &str)>,
    ) {
        assert_eq!(spans(input), expected);
    }

    #[test]
    fn adjacent_links_and_templates() {
        assert_eq!(
            spans("[[a]]{{b}}[[c]]"),
            vec![
                (PairKind::DoubleBracket, "[[a]]"),
                (PairKind::DoubleBrace, "{{b}}"),
                (PairKind::DoubleBracket, "[[c]]"),
            ]
        );
    }

    #[test]
    fn triple_bracket_leaves_outer_bracket_literal() {
        assert_eq!(spans("[[[a]]]"), vec![(PairKind::DoubleBracket, "[[a]]")]);
    }

    #[test]
    fn thousands_of_unbalanced_braces_stay_linear() {
        let input = "{{ ".repeat(5_000) + "}}}";
        let pairs = match_pairs(&input);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].kind, PairKind::DoubleBrace);
    }

    #[test]
    fn single_braces_are_ignored() {
        assert_eq!(spans("{a} [b]"), vec![]);
    }
}
