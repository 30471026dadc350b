//! Classification of matched `{{ }}`, `{{{ }}}` and `[[ ]]` pairs.

use std::ops::Range;

use wikispan_config::Config;
use wikispan_syntax::{PairKind, match_pairs};

use super::shadow::{self, MASK};
use crate::registry::NodeKind;

/// What the brace pass found in one slice (local ranges).
#[derive(Debug, Default)]
pub struct BraceScan {
    pub found: Vec<(NodeKind, Range<usize>)>,
    pub arguments: Vec<Range<usize>>,
    /// Inner region of every accepted pair with its shadow at the moment the
    /// pair was accepted (nested pairs already masked).
    pub regions: Vec<(Range<usize>, Vec<u8>)>,
}

const NAME_FORBIDDEN: &[u8] = b"[]<>{}\n";

/// Matches pairs on `shadow`, validates them innermost first and masks
/// every accepted pair so enclosing pairs only see their own separators.
pub fn recognize(text: &str, shadow: &mut [u8], config: &Config) -> BraceScan {
    let mut pairs = match_pairs(&shadow::as_str(shadow));
    pairs.sort_by_key(|p| p.span.end);

    let mut scan = BraceScan::default();
    for pair in pairs {
        let width = pair.kind.width();
        let inner = pair.span.start + width..pair.span.end - width;
        let kind = match pair.kind {
            PairKind::TripleBrace => Some(NodeKind::Parameter),
            PairKind::DoubleBrace => classify_double_brace(text, shadow, inner.clone(), config),
            PairKind::DoubleBracket => {
                is_wikilink(text, shadow, inner.clone(), config).then_some(NodeKind::WikiLink)
            }
        };
        let Some(kind) = kind else {
            continue;
        };
        if matches!(kind, NodeKind::Template | NodeKind::ParserFunction) {
            scan.arguments.extend(split_arguments(
                shadow,
                inner.clone(),
                kind == NodeKind::ParserFunction,
            ));
        }
        scan.regions.push((inner.clone(), shadow[inner].to_vec()));
        shadow::mask(shadow, pair.span.clone(), MASK);
        scan.found.push((kind, pair.span));
    }
    scan
}

/// End of the first segment of a brace or bracket body.
fn first_segment_end(shadow: &[u8], inner: &Range<usize>) -> usize {
    shadow[inner.clone()]
        .iter()
        .position(|&b| b == b'|')
        .map_or(inner.end, |p| inner.start + p)
}

fn trimmed(bytes: &[u8]) -> &[u8] {
    bytes.trim_ascii()
}

/// Decides between template and parser function for a `{{ }}` body, or
/// rejects it when the name cannot be a template name.
pub fn classify_double_brace(
    text: &str,
    shadow: &[u8],
    inner: Range<usize>,
    config: &Config,
) -> Option<NodeKind> {
    let seg_end = first_segment_end(shadow, &inner);
    let seg_text = &text[inner.start..seg_end];
    let forced_template = seg_text.trim_start().starts_with(':');

    if !forced_template {
        let colon = shadow[inner.start..seg_end].iter().position(|&b| b == b':');
        match colon {
            Some(c) => {
                let name = text[inner.start..inner.start + c].trim();
                if config.is_parser_function(name)
                    || config.is_parser_function(&name.to_lowercase())
                {
                    return Some(NodeKind::ParserFunction);
                }
            }
            None if config.is_magic_word(seg_text.trim()) => {
                return Some(NodeKind::ParserFunction);
            }
            None => {}
        }
    }

    let name = trimmed(&shadow[inner.start..seg_end]);
    let valid = !name.is_empty() && !name.iter().any(|b| NAME_FORBIDDEN.contains(b));
    valid.then_some(NodeKind::Template)
}

/// A `[[ ]]` body is a link when its target is non-empty, free of
/// structural characters and not an external URL.
pub fn is_wikilink(text: &str, shadow: &[u8], inner: Range<usize>, config: &Config) -> bool {
    let seg_end = first_segment_end(shadow, &inner);
    let target = trimmed(&shadow[inner.start..seg_end]);
    if target.is_empty() || target.iter().any(|b| NAME_FORBIDDEN.contains(b)) {
        return false;
    }
    let target_text = text[inner.start..seg_end].trim_start();
    config.url_scheme_len(target_text).is_none()
}

/// Argument ranges of a template or parser function body.
///
/// Each argument starts at its `|`; a parser function's first argument
/// starts at the `:` after its name.
pub fn split_arguments(shadow: &[u8], inner: Range<usize>, parser_function: bool) -> Vec<Range<usize>> {
    let mut seps: Vec<usize> = shadow[inner.clone()]
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'|')
        .map(|(i, _)| inner.start + i)
        .collect();
    if parser_function {
        let seg_end = seps.first().copied().unwrap_or(inner.end);
        if let Some(c) = shadow[inner.start..seg_end].iter().position(|&b| b == b':') {
            seps.insert(0, inner.start + c);
        }
    }
    seps.iter()
        .enumerate()
        .map(|(k, &start)| start..seps.get(k + 1).copied().unwrap_or(inner.end))
        .collect()
}
