//! # Snapshot Support
//!
//! Stable renderings of what a node contains, for `insta` snapshots and the
//! command-line outline, plus runtime invariant checks.
//!
//! - **`outline`**: one indented line per discovered construct
//! - **`normalize`**: the same data as a serializable [`Snap`]
//! - **`invariants`**: containment and bounds checks over every live span

pub mod invariants;

use serde::Serialize;

use crate::error::Result;
use crate::nodes::WikiNode;
use crate::registry::{NodeKind, SpanRecord, encloses};

pub use invariants::check as invariants;

/// Kinds listed in an outline, in rank order.
const OUTLINE_KINDS: &[NodeKind] = &[
    NodeKind::Section,
    NodeKind::Table,
    NodeKind::Row,
    NodeKind::Cell,
    NodeKind::WikiList,
    NodeKind::Tag,
    NodeKind::Template,
    NodeKind::ParserFunction,
    NodeKind::Parameter,
    NodeKind::WikiLink,
    NodeKind::Argument,
    NodeKind::ExternalLink,
    NodeKind::Comment,
    NodeKind::Italic,
    NodeKind::Bold,
];

const PREVIEW_LEN: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snap {
    pub nodes: Vec<NodeSnap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnap {
    pub kind: String,
    pub span: (usize, usize),
    /// Number of listed constructs enclosing this one.
    pub depth: usize,
    pub text: String,
}

/// Discovers everything inside `node` and lists it in document order.
pub fn normalize(node: &dyn WikiNode) -> Result<Snap> {
    let found = node.node().discover(OUTLINE_KINDS)?;
    let records = found
        .iter()
        .map(|n| n.record())
        .collect::<Result<Vec<SpanRecord>>>()?;

    let nodes = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let depth = records
                .iter()
                .enumerate()
                .filter(|&(j, outer)| j != i && encloses(outer, r))
                .count();
            NodeSnap {
                kind: r.kind.to_string(),
                span: (r.span.start, r.span.end),
                depth,
                text: preview(&node.node().slice(r.span), PREVIEW_LEN),
            }
        })
        .collect();
    Ok(Snap { nodes })
}

/// One-line form of `text`: newlines escaped, cut to `max` bytes on a char
/// boundary with a `...` suffix.
fn preview(text: &str, max: usize) -> String {
    let escaped = text.replace('\n', "\\n");
    if escaped.len() <= max {
        return escaped;
    }
    let cut = (0..=max).rev().find(|&i| escaped.is_char_boundary(i)).unwrap_or(0);
    format!("{}...", &escaped[..cut])
}

/// Renders [`normalize`] as `kind start..end "preview"` lines, indented two
/// spaces per level.
pub fn outline(node: &dyn WikiNode) -> Result<String> {
    let snap = normalize(node)?;
    let mut out = String::new();
    for n in &snap.nodes {
        out.push_str(&format!(
            "{}{} {}..{} \"{}\"\n",
            "  ".repeat(n.depth),
            n.kind,
            n.span.0,
            n.span.1,
            n.text
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, Template};

    #[test]
    fn outline_of_a_document() {
        let doc = Document::parse("{{a|{{b}}}} [[c]]");
        insta::assert_snapshot!(outline(&doc).expect("outline"), @r#"
        section 0..17 "{{a|{{b}}}} [[c]]"
          template 0..11 "{{a|{{b}}}}"
            argument 3..9 "|{{b}}"
              template 4..9 "{{b}}"
          wikilink 12..17 "[[c]]"
        "#);
        invariants(&doc);
    }

    #[test]
    fn outline_of_a_node_lists_only_its_contents() {
        let t = Template::new("{{a|''b''}}").expect("valid template");
        insta::assert_snapshot!(outline(&t).expect("outline"), @r#"italic 4..9 "''b''""#);
    }

    #[test]
    fn previews_escape_and_cut() {
        assert_eq!(preview("a\nb", 10), "a\\nb");
        assert_eq!(preview("hello world", 5), "hello...");
        assert_eq!(preview("aé", 2), "a...");
    }

    #[test]
    fn long_previews_are_cut() {
        let text = format!("[[{}]]", "x".repeat(100));
        let snap = normalize(&Document::parse(&text)).expect("snap");
        let link = &snap.nodes[1];
        assert_eq!(link.kind, "wikilink");
        assert!(link.text.ends_with("..."));
        assert_eq!(link.depth, 1);
    }
}
