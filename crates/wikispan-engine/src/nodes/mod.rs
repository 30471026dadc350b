//! Typed views over registered spans.
//!
//! Every wrapper holds a [`NodeRef`] and nothing else that outlives an edit:
//! accessors locate their delimiters in the node's current text on each
//! call, and write back through [`NodeRef::edit_within`]. Behaviour shared by
//! all kinds lives on [`WikiNode`].

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use wikispan_config::Config;

use crate::buffer::Span;
use crate::document::{Document, NodeRef};
use crate::error::{Error, Result};
use crate::recognize::shadow::{self, MASK};
use crate::registry::NodeKind;
use crate::resolve::pformat;
use crate::resolve::plain_text::{self, PlainTextOptions};

/// Declares a wrapper type over a [`NodeRef`] of one kind.
macro_rules! wrapper {
    ($(#[$meta:meta])* $name:ident, $kind:expr $(, $field:ident: $ty:ty)*) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            node: $crate::document::NodeRef,
            $($field: $ty,)*
        }

        impl $name {
            pub const KIND: $crate::registry::NodeKind = $kind;
        }

        impl From<$crate::document::NodeRef> for $name {
            fn from(node: $crate::document::NodeRef) -> Self {
                $name {
                    node,
                    $($field: Default::default(),)*
                }
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.node == other.node
            }
        }

        impl Eq for $name {}

        impl $crate::nodes::WikiNode for $name {
            fn node(&self) -> &$crate::document::NodeRef {
                &self.node
            }
        }
    };
}

pub mod links;
pub mod list;
pub mod markup;
pub mod parameter;
pub mod section;
pub mod table;
pub mod tag;
pub mod template;

pub use links::{ExternalLink, WikiLink};
pub use list::WikiList;
pub use markup::{Bold, Comment, Italic};
pub use parameter::Parameter;
pub use section::Section;
pub use table::{Cell, Row, Table};
pub use tag::Tag;
pub use template::{Argument, NormalName, ParserFunction, SetArg, Template};

/// A value computed from a node's text, valid until the document changes.
pub(crate) struct Memo<T>(RefCell<Option<(u64, T)>>);

impl<T: Clone> Memo<T> {
    pub(crate) fn get(&self, version: u64, compute: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some((at, value)) = &*self.0.borrow() {
            if *at == version {
                return Ok(value.clone());
            }
        }
        let value = compute()?;
        *self.0.borrow_mut() = Some((version, value.clone()));
        Ok(value)
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Memo(RefCell::new(None))
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Memo::default()
    }
}

impl<T> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Memo")
    }
}

/// Whitespace that argument and cell values are stripped of.
pub(crate) const WS: &[char] = &['\r', '\n', '\t', ' '];

pub(crate) fn default_config() -> Arc<Config> {
    Arc::new(Config::default())
}

/// Shadow of `text` in which only `region` is recognized; everything
/// outside it is masked.
pub(crate) fn region_shadow(node: &NodeRef, text: &str, region: Range<usize>) -> Vec<u8> {
    let mut s = vec![MASK; text.len()];
    if let Some(inner) = text.get(region.clone()) {
        let inner_shadow = node.with_recognizer(|r| r.shadow(inner));
        s[region].copy_from_slice(&inner_shadow);
    }
    s
}

/// Local range of `text` without its surrounding whitespace.
pub(crate) fn trimmed_range(text: &str, range: Range<usize>) -> Range<usize> {
    let s = &text[range.clone()];
    let start = range.start + (s.len() - s.trim_start().len());
    let end = start + s.trim().len();
    start..end
}

fn typed<T: From<NodeRef>>(node: &NodeRef, kind: NodeKind) -> Result<Vec<T>> {
    Ok(node.discover(&[kind])?.into_iter().map(T::from).collect())
}

/// Any node of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Document(Document),
    Section(Section),
    Table(Table),
    Row(Row),
    Cell(Cell),
    WikiList(WikiList),
    Tag(Tag),
    Template(Template),
    ParserFunction(ParserFunction),
    Parameter(Parameter),
    WikiLink(WikiLink),
    Argument(Argument),
    ExternalLink(ExternalLink),
    Comment(Comment),
    Italic(Italic),
    Bold(Bold),
}

impl Node {
    pub(crate) fn from_ref(node: NodeRef) -> Node {
        match node.kind() {
            NodeKind::Document => Node::Document(Document::from(node)),
            NodeKind::Section => Node::Section(node.into()),
            NodeKind::Table => Node::Table(node.into()),
            NodeKind::Row => Node::Row(node.into()),
            NodeKind::Cell => Node::Cell(node.into()),
            NodeKind::WikiList => Node::WikiList(node.into()),
            NodeKind::Tag => Node::Tag(node.into()),
            NodeKind::Template => Node::Template(node.into()),
            NodeKind::ParserFunction => Node::ParserFunction(node.into()),
            NodeKind::Parameter => Node::Parameter(node.into()),
            NodeKind::WikiLink => Node::WikiLink(node.into()),
            NodeKind::Argument => Node::Argument(node.into()),
            NodeKind::ExternalLink => Node::ExternalLink(node.into()),
            NodeKind::Comment => Node::Comment(node.into()),
            NodeKind::Italic => Node::Italic(node.into()),
            NodeKind::Bold => Node::Bold(node.into()),
        }
    }

    pub fn as_wiki(&self) -> &dyn WikiNode {
        match self {
            Node::Document(n) => n,
            Node::Section(n) => n,
            Node::Table(n) => n,
            Node::Row(n) => n,
            Node::Cell(n) => n,
            Node::WikiList(n) => n,
            Node::Tag(n) => n,
            Node::Template(n) => n,
            Node::ParserFunction(n) => n,
            Node::Parameter(n) => n,
            Node::WikiLink(n) => n,
            Node::Argument(n) => n,
            Node::ExternalLink(n) => n,
            Node::Comment(n) => n,
            Node::Italic(n) => n,
            Node::Bold(n) => n,
        }
    }
}

impl WikiNode for Node {
    fn node(&self) -> &NodeRef {
        self.as_wiki().node()
    }
}

impl WikiNode for Document {
    fn node(&self) -> &NodeRef {
        &self.node
    }
}

/// Queries and edits shared by every node kind.
///
/// Collections are in document order and scoped to the node's own text.
pub trait WikiNode {
    fn node(&self) -> &NodeRef;

    fn kind(&self) -> NodeKind {
        self.node().kind()
    }

    /// Current text of the node; fails once the node is dead.
    fn string(&self) -> Result<String> {
        self.node().string()
    }

    fn set_string(&self, text: &str) -> Result<()> {
        self.node().set_string(text)
    }

    fn span(&self) -> Result<Span> {
        self.node().span()
    }

    fn is_alive(&self) -> bool {
        self.node().is_alive()
    }

    /// Removes the node's text from the document.
    fn delete(&self) -> Result<()> {
        self.node().delete()
    }

    /// Inserts `text` before the character at byte `index`. A negative
    /// index counts from the end; indexes out of range are clamped.
    fn insert(&self, index: isize, text: &str) -> Result<()> {
        let own = self.string()?;
        let len = own.len();
        let at = if index < 0 {
            len.saturating_sub(index.unsigned_abs())
        } else {
            index.unsigned_abs().min(len)
        };
        if !own.is_char_boundary(at) {
            return Err(Error::malformed(
                self.kind(),
                format!("byte {at} is inside a character"),
            ));
        }
        self.node().insert(at, text)
    }

    fn descendants(&self, kind: NodeKind) -> Result<Vec<Node>> {
        Ok(self
            .node()
            .discover(&[kind])?
            .into_iter()
            .map(Node::from_ref)
            .collect())
    }

    /// Enclosing templates, parser functions, parameters, wikilinks,
    /// comments and tags, narrowest first; or the enclosing nodes of `kind`.
    fn ancestors(&self, kind: Option<NodeKind>) -> Result<Vec<Node>> {
        Ok(self
            .node()
            .ancestors_of(kind)?
            .into_iter()
            .map(Node::from_ref)
            .collect())
    }

    fn parent(&self, kind: Option<NodeKind>) -> Result<Option<Node>> {
        Ok(self.ancestors(kind)?.into_iter().next())
    }

    fn templates(&self) -> Result<Vec<Template>> {
        typed(self.node(), NodeKind::Template)
    }

    fn parser_functions(&self) -> Result<Vec<ParserFunction>> {
        typed(self.node(), NodeKind::ParserFunction)
    }

    fn parameters(&self) -> Result<Vec<Parameter>> {
        typed(self.node(), NodeKind::Parameter)
    }

    fn wikilinks(&self) -> Result<Vec<WikiLink>> {
        typed(self.node(), NodeKind::WikiLink)
    }

    fn external_links(&self) -> Result<Vec<ExternalLink>> {
        typed(self.node(), NodeKind::ExternalLink)
    }

    fn comments(&self) -> Result<Vec<Comment>> {
        typed(self.node(), NodeKind::Comment)
    }

    /// Tags, optionally only those named `name` (case-insensitive).
    fn tags(&self, name: Option<&str>) -> Result<Vec<Tag>> {
        let tags: Vec<Tag> = typed(self.node(), NodeKind::Tag)?;
        let Some(name) = name else {
            return Ok(tags);
        };
        let mut named = Vec::new();
        for tag in tags {
            if tag.name()?.eq_ignore_ascii_case(name) {
                named.push(tag);
            }
        }
        Ok(named)
    }

    fn extension_tags(&self) -> Result<Vec<Tag>> {
        let config = self.node().config();
        let mut found = Vec::new();
        for tag in self.tags(None)? {
            if config.is_extension_tag(&tag.name()?) {
                found.push(tag);
            }
        }
        Ok(found)
    }

    fn tables(&self) -> Result<Vec<Table>> {
        typed(self.node(), NodeKind::Table)
    }

    /// Tables, or only those not nested in another table of this node.
    fn get_tables(&self, recursive: bool) -> Result<Vec<Table>> {
        let tables = self.tables()?;
        if recursive {
            return Ok(tables);
        }
        let spans = tables
            .iter()
            .map(|t| t.span())
            .collect::<Result<Vec<Span>>>()?;
        Ok(tables
            .into_iter()
            .zip(&spans)
            .filter(|(_, span)| !spans.iter().any(|o| o != *span && o.contains(**span)))
            .map(|(t, _)| t)
            .collect())
    }

    /// Lists found with the default patterns, or with `patterns`.
    fn lists(&self, patterns: Option<&[&str]>) -> Result<Vec<WikiList>> {
        let Some(patterns) = patterns else {
            return typed(self.node(), NodeKind::WikiList);
        };
        let mut nodes = Vec::new();
        for pattern in patterns {
            nodes.extend(self.node().discover_lists(pattern)?);
        }
        self.node().sort(&mut nodes);
        nodes.dedup();
        Ok(nodes.into_iter().map(WikiList::from).collect())
    }

    /// Sections, each running to the next heading of the same or a higher
    /// rank. On a document the lead section comes first.
    fn sections(&self) -> Result<Vec<Section>> {
        self.get_sections(true, None)
    }

    fn get_sections(&self, include_subsections: bool, level: Option<usize>) -> Result<Vec<Section>> {
        let sections = self
            .node()
            .discover_sections(include_subsections)?
            .into_iter()
            .map(Section::from);
        let Some(level) = level else {
            return Ok(sections.collect());
        };
        let mut found = Vec::new();
        for section in sections {
            if section.level()? == level {
                found.push(section);
            }
        }
        Ok(found)
    }

    fn bolds(&self) -> Result<Vec<Bold>> {
        typed(self.node(), NodeKind::Bold)
    }

    fn italics(&self) -> Result<Vec<Italic>> {
        typed(self.node(), NodeKind::Italic)
    }

    fn bolds_and_italics(&self) -> Result<Vec<Node>> {
        Ok(self
            .node()
            .discover(&[NodeKind::Bold, NodeKind::Italic])?
            .into_iter()
            .map(Node::from_ref)
            .collect())
    }

    /// Text with markup removed.
    fn plain_text(&self, options: &PlainTextOptions) -> Result<String> {
        plain_text::render(self.node(), options)
    }

    /// Text with templates and parser functions laid out one argument per
    /// line; see [`pformat::render`].
    fn pformat(&self, indent: &str, remove_comments: bool) -> Result<String> {
        pformat::render(self.node(), indent, remove_comments)
    }
}

/// Builds a wrapper of kind `T` from standalone text.
pub(crate) fn construct<T: From<NodeRef>>(text: &str, kind: NodeKind) -> Result<T> {
    crate::document::construct(text, kind, default_config()).map(T::from)
}

/// Fails with `Unsupported` for an operation the node cannot express.
pub(crate) fn unsupported<T>(kind: NodeKind, operation: &'static str) -> Result<T> {
    Err(Error::Unsupported { kind, operation })
}

/// Shadow of a whole text with nothing but comments and nested constructs
/// masked.
pub(crate) fn text_shadow(node: &NodeRef, text: &str) -> Vec<u8> {
    region_shadow(node, text, 0..text.len())
}

/// Position of the first `byte` in `s[range]`.
pub(crate) fn find_byte(s: &[u8], range: Range<usize>, byte: u8) -> Option<usize> {
    s.get(range.clone())?
        .iter()
        .position(|&b| b == byte)
        .map(|p| range.start + p)
}

/// Removes comments from `text`.
pub(crate) fn strip_comments(text: &str, max_scan: usize) -> String {
    let s = shadow::ascii(text);
    let mut out = String::with_capacity(text.len());
    let mut at = 0;
    for comment in crate::recognize::comments::find(&s, max_scan) {
        out.push_str(&text[at..comment.start]);
        at = comment.end;
    }
    out.push_str(&text[at..]);
    out
}
