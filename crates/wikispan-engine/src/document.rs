//! The shared state behind a parsed document and the handles into it.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;

use wikispan_config::Config;

use crate::buffer::{Buffer, Span};
use crate::error::{Error, Result};
use crate::nodes::tag::TagParts;
use crate::recognize::{Found, Recognizer, Scan};
use crate::registry::{Detail, NodeKind, SpanId, SpanRecord, SpanRegistry};

/// Kinds discovered from the root before ancestors are computed.
pub(crate) const ANCESTOR_KINDS: &[NodeKind] = &[
    NodeKind::Template,
    NodeKind::ParserFunction,
    NodeKind::Parameter,
    NodeKind::WikiLink,
    NodeKind::Comment,
    NodeKind::Tag,
];

/// Buffer, registry and recognizer of one document.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) buffer: Buffer,
    pub(crate) registry: SpanRegistry,
    pub(crate) recognizer: Recognizer,
    /// Bumped on every buffer change; keys per-node caches.
    pub(crate) version: u64,
    pub(crate) root: SpanId,
}

impl Shared {
    fn new(text: &str, root_kind: NodeKind, config: Arc<Config>) -> Self {
        let buffer = Buffer::new(text);
        let (registry, root) = SpanRegistry::with_root(root_kind, Span::new(0, buffer.len()));
        Shared {
            buffer,
            registry,
            recognizer: Recognizer::new(config),
            version: 0,
            root,
        }
    }

    fn record(&self, id: SpanId) -> Result<&SpanRecord> {
        self.registry
            .get(id)
            .ok_or(Error::DeadAccess { kind: id.kind() })
    }

    /// Replaces `local` (relative to the span of `id`) with `text`.
    ///
    /// Replacing text with itself leaves every span untouched.
    fn edit_within(&mut self, id: SpanId, local: Range<usize>, text: &str) -> Result<()> {
        let span = self.record(id)?.span;
        let end = (span.start + local.end).min(span.end);
        let start = (span.start + local.start).min(end);
        if self.buffer.slice(Span::new(start, end)) == text {
            return Ok(());
        }
        self.buffer.replace(start..end, text);
        self.registry.relocate(id, start..end, text.len());
        self.version += 1;
        Ok(())
    }
}

/// A handle on one span record of a document.
///
/// Handles are cheap to clone and share the document's buffer; they are not
/// `Send`.
#[derive(Debug, Clone)]
pub struct NodeRef {
    shared: Rc<RefCell<Shared>>,
    id: SpanId,
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared) && self.id == other.id
    }
}

impl Eq for NodeRef {}

impl NodeRef {
    pub fn id(&self) -> SpanId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.id.kind()
    }

    pub fn is_alive(&self) -> bool {
        self.shared.borrow().registry.is_alive(self.id)
    }

    pub(crate) fn record(&self) -> Result<SpanRecord> {
        self.shared.borrow().record(self.id).cloned()
    }

    pub fn span(&self) -> Result<Span> {
        Ok(self.record()?.span)
    }

    pub(crate) fn detail(&self) -> Result<Detail> {
        Ok(self.record()?.detail)
    }

    pub(crate) fn set_detail(&self, detail: Detail) -> Result<()> {
        let mut shared = self.shared.borrow_mut();
        shared.record(self.id)?;
        shared.registry.set_detail(self.id, detail);
        Ok(())
    }

    /// Current text of the node.
    pub fn string(&self) -> Result<String> {
        let shared = self.shared.borrow();
        let span = shared.record(self.id)?.span;
        Ok(shared.buffer.slice(span).into_owned())
    }

    pub(crate) fn version(&self) -> u64 {
        self.shared.borrow().version
    }

    pub(crate) fn with_recognizer<R>(&self, f: impl FnOnce(&Recognizer) -> R) -> R {
        f(&self.shared.borrow().recognizer)
    }

    pub(crate) fn config(&self) -> Config {
        self.with_recognizer(|r| r.config().clone())
    }

    /// Replaces the node-relative `local` range with `text`.
    pub(crate) fn edit_within(&self, local: Range<usize>, text: &str) -> Result<()> {
        self.shared.borrow_mut().edit_within(self.id, local, text)
    }

    /// Inserts `text` at node-relative offset `at`.
    pub(crate) fn insert(&self, at: usize, text: &str) -> Result<()> {
        self.edit_within(at..at, text)
    }

    /// Replaces the whole text of the node.
    pub fn set_string(&self, text: &str) -> Result<()> {
        let len = self.span()?.len();
        self.edit_within(0..len, text)
    }

    /// Removes the node's text. The node itself dies, except for the root.
    pub fn delete(&self) -> Result<()> {
        self.set_string("")?;
        let mut shared = self.shared.borrow_mut();
        if self.id != shared.root {
            shared.registry.kill(self.id);
        }
        Ok(())
    }

    pub fn root(&self) -> NodeRef {
        let root = self.shared.borrow().root;
        self.with_id(root)
    }

    fn with_id(&self, id: SpanId) -> NodeRef {
        NodeRef {
            shared: Rc::clone(&self.shared),
            id,
        }
    }

    /// Registers a construct found in this document.
    pub(crate) fn register(&self, kind: NodeKind, span: Span, detail: Detail) -> Option<NodeRef> {
        let id = self
            .shared
            .borrow_mut()
            .registry
            .register(kind, span, detail)?;
        Some(self.with_id(id))
    }

    pub(crate) fn adopt(&self, found: &Found) -> Option<NodeRef> {
        self.register(found.kind, found.span, found.detail.clone())
    }

    /// Absolute range scanned for descendants, or `None` when the node
    /// cannot hold any.
    pub(crate) fn query_region(&self) -> Result<Option<Span>> {
        let span = self.span()?;
        let len = span.len();
        let local = match self.kind() {
            NodeKind::Template | NodeKind::ParserFunction | NodeKind::WikiLink => {
                Some(inner(len, 2, 2))
            }
            NodeKind::Parameter => Some(inner(len, 3, 3)),
            NodeKind::Argument => Some(inner(len, 1, 0)),
            NodeKind::Comment => None,
            NodeKind::ExternalLink => {
                let text = self.string()?;
                text.starts_with('[').then(|| inner(len, 1, 1))
            }
            NodeKind::Tag => {
                let text = self.string()?;
                let config = self.config();
                TagParts::parse(&text).and_then(|parts| {
                    let name = parts.name(&text);
                    let opaque = config.is_extension_tag(name) && !config.is_parsable_tag(name);
                    if opaque { None } else { parts.content }
                })
            }
            _ => Some(0..len),
        };
        Ok(local.map(|r| Span::new(span.start + r.start, span.start + r.end)))
    }

    /// Scans the node's query region.
    pub(crate) fn scan(&self) -> Result<Option<Scan>> {
        let Some(region) = self.query_region()? else {
            return Ok(None);
        };
        let lead = self.kind() == NodeKind::Document;
        let shared = self.shared.borrow();
        let text = shared.buffer.slice(region);
        let at_line_start = shared.buffer.is_line_start(region.start);
        Ok(Some(shared.recognizer.scan(&text, region.start, at_line_start, lead)))
    }

    /// True when `found` lies inside this node and is not the node itself
    /// or an outer construct over the same bytes.
    fn holds(record: &SpanRecord, found: &Found) -> bool {
        record.span.contains(found.span)
            && (found.span != record.span || found.kind.rank() > record.kind.rank())
    }

    fn adopt_all<'a>(&self, found: impl Iterator<Item = &'a Found>) -> Result<Vec<NodeRef>> {
        let record = self.record()?;
        Ok(found
            .filter(|f| Self::holds(&record, f))
            .filter_map(|f| self.adopt(f))
            .collect())
    }

    /// Discovers and registers descendants of the given kinds, in document
    /// order.
    pub(crate) fn discover(&self, kinds: &[NodeKind]) -> Result<Vec<NodeRef>> {
        let Some(scan) = self.scan()? else {
            return Ok(Vec::new());
        };
        let mut nodes = self.adopt_all(scan.found.iter().filter(|f| kinds.contains(&f.kind)))?;
        if kinds.contains(&NodeKind::Section) {
            nodes.extend(self.adopt_all(scan.sections(true).iter())?);
            self.sort(&mut nodes);
        }
        log::debug!("{:?} query for {kinds:?}: {} nodes", self.kind(), nodes.len());
        Ok(nodes)
    }

    pub(crate) fn discover_sections(&self, include_subsections: bool) -> Result<Vec<NodeRef>> {
        let Some(scan) = self.scan()? else {
            return Ok(Vec::new());
        };
        self.adopt_all(scan.sections(include_subsections).iter())
    }

    /// Discovers lists found with `pattern`.
    pub(crate) fn discover_lists(&self, pattern: &str) -> Result<Vec<NodeRef>> {
        let Some(region) = self.query_region()? else {
            return Ok(Vec::new());
        };
        let found = {
            let shared = self.shared.borrow();
            let text = shared.buffer.slice(region);
            let at_line_start = shared.buffer.is_line_start(region.start);
            shared
                .recognizer
                .lists(&text, region.start, at_line_start, pattern)
                .map_err(|e| Error::malformed(NodeKind::WikiList, e.to_string()))?
        };
        self.adopt_all(found.iter())
    }

    /// Sorts handles by document order, outer kinds first on equal spans.
    pub(crate) fn sort(&self, nodes: &mut [NodeRef]) {
        let shared = self.shared.borrow();
        let key = |n: &NodeRef| {
            let span = shared
                .registry
                .get(n.id)
                .map(|r| r.span)
                .unwrap_or_default();
            (span.start, std::cmp::Reverse(span.end), n.kind().rank())
        };
        nodes.sort_by_key(key);
    }

    /// Live registered nodes enclosing this one, narrowest first, without
    /// the root.
    pub(crate) fn enclosing(&self) -> Result<Vec<NodeRef>> {
        self.span()?;
        let ids = self.shared.borrow().registry.enclosing(self.id);
        Ok(ids
            .into_iter()
            .filter(|id| id.kind() != NodeKind::Document)
            .map(|id| self.with_id(id))
            .collect())
    }

    /// Enclosing nodes after discovering `kinds` from the root.
    pub(crate) fn ancestors_of(&self, kind: Option<NodeKind>) -> Result<Vec<NodeRef>> {
        self.span()?;
        let root = self.root();
        let kinds: Vec<NodeKind> = match kind {
            Some(kind) => vec![kind],
            None => ANCESTOR_KINDS.to_vec(),
        };
        root.discover(&kinds)?;
        Ok(self
            .enclosing()?
            .into_iter()
            .filter(|n| kinds.contains(&n.kind()))
            .collect())
    }

    /// Text of an absolute span of the buffer.
    pub(crate) fn slice(&self, span: Span) -> String {
        self.shared.borrow().buffer.slice(span).into_owned()
    }

    /// The root of a new buffer holding `text`, registered as `kind`.
    pub(crate) fn standalone(text: &str, kind: NodeKind, config: Arc<Config>) -> NodeRef {
        let shared = Rc::new(RefCell::new(Shared::new(text, kind, config)));
        let root = shared.borrow().root;
        NodeRef { shared, id: root }
    }
}

/// Local range between an opening and a closing delimiter, clamped.
pub(crate) fn inner(len: usize, open: usize, close: usize) -> Range<usize> {
    let start = open.min(len);
    start..len.saturating_sub(close).max(start)
}

/// Builds a node of `kind` from `text`, which must denote exactly one such
/// construct.
pub(crate) fn construct(text: &str, kind: NodeKind, config: Arc<Config>) -> Result<NodeRef> {
    let root = NodeRef::standalone(text, NodeKind::Document, config);
    let whole = Span::new(0, text.len());
    let candidates = match kind {
        NodeKind::Section => root.discover_sections(true)?,
        _ => root.discover(&[kind])?,
    };
    candidates
        .into_iter()
        .find(|n| n.span().is_ok_and(|s| s == whole))
        .ok_or_else(|| Error::malformed(kind, format!("{text:?} is not a single {kind}")))
}

/// The root document of a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub(crate) node: NodeRef,
}

impl Document {
    /// Parses `text` with the built-in configuration.
    pub fn parse(text: &str) -> Self {
        Self::parse_with_config(text, Arc::new(Config::default()))
    }

    pub fn parse_with_config(text: &str, config: Arc<Config>) -> Self {
        log::debug!("parsing document of {} bytes", text.len());
        Document {
            node: NodeRef::standalone(text, NodeKind::Document, config),
        }
    }

    /// The whole buffer.
    pub fn text(&self) -> String {
        self.node.shared.borrow().buffer.text()
    }

    /// Number of buffer changes so far.
    pub fn version(&self) -> u64 {
        self.node.version()
    }

    /// Number of live span records, the root included.
    pub fn live_spans(&self) -> usize {
        self.node.shared.borrow().registry.len()
    }

    /// Every live record with its span.
    pub(crate) fn live_records(&self) -> Vec<(SpanId, SpanRecord)> {
        self.node
            .shared
            .borrow()
            .registry
            .live()
            .map(|(id, r)| (id, r.clone()))
            .collect()
    }

    pub(crate) fn buffer_len(&self) -> usize {
        self.node.shared.borrow().buffer.len()
    }
}

impl From<NodeRef> for Document {
    fn from(node: NodeRef) -> Self {
        Document { node }
    }
}
