//! Ordered, unordered and definition lists.

use std::ops::Range;

use crate::document::NodeRef;
use crate::error::{Error, Result};
use crate::nodes::{WikiNode, construct, default_config};
use crate::recognize::lists::{DEFAULT_PATTERNS, ListItems};
use crate::registry::{Detail, NodeKind};

wrapper!(
    /// Consecutive lines starting with a marker matched by the list's
    /// pattern.
    WikiList,
    NodeKind::WikiList
);

impl WikiList {
    /// A list found with `pattern`, or with the default patterns.
    pub fn new(text: &str, pattern: Option<&str>) -> Result<Self> {
        let Some(pattern) = pattern else {
            return construct(text, NodeKind::WikiList);
        };
        let root = NodeRef::standalone(text, NodeKind::Document, default_config());
        let whole = root.span()?;
        root.discover_lists(pattern)?
            .into_iter()
            .find(|n| n.span().is_ok_and(|s| s == whole))
            .map(WikiList::from)
            .ok_or_else(|| Error::malformed(NodeKind::WikiList, format!("{text:?} is not a single list")))
    }

    /// The pattern this list was found with.
    pub fn pattern(&self) -> Result<String> {
        Ok(match self.node.detail()? {
            Detail::List { pattern } => pattern,
            _ => String::new(),
        })
    }

    fn parsed(&self) -> Result<(String, ListItems)> {
        let text = self.string()?;
        let pattern = self.pattern()?;
        let items = self
            .node
            .with_recognizer(|r| r.list_items(&text, &pattern))
            .map_err(|e| Error::malformed(NodeKind::WikiList, e.to_string()))?;
        Ok((text, items))
    }

    /// Item texts without markers or sub-items.
    pub fn items(&self) -> Result<Vec<String>> {
        let (text, parsed) = self.parsed()?;
        Ok(parsed.items.into_iter().map(|r| text[r].to_string()).collect())
    }

    /// Items with their markers and sub-list lines.
    pub fn fullitems(&self) -> Result<Vec<String>> {
        let (text, parsed) = self.parsed()?;
        Ok(parsed.fullitems.into_iter().map(|r| text[r].to_string()).collect())
    }

    /// Length of the marker prefix; `* a` is level 1.
    pub fn level(&self) -> Result<usize> {
        let (_, parsed) = self.parsed()?;
        Ok(parsed.markers.first().map_or(0, Range::len))
    }

    /// Lists whose pattern extends this one by one of `patterns`. With `i`,
    /// only those inside the `i`th full item.
    pub fn sublists(&self, i: Option<usize>, patterns: Option<&[&str]>) -> Result<Vec<WikiList>> {
        let own = self.pattern()?;
        let start = self.span()?.start;
        let extent = match i {
            Some(i) => {
                let (_, parsed) = self.parsed()?;
                let len = parsed.fullitems.len();
                let item = parsed.fullitems.get(i).cloned().ok_or(Error::IndexOutOfRange {
                    kind: NodeKind::WikiList,
                    index: i,
                    len,
                })?;
                Some(item.start + start..item.end + start)
            }
            None => None,
        };

        let mut found = Vec::new();
        for pattern in patterns.unwrap_or(DEFAULT_PATTERNS) {
            for list in self.node.discover_lists(&format!("{own}{pattern}"))? {
                let span = list.span()?;
                let inside = extent
                    .as_ref()
                    .is_none_or(|e| e.start < span.start && span.end <= e.end);
                if inside {
                    found.push(list);
                }
            }
        }
        self.node.sort(&mut found);
        found.dedup();
        Ok(found.into_iter().map(WikiList::from).collect())
    }

    /// Sub-lists at every depth below this list.
    pub fn get_lists(&self, patterns: Option<&[&str]>) -> Result<Vec<WikiList>> {
        let mut found = Vec::new();
        let mut pending = self.sublists(None, patterns)?;
        while let Some(list) = pending.pop() {
            pending.extend(list.sublists(None, patterns)?);
            found.push(list.node);
        }
        self.node.sort(&mut found);
        found.dedup();
        Ok(found.into_iter().map(WikiList::from).collect())
    }

    /// Replaces every line's marker prefix with `marker`, sub-list lines
    /// included. Sub-list handles keep their old pattern.
    pub fn convert(&self, marker: &str) -> Result<()> {
        let (_, parsed) = self.parsed()?;
        for range in parsed.markers.into_iter().rev() {
            self.node.edit_within(range, marker)?;
        }
        self.node.set_detail(Detail::List {
            pattern: regex::escape(marker),
        })
    }
}
