//! HTML and extension tags.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::document::Document;
use crate::error::Result;
use crate::nodes::{Memo, WikiNode, construct};
use crate::recognize::attrs::{self, Attr};
use crate::recognize::shadow;
use crate::recognize::tags::{end_tag, start_tag};
use crate::registry::NodeKind;

wrapper!(
    /// `<name attrs>contents</name>`, `<name/>` or a lone start tag.
    Tag,
    NodeKind::Tag,
    parts: Memo<TagParts>
);

/// Local layout of a tag's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagParts {
    pub name: Range<usize>,
    pub attrs: Vec<Attr>,
    /// Where a new attribute is inserted.
    pub attrs_end: usize,
    pub start_end: usize,
    pub self_closing: bool,
    /// Between the start and the end tag; `None` without an end tag.
    pub content: Option<Range<usize>>,
    pub end_name: Option<Range<usize>>,
}

impl TagParts {
    /// Parses a text that starts with a start tag. The end tag, when any,
    /// must close the text and carry the same name.
    pub(crate) fn parse(text: &str) -> Option<TagParts> {
        let s = shadow::ascii(text);
        let start = start_tag(&s, 0, s.len())?;
        let name = &s[start.name.clone()];
        let end = if start.self_closing {
            None
        } else {
            s.windows(2)
                .enumerate()
                .rev()
                .filter(|(i, w)| *w == b"</" && *i >= start.span.end)
                .find_map(|(i, _)| end_tag(&s, i).filter(|e| e.span.end == s.len()))
                .filter(|e| s[e.name.clone()].eq_ignore_ascii_case(name))
        };
        let attrs_end = start.attrs.last().map_or(start.name.end, |a| a.span.end);
        Some(TagParts {
            attrs_end,
            start_end: start.span.end,
            self_closing: start.self_closing,
            content: end.as_ref().map(|e| start.span.end..e.span.start),
            end_name: end.map(|e| e.name),
            name: start.name,
            attrs: start.attrs,
        })
    }

    pub(crate) fn name<'a>(&self, text: &'a str) -> &'a str {
        &text[self.name.clone()]
    }
}

impl Tag {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::Tag)
    }

    fn parts(&self) -> Result<(String, TagParts)> {
        let text = self.string()?;
        let parts = self.parts.get(self.node.version(), || {
            Ok(TagParts::parse(&text).unwrap_or(TagParts {
                name: 0..0,
                attrs: Vec::new(),
                attrs_end: 0,
                start_end: 0,
                self_closing: false,
                content: None,
                end_name: None,
            }))
        })?;
        Ok((text, parts))
    }

    /// The tag name with its original casing.
    pub fn name(&self) -> Result<String> {
        let (text, parts) = self.parts()?;
        Ok(parts.name(&text).to_string())
    }

    /// Renames the start tag and the end tag.
    pub fn set_name(&self, name: &str) -> Result<()> {
        let (_, parts) = self.parts()?;
        if let Some(end_name) = parts.end_name {
            self.node.edit_within(end_name, name)?;
        }
        self.node.edit_within(parts.name, name)
    }

    pub fn is_self_closing(&self) -> Result<bool> {
        Ok(self.parts()?.1.self_closing)
    }

    /// Text between the start and the end tag.
    pub fn contents(&self) -> Result<Option<String>> {
        let (text, parts) = self.parts()?;
        Ok(parts.content.map(|c| text[c].to_string()))
    }

    /// Replaces the contents. A self-closing tag gets an end tag; a lone
    /// start tag is left alone.
    pub fn set_contents(&self, contents: &str) -> Result<()> {
        let (text, parts) = self.parts()?;
        match parts.content {
            Some(range) => self.node.edit_within(range, contents),
            None if parts.self_closing => {
                let name = parts.name(&text);
                let slash = text[..parts.start_end - 1].trim_end().len() - 1;
                let close = text[..slash].trim_end().len();
                self.node
                    .edit_within(close..parts.start_end, &format!(">{contents}</{name}>"))
            }
            None => Ok(()),
        }
    }

    /// A copy of the contents parsed as a document of its own.
    pub fn parsed_contents(&self) -> Result<Document> {
        let contents = self.contents()?.unwrap_or_default();
        Ok(Document::parse_with_config(
            &contents,
            std::sync::Arc::new(self.node.config()),
        ))
    }

    /// Attribute map; later duplicates win.
    pub fn attrs(&self) -> Result<BTreeMap<String, String>> {
        let (text, parts) = self.parts()?;
        Ok(attrs::to_map(&text, &parts.attrs))
    }

    /// Value of the last attribute named `name`; bare attributes read as
    /// empty.
    pub fn get_attr(&self, name: &str) -> Result<Option<String>> {
        let (text, parts) = self.parts()?;
        Ok(attrs::find(&text, &parts.attrs, name)
            .map(|a| a.value.clone().map(|v| text[v].to_string()).unwrap_or_default()))
    }

    pub fn has_attr(&self, name: &str) -> Result<bool> {
        let (text, parts) = self.parts()?;
        Ok(attrs::find(&text, &parts.attrs, name).is_some())
    }

    /// Sets the last attribute named `name`, or appends it.
    pub fn set_attr(&self, name: &str, value: &str) -> Result<()> {
        let (text, parts) = self.parts()?;
        match attrs::find(&text, &parts.attrs, name) {
            Some(attr) => self.node.edit_within(attr.span.clone(), &attrs::render(name, value)),
            None if value.is_empty() => self.node.insert(parts.attrs_end, &format!(" {name}")),
            None => self
                .node
                .insert(parts.attrs_end, &format!(" {}", attrs::render(name, value))),
        }
    }

    /// Deletes every attribute named `name`.
    pub fn del_attr(&self, name: &str) -> Result<()> {
        let (text, parts) = self.parts()?;
        for attr in parts.attrs.iter().rev() {
            if &text[attr.name.clone()] == name {
                let lead = text[..attr.span.start].trim_end().len();
                self.node.edit_within(lead..attr.span.end, "")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WikiNode;
    use pretty_assertions::assert_eq;

    fn tag(text: &str) -> Tag {
        Tag::new(text).expect("valid tag")
    }

    #[test]
    fn parts_of_a_paired_tag() {
        let t = tag(r#"<ref name="a" group=b>x</REF>"#);
        assert_eq!(t.name().as_deref(), Ok("ref"));
        assert_eq!(t.contents(), Ok(Some("x".to_string())));
        assert_eq!(t.get_attr("name"), Ok(Some("a".to_string())));
        assert_eq!(t.get_attr("group"), Ok(Some("b".to_string())));
        assert_eq!(t.is_self_closing(), Ok(false));
    }

    #[test]
    fn rename_changes_both_tags() {
        let t = tag("<b>x</b>");
        t.set_name("i").expect("edit");
        assert_eq!(t.string().as_deref(), Ok("<i>x</i>"));
    }

    #[test]
    fn self_closing_tag_expands() {
        let t = tag("<references />");
        assert_eq!(t.contents(), Ok(None));
        t.set_contents("c").expect("edit");
        assert_eq!(t.string().as_deref(), Ok("<references>c</references>"));
        assert_eq!(t.contents(), Ok(Some("c".to_string())));
    }

    #[test]
    fn attribute_edits() {
        let t = tag("<span a=1 b=2 a=3>x</span>");
        assert_eq!(t.get_attr("a"), Ok(Some("3".to_string())));
        t.set_attr("a", "4").expect("edit");
        assert_eq!(t.string().as_deref(), Ok(r#"<span a=1 b=2 a="4">x</span>"#));
        t.set_attr("c", "5").expect("edit");
        t.set_attr("d", "").expect("edit");
        assert_eq!(t.string().as_deref(), Ok(r#"<span a=1 b=2 a="4" c="5" d>x</span>"#));
        t.del_attr("a").expect("edit");
        assert_eq!(t.string().as_deref(), Ok(r#"<span b=2 c="5" d>x</span>"#));
        assert_eq!(t.has_attr("a"), Ok(false));
        assert_eq!(t.has_attr("d"), Ok(true));
    }

    #[test]
    fn parsed_contents_are_queryable() {
        let t = tag("<ref>{{cite|a}}</ref>");
        let inner = t.parsed_contents().expect("live");
        assert_eq!(inner.templates().expect("query").len(), 1);
        assert_eq!(t.templates().expect("query").len(), 1);
    }

    #[test]
    fn unparsable_tag_contents_are_opaque() {
        let t = tag("<nowiki>{{a}}</nowiki>");
        assert!(t.templates().expect("query").is_empty());
    }

    #[test]
    fn cached_parts_follow_edits() {
        let t = tag("<b>x</b>");
        assert_eq!(t.name().as_deref(), Ok("b"));
        t.set_string("<s>y</s>").expect("edit");
        assert_eq!(t.name().as_deref(), Ok("s"));
        assert_eq!(t.contents(), Ok(Some("y".to_string())));
    }
}
