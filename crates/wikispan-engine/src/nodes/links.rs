//! Internal and external links.

use std::ops::Range;

use crate::document::inner;
use crate::error::Result;
use crate::nodes::{WikiNode, construct, find_byte, region_shadow, text_shadow};
use crate::recognize::external_links::url_end;
use crate::registry::NodeKind;

wrapper!(
    /// `[[target#fragment|text]]`.
    WikiLink,
    NodeKind::WikiLink
);

wrapper!(
    /// A bare URL or `[url text]`.
    ExternalLink,
    NodeKind::ExternalLink
);

/// Local layout of a wikilink.
struct Parts {
    text: String,
    target: Range<usize>,
    title: Range<usize>,
    /// After the `#`.
    fragment: Option<Range<usize>>,
    /// After the `|`.
    label: Option<Range<usize>>,
}

impl WikiLink {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::WikiLink)
    }

    fn parts(&self) -> Result<Parts> {
        let text = self.string()?;
        let body = inner(text.len(), 2, 2);
        let s = region_shadow(&self.node, &text, body.clone());
        let pipe = find_byte(&s, body.clone(), b'|');
        let target = body.start..pipe.unwrap_or(body.end);
        let hash = find_byte(&s, target.clone(), b'#');
        Ok(Parts {
            title: target.start..hash.unwrap_or(target.end),
            fragment: hash.map(|h| h + 1..target.end),
            label: pipe.map(|p| p + 1..body.end),
            target,
            text,
        })
    }

    /// Title and fragment, without the text.
    pub fn target(&self) -> Result<String> {
        let parts = self.parts()?;
        Ok(parts.text[parts.target].to_string())
    }

    pub fn set_target(&self, target: &str) -> Result<()> {
        self.node.edit_within(self.parts()?.target, target)
    }

    /// Removes the target, and the pipe after it when there is text.
    pub fn delete_target(&self) -> Result<()> {
        let parts = self.parts()?;
        let end = parts.target.end + usize::from(parts.label.is_some());
        self.node.edit_within(parts.target.start..end, "")
    }

    pub fn title(&self) -> Result<String> {
        let parts = self.parts()?;
        Ok(parts.text[parts.title].to_string())
    }

    pub fn set_title(&self, title: &str) -> Result<()> {
        self.node.edit_within(self.parts()?.title, title)
    }

    /// Removes the title, and the `#` after it when there is a fragment.
    pub fn delete_title(&self) -> Result<()> {
        let parts = self.parts()?;
        let end = parts.title.end + usize::from(parts.fragment.is_some());
        self.node.edit_within(parts.title.start..end, "")
    }

    pub fn fragment(&self) -> Result<Option<String>> {
        let parts = self.parts()?;
        Ok(parts.fragment.map(|f| parts.text[f].to_string()))
    }

    /// Sets the fragment, adding a `#` after the title when missing.
    pub fn set_fragment(&self, fragment: &str) -> Result<()> {
        let parts = self.parts()?;
        match parts.fragment {
            Some(range) => self.node.edit_within(range, fragment),
            None => self.node.insert(parts.title.end, &format!("#{fragment}")),
        }
    }

    pub fn delete_fragment(&self) -> Result<()> {
        match self.parts()?.fragment {
            Some(range) => self.node.edit_within(range.start - 1..range.end, ""),
            None => Ok(()),
        }
    }

    /// The text after the first top-level pipe.
    pub fn text(&self) -> Result<Option<String>> {
        let parts = self.parts()?;
        Ok(parts.label.map(|l| parts.text[l].to_string()))
    }

    /// Sets the text, adding a `|` after the target when missing.
    pub fn set_text(&self, text: &str) -> Result<()> {
        let parts = self.parts()?;
        match parts.label {
            Some(range) => self.node.edit_within(range, text),
            None => self.node.insert(parts.target.end, &format!("|{text}")),
        }
    }

    pub fn delete_text(&self) -> Result<()> {
        match self.parts()?.label {
            Some(range) => self.node.edit_within(range.start - 1..range.end, ""),
            None => Ok(()),
        }
    }
}

/// Local layout of an external link.
struct LinkParts {
    text: String,
    bracketed: bool,
    url: Range<usize>,
    /// Label, after the separating space.
    label: Option<Range<usize>>,
}

impl ExternalLink {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::ExternalLink)
    }

    fn parts(&self) -> Result<LinkParts> {
        let text = self.string()?;
        if !text.starts_with('[') {
            return Ok(LinkParts {
                url: 0..text.len(),
                bracketed: false,
                label: None,
                text,
            });
        }
        let s = text_shadow(&self.node, &text);
        let url = 1..url_end(&s, 1);
        let close = text.len().saturating_sub(1).max(url.end);
        let label = match s.get(url.end) {
            Some(b']') | None => None,
            Some(b' ') => Some(url.end + 1..close),
            Some(_) => Some(url.end..close),
        };
        Ok(LinkParts {
            text,
            bracketed: true,
            url,
            label,
        })
    }

    pub fn in_brackets(&self) -> Result<bool> {
        Ok(self.parts()?.bracketed)
    }

    pub fn url(&self) -> Result<String> {
        let parts = self.parts()?;
        Ok(parts.text[parts.url].to_string())
    }

    pub fn set_url(&self, url: &str) -> Result<()> {
        self.node.edit_within(self.parts()?.url, url)
    }

    /// The label of a bracketed link; `None` for bare links.
    pub fn text(&self) -> Result<Option<String>> {
        let parts = self.parts()?;
        Ok(parts.label.map(|l| parts.text[l].to_string()))
    }

    /// Sets the label. A bare link is put in brackets.
    pub fn set_text(&self, label: &str) -> Result<()> {
        let parts = self.parts()?;
        if !parts.bracketed {
            self.node.insert(parts.text.len(), &format!(" {label}]"))?;
            return self.node.insert(0, "[");
        }
        match parts.label {
            Some(range) if !range.is_empty() => self.node.edit_within(range, label),
            _ => self.node.insert(parts.text.len() - 1, &format!(" {label}")),
        }
    }

    /// Removes the label and the space before it.
    pub fn delete_text(&self) -> Result<()> {
        let parts = self.parts()?;
        match parts.label {
            Some(range) if parts.bracketed => {
                let start = if parts.text.as_bytes().get(parts.url.end) == Some(&b' ') {
                    parts.url.end
                } else {
                    range.start
                };
                self.node.edit_within(start..range.end, "")
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn link(text: &str) -> WikiLink {
        WikiLink::new(text).expect("valid wikilink")
    }

    #[test]
    fn wikilink_parts() {
        let l = link("[[a#b|c|d]]");
        assert_eq!(l.target().as_deref(), Ok("a#b"));
        assert_eq!(l.title().as_deref(), Ok("a"));
        assert_eq!(l.fragment(), Ok(Some("b".to_string())));
        assert_eq!(l.text(), Ok(Some("c|d".to_string())));

        let bare = link("[[a]]");
        assert_eq!(bare.fragment(), Ok(None));
        assert_eq!(bare.text(), Ok(None));
    }

    #[test]
    fn template_in_target_does_not_split() {
        let l = link("[[{{a|b}}#c|d]]");
        assert_eq!(l.title().as_deref(), Ok("{{a|b}}"));
        assert_eq!(l.text(), Ok(Some("d".to_string())));
    }

    #[test]
    fn setters_insert_separators() {
        let l = link("[[a]]");
        l.set_text("t").expect("edit");
        assert_eq!(l.string().as_deref(), Ok("[[a|t]]"));
        l.set_fragment("f").expect("edit");
        assert_eq!(l.string().as_deref(), Ok("[[a#f|t]]"));
        l.set_title("b").expect("edit");
        assert_eq!(l.string().as_deref(), Ok("[[b#f|t]]"));
        l.set_target("c").expect("edit");
        assert_eq!(l.string().as_deref(), Ok("[[c|t]]"));
    }

    #[rstest]
    #[case("[[a#f|t]]", "text", "[[a#f]]")]
    #[case("[[a#f|t]]", "fragment", "[[a|t]]")]
    #[case("[[a#f|t]]", "title", "[[f|t]]")]
    #[case("[[a#f|t]]", "target", "[[t]]")]
    #[case("[[a]]", "text", "[[a]]")]
    fn deleters(#[case] text: &str, #[case] part: &str, #[case] expected: &str) {
        let l = link(text);
        match part {
            "text" => l.delete_text(),
            "fragment" => l.delete_fragment(),
            "title" => l.delete_title(),
            _ => l.delete_target(),
        }
        .expect("edit");
        assert_eq!(l.string().as_deref(), Ok(expected));
    }

    #[rstest]
    #[case("[https://a.b c d]", "https://a.b", Some("c d"), true)]
    #[case("[https://a.b]", "https://a.b", None, true)]
    #[case("https://a.b", "https://a.b", None, false)]
    fn external_link_parts(#[case] text: &str, #[case] url: &str, #[case] label: Option<&str>, #[case] bracketed: bool) {
        let l = ExternalLink::new(text).expect("valid link");
        assert_eq!(l.url().as_deref(), Ok(url));
        assert_eq!(l.text(), Ok(label.map(str::to_string)));
        assert_eq!(l.in_brackets(), Ok(bracketed));
    }

    #[test]
    fn bare_link_gets_brackets_with_text() {
        let doc = Document::parse("see https://a.b now");
        let l = doc.external_links().expect("query").remove(0);
        l.set_text("t").expect("edit");
        assert_eq!(doc.text(), "see [https://a.b t] now");
        assert_eq!(l.string().as_deref(), Ok("[https://a.b t]"));
        l.set_url("https://c.d").expect("edit");
        assert_eq!(l.string().as_deref(), Ok("[https://c.d t]"));
        l.delete_text().expect("edit");
        assert_eq!(l.string().as_deref(), Ok("[https://c.d]"));
        l.set_text("u").expect("edit");
        assert_eq!(l.string().as_deref(), Ok("[https://c.d u]"));
    }
}
