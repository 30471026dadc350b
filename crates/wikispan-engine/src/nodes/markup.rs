use std::ops::Range;

use crate::document::inner;
use crate::error::Result;
use crate::nodes::{WikiNode, construct};
use crate::registry::{Detail, NodeKind};

wrapper!(
    /// `<!-- ... -->`, possibly unclosed.
    Comment,
    NodeKind::Comment
);

wrapper!(Bold, NodeKind::Bold);

wrapper!(Italic, NodeKind::Italic);

impl Comment {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::Comment)
    }

    pub fn contents(&self) -> Result<String> {
        let text = self.string()?;
        let close = if text.ends_with("-->") { 3 } else { 0 };
        Ok(text[inner(text.len(), 4, close)].to_string())
    }
}

/// Range between the apostrophe markers of a bold or italic run. Implicitly
/// closed runs have no closing marker.
fn quoted(node: &impl WikiNode) -> Result<(String, Range<usize>)> {
    let text = node.string()?;
    let (open, close) = match node.node().detail()? {
        Detail::Quote { open, close } => (usize::from(open), usize::from(close)),
        _ => (0, 0),
    };
    let range = inner(text.len(), open, close);
    Ok((text, range))
}

impl Bold {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::Bold)
    }

    pub fn text(&self) -> Result<String> {
        let (text, range) = quoted(self)?;
        Ok(text[range].to_string())
    }

    pub fn set_text(&self, text: &str) -> Result<()> {
        let (_, range) = quoted(self)?;
        self.node.edit_within(range, text)
    }
}

impl Italic {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::Italic)
    }

    pub fn text(&self) -> Result<String> {
        let (text, range) = quoted(self)?;
        Ok(text[range].to_string())
    }

    pub fn set_text(&self, text: &str) -> Result<()> {
        let (_, range) = quoted(self)?;
        self.node.edit_within(range, text)
    }

    /// False for a run closed implicitly at the end of its line.
    pub fn is_closed(&self) -> Result<bool> {
        Ok(matches!(self.node.detail()?, Detail::Quote { close, .. } if close > 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("<!-- a -->", " a ")]
    #[case("<!-- a", " a")]
    #[case("<!---->", "")]
    fn comment_contents(#[case] text: &str, #[case] expected: &str) {
        let c = Comment::new(text).expect("valid comment");
        assert_eq!(c.contents().as_deref(), Ok(expected));
    }

    #[test]
    fn bold_and_italic_text() {
        assert_eq!(Bold::new("'''b'''").and_then(|b| b.text()).as_deref(), Ok("b"));
        assert_eq!(Italic::new("''i''").and_then(|i| i.text()).as_deref(), Ok("i"));
        assert!(Bold::new("''i''").is_err());
    }

    #[test]
    fn implicitly_closed_runs_keep_their_shape() {
        let doc = Document::parse("''a\nb");
        let italic = doc.italics().expect("query").remove(0);
        assert_eq!(italic.string().as_deref(), Ok("''a"));
        assert_eq!(italic.is_closed(), Ok(false));
        italic.set_text("x").expect("edit");
        assert_eq!(doc.text(), "''x\nb");
    }

    #[test]
    fn set_text_keeps_markers() {
        let doc = Document::parse("a '''b''' c");
        let bold = doc.bolds().expect("query").remove(0);
        bold.set_text("xyz").expect("edit");
        assert_eq!(doc.text(), "a '''xyz''' c");
        assert_eq!(bold.text().as_deref(), Ok("xyz"));
    }
}
