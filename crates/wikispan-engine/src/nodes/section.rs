use std::ops::Range;

use crate::buffer::lines::lines_with_spans;
use crate::error::{Error, Result};
use crate::nodes::{WikiNode, construct, trimmed_range, unsupported};
use crate::recognize::sections::{MAX_LEVEL, heading_level, title_range};
use crate::registry::NodeKind;

wrapper!(
    /// A heading and the text up to the next heading of the same or a
    /// higher rank, or the lead section before the first heading.
    Section,
    NodeKind::Section
);

/// Local layout of the heading line.
struct Heading {
    level: usize,
    /// Between the `=` runs, untrimmed.
    title: Range<usize>,
    /// Through the closing `=` run.
    end: usize,
    /// Start of the contents, after the heading's newline.
    contents: usize,
}

impl Section {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::Section)
    }

    /// The heading, or `None` for the lead section.
    fn heading(&self, text: &str) -> Option<Heading> {
        let line = lines_with_spans(text, 0).next()?;
        let level = heading_level(line.content().as_bytes())?;
        let title = title_range(line.content().as_bytes(), level);
        Some(Heading {
            level,
            end: title.end + level,
            title,
            contents: line.span.end,
        })
    }

    /// Heading level; 0 for the lead section.
    pub fn level(&self) -> Result<usize> {
        let text = self.string()?;
        Ok(self.heading(&text).map_or(0, |h| h.level))
    }

    /// Rewrites the heading with `level` `=` signs on each side.
    pub fn set_level(&self, level: usize) -> Result<()> {
        if !(1..=MAX_LEVEL).contains(&level) {
            return Err(Error::malformed(
                NodeKind::Section,
                format!("heading level {level} is not within 1..={MAX_LEVEL}"),
            ));
        }
        let text = self.string()?;
        let Some(heading) = self.heading(&text) else {
            return unsupported(NodeKind::Section, "set_level on the lead section");
        };
        // Only the `=` runs change, so nodes inside the title survive.
        let equals = "=".repeat(level);
        self.node.edit_within(heading.title.end..heading.end, &equals)?;
        self.node.edit_within(0..heading.title.start, &equals)
    }

    /// Heading title without surrounding whitespace; `None` for the lead
    /// section.
    pub fn title(&self) -> Result<Option<String>> {
        let text = self.string()?;
        Ok(self
            .heading(&text)
            .map(|h| text[trimmed_range(&text, h.title)].to_string()))
    }

    /// Replaces the title, keeping the whitespace around it.
    pub fn set_title(&self, title: &str) -> Result<()> {
        let text = self.string()?;
        let Some(heading) = self.heading(&text) else {
            return unsupported(NodeKind::Section, "set_title on the lead section");
        };
        self.node.edit_within(trimmed_range(&text, heading.title), title)
    }

    /// Text after the heading line; the whole text of the lead section.
    pub fn contents(&self) -> Result<String> {
        let text = self.string()?;
        let start = self.heading(&text).map_or(0, |h| h.contents);
        Ok(text[start..].to_string())
    }

    /// Replaces the contents. A heading without a newline gets one.
    pub fn set_contents(&self, contents: &str) -> Result<()> {
        let text = self.string()?;
        match self.heading(&text) {
            Some(h) if h.contents == text.len() && !text.ends_with('\n') => {
                self.node.insert(text.len(), &format!("\n{contents}"))
            }
            Some(h) => self.node.edit_within(h.contents..text.len(), contents),
            None => self.node.edit_within(0..text.len(), contents),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const PAGE: &str = "lead\n== h2 ==\na\n=== h3 ===\nb\n== h22 ==\nc";

    #[test]
    fn sections_with_lead() {
        let doc = Document::parse(PAGE);
        let sections = doc.sections().expect("query");
        let titles: Vec<_> = sections.iter().map(|s| s.title().expect("live")).collect();
        assert_eq!(
            titles,
            [None, Some("h2".to_string()), Some("h3".to_string()), Some("h22".to_string())]
        );
        assert_eq!(
            sections.iter().map(|s| s.level().expect("live")).collect::<Vec<_>>(),
            [0, 2, 3, 2]
        );
        assert_eq!(sections[1].string().as_deref(), Ok("== h2 ==\na\n=== h3 ===\nb\n"));
    }

    #[test]
    fn flat_sections_and_level_filter() {
        let doc = Document::parse(PAGE);
        let flat = doc.get_sections(false, None).expect("query");
        assert_eq!(flat[1].string().as_deref(), Ok("== h2 ==\na\n"));
        let level2 = doc.get_sections(true, Some(2)).expect("query");
        assert_eq!(level2.len(), 2);
    }

    #[test]
    fn retitle_keeps_level_and_siblings() {
        let doc = Document::parse(PAGE);
        let sections = doc.sections().expect("query");
        sections[1].set_title("newtitle").expect("edit");
        assert_eq!(sections[1].level(), Ok(2));
        assert_eq!(sections[1].title(), Ok(Some("newtitle".to_string())));
        assert_eq!(sections[2].string().as_deref(), Ok("=== h3 ===\nb\n"));
        assert_eq!(sections[3].string().as_deref(), Ok("== h22 ==\nc"));
        assert!(doc.text().contains("== newtitle ==\n"));
    }

    #[test]
    fn lead_section_rejects_titles() {
        let doc = Document::parse(PAGE);
        let lead = doc.sections().expect("query").remove(0);
        assert!(matches!(lead.set_title("x"), Err(Error::Unsupported { .. })));
        assert_eq!(lead.contents().as_deref(), Ok("lead\n"));
    }

    #[rstest]
    #[case("== a ==\nb", 3, "=== a ===\nb")]
    #[case("=a=", 1, "=a=")]
    fn set_level(#[case] text: &str, #[case] level: usize, #[case] expected: &str) {
        let s = Section::new(text).expect("valid section");
        s.set_level(level).expect("edit");
        assert_eq!(s.string().as_deref(), Ok(expected));
        assert_eq!(s.level(), Ok(level));
    }

    #[rstest]
    #[case(1, "={{t}}=\nb")]
    #[case(2, "=={{t}}==\nb")]
    #[case(4, "===={{t}}====\nb")]
    fn set_level_keeps_title_nodes_alive(#[case] level: usize, #[case] expected: &str) {
        let s = Section::new("={{t}}=\nb").expect("valid section");
        let t = s.templates().expect("query").remove(0);
        s.set_level(level).expect("edit");
        assert_eq!(s.string().as_deref(), Ok(expected));
        assert_eq!(t.string().as_deref(), Ok("{{t}}"));
        s.set_level(1).expect("edit");
        assert_eq!(t.name().as_deref(), Ok("t"));
    }

    #[test]
    fn contents_round_trip() {
        let s = Section::new("== a ==\nold").expect("valid section");
        assert_eq!(s.contents().as_deref(), Ok("old"));
        s.set_contents("new\n").expect("edit");
        assert_eq!(s.string().as_deref(), Ok("== a ==\nnew\n"));

        let bare = Section::new("== a ==").expect("valid section");
        bare.set_contents("x").expect("edit");
        assert_eq!(bare.string().as_deref(), Ok("== a ==\nx"));
    }
}
