use std::fmt;
use std::str::FromStr;

/// Construct kinds tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Document,
    Section,
    Table,
    Row,
    Cell,
    WikiList,
    Tag,
    Template,
    ParserFunction,
    Parameter,
    WikiLink,
    Argument,
    ExternalLink,
    Comment,
    Italic,
    Bold,
}

impl NodeKind {
    pub const ALL: [NodeKind; 16] = [
        NodeKind::Document,
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

    /// Nesting rank for constructs covering the same bytes: lower ranks
    /// are outer.
    pub fn rank(self) -> u8 {
        match self {
            NodeKind::Document => 0,
            NodeKind::Section => 1,
            NodeKind::Table => 2,
            NodeKind::Row => 3,
            NodeKind::Cell => 4,
            NodeKind::WikiList => 5,
            NodeKind::Tag => 6,
            NodeKind::Template
            | NodeKind::ParserFunction
            | NodeKind::Parameter
            | NodeKind::WikiLink => 7,
            NodeKind::Argument | NodeKind::ExternalLink => 8,
            NodeKind::Comment => 9,
            NodeKind::Italic => 10,
            NodeKind::Bold => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Section => "section",
            NodeKind::Table => "table",
            NodeKind::Row => "row",
            NodeKind::Cell => "cell",
            NodeKind::WikiList => "list",
            NodeKind::Tag => "tag",
            NodeKind::Template => "template",
            NodeKind::ParserFunction => "parser_function",
            NodeKind::Parameter => "parameter",
            NodeKind::WikiLink => "wikilink",
            NodeKind::Argument => "argument",
            NodeKind::ExternalLink => "external_link",
            NodeKind::Comment => "comment",
            NodeKind::Italic => "italic",
            NodeKind::Bold => "bold",
        }
    }
}

impl FromStr for NodeKind {
    type Err = String;

    /// Parses a kind from its [`NodeKind::name`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown node kind {s:?}"))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
