//! # wikispan-engine
//!
//! Editable parse trees for MediaWiki markup. A [`Document`] owns one text
//! buffer; every node handed out by a query is a live view of a span of
//! that buffer, and edits through any node keep every other live node's
//! span correct.
//!
//! ```
//! use wikispan_engine::{Document, WikiNode};
//!
//! let doc = Document::parse("{{text|value1{{text|value2}}}}");
//! let templates = doc.templates().unwrap();
//! assert_eq!(templates.len(), 2);
//!
//! templates[0].arguments().unwrap()[0].set_value("value3").unwrap();
//! assert_eq!(doc.text(), "{{text|value3}}");
//! assert!(!templates[1].is_alive());
//! ```
//!
//! ## Layers
//!
//! - [`buffer`]: the rope-backed text and span arithmetic
//! - [`registry`]: the arena of span records and edit relocation
//! - [`recognize`]: finds constructs in a slice of text
//! - [`nodes`]: typed accessors over registered spans
//! - [`resolve`]: table layout, duplicate arguments, plain text, pretty
//!   printing
//! - [`snapshot`]: outlines and invariant checks for tests and tools

pub mod buffer;
pub mod document;
pub mod error;
pub mod nodes;
pub mod recognize;
pub mod registry;
pub mod resolve;
pub mod snapshot;

pub use buffer::Span;
pub use document::{Document, NodeRef};
pub use error::{Error, Result};
pub use nodes::table::DataOptions;
pub use nodes::{
    Argument, Bold, Cell, Comment, ExternalLink, Italic, Node, NormalName, Parameter,
    ParserFunction, Row, Section, SetArg, Table, Tag, Template, WikiLink, WikiList, WikiNode,
};
pub use registry::NodeKind;
pub use resolve::plain_text::{PlainTextOptions, Replacement, remove_markup};
pub use wikispan_config::Config;
