//! # wikispan-syntax
//!
//! The lowest layer of the wikitext pipeline: a [Logos] delimiter lexer and
//! a counted-delimiter matcher for the bracketed constructs of MediaWiki
//! markup (`{{ }}`, `{{{ }}}` and `[[ ]]`).
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Pipeline
//!
//! ```text
//! Shadow text → Lexer → Tokens → Pair matcher → Pairs
//!               (Logos)          (opener stack)
//! ```
//!
//! The input is normally a *shadow*: a copy of the source in which comments
//! and extension tags have already been masked by the engine, so every
//! delimiter the lexer sees is real markup.
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! Every byte of the input lands in exactly one token. Runs of braces and
//! brackets are kept whole (`{{{{` is a single token) because the matcher
//! needs the run length to split `{{{{{x}}}}}` the way MediaWiki does.
//!
//! ### 2. Pair matcher ([`pairs`] module)
//!
//! A single left-to-right pass over the tokens with an explicit stack of
//! unmatched openers. A closing run only ever closes the opener on top of
//! the stack, so matching is linear in the number of tokens and nesting
//! depth never recurses.
//!
//! ## Quick Start
//!
//! ```
//! use wikispan_syntax::{PairKind, match_pairs};
//!
//! let pairs = match_pairs("{{a|[[b]]}} {{{c}}}");
//! let kinds: Vec<PairKind> = pairs.iter().map(|p| p.kind).collect();
//!
//! // Outer constructs come before the constructs nested inside them.
//! assert_eq!(
//!     kinds,
//!     vec![PairKind::DoubleBrace, PairKind::DoubleBracket, PairKind::TripleBrace]
//! );
//! assert_eq!(pairs[0].span, 0..11);
//! ```
//!
//! Classifying a brace pair as template, parser function or parameter, and
//! validating link targets, is the engine's job; this crate only knows about
//! delimiters.

pub mod lexer;
pub mod pairs;

pub use lexer::{Token, TokenKind, lex};
pub use pairs::{Pair, PairKind, match_pairs};
