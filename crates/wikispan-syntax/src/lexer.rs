//! # Lexer - Tokenizing Wikitext Delimiters
//!
//! Breaks a shadow string into delimiter tokens using [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token:
//!
//! ```
//! use wikispan_syntax::lexer::lex;
//!
//! let input = "{{a|[[b]]}}\n";
//! let tokens = lex(input);
//! let rebuilt: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, rebuilt);
//! ```
//!
//! ## Token Design
//!
//! Only characters that matter to the pair matcher get their own kinds.
//! Brace and bracket runs of two or more are single tokens so the matcher
//! can see their length; a lone brace or bracket is [`TokenKind::Stray`]
//! and never opens or closes anything.

use std::ops::Range;

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Two or more `{`
    #[regex(r"\{\{+")]
    OpenBraces,

    /// Two or more `}`
    #[regex(r"\}\}+")]
    CloseBraces,

    /// Two or more `[`
    #[regex(r"\[\[+")]
    OpenBrackets,

    /// Two or more `]`
    #[regex(r"\]\]+")]
    CloseBrackets,

    /// `|` argument separator
    #[token("|")]
    Pipe,

    /// Line feed
    #[token("\n")]
    Newline,

    /// A single brace or bracket that cannot start a construct
    #[token("{")]
    #[token("}")]
    #[token("[")]
    #[token("]")]
    Stray,

    /// Anything else, grouped into runs
    #[regex(r"[^{}\[\]|\n]+")]
    Text,
}

/// A lexed token with its kind, text slice and byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

impl Token<'_> {
    /// Length of the token in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.span.end - self.span.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// Lex the input into a sequence of tokens with byte spans.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        // Every byte is covered by some rule; an error can only mean a
        // byte sequence Logos refused, which we keep as text.
        let kind = result.unwrap_or(TokenKind::Text);
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            span: lexer.span(),
        });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_plain_text_is_one_token() {
        let tokens = lex("hello world");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].span, 0..11);
    }

    #[rstest]
    #[case("{{", TokenKind::OpenBraces)]
    #[case("{{{{{", TokenKind::OpenBraces)]
    #[case("}}}", TokenKind::CloseBraces)]
    #[case("[[", TokenKind::OpenBrackets)]
    #[case("]]]", TokenKind::CloseBrackets)]
    #[case("{", TokenKind::Stray)]
    #[case("]", TokenKind::Stray)]
    #[case("|", TokenKind::Pipe)]
    #[case("\n", TokenKind::Newline)]
    fn delimiter_runs_are_single_tokens(#[case] input: &str, #[case] expected: TokenKind) {
        assert_eq!(kinds(input), vec![expected]);
    }

    #[test]
    fn template_with_argument() {
        assert_eq!(
            kinds("{{a|b}}"),
            vec![
                TokenKind::OpenBraces,
                TokenKind::Text,
                TokenKind::Pipe,
                TokenKind::Text,
                TokenKind::CloseBraces,
            ]
        );
    }

    #[test]
    fn multibyte_text_keeps_byte_spans() {
        let tokens = lex("é{{x}}");
        assert_eq!(tokens[0].span, 0..2);
        assert_eq!(tokens[1].span, 2..4);
    }
}
