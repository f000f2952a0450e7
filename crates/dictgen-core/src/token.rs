//! Token stream consumed by the expansion engine
//!
//! A macro invocation is laid out as
//!
//! ```text
//! MacroStart(name) [arg (ArgSeparator arg)*] MacroEnd
//! ```
//!
//! where every `arg` is itself a sequence of text and nested invocations.
//! The [lexer](crate::lexer) produces this layout from TeX-style source, but
//! any producer that respects it can drive the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A lexical token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    /// A run of literal text
    Text(String),
    /// Start of a macro invocation
    MacroStart(String),
    /// Separator between two arguments of the innermost open invocation
    ArgSeparator,
    /// End of the innermost open invocation
    MacroEnd,
    /// End of the stream
    EndOfInput,
}

impl Token {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn macro_start(name: impl Into<String>) -> Self {
        Self::MacroStart(name.into())
    }

    /// Whether this token closes an argument scope
    pub fn is_scope_end(&self) -> bool {
        matches!(self, Token::ArgSeparator | Token::MacroEnd)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Text(text) => write!(f, "text {text:?}"),
            Token::MacroStart(name) => write!(f, "start of macro '{name}'"),
            Token::ArgSeparator => f.write_str("argument separator"),
            Token::MacroEnd => f.write_str("end of macro"),
            Token::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// An owned, terminated sequence of tokens
///
/// The stream always ends with exactly one [`Token::EndOfInput`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        tokens.into_iter().collect()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    /// Concatenated text of every `Text` token, in order
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .filter_map(|token| match token {
                Token::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl FromIterator<Token> for TokenStream {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        let mut tokens: Vec<Token> = iter
            .into_iter()
            .take_while(|token| *token != Token::EndOfInput)
            .collect();
        tokens.push(Token::EndOfInput);
        Self { tokens }
    }
}

impl AsRef<[Token]> for TokenStream {
    fn as_ref(&self) -> &[Token] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_is_terminated_once() {
        let stream = TokenStream::new(vec![Token::text("a"), Token::EndOfInput, Token::text("b")]);
        assert_eq!(stream.as_slice(), &[Token::text("a"), Token::EndOfInput]);

        let empty = TokenStream::new(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 1);
    }

    #[test]
    fn test_stream_text_skips_markers() {
        let stream = TokenStream::new(vec![
            Token::text("see "),
            Token::macro_start("ipa"),
            Token::text("kat"),
            Token::MacroEnd,
            Token::text("."),
        ]);
        assert_eq!(stream.text(), "see kat.");
    }
}
