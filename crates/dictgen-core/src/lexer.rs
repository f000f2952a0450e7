//! TeX-style lexer for dictionary fields
//!
//! Turns field text into the token layout the expansion engine expects:
//!
//! - text runs up to `\`, `$`, `{` or `}` become `Text` (adjacent runs merge)
//! - `\name` skips the whitespace after the name; every `{…}` group that
//!   follows immediately becomes one argument
//! - bare `{…}` groups are transparent but must balance
//! - `\-`, `\ `, `\&`, `\$`, `\%`, `\#`, `\{`, `\}` are literal escapes
//! - other punctuation after `\` is a single-character macro (e.g. `\/`)
//! - `$…$` maths is kept verbatim

use crate::token::{Token, TokenStream};
use std::ops::Range;
use thiserror::Error;

/// Byte range in the lexed text
pub type Span = Range<usize>;

/// Characters that end a text run
const SPECIAL: &[char] = &['\\', '$', '{', '}'];

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at byte {})", span.start)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl LexError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Lex a field into a terminated token stream
pub fn lex(input: &str) -> Result<TokenStream, LexError> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.lex_content(None)?;
    Ok(TokenStream::new(lexer.tokens))
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Token::Text(previous)) = self.tokens.last_mut() {
            previous.push_str(text);
        } else {
            self.tokens.push(Token::text(text));
        }
    }

    fn take_text(&mut self) -> &'a str {
        let rest = &self.input[self.pos..];
        let len = rest.find(SPECIAL).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Lex until end of input, or until the `}` closing the argument opened
    /// at `argument`
    fn lex_content(&mut self, argument: Option<usize>) -> Result<(), LexError> {
        let mut groups: Vec<usize> = Vec::new();

        loop {
            let text = self.take_text();
            self.push_text(text);

            match self.peek() {
                None => {
                    if let Some(&open) = groups.last().or(argument.as_ref()) {
                        return Err(LexError::new(
                            "Unexpected end of input. Did you forget a '}'?",
                            open..self.pos,
                        ));
                    }
                    return Ok(());
                }
                Some('\\') => self.lex_escape()?,
                Some('$') => self.lex_maths()?,
                Some('{') => {
                    groups.push(self.pos);
                    self.pos += 1;
                }
                Some('}') => {
                    let close = self.pos;
                    self.pos += 1;
                    if groups.pop().is_none() {
                        if argument.is_some() {
                            return Ok(());
                        }
                        return Err(LexError::new("Too many '}'s!", close..self.pos));
                    }
                }
                Some(_) => unreachable!("take_text stops only at special characters"),
            }
        }
    }

    fn lex_escape(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;

        let Some(c) = self.peek() else {
            return Err(LexError::new("Invalid macro escape sequence", start..self.pos));
        };

        if c == '\\' {
            self.bump(c);
            return Err(LexError::new("'\\\\' is not supported in this field", start..self.pos));
        }

        if c.is_ascii_punctuation() || c == ' ' {
            self.bump(c);
            if let Some(literal) = escaped_literal(c) {
                self.push_text(literal);
                return Ok(());
            }
            return self.lex_invocation(c.to_string());
        }

        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphabetic() || c == '@'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(LexError::new("Invalid macro escape sequence", start..self.pos + c.len_utf8()));
        }

        let name = rest[..len].to_string();
        self.pos += len;
        let skipped = self.input[self.pos..].len() - self.input[self.pos..].trim_start().len();
        self.pos += skipped;

        self.lex_invocation(name)
    }

    fn lex_invocation(&mut self, name: String) -> Result<(), LexError> {
        self.tokens.push(Token::MacroStart(name));

        let mut first = true;
        while self.peek() == Some('{') {
            if !first {
                self.tokens.push(Token::ArgSeparator);
            }
            first = false;

            let open = self.pos;
            self.pos += 1;
            let before = self.tokens.len();
            self.lex_content(Some(open))?;
            if self.tokens.len() == before {
                // Keep the slot for `{}` so it still counts as an argument.
                self.tokens.push(Token::text(""));
            }
        }

        self.tokens.push(Token::MacroEnd);
        Ok(())
    }

    fn lex_maths(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let body_start = start + 1;
        let Some(len) = self.input[body_start..].find('$') else {
            self.pos = self.input.len();
            return Err(LexError::new("Unterminated maths", start..self.pos));
        };

        let end = body_start + len + 1;
        let maths = &self.input[start..end];
        self.pos = end;
        self.push_text(maths);
        Ok(())
    }
}

fn escaped_literal(c: char) -> Option<&'static str> {
    match c {
        '-' => Some("\u{00AD}"),
        ' ' => Some(" "),
        '&' => Some("&"),
        '$' => Some("$"),
        '%' => Some("%"),
        '#' => Some("#"),
        '{' => Some("{"),
        '}' => Some("}"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let stream = lex(input).unwrap();
        let mut tokens = stream.as_slice().to_vec();
        assert_eq!(tokens.pop(), Some(Token::EndOfInput));
        tokens
    }

    fn text(s: &str) -> Token {
        Token::text(s)
    }

    fn start(name: &str) -> Token {
        Token::macro_start(name)
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokens(""), vec![]);
        assert_eq!(tokens("Sphinx of black quartz"), vec![text("Sphinx of black quartz")]);
    }

    #[test]
    fn test_bare_groups_are_transparent() {
        assert_eq!(tokens("a{b}c"), vec![text("abc")]);
        assert_eq!(tokens("{{a}}{b}{{c}}"), vec![text("abc")]);
        assert_eq!(tokens("{}"), vec![]);
    }

    #[test]
    fn test_mismatched_braces() {
        for input in ["{", "{{}", "}", "{}}", "{}{", "{}{}}"] {
            assert!(lex(input).is_err(), "expected error for {input:?}");
        }
        assert_eq!(lex("ab}").unwrap_err().span, 2..3);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(tokens("\\{"), vec![text("{")]);
        assert_eq!(tokens("{\\}}"), vec![text("}")]);
        assert_eq!(tokens("a\\&b"), vec![text("a&b")]);
        assert_eq!(tokens("\\-"), vec![text("\u{00AD}")]);
        assert_eq!(tokens("\\ "), vec![text(" ")]);
    }

    #[test]
    fn test_invalid_escapes() {
        assert!(lex("\\\\").is_err());
        assert!(lex("{\\\\}").is_err());
        assert!(lex("abc\\").is_err());
        assert!(lex("\\é").is_err());
    }

    #[test]
    fn test_single_argument_macro() {
        assert_eq!(
            tokens("\\textbf{bold} text"),
            vec![start("textbf"), text("bold"), Token::MacroEnd, text(" text")]
        );
    }

    #[test]
    fn test_macro_without_arguments_eats_following_space() {
        assert_eq!(
            tokens("\\ldots and"),
            vec![start("ldots"), Token::MacroEnd, text("and")]
        );
    }

    #[test]
    fn test_adjacent_groups_become_arguments() {
        assert_eq!(
            tokens("\\s{a}{b} {c}"),
            vec![
                start("s"),
                text("a"),
                Token::ArgSeparator,
                text("b"),
                Token::MacroEnd,
                text(" c"),
            ]
        );
    }

    #[test]
    fn test_empty_argument_keeps_its_slot() {
        assert_eq!(tokens("\\s{}"), vec![start("s"), text(""), Token::MacroEnd]);
    }

    #[test]
    fn test_nested_macros() {
        assert_eq!(
            tokens("\\s{a{\\w{c}}}"),
            vec![
                start("s"),
                text("a"),
                start("w"),
                text("c"),
                Token::MacroEnd,
                Token::MacroEnd,
            ]
        );
    }

    #[test]
    fn test_single_character_macro() {
        assert_eq!(tokens("\\/"), vec![start("/"), Token::MacroEnd]);
    }

    #[test]
    fn test_maths_is_verbatim() {
        assert_eq!(tokens("$a$"), vec![text("$a$")]);
        assert_eq!(tokens("x $\\alpha$ y"), vec![text("x $\\alpha$ y")]);
        assert_eq!(lex("$a").unwrap_err().message, "Unterminated maths");
    }

    #[test]
    fn test_unterminated_argument() {
        let err = lex("x \\s{abc").unwrap_err();
        assert_eq!(err.message, "Unexpected end of input. Did you forget a '}'?");
        assert_eq!(err.span.start, 4);
    }
}
