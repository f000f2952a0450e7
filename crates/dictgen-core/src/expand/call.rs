//! Capability surface handed to macro handlers

use super::cursor::Cursor;
use super::engine::{Pass, ScopeEnd};
use super::{ExpandError, ExpandResult};
use crate::node::OutputNode;
use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallState {
    /// Start marker not consumed yet
    Pending,
    Open,
    Closed,
}

/// A live macro invocation
///
/// Handlers (registered ones and the fallback alike) only move through the
/// token stream via these primitives, so the engine can always tell whether
/// a handler made progress.
pub struct MacroCall<'p> {
    pass: &'p Pass<'p>,
    name: &'p str,
    start: Cursor,
    cursor: Cursor,
    state: CallState,
}

impl<'p> MacroCall<'p> {
    pub(crate) fn new(pass: &'p Pass<'p>, name: &'p str, cursor: Cursor) -> Self {
        Self {
            pass,
            name,
            start: cursor,
            cursor,
            state: CallState::Pending,
        }
    }

    /// Name of the invoked macro
    pub fn name(&self) -> &str {
        self.name
    }

    /// Current position of this invocation
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Headword of the entry being expanded, if the caller set one
    pub fn headword(&self) -> Option<&str> {
        self.pass.expander.headword()
    }

    /// Step past the start marker without reading any argument
    pub fn consume_marker(&mut self) {
        if self.state == CallState::Pending {
            self.cursor = self.cursor.advance();
            self.state = CallState::Open;
        }
    }

    /// True if the invocation still has an unread argument
    pub fn has_argument(&self) -> bool {
        let next = match self.state {
            CallState::Pending => self.cursor.advance(),
            CallState::Open => self.cursor,
            CallState::Closed => return false,
        };
        !matches!(self.pass.token(next), Token::MacroEnd | Token::EndOfInput)
    }

    /// Expand exactly one argument into a `Group`
    ///
    /// Nested invocations are fully expanded before this returns.
    pub fn parse_argument(&mut self) -> ExpandResult<OutputNode> {
        self.consume_marker();

        let missing = ExpandError::MissingArgument {
            name: self.name.to_string(),
            position: self.start.position,
        };
        if self.state == CallState::Closed {
            return Err(missing);
        }
        match self.pass.token(self.cursor) {
            Token::EndOfInput => return Err(self.unterminated()),
            Token::MacroEnd => return Err(missing),
            _ => {}
        }

        let mut nodes = Vec::new();
        let (cursor, end) = self.pass.expand_scope(self.cursor, &mut nodes)?;
        self.cursor = match end {
            ScopeEnd::Separator => cursor.advance(),
            ScopeEnd::MacroEnd => cursor,
            ScopeEnd::EndOfInput => return Err(self.unterminated()),
        };

        Ok(OutputNode::Group(nodes))
    }

    /// Consume the rest of the invocation, including its end marker
    ///
    /// Arguments the handler did not read are expanded and returned so the
    /// caller can place them; the engine appends them after the handler's
    /// output when it closes an invocation on the handler's behalf.
    pub fn close(&mut self) -> ExpandResult<Vec<OutputNode>> {
        self.consume_marker();

        let mut surplus = Vec::new();
        while self.state != CallState::Closed {
            match self.pass.token(self.cursor) {
                Token::MacroEnd => {
                    self.cursor = self.cursor.advance();
                    self.state = CallState::Closed;
                }
                Token::EndOfInput => return Err(self.unterminated()),
                _ => surplus.push(self.parse_argument()?),
            }
        }

        Ok(surplus)
    }

    pub fn is_closed(&self) -> bool {
        self.state == CallState::Closed
    }

    /// Literal text node
    pub fn raw(&self, text: impl Into<String>) -> OutputNode {
        OutputNode::raw(text)
    }

    /// Ordered group of nodes
    pub fn group(&self, nodes: impl IntoIterator<Item = OutputNode>) -> OutputNode {
        OutputNode::group(nodes)
    }

    /// Run the post-pass transform registered under `tag` on a node's text
    pub fn transform(&self, tag: &str, node: OutputNode) -> ExpandResult<OutputNode> {
        self.pass.expander.transform(tag, node)
    }

    /// Error reported by a handler that cannot expand this invocation
    pub fn error(&self, message: impl Into<String>) -> ExpandError {
        ExpandError::Handler {
            name: self.name.to_string(),
            position: self.start.position,
            message: message.into(),
        }
    }

    fn unterminated(&self) -> ExpandError {
        ExpandError::UnterminatedMacro {
            name: self.name.to_string(),
            position: self.start.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::expand::{ExpandError, Expander, RejectUnknown};
    use crate::node::OutputNode;
    use crate::registry::MacroRegistryBuilder;
    use crate::token::Token;

    #[test]
    fn test_missing_argument() {
        let mut builder = MacroRegistryBuilder::new();
        builder.register_fn("one", |call| Ok(vec![call.parse_argument()?]));
        let registry = builder.build();

        let err = Expander::new(&registry, &RejectUnknown)
            .expand(&[Token::macro_start("one"), Token::MacroEnd])
            .unwrap_err();
        assert_eq!(
            err,
            ExpandError::MissingArgument {
                name: "one".to_string(),
                position: 0
            }
        );
    }

    #[test]
    fn test_has_argument_tracks_remaining_arguments() {
        let mut builder = MacroRegistryBuilder::new();
        builder.register_fn("count", |call| {
            let mut count = 0;
            while call.has_argument() {
                call.parse_argument()?;
                count += 1;
            }
            Ok(vec![call.raw(count.to_string())])
        });
        let registry = builder.build();
        let expander = Expander::new(&registry, &RejectUnknown);

        let none = [Token::macro_start("count"), Token::MacroEnd];
        assert_eq!(expander.expand(&none).unwrap().flatten_text(), "0");

        let three = [
            Token::macro_start("count"),
            Token::text("a"),
            Token::ArgSeparator,
            Token::text(""),
            Token::ArgSeparator,
            Token::text("c"),
            Token::MacroEnd,
        ];
        assert_eq!(expander.expand(&three).unwrap().flatten_text(), "3");
    }

    #[test]
    fn test_explicit_close_returns_surplus() {
        let mut builder = MacroRegistryBuilder::new();
        builder.register_fn("first", |call| {
            let first = call.parse_argument()?;
            let rest = call.close()?;
            assert!(call.is_closed());
            Ok(vec![first, call.raw(format!("+{}", rest.len()))])
        });
        let registry = builder.build();

        let tokens = [
            Token::macro_start("first"),
            Token::text("a"),
            Token::ArgSeparator,
            Token::text("b"),
            Token::ArgSeparator,
            Token::text("c"),
            Token::MacroEnd,
            Token::text("!"),
        ];
        let tree = Expander::new(&registry, &RejectUnknown).expand(&tokens).unwrap();
        assert_eq!(tree.flatten_text(), "a+2!");
    }

    #[test]
    fn test_headword_is_visible_to_handlers() {
        let mut builder = MacroRegistryBuilder::new();
        builder.register_fn("this", |call| {
            call.consume_marker();
            Ok(vec![OutputNode::raw(call.headword().unwrap_or("?"))])
        });
        let registry = builder.build();

        let tokens = [Token::macro_start("this"), Token::MacroEnd];
        let tree = Expander::new(&registry, &RejectUnknown)
            .with_headword("kat")
            .expand(&tokens)
            .unwrap();
        assert_eq!(tree.flatten_text(), "kat");
    }
}
