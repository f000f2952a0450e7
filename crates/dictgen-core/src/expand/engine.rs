//! Expansion driver

use super::call::MacroCall;
use super::cursor::Cursor;
use super::{ExpandError, ExpandResult};
use crate::hooks::TransformSet;
use crate::node::OutputNode;
use crate::registry::{MacroHandler, MacroRegistry};
use crate::token::Token;
use tracing::trace;

/// Default bound on nested macro invocations
pub const DEFAULT_MAX_DEPTH: usize = 64;

static END_OF_INPUT: Token = Token::EndOfInput;

/// Tunables for a single expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Maximum number of simultaneously open invocations
    pub max_depth: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Expand a token stream with the given registry, fallback and transforms
pub fn expand(
    tokens: &[Token],
    registry: &MacroRegistry,
    fallback: &dyn MacroHandler,
    transforms: &TransformSet,
) -> ExpandResult<OutputNode> {
    Expander::new(registry, fallback)
        .with_transforms(transforms)
        .expand(tokens)
}

/// Immutable expansion context
///
/// An expander only borrows shared, read-only collaborators, so one frozen
/// registry can back any number of expanders on different threads.
pub struct Expander<'a> {
    registry: &'a MacroRegistry,
    fallback: &'a dyn MacroHandler,
    transforms: Option<&'a TransformSet>,
    options: ExpandOptions,
    headword: Option<&'a str>,
}

impl<'a> Expander<'a> {
    pub fn new(registry: &'a MacroRegistry, fallback: &'a dyn MacroHandler) -> Self {
        Self {
            registry,
            fallback,
            transforms: None,
            options: ExpandOptions::default(),
            headword: None,
        }
    }

    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_transforms(mut self, transforms: &'a TransformSet) -> Self {
        self.transforms = Some(transforms);
        self
    }

    /// Headword of the entry being expanded, exposed to handlers
    pub fn with_headword(mut self, headword: &'a str) -> Self {
        self.headword = Some(headword);
        self
    }

    pub fn options(&self) -> ExpandOptions {
        self.options
    }

    /// Expand a whole stream into a root `Group`
    pub fn expand(&self, tokens: &[Token]) -> ExpandResult<OutputNode> {
        let pass = Pass {
            expander: self,
            tokens,
        };

        let mut nodes = Vec::new();
        let (cursor, end) = pass.expand_scope(Cursor::new(), &mut nodes)?;
        match end {
            ScopeEnd::EndOfInput => Ok(OutputNode::Group(nodes)),
            ScopeEnd::Separator | ScopeEnd::MacroEnd => Err(ExpandError::UnexpectedMarker {
                marker: pass.token(cursor).clone(),
                position: cursor.position,
            }),
        }
    }

    /// Apply the transform registered under `tag` to a node's text
    ///
    /// A node already transformed with the same tag is returned unchanged.
    pub fn transform(&self, tag: &str, node: OutputNode) -> ExpandResult<OutputNode> {
        if node.transform_tag() == Some(tag) {
            return Ok(node);
        }

        let transform = self
            .transforms
            .and_then(|set| set.get(tag))
            .ok_or_else(|| ExpandError::UnknownTransform {
                tag: tag.to_string(),
            })?;

        let text = node.flatten_text();
        let result = transform
            .apply(&text)
            .map_err(|e| ExpandError::Transform {
                tag: tag.to_string(),
                message: e.to_string(),
            })?;

        trace!("Transformed {:?} with '{}' into {:?}", text, tag, result);
        Ok(OutputNode::transformed(tag, [OutputNode::Raw(result)]))
    }

    pub(crate) fn headword(&self) -> Option<&'a str> {
        self.headword
    }
}

/// What stopped a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeEnd {
    Separator,
    MacroEnd,
    EndOfInput,
}

/// One walk over one token slice
pub(crate) struct Pass<'p> {
    pub(crate) expander: &'p Expander<'p>,
    tokens: &'p [Token],
}

impl<'p> Pass<'p> {
    pub(crate) fn token(&self, cursor: Cursor) -> &'p Token {
        self.tokens.get(cursor.position).unwrap_or(&END_OF_INPUT)
    }

    /// Expand until a separator, macro end or end of input
    ///
    /// The terminating token is not consumed.
    pub(crate) fn expand_scope(
        &self,
        mut cursor: Cursor,
        out: &mut Vec<OutputNode>,
    ) -> ExpandResult<(Cursor, ScopeEnd)> {
        loop {
            match self.token(cursor) {
                Token::Text(text) => {
                    if !text.is_empty() {
                        out.push(OutputNode::raw(text.as_str()));
                    }
                    cursor = cursor.advance();
                }
                Token::MacroStart(name) => cursor = self.invoke(name, cursor, out)?,
                Token::ArgSeparator => return Ok((cursor, ScopeEnd::Separator)),
                Token::MacroEnd => return Ok((cursor, ScopeEnd::MacroEnd)),
                Token::EndOfInput => return Ok((cursor, ScopeEnd::EndOfInput)),
            }
        }
    }

    /// Dispatch one invocation whose start marker is under `cursor`
    fn invoke(
        &self,
        name: &'p str,
        cursor: Cursor,
        out: &mut Vec<OutputNode>,
    ) -> ExpandResult<Cursor> {
        let max = self.expander.options.max_depth;
        if cursor.depth >= max {
            return Err(ExpandError::MaxDepthExceeded {
                max,
                name: name.to_string(),
                position: cursor.position,
            });
        }

        let mut call = MacroCall::new(self, name, cursor.descend());
        let nodes = match self.expander.registry.resolve(name) {
            Some(handler) => {
                trace!("Expanding '{}' at token {} (depth {})", name, cursor.position, cursor.depth);
                handler.expand(&mut call)?
            }
            None => {
                trace!("No handler for '{}' at token {}, using fallback", name, cursor.position);
                self.expander.fallback.expand(&mut call)?
            }
        };

        if !call.cursor().is_past(&cursor) {
            return Err(ExpandError::NoProgress {
                name: name.to_string(),
                position: cursor.position,
            });
        }

        out.extend(nodes);
        if !call.is_closed() {
            out.extend(call.close()?);
        }

        Ok(Cursor {
            position: call.cursor().position,
            depth: cursor.depth,
        })
    }
}
