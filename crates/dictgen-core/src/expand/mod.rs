//! Macro expansion
//!
//! This module turns a [`TokenStream`](crate::token::TokenStream) into an
//! [`OutputNode`] tree by recursive descent.
//!
//! # Algorithm
//!
//! 1. Text tokens become `Raw` nodes
//! 2. A macro start is resolved against the [`MacroRegistry`]; unknown names
//!    go to the caller-supplied fallback handler
//! 3. The handler receives a [`MacroCall`] and pulls its arguments through
//!    [`MacroCall::parse_argument`], which recursively expands nested macros
//! 4. Argument separators and macro ends terminate the current scope and are
//!    handed back to whoever opened it
//!
//! Recursion is bounded by [`ExpandOptions::max_depth`]; a handler that does
//! not move past its own start marker is reported as [`ExpandError::NoProgress`]
//! instead of looping.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dictgen_core::expand::{Expander, WrapUnknown};
//! use dictgen_core::registry::MacroRegistryBuilder;
//! use dictgen_core::token::Token;
//!
//! let registry = MacroRegistryBuilder::new().build();
//! let fallback = WrapUnknown::new("<{name}>", "</{name}>", Some(1));
//! let tokens = [Token::macro_start("foo"), Token::text("bar"), Token::MacroEnd];
//!
//! let tree = Expander::new(&registry, &fallback).expand(&tokens).unwrap();
//! assert_eq!(tree.flatten_text(), "<foo>bar</foo>");
//! ```

mod call;
mod cursor;
mod engine;
mod fallback;

pub use call::MacroCall;
pub use cursor::Cursor;
pub use engine::{DEFAULT_MAX_DEPTH, ExpandOptions, Expander, expand};
pub use fallback::{EchoUnknown, RejectUnknown, WrapUnknown};

use crate::token::Token;
use thiserror::Error;

/// Result type for macro expansion
pub type ExpandResult<T> = Result<T, ExpandError>;

/// Fatal expansion errors
///
/// Positions are token indices into the stream being expanded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// The stream ended while an invocation or argument was still open
    #[error("Unterminated macro '{name}' starting at token {position}")]
    UnterminatedMacro { name: String, position: usize },

    /// A handler returned without consuming its start marker
    #[error("Handler for macro '{name}' made no progress at token {position}")]
    NoProgress { name: String, position: usize },

    /// Nesting of invocations exceeded the configured bound
    #[error("Macro nesting depth exceeded (max: {max}) at '{name}', token {position}")]
    MaxDepthExceeded {
        max: usize,
        name: String,
        position: usize,
    },

    /// A separator or macro end outside of any invocation
    #[error("Unexpected {marker} at token {position}")]
    UnexpectedMarker { marker: Token, position: usize },

    /// A handler asked for an argument the invocation does not have
    #[error("Missing argument for macro '{name}' at token {position}")]
    MissingArgument { name: String, position: usize },

    /// No handler and the fallback refuses unknown macros
    #[error("Unsupported macro '{name}' at token {position}")]
    UnknownMacro { name: String, position: usize },

    /// A handler rejected its invocation
    #[error("Macro '{name}' at token {position}: {message}")]
    Handler {
        name: String,
        position: usize,
        message: String,
    },

    /// A handler asked for a transform that is not registered
    #[error("Unknown transform '{tag}'")]
    UnknownTransform { tag: String },

    /// A post-pass transform failed
    #[error("Transform '{tag}' failed: {message}")]
    Transform { tag: String, message: String },
}

impl ExpandError {
    /// Token index the error refers to, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            ExpandError::UnterminatedMacro { position, .. }
            | ExpandError::NoProgress { position, .. }
            | ExpandError::MaxDepthExceeded { position, .. }
            | ExpandError::UnexpectedMarker { position, .. }
            | ExpandError::MissingArgument { position, .. }
            | ExpandError::UnknownMacro { position, .. }
            | ExpandError::Handler { position, .. } => Some(*position),
            ExpandError::UnknownTransform { .. } | ExpandError::Transform { .. } => None,
        }
    }
}
