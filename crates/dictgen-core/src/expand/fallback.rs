//! Handlers for macros that have no registered handler
//!
//! The engine cannot know how many arguments an unknown macro takes, so the
//! fallback decides: [`WrapUnknown`] reads a configurable number of them,
//! [`EchoUnknown`] reads none and leaves a literal marker, and
//! [`RejectUnknown`] fails the entry.

use super::call::MacroCall;
use super::{ExpandError, ExpandResult};
use crate::node::OutputNode;
use crate::registry::MacroHandler;

/// Placeholder replaced by the macro name in wrap templates
const NAME_PLACEHOLDER: &str = "{name}";

/// Fail on any unknown macro
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectUnknown;

impl MacroHandler for RejectUnknown {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        Err(ExpandError::UnknownMacro {
            name: call.name().to_string(),
            position: call.cursor().position,
        })
    }
}

/// Emit `\name` literally and leave any arguments as plain content
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoUnknown;

impl MacroHandler for EchoUnknown {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        call.consume_marker();
        Ok(vec![call.raw(format!("\\{}", call.name()))])
    }
}

/// Wrap the arguments of an unknown macro between two literals
///
/// `{name}` in either template is replaced by the macro name. `arity` is an
/// upper bound: missing arguments are not an error. With `arity: None` every
/// argument present in the source is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapUnknown {
    open: String,
    close: String,
    arity: Option<usize>,
}

impl WrapUnknown {
    pub fn new(open: impl Into<String>, close: impl Into<String>, arity: Option<usize>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            arity,
        }
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }
}

impl Default for WrapUnknown {
    fn default() -> Self {
        Self::new("<{name}>", "</{name}>", Some(1))
    }
}

impl MacroHandler for WrapUnknown {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        call.consume_marker();

        let name = call.name().to_string();
        let mut nodes = vec![call.raw(self.open.replace(NAME_PLACEHOLDER, &name))];
        match self.arity {
            Some(arity) => {
                for _ in 0..arity {
                    if !call.has_argument() {
                        break;
                    }
                    nodes.push(call.parse_argument()?);
                }
            }
            None => {
                while call.has_argument() {
                    nodes.push(call.parse_argument()?);
                }
            }
        }
        nodes.push(call.raw(self.close.replace(NAME_PLACEHOLDER, &name)));

        Ok(vec![call.group(nodes)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::Expander;
    use crate::registry::MacroRegistryBuilder;
    use crate::token::Token;

    #[test]
    fn test_wrap_single_argument_is_three_node_group() {
        let registry = MacroRegistryBuilder::new().build();
        let fallback = WrapUnknown::new("<foo>", "</foo>", Some(1));
        let tokens = [Token::macro_start("xyz"), Token::text("bar"), Token::MacroEnd];

        let tree = Expander::new(&registry, &fallback).expand(&tokens).unwrap();
        assert_eq!(
            tree,
            OutputNode::group([OutputNode::group([
                OutputNode::raw("<foo>"),
                OutputNode::group([OutputNode::raw("bar")]),
                OutputNode::raw("</foo>"),
            ])])
        );
    }

    #[test]
    fn test_wrap_uses_macro_name() {
        let registry = MacroRegistryBuilder::new().build();
        let fallback = WrapUnknown::new("<{name}>", "</{name}>", None);
        let tokens = [
            Token::macro_start("gloss"),
            Token::text("a"),
            Token::ArgSeparator,
            Token::text("b"),
            Token::MacroEnd,
        ];

        let tree = Expander::new(&registry, &fallback).expand(&tokens).unwrap();
        assert_eq!(tree.flatten_text(), "<gloss>ab</gloss>");
    }

    #[test]
    fn test_wrap_without_arguments() {
        let registry = MacroRegistryBuilder::new().build();
        let fallback = WrapUnknown::new("[", "]", Some(0));
        let tokens = [Token::macro_start("x"), Token::MacroEnd, Token::text("y")];

        let tree = Expander::new(&registry, &fallback).expand(&tokens).unwrap();
        assert_eq!(tree.flatten_text(), "[]y");
    }

    #[test]
    fn test_wrap_tolerates_missing_arguments() {
        let registry = MacroRegistryBuilder::new().build();
        let fallback = WrapUnknown::default();
        let tokens = [Token::macro_start("dag"), Token::MacroEnd, Token::text("!")];

        let tree = Expander::new(&registry, &fallback).expand(&tokens).unwrap();
        assert_eq!(tree.flatten_text(), "<dag></dag>!");
    }

    #[test]
    fn test_echo_leaves_arguments_as_content() {
        let registry = MacroRegistryBuilder::new().build();
        let tokens = [Token::macro_start("foo"), Token::text("bar"), Token::MacroEnd];

        let tree = Expander::new(&registry, &EchoUnknown).expand(&tokens).unwrap();
        assert_eq!(tree.flatten_text(), "\\foobar");
    }
}
