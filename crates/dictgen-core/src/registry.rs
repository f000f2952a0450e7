//! Macro registry
//!
//! Handlers are collected in a [`MacroRegistryBuilder`] during setup and
//! frozen into a read-only [`MacroRegistry`] before any entry is expanded.
//! The frozen registry has no mutation API, so it can be shared across
//! worker threads behind an `Arc` without locking.

use crate::expand::{ExpandResult, MacroCall};
use crate::node::OutputNode;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Expands one macro invocation
///
/// The handler receives the live call and must consume at least the start
/// marker; the cursor it leaves behind is where expansion continues.
pub trait MacroHandler: Send + Sync {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>>;
}

impl<F> MacroHandler for F
where
    F: Fn(&mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> + Send + Sync,
{
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        self(call)
    }
}

/// Non-fatal registration problems
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryWarning {
    /// A handler replaced an earlier one with the same name
    DuplicateName { name: String },
}

impl fmt::Display for RegistryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryWarning::DuplicateName { name } => {
                write!(f, "Macro '{name}' registered more than once; last registration wins")
            }
        }
    }
}

/// Mutable registry used during setup
#[derive(Default)]
pub struct MacroRegistryBuilder {
    handlers: HashMap<String, Arc<dyn MacroHandler>>,
    warnings: Vec<RegistryWarning>,
}

impl MacroRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, handler: impl MacroHandler + 'static) -> &mut Self {
        self.register_arc(name, Arc::new(handler))
    }

    /// Register a closure handler
    pub fn register_fn<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> + Send + Sync + 'static,
    {
        self.register_arc(name, Arc::new(handler))
    }

    pub fn register_arc(&mut self, name: impl Into<String>, handler: Arc<dyn MacroHandler>) -> &mut Self {
        let name = name.into();
        debug!("Registering macro '{}'", name);

        if self.handlers.insert(name.clone(), handler).is_some() {
            let warning = RegistryWarning::DuplicateName { name };
            warn!("{}", warning);
            self.warnings.push(warning);
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn warnings(&self) -> &[RegistryWarning] {
        &self.warnings
    }

    /// Freeze the registry
    pub fn build(self) -> MacroRegistry {
        debug!("Freezing macro registry with {} handlers", self.handlers.len());
        MacroRegistry {
            handlers: self.handlers,
            warnings: self.warnings,
        }
    }
}

/// Read-only mapping from macro name to handler
pub struct MacroRegistry {
    handlers: HashMap<String, Arc<dyn MacroHandler>>,
    warnings: Vec<RegistryWarning>,
}

impl MacroRegistry {
    /// Look up a handler by its case-sensitive name
    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn MacroHandler>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Warnings collected while the registry was being built
    pub fn warnings(&self) -> &[RegistryWarning] {
        &self.warnings
    }
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("names", &self.names())
            .field("warnings", &self.warnings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::{Expander, RejectUnknown};
    use crate::token::Token;

    #[test]
    fn test_resolve_is_case_sensitive() {
        let mut builder = MacroRegistryBuilder::new();
        builder.register_fn("Sup", |call| Ok(vec![call.parse_argument()?]));
        let registry = builder.build();

        assert!(registry.resolve("Sup").is_some());
        assert!(registry.resolve("sup").is_none());
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_last_registration_wins_with_warning() {
        let mut builder = MacroRegistryBuilder::new();
        builder
            .register_fn("x", |call| {
                call.consume_marker();
                Ok(vec![call.raw("first")])
            })
            .register_fn("x", |call| {
                call.consume_marker();
                Ok(vec![call.raw("second")])
            });

        assert_eq!(
            builder.warnings(),
            &[RegistryWarning::DuplicateName {
                name: "x".to_string()
            }]
        );

        let registry = builder.build();
        assert_eq!(registry.warnings().len(), 1);

        let tree = Expander::new(&registry, &RejectUnknown)
            .expand(&[Token::macro_start("x"), Token::MacroEnd])
            .unwrap();
        assert_eq!(tree.flatten_text(), "second");
    }

    #[test]
    fn test_names_are_sorted() {
        let mut builder = MacroRegistryBuilder::new();
        builder.register("b", RejectUnknown);
        builder.register("a", RejectUnknown);
        builder.register("c", RejectUnknown);
        assert!(builder.contains("a"));

        let registry = builder.build();
        assert_eq!(registry.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_frozen_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MacroRegistry>();
    }
}
