//! Entry pipeline hooks
//!
//! Two extension points surround the expansion of an entry:
//!
//! - a **pre-pass** ([`PreprocessHook`]) that may rewrite the raw record
//!   before it is lexed; it must be idempotent
//! - **post-pass transforms** ([`PostTransform`]) that decorate a plain text
//!   span, applied only where a handler or the entry pipeline asks for them
//!   by tag

use crate::dictionary::{EntryKind, EntryRecord};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Tag of the phonetic transform
pub const PHONETIC_TAG: &str = "ipa";

/// Hook failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{hook}: {message}")]
pub struct HookError {
    pub hook: String,
    pub message: String,
}

impl HookError {
    pub fn new(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// Rewrites a record before tokenization
pub trait PreprocessHook: Send + Sync {
    fn preprocess(&self, record: &mut EntryRecord) -> Result<(), HookError>;
}

/// Collapse whitespace runs to a single space and trim every field
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeWhitespace;

impl NormalizeWhitespace {
    fn normalize(text: &mut String) {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized != *text {
            *text = normalized;
        }
    }
}

impl PreprocessHook for NormalizeWhitespace {
    fn preprocess(&self, record: &mut EntryRecord) -> Result<(), HookError> {
        Self::normalize(&mut record.headword);
        match &mut record.kind {
            EntryKind::Full { parts } => parts.iter_mut().for_each(Self::normalize),
            EntryKind::Reference { target } => Self::normalize(target),
        }
        Ok(())
    }
}

/// Pure string-to-string decoration of a text span
pub trait PostTransform: Send + Sync {
    /// Tag recorded on the `Transformed` nodes this transform produces
    fn tag(&self) -> &str;

    fn apply(&self, text: &str) -> Result<String, HookError>;
}

/// Phonetic annotation: wraps the span in delimiters
///
/// Surrounding whitespace is dropped and an empty span stays empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneticTransform {
    prefix: String,
    suffix: String,
}

impl PhoneticTransform {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl Default for PhoneticTransform {
    fn default() -> Self {
        Self::new("/", "/")
    }
}

impl PostTransform for PhoneticTransform {
    fn tag(&self) -> &str {
        PHONETIC_TAG
    }

    fn apply(&self, text: &str) -> Result<String, HookError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}{}{}", self.prefix, text, self.suffix))
    }
}

/// Post-pass transforms keyed by tag
#[derive(Clone, Default)]
pub struct TransformSet {
    transforms: HashMap<String, Arc<dyn PostTransform>>,
}

impl TransformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform under its own tag, replacing any previous one
    pub fn insert(&mut self, transform: impl PostTransform + 'static) -> &mut Self {
        let transform: Arc<dyn PostTransform> = Arc::new(transform);
        self.transforms.insert(transform.tag().to_string(), transform);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<dyn PostTransform>> {
        self.transforms.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.transforms.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl fmt::Debug for TransformSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("TransformSet").field("tags", &tags).finish()
    }
}
