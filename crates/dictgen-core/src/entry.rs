//! Entry pipeline
//!
//! [`EntryPipeline`] turns one [`EntryRecord`] into one [`ExpandedEntry`]:
//!
//! 1. the pre-pass hook rewrites the raw record
//! 2. the record shape is validated
//! 3. the definition part is split into senses, examples and comments
//! 4. every field is lexed and expanded with the headword visible to `\this`
//! 5. the pronunciation field goes through the phonetic transform
//!
//! A failure at any step fails the entry only; no partial tree is produced.

use crate::dictionary::{EntryKind, EntryRecord};
use crate::expand::{ExpandError, ExpandOptions, Expander};
use crate::hooks::{HookError, PHONETIC_TAG, PreprocessHook, TransformSet};
use crate::lexer::{LexError, lex};
use crate::node::OutputNode;
use crate::registry::{MacroHandler, MacroRegistry};
use crate::sense::{
    RawDefinition, RawSense, SENSE_SEPARATOR, SenseError, find_marker,
    split_definition,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fewest parts a full entry may have after its headword
pub const MIN_PARTS: usize = 3;

/// Most parts a full entry may have after its headword
pub const MAX_PARTS: usize = 5;

/// Fields of a full entry after the headword, in source order
pub const FULL_FIELDS: [EntryField; MAX_PARTS] = [
    EntryField::PartOfSpeech,
    EntryField::Etymology,
    EntryField::Definition,
    EntryField::Forms,
    EntryField::Pronunciation,
];

/// A named field of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryField {
    Headword,
    PartOfSpeech,
    Etymology,
    Definition,
    Forms,
    Pronunciation,
    Target,
}

impl EntryField {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryField::Headword => "headword",
            EntryField::PartOfSpeech => "part_of_speech",
            EntryField::Etymology => "etymology",
            EntryField::Definition => "definition",
            EntryField::Forms => "forms",
            EntryField::Pronunciation => "pronunciation",
            EntryField::Target => "target",
        }
    }
}

impl fmt::Display for EntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an entry failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error(
        "An entry must have at least 4 parts: word, part of speech, etymology, definition (found {})",
        .found + 1
    )]
    TooFewParts { found: usize },

    #[error(
        "An entry must have at most 6 parts: word, part of speech, etymology, definition, forms, IPA (found {})",
        .found + 1
    )]
    TooManyParts { found: usize },

    #[error("Invalid headword: {reason}")]
    InvalidHeadword { reason: String },

    #[error("'{token}' cannot be used in the lemma")]
    ReservedInHeadword { token: &'static str },

    #[error("'{token}' cannot be used in a reference entry")]
    ReservedInReference { token: &'static str },

    #[error(transparent)]
    Sense(#[from] SenseError),

    #[error("Preprocessing error: {0}")]
    Preprocess(#[source] HookError),

    #[error("Syntax error in {field}: {source}")]
    Lex {
        field: EntryField,
        #[source]
        source: LexError,
    },

    #[error("Expansion error in {field}: {source}")]
    Expand {
        field: EntryField,
        #[source]
        source: ExpandError,
    },
}

impl EntryError {
    /// Field the error was raised in, if it is tied to one
    pub fn field(&self) -> Option<EntryField> {
        match self {
            EntryError::Lex { field, .. } | EntryError::Expand { field, .. } => Some(*field),
            EntryError::InvalidHeadword { .. } | EntryError::ReservedInHeadword { .. } => {
                Some(EntryField::Headword)
            }
            EntryError::Sense(_) => Some(EntryField::Definition),
            EntryError::TooFewParts { .. }
            | EntryError::TooManyParts { .. }
            | EntryError::ReservedInReference { .. }
            | EntryError::Preprocess(_) => None,
        }
    }
}

/// Shape of an expanded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandedKind {
    Full,
    Reference,
}

/// An expanded example sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedExample {
    pub text: OutputNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<OutputNode>,
}

/// An expanded sense
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedSense {
    pub def: OutputNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<OutputNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ExpandedExample>,
}

/// Primary definition and numbered senses of a full entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedDefinition {
    pub primary: ExpandedSense,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub senses: Vec<ExpandedSense>,
}

impl ExpandedDefinition {
    /// Definitions of the primary sense and every numbered sense, space separated
    ///
    /// A single definition is returned as is; examples and comments are left out.
    pub fn summary(&self) -> OutputNode {
        let mut defs = std::iter::once(&self.primary)
            .chain(&self.senses)
            .map(|sense| &sense.def)
            .filter(|def| !def.is_empty());

        let Some(first) = defs.next() else {
            return OutputNode::empty();
        };
        let mut children = vec![first.clone()];
        for def in defs {
            children.push(OutputNode::raw(" "));
            children.push(def.clone());
        }
        match children.len() {
            1 => children.swap_remove(0),
            _ => OutputNode::Group(children),
        }
    }
}

/// One fully expanded entry
///
/// `tree` is a `Group` with one child per field:
/// `[headword, pos, etymology, definition, forms, ipa]` for full entries and
/// `[headword, target]` for references. Absent fields are empty groups. The
/// definition child is [`ExpandedDefinition::summary`]; the full sense
/// structure is in `definition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedEntry {
    pub headword: String,
    pub line: usize,
    pub sort_key: String,
    pub kind: ExpandedKind,
    pub tree: OutputNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<ExpandedDefinition>,
}

impl ExpandedEntry {
    /// Expanded node of one field
    pub fn field(&self, field: EntryField) -> Option<&OutputNode> {
        let index = match (self.kind, field) {
            (_, EntryField::Headword) => 0,
            (ExpandedKind::Reference, EntryField::Target) => 1,
            (ExpandedKind::Reference, _) | (ExpandedKind::Full, EntryField::Target) => return None,
            (ExpandedKind::Full, field) => 1 + FULL_FIELDS.iter().position(|f| *f == field)?,
        };
        self.tree.children().get(index)
    }

    /// Flattened text of one field, empty if absent
    pub fn field_text(&self, field: EntryField) -> String {
        self.field(field).map(OutputNode::flatten_text).unwrap_or_default()
    }
}

/// Key entries are ordered by
///
/// Compatibility decomposition, then combining marks and punctuation are
/// dropped, the rest is recomposed and lowercased, so `Éclair` sorts next to
/// `eclair`.
pub fn sort_key(word: &str) -> String {
    word.nfkd()
        .filter(|c| !is_combining_mark(*c) && !is_punctuation(*c))
        .nfc()
        .flat_map(char::to_lowercase)
        .collect()
}

/// Characters of the Unicode punctuation categories (`Pc`, `Pd`, `Ps`, `Pe`,
/// `Pi`, `Pf`, `Po`) in the scripts a dictionary source is likely to use
fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        '!'..='#'
            | '%'..='*'
            | ','..='/'
            | ':'
            | ';'
            | '?'
            | '@'
            | '['..=']'
            | '_'
            | '{'
            | '}'
            | '¡'
            | '§'
            | '«'
            | '¶'
            | '·'
            | '»'
            | '¿'
            | '\u{037E}'
            | '\u{0387}'
            | '\u{055A}'..='\u{055F}'
            | '\u{0589}'
            | '\u{058A}'
            | '\u{05BE}'
            | '\u{05C0}'
            | '\u{05C3}'
            | '\u{05C6}'
            | '\u{05F3}'
            | '\u{05F4}'
            | '\u{060C}'
            | '\u{060D}'
            | '\u{061B}'
            | '\u{061D}'..='\u{061F}'
            | '\u{066A}'..='\u{066D}'
            | '\u{06D4}'
            | '\u{0964}'
            | '\u{0965}'
            | '\u{0970}'
            | '\u{0E4F}'
            | '\u{0E5A}'
            | '\u{0E5B}'
            | '\u{10FB}'
            | '\u{1360}'..='\u{1368}'
            | '\u{1400}'
            | '\u{166E}'
            | '\u{169B}'
            | '\u{169C}'
            | '\u{16EB}'..='\u{16ED}'
            | '\u{1800}'..='\u{180A}'
            | '\u{2010}'..='\u{2027}'
            | '\u{2030}'..='\u{2043}'
            | '\u{2045}'..='\u{2051}'
            | '\u{2053}'..='\u{205E}'
            | '\u{207D}'
            | '\u{207E}'
            | '\u{208D}'
            | '\u{208E}'
            | '\u{2308}'..='\u{230B}'
            | '\u{2329}'
            | '\u{232A}'
            | '\u{2768}'..='\u{2775}'
            | '\u{27C5}'
            | '\u{27C6}'
            | '\u{27E6}'..='\u{27EF}'
            | '\u{2983}'..='\u{2998}'
            | '\u{29D8}'..='\u{29DB}'
            | '\u{29FC}'
            | '\u{29FD}'
            | '\u{2CF9}'..='\u{2CFC}'
            | '\u{2CFE}'
            | '\u{2CFF}'
            | '\u{2E00}'..='\u{2E2E}'
            | '\u{2E30}'..='\u{2E4F}'
            | '\u{2E52}'..='\u{2E5D}'
            | '\u{3001}'..='\u{3003}'
            | '\u{3008}'..='\u{3011}'
            | '\u{3014}'..='\u{301F}'
            | '\u{3030}'
            | '\u{303D}'
            | '\u{30A0}'
            | '\u{30FB}'
            | '\u{A4FE}'
            | '\u{A4FF}'
            | '\u{A60D}'..='\u{A60F}'
            | '\u{A673}'
            | '\u{A67E}'
            | '\u{A6F2}'..='\u{A6F7}'
            | '\u{A8CE}'
            | '\u{A8CF}'
            | '\u{FD3E}'
            | '\u{FD3F}'
            | '\u{FE10}'..='\u{FE19}'
            | '\u{FE30}'..='\u{FE52}'
            | '\u{FE54}'..='\u{FE61}'
            | '\u{FE63}'
            | '\u{FE68}'
            | '\u{FE6A}'
            | '\u{FE6B}'
            | '\u{FF01}'..='\u{FF03}'
            | '\u{FF05}'..='\u{FF0A}'
            | '\u{FF0C}'..='\u{FF0F}'
            | '\u{FF1A}'
            | '\u{FF1B}'
            | '\u{FF1F}'
            | '\u{FF20}'
            | '\u{FF3B}'..='\u{FF3D}'
            | '\u{FF3F}'
            | '\u{FF5B}'
            | '\u{FF5D}'
            | '\u{FF5F}'..='\u{FF65}'
    )
}

/// Expands entries with a shared, frozen registry
#[derive(Clone)]
pub struct EntryPipeline {
    registry: Arc<MacroRegistry>,
    fallback: Arc<dyn MacroHandler>,
    transforms: Arc<TransformSet>,
    preprocess: Option<Arc<dyn PreprocessHook>>,
    options: ExpandOptions,
    derive_pronunciation: bool,
}

impl EntryPipeline {
    pub fn new(registry: Arc<MacroRegistry>, fallback: Arc<dyn MacroHandler>) -> Self {
        Self {
            registry,
            fallback,
            transforms: Arc::new(TransformSet::new()),
            preprocess: None,
            options: ExpandOptions::default(),
            derive_pronunciation: false,
        }
    }

    pub fn with_transforms(mut self, transforms: TransformSet) -> Self {
        self.transforms = Arc::new(transforms);
        self
    }

    pub fn with_preprocess(mut self, hook: impl PreprocessHook + 'static) -> Self {
        self.preprocess = Some(Arc::new(hook));
        self
    }

    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    /// Derive the pronunciation from the headword when the entry has none
    pub fn derive_pronunciation(mut self, enabled: bool) -> Self {
        self.derive_pronunciation = enabled;
        self
    }

    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    pub fn transforms(&self) -> &TransformSet {
        &self.transforms
    }

    pub fn options(&self) -> ExpandOptions {
        self.options
    }

    /// Expand one entry
    pub fn process(&self, mut record: EntryRecord) -> Result<ExpandedEntry, EntryError> {
        if let Some(hook) = &self.preprocess {
            hook.preprocess(&mut record).map_err(EntryError::Preprocess)?;
        }
        match &record.kind {
            EntryKind::Full { parts } => {
                validate_headword(&record.headword)?;
                validate_parts(parts)?;
            }
            EntryKind::Reference { target } => {
                validate_reference(&record.headword, target)?;
                validate_headword(&record.headword)?;
            }
        }

        let EntryRecord {
            headword,
            line,
            kind,
        } = record;
        trace!("Expanding entry '{}' from line {}", headword, line);

        let expander = Expander::new(&self.registry, self.fallback.as_ref())
            .with_transforms(&self.transforms)
            .with_options(self.options)
            .with_headword(&headword);

        let headword_node = expand_field(&expander, EntryField::Headword, &headword)?;
        let (kind, tree, definition) = match &kind {
            EntryKind::Full { parts } => {
                let mut children = Vec::with_capacity(1 + MAX_PARTS);
                let mut definition = None;
                for (index, field) in FULL_FIELDS.into_iter().enumerate() {
                    let part = parts.get(index).map(String::as_str).unwrap_or_default();
                    let node = match field {
                        EntryField::Definition => {
                            let expanded = expand_definition(&expander, split_definition(part)?)?;
                            let summary = expanded.summary();
                            definition = Some(expanded);
                            summary
                        }
                        EntryField::Pronunciation => {
                            self.pronunciation(&expander, part, &headword_node)?
                        }
                        _ => expand_field(&expander, field, part)?,
                    };
                    children.push(node);
                }
                children.insert(0, headword_node);
                (ExpandedKind::Full, OutputNode::Group(children), definition)
            }
            EntryKind::Reference { target } => {
                let target = expand_field(&expander, EntryField::Target, target)?;
                (ExpandedKind::Reference, OutputNode::group([headword_node, target]), None)
            }
        };

        Ok(ExpandedEntry {
            sort_key: sort_key(&headword),
            headword,
            line,
            kind,
            tree,
            definition,
        })
    }

    /// Expand the pronunciation part, or derive it from the headword
    ///
    /// Without a registered phonetic transform the part is expanded as is and
    /// nothing is derived.
    fn pronunciation(
        &self,
        expander: &Expander<'_>,
        part: &str,
        headword: &OutputNode,
    ) -> Result<OutputNode, EntryError> {
        let field = EntryField::Pronunciation;
        let node = expand_field(expander, field, part)?;
        if !self.transforms.contains(PHONETIC_TAG) {
            return Ok(node);
        }

        let source = if !node.is_empty() {
            node
        } else if self.derive_pronunciation {
            OutputNode::raw(headword.flatten_text())
        } else {
            return Ok(node);
        };

        // `\ipa{…}` as the whole field is already transformed.
        let source = match source.children() {
            [only] if only.transform_tag() == Some(PHONETIC_TAG) => only.clone(),
            _ => source,
        };

        let transformed = expander
            .transform(PHONETIC_TAG, source)
            .map_err(|source| EntryError::Expand { field, source })?;
        if transformed.flatten_text().is_empty() {
            return Ok(OutputNode::empty());
        }
        Ok(OutputNode::group([transformed]))
    }
}

impl fmt::Debug for EntryPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPipeline")
            .field("registry", &self.registry)
            .field("transforms", &self.transforms)
            .field("preprocess", &self.preprocess.is_some())
            .field("options", &self.options)
            .field("derive_pronunciation", &self.derive_pronunciation)
            .finish()
    }
}

fn validate_headword(headword: &str) -> Result<(), EntryError> {
    if headword.trim().is_empty() {
        return Err(EntryError::InvalidHeadword {
            reason: "headword is empty".to_string(),
        });
    }
    if let Some(token) = reserved_token(headword) {
        return Err(EntryError::ReservedInHeadword { token });
    }
    Ok(())
}

fn validate_reference(headword: &str, target: &str) -> Result<(), EntryError> {
    match reserved_token(headword).or_else(|| reserved_token(target)) {
        Some(token) => Err(EntryError::ReservedInReference { token }),
        None => Ok(()),
    }
}

/// Sense separator or structural macro that only the definition part may use
fn reserved_token(text: &str) -> Option<&'static str> {
    if text.contains(SENSE_SEPARATOR) {
        return Some(SENSE_SEPARATOR);
    }
    find_marker(text).map(|(_, marker)| marker.as_str())
}

fn validate_parts(parts: &[String]) -> Result<(), EntryError> {
    let found = parts.len();
    if found < MIN_PARTS {
        return Err(EntryError::TooFewParts { found });
    }
    if found > MAX_PARTS {
        return Err(EntryError::TooManyParts { found });
    }
    Ok(())
}

fn expand_definition(
    expander: &Expander<'_>,
    definition: RawDefinition,
) -> Result<ExpandedDefinition, EntryError> {
    let RawDefinition { primary, senses } = definition;
    Ok(ExpandedDefinition {
        primary: expand_sense(expander, primary)?,
        senses: senses
            .into_iter()
            .map(|sense| expand_sense(expander, sense))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn expand_sense(expander: &Expander<'_>, sense: RawSense) -> Result<ExpandedSense, EntryError> {
    let field = EntryField::Definition;
    let expand_optional = |text: Option<String>| {
        text.map(|text| expand_field(expander, field, &text))
            .transpose()
    };

    let examples = sense
        .examples
        .into_iter()
        .map(|example| {
            Ok::<_, EntryError>(ExpandedExample {
                text: expand_field(expander, field, &example.text)?,
                comment: expand_optional(example.comment)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExpandedSense {
        def: expand_field(expander, field, &sense.def)?,
        comment: expand_optional(sense.comment)?,
        examples,
    })
}

fn expand_field(
    expander: &Expander<'_>,
    field: EntryField,
    text: &str,
) -> Result<OutputNode, EntryError> {
    let tokens = lex(text).map_err(|source| EntryError::Lex { field, source })?;
    expander
        .expand(tokens.as_slice())
        .map_err(|source| EntryError::Expand { field, source })
}
