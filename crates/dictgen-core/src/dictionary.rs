//! Dictionary source loader
//!
//! A dictionary file is line oriented:
//!
//! ```text
//! # comment
//! chat | n. | Lat. cattus | a small \textit{domesticated} cat | chats | ʃa
//! chatte, chaton > chat
//! $backend json
//! long | adj. | | a definition that
//!     continues on an indented line
//! $backend all
//! ```
//!
//! Parsing never fails as a whole; problems are reported as
//! [`DictionaryDiagnostic`]s next to the records that could be read.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Separator between the parts of a full entry
pub const PART_SEPARATOR: char = '|';

/// Separator between the sources and the target of a reference
pub const REFERENCE_ARROW: char = '>';

const COMMENT: char = '#';
const DIRECTIVE: char = '$';
const BACKEND_DIRECTIVE: &str = "$backend";
const ALL_BACKENDS: &str = "all";

/// What a record holds besides its headword
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Parts after the headword: pos, etymology, definition, forms, ipa
    Full { parts: Vec<String> },
    /// Points at the headword of another entry
    Reference { target: String },
}

/// One raw dictionary entry, before expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    pub headword: String,
    /// 1-based line the entry starts on
    pub line: usize,
    pub kind: EntryKind,
}

impl EntryRecord {
    pub fn full(headword: impl Into<String>, line: usize, parts: Vec<String>) -> Self {
        Self {
            headword: headword.into(),
            line,
            kind: EntryKind::Full { parts },
        }
    }

    pub fn reference(headword: impl Into<String>, line: usize, target: impl Into<String>) -> Self {
        Self {
            headword: headword.into(),
            line,
            kind: EntryKind::Reference {
                target: target.into(),
            },
        }
    }

    /// Parts of a full entry; empty for references
    pub fn parts(&self) -> &[String] {
        match &self.kind {
            EntryKind::Full { parts } => parts,
            EntryKind::Reference { .. } => &[],
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, EntryKind::Reference { .. })
    }
}

/// A non-fatal problem found while reading the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryDiagnostic {
    pub line: usize,
    pub message: String,
}

impl DictionaryDiagnostic {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for DictionaryDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Records and diagnostics read from one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DictionaryParse {
    pub records: Vec<EntryRecord>,
    pub diagnostics: Vec<DictionaryDiagnostic>,
}

impl DictionaryParse {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Read every entry of a dictionary source
///
/// `target` selects which `$backend` sections are kept; `None` keeps only
/// the sections marked `all`.
pub fn parse_dictionary(source: &str, target: Option<&str>) -> DictionaryParse {
    let mut reader = Reader {
        target,
        skipping: false,
        logical: None,
        parse: DictionaryParse::default(),
    };

    for (index, line) in source.lines().enumerate() {
        reader.line(index + 1, line);
    }
    reader.ship();

    debug!(
        "Read {} records with {} diagnostics",
        reader.parse.records.len(),
        reader.parse.diagnostics.len()
    );
    reader.parse
}

struct Reader<'t> {
    target: Option<&'t str>,
    skipping: bool,
    /// Start line and text of the logical line being accumulated
    logical: Option<(usize, String)>,
    parse: DictionaryParse,
}

impl Reader<'_> {
    fn diagnostic(&mut self, line: usize, message: impl Into<String>) {
        let diagnostic = DictionaryDiagnostic::new(line, message);
        warn!("{}", diagnostic);
        self.parse.diagnostics.push(diagnostic);
    }

    fn line(&mut self, number: usize, line: &str) {
        let line = match line.find(COMMENT) {
            Some(end) => &line[..end],
            None => line,
        };

        if line.contains('\'') {
            self.diagnostic(
                number,
                "Non-typographic quote! Please use ‘’ (and “” for nested quotes) instead!",
            );
        }

        if line.trim().is_empty() {
            return;
        }

        if line.starts_with(DIRECTIVE) {
            // Logical lines never span directives.
            self.ship();
            self.directive(number, line.trim_end());
            return;
        }

        if self.skipping {
            return;
        }

        if line.starts_with([' ', '\t']) {
            if let Some((_, text)) = &mut self.logical {
                text.push(' ');
                text.push_str(line);
                return;
            }
        }

        self.ship();
        self.logical = Some((number, line.to_string()));
    }

    fn directive(&mut self, number: usize, line: &str) {
        let Some(rest) = line.strip_prefix(BACKEND_DIRECTIVE) else {
            self.diagnostic(number, format!("Unknown directive: {line}"));
            return;
        };

        let backend = rest.trim();
        if backend.is_empty() {
            self.diagnostic(number, "Missing backend name after '$backend'");
            return;
        }

        self.skipping = backend != ALL_BACKENDS && self.target != Some(backend);
        debug!("Line {}: backend '{}', skipping = {}", number, backend, self.skipping);
    }

    fn ship(&mut self) {
        let Some((number, text)) = self.logical.take() else {
            return;
        };

        let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.contains(PART_SEPARATOR) {
            let mut parts = line.split(PART_SEPARATOR).map(|part| part.trim().to_string());
            let headword = parts.next().unwrap_or_default();
            self.parse
                .records
                .push(EntryRecord::full(headword, number, parts.collect()));
            return;
        }

        let Some((sources, target)) = line.split_once(REFERENCE_ARROW) else {
            self.diagnostic(
                number,
                format!("Expected '{PART_SEPARATOR}' or '{REFERENCE_ARROW}' in entry '{line}'"),
            );
            return;
        };

        let target = target.trim();
        for source in sources.split(',').map(str::trim) {
            if source.is_empty() {
                self.diagnostic(number, "Empty word in reference list");
                continue;
            }
            self.parse
                .records
                .push(EntryRecord::reference(source, number, target));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(record: &EntryRecord) -> Vec<&str> {
        record.parts().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_full_entry() {
        let parse = parse_dictionary("chat | n. | Lat. cattus | a cat | chats | ʃa\n", None);

        assert!(!parse.has_diagnostics());
        assert_eq!(parse.records.len(), 1);
        let record = &parse.records[0];
        assert_eq!(record.headword, "chat");
        assert_eq!(record.line, 1);
        assert_eq!(parts(record), vec!["n.", "Lat. cattus", "a cat", "chats", "ʃa"]);
    }

    #[test]
    fn test_references_expand_per_source_word() {
        let parse = parse_dictionary("chatte, chaton > chat", None);
        assert_eq!(
            parse.records,
            vec![
                EntryRecord::reference("chatte", 1, "chat"),
                EntryRecord::reference("chaton", 1, "chat"),
            ]
        );
        assert!(parse.records[0].is_reference());
        assert!(parse.records[0].parts().is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let source = "# header\n\nchat | n. | | a cat # trailing\n   # only a comment\n";
        let parse = parse_dictionary(source, None);
        assert_eq!(parse.records.len(), 1);
        assert_eq!(parts(&parse.records[0]), vec!["n.", "", "a cat"]);
        assert_eq!(parse.records[0].line, 3);
    }

    #[test]
    fn test_continuation_lines_and_whitespace_collapse() {
        let source = "chat | n. | | a   small\n\tand   furry\n    cat\nchien | n. | | a dog";
        let parse = parse_dictionary(source, None);

        assert_eq!(parse.records.len(), 2);
        assert_eq!(parts(&parse.records[0]), vec!["n.", "", "a small and furry cat"]);
        assert_eq!(parse.records[1].headword, "chien");
        assert_eq!(parse.records[1].line, 4);
    }

    #[test]
    fn test_backend_sections() {
        let source = "\
a | n. | | one
$backend json
b | n. | | two
$backend tex
c | n. | | three
$backend all
d | n. | | four
";
        let headwords = |target| {
            parse_dictionary(source, target)
                .records
                .into_iter()
                .map(|record| record.headword)
                .collect::<Vec<_>>()
        };

        assert_eq!(headwords(None), vec!["a", "d"]);
        assert_eq!(headwords(Some("json")), vec!["a", "b", "d"]);
        assert_eq!(headwords(Some("tex")), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_directive_ends_logical_line() {
        let source = "a | n. | | one\n$backend all\n  b | n. | | two";
        let parse = parse_dictionary(source, None);
        assert_eq!(parse.records.len(), 2);
        assert_eq!(parse.records[1].headword, "b");
    }

    #[test]
    fn test_diagnostics() {
        let source = "$include foo\nit's | n. | | x\njust words\n> x\n# it's fine here";
        let parse = parse_dictionary(source, None);

        let lines: Vec<usize> = parse.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
        assert_eq!(parse.diagnostics[0].message, "Unknown directive: $include foo");
        assert_eq!(parse.diagnostics[0].to_string(), "line 1: Unknown directive: $include foo");

        // The quote is reported but the entry is still read.
        assert_eq!(parse.records.len(), 1);
        assert_eq!(parse.records[0].headword, "it's");
    }
}
