//! Definition splitting
//!
//! The definition part of a full entry is split at source level, before any
//! lexing:
//!
//! ```text
//! primary definition
//!     \\ sense 1
//!         \comment comment for sense 1
//!         \ex example 1
//!             \comment comment for example 1
//!         \ex example 2
//!     \\ sense 2
//! ```
//!
//! Everything before the first `\\` is the primary definition. Each piece is
//! closed with a full stop unless it already ends in one.

use thiserror::Error;

/// Separator between senses
pub const SENSE_SEPARATOR: &str = "\\\\";

/// Trailing quotes looked past when deciding on a full stop
const QUOTES: &[char] = &['\'', '`', '’', '\u{02BC}'];

/// Structural macros of the definition part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenseMarker {
    Comment,
    Example,
}

impl SenseMarker {
    pub fn as_str(self) -> &'static str {
        match self {
            SenseMarker::Comment => "\\comment",
            SenseMarker::Example => "\\ex",
        }
    }

    fn name(self) -> &'static str {
        &self.as_str()[1..]
    }
}

/// Malformed sense structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SenseError {
    #[error(
        "\\comment is not allowed in an empty sense or empty primary definition. Use \\textit{{...}} instead."
    )]
    CommentInEmptySense,

    #[error("\\ex is not allowed in an empty sense or empty primary definition.")]
    ExampleInEmptySense,

    #[error("Unexpected \\comment token")]
    UnexpectedComment,
}

/// An example sentence with an optional comment, as source text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExample {
    pub text: String,
    pub comment: Option<String>,
}

/// One sense, as source text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSense {
    pub def: String,
    pub comment: Option<String>,
    pub examples: Vec<RawExample>,
}

/// The split definition part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDefinition {
    pub primary: RawSense,
    pub senses: Vec<RawSense>,
}

/// Split a definition part into its primary definition and senses
pub fn split_definition(text: &str) -> Result<RawDefinition, SenseError> {
    let mut pieces = text.split(SENSE_SEPARATOR);
    let primary = split_sense(pieces.next().unwrap_or_default())?;
    let senses = pieces.map(split_sense).collect::<Result<Vec<_>, _>>()?;
    Ok(RawDefinition { primary, senses })
}

fn split_sense(text: &str) -> Result<RawSense, SenseError> {
    let (def, mut rest) = take_until_marker(text.trim_start());
    let mut sense = RawSense {
        def: full_stop_delimited(def),
        ..RawSense::default()
    };

    if let Some(after) = consume(rest, SenseMarker::Comment) {
        if sense.def.is_empty() {
            return Err(SenseError::CommentInEmptySense);
        }
        let (comment, tail) = take_until_marker(after);
        sense.comment = non_empty(full_stop_delimited(comment));
        rest = tail;
    }

    while let Some(after) = consume(rest, SenseMarker::Example) {
        if sense.def.is_empty() {
            return Err(SenseError::ExampleInEmptySense);
        }
        let (text, tail) = take_until_marker(after);
        let mut example = RawExample {
            text: full_stop_delimited(text),
            comment: None,
        };
        rest = tail;

        if let Some(after) = consume(rest, SenseMarker::Comment) {
            let (comment, tail) = take_until_marker(after);
            example.comment = non_empty(full_stop_delimited(comment));
            rest = tail;
        }
        sense.examples.push(example);
    }

    // Only `\ex` may follow a comment.
    if consume(rest, SenseMarker::Comment).is_some() {
        return Err(SenseError::UnexpectedComment);
    }

    Ok(sense)
}

/// Trim and append a full stop unless the text already ends in one
///
/// `?`, `!`, `.` and `\ldots` count as full stops, also when followed by
/// closing quotes.
pub fn full_stop_delimited(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let unquoted = text.trim_end_matches(QUOTES);
    let mut out = text.to_string();
    if !unquoted.ends_with(['?', '!', '.']) && !unquoted.ends_with("\\ldots") {
        out.push('.');
    }
    out
}

/// First structural macro in `text`, if any, and where it starts
pub fn find_marker(text: &str) -> Option<(usize, SenseMarker)> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('\\') {
        let start = from + offset;
        let rest = &text[start + 1..];
        for marker in [SenseMarker::Comment, SenseMarker::Example] {
            if let Some(after) = rest.strip_prefix(marker.name())
                && !after.starts_with(|c: char| c.is_ascii_alphabetic() || c == '@')
            {
                return Some((start, marker));
            }
        }
        from = start + 1;
    }
    None
}

fn take_until_marker(text: &str) -> (&str, &str) {
    match find_marker(text) {
        Some((start, _)) => text.split_at(start),
        None => (text, ""),
    }
}

/// Text after `marker` when `text` starts with it
fn consume(text: &str, marker: SenseMarker) -> Option<&str> {
    match find_marker(text.trim_start()) {
        Some((0, found)) if found == marker => {
            Some(text.trim_start()[marker.as_str().len()..].trim_start())
        }
        _ => None,
    }
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sense(def: &str) -> RawSense {
        RawSense {
            def: def.to_string(),
            ..RawSense::default()
        }
    }

    #[test]
    fn test_single_definition() {
        let definition = split_definition("a small cat").unwrap();
        assert_eq!(definition.primary, sense("a small cat."));
        assert!(definition.senses.is_empty());
    }

    #[test]
    fn test_senses() {
        let definition = split_definition("feline \\\\ a cat \\\\ a lion!").unwrap();
        assert_eq!(definition.primary, sense("feline."));
        assert_eq!(definition.senses, vec![sense("a cat."), sense("a lion!")]);

        let definition = split_definition("\\\\ first \\\\ second").unwrap();
        assert_eq!(definition.primary, RawSense::default());
        assert_eq!(definition.senses.len(), 2);
    }

    #[test]
    fn test_comments_and_examples() {
        let definition = split_definition(
            "a cat \\comment common \\ex le chat noir \\comment literal \\ex un chat?",
        )
        .unwrap();

        let primary = definition.primary;
        assert_eq!(primary.def, "a cat.");
        assert_eq!(primary.comment.as_deref(), Some("common."));
        assert_eq!(
            primary.examples,
            vec![
                RawExample {
                    text: "le chat noir.".to_string(),
                    comment: Some("literal.".to_string()),
                },
                RawExample {
                    text: "un chat?".to_string(),
                    comment: None,
                },
            ]
        );
    }

    #[test]
    fn test_markers_need_a_word_boundary() {
        let definition = split_definition("\\exp{x} \\commentary").unwrap();
        assert_eq!(definition.primary, sense("\\exp{x} \\commentary."));
        assert_eq!(find_marker("a \\ex{b}"), Some((2, SenseMarker::Example)));
    }

    #[test]
    fn test_markers_in_empty_sense() {
        assert_eq!(
            split_definition("\\comment abcd").unwrap_err(),
            SenseError::CommentInEmptySense
        );
        assert_eq!(
            split_definition("\\\\\\comment abcd").unwrap_err(),
            SenseError::CommentInEmptySense
        );
        assert_eq!(
            split_definition("\\ex abcd").unwrap_err(),
            SenseError::ExampleInEmptySense
        );
        assert_eq!(
            split_definition("\\\\\\ex abcd").unwrap_err(),
            SenseError::ExampleInEmptySense
        );
        assert_eq!(
            SenseError::CommentInEmptySense.to_string(),
            "\\comment is not allowed in an empty sense or empty primary definition. Use \\textit{...} instead."
        );
    }

    #[test]
    fn test_second_comment_is_rejected() {
        assert_eq!(
            split_definition("a \\comment b \\comment c").unwrap_err(),
            SenseError::UnexpectedComment
        );
        assert_eq!(
            split_definition("a \\ex b \\comment c \\comment d").unwrap_err(),
            SenseError::UnexpectedComment
        );
    }

    #[test]
    fn test_full_stop_delimited() {
        assert_eq!(full_stop_delimited("  a cat "), "a cat.");
        assert_eq!(full_stop_delimited("a cat."), "a cat.");
        assert_eq!(full_stop_delimited("really?"), "really?");
        assert_eq!(full_stop_delimited("and so on \\ldots"), "and so on \\ldots");
        assert_eq!(full_stop_delimited("‘a cat.’"), "‘a cat.’");
        assert_eq!(full_stop_delimited("‘a cat’"), "‘a cat’.");
        assert_eq!(full_stop_delimited("   "), "");
    }
}
