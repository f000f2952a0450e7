//! Parallel expansion of many entries
//!
//! Entries are independent, so they are expanded on the rayon pool. A failed
//! entry is recorded in the report and never stops the others.

use crate::dictionary::EntryRecord;
use crate::entry::{EntryError, EntryField, EntryPipeline, ExpandedEntry};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// An entry that could not be expanded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFailure {
    pub headword: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<EntryField>,
    pub reason: String,
}

impl EntryFailure {
    pub fn new(headword: impl Into<String>, line: usize, error: &EntryError) -> Self {
        Self {
            headword: headword.into(),
            line,
            field: error.field(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: '{}': {}", self.line, self.headword, self.reason)
    }
}

/// Outcome of a batch
///
/// `entries` are in dictionary order (sort key, then headword); `failures`
/// keep source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub entries: Vec<ExpandedEntry>,
    pub failures: Vec<EntryFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.len() + self.failures.len()
    }
}

/// Expand every record in parallel
pub fn process_batch(pipeline: &EntryPipeline, records: Vec<EntryRecord>) -> BatchReport {
    let results: Vec<Result<ExpandedEntry, EntryFailure>> = records
        .into_par_iter()
        .map(|record| {
            let headword = record.headword.clone();
            let line = record.line;
            pipeline
                .process(record)
                .map_err(|e| EntryFailure::new(headword, line, &e))
        })
        .collect();

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Ok(entry) => report.entries.push(entry),
            Err(failure) => {
                warn!("{}", failure);
                report.failures.push(failure);
            }
        }
    }

    report
        .entries
        .sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then_with(|| a.headword.cmp(&b.headword)));

    info!(
        "Expanded {} of {} entries ({} failed)",
        report.entries.len(),
        report.total(),
        report.failures.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_builtins;
    use crate::expand::RejectUnknown;
    use crate::registry::MacroRegistryBuilder;
    use std::sync::Arc;

    fn pipeline() -> EntryPipeline {
        let mut builder = MacroRegistryBuilder::new();
        register_builtins(&mut builder);
        EntryPipeline::new(Arc::new(builder.build()), Arc::new(RejectUnknown))
    }

    fn full(headword: &str, line: usize, definition: &str) -> EntryRecord {
        EntryRecord::full(
            headword,
            line,
            vec!["n.".to_string(), String::new(), definition.to_string()],
        )
    }

    #[test]
    fn test_failures_are_isolated() {
        let records = vec![
            full("b", 1, "fine"),
            full("a", 2, "\\nope{x}"),
            full("c", 3, "also \\textbf{fine}"),
        ];

        let report = process_batch(&pipeline(), records);
        assert!(!report.is_success());
        assert_eq!(report.total(), 3);

        let headwords: Vec<&str> = report.entries.iter().map(|e| e.headword.as_str()).collect();
        assert_eq!(headwords, vec!["b", "c"]);

        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.headword, "a");
        assert_eq!(failure.line, 2);
        assert_eq!(failure.field, Some(EntryField::Definition));
        assert!(failure.reason.contains("Unsupported macro 'nope'"));
    }

    #[test]
    fn test_entries_are_sorted_by_key_then_headword() {
        let records = vec![
            full("été", 1, "x"),
            full("Eta", 2, "x"),
            full("eta", 3, "x"),
            full("abricot", 4, "x"),
            EntryRecord::reference("ete", 5, "été"),
        ];

        let report = process_batch(&pipeline(), records);
        assert!(report.is_success());

        let headwords: Vec<&str> = report.entries.iter().map(|e| e.headword.as_str()).collect();
        assert_eq!(headwords, vec!["abricot", "Eta", "eta", "ete", "été"]);
    }

    #[test]
    fn test_empty_batch() {
        let report = process_batch(&pipeline(), Vec::new());
        assert!(report.is_success());
        assert_eq!(report.total(), 0);
    }
}
