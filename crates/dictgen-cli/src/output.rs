//! Output formatting and reporting
//!
//! Renders a batch report as human-readable text, JSON or one line per entry.
//! Rendered entries go to stdout (or a file); summaries go to stderr.

use anyhow::{Context, Result};
use colored::*;
use dictgen_core::entry::FULL_FIELDS;
use dictgen_core::{
    BatchReport, DictionaryDiagnostic, EntryField, ExpandedDefinition, ExpandedEntry, ExpandedKind,
    ExpandedSense,
};
use std::fmt::Write;
use std::time::Duration;

use crate::OutputFormat;

/// Counts reported after an expansion
#[derive(Debug, Clone)]
pub struct ExpandSummary {
    pub entries: usize,
    pub failures: usize,
    pub diagnostics: usize,
    pub elapsed: Duration,
}

impl ExpandSummary {
    pub fn has_problems(&self) -> bool {
        self.failures > 0 || self.diagnostics > 0
    }
}

/// Output formatter for different formats
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render expanded entries
    pub fn render(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.render_human(report)),
            OutputFormat::Json => self.render_json(report),
            OutputFormat::Compact => Ok(self.render_compact(report)),
        }
    }

    fn render_human(&self, report: &BatchReport) -> String {
        let mut out = String::new();
        for (index, entry) in report.entries.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            write_human_entry(&mut out, entry);
        }
        out
    }

    fn render_json(&self, report: &BatchReport) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(report).context("Failed to serialize report as JSON")?;
        json.push('\n');
        Ok(json)
    }

    fn render_compact(&self, report: &BatchReport) -> String {
        let mut out = String::new();
        for entry in &report.entries {
            let fields: Vec<String> = entry
                .tree
                .children()
                .iter()
                .map(|node| node.flatten_text())
                .collect();
            let separator = match entry.kind {
                ExpandedKind::Full => " | ",
                ExpandedKind::Reference => " > ",
            };
            let _ = writeln!(out, "{}", fields.join(separator));
        }
        out
    }

    /// Print diagnostics, failures and counts to stderr
    pub fn print_summary(
        &self,
        summary: &ExpandSummary,
        report: &BatchReport,
        diagnostics: &[DictionaryDiagnostic],
    ) {
        match self.format {
            OutputFormat::Human => self.print_summary_human(summary, report, diagnostics),
            OutputFormat::Json | OutputFormat::Compact => self.print_summary_compact(summary),
        }
    }

    fn print_summary_human(
        &self,
        summary: &ExpandSummary,
        report: &BatchReport,
        diagnostics: &[DictionaryDiagnostic],
    ) {
        for diagnostic in diagnostics {
            eprintln!("{} {}", "warning:".yellow().bold(), diagnostic);
        }
        for failure in &report.failures {
            eprintln!("{} {}", "error:".red().bold(), failure);
        }

        eprintln!("\n{}", "Summary:".bold());
        eprintln!("  Entries expanded: {}", summary.entries.to_string().green());
        if summary.failures > 0 {
            eprintln!("  Entries failed: {}", summary.failures.to_string().red());
        }
        if summary.diagnostics > 0 {
            eprintln!(
                "  Source diagnostics: {}",
                summary.diagnostics.to_string().yellow()
            );
        }
        if !summary.has_problems() {
            eprintln!("  {} No problems found", "✓".green());
        }
        eprintln!("  Time: {}", utils::format_duration(summary.elapsed));
    }

    fn print_summary_compact(&self, summary: &ExpandSummary) {
        eprintln!(
            "dictgen: {} entries, {} failed, {} diagnostics",
            summary.entries, summary.failures, summary.diagnostics
        );
    }
}

fn write_human_entry(out: &mut String, entry: &ExpandedEntry) {
    let headword = entry.field_text(EntryField::Headword);

    if entry.kind == ExpandedKind::Reference {
        let _ = writeln!(
            out,
            "{} → {}",
            headword.bold(),
            entry.field_text(EntryField::Target)
        );
        return;
    }

    let part_of_speech = entry.field_text(EntryField::PartOfSpeech);
    if part_of_speech.is_empty() {
        let _ = writeln!(out, "{}", headword.bold());
    } else {
        let _ = writeln!(out, "{} {}", headword.bold(), part_of_speech.italic());
    }

    for field in FULL_FIELDS.into_iter().skip(1) {
        if field == EntryField::Definition
            && let Some(definition) = &entry.definition
        {
            write_definition(out, definition);
            continue;
        }
        write_labelled(out, field.as_str(), &entry.field_text(field));
    }
}

fn write_definition(out: &mut String, definition: &ExpandedDefinition) {
    write_sense(out, EntryField::Definition.as_str(), &definition.primary);
    for (index, sense) in definition.senses.iter().enumerate() {
        write_sense(out, &format!("sense {}", index + 1), sense);
    }
}

fn write_sense(out: &mut String, label: &str, sense: &ExpandedSense) {
    write_labelled(out, label, &sense.def.flatten_text());
    if let Some(comment) = &sense.comment {
        write_labelled(out, "comment", &comment.flatten_text());
    }
    for example in &sense.examples {
        write_labelled(out, "example", &example.text.flatten_text());
        if let Some(comment) = &example.comment {
            write_labelled(out, "  comment", &comment.flatten_text());
        }
    }
}

/// One `label  text` line; empty text prints nothing
fn write_labelled(out: &mut String, label: &str, text: &str) {
    if !text.is_empty() {
        let _ = writeln!(out, "  {} {}", format!("{label:<14}").dimmed(), text);
    }
}

/// Utility functions for output formatting
pub mod utils {
    /// Format duration in human-readable format
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_ms = duration.as_millis();

        if total_ms < 1000 {
            format!("{total_ms}ms")
        } else if total_ms < 60_000 {
            format!("{:.1}s", total_ms as f64 / 1000.0)
        } else {
            let minutes = total_ms / 60_000;
            let seconds = (total_ms % 60_000) as f64 / 1000.0;
            format!("{minutes}m {seconds:.1}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dictgen_core::{DictgenConfig, parse_dictionary, process_batch};

    fn report(source: &str) -> BatchReport {
        let pipeline = DictgenConfig::default().build_pipeline().unwrap();
        process_batch(&pipeline, parse_dictionary(source, None).records)
    }

    #[test]
    fn test_compact_format() {
        colored::control::set_override(false);
        let report = report("chat | n. | | a \\textit{cat} | | ʃa\nchatte > chat\n");
        let rendered = OutputFormatter::new(OutputFormat::Compact)
            .render(&report)
            .unwrap();

        assert_eq!(
            rendered,
            "chat | n. |  | a <em>cat</em>. |  | /ʃa/\nchatte > chat\n"
        );
    }

    #[test]
    fn test_human_format_skips_empty_fields() {
        colored::control::set_override(false);
        let report = report("chat | n. | | a cat | | ʃa\n");
        let rendered = OutputFormatter::new(OutputFormat::Human)
            .render(&report)
            .unwrap();

        assert_eq!(
            rendered,
            "chat n.\n  definition     a cat.\n  pronunciation  /ʃa/\n"
        );
    }

    #[test]
    fn test_human_format_lists_senses() {
        colored::control::set_override(false);
        let report = report(
            "chat | n. | | feline \\\\ a cat \\ex le chat \\comment literal \\\\ a lion\n",
        );
        let rendered = OutputFormatter::new(OutputFormat::Human)
            .render(&report)
            .unwrap();

        assert_eq!(
            rendered,
            "chat n.\n  definition     feline.\n  sense 1        a cat.\n  example        le chat.\n    comment      literal.\n  sense 2        a lion.\n  pronunciation  /chat/\n"
        );
    }

    #[test]
    fn test_json_format_is_valid() {
        let report = report("chat | n. | | a cat\n");
        let rendered = OutputFormatter::new(OutputFormat::Json)
            .render(&report)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["entries"][0]["headword"], "chat");
        assert_eq!(value["failures"], serde_json::json!([]));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(utils::format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(utils::format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(utils::format_duration(Duration::from_millis(61_000)), "1m 1.0s");
    }
}
