//! Output formatting and styling module.
//!
//! Console output for humans: colored status lines and a per-cycle summary
//! table. Per-action detail goes through the `log` facade instead.

use crate::report::CycleReport;
use colored::*;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// OutputFormatter::error("Failed to load configuration");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Renders the summary table rows for a cycle.
    ///
    /// Returns one line per action kind plus a total, already padded.
    pub fn summary_lines(report: &CycleReport) -> Vec<String> {
        let counts = report.action_counts();
        let width = counts
            .keys()
            .map(|label| label.len())
            .max()
            .unwrap_or(0)
            .max("Total".len());

        let mut lines: Vec<String> = counts
            .iter()
            .map(|(label, count)| format!("{label:<width$} | {count}"))
            .collect();
        let total: usize = counts.values().sum();
        lines.push("-".repeat(width + 8));
        lines.push(format!("{:<width$} | {total}", "Total"));
        lines
    }

    /// Prints the summary of one cycle.
    ///
    /// Skipped folders are shown as warnings and item failures as errors.
    pub fn cycle_summary(report: &CycleReport) {
        Self::header(&format!("Cycle finished at {}", report.started_at));

        for line in Self::summary_lines(report) {
            println!("  {line}");
        }

        for skipped in &report.skipped {
            Self::warning(&format!(
                "Skipped {}: {}",
                skipped.folder.display(),
                skipped.reason
            ));
        }

        for failure in report.folders.iter().flat_map(|f| f.failures()) {
            Self::error(&format!("{}: {}", failure.path.display(), failure.reason));
        }
    }

    /// Prints a cycle report as a single JSON document.
    pub fn cycle_json(report: &CycleReport) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string(report)?);
        Ok(())
    }
}
