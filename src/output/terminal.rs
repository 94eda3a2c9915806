//! Terminal renderer: styled flowing text grouped by file.

use colored::{ColoredString, Colorize};

use crate::models::Severity;
use crate::output::OutputRenderer;
use crate::placement::{PlacementKind, PlacementOutcome};
use crate::session::ReviewOutcome;

/// Terminal output renderer with colored, flowing text.
pub struct TerminalRenderer;

fn severity_label(severity: Severity) -> ColoredString {
    let label = severity.to_string();
    match severity {
        Severity::Error => label.red().bold(),
        Severity::Warning => label.yellow().bold(),
        Severity::Info => label.blue().bold(),
        Severity::Security => label.magenta().bold(),
    }
}

fn placement_note(outcome: &PlacementOutcome) -> Option<ColoredString> {
    match outcome.kind {
        Some(PlacementKind::Exact) => None,
        Some(PlacementKind::TextMatch) => Some("(matched by line text)".dimmed()),
        Some(PlacementKind::Fallback) => Some("(approximate: line not found in file)".yellow()),
        None => Some("(file not found on page)".red()),
    }
}

impl OutputRenderer for TerminalRenderer {
    fn render(&self, outcome: &ReviewOutcome) -> String {
        let outcomes = &outcome.placements.outcomes;
        if outcomes.is_empty() {
            return format!(
                "{}\n",
                format!("  ✔ No suggestions for {} reviewed file(s).", outcome.files_reviewed).green()
            );
        }

        let mut sorted: Vec<&PlacementOutcome> = outcomes.iter().collect();
        sorted.sort_by(|a, b| {
            a.suggestion
                .file_path
                .cmp(&b.suggestion.file_path)
                .then(a.suggestion.line_number.cmp(&b.suggestion.line_number))
        });

        let mut output = String::new();
        let mut current_file = "";

        for placed in sorted {
            let s = &placed.suggestion;
            if s.file_path != current_file {
                if !current_file.is_empty() {
                    output.push('\n');
                }
                current_file = &s.file_path;
            }

            let location = format!("{}:{}", s.file_path, s.line_number);
            output.push_str(&format!(
                " {} {} in {}",
                s.severity.icon(),
                severity_label(s.severity),
                location.bold()
            ));
            if let Some(note) = placement_note(placed) {
                output.push_str(&format!(" {note}"));
            }
            output.push('\n');
            output.push_str(&format!("   {}\n\n", s.message));
        }

        let counts = &outcome.severity_counts;
        let breakdown: Vec<String> = Severity::ALL
            .iter()
            .filter(|&&sev| counts.get(sev) > 0)
            .map(|&sev| format!("{} {} {}", sev.icon(), counts.get(sev), sev))
            .collect();

        output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
        output.push_str(&format!(
            " {} suggestions ({} mode): {}\n",
            outcome.placements.summary.total.to_string().bold(),
            outcome.mode,
            breakdown.join(", ")
        ));
        output.push_str(&format!(" {}\n", outcome.summary_line()));
        let summary = &outcome.placements.summary;
        if summary.fallback > 0 || summary.failed > 0 {
            output.push_str(&format!(
                " {}\n",
                format!(
                    "{} approximate, {} unplaced",
                    summary.fallback, summary.failed
                )
                .dimmed()
            ));
        }
        output.push_str(&format!(" {}\n", crate::constants::AI_DISCLOSURE.dimmed()));

        output
    }
}
