//! CLI command definitions and argument parsing.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use colored::Colorize;
use diffscout::session::ReviewStatus;

/// Progress line for a review milestone, printed to stderr.
pub fn print_status(status: ReviewStatus) {
    let line = match status {
        ReviewStatus::Extracting => "Extracting code changes...".to_string(),
        ReviewStatus::Sending { files } => format!("Sending {files} file(s) for review..."),
        ReviewStatus::Placing { suggestions } => format!("Placing {suggestions} comment(s)..."),
    };
    eprintln!("  {} {}", "›".cyan(), line.dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_status_does_not_panic() {
        print_status(ReviewStatus::Extracting);
        print_status(ReviewStatus::Sending { files: 2 });
        print_status(ReviewStatus::Placing { suggestions: 0 });
    }
}
