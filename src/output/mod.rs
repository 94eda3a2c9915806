//! Renderers for review outcomes: terminal and JSON.

pub mod json;
pub mod terminal;

use crate::session::ReviewOutcome;

/// Renders a finished review for display.
pub trait OutputRenderer {
    fn render(&self, outcome: &ReviewOutcome) -> String;
}
