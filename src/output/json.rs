//! JSON output renderer.
//!
//! Outputs `{"mode", "filesReviewed", "severityCounts", "placements"}`.

use crate::output::OutputRenderer;
use crate::session::ReviewOutcome;

/// JSON output renderer.
pub struct JsonRenderer;

impl OutputRenderer for JsonRenderer {
    fn render(&self, outcome: &ReviewOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }
}
