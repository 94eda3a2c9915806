//! Structural diff extraction from code-review page markup.
//!
//! The pipeline is: locate one region per file ([`locator`]), resolve its
//! path, then read its rows into hunks ([`hunks`]). Every lookup goes through
//! ordered selector chains ([`probe`]) so that several generations of host
//! markup are understood without configuration.

pub mod hunks;
pub mod locator;
pub mod probe;

use std::sync::LazyLock;

use scraper::Html;
use tracing::{debug, info};

use crate::models::{DiffDocument, FileDiff};
use probe::{ProbeChain, Scope};

pub use hunks::extract_hunks;
pub use locator::{locate_file_regions, resolve_file_path, FileRegion, RegionStrategy};

/// Markers whose presence means the page has rendered its diff.
static DIFF_READY_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "diff-ready",
        &[
            ".js-diff-progressive-container",
            ".js-file-content",
            ".js-diff-table",
            ".diff-view",
            ".diff-table",
            ".file",
        ],
    )
});

/// Extract every file with at least one change line.
pub fn extract_document(html: &Html) -> DiffDocument {
    let mut files = Vec::new();
    for region in locate_file_regions(html) {
        let file = FileDiff {
            file_path: resolve_file_path(region.element),
            hunks: extract_hunks(region.element),
        };
        if file.change_count() == 0 {
            debug!(path = %file.file_path, "skipping file without changes");
            continue;
        }
        files.push(file);
    }
    info!(files = files.len(), "diff extracted");
    DiffDocument { files }
}

/// Parse markup and extract in one step.
pub fn extract_from_str(source: &str) -> DiffDocument {
    let html = Html::parse_document(source);
    extract_document(&html)
}

/// Whether the page shows any diff-ready marker yet.
pub fn has_diff_content(html: &Html) -> bool {
    DIFF_READY_PROBES.select_first(Scope::Document(html)).is_some()
}
