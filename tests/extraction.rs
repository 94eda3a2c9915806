//! Extraction, normalization and placement against saved page fixtures.

use diffscout::extract::{self, RegionStrategy, locate_file_regions};
use diffscout::models::{ChangeKind, Severity, Suggestion};
use diffscout::normalize;
use diffscout::placement::{self, PlacementKind};
use pretty_assertions::assert_eq;
use scraper::Html;

const CLASSIC: &str = include_str!("fixtures/classic.html");
const PROGRESSIVE: &str = include_str!("fixtures/progressive.html");
const TABLE_ONLY: &str = include_str!("fixtures/table_only.html");
const EMPTY: &str = include_str!("fixtures/empty.html");

fn suggestion(path: &str, line: u32) -> Suggestion {
    Suggestion {
        file_path: path.into(),
        line_number: line,
        message: "consider this".into(),
        severity: Severity::Warning,
    }
}

#[test]
fn classic_layout_extracts_files_with_changes() {
    let doc = extract::extract_from_str(CLASSIC);
    let paths: Vec<_> = doc.files.iter().map(|f| f.file_path.as_str()).collect();
    assert_eq!(paths, ["src/app.js", "README.md"]);

    let app = &doc.files[0];
    assert_eq!(app.hunks.len(), 1);
    assert_eq!(app.hunks[0].header, "@@ -10,4 +10,5 @@ function start() {");

    let changes = &app.hunks[0].changes;
    assert_eq!(changes.len(), 5);
    assert_eq!(changes[0].change_kind, ChangeKind::Context);
    assert_eq!(changes[0].content, "function start() {");
    assert_eq!(
        (changes[0].old_line_number, changes[0].new_line_number),
        (Some(10), Some(10))
    );

    assert_eq!(changes[1].change_kind, ChangeKind::Deletion);
    assert_eq!(changes[1].content, "console.log('debug');");
    assert_eq!(
        (changes[1].old_line_number, changes[1].new_line_number),
        (Some(11), None)
    );

    assert_eq!(changes[2].change_kind, ChangeKind::Addition);
    assert_eq!(changes[2].content, "logger.info('start');");
    assert_eq!(changes[2].new_line_number, Some(11));
    assert!(changes.iter().all(|c| !c.synthetic_line));
}

#[test]
fn progressive_layout_reads_tagsearch_paths() {
    let html = Html::parse_document(PROGRESSIVE);
    let regions = locate_file_regions(&html);
    assert_eq!(regions.len(), 2);
    assert!(matches!(regions[0].strategy, RegionStrategy::Probe { spec: ".js-file", .. }));

    let doc = extract::extract_document(&html);
    assert_eq!(doc.files[0].file_path, "lib/parser.rs");
    assert_eq!(doc.files[1].file_path, "lib/lexer.rs");

    let parser_changes = &doc.files[0].hunks[0].changes;
    assert_eq!(parser_changes[1].content, "let data = input.unwrap();");
    assert_eq!(parser_changes[2].content, "let data = input?;");
    assert_eq!(doc.files[1].hunks[0].changes[0].new_line_number, Some(41));
}

#[test]
fn bare_table_gets_placeholder_path_and_text_numbers() {
    let doc = extract::extract_from_str(TABLE_ONLY);
    assert_eq!(doc.files.len(), 1);
    assert!(doc.files[0].file_path.starts_with("unknown-file-"));

    let changes = &doc.files[0].hunks[0].changes;
    assert_eq!(changes[0].change_kind, ChangeKind::Addition);
    assert_eq!(changes[0].new_line_number, Some(8));
    assert_eq!(changes[1].change_kind, ChangeKind::Deletion);
    assert_eq!(changes[1].old_line_number, Some(8));
}

#[test]
fn page_without_diff_yields_nothing() {
    let html = Html::parse_document(EMPTY);
    assert!(!extract::has_diff_content(&html));
    assert!(extract::extract_document(&html).is_empty());
}

#[test]
fn diff_ready_markers() {
    assert!(extract::has_diff_content(&Html::parse_document(CLASSIC)));
    assert!(extract::has_diff_content(&Html::parse_document(PROGRESSIVE)));
}

#[test]
fn extracted_wire_normalizes_into_context() {
    let wire = extract::extract_from_str(CLASSIC).to_wire();
    let context = normalize::normalize(&wire);

    assert!(context.starts_with("File: src/app.js\n\n@@ -10,4 +10,5 @@ function start() {\n"));
    assert!(context.contains("- console.log('debug'); (Line 11)\n"));
    assert!(context.contains("+ return run(); (Line 12)\n"));
    assert!(context.contains("File: README.md\n\n@@ -4,0 +5,1 @@\n+ ## Logging (Line 5)\n"));
}

#[test]
fn placement_kinds_on_classic_page() {
    let html = Html::parse_document(CLASSIC);
    let report = placement::place_all(
        &html,
        &[
            suggestion("src/app.js", 12),
            suggestion("README.md", 4),
            suggestion("src/app.js", 999),
            suggestion("src/missing.rs", 1),
        ],
    );

    let kinds: Vec<_> = report.outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        [
            Some(PlacementKind::Exact),
            Some(PlacementKind::TextMatch),
            Some(PlacementKind::Fallback),
            None,
        ]
    );
    assert_eq!(report.summary.placed(), 2);
    assert_eq!(report.summary.fallback, 1);
    assert_eq!(report.summary.failed, 1);

    let anchor = report.outcomes[0].anchor.as_ref().unwrap();
    assert_eq!(anchor.tag, "tr");
    assert!(anchor.line_numbers.contains(&12));
    assert!(anchor.preview.contains("return run();"));
}

#[test]
fn placement_on_progressive_page() {
    let html = Html::parse_document(PROGRESSIVE);
    let anchor = placement::locate_line(&html, "lib/lexer.rs", 41).unwrap();
    assert_eq!(anchor.kind, PlacementKind::Exact);
    assert!(anchor.summary().preview.contains("self.pos += 1;"));
}
