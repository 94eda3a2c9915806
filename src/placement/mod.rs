//! Resolving where each suggestion belongs in the page.
//!
//! A suggestion is anchored in three steps: find its file's region, then the
//! row whose number cells carry the exact line number, then (failing that)
//! any row whose text contains the number as a whole token. When neither
//! works the first row of the file is used and the placement is reported as
//! a fallback. Only an unknown file makes a placement fail outright.

use std::sync::LazyLock;

use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::{debug, warn};

use crate::extract::locator::{
    enclosing_container, header_path, locate_file_regions, resolved_path, FILE_HEADER_PROBES,
    FILE_REGION_PROBES,
};
use crate::extract::probe::{attr, trimmed_text, ProbeChain, Scope};
use crate::models::Suggestion;

static LINE_ROW_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "line-row",
        &[
            ".js-file-line",
            "tr.blob-expanded",
            "tr[data-line-number]",
            ".diff-table tr",
            "tr.js-expandable-line",
            "tr.line-data",
            "tr.js-file-line",
            ".js-file-content tr",
            ".js-file-line-container tr",
        ],
    )
});

static LINE_NUMBER_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new("line-number", &[".blob-num", ".line-num", "[data-line-number]"])
});

static ROW_SHAPED: LazyLock<ProbeChain> =
    LazyLock::new(|| ProbeChain::new("row-shaped", &["tr", ".line", ".js-file-line", ".blob-code"]));

static TABLE_ROW: LazyLock<ProbeChain> = LazyLock::new(|| ProbeChain::new("tr", &["tr"]));

static ANY_ELEMENT: LazyLock<ProbeChain> = LazyLock::new(|| ProbeChain::new("any", &["*"]));

const PREVIEW_CHARS: usize = 80;

/// How an anchor was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementKind {
    /// A number cell (or row attribute) equals the line number.
    Exact,
    /// The number appears as a whole token in a row's text.
    TextMatch,
    /// First row of the file; the line itself was not found.
    Fallback,
}

/// An anchor element inside a parsed page.
#[derive(Debug, Clone, Copy)]
pub struct LineAnchor<'a> {
    pub element: ElementRef<'a>,
    pub region: ElementRef<'a>,
    pub kind: PlacementKind,
}

impl LineAnchor<'_> {
    /// Owned description of the anchor, safe to keep after the page is dropped.
    pub fn summary(&self) -> AnchorSummary {
        let line_numbers = std::iter::once(self.element)
            .chain(LINE_NUMBER_PROBES.probes().iter().flat_map(|p| self.element.select(p.selector())))
            .filter_map(|el| {
                attr(el, "data-line-number")
                    .map(str::to_string)
                    .or_else(|| Some(trimmed_text(el)).filter(|t| t.chars().all(|c| c.is_ascii_digit())))
            })
            .filter_map(|raw| raw.parse::<u32>().ok())
            .collect();
        let collapsed = self.element.text().collect::<Vec<_>>().join(" ");
        let preview = collapsed.split_whitespace().collect::<Vec<_>>().join(" ");
        AnchorSummary {
            tag: self.element.value().name().to_string(),
            line_numbers,
            preview: preview.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorSummary {
    pub tag: String,
    pub line_numbers: Vec<u32>,
    pub preview: String,
}

/// Find the anchor for `file_path`:`line_number`, or `None` when the file
/// is not on the page.
pub fn locate_line<'a>(html: &'a Html, file_path: &str, line_number: u32) -> Option<LineAnchor<'a>> {
    let Some(region) = find_file_region(html, file_path) else {
        warn!(file = file_path, line = line_number, "file not found on page");
        return None;
    };

    if let Some(element) = exact_row(region, line_number) {
        return Some(LineAnchor {
            element,
            region,
            kind: PlacementKind::Exact,
        });
    }
    if let Some(element) = text_match_row(region, line_number) {
        debug!(file = file_path, line = line_number, "placed by text match");
        return Some(LineAnchor {
            element,
            region,
            kind: PlacementKind::TextMatch,
        });
    }

    let element = TABLE_ROW
        .select_first(Scope::Element(region))
        .or_else(|| LINE_ROW_PROBES.select_first(Scope::Element(region)))
        .unwrap_or(region);
    debug!(file = file_path, line = line_number, "line not found, anchoring to first row");
    Some(LineAnchor {
        element,
        region,
        kind: PlacementKind::Fallback,
    })
}

fn find_file_region<'a>(html: &'a Html, file_path: &str) -> Option<ElementRef<'a>> {
    for probe in FILE_REGION_PROBES.probes() {
        let found = html
            .select(probe.selector())
            .find(|region| resolved_path(*region).as_deref() == Some(file_path));
        if found.is_some() {
            return found;
        }
    }

    for probe in FILE_HEADER_PROBES.probes() {
        let found = html
            .select(probe.selector())
            .filter(|header| header_path(*header).as_deref() == Some(file_path))
            .find_map(enclosing_container);
        if found.is_some() {
            return found;
        }
    }

    // Structure-free layouts: match on whatever regions extraction would see.
    locate_file_regions(html)
        .into_iter()
        .map(|region| region.element)
        .find(|region| resolved_path(*region).as_deref() == Some(file_path))
}

/// Number column a row is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    New,
    Old,
}

/// New-side numbers win across the whole region; the old column is only
/// consulted when no row carries the number on the new side.
fn exact_row(region: ElementRef<'_>, line_number: u32) -> Option<ElementRef<'_>> {
    let target = line_number.to_string();
    let rows = || {
        LINE_ROW_PROBES
            .probes()
            .iter()
            .flat_map(|probe| region.select(probe.selector()))
    };
    [Side::New, Side::Old]
        .into_iter()
        .find_map(|side| rows().find(|row| row_carries_number(*row, &target, side)))
}

/// With two number cells the first is the old column and the second the
/// new one. A lone cell or the row's own attribute counts as new.
fn row_carries_number(row: ElementRef<'_>, target: &str, side: Side) -> bool {
    let cells = LINE_NUMBER_PROBES
        .first_match(Scope::Element(row))
        .map(|hit| hit.elements)
        .unwrap_or_default();
    let carries = |cell: ElementRef<'_>| {
        attr(cell, "data-line-number") == Some(target) || trimmed_text(cell) == target
    };
    match side {
        Side::New => {
            attr(row, "data-line-number") == Some(target)
                || match cells.as_slice() {
                    [only] => carries(*only),
                    [_, new, ..] => carries(*new),
                    [] => false,
                }
        }
        Side::Old => matches!(cells.as_slice(), [old, _, ..] if carries(*old)),
    }
}

fn text_match_row(region: ElementRef<'_>, line_number: u32) -> Option<ElementRef<'_>> {
    let target = line_number.to_string();
    ANY_ELEMENT
        .probes()
        .iter()
        .flat_map(|probe| region.select(probe.selector()))
        .filter(|el| contains_number_token(&el.text().collect::<Vec<_>>().join(" "), &target))
        .find_map(|el| {
            if ROW_SHAPED.matches(&el) {
                Some(el)
            } else {
                TABLE_ROW.closest(el)
            }
        })
}

/// `target` occurs in `text` with no ASCII digit on either side.
fn contains_number_token(text: &str, target: &str) -> bool {
    text.match_indices(target).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + target.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

/// Where one suggestion ended up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementOutcome {
    pub suggestion: Suggestion,
    /// `None` when the file could not be found.
    pub kind: Option<PlacementKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSummary {
    pub total: usize,
    pub exact: usize,
    pub text_match: usize,
    pub fallback: usize,
    pub failed: usize,
}

impl PlacementSummary {
    /// Suggestions anchored at their own line (exact or text match).
    pub fn placed(&self) -> usize {
        self.exact + self.text_match
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlacementReport {
    pub outcomes: Vec<PlacementOutcome>,
    pub summary: PlacementSummary,
}

/// Place every suggestion and tally the results.
pub fn place_all(html: &Html, suggestions: &[Suggestion]) -> PlacementReport {
    let mut summary = PlacementSummary {
        total: suggestions.len(),
        ..Default::default()
    };
    let outcomes = suggestions
        .iter()
        .map(|suggestion| {
            let anchor = locate_line(html, &suggestion.file_path, suggestion.line_number);
            match anchor.as_ref().map(|a| a.kind) {
                Some(PlacementKind::Exact) => summary.exact += 1,
                Some(PlacementKind::TextMatch) => summary.text_match += 1,
                Some(PlacementKind::Fallback) => summary.fallback += 1,
                None => summary.failed += 1,
            }
            PlacementOutcome {
                suggestion: suggestion.clone(),
                kind: anchor.as_ref().map(|a| a.kind),
                anchor: anchor.as_ref().map(LineAnchor::summary),
            }
        })
        .collect();
    PlacementReport { outcomes, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    const PAGE: &str = r#"
        <div class="file" data-path="a.js">
          <table class="diff-table"><tbody>
            <tr><td class="blob-num"></td><td class="blob-num"></td><td class="blob-code">@@ -1,3 +1,3 @@</td></tr>
            <tr><td class="blob-num" data-line-number="1"></td><td class="blob-num" data-line-number="1"></td><td class="blob-code">let a = 1;</td></tr>
            <tr><td class="blob-num" data-line-number="2"></td><td class="blob-num"></td><td class="blob-code blob-code-deletion">-console.log(0)</td></tr>
            <tr><td class="blob-num"></td><td class="blob-num" data-line-number="2"></td><td class="blob-code blob-code-addition">+console.log(1)</td></tr>
          </tbody></table>
        </div>
        <div class="file" data-path="b.js">
          <table class="diff-table"><tbody>
            <tr><td class="blob-code">see line 44 below</td></tr>
          </tbody></table>
        </div>"#;

    fn suggestion(path: &str, line: u32) -> Suggestion {
        Suggestion {
            file_path: path.into(),
            line_number: line,
            message: "m".into(),
            severity: Severity::Warning,
        }
    }

    #[test]
    fn exact_match_prefers_the_new_column() {
        let html = Html::parse_document(PAGE);
        let anchor = locate_line(&html, "a.js", 2).unwrap();
        assert_eq!(anchor.kind, PlacementKind::Exact);
        assert_eq!(anchor.element.value().name(), "tr");
        assert!(anchor.summary().preview.contains("console.log(1)"));
    }

    #[test]
    fn shifted_hunk_places_on_new_line_before_old() {
        let html = Html::parse_document(
            r#"<div class="file" data-path="a.js">
                 <table class="diff-table"><tbody>
                   <tr><td class="blob-num"></td><td class="blob-num"></td><td class="blob-code">@@ -20,2 +10,2 @@</td></tr>
                   <tr><td class="blob-num" data-line-number="20"></td><td class="blob-num" data-line-number="10"></td><td class="blob-code">first()</td></tr>
                   <tr><td class="blob-num" data-line-number="30"></td><td class="blob-num" data-line-number="20"></td><td class="blob-code">target()</td></tr>
                 </tbody></table>
               </div>"#,
        );
        let anchor = locate_line(&html, "a.js", 20).unwrap();
        assert_eq!(anchor.kind, PlacementKind::Exact);
        assert!(anchor.summary().preview.contains("target()"));

        // Only the old column has 30, so it still places exactly.
        let anchor = locate_line(&html, "a.js", 30).unwrap();
        assert_eq!(anchor.kind, PlacementKind::Exact);
        assert!(anchor.summary().preview.contains("target()"));
    }

    #[test]
    fn region_is_matched_on_its_own_path_only() {
        let html = Html::parse_document(
            r#"<div class="file" data-path="a.js">
                 <a title="b.js" href="b.js">b.js</a>
                 <table class="diff-table"><tbody><tr data-line-number="1"><td>in a</td></tr></tbody></table>
               </div>
               <div class="file" data-path="b.js">
                 <table class="diff-table"><tbody><tr data-line-number="1"><td>in b</td></tr></tbody></table>
               </div>"#,
        );
        let anchor = locate_line(&html, "b.js", 1).unwrap();
        assert_eq!(anchor.kind, PlacementKind::Exact);
        assert_eq!(anchor.summary().preview, "in b");
        assert_eq!(attr(anchor.region, "data-path"), Some("b.js"));
    }

    #[test]
    fn text_match_requires_whole_token() {
        let html = Html::parse_document(PAGE);
        let anchor = locate_line(&html, "b.js", 44).unwrap();
        assert_eq!(anchor.kind, PlacementKind::TextMatch);

        let anchor = locate_line(&html, "b.js", 4).unwrap();
        assert_eq!(anchor.kind, PlacementKind::Fallback);
    }

    #[test]
    fn unknown_file_fails() {
        let html = Html::parse_document(PAGE);
        assert!(locate_line(&html, "missing.rs", 1).is_none());
        assert!(locate_line(&html, "a", 1).is_none(), "paths match exactly");
    }

    #[test]
    fn report_counts_each_outcome() {
        let html = Html::parse_document(PAGE);
        let report = place_all(
            &html,
            &[
                suggestion("a.js", 1),
                suggestion("b.js", 44),
                suggestion("a.js", 999),
                suggestion("nope.js", 1),
            ],
        );
        assert_eq!(
            report.summary,
            PlacementSummary {
                total: 4,
                exact: 1,
                text_match: 1,
                fallback: 1,
                failed: 1,
            }
        );
        assert_eq!(report.summary.placed(), 2);
        assert!(report.outcomes[3].anchor.is_none());
    }

    #[test]
    fn number_token_boundaries() {
        assert!(contains_number_token("line 12 here", "12"));
        assert!(contains_number_token("L12", "12"));
        assert!(!contains_number_token("112", "12"));
        assert!(!contains_number_token("123", "12"));
        assert!(!contains_number_token("", "1"));
    }
}
