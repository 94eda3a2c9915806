//! Turning the rows of one file region into hunks of change lines.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use tracing::debug;

use super::probe::{attr, has_any_class, parse_line_number, trimmed_text, ProbeChain, Scope};
use crate::constants::HUNK_MARKER;
use crate::models::{ChangeKind, ChangeLine, Hunk};

static ROW_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "row",
        &[
            ".js-file-line-container tr",
            ".diff-table tr",
            "table tr",
            ".js-file-line, .blob-code",
            "[data-line-number]",
        ],
    )
});

static EXPANDABLE_ROW_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "expandable-row",
        &[
            ".js-file-content .js-file-line-container tr.js-expandable-line",
            ".js-file-content tr.js-expandable-line",
            ".js-file-content tr.blob-expanded",
        ],
    )
});

static TABLE: LazyLock<ProbeChain> = LazyLock::new(|| ProbeChain::new("table", &["table"]));

static TABLE_ROW: LazyLock<ProbeChain> = LazyLock::new(|| ProbeChain::new("tr", &["tr"]));

static ROW_FALLBACK_PROBES: LazyLock<ProbeChain> =
    LazyLock::new(|| ProbeChain::new("row-fallback", &["pre, code"]));

static CODE_CELL_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "code-cell",
        &[
            "td.blob-code",
            "td.js-file-line",
            ".blob-code",
            ".js-file-line",
            "td:not(.blob-num)",
            "td",
            "span.code",
            "code",
        ],
    )
});

static NUMBER_CELLS: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new("number-cell", &[".blob-num, .line-num, [data-line-number]"])
});

static ATTRIBUTE_CARRIER: LazyLock<ProbeChain> =
    LazyLock::new(|| ProbeChain::new("line-attribute", &["[data-line-number]"]));

static LINE_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"L(\d+)").unwrap());
static LINE_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)line\s+(\d+)").unwrap());
static BARE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d+)\b").unwrap());

const LINE_NUMBER_ATTR: &str = "data-line-number";
const ADDITION_CLASSES: &[&str] = &["addition", "blob-addition", "ins", "blob-code-addition"];
const DELETION_CLASSES: &[&str] = &["deletion", "blob-deletion", "del", "blob-code-deletion"];

/// What a single row turned out to be.
#[derive(Debug, PartialEq)]
enum RowRecord {
    Header(String),
    Change(ChangeLine),
}

/// Accumulates change lines under the most recent header.
#[derive(Default)]
struct HunkBuilder {
    hunks: Vec<Hunk>,
    current: Option<Hunk>,
    changes_seen: u32,
}

impl HunkBuilder {
    fn start(&mut self, header: String) {
        self.flush();
        self.current = Some(Hunk {
            header,
            changes: Vec::new(),
        });
    }

    fn push(&mut self, change: ChangeLine) {
        self.changes_seen += 1;
        self.current.get_or_insert_with(Hunk::default).changes.push(change);
    }

    /// Index a synthetic line number would take.
    fn next_index(&self) -> u32 {
        self.changes_seen + 1
    }

    fn flush(&mut self) {
        if let Some(hunk) = self.current.take() {
            self.hunks.push(hunk);
        }
    }

    fn finish(mut self) -> Vec<Hunk> {
        self.flush();
        self.hunks
    }
}

/// Extract the hunks of one file region.
///
/// Expandable-line markers are tried first: when present, every row of the
/// tables holding them is read. Otherwise rows come from the first row probe
/// that matches, and failing that `pre` and `code` blocks are read as rows.
/// Rows whose content starts with `@@` open a new hunk; changes seen before
/// any header land in a hunk with an empty header.
pub fn extract_hunks(region: ElementRef<'_>) -> Vec<Hunk> {
    let scope = Scope::Element(region);
    let rows = match expandable_rows(region) {
        Some(rows) => rows,
        None => match ROW_PROBES
            .first_match(scope)
            .or_else(|| ROW_FALLBACK_PROBES.first_match(scope))
        {
            Some(hit) => outermost(hit.elements),
            None => {
                debug!("no rows found in file region");
                return Vec::new();
            }
        },
    };

    let mut builder = HunkBuilder::default();
    for row in rows {
        match read_row(row, builder.next_index()) {
            Some(RowRecord::Header(header)) => builder.start(header),
            Some(RowRecord::Change(change)) => builder.push(change),
            None => {}
        }
    }
    builder.finish()
}

/// All rows of the tables that carry expandable-line markers.
///
/// The markers themselves are only expander and expanded-context rows, so
/// they locate the tables rather than standing in for the rows.
fn expandable_rows(region: ElementRef<'_>) -> Option<Vec<ElementRef<'_>>> {
    let hit = EXPANDABLE_ROW_PROBES.first_match(Scope::Element(region))?;
    let mut seen = HashSet::new();
    let rows: Vec<_> = hit
        .elements
        .into_iter()
        .filter_map(|marker| TABLE.closest(marker))
        .filter(|table| seen.insert(table.id()))
        .flat_map(|table| {
            TABLE_ROW
                .first_match(Scope::Element(table))
                .map(|rows| rows.elements)
                .unwrap_or_default()
        })
        .collect();
    (!rows.is_empty()).then_some(rows)
}

/// Drop matches nested inside another match, so `pre > code` reads once.
fn outermost(rows: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: HashSet<_> = rows.iter().map(|row| row.id()).collect();
    rows.into_iter()
        .filter(|row| !row.ancestors().any(|node| ids.contains(&node.id())))
        .collect()
}

fn read_row(row: ElementRef<'_>, next_index: u32) -> Option<RowRecord> {
    let cell = content_cell(row);
    let text = match cell {
        Some(cell) => trimmed_text(cell),
        None => trimmed_text(row),
    };
    if text.is_empty() {
        return None;
    }
    if text.starts_with(HUNK_MARKER) {
        return Some(RowRecord::Header(text));
    }

    let change_kind = change_kind(row, cell);
    let content = match change_kind {
        ChangeKind::Context => text,
        kind => text
            .strip_prefix(kind.sigil())
            .map(|rest| rest.trim_start().to_string())
            .unwrap_or(text),
    };
    if content.is_empty() {
        return None;
    }

    let (old_line_number, new_line_number, synthetic_line) =
        match paired_line_numbers(row) {
            Some((old, new)) => (old, new, false),
            None => match single_line_number(row) {
                Some(n) => {
                    let (old, new) = assign_by_kind(n, change_kind);
                    (old, new, false)
                }
                None => (None, Some(next_index), true),
            },
        };

    Some(RowRecord::Change(ChangeLine {
        change_kind,
        content,
        old_line_number,
        new_line_number,
        synthetic_line,
    }))
}

/// Best code-bearing descendant of a row.
///
/// Among the winning probe's matches, the first whose text is not a bare
/// number is preferred so that unclassed number columns are skipped.
fn content_cell(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let hit = CODE_CELL_PROBES.first_match(Scope::Element(row))?;
    hit.elements
        .iter()
        .copied()
        .find(|el| !is_bare_number(&trimmed_text(*el)))
        .or_else(|| hit.elements.first().copied())
}

fn is_bare_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn change_kind(row: ElementRef<'_>, cell: Option<ElementRef<'_>>) -> ChangeKind {
    let marked = |classes: &[&str]| {
        has_any_class(row, classes) || cell.is_some_and(|c| has_any_class(c, classes))
    };
    if marked(ADDITION_CLASSES) {
        ChangeKind::Addition
    } else if marked(DELETION_CLASSES) {
        ChangeKind::Deletion
    } else {
        ChangeKind::Context
    }
}

/// Two number cells in one row mean old and new columns, in that order.
fn paired_line_numbers(row: ElementRef<'_>) -> Option<(Option<u32>, Option<u32>)> {
    let cells = NUMBER_CELLS.first_match(Scope::Element(row))?.elements;
    if cells.len() < 2 {
        return None;
    }
    let old = cell_number(cells[0]);
    let new = cell_number(cells[1]);
    (old.is_some() || new.is_some()).then_some((old, new))
}

/// A single number for the row, from the most to the least specific source.
fn single_line_number(row: ElementRef<'_>) -> Option<u32> {
    attribute_number(row)
        .or_else(|| {
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find_map(attribute_number)
        })
        .or_else(|| {
            ATTRIBUTE_CARRIER
                .first_match(Scope::Element(row))
                .and_then(|hit| hit.elements.into_iter().find_map(attribute_number))
        })
        .or_else(|| {
            NUMBER_CELLS
                .first_match(Scope::Element(row))
                .and_then(|hit| hit.elements.into_iter().find_map(cell_number))
        })
        .or_else(|| number_from_text(&row.text().collect::<Vec<_>>().join(" ")))
}

fn attribute_number(el: ElementRef<'_>) -> Option<u32> {
    attr(el, LINE_NUMBER_ATTR).and_then(parse_line_number)
}

fn cell_number(cell: ElementRef<'_>) -> Option<u32> {
    attribute_number(cell).or_else(|| parse_line_number(&trimmed_text(cell)))
}

fn number_from_text(text: &str) -> Option<u32> {
    [&*LINE_ANCHOR_RE, &*LINE_WORD_RE, &*BARE_NUMBER_RE]
        .into_iter()
        .find_map(|re| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| parse_line_number(m.as_str()))
        })
}

fn assign_by_kind(n: u32, kind: ChangeKind) -> (Option<u32>, Option<u32>) {
    match kind {
        ChangeKind::Deletion => (Some(n), None),
        ChangeKind::Addition => (None, Some(n)),
        ChangeKind::Context => (Some(n), Some(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn hunks_of(source: &str) -> Vec<Hunk> {
        let html = Html::parse_document(source);
        let region_sel = Selector::parse(".region").unwrap();
        let region = html.select(&region_sel).next().unwrap();
        extract_hunks(region)
    }

    #[test]
    fn classic_table_rows() {
        let hunks = hunks_of(
            r#"<div class="region"><table class="diff-table"><tbody>
                 <tr><td class="blob-num"></td><td class="blob-num"></td><td class="blob-code">@@ -1,2 +1,2 @@</td></tr>
                 <tr><td class="blob-num" data-line-number="1"></td><td class="blob-num" data-line-number="1"></td><td class="blob-code">let a = 1;</td></tr>
                 <tr><td class="blob-num" data-line-number="2"></td><td class="blob-num"></td><td class="blob-code blob-code-deletion">-console.log(0)</td></tr>
                 <tr><td class="blob-num"></td><td class="blob-num" data-line-number="2"></td><td class="blob-code blob-code-addition">+console.log(1)</td></tr>
               </tbody></table></div>"#,
        );
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].header, "@@ -1,2 +1,2 @@");
        let changes = &hunks[0].changes;
        assert_eq!(changes.len(), 3);

        assert_eq!(changes[0].change_kind, ChangeKind::Context);
        assert_eq!((changes[0].old_line_number, changes[0].new_line_number), (Some(1), Some(1)));

        assert_eq!(changes[1].change_kind, ChangeKind::Deletion);
        assert_eq!(changes[1].content, "console.log(0)");
        assert_eq!((changes[1].old_line_number, changes[1].new_line_number), (Some(2), None));

        assert_eq!(changes[2].change_kind, ChangeKind::Addition);
        assert_eq!(changes[2].content, "console.log(1)");
        assert_eq!((changes[2].old_line_number, changes[2].new_line_number), (None, Some(2)));
        assert!(!changes[2].synthetic_line);
    }

    #[test]
    fn changes_before_header_get_empty_header() {
        let hunks = hunks_of(
            r#"<div class="region"><table><tr class="addition" data-line-number="4"><td>+fn a() {}</td></tr>
                 <tr><td>@@ -10,1 +10,1 @@</td></tr>
                 <tr data-line-number="10"><td>b()</td></tr></table></div>"#,
        );
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].header, "");
        assert_eq!(hunks[0].changes[0].new_line_number, Some(4));
        assert_eq!(hunks[0].changes[0].old_line_number, None);
        assert_eq!(hunks[1].header, "@@ -10,1 +10,1 @@");
        assert_eq!(hunks[1].changes[0].old_line_number, Some(10));
        assert_eq!(hunks[1].changes[0].new_line_number, Some(10));
    }

    #[test]
    fn empty_rows_are_skipped() {
        let hunks = hunks_of(
            r#"<div class="region"><table><tr><td>   </td></tr><tr data-line-number="3"><td>x</td></tr></table></div>"#,
        );
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].changes.len(), 1);
    }

    #[test]
    fn synthetic_numbers_count_changes() {
        let hunks = hunks_of(
            r#"<div class="region"><pre>alpha</pre><pre>beta</pre></div>"#,
        );
        let changes = &hunks[0].changes;
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.synthetic_line));
        assert_eq!(changes[0].new_line_number, Some(1));
        assert_eq!(changes[1].new_line_number, Some(2));
    }

    #[test]
    fn text_patterns_recover_numbers() {
        assert_eq!(number_from_text("see L42 here"), Some(42));
        assert_eq!(number_from_text("Line  7: foo"), Some(7));
        assert_eq!(number_from_text("x 13 y"), Some(13));
        assert_eq!(number_from_text("no digits"), None);
    }

    #[test]
    fn unclassed_number_column_is_not_content() {
        let hunks = hunks_of(
            r#"<div class="region"><table><tr><td>5</td><td>return x;</td></tr></table></div>"#,
        );
        let change = &hunks[0].changes[0];
        assert_eq!(change.content, "return x;");
        assert_eq!(change.old_line_number, Some(5));
        assert_eq!(change.new_line_number, Some(5));
    }

    #[test]
    fn nested_code_inside_pre_reads_once() {
        let hunks = hunks_of(r#"<div class="region"><pre><code>let a = 1;</code></pre></div>"#);
        let changes = &hunks[0].changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].content, "let a = 1;");
        assert_eq!(changes[0].new_line_number, Some(1));
    }

    #[test]
    fn expandable_markers_keep_every_row_of_their_table() {
        let hunks = hunks_of(
            r#"<div class="region"><div class="js-file-content"><table class="diff-table">
                 <tr class="js-expandable-line"><td class="blob-num"></td><td class="blob-num"></td><td class="blob-code">@@ -3,2 +3,3 @@</td></tr>
                 <tr><td class="blob-num" data-line-number="3"></td><td class="blob-num" data-line-number="3"></td><td class="blob-code">keep();</td></tr>
                 <tr><td class="blob-num"></td><td class="blob-num" data-line-number="4"></td><td class="blob-code blob-code-addition">+added();</td></tr>
               </table></div></div>"#,
        );
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].header, "@@ -3,2 +3,3 @@");
        let changes = &hunks[0].changes;
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].change_kind, ChangeKind::Addition);
        assert_eq!(changes[1].content, "added();");
        assert_eq!(changes[1].new_line_number, Some(4));
    }

    #[test]
    fn region_without_rows_yields_nothing() {
        assert!(hunks_of(r#"<div class="region"><p></p></div>"#).is_empty());
    }
}
