//! Server-side regrouping of raw chunks and rendering of the prompt context.
//!
//! Extractors send a flat list of chunks per file. Here those are grouped
//! back into hunks (a chunk starting with `@@` opens a new one) and written
//! out as the plain-text block the model is asked to review.

use std::fmt::Write as _;

use crate::constants::{FILE_DELIMITER, HUNK_MARKER};
use crate::models::{ChangeKind, ChangeLine, FileDiff, Hunk, RawDiffChunk, RawFileDiff};

/// Group each file's flat chunk list into hunks.
pub fn regroup(raw: &[RawFileDiff]) -> Vec<FileDiff> {
    raw.iter().map(regroup_file).collect()
}

fn regroup_file(raw: &RawFileDiff) -> FileDiff {
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;
    let mut index = 0u32;

    for chunk in &raw.diff_chunks {
        let trimmed = chunk.code_content.trim_start();
        if trimmed.starts_with(HUNK_MARKER) {
            if let Some(hunk) = current.take() {
                hunks.push(hunk);
            }
            current = Some(Hunk {
                header: trimmed.trim_end().to_string(),
                changes: Vec::new(),
            });
            continue;
        }

        index += 1;
        current
            .get_or_insert_with(Hunk::default)
            .changes
            .push(classify_chunk(chunk, index));
    }
    if let Some(hunk) = current {
        hunks.push(hunk);
    }

    FileDiff {
        file_path: raw.file_path.clone(),
        hunks,
    }
}

/// Classify one chunk. An explicit `lineType` wins; otherwise the leading
/// sigil decides. Chunks with no number get `index` (1-based within the file).
fn classify_chunk(chunk: &RawDiffChunk, index: u32) -> ChangeLine {
    let content = chunk.code_content.as_str();
    let from_sigil = content.chars().next().and_then(ChangeKind::from_sigil);
    let change_kind = chunk
        .line_type
        .as_deref()
        .and_then(ChangeKind::from_line_type)
        .or(from_sigil)
        .unwrap_or(ChangeKind::Context);

    let content = match content.chars().next() {
        Some(c) if ChangeKind::from_sigil(c).is_some() => &content[c.len_utf8()..],
        _ => content,
    };

    let synthetic_line = chunk.old_line_number.is_none() && chunk.new_line_number.is_none();
    ChangeLine {
        change_kind,
        content: content.to_string(),
        old_line_number: chunk.old_line_number,
        new_line_number: if synthetic_line {
            Some(index)
        } else {
            chunk.new_line_number
        },
        synthetic_line,
    }
}

/// Render regrouped files as the prompt context block.
///
/// ```text
/// File: <path>
///
/// <header, or @@ when the hunk has none>
/// <sigil> <content> (Line <n>)
///
/// ---
///
/// ```
pub fn render_context(files: &[FileDiff]) -> String {
    let mut out = String::new();
    for file in files {
        let _ = write!(out, "File: {}\n\n", file.file_path);
        for hunk in &file.hunks {
            let header = if hunk.header.is_empty() {
                HUNK_MARKER
            } else {
                hunk.header.as_str()
            };
            out.push_str(header);
            out.push('\n');
            for change in &hunk.changes {
                let _ = writeln!(
                    out,
                    "{} {} (Line {})",
                    change.change_kind.sigil(),
                    change.content,
                    change.line_number().unwrap_or_default()
                );
            }
            out.push('\n');
        }
        out.push_str(FILE_DELIMITER);
    }
    out
}

/// Regroup and render in one step.
pub fn normalize(raw: &[RawFileDiff]) -> String {
    render_context(&regroup(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(content: &str, old: Option<u32>, new: Option<u32>) -> RawDiffChunk {
        RawDiffChunk {
            old_line_number: old,
            new_line_number: new,
            code_content: content.to_string(),
            line_type: None,
        }
    }

    #[test]
    fn renders_single_addition() {
        let raw = vec![RawFileDiff {
            file_path: "a.js".into(),
            diff_chunks: vec![
                chunk("@@ -1,2 +1,2 @@", None, None),
                chunk("+console.log(1)", None, Some(2)),
            ],
        }];
        assert_eq!(
            normalize(&raw),
            "File: a.js\n\n@@ -1,2 +1,2 @@\n+ console.log(1) (Line 2)\n\n\n---\n\n"
        );
    }

    #[test]
    fn chunks_before_header_render_under_bare_marker() {
        let raw = vec![RawFileDiff {
            file_path: "b.rs".into(),
            diff_chunks: vec![
                chunk("-old()", Some(4), None),
                chunk("@@ -9 +9 @@ fn main", None, None),
                chunk(" keep()", Some(9), Some(9)),
            ],
        }];
        let files = regroup(&raw);
        assert_eq!(files[0].hunks.len(), 2);
        assert_eq!(files[0].hunks[0].header, "");
        assert_eq!(files[0].hunks[0].changes[0].change_kind, ChangeKind::Deletion);

        let text = render_context(&files);
        assert!(text.starts_with("File: b.rs\n\n@@\n- old() (Line 4)\n\n@@ -9 +9 @@ fn main\n"));
        assert!(text.contains("  keep() (Line 9)\n"));
    }

    #[test]
    fn line_type_overrides_sigil() {
        let mut c = chunk("plain", Some(3), None);
        c.line_type = Some("deletion".into());
        let line = classify_chunk(&c, 1);
        assert_eq!(line.change_kind, ChangeKind::Deletion);
        assert_eq!(line.content, "plain");
    }

    #[test]
    fn missing_numbers_use_position_in_file() {
        let raw = vec![RawFileDiff {
            file_path: "c.py".into(),
            diff_chunks: vec![
                chunk("@@ -1 +1 @@", None, None),
                chunk("+a", None, None),
                chunk("+b", None, None),
            ],
        }];
        let text = normalize(&raw);
        assert!(text.contains("+ a (Line 1)\n+ b (Line 2)\n"), "{text}");
    }

    #[test]
    fn multiple_files_each_end_with_delimiter() {
        let raw = vec![
            RawFileDiff {
                file_path: "x".into(),
                diff_chunks: vec![chunk("+1", None, Some(1))],
            },
            RawFileDiff {
                file_path: "y".into(),
                diff_chunks: vec![chunk("+2", None, Some(1))],
            },
        ];
        let text = normalize(&raw);
        assert_eq!(text.matches(FILE_DELIMITER).count(), 2);
        assert!(text.find("File: x").unwrap() < text.find("File: y").unwrap());
    }
}
