//! Diff model: documents, file diffs, hunks, and change lines.

use serde::{Deserialize, Serialize};

use super::wire::{RawDiffChunk, RawFileDiff};

/// Classification of a diff line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Line exists only in the new version.
    Addition,
    /// Line exists only in the old version.
    Deletion,
    /// Unchanged line.
    #[default]
    Context,
}

impl ChangeKind {
    /// The unified-diff sigil for this kind.
    pub fn sigil(self) -> char {
        match self {
            ChangeKind::Addition => '+',
            ChangeKind::Deletion => '-',
            ChangeKind::Context => ' ',
        }
    }

    /// Kind implied by a leading sigil character.
    pub fn from_sigil(c: char) -> Option<Self> {
        match c {
            '+' => Some(ChangeKind::Addition),
            '-' => Some(ChangeKind::Deletion),
            ' ' => Some(ChangeKind::Context),
            _ => None,
        }
    }

    /// Interpret a wire `lineType` value.
    ///
    /// Different extraction generations wrote different vocabularies, so
    /// several spellings are accepted. Unknown values yield `None`.
    pub fn from_line_type(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "addition" | "add" | "added" | "ins" | "insert" => Some(ChangeKind::Addition),
            "deletion" | "remove" | "removed" | "del" | "delete" => Some(ChangeKind::Deletion),
            "context" | "unchanged" | "normal" => Some(ChangeKind::Context),
            _ => None,
        }
    }

    /// The `lineType` string written on the wire.
    pub fn as_line_type(self) -> &'static str {
        match self {
            ChangeKind::Addition => "addition",
            ChangeKind::Deletion => "deletion",
            ChangeKind::Context => "context",
        }
    }
}

/// A single line within a hunk.
///
/// At least one of `old_line_number` / `new_line_number` is always set.
/// When the source carried no usable number, `new_line_number` holds a
/// sequential index and `synthetic_line` is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLine {
    pub change_kind: ChangeKind,
    /// Line content without the leading `+`/`-`/space.
    pub content: String,
    pub old_line_number: Option<u32>,
    pub new_line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic_line: bool,
}

impl ChangeLine {
    /// The number a reviewer would cite: new numbering first, then old.
    pub fn line_number(&self) -> Option<u32> {
        self.new_line_number.or(self.old_line_number)
    }

    /// Content with its unified-diff sigil restored.
    pub fn marked_content(&self) -> String {
        format!("{}{}", self.change_kind.sigil(), self.content)
    }
}

/// A contiguous block of changes sharing one header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// Header line, e.g. `@@ -1,2 +1,2 @@ fn main`. Empty when none was seen.
    pub header: String,
    pub changes: Vec<ChangeLine>,
}

/// Diff of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Resolved path, or an `unknown-file-*` placeholder.
    pub file_path: String,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Total number of change lines across all hunks.
    pub fn change_count(&self) -> usize {
        self.hunks.iter().map(|h| h.changes.len()).sum()
    }

    /// Flatten into the raw wire shape: header lines followed by their changes.
    pub fn to_wire(&self) -> RawFileDiff {
        let mut diff_chunks = Vec::with_capacity(self.change_count() + self.hunks.len());
        for hunk in &self.hunks {
            if !hunk.header.is_empty() {
                diff_chunks.push(RawDiffChunk {
                    old_line_number: None,
                    new_line_number: None,
                    code_content: hunk.header.clone(),
                    line_type: None,
                });
            }
            for change in &hunk.changes {
                diff_chunks.push(RawDiffChunk {
                    old_line_number: change.old_line_number,
                    new_line_number: change.new_line_number,
                    code_content: change.marked_content(),
                    line_type: Some(change.change_kind.as_line_type().to_string()),
                });
            }
        }
        RawFileDiff {
            file_path: self.file_path.clone(),
            diff_chunks,
        }
    }
}

/// Snapshot of every file visible in one review request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffDocument {
    pub files: Vec<FileDiff>,
}

impl DiffDocument {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The `diffData` array sent to the relay.
    pub fn to_wire(&self) -> Vec<RawFileDiff> {
        self.files.iter().map(FileDiff::to_wire).collect()
    }
}
