//! Patch operations: a closed set of edits applied to a document

mod apply;

pub use apply::apply_op;

use std::path::PathBuf;

/// Position of an insertion relative to an anchor paragraph, matched by
/// exact trimmed-text equality against the first paragraph in document
/// order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// Insert after the matching paragraph
    After(String),
    /// Insert before the matching paragraph
    Before(String),
}

/// One edit operation. Not-found conditions never error; they produce a
/// skipped [`OpReport`].
#[derive(Clone, Debug)]
pub enum PatchOp {
    /// Replace the text of the first paragraph whose trimmed text equals
    /// `from`
    ReplaceParagraphText { from: String, to: String },
    /// Replace the text of the paragraph at a direct-body-child index
    ReplaceParagraphAtIndex { index: usize, to: String },
    /// Set the style of the paragraph at a direct-body-child index
    SetStyleAtIndex { index: usize, style: String },
    /// Delete the body child (any block kind) at an index
    DeleteAtIndex { index: usize },
    /// Apply a color override to every run of every paragraph carrying
    /// the given style id; style definitions stay untouched
    SetColorForStyle { style: String, color: String },
    /// Apply a color override to every run of the first paragraph whose
    /// trimmed text equals `text`
    SetColorForParagraph { text: String, color: String },
    /// Insert a new paragraph after the first paragraph whose trimmed
    /// text equals `after`
    InsertParagraphAfterText {
        after: String,
        text: String,
        style: Option<String>,
    },
    /// Insert a table at an anchor; a missing anchor skips the op
    InsertTable {
        anchor: Option<Anchor>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        col_widths: Option<Vec<u32>>,
        style: Option<String>,
    },
    /// Embed an image file and insert it as a new paragraph at an anchor
    InsertImage {
        anchor: Option<Anchor>,
        image_path: PathBuf,
        width_px: Option<u32>,
        height_px: Option<u32>,
        alt_text: Option<String>,
    },
    /// Set cell text by table position (tables counted in document order)
    TableSetCellText {
        table_index: usize,
        row: usize,
        col: usize,
        text: String,
    },
    /// Replace the text of the first cell (document order, row-major)
    /// whose trimmed text equals `from`
    ReplaceTableCellText { from: String, to: String },
    /// Rewrite hyperlink relationship targets matching `old_url`
    ReplaceHyperlinkUrl { old_url: String, new_url: String },
    /// Replace text across all header parts
    HeaderReplaceText { from: String, to: String },
}

impl PatchOp {
    /// Short name used in logs and warnings
    pub fn name(&self) -> &'static str {
        match self {
            PatchOp::ReplaceParagraphText { .. } => "replace_paragraph_text",
            PatchOp::ReplaceParagraphAtIndex { .. } => "replace_paragraph_at_index",
            PatchOp::SetStyleAtIndex { .. } => "set_style_at_index",
            PatchOp::DeleteAtIndex { .. } => "delete_at_index",
            PatchOp::SetColorForStyle { .. } => "set_color_for_style",
            PatchOp::SetColorForParagraph { .. } => "set_color_for_paragraph",
            PatchOp::InsertParagraphAfterText { .. } => "insert_paragraph_after_text",
            PatchOp::InsertTable { .. } => "insert_table",
            PatchOp::InsertImage { .. } => "insert_image",
            PatchOp::TableSetCellText { .. } => "table_set_cell_text",
            PatchOp::ReplaceTableCellText { .. } => "replace_table_cell_text",
            PatchOp::ReplaceHyperlinkUrl { .. } => "replace_hyperlink_url",
            PatchOp::HeaderReplaceText { .. } => "header_replace_text",
        }
    }
}

/// Outcome of a single operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpReport {
    pub status: OpStatus,
    /// Number of nodes the operation touched
    pub matched: usize,
    /// Present only when skipped
    pub reason: Option<SkipReason>,
}

impl OpReport {
    pub(crate) fn applied(matched: usize) -> Self {
        OpReport {
            status: OpStatus::Applied,
            matched,
            reason: None,
        }
    }

    pub(crate) fn skipped(reason: SkipReason) -> Self {
        OpReport {
            status: OpStatus::Skipped,
            matched: 0,
            reason: Some(reason),
        }
    }

    /// Whether the operation changed the document
    pub fn is_applied(&self) -> bool {
        self.status == OpStatus::Applied
    }
}

/// Applied or skipped; skips carry a machine-readable reason
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpStatus {
    Applied,
    Skipped,
}

/// Why an operation was skipped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No node matched the text or style selector
    NoMatch,
    /// The operation requires an anchor and none was given
    NoAnchor,
    /// The anchor text matched no paragraph
    AnchorNotFound,
    /// A body-child or table index past the end
    IndexOutOfRange,
    /// A row/column position outside the table
    CellOutOfRange,
    /// An input file (image) does not exist
    SourceFileMissing,
}

impl SkipReason {
    /// Stable machine-readable token
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoMatch => "no_match",
            SkipReason::NoAnchor => "no_anchor",
            SkipReason::AnchorNotFound => "anchor_not_found",
            SkipReason::IndexOutOfRange => "index_out_of_range",
            SkipReason::CellOutOfRange => "cell_out_of_range",
            SkipReason::SourceFileMissing => "source_file_missing",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_tokens() {
        assert_eq!(SkipReason::NoMatch.as_str(), "no_match");
        assert_eq!(SkipReason::IndexOutOfRange.to_string(), "index_out_of_range");
    }

    #[test]
    fn test_report_constructors() {
        let applied = OpReport::applied(3);
        assert!(applied.is_applied());
        assert_eq!(applied.matched, 3);
        assert_eq!(applied.reason, None);

        let skipped = OpReport::skipped(SkipReason::NoAnchor);
        assert!(!skipped.is_applied());
        assert_eq!(skipped.reason, Some(SkipReason::NoAnchor));
    }
}
