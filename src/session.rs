//! Patch session: open, apply a batch, validate, write
//!
//! The session owns the document across a batch. Structural snapshots
//! bracket every batch; a mismatch between the declared and observed
//! change aborts before any output is written, leaving the input file
//! untouched.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::markup;
use crate::ops::{apply_op, OpReport, PatchOp};
use crate::outline::{outline, OutlineEntry};
use crate::style::StyleContext;
use crate::validate::{validate, ExpectedDelta, StructuralSnapshot};
use std::path::{Path, PathBuf};

/// An open document plus the batch machinery around it
pub struct PatchSession {
    doc: Document,
    /// Snapshots of the last applied batch, for reporting
    last_stats: Option<StructuralStats>,
}

/// Before/after skeleton of the last batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuralStats {
    pub before: StructuralSnapshot,
    pub after: StructuralSnapshot,
}

/// Result of [`apply_patch`]
#[derive(Debug)]
pub struct PatchReport {
    pub output_path: PathBuf,
    /// One report per operation, in batch order
    pub results: Vec<OpReport>,
    pub stats: StructuralStats,
    /// Human-readable descriptions of skipped operations
    pub warnings: Vec<String>,
}

impl PatchSession {
    /// Open a session from a file path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        log::info!("opening patch session for {}", path.as_ref().display());
        Ok(PatchSession {
            doc: Document::open(path)?,
            last_stats: None,
        })
    }

    /// Open a session from in-memory package bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(PatchSession {
            doc: Document::from_reader(std::io::Cursor::new(bytes))?,
            last_stats: None,
        })
    }

    /// The open document
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access to the open document
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Outline of the body's direct children
    pub fn outline(&self) -> Vec<OutlineEntry> {
        outline(&self.doc)
    }

    /// Project the document into styled markup
    pub fn project(&self) -> Result<String> {
        let ctx = StyleContext::from_document(&self.doc)?;
        markup::project(&self.doc, &ctx)
    }

    /// Structural stats of the last applied batch
    pub fn stats(&self) -> Option<&StructuralStats> {
        self.last_stats.as_ref()
    }

    /// Apply a batch of operations.
    ///
    /// Input problems (empty batch, zero image dimensions) fail before any
    /// op runs. Ops then run linearly; not-found conditions skip. The
    /// structural gate validates the whole batch afterwards.
    pub fn apply(&mut self, ops: &[PatchOp]) -> Result<Vec<OpReport>> {
        if ops.is_empty() {
            return Err(Error::EmptyBatch);
        }
        for op in ops {
            if let PatchOp::InsertImage {
                width_px, height_px, ..
            } = op
            {
                let width = width_px.unwrap_or(crate::opc::media::DEFAULT_IMAGE_WIDTH_PX);
                let height = height_px.unwrap_or(crate::opc::media::DEFAULT_IMAGE_HEIGHT_PX);
                if width == 0 || height == 0 {
                    return Err(Error::InvalidDimensions { width, height });
                }
            }
        }

        let before = StructuralSnapshot::take(&self.doc.body);
        log::info!("applying {} op(s)", ops.len());

        let mut reports = Vec::with_capacity(ops.len());
        let mut expected = ExpectedDelta::default();
        for op in ops {
            let (report, delta) = apply_op(&mut self.doc, op)?;
            if report.is_applied() {
                expected.add(delta);
            }
            reports.push(report);
        }

        let after = StructuralSnapshot::take(&self.doc.body);
        validate(&before, &after, expected)?;

        let applied = reports.iter().filter(|r| r.is_applied()).count();
        log::info!("batch done: {applied}/{} applied", reports.len());
        self.last_stats = Some(StructuralStats { before, after });
        Ok(reports)
    }

    /// Serialize the document and write the package to a path
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.doc.save(path)
    }

    /// Serialize the document and return the package bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.doc.to_bytes()
    }
}

/// Open `input`, apply `ops`, write the result to `output`.
///
/// A batch in which every op skipped is a valid no-op result; the output
/// is still written and the skips are listed as warnings.
pub fn apply_patch(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    ops: &[PatchOp],
) -> Result<PatchReport> {
    let mut session = PatchSession::open(input)?;
    let results = session.apply(ops)?;

    let warnings: Vec<String> = ops
        .iter()
        .zip(&results)
        .filter_map(|(op, report)| {
            report
                .reason
                .map(|reason| format!("{} skipped: {reason}", op.name()))
        })
        .collect();
    for warning in &warnings {
        log::warn!("{warning}");
    }

    let output = output.as_ref().to_path_buf();
    session.save(&output)?;

    let stats = session
        .last_stats
        .take()
        .expect("apply always records stats");
    Ok(PatchReport {
        output_path: output,
        results,
        stats,
        warnings,
    })
}
