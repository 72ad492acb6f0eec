//! # docx-patch
//!
//! Structural patching for DOCX packages with round-trip preservation.
//!
//! A DOCX file is a ZIP of XML parts. This crate opens the package, parses
//! the main document into a typed tree (everything it does not model is
//! preserved as raw XML), applies a closed set of patch operations, checks
//! the result against structural invariants, and writes the package back.
//! Parts that were not touched round-trip byte for byte.
//!
//! ## Quick start
//!
//! ```no_run
//! use docx_patch::{apply_patch, PatchOp};
//!
//! let report = apply_patch(
//!     "input.docx",
//!     "output.docx",
//!     &[PatchOp::ReplaceParagraphText {
//!         from: "Draft".into(),
//!         to: "Final".into(),
//!     }],
//! )?;
//! for warning in &report.warnings {
//!     eprintln!("{warning}");
//! }
//! # Ok::<(), docx_patch::Error>(())
//! ```
//!
//! Operations never fail on not-found conditions; each returns an
//! [`OpReport`] that is either applied or skipped with a machine-readable
//! reason. Only malformed input and invariant violations are errors.

pub mod document;
pub mod error;
pub mod markup;
pub mod opc;
pub mod ops;
pub mod outline;
pub mod session;
pub mod style;
pub mod validate;
pub mod xml;

pub use document::Document;
pub use error::{Error, Result};
pub use markup::project;
pub use ops::{Anchor, OpReport, OpStatus, PatchOp, SkipReason};
pub use outline::{outline, OutlineEntry};
pub use session::{apply_patch, PatchReport, PatchSession, StructuralStats};
pub use style::{ListBinding, ParagraphRole, ResolvedRunStyle, StyleContext};
pub use validate::{ExpectedDelta, StructuralSnapshot};
