//! Operation executor
//!
//! Each op mutates the document in place and reports what it touched and
//! what structural change it contributed. Not-found conditions skip; only
//! malformed package state errors.

use crate::document::{
    BlockNode, Document, Paragraph, ParagraphContent, Run, RunContent, Table,
};
use crate::error::Result;
use crate::opc::{embed_image, media, px_to_emu};
use crate::ops::{Anchor, OpReport, PatchOp, SkipReason};
use crate::validate::ExpectedDelta;
use crate::xml::RawXmlElement;

/// Apply one operation. Returns the report plus the structural delta the
/// op contributes when applied (zero for in-place edits and skips).
pub fn apply_op(doc: &mut Document, op: &PatchOp) -> Result<(OpReport, ExpectedDelta)> {
    let (report, delta) = match op {
        PatchOp::ReplaceParagraphText { from, to } => {
            (replace_paragraph_text(doc, from, to), ExpectedDelta::default())
        }
        PatchOp::ReplaceParagraphAtIndex { index, to } => {
            (replace_paragraph_at_index(doc, *index, to), ExpectedDelta::default())
        }
        PatchOp::SetStyleAtIndex { index, style } => {
            (set_style_at_index(doc, *index, style), ExpectedDelta::default())
        }
        PatchOp::DeleteAtIndex { index } => delete_at_index(doc, *index),
        PatchOp::SetColorForStyle { style, color } => {
            (set_color_for_style(doc, style, color), ExpectedDelta::default())
        }
        PatchOp::SetColorForParagraph { text, color } => {
            (set_color_for_paragraph(doc, text, color), ExpectedDelta::default())
        }
        PatchOp::InsertParagraphAfterText { after, text, style } => {
            insert_paragraph_after_text(doc, after, text, style.as_deref())
        }
        PatchOp::InsertTable {
            anchor,
            headers,
            rows,
            col_widths,
            style,
        } => insert_table(doc, anchor.as_ref(), headers, rows, col_widths.as_deref(), style.as_deref()),
        PatchOp::InsertImage {
            anchor,
            image_path,
            width_px,
            height_px,
            alt_text,
        } => insert_image(
            doc,
            anchor.as_ref(),
            image_path,
            *width_px,
            *height_px,
            alt_text.as_deref(),
        )?,
        PatchOp::TableSetCellText {
            table_index,
            row,
            col,
            text,
        } => (
            table_set_cell_text(doc, *table_index, *row, *col, text),
            ExpectedDelta::default(),
        ),
        PatchOp::ReplaceTableCellText { from, to } => {
            (replace_table_cell_text(doc, from, to), ExpectedDelta::default())
        }
        PatchOp::ReplaceHyperlinkUrl { old_url, new_url } => {
            (replace_hyperlink_url(doc, old_url, new_url), ExpectedDelta::default())
        }
        PatchOp::HeaderReplaceText { from, to } => {
            (doc.replace_header_text(from, to).map(report_from_count)?, ExpectedDelta::default())
        }
    };

    match &report.reason {
        Some(reason) => log::debug!("op {} skipped: {reason}", op.name()),
        None => log::debug!("op {} applied, {} node(s)", op.name(), report.matched),
    }

    Ok((report, delta))
}

fn report_from_count(matched: usize) -> OpReport {
    if matched > 0 {
        OpReport::applied(matched)
    } else {
        OpReport::skipped(SkipReason::NoMatch)
    }
}

/// Index of the first top-level paragraph whose trimmed text equals `needle`
fn find_paragraph(doc: &Document, needle: &str) -> Option<usize> {
    doc.body.content.iter().position(|node| match node {
        BlockNode::Paragraph(p) => p.text().trim() == needle.trim(),
        _ => false,
    })
}

fn replace_paragraph_text(doc: &mut Document, from: &str, to: &str) -> OpReport {
    match find_paragraph(doc, from) {
        Some(index) => {
            if let Some(BlockNode::Paragraph(p)) = doc.body.content.get_mut(index) {
                p.set_text(to);
            }
            OpReport::applied(1)
        }
        None => OpReport::skipped(SkipReason::NoMatch),
    }
}

fn replace_paragraph_at_index(doc: &mut Document, index: usize, to: &str) -> OpReport {
    match doc.body.content.get_mut(index) {
        Some(BlockNode::Paragraph(p)) => {
            p.set_text(to);
            OpReport::applied(1)
        }
        Some(_) => OpReport::skipped(SkipReason::NoMatch),
        None => OpReport::skipped(SkipReason::IndexOutOfRange),
    }
}

fn set_style_at_index(doc: &mut Document, index: usize, style: &str) -> OpReport {
    match doc.body.content.get_mut(index) {
        Some(BlockNode::Paragraph(p)) => {
            p.set_style(style);
            OpReport::applied(1)
        }
        Some(_) => OpReport::skipped(SkipReason::NoMatch),
        None => OpReport::skipped(SkipReason::IndexOutOfRange),
    }
}

fn delete_at_index(doc: &mut Document, index: usize) -> (OpReport, ExpectedDelta) {
    match doc.body.remove(index) {
        Some(removed) => {
            let tables = if matches!(removed, BlockNode::Table(_)) { -1 } else { 0 };
            (OpReport::applied(1), ExpectedDelta::structural(-1, tables))
        }
        None => (
            OpReport::skipped(SkipReason::IndexOutOfRange),
            ExpectedDelta::default(),
        ),
    }
}

fn color_runs(p: &mut Paragraph, color: &str) {
    for run in p.runs_mut() {
        run.set_color(color);
    }
    for content in &mut p.content {
        if let ParagraphContent::Hyperlink(link) = content {
            for run in &mut link.runs {
                run.set_color(color);
            }
        }
    }
}

fn set_color_for_style(doc: &mut Document, style: &str, color: &str) -> OpReport {
    let mut matched = 0;
    for node in &mut doc.body.content {
        match node {
            BlockNode::Paragraph(p) if p.style() == Some(style) => {
                color_runs(p, color);
                matched += 1;
            }
            BlockNode::Table(t) => {
                for row in &mut t.rows {
                    for cell in &mut row.cells {
                        for p in &mut cell.paragraphs {
                            if p.style() == Some(style) {
                                color_runs(p, color);
                                matched += 1;
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    report_from_count(matched)
}

fn set_color_for_paragraph(doc: &mut Document, text: &str, color: &str) -> OpReport {
    match find_paragraph(doc, text) {
        Some(index) => {
            if let Some(BlockNode::Paragraph(p)) = doc.body.content.get_mut(index) {
                color_runs(p, color);
            }
            OpReport::applied(1)
        }
        None => OpReport::skipped(SkipReason::NoMatch),
    }
}

fn insert_paragraph_after_text(
    doc: &mut Document,
    after: &str,
    text: &str,
    style: Option<&str>,
) -> (OpReport, ExpectedDelta) {
    match find_paragraph(doc, after) {
        Some(index) => {
            let mut p = Paragraph::new(text);
            if let Some(style_id) = style {
                p.set_style(style_id);
            }
            doc.body.insert(index + 1, BlockNode::Paragraph(p));
            (OpReport::applied(1), ExpectedDelta::structural(1, 0))
        }
        None => (
            OpReport::skipped(SkipReason::AnchorNotFound),
            ExpectedDelta::default(),
        ),
    }
}

/// Resolve an anchor to an insertion index among body children
fn resolve_anchor(doc: &Document, anchor: Option<&Anchor>) -> std::result::Result<usize, SkipReason> {
    let anchor = anchor.ok_or(SkipReason::NoAnchor)?;
    let (needle, offset) = match anchor {
        Anchor::Before(text) => (text, 0),
        Anchor::After(text) => (text, 1),
    };
    match find_paragraph(doc, needle) {
        Some(index) => Ok(index + offset),
        None => Err(SkipReason::AnchorNotFound),
    }
}

fn insert_table(
    doc: &mut Document,
    anchor: Option<&Anchor>,
    headers: &[String],
    rows: &[Vec<String>],
    col_widths: Option<&[u32]>,
    style: Option<&str>,
) -> (OpReport, ExpectedDelta) {
    let index = match resolve_anchor(doc, anchor) {
        Ok(index) => index,
        Err(reason) => return (OpReport::skipped(reason), ExpectedDelta::default()),
    };
    let table = Table::from_rows(headers, rows, col_widths, style);
    doc.body.insert(index, BlockNode::Table(table));
    (OpReport::applied(1), ExpectedDelta::structural(1, 1))
}

fn insert_image(
    doc: &mut Document,
    anchor: Option<&Anchor>,
    image_path: &std::path::Path,
    width_px: Option<u32>,
    height_px: Option<u32>,
    alt_text: Option<&str>,
) -> Result<(OpReport, ExpectedDelta)> {
    let index = match resolve_anchor(doc, anchor) {
        Ok(index) => index,
        Err(reason) => return Ok((OpReport::skipped(reason), ExpectedDelta::default())),
    };
    if !image_path.exists() {
        return Ok((
            OpReport::skipped(SkipReason::SourceFileMissing),
            ExpectedDelta::default(),
        ));
    }

    let bytes = std::fs::read(image_path)?;
    let extension = image_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();
    let doc_uri = doc.uri().clone();
    let embedded = embed_image(doc.package_mut(), &doc_uri, bytes, &extension)?;

    let width = width_px.unwrap_or(media::DEFAULT_IMAGE_WIDTH_PX);
    let height = height_px.unwrap_or(media::DEFAULT_IMAGE_HEIGHT_PX);
    let alt = alt_text.unwrap_or("image");

    let mut run = Run::default();
    run.content.push(RunContent::Drawing(build_inline_drawing(
        &embedded.rel_id,
        width,
        height,
        alt,
    )));
    let mut p = Paragraph::empty();
    p.content.push(ParagraphContent::Run(run));
    doc.body.insert(index, BlockNode::Paragraph(p));

    Ok((OpReport::applied(1), ExpectedDelta::structural(1, 0)))
}

/// Build the wp:inline drawing tree for an embedded picture
fn build_inline_drawing(rel_id: &str, width_px: u32, height_px: u32, alt: &str) -> RawXmlElement {
    let cx = px_to_emu(width_px).to_string();
    let cy = px_to_emu(height_px).to_string();

    RawXmlElement::new("w:drawing").with_child(
        RawXmlElement::new("wp:inline")
            .with_attr("distT", "0")
            .with_attr("distB", "0")
            .with_attr("distL", "0")
            .with_attr("distR", "0")
            .with_child(
                RawXmlElement::new("wp:extent")
                    .with_attr("cx", &cx)
                    .with_attr("cy", &cy)
                    .empty(),
            )
            .with_child(
                RawXmlElement::new("wp:docPr")
                    .with_attr("id", "1")
                    .with_attr("name", alt)
                    .with_attr("descr", alt)
                    .empty(),
            )
            .with_child(
                RawXmlElement::new("a:graphic").with_child(
                    RawXmlElement::new("a:graphicData")
                        .with_attr(
                            "uri",
                            "http://schemas.openxmlformats.org/drawingml/2006/picture",
                        )
                        .with_child(
                            RawXmlElement::new("pic:pic")
                                .with_child(
                                    RawXmlElement::new("pic:nvPicPr")
                                        .with_child(
                                            RawXmlElement::new("pic:cNvPr")
                                                .with_attr("id", "0")
                                                .with_attr("name", alt)
                                                .empty(),
                                        )
                                        .with_child(
                                            RawXmlElement::new("pic:cNvPicPr").empty(),
                                        ),
                                )
                                .with_child(
                                    RawXmlElement::new("pic:blipFill")
                                        .with_child(
                                            RawXmlElement::new("a:blip")
                                                .with_attr("r:embed", rel_id)
                                                .empty(),
                                        )
                                        .with_child(
                                            RawXmlElement::new("a:stretch").with_child(
                                                RawXmlElement::new("a:fillRect").empty(),
                                            ),
                                        ),
                                )
                                .with_child(
                                    RawXmlElement::new("pic:spPr")
                                        .with_child(
                                            RawXmlElement::new("a:xfrm")
                                                .with_child(
                                                    RawXmlElement::new("a:off")
                                                        .with_attr("x", "0")
                                                        .with_attr("y", "0")
                                                        .empty(),
                                                )
                                                .with_child(
                                                    RawXmlElement::new("a:ext")
                                                        .with_attr("cx", &cx)
                                                        .with_attr("cy", &cy)
                                                        .empty(),
                                                ),
                                        )
                                        .with_child(
                                            RawXmlElement::new("a:prstGeom")
                                                .with_attr("prst", "rect")
                                                .with_child(
                                                    RawXmlElement::new("a:avLst"),
                                                ),
                                        ),
                                ),
                        ),
                ),
            ),
    )
}

fn table_set_cell_text(
    doc: &mut Document,
    table_index: usize,
    row: usize,
    col: usize,
    text: &str,
) -> OpReport {
    let Some(table) = doc.body.tables_mut().nth(table_index) else {
        return OpReport::skipped(SkipReason::IndexOutOfRange);
    };
    match table.cell_mut(row, col) {
        Some(cell) => {
            cell.set_text(text);
            OpReport::applied(1)
        }
        None => OpReport::skipped(SkipReason::CellOutOfRange),
    }
}

fn replace_table_cell_text(doc: &mut Document, from: &str, to: &str) -> OpReport {
    for table in doc.body.tables_mut() {
        for row in &mut table.rows {
            for cell in &mut row.cells {
                if cell.text().trim() == from.trim() {
                    cell.set_text(to);
                    return OpReport::applied(1);
                }
            }
        }
    }
    OpReport::skipped(SkipReason::NoMatch)
}

fn replace_hyperlink_url(doc: &mut Document, old_url: &str, new_url: &str) -> OpReport {
    let uri = doc.uri().clone();
    let matched = match doc.package_mut().part_mut(&uri) {
        Some(part) => part
            .relationships_mut()
            .retarget(crate::opc::rel_types::HYPERLINK, old_url, new_url),
        None => 0,
    };
    report_from_count(matched)
}
