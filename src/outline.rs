//! Structural outline of a document
//!
//! A flat listing of the body's direct children with their absolute
//! positions, used to address blocks by index in patch operations.

use crate::document::{BlockNode, Document, Paragraph};
use crate::xml::RawXmlNode;

/// One direct body child
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutlineEntry {
    Paragraph {
        index: usize,
        text: String,
        style: Option<String>,
    },
    Table {
        index: usize,
        headers: Vec<String>,
        rows: usize,
        style: Option<String>,
    },
    /// A paragraph whose content is an inline image
    Image {
        index: usize,
        target: Option<String>,
        alt_text: Option<String>,
        rel_id: Option<String>,
    },
    Other {
        index: usize,
        tag: String,
    },
}

impl OutlineEntry {
    /// Absolute position among the body's direct children
    pub fn index(&self) -> usize {
        match self {
            OutlineEntry::Paragraph { index, .. }
            | OutlineEntry::Table { index, .. }
            | OutlineEntry::Image { index, .. }
            | OutlineEntry::Other { index, .. } => *index,
        }
    }
}

/// List the body's direct children in document order
pub fn outline(doc: &Document) -> Vec<OutlineEntry> {
    doc.body
        .content
        .iter()
        .enumerate()
        .map(|(index, node)| match node {
            BlockNode::Paragraph(p) => outline_paragraph(doc, index, p),
            BlockNode::Table(t) => OutlineEntry::Table {
                index,
                headers: t
                    .rows
                    .first()
                    .map(|row| row.cells.iter().map(|c| c.text()).collect())
                    .unwrap_or_default(),
                rows: t.rows.len(),
                style: t
                    .properties
                    .as_ref()
                    .and_then(|p| p.find_descendant("tblStyle"))
                    .and_then(|s| s.attr_local("val"))
                    .map(String::from),
            },
            BlockNode::Unknown(raw) => OutlineEntry::Other {
                index,
                tag: match raw {
                    RawXmlNode::Element(e) => e.local_name().to_string(),
                    _ => "#text".to_string(),
                },
            },
        })
        .collect()
}

fn outline_paragraph(doc: &Document, index: usize, p: &Paragraph) -> OutlineEntry {
    let drawing = p.runs().find_map(|r| r.drawing());
    if let Some(drawing) = drawing {
        if p.text().trim().is_empty() {
            let rel_id = drawing
                .find_descendant("blip")
                .and_then(|b| b.attr_local("embed"))
                .map(String::from);
            let target = rel_id.as_deref().and_then(|id| {
                let part = doc.package().part(doc.uri())?;
                Some(part.relationships()?.get(id)?.target.clone())
            });
            let alt_text = drawing
                .find_descendant("docPr")
                .and_then(|d| d.attr_local("descr").or_else(|| d.attr_local("name")))
                .map(String::from);
            return OutlineEntry::Image {
                index,
                target,
                alt_text,
                rel_id,
            };
        }
    }
    OutlineEntry::Paragraph {
        index,
        text: p.text(),
        style: p.style().map(String::from),
    }
}
