//! Document body (w:body) and its block-level children

use crate::document::paragraph::Paragraph;
use crate::document::table::Table;
use crate::error::Result;
use crate::xml::{RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Document body (w:body)
#[derive(Clone, Debug, Default)]
pub struct Body {
    /// Block-level content in document order
    pub content: Vec<BlockNode>,
    /// Section properties (w:sectPr), kept raw, serialized after content
    pub section_properties: Option<RawXmlElement>,
}

/// Block-level node in the body
#[derive(Clone, Debug)]
pub enum BlockNode {
    /// Paragraph (w:p)
    Paragraph(Paragraph),
    /// Table (w:tbl)
    Table(Table),
    /// Unknown block (preserved for round-trip)
    Unknown(RawXmlNode),
}

impl BlockNode {
    /// Local element tag this node serializes as
    pub fn tag(&self) -> &str {
        match self {
            BlockNode::Paragraph(_) => "p",
            BlockNode::Table(_) => "tbl",
            BlockNode::Unknown(RawXmlNode::Element(e)) => e.local_name(),
            BlockNode::Unknown(_) => "#text",
        }
    }
}

impl Body {
    /// Parse from reader (after the w:body start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut body = Body::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"p" => {
                            let e = e.to_owned();
                            body.content
                                .push(BlockNode::Paragraph(Paragraph::from_reader(reader, &e)?));
                        }
                        b"tbl" => {
                            let e = e.to_owned();
                            body.content
                                .push(BlockNode::Table(Table::from_reader(reader, &e)?));
                        }
                        b"sectPr" => {
                            body.section_properties =
                                Some(RawXmlElement::from_reader(reader, &e)?);
                        }
                        _ => {
                            let raw = RawXmlElement::from_reader(reader, &e)?;
                            body.content
                                .push(BlockNode::Unknown(RawXmlNode::Element(raw)));
                        }
                    }
                }
                Event::Empty(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"p" => body.content.push(BlockNode::Paragraph(Paragraph::empty())),
                        _ => body.content.push(BlockNode::Unknown(RawXmlNode::Element(
                            RawXmlElement::from_empty(&e),
                        ))),
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"body" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(body)
    }

    /// Number of direct children, counting section properties when present
    pub fn child_count(&self) -> usize {
        self.content.len() + usize::from(self.section_properties.is_some())
    }

    /// Number of top-level tables
    pub fn table_count(&self) -> usize {
        self.content
            .iter()
            .filter(|n| matches!(n, BlockNode::Table(_)))
            .count()
    }

    /// Structural signature: space-joined local tags of all direct children
    /// in order, section properties last. Two bodies with the same signature
    /// have the same block skeleton.
    pub fn signature(&self) -> String {
        let mut tags: Vec<&str> = self.content.iter().map(|n| n.tag()).collect();
        if self.section_properties.is_some() {
            tags.push("sectPr");
        }
        tags.join(" ")
    }

    /// Paragraphs in document order (top level only)
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(|n| match n {
            BlockNode::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Mutable paragraphs in document order (top level only)
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.content.iter_mut().filter_map(|n| match n {
            BlockNode::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Tables in document order (top level only)
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.content.iter().filter_map(|n| match n {
            BlockNode::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Mutable tables in document order (top level only)
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.content.iter_mut().filter_map(|n| match n {
            BlockNode::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Insert a block at `index` among the addressable children.
    /// Returns false when `index` is past the end.
    pub fn insert(&mut self, index: usize, node: BlockNode) -> bool {
        if index > self.content.len() {
            return false;
        }
        self.content.insert(index, node);
        true
    }

    /// Append a block after all content (before section properties)
    pub fn push(&mut self, node: BlockNode) {
        self.content.push(node);
    }

    /// Remove the block at `index`, if it exists
    pub fn remove(&mut self, index: usize) -> Option<BlockNode> {
        if index < self.content.len() {
            Some(self.content.remove(index))
        } else {
            None
        }
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("w:body")))?;
        for node in &self.content {
            match node {
                BlockNode::Paragraph(p) => p.write_to(writer)?,
                BlockNode::Table(t) => t.write_to(writer)?,
                BlockNode::Unknown(raw) => raw.write_to(writer)?,
            }
        }
        if let Some(sect) = &self.section_properties {
            sect.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:body")))?;
        Ok(())
    }
}
