//! Header parts (word/header*.xml)

use crate::document::body::BlockNode;
use crate::document::paragraph::Paragraph;
use crate::document::table::Table;
use crate::error::Result;
use crate::xml::{collect_attrs, namespace, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

/// A parsed header part (w:hdr root)
#[derive(Clone, Debug, Default)]
pub struct HeaderPart {
    /// Attributes of the w:hdr root, replayed on serialize
    root_attrs: Vec<(String, String)>,
    /// Block-level content
    pub content: Vec<BlockNode>,
}

impl HeaderPart {
    /// Parse from the bytes of a header part
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)?;
        // text is not trimmed: spaces inside w:t are content
        let mut reader = Reader::from_str(xml);

        let mut header = HeaderPart::default();
        let mut buf = Vec::new();
        let mut in_root = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"hdr" if !in_root => {
                            in_root = true;
                            header.root_attrs = collect_attrs(&e);
                        }
                        b"p" => {
                            let e = e.to_owned();
                            header
                                .content
                                .push(BlockNode::Paragraph(Paragraph::from_reader(
                                    &mut reader,
                                    &e,
                                )?));
                        }
                        b"tbl" => {
                            let e = e.to_owned();
                            header
                                .content
                                .push(BlockNode::Table(Table::from_reader(&mut reader, &e)?));
                        }
                        _ => {
                            let raw = RawXmlElement::from_reader(&mut reader, &e)?;
                            header.content.push(BlockNode::Unknown(RawXmlNode::Element(raw)));
                        }
                    }
                }
                Event::Empty(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"p" => header.content.push(BlockNode::Paragraph(Paragraph::empty())),
                        _ => header.content.push(BlockNode::Unknown(RawXmlNode::Element(
                            RawXmlElement::from_empty(&e),
                        ))),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(header)
    }

    /// Replace `from` with `to` in every paragraph of the header, including
    /// paragraphs inside header tables. Returns the number of paragraphs
    /// changed.
    pub fn replace_text(&mut self, from: &str, to: &str) -> usize {
        let mut changed = 0;
        for node in &mut self.content {
            match node {
                BlockNode::Paragraph(p) => changed += replace_in_paragraph(p, from, to),
                BlockNode::Table(t) => {
                    for row in &mut t.rows {
                        for cell in &mut row.cells {
                            for p in &mut cell.paragraphs {
                                changed += replace_in_paragraph(p, from, to);
                            }
                        }
                    }
                }
                BlockNode::Unknown(_) => {}
            }
        }
        changed
    }

    /// Serialize to part bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut root = BytesStart::new("w:hdr");
        if self.root_attrs.is_empty() {
            for (prefix, uri) in namespace::header_namespaces() {
                root.push_attribute((prefix, uri));
            }
        } else {
            for (key, value) in &self.root_attrs {
                root.push_attribute((key.as_str(), value.as_str()));
            }
        }
        writer.write_event(Event::Start(root))?;

        for node in &self.content {
            match node {
                BlockNode::Paragraph(p) => p.write_to(&mut writer)?,
                BlockNode::Table(t) => t.write_to(&mut writer)?,
                BlockNode::Unknown(raw) => raw.write_to(&mut writer)?,
            }
        }

        writer.write_event(Event::End(BytesEnd::new("w:hdr")))?;
        Ok(buf)
    }
}

/// Replace a paragraph's text when the needle matches its full trimmed
/// text. The paragraph is rewritten through set_text so formatting of the
/// first run survives. Returns 1 on change.
fn replace_in_paragraph(p: &mut Paragraph, from: &str, to: &str) -> usize {
    if p.text().trim() == from.trim() {
        p.set_text(to);
        1
    } else {
        0
    }
}
