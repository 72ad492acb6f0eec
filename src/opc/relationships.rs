//! Relationships handling for OPC packages
//!
//! Parses and generates `.rels` files. Relationships keep their document
//! order, the original bytes are written back unless something was
//! modified, and id allocation is monotonic: `rId{max + 1}` over the
//! numeric ids seen so far, never reusing a freed id within a session.

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Collection of relationships for one source (package or part)
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    /// Relationships in document order
    items: Vec<Relationship>,
    /// Original serialized bytes, kept for byte-for-byte round-trip
    raw: Option<Vec<u8>>,
    /// Whether the collection diverged from `raw`
    dirty: bool,
    /// Highest id number ever allocated or observed
    high_water: u32,
}

/// A single relationship
#[derive(Clone, Debug)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Target mode
    pub target_mode: TargetMode,
}

/// Target mode for relationships
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetMode {
    /// Internal target (part within the package)
    #[default]
    Internal,
    /// External target (hyperlink, etc.)
    External,
}

impl Relationships {
    /// Create empty relationships
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from XML bytes, remembering the original serialization
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let xml = std::str::from_utf8(&bytes)?;
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut rels = Self::from_reader(&mut reader)?;
        rels.raw = Some(bytes);
        Ok(rels)
    }

    /// Parse from a reader
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut rels = Self::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => {
                    if e.name().local_name().as_ref() == b"Relationship" {
                        let rel = parse_relationship(&e)?;
                        if let Some(n) = numeric_id(&rel.id) {
                            rels.high_water = rels.high_water.max(n);
                        }
                        rels.items.push(rel);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Serialized form: original bytes if untouched, regenerated otherwise
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if !self.dirty {
            if let Some(raw) = &self.raw {
                return Ok(raw.clone());
            }
        }

        let mut buf = Vec::new();
        let mut xml = Writer::new(&mut buf);

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut rels_elem = BytesStart::new("Relationships");
        rels_elem.push_attribute(("xmlns", crate::xml::namespace::PR));
        xml.write_event(Event::Start(rels_elem))?;

        for rel in &self.items {
            let mut rel_elem = BytesStart::new("Relationship");
            rel_elem.push_attribute(("Id", rel.id.as_str()));
            rel_elem.push_attribute(("Type", rel.rel_type.as_str()));
            rel_elem.push_attribute(("Target", rel.target.as_str()));
            if rel.target_mode == TargetMode::External {
                rel_elem.push_attribute(("TargetMode", "External"));
            }
            xml.write_event(Event::Empty(rel_elem))?;
        }

        xml.write_event(Event::End(BytesEnd::new("Relationships")))?;
        Ok(buf)
    }

    /// Get a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship of a given type, in document order
    pub fn by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    /// Add an internal relationship; returns the allocated id
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        self.push_new(rel_type, target, TargetMode::Internal)
    }

    /// Add an external relationship; returns the allocated id
    pub fn add_external(&mut self, rel_type: &str, target: &str) -> String {
        self.push_new(rel_type, target, TargetMode::External)
    }

    /// Rewrite the target of every relationship of `rel_type` whose target
    /// equals `old_target`; returns the number of rewrites.
    pub fn retarget(&mut self, rel_type: &str, old_target: &str, new_target: &str) -> usize {
        let mut count = 0;
        for rel in &mut self.items {
            if rel.rel_type == rel_type && rel.target == old_target {
                rel.target = new_target.to_string();
                count += 1;
            }
        }
        if count > 0 {
            self.dirty = true;
        }
        count
    }

    /// Iterate over all relationships in document order
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the collection diverged from its parsed form
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn push_new(&mut self, rel_type: &str, target: &str, mode: TargetMode) -> String {
        let max_present = self
            .items
            .iter()
            .filter_map(|r| numeric_id(&r.id))
            .max()
            .unwrap_or(0);
        let next = max_present.max(self.high_water) + 1;
        self.high_water = next;

        let id = format!("rId{}", next);
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: mode,
        });
        self.dirty = true;
        id
    }
}

fn numeric_id(id: &str) -> Option<u32> {
    id.strip_prefix("rId")?.parse().ok()
}

/// Parse a single Relationship element
fn parse_relationship(element: &BytesStart) -> Result<Relationship> {
    let mut id = None;
    let mut rel_type = None;
    let mut target = None;
    let mut target_mode = TargetMode::Internal;

    for attr in element.attributes() {
        let attr = attr?;
        let key = attr.key.local_name();
        let value = String::from_utf8_lossy(&attr.value).to_string();

        match key.as_ref() {
            b"Id" => id = Some(value),
            b"Type" => rel_type = Some(value),
            b"Target" => target = Some(value),
            b"TargetMode" => {
                if value == "External" {
                    target_mode = TargetMode::External;
                }
            }
            _ => {}
        }
    }

    let missing = |attr: &str| Error::MissingAttribute {
        element: "Relationship".into(),
        attr: attr.into(),
    };

    Ok(Relationship {
        id: id.ok_or_else(|| missing("Id"))?,
        rel_type: rel_type.ok_or_else(|| missing("Type"))?,
        target: target.ok_or_else(|| missing("Target"))?,
        target_mode,
    })
}

/// Well-known relationship types
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const NUMBERING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    pub const HEADER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
}
