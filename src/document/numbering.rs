//! Numbering definitions (word/numbering.xml)
//!
//! Only the indirection needed to classify lists is modelled: a paragraph
//! names a numbering instance (w:numId), the instance names an abstract
//! definition (w:abstractNumId), and the definition carries a format per
//! indent level (w:numFmt).

use crate::error::Result;
use crate::xml::RawXmlElement;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// Number format of a list level (w:numFmt)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumberFormat {
    /// Bullet character
    Bullet,
    /// No number shown
    None,
    /// 1, 2, 3
    Decimal,
    /// a, b, c
    LowerLetter,
    /// A, B, C
    UpperLetter,
    /// i, ii, iii
    LowerRoman,
    /// I, II, III
    UpperRoman,
    /// Any other format value
    Other(String),
}

impl NumberFormat {
    fn from_val(val: &str) -> Self {
        match val {
            "bullet" => NumberFormat::Bullet,
            "none" => NumberFormat::None,
            "decimal" => NumberFormat::Decimal,
            "lowerLetter" => NumberFormat::LowerLetter,
            "upperLetter" => NumberFormat::UpperLetter,
            "lowerRoman" => NumberFormat::LowerRoman,
            "upperRoman" => NumberFormat::UpperRoman,
            other => NumberFormat::Other(other.to_string()),
        }
    }

    /// Whether this format renders as an unordered list marker
    pub fn is_unordered(&self) -> bool {
        matches!(self, NumberFormat::Bullet | NumberFormat::None)
    }
}

/// Parsed numbering part
#[derive(Clone, Debug, Default)]
pub struct Numbering {
    /// abstractNumId -> (ilvl -> format)
    abstract_levels: HashMap<u32, HashMap<u8, NumberFormat>>,
    /// numId -> abstractNumId
    instances: HashMap<u32, u32>,
}

impl Numbering {
    /// Parse from the bytes of word/numbering.xml
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)?;
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut numbering = Numbering::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"numbering" => {} // root, descend
                        b"abstractNum" => {
                            let id = crate::xml::get_attr(&e, "w:abstractNumId")
                                .or_else(|| crate::xml::get_attr(&e, "abstractNumId"))
                                .and_then(|v| v.parse().ok());
                            let raw = RawXmlElement::from_reader(&mut reader, &e)?;
                            if let Some(id) = id {
                                numbering
                                    .abstract_levels
                                    .insert(id, collect_levels(&raw));
                            }
                        }
                        b"num" => {
                            let num_id = crate::xml::get_attr(&e, "w:numId")
                                .or_else(|| crate::xml::get_attr(&e, "numId"))
                                .and_then(|v| v.parse().ok());
                            let raw = RawXmlElement::from_reader(&mut reader, &e)?;
                            let abstract_id = raw
                                .find_descendant("abstractNumId")
                                .and_then(|e| e.attr_local("val"))
                                .and_then(|v| v.parse().ok());
                            if let (Some(num_id), Some(abstract_id)) = (num_id, abstract_id) {
                                numbering.instances.insert(num_id, abstract_id);
                            }
                        }
                        _ => {
                            RawXmlElement::from_reader(&mut reader, &e)?;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(numbering)
    }

    /// Resolve the format for a numbering reference. Returns None when the
    /// instance, abstract definition, or level is missing.
    pub fn format(&self, num_id: u32, level: u8) -> Option<&NumberFormat> {
        let abstract_id = self.instances.get(&num_id)?;
        self.abstract_levels.get(abstract_id)?.get(&level)
    }

    /// Whether any definitions were parsed
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

fn collect_levels(abstract_num: &RawXmlElement) -> HashMap<u8, NumberFormat> {
    let mut levels = HashMap::new();
    for child in &abstract_num.children {
        if let crate::xml::RawXmlNode::Element(e) = child {
            if e.local_name() != "lvl" {
                continue;
            }
            let Some(ilvl) = e.attr_local("ilvl").and_then(|v| v.parse().ok()) else {
                continue;
            };
            if let Some(fmt) = e
                .find_descendant("numFmt")
                .and_then(|f| f.attr_local("val"))
            {
                levels.insert(ilvl, NumberFormat::from_val(fmt));
            }
        }
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBERING: &str = r#"<?xml version="1.0"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/><w:lvlText w:val="&#61623;"/></w:lvl>
    <w:lvl w:ilvl="1"><w:numFmt w:val="bullet"/></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl>
    <w:lvl w:ilvl="1"><w:numFmt w:val="lowerLetter"/></w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#;

    #[test]
    fn test_bullet_and_decimal_resolution() {
        let numbering = Numbering::from_bytes(NUMBERING.as_bytes()).unwrap();
        assert_eq!(numbering.format(1, 0), Some(&NumberFormat::Bullet));
        assert!(numbering.format(1, 0).unwrap().is_unordered());
        assert_eq!(numbering.format(2, 0), Some(&NumberFormat::Decimal));
        assert!(!numbering.format(2, 0).unwrap().is_unordered());
        assert_eq!(numbering.format(2, 1), Some(&NumberFormat::LowerLetter));
    }

    #[test]
    fn test_missing_lookups_return_none() {
        let numbering = Numbering::from_bytes(NUMBERING.as_bytes()).unwrap();
        assert_eq!(numbering.format(99, 0), None);
        assert_eq!(numbering.format(1, 8), None);
    }
}
