//! Style definitions (word/styles.xml)

use crate::document::run::RunProperties;
use crate::error::Result;
use crate::xml::{get_w_val, RawXmlElement};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// A named style definition (w:style)
#[derive(Clone, Debug, Default)]
pub struct StyleDef {
    /// Style ID (w:styleId)
    pub id: String,
    /// Style type: paragraph/character/table/numbering
    pub style_type: Option<String>,
    /// Display name (w:name)
    pub name: Option<String>,
    /// Run formatting carried by the style (w:rPr)
    pub run: Option<RunProperties>,
    /// Outline level from the style's paragraph properties
    pub outline_level: Option<u8>,
    /// Justification from the style's paragraph properties
    pub justification: Option<String>,
}

/// Parsed styles part: document defaults plus named styles
#[derive(Clone, Debug, Default)]
pub struct Styles {
    /// Run formatting from w:docDefaults > w:rPrDefault > w:rPr
    pub doc_defaults: Option<RunProperties>,
    styles: HashMap<String, StyleDef>,
}

impl Styles {
    /// Parse from the bytes of word/styles.xml
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)?;
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut styles = Styles::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"styles" => {} // root, descend
                        b"docDefaults" => styles.read_doc_defaults(&mut reader)?,
                        b"style" => {
                            let id = crate::xml::get_attr(&e, "w:styleId")
                                .or_else(|| crate::xml::get_attr(&e, "styleId"));
                            let style_type = crate::xml::get_attr(&e, "w:type")
                                .or_else(|| crate::xml::get_attr(&e, "type"));
                            let mut def = Styles::read_style(&mut reader)?;
                            if let Some(id) = id {
                                def.id = id.clone();
                                def.style_type = style_type;
                                styles.styles.insert(id, def);
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

        Ok(styles)
    }

    fn read_doc_defaults(&mut self, reader: &mut Reader<&[u8]>) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"rPr" => self.doc_defaults = Some(RunProperties::from_reader(reader)?),
                        b"rPrDefault" | b"pPrDefault" => {} // descend
                        _ => {
                            RawXmlElement::from_reader(reader, &e)?;
                        }
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"docDefaults" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn read_style(reader: &mut Reader<&[u8]>) -> Result<StyleDef> {
        let mut def = StyleDef::default();
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"rPr" => def.run = Some(RunProperties::from_reader(reader)?),
                        b"pPr" => {
                            let raw = RawXmlElement::from_reader(reader, &e)?;
                            def.outline_level = raw
                                .find_descendant("outlineLvl")
                                .and_then(|e| e.attr_local("val"))
                                .and_then(|v| v.parse().ok());
                            def.justification = raw
                                .find_descendant("jc")
                                .and_then(|e| e.attr_local("val"))
                                .map(String::from);
                        }
                        _ => {
                            RawXmlElement::from_reader(reader, &e)?;
                        }
                    }
                }
                Event::Empty(e) => {
                    if e.name().local_name().as_ref() == b"name" {
                        def.name = get_w_val(&e);
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"style" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(def)
    }

    /// Look up a style by its ID
    pub fn get(&self, id: &str) -> Option<&StyleDef> {
        self.styles.get(id)
    }

    /// The default paragraph style, used when a paragraph names no style
    pub fn normal(&self) -> Option<&StyleDef> {
        self.styles.get("Normal")
    }

    /// Number of named styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether any named styles were parsed
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault>
      <w:rPr><w:rFonts w:ascii="Calibri" w:asciiTheme="minorHAnsi"/><w:sz w:val="22"/></w:rPr>
    </w:rPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:styleId="Normal">
    <w:name w:val="Normal"/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:pPr><w:outlineLvl w:val="0"/><w:jc w:val="center"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="32"/><w:color w:val="2E74B5"/></w:rPr>
  </w:style>
</w:styles>"#;

    #[test]
    fn test_doc_defaults_parsed() {
        let styles = Styles::from_bytes(STYLES.as_bytes()).unwrap();
        let defaults = styles.doc_defaults.as_ref().unwrap();
        assert_eq!(defaults.size, Some(22));
        assert_eq!(defaults.font_ascii.as_deref(), Some("Calibri"));
        assert_eq!(defaults.font_ascii_theme.as_deref(), Some("minorHAnsi"));
    }

    #[test]
    fn test_heading_style_fields() {
        let styles = Styles::from_bytes(STYLES.as_bytes()).unwrap();
        let heading = styles.get("Heading1").unwrap();
        assert_eq!(heading.name.as_deref(), Some("heading 1"));
        assert_eq!(heading.outline_level, Some(0));
        assert_eq!(heading.justification.as_deref(), Some("center"));
        let run = heading.run.as_ref().unwrap();
        assert_eq!(run.bold, Some(true));
        assert_eq!(run.size, Some(32));
        assert_eq!(run.color.as_deref(), Some("2E74B5"));
    }

    #[test]
    fn test_normal_fallback_and_unknown() {
        let styles = Styles::from_bytes(STYLES.as_bytes()).unwrap();
        assert!(styles.normal().is_some());
        assert!(styles.get("NoSuchStyle").is_none());
    }
}
