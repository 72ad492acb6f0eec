//! Content Types handling for OPC packages
//!
//! Parses and generates `[Content_Types].xml`. The original bytes are
//! written back unless a mapping was added, so an untouched manifest
//! round-trips byte-for-byte.

use crate::error::{Error, Result};
use crate::opc::PartUri;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Content types manifest for an OPC package
#[derive(Clone, Debug, Default)]
pub struct ContentTypes {
    /// Default extension mappings in document order (extension, content type)
    defaults: Vec<(String, String)>,
    /// Override mappings in document order (part URI, content type)
    overrides: Vec<(PartUri, String)>,
    /// Original serialized bytes
    raw: Option<Vec<u8>>,
    /// Whether mappings diverged from `raw`
    dirty: bool,
}

impl ContentTypes {
    /// Create a manifest with the standard defaults of a fresh package
    pub fn new() -> Self {
        let mut ct = Self::default();
        ct.dirty = true; // no raw form to fall back to
        ct.push_default("rels", RELATIONSHIPS);
        ct.push_default("xml", XML);
        ct
    }

    /// Parse from XML bytes, remembering the original serialization
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let xml = std::str::from_utf8(&bytes)?;
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut ct = Self::from_reader(&mut reader)?;
        ct.raw = Some(bytes);
        Ok(ct)
    }

    /// Parse from a reader
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut ct = Self::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) => match e.name().local_name().as_ref() {
                    b"Default" => {
                        let ext = required_attr(&e, "Extension")?;
                        let content_type = required_attr(&e, "ContentType")?;
                        ct.defaults.push((ext.to_lowercase(), content_type));
                    }
                    b"Override" => {
                        let part_name = required_attr(&e, "PartName")?;
                        let content_type = required_attr(&e, "ContentType")?;
                        ct.overrides.push((PartUri::new(&part_name)?, content_type));
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(ct)
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

        let mut types = BytesStart::new("Types");
        types.push_attribute(("xmlns", crate::xml::namespace::CT));
        xml.write_event(Event::Start(types))?;

        for (ext, content_type) in &self.defaults {
            let mut default = BytesStart::new("Default");
            default.push_attribute(("Extension", ext.as_str()));
            default.push_attribute(("ContentType", content_type.as_str()));
            xml.write_event(Event::Empty(default))?;
        }

        for (uri, content_type) in &self.overrides {
            let mut override_elem = BytesStart::new("Override");
            override_elem.push_attribute(("PartName", uri.as_str()));
            override_elem.push_attribute(("ContentType", content_type.as_str()));
            xml.write_event(Event::Empty(override_elem))?;
        }

        xml.write_event(Event::End(BytesEnd::new("Types")))?;
        Ok(buf)
    }

    /// Ensure a default mapping for an extension exists; no-op when present
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let ext = extension.to_lowercase();
        if self.defaults.iter().any(|(e, _)| *e == ext) {
            return;
        }
        self.defaults.push((ext, content_type.to_string()));
        self.dirty = true;
    }

    /// Add (or replace) an override for a specific part
    pub fn set_override(&mut self, uri: &PartUri, content_type: &str) {
        if let Some(entry) = self.overrides.iter_mut().find(|(u, _)| u == uri) {
            if entry.1 == content_type {
                return;
            }
            entry.1 = content_type.to_string();
        } else {
            self.overrides.push((uri.clone(), content_type.to_string()));
        }
        self.dirty = true;
    }

    /// Content type for a part: override first, then extension default
    pub fn get(&self, uri: &PartUri) -> Option<&str> {
        if let Some((_, ct)) = self.overrides.iter().find(|(u, _)| u == uri) {
            return Some(ct);
        }
        let ext = uri.extension()?.to_lowercase();
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ct)| ct.as_str())
    }

    /// Whether the manifest diverged from its parsed form
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn push_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .push((extension.to_lowercase(), content_type.to_string()));
    }
}

fn required_attr(element: &BytesStart, name: &str) -> Result<String> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    Err(Error::MissingAttribute {
        element: String::from_utf8_lossy(element.name().as_ref()).to_string(),
        attr: name.to_string(),
    })
}

// Well-known content types
pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const XML: &str = "application/xml";
pub const MAIN_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

    #[test]
    fn test_parse_and_lookup() {
        let ct = ContentTypes::from_bytes(SAMPLE.as_bytes().to_vec()).unwrap();
        let doc = PartUri::new("/word/document.xml").unwrap();
        assert_eq!(ct.get(&doc), Some(MAIN_DOCUMENT));

        let rels = PartUri::new("/_rels/.rels").unwrap();
        assert_eq!(ct.get(&rels), Some(RELATIONSHIPS));
    }

    #[test]
    fn test_untouched_bytes_preserved() {
        let ct = ContentTypes::from_bytes(SAMPLE.as_bytes().to_vec()).unwrap();
        assert!(!ct.is_dirty());
        assert_eq!(ct.to_bytes().unwrap(), SAMPLE.as_bytes());
    }

    #[test]
    fn test_ensure_default_is_idempotent() {
        let mut ct = ContentTypes::from_bytes(SAMPLE.as_bytes().to_vec()).unwrap();
        ct.ensure_default("xml", XML);
        assert!(!ct.is_dirty(), "existing mapping must be a no-op");

        ct.ensure_default("png", "image/png");
        assert!(ct.is_dirty());
        let media = PartUri::new("/word/media/image1.png").unwrap();
        assert_eq!(ct.get(&media), Some("image/png"));
    }

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        let mut ct = ContentTypes::new();
        ct.ensure_default("PNG", "image/png");
        let media = PartUri::new("/word/media/image1.png").unwrap();
        assert_eq!(ct.get(&media), Some("image/png"));
    }
}
