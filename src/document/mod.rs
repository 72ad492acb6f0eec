//! Document model: the main document part and its satellite parts

pub mod body;
pub mod header;
pub mod numbering;
pub mod paragraph;
pub mod run;
pub mod styles;
pub mod table;
pub mod theme;

pub use body::{BlockNode, Body};
pub use header::HeaderPart;
pub use numbering::{NumberFormat, Numbering};
pub use paragraph::{Hyperlink, Paragraph, ParagraphContent, ParagraphProperties};
pub use run::{Run, RunContent, RunProperties};
pub use styles::{StyleDef, Styles};
pub use table::{Table, TableCell, TableRow};
pub use theme::ThemeFonts;

use crate::error::{Error, Result};
use crate::opc::{well_known, Package, PartUri};
use crate::xml::{collect_attrs, namespace};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::{Read, Seek, Write};
use std::path::Path;

/// A DOCX document: the package plus the parsed main document body.
///
/// Satellite parts (styles, numbering, theme, headers) are parsed on
/// demand; untouched parts round-trip byte for byte.
pub struct Document {
    package: Package,
    uri: PartUri,
    /// Attributes of the w:document root, replayed on serialize
    root_attrs: Vec<(String, String)>,
    /// Parsed body, mutated in place by edit operations
    pub body: Body,
}

impl Document {
    /// Open a document from a file path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        log::debug!("opening document from {}", path.as_ref().display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Open a document from any reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let package = Package::from_reader(reader)?;
        Self::from_package(package)
    }

    /// Open a document from an already-loaded package
    pub fn from_package(package: Package) -> Result<Self> {
        let uri = package
            .main_document_uri()
            .ok_or_else(|| Error::MissingPart("main document".into()))?;
        let part = package
            .part(&uri)
            .ok_or_else(|| Error::MissingPart(uri.to_string()))?;
        let (root_attrs, body) = parse_document_xml(part.data())?;
        Ok(Document {
            package,
            uri,
            root_attrs,
            body,
        })
    }

    /// URI of the main document part
    pub fn uri(&self) -> &PartUri {
        &self.uri
    }

    /// The underlying package
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Mutable access to the underlying package
    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Parsed styles part, or defaults when the part is absent
    pub fn styles(&self) -> Result<Styles> {
        match self.package.part(&well_known::styles()) {
            Some(part) => Styles::from_bytes(part.data()),
            None => Ok(Styles::default()),
        }
    }

    /// Parsed numbering part, or empty definitions when the part is absent
    pub fn numbering(&self) -> Result<Numbering> {
        match self.package.part(&well_known::numbering()) {
            Some(part) => Numbering::from_bytes(part.data()),
            None => Ok(Numbering::default()),
        }
    }

    /// Parsed theme fonts, or empty when the theme part is absent
    pub fn theme_fonts(&self) -> Result<ThemeFonts> {
        match self.package.part(&well_known::theme()) {
            Some(part) => ThemeFonts::from_bytes(part.data()),
            None => Ok(ThemeFonts::default()),
        }
    }

    /// URIs of all header parts in the package
    pub fn header_uris(&self) -> Vec<PartUri> {
        let mut uris: Vec<PartUri> = self
            .package
            .part_uris()
            .filter(|u| {
                u.as_str().starts_with("/word/header") && u.extension() == Some("xml")
            })
            .cloned()
            .collect();
        uris.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        uris
    }

    /// Replace text in every header part. Returns the number of paragraphs
    /// changed across all headers.
    pub fn replace_header_text(&mut self, from: &str, to: &str) -> Result<usize> {
        let mut changed = 0;
        for uri in self.header_uris() {
            let part = self
                .package
                .part(&uri)
                .ok_or_else(|| Error::MissingPart(uri.to_string()))?;
            let mut header = HeaderPart::from_bytes(part.data())?;
            let n = header.replace_text(from, to);
            if n > 0 {
                let bytes = header.to_bytes()?;
                if let Some(part) = self.package.part_mut(&uri) {
                    part.set_data(bytes);
                }
                changed += n;
            }
        }
        Ok(changed)
    }

    /// Serialize the body back into the main document part
    pub fn flush_body(&mut self) -> Result<()> {
        let bytes = serialize_document_xml(&self.root_attrs, &self.body)?;
        let part = self
            .package
            .part_mut(&self.uri)
            .ok_or_else(|| Error::MissingPart(self.uri.to_string()))?;
        part.set_data(bytes);
        Ok(())
    }

    /// Write the whole package to a writer
    pub fn write_to<W: Write + Seek>(&mut self, writer: W) -> Result<()> {
        self.flush_body()?;
        self.package.write_to(writer)
    }

    /// Save to a file path
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        log::debug!("saving document to {}", path.as_ref().display());
        let file = std::fs::File::create(path)?;
        self.write_to(file)
    }

    /// Serialize the whole package to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buf = std::io::Cursor::new(Vec::new());
        self.write_to(&mut buf)?;
        Ok(buf.into_inner())
    }
}

/// Parse document.xml bytes into root attributes and body
fn parse_document_xml(bytes: &[u8]) -> Result<(Vec<(String, String)>, Body)> {
    let xml = std::str::from_utf8(bytes)?;
    // text is not trimmed: spaces inside w:t are content
    let mut reader = Reader::from_str(xml);

    let mut root_attrs = Vec::new();
    let mut body = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.name();
                match name.local_name().as_ref() {
                    b"document" => root_attrs = collect_attrs(&e),
                    b"body" => body = Some(Body::from_reader(&mut reader)?),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let body = body.ok_or_else(|| Error::InvalidDocument("document has no w:body".into()))?;
    Ok((root_attrs, body))
}

/// Serialize root attributes and body into document.xml bytes
fn serialize_document_xml(root_attrs: &[(String, String)], body: &Body) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut root = BytesStart::new("w:document");
    if root_attrs.is_empty() {
        for (prefix, uri) in namespace::document_namespaces() {
            root.push_attribute((prefix, uri));
        }
    } else {
        for (key, value) in root_attrs {
            root.push_attribute((key.as_str(), value.as_str()));
        }
    }
    writer.write_event(Event::Start(root))?;

    body.write_to(&mut writer)?;

    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" mc:Ignorable="w14">
<w:body><w:p><w:r><w:t>Hello</w:t></w:r></w:p></w:body>
</w:document>"#;

    #[test]
    fn test_parse_and_serialize_keeps_root_attrs() {
        let (attrs, body) = parse_document_xml(DOC.as_bytes()).unwrap();
        assert!(attrs.iter().any(|(k, _)| k == "mc:Ignorable"));
        assert_eq!(body.signature(), "p");

        let bytes = serialize_document_xml(&attrs, &body).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains(r#"mc:Ignorable="w14""#));
        assert!(xml.contains("Hello"));
    }

    #[test]
    fn test_interrun_spaces_survive_parse_and_serialize() {
        // Word splits runs mid-sentence (rsid churn); the space at a run
        // boundary is content, not formatting whitespace
        let doc = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body><w:p><w:r><w:t xml:space="preserve">Status: </w:t></w:r><w:r><w:t>Draft</w:t></w:r></w:p></w:body>
</w:document>"#;
        let (attrs, body) = parse_document_xml(doc.as_bytes()).unwrap();
        let text: String = body.paragraphs().map(|p| p.text()).collect();
        assert_eq!(text, "Status: Draft");

        let bytes = serialize_document_xml(&attrs, &body).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains(r#"<w:t xml:space="preserve">Status: </w:t>"#));
    }

    #[test]
    fn test_missing_body_is_fatal() {
        let result = parse_document_xml(b"<w:document></w:document>");
        assert!(matches!(result, Err(Error::InvalidDocument(_))));
    }
}
