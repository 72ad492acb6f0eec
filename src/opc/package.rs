//! OPC package implementation
//!
//! Reads and writes DOCX files as ZIP packages. The original archive entry
//! order is recorded on read and replayed on write, and entries whose
//! content never changed are emitted byte-for-byte.

use crate::error::{Error, Result};
use crate::opc::relationships::rel_types;
use crate::opc::{ContentTypes, Part, PartUri, Relationships};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";
const PACKAGE_RELS_ENTRY: &str = "_rels/.rels";

/// An OPC package (ZIP-based container for DOCX)
#[derive(Debug)]
pub struct Package {
    /// All parts, keyed by URI
    parts: HashMap<PartUri, Part>,
    /// Original archive entry names in order
    entry_order: Vec<String>,
    /// Package-level relationships (`/_rels/.rels`)
    relationships: Relationships,
    /// Content types manifest
    content_types: ContentTypes,
}

impl Package {
    /// Create a new empty package
    pub fn new() -> Self {
        Self {
            parts: HashMap::new(),
            entry_order: Vec::new(),
            relationships: Relationships::new(),
            content_types: ContentTypes::new(),
        }
    }

    /// Open a package from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Open a package from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Open a package from a reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            if name.ends_with('/') {
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push((name, data));
        }

        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Result<Self> {
        let mut package = Self {
            parts: HashMap::new(),
            entry_order: entries.iter().map(|(n, _)| n.clone()).collect(),
            relationships: Relationships::new(),
            content_types: ContentTypes::default(),
        };

        let mut content_types = None;
        let mut rels_entries: Vec<(String, Vec<u8>)> = Vec::new();
        let mut raw_parts: Vec<(PartUri, Vec<u8>)> = Vec::new();

        for (name, data) in entries {
            if name == CONTENT_TYPES_ENTRY {
                content_types = Some(ContentTypes::from_bytes(data)?);
            } else if name == PACKAGE_RELS_ENTRY {
                package.relationships = Relationships::from_bytes(data)?;
            } else if name.contains("_rels/") && name.ends_with(".rels") {
                rels_entries.push((name, data));
            } else {
                raw_parts.push((PartUri::new(&format!("/{}", name))?, data));
            }
        }

        package.content_types =
            content_types.ok_or_else(|| Error::MissingPart(CONTENT_TYPES_ENTRY.into()))?;

        for (uri, data) in raw_parts {
            let ct = package
                .content_types
                .get(&uri)
                .unwrap_or("application/octet-stream")
                .to_string();
            package.parts.insert(uri.clone(), Part::new(uri, ct, data));
        }

        // Attach part-level relationships to their source parts
        for (name, data) in rels_entries {
            let rels_uri = PartUri::new(&format!("/{}", name))?;
            let source = rels_uri.rels_source_uri();
            match source.and_then(|s| package.parts.get_mut(&s)) {
                Some(part) => part.set_relationships(Relationships::from_bytes(data)?),
                None => {
                    // Orphan rels entry: keep as a plain part so it round-trips
                    package
                        .parts
                        .insert(rels_uri.clone(), Part::new(rels_uri, String::new(), data));
                }
            }
        }

        Ok(package)
    }

    /// Save the package to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Save the package to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(Cursor::new(&mut buf))?;
        Ok(buf)
    }

    /// Write the package to a writer, replaying the original entry order
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut written: HashSet<String> = HashSet::new();

        for name in &self.entry_order {
            if let Some(bytes) = self.entry_bytes(name)? {
                zip.start_file(name.as_str(), options)?;
                zip.write_all(&bytes)?;
                written.insert(name.clone());
            }
        }

        // Entries that did not exist in the source archive
        if !written.contains(CONTENT_TYPES_ENTRY) {
            zip.start_file(CONTENT_TYPES_ENTRY, options)?;
            zip.write_all(&self.content_types.to_bytes()?)?;
        }
        if !written.contains(PACKAGE_RELS_ENTRY) && !self.relationships.is_empty() {
            zip.start_file(PACKAGE_RELS_ENTRY, options)?;
            zip.write_all(&self.relationships.to_bytes()?)?;
        }

        let mut new_uris: Vec<&PartUri> = self
            .parts
            .keys()
            .filter(|u| !written.contains(u.zip_name()))
            .collect();
        new_uris.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for uri in new_uris {
            let part = &self.parts[uri];
            zip.start_file(uri.zip_name(), options)?;
            zip.write_all(part.data())?;
            written.insert(uri.zip_name().to_string());
        }

        // Relationship entries created this session
        let mut part_uris: Vec<&PartUri> = self.parts.keys().collect();
        part_uris.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for uri in part_uris {
            let part = &self.parts[uri];
            if let Some(rels) = part.relationships() {
                let rels_name = uri.relationships_uri().zip_name().to_string();
                if !rels.is_empty() && !written.contains(&rels_name) {
                    zip.start_file(rels_name.as_str(), options)?;
                    zip.write_all(&rels.to_bytes()?)?;
                }
            }
        }

        zip.finish()?;
        Ok(())
    }

    /// Current bytes for an original archive entry name
    fn entry_bytes(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if name == CONTENT_TYPES_ENTRY {
            return Ok(Some(self.content_types.to_bytes()?));
        }
        if name == PACKAGE_RELS_ENTRY {
            return Ok(Some(self.relationships.to_bytes()?));
        }

        let uri = PartUri::new(&format!("/{}", name))?;
        if uri.is_relationships() {
            if let Some(source) = uri.rels_source_uri() {
                if let Some(rels) = self.parts.get(&source).and_then(|p| p.relationships()) {
                    return Ok(Some(rels.to_bytes()?));
                }
            }
        }
        Ok(self.parts.get(&uri).map(|p| p.data().to_vec()))
    }

    /// Get a part by URI
    pub fn part(&self, uri: &PartUri) -> Option<&Part> {
        self.parts.get(uri)
    }

    /// Get a mutable part by URI
    pub fn part_mut(&mut self, uri: &PartUri) -> Option<&mut Part> {
        self.parts.get_mut(uri)
    }

    /// Whether a part exists
    pub fn contains(&self, uri: &PartUri) -> bool {
        self.parts.contains_key(uri)
    }

    /// Add a part without touching the content-types manifest
    pub fn add_part(&mut self, part: Part) {
        self.parts.insert(part.uri().clone(), part);
    }

    /// Add a part and register an Override content type for it
    pub fn add_part_with_override(&mut self, part: Part) {
        let ct = part.content_type().to_string();
        self.content_types.set_override(part.uri(), &ct);
        self.add_part(part);
    }

    /// All part URIs
    pub fn part_uris(&self) -> impl Iterator<Item = &PartUri> {
        self.parts.keys()
    }

    /// Package-level relationships
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Mutable package-level relationships
    pub fn relationships_mut(&mut self) -> &mut Relationships {
        &mut self.relationships
    }

    /// Content types manifest
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Mutable content types manifest
    pub fn content_types_mut(&mut self) -> &mut ContentTypes {
        &mut self.content_types
    }

    /// URI of the main document part, via the officeDocument relationship
    pub fn main_document_uri(&self) -> Option<PartUri> {
        let rel = self.relationships.by_type(rel_types::OFFICE_DOCUMENT)?;
        PartUri::new(&rel.target).ok()
    }

    /// The main document part
    pub fn main_document_part(&self) -> Option<&Part> {
        self.parts.get(&self.main_document_uri()?)
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_package() -> Package {
        let mut pkg = Package::new();
        let doc_uri = PartUri::new("/word/document.xml").unwrap();
        let part = Part::new(
            doc_uri,
            crate::opc::MAIN_DOCUMENT,
            br#"<?xml version="1.0"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>hi</w:t></w:r></w:p></w:body></w:document>"#
                .to_vec(),
        );
        pkg.add_part_with_override(part);
        pkg.relationships_mut()
            .add(rel_types::OFFICE_DOCUMENT, "word/document.xml");
        pkg
    }

    #[test]
    fn test_roundtrip() {
        let pkg = sample_package();
        let bytes = pkg.to_bytes().unwrap();
        assert_eq!(&bytes[0..2], b"PK");

        let pkg2 = Package::from_bytes(&bytes).unwrap();
        assert!(pkg2.main_document_part().is_some());
        assert_eq!(
            pkg2.main_document_uri().unwrap().as_str(),
            "/word/document.xml"
        );
    }

    #[test]
    fn test_untouched_parts_preserved_bytewise() {
        let pkg = sample_package();
        let bytes = pkg.to_bytes().unwrap();

        let pkg2 = Package::from_bytes(&bytes).unwrap();
        let bytes2 = pkg2.to_bytes().unwrap();

        let a = Package::from_bytes(&bytes).unwrap();
        let b = Package::from_bytes(&bytes2).unwrap();
        let doc = PartUri::new("/word/document.xml").unwrap();
        assert_eq!(a.part(&doc).unwrap().data(), b.part(&doc).unwrap().data());
    }

    #[test]
    fn test_entry_order_is_replayed() {
        let pkg = sample_package();
        let bytes = pkg.to_bytes().unwrap();
        let pkg2 = Package::from_bytes(&bytes).unwrap();

        let names = |data: &[u8]| -> Vec<String> {
            let mut archive = ZipArchive::new(Cursor::new(data.to_vec())).unwrap();
            (0..archive.len())
                .map(|i| archive.by_index(i).unwrap().name().to_string())
                .collect()
        };
        assert_eq!(names(&bytes), names(&pkg2.to_bytes().unwrap()));
    }

    #[test]
    fn test_missing_content_types_is_fatal() {
        // A zip without [Content_Types].xml is not a valid package
        let mut buf = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<()> = FileOptions::default();
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(b"<w:document/>").unwrap();
            zip.finish().unwrap();
        }
        assert!(matches!(
            Package::from_bytes(&buf),
            Err(Error::MissingPart(_))
        ));
    }
}
