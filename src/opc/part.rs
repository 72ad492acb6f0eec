//! Part representation for OPC packages

use crate::opc::{PartUri, Relationships};

/// A part within an OPC package.
///
/// Parts keep the exact bytes read from the archive; a part that is never
/// replaced is written back unchanged.
#[derive(Clone, Debug)]
pub struct Part {
    /// Part URI
    uri: PartUri,
    /// Content type
    content_type: String,
    /// Part data
    data: Vec<u8>,
    /// Part relationships, if a `.rels` entry exists for it
    relationships: Option<Relationships>,
    /// Whether the data was replaced during this session
    modified: bool,
}

impl Part {
    /// Create a new part
    pub fn new(uri: PartUri, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            uri,
            content_type: content_type.into(),
            data,
            relationships: None,
            modified: false,
        }
    }

    /// Part URI
    pub fn uri(&self) -> &PartUri {
        &self.uri
    }

    /// Content type
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Raw data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Data as UTF-8
    pub fn data_as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.data)
    }

    /// Replace the data, marking the part modified
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.modified = true;
    }

    /// Relationships, if any
    pub fn relationships(&self) -> Option<&Relationships> {
        self.relationships.as_ref()
    }

    /// Set relationships (used at load time)
    pub fn set_relationships(&mut self, rels: Relationships) {
        self.relationships = Some(rels);
    }

    /// Relationships, created on first use
    pub fn relationships_mut(&mut self) -> &mut Relationships {
        self.relationships.get_or_insert_with(Relationships::new)
    }

    /// Whether the part data was replaced this session
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// The relationships URI for this part
    pub fn relationships_uri(&self) -> PartUri {
        self.uri.relationships_uri()
    }
}
