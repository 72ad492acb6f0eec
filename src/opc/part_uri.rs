//! Part URI handling for OPC packages

use crate::error::{Error, Result};
use std::fmt;

/// A URI to a part within an OPC package.
///
/// Part URIs are always absolute paths starting with '/', e.g.
/// `/word/document.xml`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartUri {
    path: String,
}

impl PartUri {
    /// Create a new PartUri, normalizing the leading '/'
    pub fn new(path: &str) -> Result<Self> {
        let path = path.trim();

        if path.is_empty() {
            return Err(Error::InvalidPartUri("empty path".into()));
        }

        let normalized = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let normalized = normalized.trim_end_matches('/').to_string();

        if normalized.contains("//") {
            return Err(Error::InvalidPartUri(format!(
                "invalid path '{}': contains double slashes",
                path
            )));
        }

        Ok(Self { path: normalized })
    }

    pub(crate) fn from_string_unchecked(path: String) -> Self {
        Self { path }
    }

    /// Path as a string slice
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Path as a ZIP entry name (no leading '/')
    pub fn zip_name(&self) -> &str {
        &self.path[1..]
    }

    /// File name portion
    pub fn file_name(&self) -> Option<&str> {
        self.path.rsplit('/').next()
    }

    /// File extension
    pub fn extension(&self) -> Option<&str> {
        self.file_name()
            .and_then(|name| name.rsplit('.').next())
            .filter(|ext| !ext.is_empty() && !ext.contains('/'))
    }

    /// Parent directory URI
    pub fn parent(&self) -> Option<PartUri> {
        let pos = self.path.rfind('/')?;
        if pos == 0 {
            None
        } else {
            Some(PartUri {
                path: self.path[..pos].to_string(),
            })
        }
    }

    /// The relationships URI for this part.
    ///
    /// For `/word/document.xml`, returns `/word/_rels/document.xml.rels`.
    pub fn relationships_uri(&self) -> PartUri {
        let file_name = self.file_name().unwrap_or("");
        let parent = self.parent().map(|p| p.path).unwrap_or_default();
        PartUri {
            path: format!("{}/_rels/{}.rels", parent, file_name),
        }
    }

    /// The source part URI for a relationships part.
    ///
    /// For `/word/_rels/document.xml.rels`, returns `/word/document.xml`.
    pub fn rels_source_uri(&self) -> Option<PartUri> {
        if !self.is_relationships() {
            return None;
        }
        let file = self.file_name()?.strip_suffix(".rels")?;
        let rels_dir = self.parent()?;
        let base = rels_dir.parent().map(|p| p.path).unwrap_or_default();
        Some(PartUri {
            path: format!("{}/{}", base, file),
        })
    }

    /// Resolve a relative target against this part's directory.
    ///
    /// For `/word/document.xml` and `media/image1.png`, returns
    /// `/word/media/image1.png`.
    pub fn resolve(&self, relative: &str) -> Result<PartUri> {
        if relative.starts_with('/') {
            return PartUri::new(relative);
        }

        let base_dir = self.parent().map(|p| p.path).unwrap_or_default();
        let mut parts: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();

        for segment in relative.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    parts.pop();
                }
                s => parts.push(s),
            }
        }

        PartUri::new(&format!("/{}", parts.join("/")))
    }

    /// Whether this URI points to a relationships file
    pub fn is_relationships(&self) -> bool {
        self.path.contains("/_rels/") && self.path.ends_with(".rels")
    }
}

impl fmt::Display for PartUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Well-known part URIs
pub mod well_known {
    use super::PartUri;

    pub fn document() -> PartUri {
        PartUri::from_string_unchecked("/word/document.xml".into())
    }

    pub fn styles() -> PartUri {
        PartUri::from_string_unchecked("/word/styles.xml".into())
    }

    pub fn numbering() -> PartUri {
        PartUri::from_string_unchecked("/word/numbering.xml".into())
    }

    pub fn theme() -> PartUri {
        PartUri::from_string_unchecked("/word/theme/theme1.xml".into())
    }
}
