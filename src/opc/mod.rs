//! Open Packaging Convention (OPC) implementation
//!
//! The ZIP-based package format used by DOCX files, plus media attachment.

mod content_types;
pub mod media;
mod package;
mod part;
mod part_uri;
pub mod relationships;

pub use content_types::{ContentTypes, MAIN_DOCUMENT, RELATIONSHIPS, XML};
pub use media::{embed_image, px_to_emu, EmbeddedImage};
pub use package::Package;
pub use part::Part;
pub use part_uri::{well_known, PartUri};
pub use relationships::{rel_types, Relationship, Relationships, TargetMode};
