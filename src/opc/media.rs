//! Media attachment: image parts, content types, and dimensioning
//!
//! Image bytes are registered under `/word/media/`, the content-types
//! manifest gains a Default mapping for the extension, and an image
//! relationship is added on the document part. All sizes are converted to
//! EMU, the package's native length unit.

use crate::error::Result;
use crate::opc::relationships::rel_types;
use crate::opc::{Package, Part, PartUri};

/// EMU per pixel at 96 DPI
pub const EMU_PER_PIXEL: u64 = 9525;

/// Default image width when the caller gives none
pub const DEFAULT_IMAGE_WIDTH_PX: u32 = 300;
/// Default image height when the caller gives none
pub const DEFAULT_IMAGE_HEIGHT_PX: u32 = 200;

/// Convert pixels to EMU
pub fn px_to_emu(px: u32) -> u64 {
    px as u64 * EMU_PER_PIXEL
}

/// Content type for an image extension; unknown extensions fall back to a
/// generic binary type
pub fn image_content_type(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// A registered image: the relationship id on the document part and the
/// relative target it points at (e.g. `media/image3.png`).
#[derive(Clone, Debug)]
pub struct EmbeddedImage {
    pub rel_id: String,
    pub target: String,
}

/// Register image bytes into the package's media store and relate them to
/// the document part. Media names are `imageN.<ext>` with N one past the
/// highest existing index.
pub fn embed_image(
    package: &mut Package,
    document_uri: &PartUri,
    bytes: Vec<u8>,
    extension: &str,
) -> Result<EmbeddedImage> {
    let ext = extension.to_lowercase();
    let index = next_media_index(package);
    let media_uri = PartUri::new(&format!("/word/media/image{}.{}", index, ext))?;
    let target = format!("media/image{}.{}", index, ext);

    let content_type = image_content_type(&ext);
    package.content_types_mut().ensure_default(&ext, content_type);
    package.add_part(Part::new(media_uri, content_type, bytes));

    let doc_part = package
        .part_mut(document_uri)
        .ok_or_else(|| crate::error::Error::MissingPart(document_uri.to_string()))?;
    let rel_id = doc_part.relationships_mut().add(rel_types::IMAGE, &target);

    log::debug!("embedded image as {} ({})", target, rel_id);
    Ok(EmbeddedImage { rel_id, target })
}

fn next_media_index(package: &Package) -> u32 {
    package
        .part_uris()
        .filter_map(|uri| {
            let name = uri.file_name()?;
            if !uri.as_str().starts_with("/word/media/") {
                return None;
            }
            let stem = name.split('.').next()?;
            stem.strip_prefix("image")?.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0)
        + 1
}
