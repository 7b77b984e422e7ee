//! Image metadata extraction.
//!
//! Two layers of metadata feed the file details page:
//!
//! - [`ImageSummary`] - decoded properties (dimensions, format, color mode,
//!   frame info) via the `image` crate
//! - [`ExifField`] - raw EXIF tag/value pairs parsed natively from the JPEG
//!   APP1 segment
//!
//! Both degrade gracefully: undecodable bytes or absent EXIF render as error
//! rows, never as request failures.

mod exif;
mod tags;

pub use exif::{parse_exif, ByteOrder, ExifField};
pub use tags::{tag_name, FieldType};

use image::GenericImageView;

use crate::error::MetaError;

/// Filename suffixes treated as JPEG images.
pub const JPEG_SUFFIXES: &[&str] = &[".jpg", ".jpeg"];

/// Check if a filename looks like a JPEG image.
pub fn is_jpeg_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    JPEG_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Decoded image properties for the details page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Container format name (e.g. "JPEG")
    pub format: String,

    /// Color mode (e.g. "RGB", "L")
    pub mode: String,

    /// Whether the image is animated (always false for JPEG)
    pub animated: bool,

    /// Number of frames (always 1 for JPEG)
    pub frames: u32,
}

impl ImageSummary {
    /// Decode image bytes and summarize their properties.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetaError> {
        let format = image::guess_format(bytes)
            .map_err(|e| MetaError::Undecodable(e.to_string()))?;
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| MetaError::Undecodable(e.to_string()))?;

        let (width, height) = img.dimensions();

        Ok(Self {
            width,
            height,
            format: format_name(format),
            mode: mode_name(img.color()),
            animated: false,
            frames: 1,
        })
    }
}

fn format_name(format: image::ImageFormat) -> String {
    match format {
        image::ImageFormat::Jpeg => "JPEG".to_string(),
        image::ImageFormat::Png => "PNG".to_string(),
        image::ImageFormat::Gif => "GIF".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

/// Map a decoded color type onto the conventional short mode names.
fn mode_name(color: image::ColorType) -> String {
    match color {
        image::ColorType::L8 => "L".to_string(),
        image::ColorType::La8 => "LA".to_string(),
        image::ColorType::Rgb8 => "RGB".to_string(),
        image::ColorType::Rgba8 => "RGBA".to_string(),
        image::ColorType::L16 => "L;16".to_string(),
        image::ColorType::La16 => "LA;16".to_string(),
        image::ColorType::Rgb16 => "RGB;16".to_string(),
        image::ColorType::Rgba16 => "RGBA;16".to_string(),
        other => format!("{:?}", other),
    }
}
