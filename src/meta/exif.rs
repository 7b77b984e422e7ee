//! EXIF extraction from JPEG bytes.
//!
//! EXIF metadata lives in a JPEG APP1 segment whose payload is a TIFF
//! structure: a byte-order mark, a magic number, and a chain of IFDs holding
//! tagged values. This parser walks IFD0 and the Exif sub-IFD and renders
//! every value as a display string.
//!
//! The parser is lenient at the entry level: an entry with an unknown field
//! type or an out-of-bounds value is skipped, not fatal. Structural problems
//! (truncated header, bad magic) fail the whole parse.

use crate::error::MetaError;

use super::tags::{tag_name, FieldType, TAG_EXIF_IFD_POINTER};

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
const SOI: [u8; 2] = [0xFF, 0xD8];

/// APP1 marker (EXIF container)
const APP1: u8 = 0xE1;

/// Start Of Scan marker (entropy-coded data follows; no EXIF past this)
const SOS: u8 = 0xDA;

/// End Of Image marker
const EOI: u8 = 0xD9;

/// Identifier prefix of an EXIF APP1 payload.
const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// TIFF magic number.
const TIFF_MAGIC: u16 = 42;

/// Values longer than this render as a count instead of a full list.
const MAX_RENDERED_VALUES: u32 = 24;

// =============================================================================
// Byte Order
// =============================================================================

/// TIFF byte order, from the "II"/"MM" mark at the start of the EXIF body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes([bytes[0], bytes[1]]),
            ByteOrder::BigEndian => u16::from_be_bytes([bytes[0], bytes[1]]),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            }
            ByteOrder::BigEndian => u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }

    /// Read an i32 from a byte slice using this byte order.
    #[inline]
    fn read_i32(self, bytes: &[u8]) -> i32 {
        self.read_u32(bytes) as i32
    }
}

// =============================================================================
// Fields
// =============================================================================

/// A single parsed EXIF tag/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifField {
    /// Raw tag id
    pub tag: u16,

    /// Rendered value
    pub value: String,
}

impl ExifField {
    /// Display label: the standard tag name, or the raw numeric id when the
    /// tag is not in the table.
    pub fn label(&self) -> String {
        match tag_name(self.tag) {
            Some(name) => name.to_string(),
            None => self.tag.to_string(),
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Extract all EXIF tag/value pairs from JPEG bytes.
///
/// Returns [`MetaError::NoExif`] when the image carries no EXIF APP1
/// segment, and [`MetaError::MalformedExif`] when the segment exists but its
/// TIFF structure cannot be walked.
pub fn parse_exif(jpeg: &[u8]) -> Result<Vec<ExifField>, MetaError> {
    let tiff = find_tiff_payload(jpeg)?;
    parse_tiff(tiff)
}

/// Scan JPEG segments for the EXIF APP1 payload and return its TIFF body.
fn find_tiff_payload(jpeg: &[u8]) -> Result<&[u8], MetaError> {
    if jpeg.len() < 4 || jpeg[0..2] != SOI {
        return Err(MetaError::NoExif);
    }

    let mut pos = 2;
    while pos + 2 <= jpeg.len() {
        if jpeg[pos] != 0xFF {
            return Err(MetaError::MalformedExif("expected segment marker"));
        }

        let marker = jpeg[pos + 1];
        match marker {
            // Fill byte before a marker
            0xFF => pos += 1,

            // Standalone markers carry no length field
            0x01 | 0xD0..=0xD8 => pos += 2,

            // Entropy-coded data or end of image: no EXIF past this point
            SOS | EOI => break,

            _ => {
                if pos + 4 > jpeg.len() {
                    return Err(MetaError::MalformedExif("truncated segment header"));
                }
                let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
                if len < 2 || pos + 2 + len > jpeg.len() {
                    return Err(MetaError::MalformedExif("segment length out of bounds"));
                }

                let payload = &jpeg[pos + 4..pos + 2 + len];
                if marker == APP1 && payload.len() >= EXIF_HEADER.len() {
                    if &payload[..EXIF_HEADER.len()] == EXIF_HEADER {
                        return Ok(&payload[EXIF_HEADER.len()..]);
                    }
                }

                pos += 2 + len;
            }
        }
    }

    Err(MetaError::NoExif)
}

/// Parse the TIFF structure of an EXIF body: IFD0 plus the Exif sub-IFD.
fn parse_tiff(tiff: &[u8]) -> Result<Vec<ExifField>, MetaError> {
    if tiff.len() < 8 {
        return Err(MetaError::MalformedExif("EXIF body too small"));
    }

    let byte_order = match &tiff[0..2] {
        b"II" => ByteOrder::LittleEndian,
        b"MM" => ByteOrder::BigEndian,
        _ => return Err(MetaError::MalformedExif("invalid byte order mark")),
    };

    if byte_order.read_u16(&tiff[2..4]) != TIFF_MAGIC {
        return Err(MetaError::MalformedExif("invalid TIFF magic"));
    }

    let ifd0_offset = byte_order.read_u32(&tiff[4..8]) as usize;

    let mut fields = Vec::new();
    let exif_ifd_offset = parse_ifd(tiff, byte_order, ifd0_offset, &mut fields, true)?;

    // The Exif sub-IFD holds the bulk of camera metadata. A malformed
    // sub-IFD keeps whatever IFD0 yielded rather than failing everything.
    if let Some(offset) = exif_ifd_offset {
        if offset != ifd0_offset {
            let _ = parse_ifd(tiff, byte_order, offset, &mut fields, false);
        }
    }

    Ok(fields)
}

/// Walk one IFD, appending rendered fields.
///
/// When `follow_exif_pointer` is set, an ExifOffset entry is captured and
/// returned instead of being rendered as a field.
fn parse_ifd(
    tiff: &[u8],
    byte_order: ByteOrder,
    offset: usize,
    fields: &mut Vec<ExifField>,
    follow_exif_pointer: bool,
) -> Result<Option<usize>, MetaError> {
    if offset + 2 > tiff.len() {
        return Err(MetaError::MalformedExif("IFD offset out of bounds"));
    }

    let count = byte_order.read_u16(&tiff[offset..offset + 2]) as usize;
    let entries_start = offset + 2;
    let entries_end = entries_start + count * 12;
    if entries_end > tiff.len() {
        return Err(MetaError::MalformedExif("IFD entry table truncated"));
    }

    let mut exif_pointer = None;
    for i in 0..count {
        let entry = &tiff[entries_start + i * 12..entries_start + (i + 1) * 12];
        let tag = byte_order.read_u16(&entry[0..2]);
        let field_type_raw = byte_order.read_u16(&entry[2..4]);
        let value_count = byte_order.read_u32(&entry[4..8]);

        let Some(field_type) = FieldType::from_u16(field_type_raw) else {
            // Unknown type code: the value cannot be sized, skip the entry
            continue;
        };

        let value_size = field_type.size_in_bytes() as u64 * value_count as u64;
        let value_bytes = if field_type.fits_inline(value_count) {
            &entry[8..8 + value_size as usize]
        } else {
            let value_offset = byte_order.read_u32(&entry[8..12]) as usize;
            let Some(end) = value_offset.checked_add(value_size as usize) else {
                continue;
            };
            if end > tiff.len() {
                continue;
            }
            &tiff[value_offset..end]
        };

        // Capture the sub-IFD pointer instead of rendering it. A malformed
        // pointer, or one found while already inside the sub-IFD, renders as
        // a plain value.
        if tag == TAG_EXIF_IFD_POINTER
            && follow_exif_pointer
            && field_type == FieldType::Long
            && value_count == 1
        {
            exif_pointer = Some(byte_order.read_u32(value_bytes) as usize);
            continue;
        }

        fields.push(ExifField {
            tag,
            value: format_value(field_type, value_count, value_bytes, byte_order),
        });
    }

    Ok(exif_pointer)
}

/// Render a value as a display string.
fn format_value(
    field_type: FieldType,
    count: u32,
    bytes: &[u8],
    byte_order: ByteOrder,
) -> String {
    if count > MAX_RENDERED_VALUES && field_type != FieldType::Ascii {
        return format!("<{} values>", count);
    }

    match field_type {
        FieldType::Ascii => {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            String::from_utf8_lossy(&bytes[..end]).trim().to_string()
        }

        FieldType::Byte => join(bytes.iter().map(|b| b.to_string())),

        FieldType::Short => join(
            bytes
                .chunks_exact(2)
                .map(|c| byte_order.read_u16(c).to_string()),
        ),

        FieldType::Long => join(
            bytes
                .chunks_exact(4)
                .map(|c| byte_order.read_u32(c).to_string()),
        ),

        FieldType::SLong => join(
            bytes
                .chunks_exact(4)
                .map(|c| byte_order.read_i32(c).to_string()),
        ),

        FieldType::Rational => join(bytes.chunks_exact(8).map(|c| {
            let num = byte_order.read_u32(&c[0..4]);
            let den = byte_order.read_u32(&c[4..8]);
            format!("{}/{}", num, den)
        })),

        FieldType::SRational => join(bytes.chunks_exact(8).map(|c| {
            let num = byte_order.read_i32(&c[0..4]);
            let den = byte_order.read_i32(&c[4..8]);
            format!("{}/{}", num, den)
        })),

        FieldType::Undefined => {
            if !bytes.is_empty() && bytes.iter().all(|&b| (0x20..=0x7E).contains(&b)) {
                String::from_utf8_lossy(bytes).to_string()
            } else {
                format!("<{} bytes>", bytes.len())
            }
        }
    }
}

fn join(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(", ")
}

// =============================================================================
// Tests
// =============================================================================
