//! EXIF tag and field type definitions.
//!
//! This module defines the vocabulary for EXIF parsing:
//! - Field types that determine how values are encoded
//! - The standard tag-id → name table used to label metadata rows
//!
//! EXIF embeds a TIFF structure inside a JPEG APP1 segment, so the field
//! types follow the TIFF type codes.

// =============================================================================
// EXIF Field Types
// =============================================================================

/// EXIF (TIFF) field types that determine how values are encoded.
///
/// Each field type has a fixed per-element size, which decides whether a
/// value is stored inline in the 4-byte IFD entry slot or at an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character, NUL-terminated strings (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Two unsigned 32-bit integers, numerator/denominator (8 bytes)
    Rational = 5,

    /// Undefined byte data (1 byte per element)
    Undefined = 7,

    /// Signed 32-bit integer (4 bytes)
    SLong = 9,

    /// Two signed 32-bit integers, numerator/denominator (8 bytes)
    SRational = 10,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte => 1,
            FieldType::Ascii => 1,
            FieldType::Short => 2,
            FieldType::Long => 4,
            FieldType::Rational => 8,
            FieldType::Undefined => 1,
            FieldType::SLong => 4,
            FieldType::SRational => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unknown type codes; entries with unknown types are
    /// skipped rather than failing the whole parse.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            7 => Some(FieldType::Undefined),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            _ => None,
        }
    }

    /// Maximum bytes that fit inline in an IFD entry's value slot.
    pub const INLINE_THRESHOLD: usize = 4;

    /// Check if a value with this type and count fits inline.
    #[inline]
    pub fn fits_inline(self, count: u32) -> bool {
        self.size_in_bytes() as u64 * count as u64 <= Self::INLINE_THRESHOLD as u64
    }
}

// =============================================================================
// Pointer Tags
// =============================================================================

/// Tag pointing at the Exif sub-IFD; followed during parsing, not rendered.
/// Other pointer tags (GPSInfo, interoperability) render as their raw
/// offset values via the name table.
pub const TAG_EXIF_IFD_POINTER: u16 = 0x8769;

// =============================================================================
// Tag Names
// =============================================================================

/// Resolve a tag id to its standard EXIF name.
///
/// Covers the TIFF baseline tags and the EXIF private IFD tags. Unresolved
/// ids render as their raw numeric id at the call site.
pub fn tag_name(tag: u16) -> Option<&'static str> {
    let name = match tag {
        // TIFF baseline (IFD0)
        0x0100 => "ImageWidth",
        0x0101 => "ImageLength",
        0x0102 => "BitsPerSample",
        0x0103 => "Compression",
        0x0106 => "PhotometricInterpretation",
        0x010E => "ImageDescription",
        0x010F => "Make",
        0x0110 => "Model",
        0x0111 => "StripOffsets",
        0x0112 => "Orientation",
        0x0115 => "SamplesPerPixel",
        0x0116 => "RowsPerStrip",
        0x0117 => "StripByteCounts",
        0x011A => "XResolution",
        0x011B => "YResolution",
        0x011C => "PlanarConfiguration",
        0x0128 => "ResolutionUnit",
        0x012D => "TransferFunction",
        0x0131 => "Software",
        0x0132 => "DateTime",
        0x013B => "Artist",
        0x013E => "WhitePoint",
        0x013F => "PrimaryChromaticities",
        0x0201 => "JpegIFOffset",
        0x0202 => "JpegIFByteCount",
        0x0211 => "YCbCrCoefficients",
        0x0212 => "YCbCrSubSampling",
        0x0213 => "YCbCrPositioning",
        0x0214 => "ReferenceBlackWhite",
        0x8298 => "Copyright",
        0x8769 => "ExifOffset",
        0x8825 => "GPSInfo",

        // EXIF private IFD
        0x829A => "ExposureTime",
        0x829D => "FNumber",
        0x8822 => "ExposureProgram",
        0x8824 => "SpectralSensitivity",
        0x8827 => "ISOSpeedRatings",
        0x8828 => "OECF",
        0x8830 => "SensitivityType",
        0x8832 => "RecommendedExposureIndex",
        0x9000 => "ExifVersion",
        0x9003 => "DateTimeOriginal",
        0x9004 => "DateTimeDigitized",
        0x9010 => "OffsetTime",
        0x9011 => "OffsetTimeOriginal",
        0x9012 => "OffsetTimeDigitized",
        0x9101 => "ComponentsConfiguration",
        0x9102 => "CompressedBitsPerPixel",
        0x9201 => "ShutterSpeedValue",
        0x9202 => "ApertureValue",
        0x9203 => "BrightnessValue",
        0x9204 => "ExposureBiasValue",
        0x9205 => "MaxApertureValue",
        0x9206 => "SubjectDistance",
        0x9207 => "MeteringMode",
        0x9208 => "LightSource",
        0x9209 => "Flash",
        0x920A => "FocalLength",
        0x9214 => "SubjectArea",
        0x927C => "MakerNote",
        0x9286 => "UserComment",
        0x9290 => "SubsecTime",
        0x9291 => "SubsecTimeOriginal",
        0x9292 => "SubsecTimeDigitized",
        0xA000 => "FlashPixVersion",
        0xA001 => "ColorSpace",
        0xA002 => "ExifImageWidth",
        0xA003 => "ExifImageHeight",
        0xA004 => "RelatedSoundFile",
        0xA005 => "ExifInteroperabilityOffset",
        0xA20B => "FlashEnergy",
        0xA20C => "SpatialFrequencyResponse",
        0xA20E => "FocalPlaneXResolution",
        0xA20F => "FocalPlaneYResolution",
        0xA210 => "FocalPlaneResolutionUnit",
        0xA214 => "SubjectLocation",
        0xA215 => "ExposureIndex",
        0xA217 => "SensingMethod",
        0xA300 => "FileSource",
        0xA301 => "SceneType",
        0xA302 => "CFAPattern",
        0xA401 => "CustomRendered",
        0xA402 => "ExposureMode",
        0xA403 => "WhiteBalance",
        0xA404 => "DigitalZoomRatio",
        0xA405 => "FocalLengthIn35mmFilm",
        0xA406 => "SceneCaptureType",
        0xA407 => "GainControl",
        0xA408 => "Contrast",
        0xA409 => "Saturation",
        0xA40A => "Sharpness",
        0xA40B => "DeviceSettingDescription",
        0xA40C => "SubjectDistanceRange",
        0xA420 => "ImageUniqueID",
        0xA430 => "CameraOwnerName",
        0xA431 => "BodySerialNumber",
        0xA432 => "LensSpecification",
        0xA433 => "LensMake",
        0xA434 => "LensModel",
        0xA435 => "LensSerialNumber",
        _ => return None,
    };
    Some(name)
}
