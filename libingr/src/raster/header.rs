use strum::FromRepr;
use tracing::warn;

use crate::raster::format::PixelType;
use crate::serde::{
    encode_header_one, encode_header_two, finish, parse_header_one, parse_header_two, SIZEOF_CTAB,
    SIZEOF_HDR1, SIZEOF_HDR2,
};
use crate::{Error, HEADER_2D, HEADER_KIND, HEADER_VERSION};

/// Words-to-follow value for the conventional three-block (1536 byte)
/// header region written by the create path
pub(crate) const WORDS_TO_FOLLOW: u16 =
    ((SIZEOF_HDR1 + SIZEOF_HDR2 + SIZEOF_CTAB) / 2 - 2) as u16;

/// The bit-packed header type word at the very start of every band header
///
/// On disk this is a 16-bit word holding a 6-bit version, a 2-bit
/// dimensionality flag and an 8-bit type tag. The type tag must match the
/// raster magic for the file to be recognized.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct HeaderTypeWord {
    /// Format version, 6 bits
    pub version: u8,
    /// Dimensionality flag, 2 bits; 0 for 2D and 3 for 3D data
    pub dimension: u8,
    /// Header kind tag, 8 bits; raster data headers carry 9
    pub kind: u8,
}

impl HeaderTypeWord {
    pub(crate) const fn from_word(word: u16) -> Self {
        Self {
            version: (word & 0x3F) as u8,
            dimension: ((word >> 6) & 0x3) as u8,
            kind: (word >> 8) as u8,
        }
    }

    pub(crate) const fn to_word(self) -> u16 {
        (self.version as u16 & 0x3F)
            | ((self.dimension as u16 & 0x3) << 6)
            | ((self.kind as u16) << 8)
    }
}

impl Default for HeaderTypeWord {
    fn default() -> Self {
        Self {
            version: HEADER_VERSION,
            dimension: HEADER_2D,
            kind: HEADER_KIND,
        }
    }
}

/// The eight ways a scanline can be laid out: four starting corners, two
/// axis orders
#[derive(FromRepr, Default, Debug, Eq, PartialEq, Copy, Clone)]
#[repr(u8)]
pub enum ScanlineOrientation {
    /// Columns first, starting upper left
    UpperLeftVertical = 0,
    /// Columns first, starting upper right
    UpperRightVertical = 1,
    /// Columns first, starting lower left
    LowerLeftVertical = 2,
    /// Columns first, starting lower right
    LowerRightVertical = 3,
    /// Rows first, starting upper left
    #[default]
    UpperLeftHorizontal = 4,
    /// Rows first, starting upper right
    UpperRightHorizontal = 5,
    /// Rows first, starting lower left
    LowerLeftHorizontal = 6,
    /// Rows first, starting lower right
    LowerRightHorizontal = 7,
}

/// The color table encodings a band header can announce
#[derive(Default, Debug, Eq, PartialEq, Copy, Clone)]
pub enum ColorTableKind {
    /// No color table stored
    #[default]
    None,
    /// Fixed 256-entry table, 3 bytes per entry
    Igds,
    /// Variable-length table of 8-byte slot records
    EnvironV,
}

impl ColorTableKind {
    pub(crate) const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Igds),
            2 => Some(Self::EnvironV),
            _ => None,
        }
    }

    pub(crate) const fn code(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Igds => 1,
            Self::EnvironV => 2,
        }
    }
}

/// A min/max pixel value, stored on disk in an 8-byte field whose
/// interpretation depends on the band's pixel type
#[derive(Default, Debug, Eq, PartialEq, Copy, Clone)]
pub struct BandValue([u8; 8]);

impl BandValue {
    pub(crate) const fn from_raw(raw: [u8; 8]) -> Self {
        Self(raw)
    }

    /// Returns the stored bytes
    #[must_use]
    pub const fn raw(&self) -> [u8; 8] {
        self.0
    }

    /// Interprets the stored bytes for the given pixel type. Complex types
    /// yield the real component.
    #[must_use]
    pub fn as_f64(&self, pixel_type: PixelType) -> f64 {
        match pixel_type {
            PixelType::Byte => f64::from(self.0[0]),
            PixelType::Int16 => f64::from(i16::from_le_bytes([self.0[0], self.0[1]])),
            PixelType::Int32 => f64::from(i32::from_le_bytes([
                self.0[0], self.0[1], self.0[2], self.0[3],
            ])),
            PixelType::Float32 | PixelType::Complex32 => f64::from(f32::from_le_bytes([
                self.0[0], self.0[1], self.0[2], self.0[3],
            ])),
            PixelType::Float64 | PixelType::Complex64 => f64::from_le_bytes(self.0),
        }
    }

    /// Stores a value using the representation of the given pixel type
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_f64(pixel_type: PixelType, value: f64) -> Self {
        let mut raw = [0u8; 8];
        match pixel_type {
            PixelType::Byte => raw[0] = value as u8,
            PixelType::Int16 => raw[..2].copy_from_slice(&(value as i16).to_le_bytes()),
            PixelType::Int32 => raw[..4].copy_from_slice(&(value as i32).to_le_bytes()),
            PixelType::Float32 | PixelType::Complex32 => {
                raw[..4].copy_from_slice(&(value as f32).to_le_bytes());
            }
            PixelType::Float64 | PixelType::Complex64 => raw.copy_from_slice(&value.to_le_bytes()),
        }
        Self(raw)
    }
}

/// Primary per-band header, the first 512 bytes of every band
///
/// Exactly one of these precedes each band's pixel data. The on-disk layout
/// is packed little-endian with no padding; [`HeaderOne::decode`] and
/// [`HeaderOne::encode`] are byte-exact inverses.
#[derive(Debug, PartialEq, Clone)]
#[non_exhaustive]
pub struct HeaderOne {
    /// Bit-packed version/dimensionality/kind word
    pub header_type: HeaderTypeWord,
    /// Size of the header region in 16-bit words, minus the leading two
    /// words. `(words_to_follow + 2)` must be a multiple of 256
    pub words_to_follow: u16,
    /// On-disk format code of the band data (see [`crate::Format`])
    pub data_type_code: u16,
    /// Application type tag
    pub application_type: u16,
    /// View origin, X
    pub x_view_origin: f64,
    /// View origin, Y
    pub y_view_origin: f64,
    /// View origin, Z
    pub z_view_origin: f64,
    /// View extent, X
    pub x_view_extent: f64,
    /// View extent, Y
    pub y_view_extent: f64,
    /// View extent, Z
    pub z_view_extent: f64,
    /// Row-major 4x4 homogeneous world transform
    pub transformation_matrix: [f64; 16],
    /// Raster width in pixels
    pub pixels_per_line: u32,
    /// Raster height in lines
    pub number_of_lines: u32,
    /// Scan device resolution
    pub device_resolution: i16,
    /// Scanline corner/axis layout
    pub scanline_orientation: ScanlineOrientation,
    /// Non-zero when each scanline carries its own line header
    pub scannable_flag: u8,
    /// Rotation angle of the raster
    pub rotation_angle: f64,
    /// Skew angle of the raster
    pub skew_angle: f64,
    /// Format-specific modifier bits
    pub data_type_modifier: u16,
    /// Originating design file, zero-padded
    pub design_file_name: [u8; 66],
    /// Originating database file, zero-padded
    pub data_base_file_name: [u8; 66],
    /// Parent grid file, zero-padded
    pub parent_grid_file_name: [u8; 66],
    /// Free-form description, zero-padded
    pub file_description: [u8; 80],
    /// Minimum pixel value, tagged by the band's pixel type
    pub minimum: BandValue,
    /// Maximum pixel value, tagged by the band's pixel type
    pub maximum: BandValue,
    /// Reserved bytes
    pub reserved: [u8; 3],
    /// Grid file version, must be 1, 2 or 3
    pub grid_file_version: u8,
}

impl Default for HeaderOne {
    fn default() -> Self {
        Self {
            header_type: HeaderTypeWord::default(),
            words_to_follow: WORDS_TO_FOLLOW,
            data_type_code: 0,
            application_type: 0,
            x_view_origin: 0.0,
            y_view_origin: 0.0,
            z_view_origin: 0.0,
            x_view_extent: 0.0,
            y_view_extent: 0.0,
            z_view_extent: 0.0,
            transformation_matrix: geotransform_to_transform(&[0.0, 1.0, 0.0, 0.0, 0.0, -1.0]),
            pixels_per_line: 0,
            number_of_lines: 0,
            device_resolution: 1,
            scanline_orientation: ScanlineOrientation::default(),
            scannable_flag: 0,
            rotation_angle: 0.0,
            skew_angle: 0.0,
            data_type_modifier: 0,
            design_file_name: [0; 66],
            data_base_file_name: [0; 66],
            parent_grid_file_name: [0; 66],
            file_description: [0; 80],
            minimum: BandValue::default(),
            maximum: BandValue::default(),
            reserved: [0; 3],
            grid_file_version: 2,
        }
    }
}

impl HeaderOne {
    /// Decodes a header from its 512-byte on-disk form
    ///
    /// # Errors
    ///
    /// Errors if `bytes` holds fewer than 512 bytes. Field validation is the
    /// caller's concern; this only performs layout decoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Ok(finish(parse_header_one(bytes))?)
    }

    /// Encodes the header into its 512-byte on-disk form
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_header_one(self)
    }

    /// Byte offset of the band's pixel data (or tile directory) relative to
    /// the band's start offset
    #[must_use]
    pub const fn data_offset(&self) -> u64 {
        2 + 2 * (self.words_to_follow as u64 + 1)
    }
}

/// Secondary per-band header, read immediately after [`HeaderOne`]
///
/// Only the 256-byte metadata half is modelled here; the following 768
/// bytes hold either application data or the fixed IGDS color table.
#[derive(Debug, PartialEq, Clone)]
#[non_exhaustive]
pub struct HeaderTwo {
    /// Display gain
    pub gain: u8,
    /// Display offset threshold
    pub offset_threshold: u8,
    /// View flag 1
    pub view1: u8,
    /// View flag 2
    pub view2: u8,
    /// View number
    pub view_number: u8,
    /// Reserved byte
    pub reserved2: u8,
    /// Reserved word
    pub reserved3: u16,
    /// Pixel aspect ratio
    pub aspect_ratio: f64,
    /// Absolute byte offset of the next band's [`HeaderOne`] in the same
    /// file, or 0 for the last band
    pub catenated_file_pointer: u32,
    /// Which color table encoding follows, if any
    pub color_table_type: ColorTableKind,
    /// Reserved word
    pub reserved8: u16,
    /// Entry count for the variable-length color table encoding
    pub number_of_ct_entries: u32,
    /// Offset of the application packet
    pub application_packet_pointer: u32,
    /// Length of the application packet
    pub application_packet_length: u32,
    /// Reserved tail, padding the block to 256 bytes
    pub reserved: [u8; 220],
}

impl Default for HeaderTwo {
    fn default() -> Self {
        Self {
            gain: 0,
            offset_threshold: 0,
            view1: 0,
            view2: 0,
            view_number: 0,
            reserved2: 0,
            reserved3: 0,
            aspect_ratio: 1.0,
            catenated_file_pointer: 0,
            color_table_type: ColorTableKind::None,
            reserved8: 0,
            number_of_ct_entries: 0,
            application_packet_pointer: 0,
            application_packet_length: 0,
            reserved: [0; 220],
        }
    }
}

impl HeaderTwo {
    /// Decodes a header from its 256-byte on-disk form
    ///
    /// # Errors
    ///
    /// Errors if `bytes` holds fewer than 256 bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Ok(finish(parse_header_two(bytes))?)
    }

    /// Encodes the header into its 256-byte on-disk form
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_header_two(self)
    }
}

/// Extracts the 2D affine geotransform from a 4x4 homogeneous transform
///
/// The stored origin uses a pixel-center convention; the returned transform
/// uses pixel corners, so the origin is shifted by half a pixel and the row
/// spacing negated to make north-up rasters read top-down. A transform with
/// a zero pixel size in either axis yields the unit north-up default.
#[must_use]
pub fn transform_to_geotransform(matrix: &[f64; 16]) -> [f64; 6] {
    if matrix[0] == 0.0 || matrix[5] == 0.0 {
        warn!("transformation matrix has zero pixel size, using unit geotransform");
        return [0.0, 1.0, 0.0, 0.0, 0.0, -1.0];
    }
    let mut gt = [
        matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5],
    ];
    gt[0] -= gt[1] / 2.0;
    gt[3] += gt[5] / 2.0;
    gt[5] = -gt[5];
    gt
}

/// Builds a 4x4 homogeneous transform from a 2D affine geotransform
///
/// Exact inverse of [`transform_to_geotransform`]: the half-pixel origin
/// shift is applied in reverse (using the negated row spacing) before
/// storing, so a round trip reproduces the input.
#[must_use]
pub fn geotransform_to_transform(gt: &[f64; 6]) -> [f64; 16] {
    let mut matrix = [0f64; 16];
    matrix[15] = 1.0;
    matrix[0] = gt[1];
    matrix[1] = gt[2];
    matrix[4] = gt[4];
    matrix[5] = -gt[5];
    matrix[3] = gt[0] + gt[1] / 2.0;
    matrix[7] = gt[3] + gt[5] / 2.0;
    matrix
}
