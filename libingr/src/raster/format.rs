use std::fmt::Display;
use std::str::FromStr;
use strum::{EnumString, FromRepr, IntoStaticStr};
use tracing::warn;

/// The data format codes an Intergraph raster band can carry
///
/// The discriminants are the on-disk format codes. Display names follow the
/// wording used by the format documentation; they are also accepted
/// (case-insensitively) as compression names on the write path.
#[derive(FromRepr, IntoStaticStr, EnumString, Debug, Eq, PartialEq, Copy, Clone)]
#[strum(ascii_case_insensitive)]
#[repr(u16)]
#[non_exhaustive]
pub enum Format {
    /// Bitonal data packed eight pixels per byte
    #[strum(serialize = "Packed Binary")]
    PackedBinary = 1,
    /// Plain 8-bit pixels
    #[strum(serialize = "Byte Integer")]
    ByteInteger = 2,
    /// Plain 16-bit pixels
    #[strum(serialize = "Word Integers")]
    WordIntegers = 3,
    /// Plain 32-bit pixels
    #[strum(serialize = "Integers 32Bit")]
    Integers32Bit = 4,
    /// Plain 32-bit floating point pixels
    #[strum(serialize = "Floating Point 32Bit")]
    FloatingPoint32Bit = 5,
    /// Plain 64-bit floating point pixels
    #[strum(serialize = "Floating Point 64Bit")]
    FloatingPoint64Bit = 6,
    /// Complex pixels, 32-bit floating point components
    #[strum(serialize = "Complex")]
    Complex = 7,
    /// Complex pixels, 64-bit floating point components
    #[strum(serialize = "Double Precision Complex")]
    DoublePrecisionComplex = 8,
    /// Run-length encoded bitonal data
    #[strum(serialize = "Run Length Encoded Bitonal")]
    RunLengthEncoded = 9,
    /// Run-length encoded color data
    #[strum(serialize = "Run Length Encoded Color")]
    RunLengthEncodedC = 10,
    #[strum(serialize = "Figure of Merit")]
    /// Figure of merit data
    FigureOfMerit = 11,
    /// DTM flag data
    #[strum(serialize = "DTM Flags")]
    DtmFlags = 12,
    /// RLE, variable values with ZS
    #[strum(serialize = "RLE Variable Values With ZS")]
    RleVariableValuesWithZs = 13,
    /// RLE, binary values
    #[strum(serialize = "RLE Binary Values")]
    RleBinaryValues = 14,
    /// RLE, variable values
    #[strum(serialize = "RLE Variable Values")]
    RleVariableValues = 15,
    /// RLE, variable values with Z
    #[strum(serialize = "RLE Variable Values With Z")]
    RleVariableValuesWithZ = 16,
    /// RLE, variable values C
    #[strum(serialize = "RLE Variable Values C")]
    RleVariableValuesC = 17,
    /// RLE, variable values N
    #[strum(serialize = "RLE Variable Values N")]
    RleVariableValuesN = 18,
    /// Quad-tree encoded data
    #[strum(serialize = "Quad Tree Encoded")]
    QuadTreeEncoded = 19,
    /// CCITT group 4 encoded bitonal data
    #[strum(serialize = "CCITT Group 4")]
    CcittGroup4 = 24,
    /// Run-length encoded RGB triplets
    #[strum(serialize = "Run Length Encoded RGB")]
    RunLengthEncodedRgb = 25,
    /// Variable run length encoded data
    #[strum(serialize = "Variable Run Length")]
    VariableRunLength = 26,
    /// Adaptively compressed RGB triplets
    #[strum(serialize = "Adaptive RGB")]
    AdaptiveRgb = 27,
    /// Uncompressed band-interleaved RGB triplets
    #[strum(serialize = "Uncompressed 24bit")]
    Uncompressed24bit = 28,
    /// Adaptively compressed grayscale data
    #[strum(serialize = "Adaptive Gray Scale")]
    AdaptiveGrayScale = 29,
    /// JPEG compressed grayscale data
    #[strum(serialize = "JPEG GRAY")]
    JpegGray = 30,
    /// JPEG compressed RGB data
    #[strum(serialize = "JPEG RGB")]
    JpegRgb = 31,
    /// JPEG compressed CMYK data
    #[strum(serialize = "JPEG CMYK")]
    JpegCmyk = 32,
    /// Tiled storage; the tile directory carries the actual format
    #[strum(serialize = "Tiled Raster Data")]
    TiledRasterData = 65,
    /// Reserved code
    #[strum(serialize = "Not Used (Reserved)")]
    NotUsedReserved = 66,
    /// Continuous tone data
    #[strum(serialize = "Continuous Tone")]
    ContinuousTone = 67,
    /// Line art data
    #[strum(serialize = "LineArt")]
    LineArt = 68,
}

/// The in-memory pixel data types a band can resolve to
#[derive(Default, Debug, Eq, PartialEq, Copy, Clone)]
pub enum PixelType {
    /// Unsigned 8-bit pixels
    #[default]
    Byte,
    /// 16-bit integer pixels
    Int16,
    /// 32-bit integer pixels
    Int32,
    /// 32-bit floating point pixels
    Float32,
    /// 64-bit floating point pixels
    Float64,
    /// Complex pixels with 32-bit floating point components
    Complex32,
    /// Complex pixels with 64-bit floating point components
    Complex64,
}

impl PixelType {
    /// Returns the storage size of one pixel
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Int16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Float64 | Self::Complex32 => 8,
            Self::Complex64 => 16,
        }
    }
}

impl Format {
    /// Looks up a format by its on-disk code
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::from_repr(code)
    }

    /// Returns the on-disk code of this format
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Returns the format's display name
    #[must_use]
    pub fn display_name(self) -> &'static str {
        Into::<&'static str>::into(self)
    }

    /// Returns the natural pixel data type blocks of this format decode to
    #[must_use]
    pub const fn pixel_type(self) -> PixelType {
        match self {
            Self::WordIntegers => PixelType::Int16,
            Self::Integers32Bit => PixelType::Int32,
            Self::FloatingPoint32Bit => PixelType::Float32,
            Self::FloatingPoint64Bit => PixelType::Float64,
            Self::Complex => PixelType::Complex32,
            Self::DoublePrecisionComplex => PixelType::Complex64,
            _ => PixelType::Byte,
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Returns the pixel type for an on-disk format code, falling back to
/// [`PixelType::Byte`] for unknown codes. Never fails; this is used in
/// metadata contexts where a hard error would be disproportionate.
#[must_use]
pub fn lookup_data_type(code: u16) -> PixelType {
    Format::from_code(code).map_or(PixelType::Byte, Format::pixel_type)
}

/// Returns the display name for an on-disk format code, or the literal
/// `"Not Identified"` for unknown codes
#[must_use]
pub fn lookup_display_name(code: u16) -> &'static str {
    Format::from_code(code).map_or("Not Identified", Format::display_name)
}

/// Chooses the on-disk format for a band about to be written
///
/// An empty compression name (or the literal `"None"`) selects the
/// uncompressed format matching the pixel type. Any other name is looked up
/// case-insensitively among the format display names. Unsupported requests
/// degrade to [`Format::ByteInteger`] instead of failing; callers that care
/// must validate the result separately.
#[must_use]
pub fn resolve_format_for_write(pixel_type: PixelType, compression_name: &str) -> Format {
    if compression_name.is_empty() || compression_name.eq_ignore_ascii_case("none") {
        return match pixel_type {
            PixelType::Int16 => Format::WordIntegers,
            PixelType::Int32 => Format::Integers32Bit,
            PixelType::Float32 => Format::FloatingPoint32Bit,
            PixelType::Float64 => Format::FloatingPoint64Bit,
            _ => Format::ByteInteger,
        };
    }
    Format::from_str(compression_name).unwrap_or_else(|_| {
        warn!("unknown compression name {compression_name:?}, falling back to byte integer");
        Format::ByteInteger
    })
}
