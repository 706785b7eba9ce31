use crate::serde;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
/// Possible `libingr` errors
pub enum Error {
    /// Error returned if a fixed-layout header block fails to parse
    #[error("parse error")]
    ParseError(#[from] serde::error::Error),
    /// Error returned on a failed seek/read/write while accessing file data
    #[error("i/o error")]
    Io(#[from] std::io::Error),
    /// Error returned when a single block read or write fails. The rest of
    /// the dataset stays usable
    #[error("i/o failed for block ({x}, {y})")]
    BlockIo {
        /// block column
        x: u32,
        /// block row
        y: u32,
        /// the underlying OS error
        #[source]
        source: std::io::Error,
    },
    /// Error returned if a caller-provided block buffer has the wrong size
    #[error("block buffer holds {actual} bytes, band blocks are {expected} bytes")]
    BlockBufferSize {
        /// required buffer size for this band
        expected: usize,
        /// provided buffer size
        actual: usize,
    },
    /// Error returned when a block belongs to a compression scheme this
    /// crate recognizes but does not decode
    #[error("{codec} decoding is not implemented")]
    UnimplementedCodec {
        /// display name of the requested codec
        codec: &'static str,
    },
    /// Error returned when a band's color table no longer fits the header
    /// region the file reserves before its pixel data
    #[error("color table needs {needed} bytes, the header region holds {available}")]
    ColorTableRegion {
        /// bytes the encoded table occupies
        needed: usize,
        /// bytes available between the header blocks and the pixel data
        available: usize,
    },
    /// Error returned if the tile directory signature fields do not match
    #[error("invalid tile directory: {reason}")]
    InvalidTileDirectory {
        /// which signature field was off
        reason: String,
    },
    /// Error returned for a band number outside the band list
    #[error("band {band} does not exist")]
    BandOutOfRange {
        /// the requested one-based band number
        band: usize,
    },
    /// Error returned when writing blocks to a tiled band
    #[error("writing tiled rasters is not supported")]
    TiledWriteUnsupported,
}
