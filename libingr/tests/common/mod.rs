#![allow(dead_code)]

use libingr::{HeaderOne, HeaderTwo};

/// Format code for plain 8-bit pixels
pub const BYTE_INTEGER: u16 = 2;
/// Format code for tiled storage
pub const TILED_RASTER_DATA: u16 = 65;

/// Byte offset of the pixel data relative to the band start, for headers
/// built by [`band_header_bytes`]
pub const DATA_OFFSET: usize = 1536;

/// Builds the three on-disk header blocks of a minimal single-band file;
/// pixel data (or a tile directory) goes right after the returned bytes
pub fn band_header_bytes(data_type_code: u16, width: u32, height: u32) -> Vec<u8> {
    let mut header_one = HeaderOne::default();
    header_one.data_type_code = data_type_code;
    header_one.pixels_per_line = width;
    header_one.number_of_lines = height;
    let mut bytes = header_one.encode();
    bytes.extend_from_slice(&HeaderTwo::default().encode());
    bytes.extend_from_slice(&[0u8; 768]);
    assert_eq!(bytes.len(), DATA_OFFSET);
    bytes
}
