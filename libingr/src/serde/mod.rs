pub(crate) mod error;
mod header;
mod tile;
mod utils;

pub(crate) use header::{
    encode_header_one, encode_header_two, encode_vlt_entries, parse_header_one, parse_header_two,
    parse_vlt_entries,
};
pub(crate) use tile::{encode_tile_directory, parse_tile_header, parse_tile_items};
pub(crate) use utils::{byte_array, finish, put_f64, put_i16, put_u16, put_u32};

/// Size in bytes of the primary per-band header block
pub(crate) const SIZEOF_HDR1: usize = 512;
/// Size in bytes of the metadata half of the secondary header block
pub(crate) const SIZEOF_HDR2: usize = 256;
/// Size in bytes of the fixed IGDS color table block
pub(crate) const SIZEOF_CTAB: usize = 768;
/// Size in bytes of the tile directory header, first tile item included
pub(crate) const SIZEOF_TDIR: usize = 140;
/// Size in bytes of one tile directory item
pub(crate) const SIZEOF_TILE: usize = 12;
/// Size in bytes of one Environ-V color table record
pub(crate) const SIZEOF_VLT: usize = 8;
