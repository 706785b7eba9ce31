use nom::{
    number::complete::{le_u16, le_u32},
    IResult,
};

use crate::raster::tile::TileDirectory;

use super::{byte_array, put_u16, put_u32, SIZEOF_TDIR, SIZEOF_TILE};

/// The tile directory header exactly as stored, first tile item included.
#[derive(Debug, Clone)]
pub(crate) struct RawTileHeader {
    pub(crate) application_type: u16,
    pub(crate) sub_type_code: u16,
    pub(crate) words_to_follow: u32,
    pub(crate) packet_version: u16,
    pub(crate) identifier: u16,
    pub(crate) reserved: [u8; 4],
    pub(crate) properties: u16,
    pub(crate) data_type_code: u16,
    pub(crate) reserved2: [u8; 100],
    pub(crate) tile_size: u32,
    pub(crate) reserved3: u32,
    pub(crate) first: (u32, u32, u32),
}

pub(crate) fn parse_tile_header(input: &[u8]) -> IResult<&[u8], RawTileHeader> {
    let (input, application_type) = le_u16(input)?;
    let (input, sub_type_code) = le_u16(input)?;
    let (input, words_to_follow) = le_u32(input)?;
    let (input, packet_version) = le_u16(input)?;
    let (input, identifier) = le_u16(input)?;
    let (input, reserved) = byte_array::<4>(input)?;
    let (input, properties) = le_u16(input)?;
    let (input, data_type_code) = le_u16(input)?;
    let (input, reserved2) = byte_array::<100>(input)?;
    let (input, tile_size) = le_u32(input)?;
    let (input, reserved3) = le_u32(input)?;
    let (input, first) = parse_tile_item(input)?;

    Ok((
        input,
        RawTileHeader {
            application_type,
            sub_type_code,
            words_to_follow,
            packet_version,
            identifier,
            reserved,
            properties,
            data_type_code,
            reserved2,
            tile_size,
            reserved3,
            first,
        },
    ))
}

fn parse_tile_item(input: &[u8]) -> IResult<&[u8], (u32, u32, u32)> {
    let (input, start) = le_u32(input)?;
    let (input, allocated) = le_u32(input)?;
    let (input, used) = le_u32(input)?;
    Ok((input, (start, allocated, used)))
}

pub(crate) fn parse_tile_items(input: &[u8], count: usize) -> IResult<&[u8], Vec<(u32, u32, u32)>> {
    let mut items = Vec::with_capacity(count);
    let mut input = input;
    for _ in 0..count {
        let (rest, item) = parse_tile_item(input)?;
        items.push(item);
        input = rest;
    }
    Ok((input, items))
}

pub(crate) fn encode_tile_directory(directory: &TileDirectory) -> Vec<u8> {
    let items = directory.items();
    let mut buf = Vec::with_capacity(SIZEOF_TDIR + items.len().saturating_sub(1) * SIZEOF_TILE);
    put_u16(&mut buf, directory.application_type);
    put_u16(&mut buf, directory.sub_type_code);
    put_u32(&mut buf, directory.words_to_follow);
    put_u16(&mut buf, directory.packet_version);
    put_u16(&mut buf, directory.identifier);
    buf.extend_from_slice(&directory.reserved);
    put_u16(&mut buf, directory.properties);
    put_u16(&mut buf, directory.data_type_code);
    buf.extend_from_slice(&directory.reserved2);
    put_u32(&mut buf, directory.tile_size);
    put_u32(&mut buf, directory.reserved3);
    for item in items {
        let (start, allocated, used) = item.to_raw();
        put_u32(&mut buf, start);
        put_u32(&mut buf, allocated);
        put_u32(&mut buf, used);
    }
    buf
}
