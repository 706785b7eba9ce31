use nom::{
    number::complete::{le_f64, le_i16, le_u16, le_u32, u8 as any_u8},
    IResult,
};
use tracing::warn;

use crate::raster::color::VltEntry;
use crate::raster::header::{
    BandValue, ColorTableKind, HeaderOne, HeaderTwo, HeaderTypeWord, ScanlineOrientation,
};

use super::{byte_array, put_f64, put_i16, put_u16, put_u32, SIZEOF_HDR1, SIZEOF_HDR2};

pub(crate) fn parse_header_one(input: &[u8]) -> IResult<&[u8], HeaderOne> {
    let (input, header_type) = le_u16(input)?;
    let (input, words_to_follow) = le_u16(input)?;
    let (input, data_type_code) = le_u16(input)?;
    let (input, application_type) = le_u16(input)?;
    let (input, x_view_origin) = le_f64(input)?;
    let (input, y_view_origin) = le_f64(input)?;
    let (input, z_view_origin) = le_f64(input)?;
    let (input, x_view_extent) = le_f64(input)?;
    let (input, y_view_extent) = le_f64(input)?;
    let (input, z_view_extent) = le_f64(input)?;

    let mut transformation_matrix = [0f64; 16];
    let mut input = input;
    for slot in &mut transformation_matrix {
        let (rest, value) = le_f64(input)?;
        *slot = value;
        input = rest;
    }

    let (input, pixels_per_line) = le_u32(input)?;
    let (input, number_of_lines) = le_u32(input)?;
    let (input, device_resolution) = le_i16(input)?;
    let (input, orientation_raw) = any_u8(input)?;
    let (input, scannable_flag) = any_u8(input)?;
    let (input, rotation_angle) = le_f64(input)?;
    let (input, skew_angle) = le_f64(input)?;
    let (input, data_type_modifier) = le_u16(input)?;
    let (input, design_file_name) = byte_array::<66>(input)?;
    let (input, data_base_file_name) = byte_array::<66>(input)?;
    let (input, parent_grid_file_name) = byte_array::<66>(input)?;
    let (input, file_description) = byte_array::<80>(input)?;
    let (input, minimum) = byte_array::<8>(input)?;
    let (input, maximum) = byte_array::<8>(input)?;
    let (input, reserved) = byte_array::<3>(input)?;
    let (input, grid_file_version) = any_u8(input)?;

    let scanline_orientation = ScanlineOrientation::from_repr(orientation_raw).unwrap_or_else(|| {
        warn!("unknown scanline orientation {orientation_raw}, assuming upper-left horizontal");
        ScanlineOrientation::default()
    });

    Ok((
        input,
        HeaderOne {
            header_type: HeaderTypeWord::from_word(header_type),
            words_to_follow,
            data_type_code,
            application_type,
            x_view_origin,
            y_view_origin,
            z_view_origin,
            x_view_extent,
            y_view_extent,
            z_view_extent,
            transformation_matrix,
            pixels_per_line,
            number_of_lines,
            device_resolution,
            scanline_orientation,
            scannable_flag,
            rotation_angle,
            skew_angle,
            data_type_modifier,
            design_file_name,
            data_base_file_name,
            parent_grid_file_name,
            file_description,
            minimum: BandValue::from_raw(minimum),
            maximum: BandValue::from_raw(maximum),
            reserved,
            grid_file_version,
        },
    ))
}

pub(crate) fn encode_header_one(header: &HeaderOne) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SIZEOF_HDR1);
    put_u16(&mut buf, header.header_type.to_word());
    put_u16(&mut buf, header.words_to_follow);
    put_u16(&mut buf, header.data_type_code);
    put_u16(&mut buf, header.application_type);
    put_f64(&mut buf, header.x_view_origin);
    put_f64(&mut buf, header.y_view_origin);
    put_f64(&mut buf, header.z_view_origin);
    put_f64(&mut buf, header.x_view_extent);
    put_f64(&mut buf, header.y_view_extent);
    put_f64(&mut buf, header.z_view_extent);
    for value in &header.transformation_matrix {
        put_f64(&mut buf, *value);
    }
    put_u32(&mut buf, header.pixels_per_line);
    put_u32(&mut buf, header.number_of_lines);
    put_i16(&mut buf, header.device_resolution);
    buf.push(header.scanline_orientation as u8);
    buf.push(header.scannable_flag);
    put_f64(&mut buf, header.rotation_angle);
    put_f64(&mut buf, header.skew_angle);
    put_u16(&mut buf, header.data_type_modifier);
    buf.extend_from_slice(&header.design_file_name);
    buf.extend_from_slice(&header.data_base_file_name);
    buf.extend_from_slice(&header.parent_grid_file_name);
    buf.extend_from_slice(&header.file_description);
    buf.extend_from_slice(&header.minimum.raw());
    buf.extend_from_slice(&header.maximum.raw());
    buf.extend_from_slice(&header.reserved);
    buf.push(header.grid_file_version);
    debug_assert_eq!(buf.len(), SIZEOF_HDR1);
    buf
}

pub(crate) fn parse_header_two(input: &[u8]) -> IResult<&[u8], HeaderTwo> {
    let (input, gain) = any_u8(input)?;
    let (input, offset_threshold) = any_u8(input)?;
    let (input, view1) = any_u8(input)?;
    let (input, view2) = any_u8(input)?;
    let (input, view_number) = any_u8(input)?;
    let (input, reserved2) = any_u8(input)?;
    let (input, reserved3) = le_u16(input)?;
    let (input, aspect_ratio) = le_f64(input)?;
    let (input, catenated_file_pointer) = le_u32(input)?;
    let (input, color_table_raw) = le_u16(input)?;
    let (input, reserved8) = le_u16(input)?;
    let (input, number_of_ct_entries) = le_u32(input)?;
    let (input, application_packet_pointer) = le_u32(input)?;
    let (input, application_packet_length) = le_u32(input)?;
    let (input, reserved) = byte_array::<220>(input)?;

    let color_table_type = ColorTableKind::from_raw(color_table_raw).unwrap_or_else(|| {
        warn!("unknown color table type {color_table_raw}, treating as none");
        ColorTableKind::None
    });

    Ok((
        input,
        HeaderTwo {
            gain,
            offset_threshold,
            view1,
            view2,
            view_number,
            reserved2,
            reserved3,
            aspect_ratio,
            catenated_file_pointer,
            color_table_type,
            reserved8,
            number_of_ct_entries,
            application_packet_pointer,
            application_packet_length,
            reserved,
        },
    ))
}

pub(crate) fn encode_header_two(header: &HeaderTwo) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SIZEOF_HDR2);
    buf.push(header.gain);
    buf.push(header.offset_threshold);
    buf.push(header.view1);
    buf.push(header.view2);
    buf.push(header.view_number);
    buf.push(header.reserved2);
    put_u16(&mut buf, header.reserved3);
    put_f64(&mut buf, header.aspect_ratio);
    put_u32(&mut buf, header.catenated_file_pointer);
    put_u16(&mut buf, header.color_table_type.code());
    put_u16(&mut buf, header.reserved8);
    put_u32(&mut buf, header.number_of_ct_entries);
    put_u32(&mut buf, header.application_packet_pointer);
    put_u32(&mut buf, header.application_packet_length);
    buf.extend_from_slice(&header.reserved);
    debug_assert_eq!(buf.len(), SIZEOF_HDR2);
    buf
}

pub(crate) fn parse_vlt_entries(input: &[u8], count: usize) -> IResult<&[u8], Vec<VltEntry>> {
    let mut entries = Vec::with_capacity(count);
    let mut input = input;
    for _ in 0..count {
        let (rest, slot) = le_u16(input)?;
        let (rest, r) = le_u16(rest)?;
        let (rest, g) = le_u16(rest)?;
        let (rest, b) = le_u16(rest)?;
        entries.push(VltEntry { slot, r, g, b });
        input = rest;
    }
    Ok((input, entries))
}

pub(crate) fn encode_vlt_entries(entries: &[VltEntry]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(entries.len() * super::SIZEOF_VLT);
    for entry in entries {
        put_u16(&mut buf, entry.slot);
        put_u16(&mut buf, entry.r);
        put_u16(&mut buf, entry.g);
        put_u16(&mut buf, entry.b);
    }
    buf
}
