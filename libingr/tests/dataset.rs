use std::io::Cursor;

use libingr::{
    resolve_format_for_write, ColorEntry, ColorTable, ColorTableKind, CreateOptions, Error, Format,
    HeaderOne, HeaderTwo, IngrDataset, PixelType,
};
use mktemp::Temp;

mod common;
use common::band_header_bytes;

/// Stub-only compression codes: opening succeeds, reading blocks must not
const STUB_FORMAT_CODES: [u16; 9] = [1, 9, 24, 27, 29, 30, 31, 32, 67];

fn band_bytes_with_chain(data_type_code: u16, catenated: u32) -> Vec<u8> {
    let mut header_one = HeaderOne::default();
    header_one.data_type_code = data_type_code;
    header_one.pixels_per_line = 4;
    header_one.number_of_lines = 2;
    let mut header_two = HeaderTwo::default();
    header_two.catenated_file_pointer = catenated;
    let mut bytes = header_one.encode();
    bytes.extend_from_slice(&header_two.encode());
    bytes.extend_from_slice(&[0u8; 768]);
    bytes
}

#[test]
fn created_file_reopens_with_identical_pixels() -> anyhow::Result<()> {
    let tmp = Temp::new_file()?;
    let options = CreateOptions::builder().width(6).height(3).build();
    let pixels: Vec<u8> = (0..18).collect();

    let mut dataset = IngrDataset::create_file(&tmp, &options)?;
    dataset.write_band(1, &pixels)?;
    dataset.flush()?;
    drop(dataset);

    let mut reopened = IngrDataset::from_file(&tmp)?;
    assert_eq!(reopened.width(), 6);
    assert_eq!(reopened.height(), 3);
    assert_eq!(reopened.band_count(), 1);
    assert_eq!(reopened.band(1)?.format(), Format::ByteInteger);
    assert_eq!(reopened.read_band(1)?, pixels);
    Ok(())
}

#[test]
fn multi_band_chain_and_georeferencing_survive_a_round_trip() -> anyhow::Result<()> {
    let gt = [1000.0, 2.0, 0.0, 500.0, 0.0, -2.0];
    let options = CreateOptions::builder()
        .width(4)
        .height(2)
        .bands(2)
        .pixel_type(PixelType::Int16)
        .geotransform(gt)
        .build();

    let first: Vec<u8> = (0..16).collect();
    let second: Vec<u8> = (100..116).collect();
    let mut dataset = IngrDataset::create(Cursor::new(Vec::new()), "two bands", &options)?;
    dataset.write_band(1, &first)?;
    dataset.write_band(2, &second)?;
    dataset.flush()?;

    let mut reopened = IngrDataset::from_reader(dataset.into_inner(), "two bands")?;
    assert_eq!(reopened.band_count(), 2);
    assert_eq!(reopened.geotransform(), gt);
    assert_eq!(reopened.band(2)?.pixel_type(), PixelType::Int16);
    assert_eq!(reopened.read_band(1)?, first);
    assert_eq!(reopened.read_band(2)?, second);
    Ok(())
}

#[test]
fn interleaved_rgb_bands_splice_and_extract_their_components() -> anyhow::Result<()> {
    let options = CreateOptions::builder()
        .width(2)
        .height(2)
        .bands(3)
        .compression("Uncompressed 24bit".to_owned())
        .build();

    let red = vec![1, 2, 3, 4];
    let green = vec![5, 6, 7, 8];
    let blue = vec![9, 10, 11, 12];
    let mut dataset = IngrDataset::create(Cursor::new(Vec::new()), "rgb", &options)?;
    dataset.write_band(1, &red)?;
    dataset.write_band(2, &green)?;
    dataset.write_band(3, &blue)?;
    dataset.flush()?;

    let mut reopened = IngrDataset::from_reader(dataset.into_inner(), "rgb")?;
    assert_eq!(reopened.band_count(), 3);
    assert_eq!(reopened.band(1)?.format(), Format::Uncompressed24bit);
    assert_eq!(reopened.read_band(1)?, red);
    assert_eq!(reopened.read_band(2)?, green);
    assert_eq!(reopened.read_band(3)?, blue);
    Ok(())
}

#[test]
fn value_range_metadata_is_persisted() -> anyhow::Result<()> {
    let options = CreateOptions::builder().width(4).height(1).build();
    let mut dataset = IngrDataset::create(Cursor::new(Vec::new()), "range", &options)?;
    dataset.band_mut(1)?.set_value_range(3.0, 200.0);
    dataset.write_band(1, &[3, 17, 200, 40])?;
    dataset.flush()?;

    let reopened = IngrDataset::from_reader(dataset.into_inner(), "range")?;
    assert_eq!(reopened.band(1)?.minimum(), 3.0);
    assert_eq!(reopened.band(1)?.maximum(), 200.0);
    Ok(())
}

#[test]
fn rewriting_a_band_preserves_an_environ_v_color_table() -> anyhow::Result<()> {
    let red = ColorEntry {
        r: 255,
        g: 0,
        b: 0,
        a: 255,
    };
    let blue = ColorEntry {
        r: 0,
        g: 0,
        b: 255,
        a: 255,
    };
    let table = ColorTable::new(vec![red, blue]);

    // a 1024-byte header region: two header blocks, two slot records,
    // zero padding; pixel data starts right after
    let mut header_one = HeaderOne::default();
    header_one.data_type_code = 2;
    header_one.pixels_per_line = 4;
    header_one.number_of_lines = 2;
    header_one.words_to_follow = 510;
    let mut header_two = HeaderTwo::default();
    header_two.color_table_type = ColorTableKind::EnvironV;
    header_two.number_of_ct_entries = 2;
    let mut file = header_one.encode();
    file.extend_from_slice(&header_two.encode());
    file.extend_from_slice(&table.to_environ_v_bytes());
    file.resize(1024, 0);
    file.extend_from_slice(&[9, 9, 9, 9, 8, 8, 8, 8]);

    let mut dataset = IngrDataset::from_reader(Cursor::new(file), "environ-v")?;
    assert_eq!(dataset.band(1)?.color_table().map(ColorTable::len), Some(2));
    dataset.write_band_block(1, 0, 0, &[1, 2, 3, 4])?;
    dataset.flush()?;

    let mut reopened = IngrDataset::from_reader(dataset.into_inner(), "environ-v")?;
    let entries = reopened
        .band(1)?
        .color_table()
        .map(|t| t.entries().to_vec())
        .unwrap_or_default();
    assert_eq!(entries, vec![red, blue]);

    let mut row = vec![0u8; 4];
    reopened.read_band_block(1, 0, 0, &mut row)?;
    assert_eq!(row, vec![1, 2, 3, 4]);
    reopened.read_band_block(1, 0, 1, &mut row)?;
    assert_eq!(row, vec![8, 8, 8, 8]);
    Ok(())
}

#[test]
fn a_truncated_pixel_region_fails_per_block_only() -> anyhow::Result<()> {
    let mut file = band_header_bytes(2, 4, 3);
    // only the first of three scanlines made it into the file
    file.extend_from_slice(&[1, 2, 3, 4]);

    let mut dataset = IngrDataset::from_reader(Cursor::new(file), "truncated")?;
    let mut block = vec![0xAA; 4];
    let err = dataset
        .read_band_block(1, 0, 2, &mut block)
        .expect_err("scanlines past the end of the file must not read");
    assert!(matches!(err, Error::BlockIo { x: 0, y: 2, .. }), "got: {err}");
    assert_eq!(block, vec![0; 4]);

    dataset.read_band_block(1, 0, 0, &mut block)?;
    assert_eq!(block, vec![1, 2, 3, 4]);
    Ok(())
}

#[test]
fn cyclic_band_chains_are_detected() {
    let mut file = band_bytes_with_chain(2, 1536);
    file.extend_from_slice(&band_bytes_with_chain(2, 1536));

    let result = IngrDataset::from_reader(Cursor::new(file), "cycle");
    let err = result.expect_err("a cyclic chain must not open");
    assert!(err.to_string().contains("loops back"), "got: {err}");
}

#[test]
fn unreadable_and_unknown_formats_fail_at_open() {
    // quad tree encoding has a code but neither a raw layout nor a codec
    let file = band_header_bytes(19, 4, 4);
    let err = IngrDataset::from_reader(Cursor::new(file), "quad tree")
        .expect_err("quad tree files must not open");
    assert!(format!("{err:#}").contains("not readable"), "got: {err:#}");

    let file = band_header_bytes(999, 4, 4);
    let err = IngrDataset::from_reader(Cursor::new(file), "unknown")
        .expect_err("unknown codes must not open");
    assert!(format!("{err:#}").contains("unknown format code"), "got: {err:#}");
}

#[test]
fn non_raster_files_are_rejected() {
    let file = vec![0u8; 2048];
    assert!(IngrDataset::from_reader(Cursor::new(file), "zeros").is_err());
}

#[test]
fn stub_codecs_fail_without_touching_the_destination() -> anyhow::Result<()> {
    for code in STUB_FORMAT_CODES {
        let file = band_header_bytes(code, 8, 2);
        let mut dataset = IngrDataset::from_reader(Cursor::new(file), format!("code {code}"))?;

        let mut block = vec![0xAA; dataset.band(1)?.block_bytes()];
        let result = dataset.read_band_block(1, 0, 0, &mut block);
        assert!(
            matches!(result, Err(Error::UnimplementedCodec { .. })),
            "code {code} must fail with an unimplemented codec error"
        );
        assert!(
            block.iter().all(|&b| b == 0xAA),
            "code {code} must leave the destination untouched"
        );
    }
    Ok(())
}

#[test]
fn band_numbers_are_validated() -> anyhow::Result<()> {
    let file = band_header_bytes(2, 4, 2);
    let mut dataset = IngrDataset::from_reader(Cursor::new(file), "one band")?;

    let mut block = vec![0u8; 4];
    assert!(matches!(
        dataset.read_band_block(0, 0, 0, &mut block),
        Err(Error::BandOutOfRange { band: 0 })
    ));
    assert!(matches!(
        dataset.read_band_block(3, 0, 0, &mut block),
        Err(Error::BandOutOfRange { band: 3 })
    ));
    Ok(())
}

#[test]
fn block_buffer_sizes_are_validated() -> anyhow::Result<()> {
    let file = band_header_bytes(2, 4, 2);
    let mut dataset = IngrDataset::from_reader(Cursor::new(file), "one band")?;

    let mut block = vec![0u8; 3];
    assert!(matches!(
        dataset.read_band_block(1, 0, 0, &mut block),
        Err(Error::BlockBufferSize {
            expected: 4,
            actual: 3
        })
    ));
    Ok(())
}

#[test]
fn tiled_datasets_cannot_be_written() -> anyhow::Result<()> {
    let options = CreateOptions::builder()
        .width(4)
        .height(4)
        .compression("Tiled Raster Data".to_owned())
        .build();
    assert!(IngrDataset::create(Cursor::new(Vec::new()), "tiled", &options).is_err());
    Ok(())
}

#[test]
fn compression_names_resolve_deterministically() {
    assert_eq!(
        resolve_format_for_write(PixelType::Byte, ""),
        Format::ByteInteger
    );
    assert_eq!(
        resolve_format_for_write(PixelType::Int16, "None"),
        Format::WordIntegers
    );
    assert_eq!(
        resolve_format_for_write(PixelType::Float64, "none"),
        Format::FloatingPoint64Bit
    );
    assert_eq!(
        resolve_format_for_write(PixelType::Byte, "uncompressed 24BIT"),
        Format::Uncompressed24bit
    );
    assert_eq!(
        resolve_format_for_write(PixelType::Byte, "CCITT Group 4"),
        Format::CcittGroup4
    );
    // unsupported names degrade instead of failing
    assert_eq!(
        resolve_format_for_write(PixelType::Byte, "no such codec"),
        Format::ByteInteger
    );
}
