use std::cell::Cell;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

use libingr::{tile_index, Error, IngrDataset, TileDirectory, TileItem, TileState};

mod common;
use common::{band_header_bytes, BYTE_INTEGER, DATA_OFFSET, TILED_RASTER_DATA};

/// Wraps a reader and counts how often it is asked for bytes
struct CountingReader<R> {
    inner: R,
    reads: Rc<Cell<usize>>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reads.set(self.reads.get() + 1);
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for CountingReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[test]
fn tile_ids_are_row_major() {
    assert_eq!(tile_index(0, 0, 4), 0);
    assert_eq!(tile_index(3, 0, 4), 3);
    assert_eq!(tile_index(2, 3, 4), 14);
}

#[test]
fn tile_directory_round_trips_through_encode_and_load() -> anyhow::Result<()> {
    let items = vec![
        TileItem {
            allocated: 4096,
            state: TileState::Instantiated {
                start: 176,
                used: 4096,
            },
        },
        TileItem {
            allocated: 4096,
            state: TileState::Instantiated {
                start: 4272,
                used: 4096,
            },
        },
        TileItem {
            allocated: 0,
            state: TileState::Uninstantiated { fill: 255 },
        },
        TileItem {
            allocated: 4096,
            state: TileState::Instantiated {
                start: 8368,
                used: 2048,
            },
        },
    ];
    let directory = TileDirectory::new(64, 5, items.clone());
    let bytes = directory.encode();
    assert_eq!(bytes.len(), 140 + 3 * 12);

    let loaded = TileDirectory::load(&mut Cursor::new(bytes), 0, 128, 128)?;
    assert_eq!(loaded.tile_size(), 64);
    assert_eq!(loaded.data_type_code(), 5);
    assert_eq!(loaded.items(), items.as_slice());
    Ok(())
}

#[test]
fn corrupted_tile_directory_signature_is_rejected() {
    let directory = TileDirectory::new(
        64,
        BYTE_INTEGER,
        vec![TileItem {
            allocated: 0,
            state: TileState::Uninstantiated { fill: 0 },
        }],
    );
    let mut bytes = directory.encode();
    bytes[0] = 9;

    let result = TileDirectory::load(&mut Cursor::new(bytes), 0, 64, 64);
    assert!(matches!(
        result,
        Err(Error::InvalidTileDirectory { .. })
    ));
}

#[test]
fn uninstantiated_tiles_are_served_without_touching_the_file() -> anyhow::Result<()> {
    let mut file = band_header_bytes(TILED_RASTER_DATA, 8, 8);
    let directory = TileDirectory::new(
        8,
        BYTE_INTEGER,
        vec![TileItem {
            allocated: 0,
            state: TileState::Uninstantiated { fill: 7 },
        }],
    );
    file.extend_from_slice(&directory.encode());

    let reads = Rc::new(Cell::new(0));
    let reader = CountingReader {
        inner: Cursor::new(file),
        reads: Rc::clone(&reads),
    };
    let mut dataset = IngrDataset::from_reader(reader, "uninstantiated")?;
    assert!(dataset.band(1)?.tile_directory().is_some());

    let reads_after_open = reads.get();
    let mut block = vec![0u8; dataset.band(1)?.block_bytes()];
    dataset.read_band_block(1, 0, 0, &mut block)?;

    assert!(block.iter().all(|&b| b == 7));
    assert_eq!(reads.get(), reads_after_open);
    Ok(())
}

#[test]
fn blocks_outside_the_raster_are_rejected() -> anyhow::Result<()> {
    let mut file = band_header_bytes(TILED_RASTER_DATA, 8, 8);
    let directory = TileDirectory::new(
        8,
        BYTE_INTEGER,
        vec![TileItem {
            allocated: 0,
            state: TileState::Uninstantiated { fill: 0 },
        }],
    );
    file.extend_from_slice(&directory.encode());

    let mut dataset = IngrDataset::from_reader(Cursor::new(file), "bounds")?;
    let mut block = vec![0u8; dataset.band(1)?.block_bytes()];
    assert!(matches!(
        dataset.read_band_block(1, 0, u32::MAX, &mut block),
        Err(Error::BlockIo {
            x: 0,
            y: u32::MAX,
            ..
        })
    ));
    assert!(matches!(
        dataset.read_band_block(1, 1, 0, &mut block),
        Err(Error::BlockIo { x: 1, y: 0, .. })
    ));
    Ok(())
}

#[test]
fn clipped_edge_tiles_are_spread_to_full_tile_shape() -> anyhow::Result<()> {
    // a 10x4 raster under 8px tiles: one full-width tile and one 2px
    // column remnant, both clipped to 4 rows
    let mut file = band_header_bytes(TILED_RASTER_DATA, 10, 4);
    let directory = TileDirectory::new(
        8,
        BYTE_INTEGER,
        vec![
            TileItem {
                allocated: 32,
                state: TileState::Instantiated {
                    start: 160,
                    used: 32,
                },
            },
            TileItem {
                allocated: 8,
                state: TileState::Instantiated {
                    start: 192,
                    used: 8,
                },
            },
        ],
    );
    file.extend_from_slice(&directory.encode());
    file.resize(DATA_OFFSET + 160, 0);
    file.extend(1..=32u8);
    file.extend(101..=108u8);

    let mut dataset = IngrDataset::from_reader(Cursor::new(file), "edges")?;
    let pixels = dataset.read_band(1)?;

    let expected: Vec<u8> = vec![
        1, 2, 3, 4, 5, 6, 7, 8, 101, 102, //
        9, 10, 11, 12, 13, 14, 15, 16, 103, 104, //
        17, 18, 19, 20, 21, 22, 23, 24, 105, 106, //
        25, 26, 27, 28, 29, 30, 31, 32, 107, 108, //
    ];
    assert_eq!(pixels, expected);
    Ok(())
}
