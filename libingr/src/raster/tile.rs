use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::serde::{
    encode_tile_directory, finish, parse_tile_header, parse_tile_items, SIZEOF_TDIR, SIZEOF_TILE,
};
use crate::Error;

/// Required signature values for a valid tile directory
const TDIR_APPLICATION_TYPE: u16 = 1;
const TDIR_SUB_TYPE_CODE: u16 = 7;
const TDIR_PACKET_VERSION: u16 = 1;
const TDIR_IDENTIFIER: u16 = 1;

/// Whether a tile has data in the file at all
///
/// The on-disk item reuses its byte-count field as a fill value for tiles
/// that were never written; the two meanings are kept apart here.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum TileState {
    /// The tile was never written; every pixel equals the fill byte
    Uninstantiated {
        /// Constant byte value of the whole tile
        fill: u8,
    },
    /// The tile has data in the file
    Instantiated {
        /// Byte offset of the tile data, relative to the band's data start
        start: u32,
        /// Number of valid data bytes; edge tiles clipped by the raster
        /// boundary store fewer bytes than a full tile
        used: u32,
    },
}

/// One entry of the tile index
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct TileItem {
    /// Bytes allocated for the tile in the file
    pub allocated: u32,
    /// Whether and where the tile's data lives
    pub state: TileState,
}

impl TileItem {
    pub(crate) fn from_raw((start, allocated, used): (u32, u32, u32)) -> Self {
        let state = if start == 0 {
            // A zero start marks an uninstantiated tile; `used` then holds
            // the fill byte instead of a byte count
            TileState::Uninstantiated {
                fill: (used & 0xFF) as u8,
            }
        } else {
            TileState::Instantiated { start, used }
        };
        Self { allocated, state }
    }

    pub(crate) fn to_raw(self) -> (u32, u32, u32) {
        match self.state {
            TileState::Uninstantiated { fill } => (0, self.allocated, u32::from(fill)),
            TileState::Instantiated { start, used } => (start, self.allocated, used),
        }
    }
}

/// The tile index of a band stored in tiled form: a signed header plus one
/// item per tile, row-major over the tile grid
#[derive(Debug, Clone, PartialEq)]
pub struct TileDirectory {
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
    items: Vec<TileItem>,
}

impl TileDirectory {
    /// Creates a directory with a valid signature for the given tile edge
    /// length, pixel format code and tile items
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(tile_size: u32, data_type_code: u16, items: Vec<TileItem>) -> Self {
        let tail = items.len().saturating_sub(1) * SIZEOF_TILE;
        // words after the leading two header words, padded up to the
        // four-word multiple the signature check demands
        let words = ((SIZEOF_TDIR - 8 + tail) / 2).next_multiple_of(4);
        Self {
            application_type: TDIR_APPLICATION_TYPE,
            sub_type_code: TDIR_SUB_TYPE_CODE,
            words_to_follow: words as u32,
            packet_version: TDIR_PACKET_VERSION,
            identifier: TDIR_IDENTIFIER,
            reserved: [0; 4],
            properties: 0,
            data_type_code,
            reserved2: [0; 100],
            tile_size,
            reserved3: 0,
            items,
        }
    }

    /// Reads and validates the tile directory found at the band's data
    /// offset
    ///
    /// The embedded first item becomes slot 0; the remaining
    /// `tile_count - 1` items follow the header contiguously.
    ///
    /// # Errors
    ///
    /// Errors if the directory cannot be read, fails its signature checks,
    /// or announces a zero tile size
    pub fn load<F: Read + Seek>(
        file: &mut F,
        data_offset: u64,
        width: u32,
        height: u32,
    ) -> Result<Self, Error> {
        file.seek(SeekFrom::Start(data_offset))?;
        let mut block = [0u8; SIZEOF_TDIR];
        file.read_exact(&mut block)?;
        let raw = finish(parse_tile_header(&block))?;

        let mut directory = Self {
            application_type: raw.application_type,
            sub_type_code: raw.sub_type_code,
            words_to_follow: raw.words_to_follow,
            packet_version: raw.packet_version,
            identifier: raw.identifier,
            reserved: raw.reserved,
            properties: raw.properties,
            data_type_code: raw.data_type_code,
            reserved2: raw.reserved2,
            tile_size: raw.tile_size,
            reserved3: raw.reserved3,
            items: Vec::new(),
        };
        directory.validate()?;

        let per_row = width.div_ceil(directory.tile_size);
        let per_column = height.div_ceil(directory.tile_size);
        let tile_count = per_row as usize * per_column as usize;
        debug!("tile directory: {per_row}x{per_column} tiles of {}px", directory.tile_size);

        directory.items.reserve_exact(tile_count);
        directory.items.push(TileItem::from_raw(raw.first));
        if tile_count > 1 {
            let mut rest = vec![0u8; (tile_count - 1) * SIZEOF_TILE];
            file.read_exact(&mut rest)?;
            let raw_items = finish(parse_tile_items(&rest, tile_count - 1))?;
            directory.items.extend(raw_items.into_iter().map(TileItem::from_raw));
        }
        Ok(directory)
    }

    fn validate(&self) -> Result<(), Error> {
        let reason = if self.application_type != TDIR_APPLICATION_TYPE {
            format!("application type {}", self.application_type)
        } else if self.sub_type_code != TDIR_SUB_TYPE_CODE {
            format!("sub type code {}", self.sub_type_code)
        } else if self.identifier != TDIR_IDENTIFIER {
            format!("identifier {}", self.identifier)
        } else if self.packet_version != TDIR_PACKET_VERSION {
            format!("packet version {}", self.packet_version)
        } else if self.words_to_follow % 4 != 0 {
            format!("words to follow {}", self.words_to_follow)
        } else if self.tile_size == 0 {
            "zero tile size".to_owned()
        } else {
            return Ok(());
        };
        Err(Error::InvalidTileDirectory { reason })
    }

    /// Tile edge length in pixels
    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// The format code governing the actual pixel data; takes precedence
    /// over the band header's format code
    #[must_use]
    pub const fn data_type_code(&self) -> u16 {
        self.data_type_code
    }

    /// All tile items in row-major order
    #[must_use]
    pub fn items(&self) -> &[TileItem] {
        &self.items
    }

    /// The item for one tile id
    #[must_use]
    pub fn item(&self, tile_id: usize) -> Option<&TileItem> {
        self.items.get(tile_id)
    }

    /// Encodes the directory into its on-disk form, first item embedded in
    /// the header
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_tile_directory(self)
    }
}

/// Row-major tile id for a block position
#[must_use]
pub const fn tile_index(block_x: u32, block_y: u32, tiles_per_row: u32) -> u32 {
    block_x + block_y * tiles_per_row
}
