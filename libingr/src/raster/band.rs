use std::io::{self, Read, Seek, SeekFrom, Write};

use tracing::{debug, error};

use crate::raster::color::ColorTable;
use crate::raster::decode::decoder_for;
use crate::raster::format::{Format, PixelType};
use crate::raster::header::{BandValue, ColorTableKind, HeaderOne, HeaderTwo};
use crate::raster::tile::{tile_index, TileDirectory, TileState};
use crate::serde::{SIZEOF_HDR1, SIZEOF_HDR2};
use crate::Error;

/// How a band's pixels sit inside the stored block bytes
///
/// The multi-component formats store their components band-interleaved by
/// pixel; one accessor then serves a single component of the shared bytes.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Interleaving {
    /// The band owns every stored byte
    Single,
    /// One component of an RGB triplet stream
    Interleaved3 {
        /// Component number, 1 through 3
        component: u8,
    },
}

impl Interleaving {
    /// Number of components sharing the stored bytes
    #[must_use]
    pub const fn components(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Interleaved3 { .. } => 3,
        }
    }

    /// The interleaving for one component of a band that fans out into
    /// `components` in-memory bands
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn for_component(components: usize, component: usize) -> Self {
        if components == 3 {
            Self::Interleaved3 {
                component: component as u8,
            }
        } else {
            Self::Single
        }
    }

    /// Byte offset of this component within one stored pixel
    const fn component_offset(self) -> usize {
        match self {
            Self::Single => 0,
            Self::Interleaved3 { component } => (3 - component) as usize,
        }
    }
}

/// Per-band block access state
///
/// An accessor holds its band's header copies, tile index and scratch
/// buffer, and answers block read/write requests against the dataset's
/// shared file handle. The mode (untiled scanline blocks or square tile
/// blocks) is fixed at construction.
#[derive(Debug)]
pub struct BandAccessor {
    band_number: usize,
    header_one: HeaderOne,
    header_two: HeaderTwo,
    format: Format,
    pixel_type: PixelType,
    interleaving: Interleaving,
    band_start: u64,
    data_offset: u64,
    block_width: u32,
    block_height: u32,
    tiles: Option<TileDirectory>,
    tiles_per_row: u32,
    color_table: Option<ColorTable>,
    scratch: Vec<u8>,
}

impl BandAccessor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        band_number: usize,
        header_one: HeaderOne,
        header_two: HeaderTwo,
        format: Format,
        interleaving: Interleaving,
        band_start: u64,
        tiles: Option<TileDirectory>,
        color_table: Option<ColorTable>,
    ) -> Self {
        let pixel_type = format.pixel_type();
        let (block_width, block_height, tiles_per_row) = match &tiles {
            Some(directory) => {
                let tile_size = directory.tile_size();
                (
                    tile_size,
                    tile_size,
                    header_one.pixels_per_line.div_ceil(tile_size),
                )
            }
            None => (header_one.pixels_per_line, 1, 1),
        };
        let raw_bytes =
            raw_block_bytes(format, block_width, block_height) * interleaving.components();
        debug!(
            "band {band_number}: {format} blocks of {block_width}x{block_height}, {raw_bytes} raw bytes"
        );
        let data_offset = band_start + header_one.data_offset();
        Self {
            band_number,
            header_one,
            header_two,
            format,
            pixel_type,
            interleaving,
            band_start,
            data_offset,
            block_width,
            block_height,
            tiles,
            tiles_per_row,
            color_table,
            scratch: vec![0; raw_bytes],
        }
    }

    /// One-based position of this band in the dataset
    #[must_use]
    pub const fn band_number(&self) -> usize {
        self.band_number
    }

    /// Raster width in pixels
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.header_one.pixels_per_line
    }

    /// Raster height in lines
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.header_one.number_of_lines
    }

    /// The format governing this band's pixel data; for tiled bands this is
    /// the tile directory's override, not the band header code
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// The band's pixel data type
    #[must_use]
    pub const fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Block dimensions: one scanline for untiled bands, the square tile
    /// size for tiled ones
    #[must_use]
    pub const fn block_size(&self) -> (u32, u32) {
        (self.block_width, self.block_height)
    }

    /// Number of block columns
    #[must_use]
    pub const fn blocks_per_row(&self) -> u32 {
        self.width().div_ceil(self.block_width)
    }

    /// Number of block rows
    #[must_use]
    pub const fn blocks_per_column(&self) -> u32 {
        self.height().div_ceil(self.block_height)
    }

    /// Size in bytes of one decoded single-component block
    #[must_use]
    pub fn block_bytes(&self) -> usize {
        raw_block_bytes(self.format, self.block_width, self.block_height)
    }

    /// The band's primary header
    #[must_use]
    pub const fn header_one(&self) -> &HeaderOne {
        &self.header_one
    }

    /// The band's secondary header
    #[must_use]
    pub const fn header_two(&self) -> &HeaderTwo {
        &self.header_two
    }

    /// The band's color table, if one was stored or set
    #[must_use]
    pub const fn color_table(&self) -> Option<&ColorTable> {
        self.color_table.as_ref()
    }

    /// The band's tile directory, if the band is stored tiled
    #[must_use]
    pub const fn tile_directory(&self) -> Option<&TileDirectory> {
        self.tiles.as_ref()
    }

    /// Minimum pixel value recorded in the band header
    #[must_use]
    pub fn minimum(&self) -> f64 {
        self.header_one.minimum.as_f64(self.pixel_type)
    }

    /// Maximum pixel value recorded in the band header
    #[must_use]
    pub fn maximum(&self) -> f64 {
        self.header_one.maximum.as_f64(self.pixel_type)
    }

    /// Replaces the band's color table; becomes durable at the next header
    /// flush
    pub fn set_color_table(&mut self, table: ColorTable) {
        #[allow(clippy::cast_possible_truncation)]
        {
            self.header_two.number_of_ct_entries = table.len() as u32;
        }
        self.header_two.color_table_type = ColorTableKind::Igds;
        self.color_table = Some(table);
    }

    /// Records the band's pixel value range in the header
    pub fn set_value_range(&mut self, minimum: f64, maximum: f64) {
        self.header_one.minimum = BandValue::from_f64(self.pixel_type, minimum);
        self.header_one.maximum = BandValue::from_f64(self.pixel_type, maximum);
    }

    pub(crate) fn set_transformation_matrix(&mut self, matrix: [f64; 16]) {
        self.header_one.transformation_matrix = matrix;
    }

    /// Reads one block into `dest`
    ///
    /// On an I/O failure the destination is zero-filled and a block error
    /// returned; the band stays usable for other blocks.
    pub(crate) fn read_block<F: Read + Seek>(
        &mut self,
        file: &mut F,
        block_x: u32,
        block_y: u32,
        dest: &mut [u8],
    ) -> Result<(), Error> {
        if dest.len() != self.block_bytes() {
            return Err(Error::BlockBufferSize {
                expected: self.block_bytes(),
                actual: dest.len(),
            });
        }
        if block_x >= self.blocks_per_row() || block_y >= self.blocks_per_column() {
            return Err(block_io_error(
                block_x,
                block_y,
                io::Error::new(io::ErrorKind::InvalidInput, "block outside the raster"),
            ));
        }

        let tile_read = if let Some(directory) = &self.tiles {
            let tile_id = tile_index(block_x, block_y, self.tiles_per_row) as usize;
            let Some(item) = directory.item(tile_id) else {
                return Err(block_io_error(
                    block_x,
                    block_y,
                    io::Error::new(io::ErrorKind::InvalidInput, "block outside the tile grid"),
                ));
            };
            match item.state {
                TileState::Uninstantiated { fill } => {
                    // no data in the file; the whole tile is the fill byte
                    dest.fill(fill);
                    return Ok(());
                }
                TileState::Instantiated { start, used } => {
                    Some((start, used, directory.tile_size()))
                }
            }
        } else {
            None
        };

        if let Some(decode) = decoder_for(self.format) {
            // Compressed blocks are never fetched; every decoder in the
            // table fails before looking at its input.
            return decode(&[], dest);
        }

        let nominal = self.scratch.len();
        match tile_read {
            Some((start, used, tile_size)) => {
                let used = (used as usize).min(nominal);
                let offset = self.data_offset + u64::from(start);
                if let Err(source) = read_at(file, offset, &mut self.scratch[..used]) {
                    dest.fill(0);
                    return Err(block_io_error(block_x, block_y, source));
                }
                self.scratch[used..].fill(0);
                if used < nominal {
                    // an edge tile clipped by the raster boundary stores a
                    // compacted sub-rectangle; spread it to full tile shape
                    let cell =
                        self.pixel_type.bytes_per_pixel() * self.interleaving.components();
                    let col_pixels = edge_span(block_x, tile_size, self.width()) as usize;
                    let row_pixels = edge_span(block_y, tile_size, self.height()) as usize;
                    reshape_block(
                        &mut self.scratch,
                        col_pixels * cell,
                        row_pixels,
                        tile_size as usize * cell,
                    );
                }
            }
            None => {
                let offset = self.data_offset + u64::from(block_y) * nominal as u64;
                if let Err(source) = read_at(file, offset, &mut self.scratch) {
                    dest.fill(0);
                    return Err(block_io_error(block_x, block_y, source));
                }
            }
        }

        swap_float32_words(self.pixel_type, &mut self.scratch);

        match self.interleaving {
            Interleaving::Single => dest.copy_from_slice(&self.scratch[..dest.len()]),
            Interleaving::Interleaved3 { .. } => {
                let offset = self.interleaving.component_offset();
                for (i, out) in dest.iter_mut().enumerate() {
                    *out = self.scratch[i * 3 + offset];
                }
            }
        }
        Ok(())
    }

    /// Writes one block from `source`
    ///
    /// The first block of the band flushes the headers and color table
    /// beforehand. Interleaved components splice themselves into the
    /// scanline already on disk.
    pub(crate) fn write_block<F: Read + Write + Seek>(
        &mut self,
        file: &mut F,
        block_x: u32,
        block_y: u32,
        source: &[u8],
    ) -> Result<(), Error> {
        if self.tiles.is_some() {
            return Err(Error::TiledWriteUnsupported);
        }
        if decoder_for(self.format).is_some() {
            return Err(Error::UnimplementedCodec {
                codec: self.format.display_name(),
            });
        }
        if source.len() != self.block_bytes() {
            return Err(Error::BlockBufferSize {
                expected: self.block_bytes(),
                actual: source.len(),
            });
        }
        if block_x >= self.blocks_per_row() || block_y >= self.blocks_per_column() {
            return Err(block_io_error(
                block_x,
                block_y,
                io::Error::new(io::ErrorKind::InvalidInput, "block outside the raster"),
            ));
        }

        if block_x == 0 && block_y == 0 {
            self.flush_header(file)?;
        }

        let record = self.scratch.len();
        let offset = self.data_offset + u64::from(block_y) * record as u64;
        match self.interleaving {
            Interleaving::Single => {
                self.scratch.copy_from_slice(source);
            }
            Interleaving::Interleaved3 { .. } => {
                // read-modify-write so the other two components survive
                if read_at(file, offset, &mut self.scratch).is_err() {
                    self.scratch.fill(0);
                }
                let component_offset = self.interleaving.component_offset();
                for (i, byte) in source.iter().enumerate() {
                    self.scratch[i * 3 + component_offset] = *byte;
                }
            }
        }
        swap_float32_words(self.pixel_type, &mut self.scratch);
        write_at(file, offset, &self.scratch)
            .map_err(|source| block_io_error(block_x, block_y, source))?;
        // restore scratch byte order for the interleaved read-back case
        swap_float32_words(self.pixel_type, &mut self.scratch);
        Ok(())
    }

    /// Writes the band's header blocks and color table at the band start
    /// offset
    ///
    /// The table keeps the encoding the second header announces (Environ-V
    /// tables stay Environ-V; everything else becomes the fixed IGDS block)
    /// and the announced entry count is kept in step. The write covers
    /// exactly the band's header region and never reaches the pixel data.
    pub(crate) fn flush_header<F: Write + Seek>(&mut self, file: &mut F) -> Result<(), Error> {
        #[allow(clippy::cast_possible_truncation)]
        let region =
            (self.header_one.data_offset() as usize).saturating_sub(SIZEOF_HDR1 + SIZEOF_HDR2);
        let table_block = match &self.color_table {
            Some(table) if !table.is_empty() => {
                let bytes = if self.header_two.color_table_type == ColorTableKind::EnvironV {
                    table.to_environ_v_bytes()
                } else {
                    self.header_two.color_table_type = ColorTableKind::Igds;
                    table.to_igds()?
                };
                #[allow(clippy::cast_possible_truncation)]
                {
                    self.header_two.number_of_ct_entries = table.len() as u32;
                }
                bytes
            }
            _ => Vec::new(),
        };
        if table_block.len() > region {
            return Err(Error::ColorTableRegion {
                needed: table_block.len(),
                available: region,
            });
        }
        debug!(
            "band {}: flushing headers at offset {}",
            self.band_number, self.band_start
        );
        file.seek(SeekFrom::Start(self.band_start))?;
        let mut blocks = self.header_one.encode();
        blocks.extend_from_slice(&self.header_two.encode());
        blocks.extend_from_slice(&table_block);
        blocks.resize(SIZEOF_HDR1 + SIZEOF_HDR2 + region, 0);
        write_all_at(file, &blocks)?;
        Ok(())
    }
}

/// Raw byte size of one stored single-component block
fn raw_block_bytes(format: Format, block_width: u32, block_height: u32) -> usize {
    let pixels = block_width as usize * block_height as usize;
    if format == Format::PackedBinary {
        pixels.div_ceil(8)
    } else {
        pixels * format.pixel_type().bytes_per_pixel()
    }
}

/// Pixel span of a block along one axis, clipped by the raster boundary
const fn edge_span(block: u32, tile_size: u32, total: u32) -> u32 {
    if (block + 1) * tile_size > total {
        total - block * tile_size
    } else {
        tile_size
    }
}

/// Spreads a compacted `cols_bytes x rows` sub-rectangle over the full
/// block stride, zeroing everything the source does not cover
fn reshape_block(buffer: &mut [u8], cols_bytes: usize, rows: usize, stride_bytes: usize) {
    for row in (0..rows).rev() {
        let src = row * cols_bytes;
        let dst = row * stride_bytes;
        buffer.copy_within(src..src + cols_bytes, dst);
        buffer[dst + cols_bytes..dst + stride_bytes].fill(0);
    }
    buffer[rows * stride_bytes..].fill(0);
}

/// 32-bit float blocks are stored little-endian; on big-endian hosts each
/// word must be swapped. Other pixel types are byte-oriented here.
fn swap_float32_words(pixel_type: PixelType, buffer: &mut [u8]) {
    if cfg!(target_endian = "big") && pixel_type == PixelType::Float32 {
        for word in buffer.chunks_exact_mut(4) {
            word.reverse();
        }
    }
}

fn block_io_error(x: u32, y: u32, source: io::Error) -> Error {
    error!("block ({x}, {y}): {source}");
    Error::BlockIo { x, y, source }
}

fn read_at<F: Read + Seek>(file: &mut F, offset: u64, buf: &mut [u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buf)
}

/// A single unretried write; anything short is a failure
fn write_at<F: Write + Seek>(file: &mut F, offset: u64, buf: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    let written = file.write(buf)?;
    if written == buf.len() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::WriteZero,
            "short write, block not persisted",
        ))
    }
}

fn write_all_at<F: Write>(file: &mut F, buf: &[u8]) -> io::Result<()> {
    file.write_all(buf)
}
