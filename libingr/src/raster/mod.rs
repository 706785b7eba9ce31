#![allow(clippy::module_name_repetitions)]

/// Per-band block access
pub mod band;
/// Color table representations and conversions
pub mod color;
pub(crate) mod decode;
/// The on-disk format catalog
pub mod format;
/// The per-band header blocks and georeferencing conversions
pub mod header;
/// Tile directories for tiled band storage
pub mod tile;

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use bon::Builder;
use tracing::{debug, info};

use crate::error::Error;
use crate::serde::{SIZEOF_CTAB, SIZEOF_HDR1, SIZEOF_HDR2, SIZEOF_VLT};
use band::{BandAccessor, Interleaving};
use color::ColorTable;
use decode::decoder_for;
use format::{lookup_display_name, resolve_format_for_write, Format, PixelType};
use header::{
    geotransform_to_transform, transform_to_geotransform, ColorTableKind, HeaderOne, HeaderTwo,
};
use tile::TileDirectory;

/// Hard cap on the number of band headers followed through the catenation
/// chain; a chain longer than this is treated as corrupt
const BAND_CHAIN_LIMIT: usize = 65_536;

/// Sanity cap on the entry count of a variable-length color table
const VLT_ENTRY_LIMIT: u32 = 65_536;

/// The unit north-up geotransform used when a file stores no usable
/// georeferencing
const UNIT_GEOTRANSFORM: [f64; 6] = [0.0, 1.0, 0.0, 0.0, 0.0, -1.0];

/// Checks whether a byte prefix looks like an Intergraph raster band header
///
/// Needs at least the leading four bytes: the bit-packed type word must
/// carry the raster header kind tag and the announced header region must be
/// a whole number of 512-byte blocks.
#[must_use]
pub fn is_ingr(bytes: &[u8]) -> bool {
    if bytes.len() < 4 {
        return false;
    }
    let type_word = header::HeaderTypeWord::from_word(u16::from_le_bytes([bytes[0], bytes[1]]));
    let words_to_follow = u16::from_le_bytes([bytes[2], bytes[3]]);
    type_word.kind == crate::HEADER_KIND && (u32::from(words_to_follow) + 2) % 256 == 0
}

/// The formats whose blocks are stored as raw pixels and can be read and
/// written without a codec
const fn is_raw_format(format: Format) -> bool {
    matches!(
        format,
        Format::ByteInteger
            | Format::WordIntegers
            | Format::Integers32Bit
            | Format::FloatingPoint32Bit
            | Format::FloatingPoint64Bit
            | Format::Complex
            | Format::DoublePrecisionComplex
            | Format::Uncompressed24bit
    )
}

/// Number of in-memory bands one stored band of this format fans out to
const fn component_count(format: Format) -> usize {
    match format {
        Format::Uncompressed24bit | Format::AdaptiveRgb | Format::JpegRgb => 3,
        _ => 1,
    }
}

/// Parameters for creating a new dataset
#[derive(Debug, Clone, Builder)]
pub struct CreateOptions {
    /// Raster width in pixels
    pub width: u32,
    /// Raster height in lines
    pub height: u32,
    /// Number of bands; an RGB compression name requires a multiple of 3
    #[builder(default = 1)]
    pub bands: usize,
    /// Pixel type of every band; mixed-type datasets cannot be created
    #[builder(default)]
    pub pixel_type: PixelType,
    /// Compression name as listed among the format display names; empty or
    /// `"None"` selects the uncompressed format for the pixel type
    #[builder(default)]
    pub compression: String,
    /// Color table written with the first band
    pub color_table: Option<ColorTable>,
    /// World georeferencing; defaults to the unit north-up transform
    pub geotransform: Option<[f64; 6]>,
}

/// An open Intergraph raster dataset: one file holding a chain of band
/// headers and their pixel data
///
/// Bands are numbered from 1. Every stored RGB band fans out into three
/// component bands, so the band count is always in terms of single
/// components.
#[derive(Debug)]
pub struct IngrDataset<F> {
    file: F,
    name: String,
    bands: Vec<BandAccessor>,
    geotransform: [f64; 6],
}

impl<F> IngrDataset<F> {
    /// A name for the dataset, usually the path it was opened from
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consumes the dataset and returns the underlying file handle
    pub fn into_inner(self) -> F {
        self.file
    }

    /// Number of component bands
    #[must_use]
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// All component bands in chain order
    #[must_use]
    pub fn bands(&self) -> &[BandAccessor] {
        &self.bands
    }

    /// The accessor for a 1-based band number
    ///
    /// # Errors
    ///
    /// Errors if `band` is 0 or past the last band
    pub fn band(&self, band: usize) -> Result<&BandAccessor, Error> {
        band.checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or(Error::BandOutOfRange { band })
    }

    /// The mutable accessor for a 1-based band number, for metadata updates
    /// such as [`BandAccessor::set_value_range`]
    ///
    /// # Errors
    ///
    /// Errors if `band` is 0 or past the last band
    pub fn band_mut(&mut self, band: usize) -> Result<&mut BandAccessor, Error> {
        band.checked_sub(1)
            .and_then(|i| self.bands.get_mut(i))
            .ok_or(Error::BandOutOfRange { band })
    }

    /// Raster width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.bands.first().map_or(0, BandAccessor::width)
    }

    /// Raster height in lines
    #[must_use]
    pub fn height(&self) -> u32 {
        self.bands.first().map_or(0, BandAccessor::height)
    }

    /// The dataset's affine geotransform, pixel-corner convention
    #[must_use]
    pub const fn geotransform(&self) -> [f64; 6] {
        self.geotransform
    }

    /// Replaces the dataset's georeferencing on every band; becomes durable
    /// at the next header flush
    pub fn set_geotransform(&mut self, geotransform: [f64; 6]) {
        self.geotransform = geotransform;
        let matrix = geotransform_to_transform(&geotransform);
        for accessor in &mut self.bands {
            accessor.set_transformation_matrix(matrix);
        }
    }

    /// Replaces one band's color table; becomes durable at the next header
    /// flush
    ///
    /// # Errors
    ///
    /// Errors if `band` is out of range
    pub fn set_color_table(&mut self, band: usize, table: ColorTable) -> Result<(), Error> {
        self.band_mut(band)?.set_color_table(table);
        Ok(())
    }
}

impl<F: Read + Seek> IngrDataset<F> {
    /// Opens a dataset from a readable, seekable source
    ///
    /// Walks the whole band chain up front: every band header is decoded
    /// and validated, tile directories are loaded and color tables
    /// converted, so block reads afterwards fail only on I/O or codec
    /// grounds.
    ///
    /// # Errors
    ///
    /// Errors if the source is not an Intergraph raster file, announces a
    /// format this library cannot read, or the band chain is cyclic or
    /// truncated
    pub fn from_reader(file: F, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut dataset = Self {
            file,
            name,
            bands: Vec::new(),
            geotransform: UNIT_GEOTRANSFORM,
        };

        let mut visited: HashSet<u64> = HashSet::new();
        let mut offset = 0u64;
        loop {
            ensure!(
                visited.insert(offset),
                "band chain loops back to offset {offset} in {}",
                dataset.name
            );
            ensure!(
                dataset.bands.len() < BAND_CHAIN_LIMIT,
                "band chain exceeds {BAND_CHAIN_LIMIT} bands in {}",
                dataset.name
            );
            let next = dataset
                .load_band(offset)
                .with_context(|| format!("band header at offset {offset} of {}", dataset.name))?;
            match next {
                Some(next_offset) => offset = next_offset,
                None => break,
            }
        }

        let first = &dataset.bands[0];
        dataset.geotransform =
            transform_to_geotransform(&first.header_one().transformation_matrix);
        info!(
            "opened {}: {}x{} pixels, {} band(s)",
            dataset.name,
            dataset.width(),
            dataset.height(),
            dataset.band_count()
        );
        Ok(dataset)
    }

    /// Reads, validates and registers the band stored at `band_start`,
    /// returning the offset of the next band in the chain
    fn load_band(&mut self, band_start: u64) -> Result<Option<u64>> {
        self.file.seek(SeekFrom::Start(band_start))?;
        let mut block = vec![0u8; SIZEOF_HDR1];
        self.file.read_exact(&mut block)?;
        let header_one = HeaderOne::decode(&block)?;

        ensure!(
            header_one.header_type.kind == crate::HEADER_KIND,
            "not an Intergraph raster header (type tag {})",
            header_one.header_type.kind
        );
        ensure!(
            (u32::from(header_one.words_to_follow) + 2) % 256 == 0,
            "header region of {} words is not a whole number of 512-byte blocks",
            header_one.words_to_follow
        );
        ensure!(
            (1..=3).contains(&header_one.grid_file_version),
            "unsupported grid file version {}",
            header_one.grid_file_version
        );
        ensure!(
            header_one.pixels_per_line > 0 && header_one.number_of_lines > 0,
            "degenerate raster dimensions {}x{}",
            header_one.pixels_per_line,
            header_one.number_of_lines
        );

        let mut block = vec![0u8; SIZEOF_HDR2];
        self.file.read_exact(&mut block)?;
        let header_two = HeaderTwo::decode(&block)?;

        let color_table = self.load_color_table(&header_two)?;

        let stored_format = Format::from_code(header_one.data_type_code).with_context(|| {
            format!(
                "unknown format code {} ({})",
                header_one.data_type_code,
                lookup_display_name(header_one.data_type_code)
            )
        })?;

        // Tiled storage hides the effective format in the tile directory
        let (format, tiles) = if stored_format == Format::TiledRasterData {
            let directory = TileDirectory::load(
                &mut self.file,
                band_start + header_one.data_offset(),
                header_one.pixels_per_line,
                header_one.number_of_lines,
            )?;
            let code = directory.data_type_code();
            let format = Format::from_code(code).with_context(|| {
                format!(
                    "unknown tiled format code {code} ({})",
                    lookup_display_name(code)
                )
            })?;
            (format, Some(directory))
        } else {
            (stored_format, None)
        };

        ensure!(
            is_raw_format(format) || decoder_for(format).is_some(),
            "format code {} ({format}) is not readable",
            format.code()
        );
        debug!(
            "band at offset {band_start}: {format}, {} component(s), tiled: {}",
            component_count(format),
            tiles.is_some()
        );

        for component in 1..=component_count(format) {
            let interleaving = Interleaving::for_component(component_count(format), component);
            self.bands.push(BandAccessor::new(
                self.bands.len() + 1,
                header_one.clone(),
                header_two.clone(),
                format,
                interleaving,
                band_start,
                tiles.clone(),
                color_table.clone(),
            ));
        }

        match header_two.catenated_file_pointer {
            0 => Ok(None),
            next => Ok(Some(u64::from(next))),
        }
    }

    /// Reads the color table stored after the two header blocks, if the
    /// band announces one. The file cursor must sit right past the second
    /// header block.
    fn load_color_table(&mut self, header_two: &HeaderTwo) -> Result<Option<ColorTable>> {
        match header_two.color_table_type {
            ColorTableKind::None => Ok(None),
            ColorTableKind::Igds => {
                let mut block = vec![0u8; SIZEOF_CTAB];
                self.file.read_exact(&mut block)?;
                Ok(Some(ColorTable::from_igds(&block)?))
            }
            ColorTableKind::EnvironV => {
                let count = header_two.number_of_ct_entries;
                ensure!(
                    count <= VLT_ENTRY_LIMIT,
                    "implausible color table entry count {count}"
                );
                let mut block = vec![0u8; count as usize * SIZEOF_VLT];
                self.file.read_exact(&mut block)?;
                Ok(Some(ColorTable::from_environ_v_bytes(
                    &block,
                    count as usize,
                )?))
            }
        }
    }

    /// Reads one block of a 1-based band into `dest`
    ///
    /// `dest` must hold exactly [`BandAccessor::block_bytes`] bytes.
    ///
    /// # Errors
    ///
    /// Errors if the band number or buffer size is wrong, the block's
    /// format needs an unimplemented codec, or the read itself fails; an
    /// I/O failure zero-fills `dest` and leaves the dataset usable
    pub fn read_band_block(
        &mut self,
        band: usize,
        block_x: u32,
        block_y: u32,
        dest: &mut [u8],
    ) -> Result<(), Error> {
        let accessor = band
            .checked_sub(1)
            .and_then(|i| self.bands.get_mut(i))
            .ok_or(Error::BandOutOfRange { band })?;
        accessor.read_block(&mut self.file, block_x, block_y, dest)
    }

    /// Reads a whole band into a freshly allocated row-major pixel buffer
    ///
    /// # Errors
    ///
    /// Errors under the same conditions as [`Self::read_band_block`]
    pub fn read_band(&mut self, band: usize) -> Result<Vec<u8>> {
        let accessor = band
            .checked_sub(1)
            .and_then(|i| self.bands.get_mut(i))
            .ok_or(Error::BandOutOfRange { band })?;
        let (block_width, block_height) = accessor.block_size();
        let width = accessor.width() as usize;
        let height = accessor.height() as usize;
        let pixel_bytes = accessor.pixel_type().bytes_per_pixel();

        let mut pixels = vec![0u8; width * height * pixel_bytes];
        let mut block = vec![0u8; accessor.block_bytes()];
        for block_y in 0..accessor.blocks_per_column() {
            for block_x in 0..accessor.blocks_per_row() {
                accessor.read_block(&mut self.file, block_x, block_y, &mut block)?;
                let origin_x = block_x as usize * block_width as usize;
                let origin_y = block_y as usize * block_height as usize;
                let cols = (width - origin_x).min(block_width as usize);
                let rows = (height - origin_y).min(block_height as usize);
                for row in 0..rows {
                    let src = row * block_width as usize * pixel_bytes;
                    let dst = ((origin_y + row) * width + origin_x) * pixel_bytes;
                    pixels[dst..dst + cols * pixel_bytes]
                        .copy_from_slice(&block[src..src + cols * pixel_bytes]);
                }
            }
        }
        Ok(pixels)
    }
}

impl<F: Read + Write + Seek> IngrDataset<F> {
    /// Creates a new dataset in a read-writable, seekable sink
    ///
    /// Writes the full band header chain and reserves the pixel data extent
    /// so the chain can be walked back immediately. All bands share one
    /// pixel type; tiled and compressed layouts cannot be created.
    ///
    /// # Errors
    ///
    /// Errors if the options are inconsistent or the requested compression
    /// resolves to a format this library cannot write
    pub fn create(file: F, name: impl Into<String>, options: &CreateOptions) -> Result<Self> {
        let name = name.into();
        ensure!(
            options.width > 0 && options.height > 0,
            "raster dimensions must be positive, got {}x{}",
            options.width,
            options.height
        );
        ensure!(options.bands >= 1, "at least one band is required");

        let format = resolve_format_for_write(options.pixel_type, &options.compression);
        ensure!(
            is_raw_format(format),
            "format {format} cannot be written, only raw pixel formats can"
        );
        let components = component_count(format);
        ensure!(
            options.bands % components == 0,
            "format {format} stores {components} components per band, got {} band(s)",
            options.bands
        );
        let stored_bands = options.bands / components;

        let geotransform = options.geotransform.unwrap_or(UNIT_GEOTRANSFORM);
        let matrix = geotransform_to_transform(&geotransform);
        let pixel_bytes = format.pixel_type().bytes_per_pixel();
        let record_bytes =
            options.width as u64 * pixel_bytes as u64 * components as u64;
        let band_size = (SIZEOF_HDR1 + SIZEOF_HDR2 + SIZEOF_CTAB) as u64
            + record_bytes * u64::from(options.height);

        let mut dataset = Self {
            file,
            name,
            bands: Vec::new(),
            geotransform,
        };
        for stored in 0..stored_bands {
            let band_start = stored as u64 * band_size;
            let next = if stored + 1 == stored_bands {
                0
            } else {
                u32::try_from(band_start + band_size)
                    .context("dataset too large for the band chain pointers")?
            };

            let header_one = HeaderOne {
                data_type_code: format.code(),
                pixels_per_line: options.width,
                number_of_lines: options.height,
                transformation_matrix: matrix,
                ..HeaderOne::default()
            };
            let header_two = HeaderTwo {
                catenated_file_pointer: next,
                ..HeaderTwo::default()
            };

            for component in 1..=components {
                let interleaving = Interleaving::for_component(components, component);
                let mut accessor = BandAccessor::new(
                    dataset.bands.len() + 1,
                    header_one.clone(),
                    header_two.clone(),
                    format,
                    interleaving,
                    band_start,
                    None,
                    None,
                );
                // every component of the first stored band carries the
                // table, so any of their header flushes persists it
                if stored == 0 {
                    if let Some(table) = &options.color_table {
                        accessor.set_color_table(table.clone());
                    }
                }
                dataset.bands.push(accessor);
            }
        }

        dataset.flush()?;
        // reserve the full pixel extent so every record offset is seekable
        let total = stored_bands as u64 * band_size;
        dataset.file.seek(SeekFrom::Start(total - 1))?;
        dataset.file.write_all(&[0])?;
        info!(
            "created {}: {}x{} pixels, {} {format} band(s)",
            dataset.name, options.width, options.height, options.bands
        );
        Ok(dataset)
    }

    /// Writes one block of a 1-based band from `source`
    ///
    /// Writing the first block of a band flushes its headers beforehand.
    ///
    /// # Errors
    ///
    /// Errors if the band number or buffer size is wrong, the band is
    /// stored tiled or compressed, or the write itself fails
    pub fn write_band_block(
        &mut self,
        band: usize,
        block_x: u32,
        block_y: u32,
        source: &[u8],
    ) -> Result<(), Error> {
        let accessor = band
            .checked_sub(1)
            .and_then(|i| self.bands.get_mut(i))
            .ok_or(Error::BandOutOfRange { band })?;
        accessor.write_block(&mut self.file, block_x, block_y, source)
    }

    /// Writes a whole band from a row-major pixel buffer
    ///
    /// # Errors
    ///
    /// Errors under the same conditions as [`Self::write_band_block`]
    pub fn write_band(&mut self, band: usize, pixels: &[u8]) -> Result<()> {
        let accessor = band
            .checked_sub(1)
            .and_then(|i| self.bands.get_mut(i))
            .ok_or(Error::BandOutOfRange { band })?;
        let record = accessor.block_bytes();
        let rows = accessor.blocks_per_column();
        ensure!(
            pixels.len() == record * rows as usize,
            "band {band} needs {} bytes, got {}",
            record * rows as usize,
            pixels.len()
        );
        for row in 0..rows {
            let line = &pixels[row as usize * record..(row as usize + 1) * record];
            accessor.write_block(&mut self.file, 0, row, line)?;
        }
        Ok(())
    }

    /// Writes every band's headers and color table back to the file
    ///
    /// # Errors
    ///
    /// Errors if a header write fails
    pub fn flush(&mut self) -> Result<()> {
        for accessor in &mut self.bands {
            accessor.flush_header(&mut self.file)?;
        }
        self.file.flush()?;
        Ok(())
    }
}

impl IngrDataset<File> {
    /// Opens a dataset from a file path
    ///
    /// # Errors
    ///
    /// Errors if the file cannot be opened, or under the same conditions as
    /// [`Self::from_reader`]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        let file = File::open(&path).with_context(|| format!("open {name}"))?;
        Self::from_reader(file, name)
    }

    /// Creates a dataset at a file path, truncating anything already there
    ///
    /// # Errors
    ///
    /// Errors if the file cannot be created, or under the same conditions
    /// as [`Self::create`]
    pub fn create_file<P: AsRef<Path>>(path: P, options: &CreateOptions) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        let file = File::options()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("create {name}"))?;
        Self::create(file, name, options)
    }
}
