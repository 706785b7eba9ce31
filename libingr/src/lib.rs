//! # libingr
//!
//!
//! This library provides datatypes and i/o functionality for the Intergraph
//! raster file format, an older binary grid format produced by Intergraph
//! scanning and mapping software and still encountered under extensions such
//! as `.cot`, `.rle` and `.rgb`.
//!
//! A file is a chain of bands. Each band starts with two packed little-endian
//! header blocks (a 512-byte primary header and a 256-byte secondary header)
//! followed by an optional color table, then the pixel data, stored either as
//! plain scanline records or behind a tile directory. The secondary header's
//! catenation pointer links one band to the next.
//!
//! It aims to provide a minimal, low-level API to build upon. The raw header
//! types expose every on-disk field; the responsibility of writing "valid"
//! files beyond what [`IngrDataset::create`] produces is placed on the users
//! of this crate.
//!
//! ### Limitations
//!
//! The format defines a large family of compressed block encodings
//! (run-length variants, CCITT G4, the JPEG family, adaptive RGB and
//! grayscale). This library currently recognizes these but does **not**
//! decode them: opening such a file succeeds and reading a block fails with
//! [`Error::UnimplementedCodec`]. Only the raw pixel formats can be read and
//! written. Tiled files can be read but not created.
//!
//! ### Usage
//!
//! #### Creating and reading back a dataset
//!
//! ```rust
//! use std::io::Cursor;
//! use libingr::{CreateOptions, IngrDataset};
//!
//! fn main() -> anyhow::Result<()> {
//!     let options = CreateOptions::builder().width(4).height(2).build();
//!     let mut dataset = IngrDataset::create(Cursor::new(Vec::new()), "demo", &options)?;
//!     dataset.write_band(1, &[0, 1, 2, 3, 4, 5, 6, 7])?;
//!     dataset.flush()?;
//!
//!     let mut reopened = IngrDataset::from_reader(dataset.into_inner(), "demo")?;
//!     assert_eq!(reopened.read_band(1)?, vec![0, 1, 2, 3, 4, 5, 6, 7]);
//!     Ok(())
//! }
//! ```
//!
//! #### Reading every band of an existing file
//!
//! ```rust,no_run
//! use libingr::IngrDataset;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut dataset = IngrDataset::from_file("chart.rgb")?;
//!     for band in 1..=dataset.band_count() {
//!         let pixels = dataset.read_band(band)?;
//!         println!("band {band}: {} bytes", pixels.len());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

mod error;
/// Module containing types for Intergraph raster datasets
pub mod raster;
mod serde;

pub use error::Error;
pub use raster::band::{BandAccessor, Interleaving};
pub use raster::color::{ColorEntry, ColorTable, VltEntry};
pub use raster::format::{
    lookup_data_type, lookup_display_name, resolve_format_for_write, Format, PixelType,
};
pub use raster::header::{
    geotransform_to_transform, transform_to_geotransform, BandValue, ColorTableKind, HeaderOne,
    HeaderTwo, HeaderTypeWord, ScanlineOrientation,
};
pub use raster::tile::{tile_index, TileDirectory, TileItem, TileState};
pub use raster::{is_ingr, CreateOptions, IngrDataset};

/// Header kind tag of raster data headers, the upper byte of the bit-packed
/// type word
const HEADER_KIND: u8 = 9;
/// Format version carried by headers this library writes
const HEADER_VERSION: u8 = 8;
/// Dimensionality flag for 2D raster data
const HEADER_2D: u8 = 0;
