//! Conversions between Intergraph raster files and common image formats,
//! plus a metadata dump

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use image::{codecs::png::PngEncoder, ImageEncoder};
use libingr::{ColorEntry, CreateOptions, IngrDataset, PixelType};
use tracing::{debug, info, instrument};

/// Prints the metadata of an Intergraph raster file
#[instrument]
pub fn ingr_info(ingr_file: &Path) -> Result<()> {
    let dataset = IngrDataset::from_file(ingr_file)?;
    println!("{}", dataset.name());
    println!("  size: {}x{} pixels", dataset.width(), dataset.height());
    let gt = dataset.geotransform();
    println!(
        "  geotransform: origin ({}, {}), pixel size ({}, {})",
        gt[0], gt[3], gt[1], gt[5]
    );
    println!("  bands: {}", dataset.band_count());
    for band in dataset.bands() {
        let (block_width, block_height) = band.block_size();
        println!(
            "  band {}: {} ({:?}), {block_width}x{block_height} blocks{}",
            band.band_number(),
            band.format(),
            band.pixel_type(),
            if band.tile_directory().is_some() {
                ", tiled"
            } else {
                ""
            }
        );
        println!("    range: {} to {}", band.minimum(), band.maximum());
        if let Some(table) = band.color_table() {
            println!("    color table: {} entries", table.len());
        }
    }
    Ok(())
}

#[instrument]
pub fn ingr_to_image(ingr_file: &Path, output_name: &Path) -> Result<()> {
    let mut dataset = IngrDataset::from_file(ingr_file)?;
    debug!("Read ingr dataset from file");

    for band in dataset.bands() {
        if band.pixel_type() != PixelType::Byte {
            bail!(
                "band {} holds {:?} pixels, only 8-bit bands can be exported",
                band.band_number(),
                band.pixel_type()
            );
        }
    }

    let width = dataset.width();
    let height = dataset.height();
    let (pixels, color_type) = match dataset.band_count() {
        3 => {
            let red = dataset.read_band(1)?;
            let green = dataset.read_band(2)?;
            let blue = dataset.read_band(3)?;
            let mut rgb = Vec::with_capacity(red.len() * 3);
            for i in 0..red.len() {
                rgb.push(red[i]);
                rgb.push(green[i]);
                rgb.push(blue[i]);
            }
            (rgb, image::ExtendedColorType::Rgb8)
        }
        1 => {
            let indexes = dataset.read_band(1)?;
            match dataset.band(1)?.color_table() {
                Some(table) if !table.is_empty() => {
                    let entries = table.entries().to_vec();
                    debug!("Applying a {} entry color table", entries.len());
                    let mut rgb = Vec::with_capacity(indexes.len() * 3);
                    for index in indexes {
                        let entry = entries
                            .get(usize::from(index))
                            .copied()
                            .unwrap_or(ColorEntry::OPAQUE_BLACK);
                        rgb.push(entry.r);
                        rgb.push(entry.g);
                        rgb.push(entry.b);
                    }
                    (rgb, image::ExtendedColorType::Rgb8)
                }
                _ => (indexes, image::ExtendedColorType::L8),
            }
        }
        n => bail!("cannot export a {n} band dataset as an image"),
    };

    let output = File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output_name)?;

    info!("Writing image to {}", output_name.display());
    let encoder = PngEncoder::new(output);
    encoder.write_image(&pixels, width, height, color_type)?;
    info!("Successfully wrote image to {}", output_name.display());
    Ok(())
}

#[instrument]
pub fn image_to_ingr(image_file: &Path, output_name: &Path) -> Result<()> {
    let img = image::open(image_file)
        .with_context(|| format!("open image {}", image_file.display()))?;
    let (width, height) = (img.width(), img.height());
    debug!("Read a {width}x{height} image");

    if img.color().has_color() {
        let rgb = img.to_rgb8();
        let options = CreateOptions::builder()
            .width(width)
            .height(height)
            .bands(3)
            .compression("Uncompressed 24bit".to_owned())
            .build();
        let mut dataset = IngrDataset::create_file(output_name, &options)?;
        for band in 1..=3usize {
            let channel: Vec<u8> = rgb.pixels().map(|p| p[band - 1]).collect();
            dataset.write_band(band, &channel)?;
        }
        dataset.flush()?;
    } else {
        let gray = img.to_luma8();
        let options = CreateOptions::builder().width(width).height(height).build();
        let mut dataset = IngrDataset::create_file(output_name, &options)?;
        dataset.write_band(1, gray.as_raw())?;
        dataset.flush()?;
    }
    info!("Successfully wrote {}", output_name.display());
    Ok(())
}
