use gridr::{image_to_ingr, ingr_info, ingr_to_image};
use std::path::PathBuf;
use tracing::{info, Level};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

#[cfg(not(debug_assertions))]
const DEFAULT_DEBUG_LEVEL: u8 = 1;
#[cfg(debug_assertions)]
const DEFAULT_DEBUG_LEVEL: u8 = 99;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Turn debugging information on
    #[arg(short, long, default_value_t = DEFAULT_DEBUG_LEVEL, action = clap::ArgAction::Count)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// prints the metadata of an Intergraph raster file
    #[command(name = "info")]
    Info {
        /// The Intergraph raster file
        ingr_file: PathBuf,
    },

    /// converts an Intergraph raster file to a different image format
    #[command(name = "ingrimg")]
    IngrToImage {
        /// The Intergraph raster file
        ingr_file: PathBuf,

        /// The output file name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// converts a PNG image to an Intergraph raster file
    #[command(name = "imgingr")]
    ImageToIngr {
        /// The image
        img_file: PathBuf,
        /// The output file name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_file(true)
        .with_line_number(true)
        .init();

    match cli.command {
        Commands::Info { ingr_file } => {
            ingr_info(&ingr_file)?;
        }
        Commands::IngrToImage { ingr_file, output } => {
            let output = match output {
                Some(o) => o,
                None => derive_output(&ingr_file, "png")?,
            };
            ingr_to_image(&ingr_file, &output)?;
        }
        Commands::ImageToIngr { img_file, output } => {
            let output = match output {
                Some(o) => o,
                None => derive_output(&img_file, "cot")?,
            };
            image_to_ingr(&img_file, &output)?;
        }
    }
    Ok(())
}

fn derive_output(input: &PathBuf, suffix: &str) -> Result<PathBuf> {
    let mut output = PathBuf::new();
    let Some(dir) = input.parent() else {
        bail!("Invalid input file");
    };
    let Some(Some(filename)) = input.file_stem().map(|os| os.to_str()) else {
        bail!("Invalid input file");
    };
    output.push(dir);
    output.push(format!("{filename}.{suffix}"));
    info!("output name: {}", output.display());
    Ok(output)
}
