//! Verdis CLI - cloud masking and vegetation index tooling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use verdis_algorithms::imagery::{evi, ndvi, EviParams};
use verdis_algorithms::masking::{
    add_cloud_shadow_mask, CloudMaskConfig, BAND_CLOUDMASK, BAND_NIR, BAND_SCL,
};
use verdis_core::io::{read_geotiff, write_geotiff};
use verdis_core::raster::{Image, PropertyValue, Raster, PROP_MEAN_SOLAR_AZIMUTH};
use verdis_pipeline::monthly_windows;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "verdis")]
#[command(author, version, about = "Cloud-free vegetation index time series", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the monthly aggregation windows for a span of years
    Windows {
        /// Comma-separated consecutive years, e.g. 2019,2020,2021
        #[arg(short, long)]
        years: String,
    },
    /// Build a cloud/shadow mask from NIR, scene classification and
    /// cloud probability rasters
    Mask {
        /// NIR (B8) reflectance raster
        #[arg(long)]
        nir: PathBuf,
        /// Scene classification raster
        #[arg(long)]
        scl: PathBuf,
        /// Cloud probability raster (percent)
        #[arg(long)]
        probability: PathBuf,
        /// Mean solar azimuth angle of the scene, degrees
        #[arg(long)]
        azimuth: f64,
        /// Output cloudmask raster
        #[arg(short, long)]
        output: PathBuf,
        /// Cloud probability threshold (percent)
        #[arg(long, default_value = "50.0")]
        prob_threshold: f64,
        /// Mask buffer distance in meters
        #[arg(long, default_value = "100.0")]
        buffer: f64,
    },
    /// Vegetation index derivation
    Index {
        #[command(subcommand)]
        index: IndexCommands,
    },
}

#[derive(Subcommand)]
enum IndexCommands {
    /// NDVI from NIR and red rasters
    Ndvi {
        /// NIR band raster
        #[arg(long)]
        nir: PathBuf,
        /// Red band raster
        #[arg(long)]
        red: PathBuf,
        /// Output raster
        #[arg(short, long)]
        output: PathBuf,
    },
    /// EVI from NIR, red and blue rasters
    Evi {
        /// NIR band raster
        #[arg(long)]
        nir: PathBuf,
        /// Red band raster
        #[arg(long)]
        red: PathBuf,
        /// Blue band raster
        #[arg(long)]
        blue: PathBuf,
        /// Output raster
        #[arg(short, long)]
        output: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_band(path: &PathBuf) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster = read_geotiff(path).context("Failed to read raster")?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn write_result(raster: &Raster<f64>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_years(s: &str) -> Result<Vec<i32>> {
    s.split(',')
        .map(|y| {
            y.trim()
                .parse::<i32>()
                .with_context(|| format!("Invalid year: {}", y))
        })
        .collect()
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Windows ──────────────────────────────────────────────────
        Commands::Windows { years } => {
            let years = parse_years(&years)?;
            let windows = monthly_windows(&years)?;

            println!("{} monthly windows:", windows.len());
            for window in &windows {
                println!(
                    "  {}  {} .. {}  t={:.3}",
                    window.label(),
                    window.start,
                    window.end,
                    window.years_since_epoch()
                );
            }
        }

        // ── Mask ─────────────────────────────────────────────────────
        Commands::Mask {
            nir,
            scl,
            probability,
            azimuth,
            output,
            prob_threshold,
            buffer,
        } => {
            let start = Instant::now();

            let nir_band = read_band(&nir)?;
            let scl_band = read_band(&scl)?;
            let prob_band = read_band(&probability)?;

            let image = Image::from_band(BAND_NIR, nir_band)
                .with_band(BAND_SCL, scl_band)?
                .with_property(PROP_MEAN_SOLAR_AZIMUTH, PropertyValue::Float(azimuth));

            let cfg = CloudMaskConfig {
                cloud_prob_threshold: prob_threshold,
                buffer,
                ..CloudMaskConfig::default()
            };

            let pb = spinner("Building cloud/shadow mask...");
            let masked = add_cloud_shadow_mask(&image, &prob_band, &cfg)?;
            pb.finish_and_clear();

            write_result(masked.band(BAND_CLOUDMASK)?, &output)?;
            done("Cloud mask", &output, start.elapsed());
        }

        // ── Index ────────────────────────────────────────────────────
        Commands::Index { index } => match index {
            IndexCommands::Ndvi { nir, red, output } => {
                let start = Instant::now();
                let nir_band = read_band(&nir)?;
                let red_band = read_band(&red)?;

                let result = ndvi(&nir_band, &red_band)?;
                write_result(&result, &output)?;
                done("NDVI", &output, start.elapsed());
            }
            IndexCommands::Evi {
                nir,
                red,
                blue,
                output,
            } => {
                let start = Instant::now();
                let nir_band = read_band(&nir)?;
                let red_band = read_band(&red)?;
                let blue_band = read_band(&blue)?;

                let result = evi(&nir_band, &red_band, &blue_band, EviParams::default())?;
                write_result(&result, &output)?;
                done("EVI", &output, start.elapsed());
            }
        },
    }

    Ok(())
}
