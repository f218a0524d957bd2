use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use teethwhiten::detection::blending::side_by_side;
use teethwhiten::imageio::{load_image, save_image};
use teethwhiten::{FsDiagnostics, TeethWhitener, WhitenConfig};

#[derive(Parser)]
#[command(name = "teethwhiten")]
#[command(about = "Detect the mouth in a photo and whiten the teeth")]
struct Cli {
    /// Path to input image file
    #[arg(short, long, value_name = "PATH")]
    image: PathBuf,

    /// Where to write the result
    #[arg(short, long, value_name = "PATH", default_value = "whitened.png")]
    output: PathBuf,

    /// Write the original and the whitened photo next to each other
    #[arg(long)]
    side_by_side: bool,

    /// Directory holding the cascade classifier XML files
    #[arg(long, value_name = "DIR", default_value = ".")]
    models: PathBuf,

    /// JSON file overriding the default thresholds
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save face/mouth crops and step outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "teethwhiten=debug" } else { "teethwhiten=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(env_filter)
        .init();

    let config = match &args.config {
        Some(path) => WhitenConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => WhitenConfig::default(),
    };

    info!(image = %args.image.display(), "loading image");
    let photo = load_image(&args.image)?;
    info!(width = photo.width(), height = photo.height(), "image loaded");

    let mut whitener = TeethWhitener::load(&args.models, config)
        .with_context(|| format!("Failed to load classifiers from {}", args.models.display()))?;

    // Enable debug mode if requested
    if let Some(debug_dir) = &args.debug_out {
        whitener = whitener.with_diagnostics(Arc::new(FsDiagnostics::new(debug_dir)?));
    }

    let outcome = whitener.whiten(&photo)?;

    let result = if args.side_by_side {
        side_by_side(&photo, &outcome.image)
    } else {
        outcome.image
    };
    save_image(&result, &args.output)?;

    println!("\n=== Teeth Whitening Results ===");
    println!("Mouths whitened: {}", outcome.regions.len());
    for (i, region) in outcome.regions.iter().enumerate() {
        let b = &region.bbox;
        if region.contour_found {
            println!(
                "  Mouth {} at ({}, {}) {}x{} - {} yellow pixels, {} whitened",
                i + 1,
                b.x,
                b.y,
                b.width,
                b.height,
                region.mask_pixels,
                region.whitened_pixels
            );
        } else {
            println!(
                "  Mouth {} at ({}, {}) {}x{} - no teeth found, left unchanged",
                i + 1,
                b.x,
                b.y,
                b.width,
                b.height
            );
        }
    }
    println!("Saved to {}", args.output.display());

    Ok(())
}
