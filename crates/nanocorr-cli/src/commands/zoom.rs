use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use nanocorr_core::io::image_io::{load_image, save_map};
use nanocorr_core::transform::magnify::fourier_zoom;

#[derive(Args)]
pub struct ZoomArgs {
    /// Input image file (TIFF or PNG)
    pub file: PathBuf,

    /// Magnification factor (>= 1)
    #[arg(short, long, default_value = "2.0")]
    pub factor: f64,

    /// Output file path
    #[arg(short, long, default_value = "zoomed.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &ZoomArgs) -> Result<()> {
    let image = load_image(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let zoomed = fourier_zoom(&image, args.factor)?;
    println!(
        "Zoomed {}x{} -> {}x{}",
        image.ncols(),
        image.nrows(),
        zoomed.ncols(),
        zoomed.nrows()
    );

    save_map(&zoomed, &args.output)?;
    println!("Saved to {}", args.output.display());

    Ok(())
}
