use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use nanocorr_core::align::{find_peak, locate_max_with};
use nanocorr_core::config::LocatorConfig;
use nanocorr_core::io::image_io::load_image;

#[derive(Args)]
pub struct LocateArgs {
    /// Similarity surface image (TIFF or PNG)
    pub file: PathBuf,

    /// Optimizer iteration budget
    #[arg(long, default_value = "1000")]
    pub max_iterations: usize,
}

pub fn run(args: &LocateArgs) -> Result<()> {
    let surface = load_image(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let (row, col, value) = find_peak(&surface);
    let config = LocatorConfig {
        max_iterations: args.max_iterations,
    };
    let peak = locate_max_with(&surface, &config);

    println!("Surface:     {}x{}", surface.ncols(), surface.nrows());
    println!("Grid max:    ({}, {}) = {:.4}", row, col, value);
    println!("Sub-pixel:   ({:.4}, {:.4})", peak.row, peak.col);

    Ok(())
}
