use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use nanocorr_core::align::{apply_translation_masks, ChannelAlignmentEstimator};
use nanocorr_core::config::{AlignmentConfig, LocatorConfig};
use nanocorr_core::io::image_io::{load_image, save_float_stack, save_map_stack};
use ndarray::{Array2, Axis};

#[derive(Args)]
pub struct AlignArgs {
    /// One image per channel, all the same size
    #[arg(required = true, num_args = 2..)]
    pub channels: Vec<PathBuf>,

    /// Index of the channel the others are aligned to
    #[arg(long, default_value = "0")]
    pub ref_channel: usize,

    /// Largest shift in pixels searched along each axis
    #[arg(long, default_value = "10")]
    pub max_shift: usize,

    /// Number of blocks along each image axis
    #[arg(long, default_value = "4")]
    pub blocks_per_axis: usize,

    /// Blocks with a lower peak similarity keep a zero shift
    #[arg(long, default_value = "0.5")]
    pub min_similarity: f32,

    /// Sub-pixel optimizer iteration budget
    #[arg(long, default_value = "1000")]
    pub max_iterations: usize,

    /// Also write the channels resampled by their masks
    #[arg(long)]
    pub apply: bool,

    /// Output path; masks and similarity maps are written as float TIFF stacks
    /// with suffixed names, corrected channels as one image per channel
    #[arg(short, long, default_value = "alignment.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &AlignArgs) -> Result<()> {
    let images = args
        .channels
        .iter()
        .map(|p| load_image(p).with_context(|| format!("Failed to load {}", p.display())))
        .collect::<Result<Vec<Array2<f32>>>>()?;

    let dim = images[0].dim();
    if let Some((i, img)) = images.iter().enumerate().find(|(_, img)| img.dim() != dim) {
        bail!(
            "Channel {} is {}x{}, expected {}x{}",
            i,
            img.ncols(),
            img.nrows(),
            dim.1,
            dim.0
        );
    }
    let views: Vec<_> = images.iter().map(|img| img.view()).collect();
    let channels = ndarray::stack(Axis(0), &views)?;

    let config = AlignmentConfig {
        max_shift: args.max_shift,
        blocks_per_axis: args.blocks_per_axis,
        min_similarity: args.min_similarity,
        locator: LocatorConfig {
            max_iterations: args.max_iterations,
        },
    };

    println!("Channel alignment");
    println!("  Channels:  {} x {}x{}", images.len(), dim.1, dim.0);
    println!("  Reference: {}", args.ref_channel);
    println!(
        "  Blocks:    {}x{}, max shift {} px",
        config.blocks_per_axis, config.blocks_per_axis, config.max_shift
    );
    println!();

    let pb = ProgressBar::new(images.len().saturating_sub(1) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:12} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Channels");

    let estimator = ChannelAlignmentEstimator::new(config);
    let alignment = estimator.estimate_with_progress(&channels, args.ref_channel, |done| {
        pb.set_position(done as u64)
    })?;
    pb.finish_with_message("Done");

    for (channel, shifts) in alignment.block_shifts.iter().enumerate() {
        if shifts.is_empty() {
            continue;
        }
        let n = shifts.len() as f64;
        let mean_dy = shifts.iter().map(|s| s.dy).sum::<f64>() / n;
        let mean_dx = shifts.iter().map(|s| s.dx).sum::<f64>() / n;
        println!(
            "  Channel {}: mean shift dy={:+.3} dx={:+.3}",
            channel, mean_dy, mean_dx
        );
    }

    let masks_path = suffixed(&args.output, "mask").with_extension("tiff");
    let ccm_path = suffixed(&args.output, "ccm").with_extension("tiff");
    save_float_stack(&alignment.translation_masks, &masks_path)?;
    save_float_stack(&alignment.ccms, &ccm_path)?;
    println!("\nMasks saved to {}", masks_path.display());
    println!("Similarity maps saved to {}", ccm_path.display());

    if args.apply {
        let corrected = apply_translation_masks(&channels, &alignment.translation_masks)?;
        let corrected_path = suffixed(&args.output, "aligned");
        save_map_stack(&corrected, &corrected_path)?;
        println!("Aligned channels saved next to {}", corrected_path.display());
    }

    Ok(())
}

/// `dir/name.ext` -> `dir/name_<suffix>.ext`
fn suffixed(path: &std::path::Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("alignment");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("tiff");
    path.with_file_name(format!("{}_{}.{}", stem, suffix, ext))
}
