use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use nanocorr_core::config::ReconstructionConfig;
use nanocorr_core::io::image_io::{load_frame_stack, save_map, save_map_stack};
use nanocorr_core::temporal::{compute, compute_windowed_with_progress, CorrelationKind};
use tracing::info;

#[derive(Args)]
pub struct CorrelateArgs {
    /// Directory of frames (TIFF/PNG/JPEG), read in file-name order.
    /// Overrides the config's `input` when both are given.
    #[arg(required_unless_present = "config")]
    pub dir: Option<PathBuf>,

    /// Reconstruction config file (TOML); replaces the options below
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Correlation kind (MAX, MEAN, PAIRWISE_PRODUCT_SUM, CUMULANT2-4, AVG, VAR, TAC2)
    #[arg(short, long, default_value = "CUMULANT2")]
    pub kind: String,

    /// Integrate cumulants over successively binned lag times
    #[arg(long)]
    pub integrate_lag_times: bool,

    /// Produce one map per window of this many frames
    #[arg(long)]
    pub frames_per_window: Option<usize>,

    /// Output file path
    #[arg(short, long, default_value = "correlation.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &CorrelateArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        config_from_toml(&contents, args.dir.as_deref())?
    } else {
        build_config_from_args(args)?
    };

    let stack = load_frame_stack(&config.input)
        .with_context(|| format!("Failed to load frames from {}", config.input.display()))?;
    info!(frames = stack.n_frames(), kind = %config.correlation, "Loaded frame stack");

    println!("Temporal correlation");
    println!("  Input:    {}", config.input.display());
    println!(
        "  Frames:   {} x {}x{}",
        stack.n_frames(),
        stack.width(),
        stack.height()
    );
    println!("  Kind:     {}", config);
    println!("  Output:   {}", config.output.display());
    println!();

    match config.frames_per_window {
        Some(frames_per_window) => {
            let n_windows = (stack.n_frames() / frames_per_window.max(1)).max(1);
            let pb = ProgressBar::new(n_windows as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg:12} [{bar:40}] {pos}/{len}")?
                    .progress_chars("=> "),
            );
            pb.set_message("Windows");

            let maps = compute_windowed_with_progress(
                &stack,
                config.correlation,
                config.integrate_lag_times,
                frames_per_window,
                |done| pb.set_position(done as u64),
            )?;
            pb.finish_with_message("Done");

            let written = save_map_stack(&maps, &config.output)?;
            println!("\nSaved {} maps next to {}", written.len(), config.output.display());
        }
        None => {
            let map = compute(&stack, config.correlation, config.integrate_lag_times);
            save_map(&map, &config.output)?;
            println!("Saved to {}", config.output.display());
        }
    }

    Ok(())
}

/// Parse a TOML config; `dir`, when given, replaces its input directory.
fn config_from_toml(contents: &str, dir: Option<&Path>) -> Result<ReconstructionConfig> {
    let mut config: ReconstructionConfig =
        toml::from_str(contents).context("Invalid reconstruction config")?;
    if let Some(dir) = dir {
        config.input = dir.to_path_buf();
    }
    Ok(config)
}

fn build_config_from_args(args: &CorrelateArgs) -> Result<ReconstructionConfig> {
    let Some(ref dir) = args.dir else {
        bail!("A frame directory is required without --config");
    };
    let correlation: CorrelationKind = args.kind.parse()?;
    Ok(ReconstructionConfig {
        input: dir.clone(),
        output: args.output.clone(),
        correlation,
        integrate_lag_times: args.integrate_lag_times,
        frames_per_window: args.frames_per_window,
    })
}
