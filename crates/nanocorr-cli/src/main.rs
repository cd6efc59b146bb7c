mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nanocorr", about = "Temporal correlation and sub-pixel alignment for fluorescence image series")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce a directory of frames to a temporal correlation map
    Correlate(commands::correlate::CorrelateArgs),
    /// Print the sub-pixel maximum of an image surface
    Locate(commands::locate::LocateArgs),
    /// Estimate translation masks aligning channels to a reference
    Align(commands::align::AlignArgs),
    /// Magnify an image by Fourier zero-padding
    Zoom(commands::zoom::ZoomArgs),
    /// Print or save a default reconstruction config (TOML)
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Correlate(args) => commands::correlate::run(args),
        Commands::Locate(args) => commands::locate::run(args),
        Commands::Align(args) => commands::align::run(args),
        Commands::Zoom(args) => commands::zoom::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
