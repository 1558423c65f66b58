use anyhow::Result;
use clap::Parser;
use tracing::info;

mod audio;
mod color;
mod config;
mod display;
mod renderer;
mod spectrum;

use color::ColorScheme;
use config::Config;
use display::DisplayMode;
use renderer::BarStyle;
use spectrum::ScalingStrategy;

#[derive(Parser, Debug)]
#[command(name = "linespectrum")]
#[command(author, version, about = "Real-time line spectrum visualizer")]
pub struct Args {
    /// Config file path (default: ~/.config/linespectrum/config.toml)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Write a commented default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Display mode: terminal or print
    #[arg(short, long)]
    mode: Option<DisplayMode>,

    /// Number of frequency bars
    #[arg(short, long)]
    bars: Option<usize>,

    /// Lowest frequency shown, in Hz
    #[arg(long)]
    min_frequency: Option<f64>,

    /// Highest frequency shown, in Hz
    #[arg(long)]
    max_frequency: Option<f64>,

    /// Logarithmic frequency axis
    #[arg(long, conflicts_with = "linear_axis")]
    log_axis: bool,

    /// Linear frequency axis
    #[arg(long)]
    linear_axis: bool,

    /// Amplitude scaling
    #[arg(long)]
    scaling: Option<ScalingStrategy>,

    /// Average the bins of each bar instead of taking the maximum
    #[arg(long)]
    average: bool,

    /// Test signal sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// FFT size (power of two)
    #[arg(long)]
    fft_size: Option<usize>,

    /// Test signal channel count
    #[arg(long)]
    channels: Option<usize>,

    /// Bar style
    #[arg(long)]
    style: Option<BarStyle>,

    /// Color scheme
    #[arg(long)]
    colors: Option<ColorScheme>,

    /// Spacing between bars
    #[arg(long)]
    bar_spacing: Option<f64>,

    /// Render ticks per second
    #[arg(long)]
    fps: Option<u32>,

    /// Frames to print in print mode
    #[arg(long)]
    frames: Option<usize>,

    /// Print raw bar values instead of block glyphs (print mode)
    #[arg(long)]
    numeric: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("linespectrum=info".parse()?),
        )
        .init();

    let args = Args::parse();

    if args.init_config {
        let path = Config::init_default_config()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    // Load config: explicit path, then XDG default, then built-in defaults
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_from_default_path().unwrap_or_default(),
    };
    config.merge_args(&args);

    info!("Starting linespectrum in {:?} mode", config.display.mode);

    match config.display.mode {
        DisplayMode::Terminal => display::terminal::run(config).await?,
        DisplayMode::Print => display::print::run(config).await?,
    }

    Ok(())
}
