use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::audio::ToneConfig;
use crate::color::ColorScheme;
use crate::display::DisplayMode;
use crate::renderer::BarStyle;
use crate::spectrum::{ScalingStrategy, SourceFormat, SpectrumOptions};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub spectrum: SpectrumConfig,
    pub source: SourceConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpectrumConfig {
    pub bars: usize,
    pub min_frequency: f64,
    pub max_frequency: f64,
    pub log_x_axis: bool,
    pub scaling: ScalingStrategy,
    pub use_average: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub sample_rate: u32,
    pub fft_size: usize,
    pub channels: usize,
    pub tones: ToneConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub mode: DisplayMode,
    pub style: BarStyle,
    pub color_scheme: ColorScheme,
    pub bar_spacing: f64,
    pub sensitivity: f32,
    pub fps: u32,
    /// Frames to print in print mode
    pub frames: usize,
    /// Print raw values instead of block glyphs
    pub numeric: bool,
    /// Surface width used in print mode
    pub columns: u16,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        let options = SpectrumOptions::default();
        Self {
            bars: options.bar_count,
            min_frequency: options.minimum_frequency,
            max_frequency: options.maximum_frequency,
            log_x_axis: options.use_logarithmic_x_axis,
            scaling: options.scaling_strategy,
            use_average: options.use_average,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 4096,
            channels: 2,
            tones: ToneConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Terminal,
            style: BarStyle::Classic,
            color_scheme: ColorScheme::Rainbow,
            bar_spacing: 1.0,
            sensitivity: 1.0,
            fps: 60,
            frames: 100,
            numeric: false,
            columns: 80,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the default XDG config path (~/.config/linespectrum/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("linespectrum").join("config.toml"))
    }

    /// Load config from the default XDG path if it exists
    /// Returns None if file doesn't exist, logs warning on parse errors
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return None;
        }
        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("{:#}. Using defaults.", e);
                None
            }
        }
    }

    /// Initialize default config file at XDG path, returns the path
    pub fn init_default_config() -> Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, Self::generate_config_template())?;
        Ok(path)
    }

    /// Generate a commented TOML config template
    pub fn generate_config_template() -> String {
        r#"# Linespectrum Configuration

[spectrum]
# Number of bars
bars = 32
# Frequency range shown, in Hz (within 0 and half the sample rate)
min_frequency = 20.0
max_frequency = 20000.0
# Logarithmic frequency spacing (needs min_frequency > 0)
log_x_axis = true
# Amplitude scaling: linear, sqrt, decibel
scaling = "sqrt"
# Average the bins of a bar instead of taking their maximum
use_average = false

[source]
# Test signal format
sample_rate = 44100
# FFT size, a power of two
fft_size = 4096
channels = 2

[source.tones]
# Tone frequencies in Hz
frequencies = [55.0, 220.0, 440.0, 1760.0, 5000.0, 12000.0]
# Peak amplitude per tone (full scale = 1.0)
amplitude = 0.3
# Tone swell rate in Hz
pulse_rate = 0.5

[display]
# Display mode: terminal or print
mode = "terminal"
# Bar style: classic or mirrored
style = "classic"
# Color scheme: rainbow, green, spectrum, fire
color_scheme = "rainbow"
# Spacing between bars (terminal columns)
bar_spacing = 1.0
# Gain applied before drawing
sensitivity = 1.0
# Render ticks per second
fps = 60
# Print mode: number of frames to print
frames = 100
# Print mode: print raw values instead of block glyphs
numeric = false
# Print mode: surface width
columns = 80
"#
        .to_string()
    }

    pub fn spectrum_options(&self) -> SpectrumOptions {
        SpectrumOptions {
            bar_count: self.spectrum.bars,
            minimum_frequency: self.spectrum.min_frequency,
            maximum_frequency: self.spectrum.max_frequency,
            use_logarithmic_x_axis: self.spectrum.log_x_axis,
            scaling_strategy: self.spectrum.scaling,
            use_average: self.spectrum.use_average,
        }
    }

    pub fn source_format(&self) -> SourceFormat {
        SourceFormat {
            channel_count: self.source.channels,
            fft_size: self.source.fft_size,
            sample_rate: self.source.sample_rate,
        }
    }

    /// Merge CLI arguments into config (CLI takes priority)
    pub fn merge_args(&mut self, args: &crate::Args) {
        // Spectrum settings
        if let Some(bars) = args.bars {
            self.spectrum.bars = bars;
        }
        if let Some(min) = args.min_frequency {
            self.spectrum.min_frequency = min;
        }
        if let Some(max) = args.max_frequency {
            self.spectrum.max_frequency = max;
        }
        if args.log_axis {
            self.spectrum.log_x_axis = true;
        }
        if args.linear_axis {
            self.spectrum.log_x_axis = false;
        }
        if let Some(scaling) = args.scaling {
            self.spectrum.scaling = scaling;
        }
        if args.average {
            self.spectrum.use_average = true;
        }

        // Source settings
        if let Some(rate) = args.sample_rate {
            self.source.sample_rate = rate;
        }
        if let Some(size) = args.fft_size {
            self.source.fft_size = size;
        }
        if let Some(channels) = args.channels {
            self.source.channels = channels;
        }

        // Display settings
        if let Some(mode) = args.mode {
            self.display.mode = mode;
        }
        if let Some(style) = args.style {
            self.display.style = style;
        }
        if let Some(colors) = args.colors {
            self.display.color_scheme = colors;
        }
        if let Some(spacing) = args.bar_spacing {
            self.display.bar_spacing = spacing;
        }
        if let Some(fps) = args.fps {
            self.display.fps = fps;
        }
        if let Some(frames) = args.frames {
            self.display.frames = frames;
        }
        if args.numeric {
            self.display.numeric = true;
        }
    }
}
