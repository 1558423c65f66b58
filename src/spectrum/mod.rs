//! Spectrum bucketing engine.
//!
//! Raw FFT magnitudes are re-bucketed into a small number of bars: the
//! [`mapping`] module assigns bin ranges to bars once per configuration or
//! surface change, and the [`aggregator`] turns each fresh magnitude buffer
//! into scaled, smoothed bar heights.

pub mod aggregator;
pub mod frequency;
pub mod line;
pub mod mapping;

pub use line::{Frame, LineSpectrum};
pub use mapping::{BarGeometry, SurfaceSize};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Calibration offset for [`ScalingStrategy::Decibel`]: magnitudes at or
/// below -90 dBFS render as zero.
pub const DECIBEL_OFFSET: f32 = 90.0;

/// Rejections raised when a configuration value is set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("bar count must be positive")]
    ZeroBarCount,
    #[error("minimum frequency {min} Hz must be below maximum frequency {max} Hz")]
    InvalidFrequencyRange { min: f64, max: f64 },
    #[error("frequency {frequency} Hz is outside [0, {nyquist}] Hz")]
    FrequencyOutOfRange { frequency: f64, nyquist: f64 },
    #[error("logarithmic x axis needs a positive minimum frequency, got {0} Hz")]
    NonPositiveLogMinimum(f64),
    #[error("fft size {0} is not a power of two")]
    FftSizeNotPowerOfTwo(usize),
    #[error("channel count must be positive")]
    ZeroChannels,
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    #[error("bar spacing must not be negative, got {0}")]
    NegativeBarSpacing(f64),
}

/// Maps a raw magnitude to a display height.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScalingStrategy {
    Linear,
    #[default]
    Sqrt,
    Decibel,
}

impl ScalingStrategy {
    /// Scales a non-negative magnitude. Monotonic non-decreasing for every
    /// strategy; never negative.
    pub fn apply(&self, magnitude: f32) -> f32 {
        let m = magnitude.max(0.0);
        match self {
            ScalingStrategy::Linear => m,
            ScalingStrategy::Sqrt => m.sqrt(),
            ScalingStrategy::Decibel => {
                if m <= 0.0 {
                    0.0
                } else {
                    (20.0 * m.log10() + DECIBEL_OFFSET).max(0.0)
                }
            }
        }
    }

    /// Value a full-scale (1.0) magnitude maps to.
    pub fn full_scale(&self) -> f32 {
        self.apply(1.0)
    }

    pub fn next(&self) -> Self {
        match self {
            ScalingStrategy::Linear => ScalingStrategy::Sqrt,
            ScalingStrategy::Sqrt => ScalingStrategy::Decibel,
            ScalingStrategy::Decibel => ScalingStrategy::Linear,
        }
    }
}

/// One bar of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumPoint {
    pub bar_index: usize,
    pub value: f32,
}

/// Validated spectrum settings. Every setter checks the candidate value
/// before committing it, so a constructed configuration is always valid.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumConfiguration {
    bar_count: usize,
    minimum_frequency: f64,
    maximum_frequency: f64,
    use_logarithmic_x_axis: bool,
    scaling_strategy: ScalingStrategy,
    use_average: bool,
    channel_count: usize,
    fft_size: usize,
    sample_rate: u32,
}

/// Source-side parameters: fixed by the FFT source, not by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFormat {
    pub channel_count: usize,
    pub fft_size: usize,
    pub sample_rate: u32,
}

/// User-adjustable options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumOptions {
    pub bar_count: usize,
    pub minimum_frequency: f64,
    pub maximum_frequency: f64,
    pub use_logarithmic_x_axis: bool,
    pub scaling_strategy: ScalingStrategy,
    pub use_average: bool,
}

impl Default for SpectrumOptions {
    fn default() -> Self {
        Self {
            bar_count: 32,
            minimum_frequency: 20.0,
            maximum_frequency: 20000.0,
            use_logarithmic_x_axis: true,
            scaling_strategy: ScalingStrategy::Sqrt,
            use_average: false,
        }
    }
}

impl SpectrumConfiguration {
    pub fn new(options: SpectrumOptions, format: SourceFormat) -> Result<Self, ConfigError> {
        let config = Self {
            bar_count: options.bar_count,
            minimum_frequency: options.minimum_frequency,
            maximum_frequency: options.maximum_frequency,
            use_logarithmic_x_axis: options.use_logarithmic_x_axis,
            scaling_strategy: options.scaling_strategy,
            use_average: options.use_average,
            channel_count: format.channel_count,
            fft_size: format.fft_size,
            sample_rate: format.sample_rate,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bar_count == 0 {
            return Err(ConfigError::ZeroBarCount);
        }
        if self.channel_count == 0 {
            return Err(ConfigError::ZeroChannels);
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(ConfigError::FftSizeNotPowerOfTwo(self.fft_size));
        }

        let (min, max) = (self.minimum_frequency, self.maximum_frequency);
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ConfigError::InvalidFrequencyRange { min, max });
        }
        let nyquist = self.nyquist();
        for frequency in [min, max] {
            if !(0.0..=nyquist).contains(&frequency) {
                return Err(ConfigError::FrequencyOutOfRange { frequency, nyquist });
            }
        }
        if self.use_logarithmic_x_axis && min <= 0.0 {
            return Err(ConfigError::NonPositiveLogMinimum(min));
        }
        Ok(())
    }

    /// Applies `change` to a copy and commits it only if the copy is valid.
    fn try_update(&mut self, change: impl FnOnce(&mut Self)) -> Result<(), ConfigError> {
        let mut candidate = self.clone();
        change(&mut candidate);
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    pub fn set_bar_count(&mut self, bar_count: usize) -> Result<(), ConfigError> {
        self.try_update(|c| c.bar_count = bar_count)
    }

    pub fn set_frequency_range(&mut self, minimum: f64, maximum: f64) -> Result<(), ConfigError> {
        self.try_update(|c| {
            c.minimum_frequency = minimum;
            c.maximum_frequency = maximum;
        })
    }

    pub fn set_logarithmic_x_axis(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.try_update(|c| c.use_logarithmic_x_axis = enabled)
    }

    pub fn set_scaling_strategy(&mut self, strategy: ScalingStrategy) {
        self.scaling_strategy = strategy;
    }

    pub fn set_use_average(&mut self, enabled: bool) {
        self.use_average = enabled;
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn minimum_frequency(&self) -> f64 {
        self.minimum_frequency
    }

    pub fn maximum_frequency(&self) -> f64 {
        self.maximum_frequency
    }

    pub fn use_logarithmic_x_axis(&self) -> bool {
        self.use_logarithmic_x_axis
    }

    pub fn scaling_strategy(&self) -> ScalingStrategy {
        self.scaling_strategy
    }

    pub fn use_average(&self) -> bool {
        self.use_average
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    pub fn source_format(&self) -> SourceFormat {
        SourceFormat {
            channel_count: self.channel_count,
            fft_size: self.fft_size,
            sample_rate: self.sample_rate,
        }
    }
}
