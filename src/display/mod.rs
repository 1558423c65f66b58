pub mod print;
pub mod terminal;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::audio::{self, FftSource, LatestFftSource, SignalGenerator};
use crate::config::Config;
use crate::spectrum::{LineSpectrum, SpectrumConfiguration};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Interactive full-screen bars
    #[default]
    Terminal,
    /// Print a fixed number of frames to stdout
    Print,
}

/// A running visualization: the signal source and the spectrum reading it.
pub struct Session {
    // Dropping the generator stops its thread
    _generator: SignalGenerator,
    pub source: LatestFftSource,
    pub spectrum: LineSpectrum,
}

impl Session {
    /// Starts the source, then validates the spectrum settings against the
    /// format it reports. On error the generator is dropped and stops.
    pub fn start(config: &Config) -> Result<Self> {
        let (generator, source) =
            audio::create_generator_pipeline(config.source_format(), config.source.tones.clone())?;
        let spectrum_config =
            SpectrumConfiguration::new(config.spectrum_options(), source.format())?;
        let spectrum = LineSpectrum::new(spectrum_config, config.display.bar_spacing)?;

        Ok(Self {
            _generator: generator,
            source,
            spectrum,
        })
    }
}
