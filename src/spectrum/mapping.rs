//! Bar-to-bin assignment and bar geometry.

use tracing::debug;

use super::frequency::frequency_to_index;
use super::{ConfigError, SpectrumConfiguration};

/// Smallest bar width handed to renderers, so a crowded surface never
/// yields zero or negative widths.
const MIN_BAR_WIDTH: f64 = 0.00001;

/// Inclusive range of FFT bins feeding one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinRange {
    pub from: usize,
    pub to: usize,
}

impl BinRange {
    pub fn len(&self) -> usize {
        self.to - self.from + 1
    }
}

/// Size of the rendering surface, in whatever unit the renderer draws in.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Horizontal bar layout derived from the surface width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub bar_count: usize,
    pub bar_width: f64,
    pub bar_spacing: f64,
}

impl BarGeometry {
    pub fn new(render_width: f64, bar_count: usize, bar_spacing: f64) -> Self {
        let count = bar_count.max(1) as f64;
        let bar_width = ((render_width - bar_spacing * (count + 1.0)) / count).max(MIN_BAR_WIDTH);
        Self {
            bar_count,
            bar_width,
            bar_spacing,
        }
    }

    /// Left edge of bar `index`.
    pub fn x_start(&self, index: usize) -> f64 {
        self.bar_spacing * (index + 1) as f64 + self.bar_width * index as f64
    }
}

/// Bin ranges for every bar plus the geometry they are drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyMapping {
    ranges: Vec<BinRange>,
    geometry: BarGeometry,
}

impl FrequencyMapping {
    /// Computes the mapping for `config` on a surface `render_width` wide.
    ///
    /// Ranges are contiguous and non-decreasing in bar order. A bar whose
    /// frequency band is narrower than one bin reuses its nearest bin, so
    /// several low bars may share the same single bin.
    pub fn compute(config: &SpectrumConfiguration, render_width: f64, bar_spacing: f64) -> Self {
        let fft_size = config.fft_size();
        let sample_rate = config.sample_rate();
        let bar_count = config.bar_count();

        let mut ranges: Vec<BinRange> = Vec::with_capacity(bar_count);
        for bar in 0..bar_count {
            let upper = upper_frequency(config, bar);
            let bin = frequency_to_index(upper, fft_size, sample_rate);

            let range = match ranges.last() {
                None => {
                    let from =
                        frequency_to_index(config.minimum_frequency(), fft_size, sample_rate);
                    BinRange {
                        from,
                        to: bin.max(from),
                    }
                }
                Some(previous) => {
                    let to = bin.max(previous.to);
                    BinRange {
                        from: (previous.to + 1).min(to),
                        to,
                    }
                }
            };
            ranges.push(range);
        }

        Self {
            ranges,
            geometry: BarGeometry::new(render_width, bar_count, bar_spacing),
        }
    }

    pub fn ranges(&self) -> &[BinRange] {
        &self.ranges
    }

    pub fn geometry(&self) -> &BarGeometry {
        &self.geometry
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}

/// Upper frequency boundary of `bar`.
fn upper_frequency(config: &SpectrumConfiguration, bar: usize) -> f64 {
    let min = config.minimum_frequency();
    let max = config.maximum_frequency();
    let fraction = (bar + 1) as f64 / config.bar_count() as f64;

    if config.use_logarithmic_x_axis() {
        min * (max / min).powf(fraction)
    } else {
        min + (max - min) * fraction
    }
}

/// Owns the cached [`FrequencyMapping`] and recomputes it when the
/// configuration or the surface size changes.
#[derive(Debug)]
pub struct FrequencyMapper {
    bar_spacing: f64,
    current_size: SurfaceSize,
    mapping: Option<FrequencyMapping>,
}

impl FrequencyMapper {
    pub fn new(bar_spacing: f64) -> Result<Self, ConfigError> {
        validate_spacing(bar_spacing)?;
        Ok(Self {
            bar_spacing,
            current_size: SurfaceSize::default(),
            mapping: None,
        })
    }

    /// Recomputes for the current surface. A degenerate surface drops the
    /// mapping instead.
    pub fn recompute(&mut self, config: &SpectrumConfiguration) {
        if self.current_size.is_degenerate() {
            self.mapping = None;
            return;
        }
        let mapping = FrequencyMapping::compute(config, self.current_size.width, self.bar_spacing);
        debug!(
            "Recomputed frequency mapping: {} bars, {}..{} Hz, bar width {:.2}",
            mapping.len(),
            config.minimum_frequency(),
            config.maximum_frequency(),
            mapping.geometry().bar_width
        );
        self.mapping = Some(mapping);
    }

    /// Recomputes if `size` differs from the last seen size. Returns whether
    /// the surface can be rendered to.
    pub fn update_if_necessary(
        &mut self,
        config: &SpectrumConfiguration,
        size: SurfaceSize,
    ) -> bool {
        if size != self.current_size {
            self.current_size = size;
            self.recompute(config);
        }
        !size.is_degenerate()
    }

    pub fn set_bar_spacing(
        &mut self,
        bar_spacing: f64,
        config: &SpectrumConfiguration,
    ) -> Result<(), ConfigError> {
        validate_spacing(bar_spacing)?;
        self.bar_spacing = bar_spacing;
        self.recompute(config);
        Ok(())
    }

    pub fn bar_spacing(&self) -> f64 {
        self.bar_spacing
    }

    pub fn mapping(&self) -> Option<&FrequencyMapping> {
        self.mapping.as_ref()
    }
}

fn validate_spacing(bar_spacing: f64) -> Result<(), ConfigError> {
    if bar_spacing.is_finite() && bar_spacing >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeBarSpacing(bar_spacing))
    }
}
