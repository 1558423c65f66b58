use crate::audio::FftFrame;

use super::mapping::{BinRange, FrequencyMapping};
use super::{SpectrumConfiguration, SpectrumPoint};

/// Per-frame multiplicative decay applied to bar peaks.
///
/// Applied once per produced frame, not scaled by elapsed time: a render
/// loop running slower than its target rate makes bars fall more slowly.
pub const DECAY_FACTOR: f32 = 0.95;

/// Smoothed height of one bar, carried between frames.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningPeak {
    pub current_height: f32,
}

impl RunningPeak {
    /// Instant rise, gradual fall.
    pub fn update(&mut self, scaled: f32, decay_factor: f32) -> f32 {
        self.current_height = scaled.max(self.current_height * decay_factor);
        self.current_height
    }
}

/// Turns magnitude buffers into smoothed bar heights.
pub struct SpectrumAggregator {
    peaks: Vec<RunningPeak>,
    decay_factor: f32,
}

impl SpectrumAggregator {
    pub fn new(bar_count: usize) -> Self {
        Self {
            peaks: vec![RunningPeak::default(); bar_count],
            decay_factor: DECAY_FACTOR,
        }
    }

    /// Resizes peak storage to `bar_count` and clears every entry.
    pub fn reset(&mut self, bar_count: usize) {
        self.peaks.clear();
        self.peaks.resize(bar_count, RunningPeak::default());
    }

    #[cfg(test)]
    pub fn peaks(&self) -> &[RunningPeak] {
        &self.peaks
    }

    /// Computes one frame of bars, in bar order.
    ///
    /// `magnitudes` is only borrowed for the duration of the call; the
    /// smoothing state is the only thing kept across frames.
    pub fn produce_frame(
        &mut self,
        magnitudes: &FftFrame,
        mapping: &FrequencyMapping,
        config: &SpectrumConfiguration,
    ) -> Vec<SpectrumPoint> {
        if self.peaks.len() != mapping.len() {
            self.reset(mapping.len());
        }

        let strategy = config.scaling_strategy();
        let use_average = config.use_average();
        let decay_factor = self.decay_factor;

        mapping
            .ranges()
            .iter()
            .zip(self.peaks.iter_mut())
            .enumerate()
            .map(|(bar_index, (range, peak))| {
                let raw = reduce_bar(magnitudes, *range, use_average);
                let value = peak.update(strategy.apply(raw), decay_factor);
                SpectrumPoint { bar_index, value }
            })
            .collect()
    }
}

/// Peak across channels for a single bin.
pub fn reduce_channels(magnitudes: &FftFrame, bin: usize) -> f32 {
    (0..magnitudes.channel_count())
        .map(|channel| magnitudes.magnitude(channel, bin))
        .fold(0.0, f32::max)
}

/// Raw magnitude of one bar: channel-reduced bins, then mean or max over
/// the bar's range.
pub fn reduce_bar(magnitudes: &FftFrame, range: BinRange, use_average: bool) -> f32 {
    let bins = (range.from..=range.to).map(|bin| reduce_channels(magnitudes, bin));

    if use_average {
        bins.sum::<f32>() / range.len() as f32
    } else {
        bins.fold(0.0, f32::max)
    }
}
