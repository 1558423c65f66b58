//! A visualization session: configuration, cached mapping, smoothing state
//! and the last emitted bars, driven one render tick at a time.

use tracing::{debug, info};

use crate::audio::{FftFrame, FftSource};

use super::aggregator::SpectrumAggregator;
use super::mapping::{BarGeometry, FrequencyMapper, FrequencyMapping, SurfaceSize};
use super::{ConfigError, ScalingStrategy, SpectrumConfiguration, SpectrumPoint};

/// Outcome of one render tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame<'a> {
    /// The surface has no area; nothing to draw.
    NotReady,
    /// No new magnitudes this tick: the previous bars, unchanged.
    Held(&'a [SpectrumPoint]),
    /// Bars computed from fresh magnitudes.
    Fresh(&'a [SpectrumPoint]),
}

pub struct LineSpectrum {
    config: SpectrumConfiguration,
    mapper: FrequencyMapper,
    aggregator: SpectrumAggregator,
    buffer: FftFrame,
    points: Vec<SpectrumPoint>,
}

impl LineSpectrum {
    pub fn new(config: SpectrumConfiguration, bar_spacing: f64) -> Result<Self, ConfigError> {
        let mapper = FrequencyMapper::new(bar_spacing)?;
        info!(
            "Line spectrum: {} bars, {}..{} Hz, {} axis, {:?} scaling, {} channel(s)",
            config.bar_count(),
            config.minimum_frequency(),
            config.maximum_frequency(),
            if config.use_logarithmic_x_axis() { "log" } else { "linear" },
            config.scaling_strategy(),
            config.channel_count()
        );

        Ok(Self {
            aggregator: SpectrumAggregator::new(config.bar_count()),
            buffer: FftFrame::for_format(config.source_format()),
            points: Vec::new(),
            mapper,
            config,
        })
    }

    /// Runs one render tick against a surface of `size`.
    ///
    /// Recomputes the mapping if the surface changed, then pulls magnitudes
    /// from `source`. When the source has nothing new the previous bars are
    /// returned as they were, without decay.
    pub fn tick(&mut self, source: &mut dyn FftSource, size: SurfaceSize) -> Frame<'_> {
        if !self.mapper.update_if_necessary(&self.config, size) {
            return Frame::NotReady;
        }
        let Some(mapping) = self.mapper.mapping() else {
            return Frame::NotReady;
        };

        if source.try_get_fft_magnitudes(&mut self.buffer) {
            self.points = self
                .aggregator
                .produce_frame(&self.buffer, mapping, &self.config);
            Frame::Fresh(&self.points)
        } else {
            Frame::Held(&self.points)
        }
    }

    pub fn config(&self) -> &SpectrumConfiguration {
        &self.config
    }

    pub fn mapping(&self) -> Option<&FrequencyMapping> {
        self.mapper.mapping()
    }

    pub fn geometry(&self) -> Option<&BarGeometry> {
        self.mapper.mapping().map(FrequencyMapping::geometry)
    }

    /// Last emitted bars.
    pub fn points(&self) -> &[SpectrumPoint] {
        &self.points
    }

    /// Drops smoothing state and the last bars. Needed whenever a stored
    /// height would mean something else after the change: other units or
    /// other bin ranges.
    fn reset_smoothing(&mut self) {
        self.aggregator.reset(self.config.bar_count());
        self.points.clear();
    }

    pub fn set_bar_count(&mut self, bar_count: usize) -> Result<(), ConfigError> {
        self.config.set_bar_count(bar_count)?;
        self.reset_smoothing();
        debug!("Bar count set to {}", bar_count);
        self.mapper.recompute(&self.config);
        Ok(())
    }

    pub fn set_frequency_range(&mut self, minimum: f64, maximum: f64) -> Result<(), ConfigError> {
        self.config.set_frequency_range(minimum, maximum)?;
        self.reset_smoothing();
        debug!("Frequency range set to {}..{} Hz", minimum, maximum);
        self.mapper.recompute(&self.config);
        Ok(())
    }

    pub fn set_logarithmic_x_axis(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.config.set_logarithmic_x_axis(enabled)?;
        self.reset_smoothing();
        debug!("Logarithmic x axis: {}", enabled);
        self.mapper.recompute(&self.config);
        Ok(())
    }

    pub fn set_scaling_strategy(&mut self, strategy: ScalingStrategy) {
        self.config.set_scaling_strategy(strategy);
        self.reset_smoothing();
        debug!("Scaling strategy set to {:?}", strategy);
        self.mapper.recompute(&self.config);
    }

    pub fn set_use_average(&mut self, enabled: bool) {
        self.config.set_use_average(enabled);
        debug!("Average bins: {}", enabled);
        self.mapper.recompute(&self.config);
    }

    pub fn bar_spacing(&self) -> f64 {
        self.mapper.bar_spacing()
    }

    pub fn set_bar_spacing(&mut self, bar_spacing: f64) -> Result<(), ConfigError> {
        self.mapper.set_bar_spacing(bar_spacing, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::aggregator::DECAY_FACTOR;
    use crate::spectrum::{SourceFormat, SpectrumOptions};
    use std::collections::VecDeque;

    const FORMAT: SourceFormat = SourceFormat {
        channel_count: 2,
        fft_size: 4096,
        sample_rate: 44100,
    };

    /// Replays a fixed script of frames; `None` means no data that tick.
    struct ScriptedSource {
        script: VecDeque<Option<FftFrame>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Option<FftFrame>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl FftSource for ScriptedSource {
        fn try_get_fft_magnitudes(&mut self, out: &mut FftFrame) -> bool {
            match self.script.pop_front().flatten() {
                Some(frame) => {
                    out.copy_from(&frame);
                    true
                }
                None => false,
            }
        }

        fn sample_rate(&self) -> u32 {
            FORMAT.sample_rate
        }

        fn fft_size(&self) -> usize {
            FORMAT.fft_size
        }

        fn channel_count(&self) -> usize {
            FORMAT.channel_count
        }
    }

    fn spectrum() -> LineSpectrum {
        let config = SpectrumConfiguration::new(
            SpectrumOptions {
                bar_count: 4,
                minimum_frequency: 0.0,
                maximum_frequency: 1000.0,
                use_logarithmic_x_axis: false,
                scaling_strategy: ScalingStrategy::Linear,
                use_average: false,
            },
            FORMAT,
        )
        .unwrap();
        LineSpectrum::new(config, 1.0).unwrap()
    }

    fn frame_with(bin: usize, value: f32) -> FftFrame {
        let mut frame = FftFrame::for_format(FORMAT);
        frame.channel_mut(0)[bin] = value;
        frame
    }

    fn values(frame: Frame<'_>) -> Vec<f32> {
        match frame {
            Frame::NotReady => Vec::new(),
            Frame::Held(points) | Frame::Fresh(points) => points.iter().map(|p| p.value).collect(),
        }
    }

    const SIZE: SurfaceSize = SurfaceSize {
        width: 400.0,
        height: 100.0,
    };

    #[test]
    fn missing_data_holds_last_frame_without_decay() {
        let mut spectrum = spectrum();
        let mut source = ScriptedSource::new(vec![
            Some(frame_with(30, 0.8)),
            None,
            None,
            Some(FftFrame::for_format(FORMAT)),
        ]);

        let first = spectrum.tick(&mut source, SIZE);
        assert!(matches!(first, Frame::Fresh(_)));
        assert_eq!(values(first), vec![0.0, 0.8, 0.0, 0.0]);

        for _ in 0..2 {
            let held = spectrum.tick(&mut source, SIZE);
            assert!(matches!(held, Frame::Held(_)));
            assert_eq!(values(held), vec![0.0, 0.8, 0.0, 0.0]);
        }

        // Decay resumes only with the next produced frame.
        let next = values(spectrum.tick(&mut source, SIZE));
        assert_eq!(next[1], 0.8 * DECAY_FACTOR);
    }

    #[test]
    fn degenerate_surface_is_not_ready() {
        let mut spectrum = spectrum();
        let mut source = ScriptedSource::new(vec![Some(frame_with(30, 0.8))]);

        assert_eq!(spectrum.tick(&mut source, SurfaceSize::new(0.0, 0.0)), Frame::NotReady);
        assert!(spectrum.geometry().is_none());
        // The source was not consumed.
        assert!(matches!(spectrum.tick(&mut source, SIZE), Frame::Fresh(_)));
        assert!(spectrum.geometry().is_some());
    }

    #[test]
    fn bar_count_change_recomputes_and_clears_state() {
        let mut spectrum = spectrum();
        let mut source = ScriptedSource::new(vec![
            Some(frame_with(30, 0.8)),
            None,
            Some(FftFrame::for_format(FORMAT)),
        ]);
        spectrum.tick(&mut source, SIZE);

        spectrum.set_bar_count(8).unwrap();
        assert_eq!(spectrum.mapping().map(|m| m.len()), Some(8));
        assert_eq!(spectrum.geometry().map(|g| g.bar_count), Some(8));
        assert!(spectrum.points().is_empty());

        assert_eq!(values(spectrum.tick(&mut source, SIZE)), Vec::<f32>::new());
        assert_eq!(values(spectrum.tick(&mut source, SIZE)), vec![0.0; 8]);
    }

    #[test]
    fn invalid_changes_are_rejected_immediately() {
        let mut spectrum = spectrum();
        let mut source = ScriptedSource::new(vec![]);
        spectrum.tick(&mut source, SIZE);
        let before = spectrum.mapping().cloned();

        assert_eq!(spectrum.set_bar_count(0), Err(ConfigError::ZeroBarCount));
        assert_eq!(
            spectrum.set_logarithmic_x_axis(true),
            Err(ConfigError::NonPositiveLogMinimum(0.0))
        );
        assert!(spectrum.set_frequency_range(500.0, 100.0).is_err());
        assert!(spectrum.set_bar_spacing(-2.0).is_err());
        assert_eq!(spectrum.bar_spacing(), 1.0);
        assert_eq!(spectrum.mapping().cloned(), before);
    }

    #[test]
    fn axis_change_rebuilds_mapping() {
        let mut spectrum = spectrum();
        let mut source = ScriptedSource::new(vec![]);
        spectrum.tick(&mut source, SIZE);
        let linear = spectrum.mapping().cloned();

        spectrum.set_frequency_range(20.0, 1000.0).unwrap();
        spectrum.set_logarithmic_x_axis(true).unwrap();
        assert_ne!(spectrum.mapping().cloned(), linear);
        assert!(spectrum.config().use_logarithmic_x_axis());

        spectrum.set_scaling_strategy(ScalingStrategy::Decibel);
        spectrum.set_use_average(true);
        assert_eq!(spectrum.config().scaling_strategy(), ScalingStrategy::Decibel);
        assert!(spectrum.config().use_average());
    }

    #[test]
    fn scaling_change_drops_heights_in_old_units() {
        let mut spectrum = spectrum();
        spectrum.set_scaling_strategy(ScalingStrategy::Decibel);
        let silence = FftFrame::for_format(FORMAT);
        let mut source = ScriptedSource::new(vec![Some(frame_with(30, 0.1)), Some(silence)]);

        let decibel = values(spectrum.tick(&mut source, SIZE));
        approx::assert_relative_eq!(decibel[1], 70.0, epsilon = 1e-3);

        spectrum.set_scaling_strategy(ScalingStrategy::Linear);
        assert!(spectrum.points().is_empty());
        assert_eq!(values(spectrum.tick(&mut source, SIZE)), vec![0.0; 4]);
    }

    #[test]
    fn range_and_axis_changes_drop_smoothing_state() {
        let mut spectrum = spectrum();
        let silence = FftFrame::for_format(FORMAT);
        let mut source = ScriptedSource::new(vec![
            Some(frame_with(30, 0.8)),
            Some(silence.clone()),
            Some(frame_with(30, 0.8)),
            Some(silence),
        ]);

        spectrum.tick(&mut source, SIZE);
        spectrum.set_frequency_range(20.0, 1000.0).unwrap();
        assert_eq!(values(spectrum.tick(&mut source, SIZE)), vec![0.0; 4]);

        spectrum.tick(&mut source, SIZE);
        spectrum.set_logarithmic_x_axis(true).unwrap();
        assert!(spectrum.points().is_empty());
        assert_eq!(values(spectrum.tick(&mut source, SIZE)), vec![0.0; 4]);
    }

    #[test]
    fn average_toggle_keeps_smoothing_state() {
        let mut spectrum = spectrum();
        let mut source = ScriptedSource::new(vec![
            Some(frame_with(30, 0.8)),
            Some(FftFrame::for_format(FORMAT)),
        ]);

        spectrum.tick(&mut source, SIZE);
        spectrum.set_use_average(true);
        assert_eq!(values(spectrum.tick(&mut source, SIZE))[1], 0.8 * DECAY_FACTOR);
    }
}
