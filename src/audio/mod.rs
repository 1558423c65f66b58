mod fft;
mod generator;

pub use generator::{create_generator_pipeline, LatestFftSource, SignalGenerator, ToneConfig};

use crate::spectrum::SourceFormat;

/// FFT magnitudes for one audio frame, `fft_size / 2` values per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FftFrame {
    channels: usize,
    bins: usize,
    data: Vec<f32>,
}

impl FftFrame {
    pub fn new(channels: usize, bins: usize) -> Self {
        Self {
            channels,
            bins,
            data: vec![0.0; channels * bins],
        }
    }

    /// Zeroed buffer sized for `format`.
    pub fn for_format(format: SourceFormat) -> Self {
        Self::new(format.channel_count, format.fft_size / 2)
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        let start = channel * self.bins;
        &self.data[start..start + self.bins]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        let start = channel * self.bins;
        &mut self.data[start..start + self.bins]
    }

    /// Magnitude of `bin` on `channel`; zero outside the buffer.
    pub fn magnitude(&self, channel: usize, bin: usize) -> f32 {
        if channel >= self.channels {
            return 0.0;
        }
        self.channel(channel).get(bin).copied().unwrap_or(0.0)
    }

    /// Copies `other` into this buffer, reallocating only on a shape change.
    pub fn copy_from(&mut self, other: &FftFrame) {
        self.channels = other.channels;
        self.bins = other.bins;
        self.data.clear();
        self.data.extend_from_slice(&other.data);
    }
}

/// Supplier of the latest FFT magnitudes.
///
/// Reads must not block: when nothing new arrived since the last read,
/// `try_get_fft_magnitudes` returns `false` and leaves `out` untouched.
pub trait FftSource {
    fn try_get_fft_magnitudes(&mut self, out: &mut FftFrame) -> bool;

    fn sample_rate(&self) -> u32;

    fn fft_size(&self) -> usize;

    fn channel_count(&self) -> usize;

    fn format(&self) -> SourceFormat {
        SourceFormat {
            channel_count: self.channel_count(),
            fft_size: self.fft_size(),
            sample_rate: self.sample_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_are_laid_out_contiguously() {
        let mut frame = FftFrame::new(2, 4);
        frame.channel_mut(1)[2] = 0.5;
        assert_eq!(frame.channel(0), &[0.0; 4]);
        assert_eq!(frame.channel(1), &[0.0, 0.0, 0.5, 0.0]);
        assert_eq!(frame.magnitude(1, 2), 0.5);
        assert_eq!(frame.magnitude(2, 0), 0.0);
        assert_eq!(frame.magnitude(0, 4), 0.0);
    }

    #[test]
    fn copy_takes_shape_of_source() {
        let mut source = FftFrame::new(1, 3);
        source.channel_mut(0).copy_from_slice(&[1.0, 2.0, 3.0]);
        let mut target = FftFrame::new(2, 8);
        target.copy_from(&source);
        assert_eq!(target, source);
    }

    #[test]
    fn sized_for_format() {
        let frame = FftFrame::for_format(SourceFormat {
            channel_count: 2,
            fft_size: 2048,
            sample_rate: 44100,
        });
        assert_eq!(frame.channel_count(), 2);
        assert_eq!(frame.channel(1).len(), 1024);
    }
}
