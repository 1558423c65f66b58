use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::FftFrame;

/// Windowed forward FFT producing per-channel magnitude spectra.
pub struct FrequencyAnalyzer {
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    window: Vec<f32>,
    /// 2 / Σwindow: maps a full-scale sine to a magnitude near 1.0.
    normalization: f32,
}

impl FrequencyAnalyzer {
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Hann window for smoother frequency response
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (fft_size - 1) as f32).cos())
            })
            .collect();
        let window_sum: f32 = window.iter().sum();

        Self {
            fft_size,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            window,
            normalization: 2.0 / window_sum.max(f32::EPSILON),
        }
    }

    /// Writes the magnitude spectrum of `samples` into `out`.
    ///
    /// Short input is zero-padded; `out` receives `min(out.len(), fft_size / 2)` bins.
    pub fn magnitudes_into(&mut self, samples: &[f32], out: &mut [f32]) {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        for (magnitude, bin) in out.iter_mut().zip(self.buffer.iter().take(self.fft_size / 2)) {
            *magnitude = bin.norm() * self.normalization;
        }
    }

    /// Analyzes one block of samples per channel into `frame`.
    pub fn process(&mut self, channels: &[Vec<f32>], frame: &mut FftFrame) {
        for (channel, samples) in channels.iter().enumerate().take(frame.channel_count()) {
            self.magnitudes_into(samples, frame.channel_mut(channel));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::frequency::frequency_to_index;

    fn sine(frequency: f32, amplitude: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| {
                let t = n as f32 / sample_rate;
                amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn full_scale_tone_peaks_near_one_in_its_bin() {
        let mut analyzer = FrequencyAnalyzer::new(4096);
        let samples = sine(540.0, 1.0, 44100.0, 4096);
        let mut out = vec![0.0; 2048];
        analyzer.magnitudes_into(&samples, &mut out);

        let (peak_bin, peak) = out
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, m)| if m > best.1 { (i, m) } else { best });

        assert_eq!(peak_bin, frequency_to_index(540.0, 4096, 44100));
        assert!(peak > 0.6 && peak < 1.1, "peak {}", peak);
    }

    #[test]
    fn silence_has_no_energy() {
        let mut analyzer = FrequencyAnalyzer::new(1024);
        let mut out = vec![1.0; 512];
        analyzer.magnitudes_into(&[], &mut out);
        assert!(out.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn process_fills_each_channel() {
        let mut analyzer = FrequencyAnalyzer::new(1024);
        let left = sine(1000.0, 0.5, 44100.0, 1024);
        let right = vec![0.0; 1024];
        let mut frame = FftFrame::new(2, 512);
        analyzer.process(&[left, right], &mut frame);

        assert!(frame.channel(0).iter().any(|&m| m > 0.1));
        assert!(frame.channel(1).iter().all(|&m| m == 0.0));
    }
}
