use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use super::fft::FrequencyAnalyzer;
use super::{FftFrame, FftSource};
use crate::spectrum::{ConfigError, SourceFormat};

/// Test signal played into the analyzer: a handful of pulsing tones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToneConfig {
    /// Tone frequencies in Hz
    pub frequencies: Vec<f32>,
    /// Peak amplitude of each tone (full scale = 1.0)
    pub amplitude: f32,
    /// How fast each tone swells and fades, in Hz
    pub pulse_rate: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequencies: vec![55.0, 220.0, 440.0, 1760.0, 5000.0, 12000.0],
            amplitude: 0.3,
            pulse_rate: 0.5,
        }
    }
}

impl ToneConfig {
    /// Sample `n` of `channel` at `sample_rate`.
    fn sample(&self, channel: usize, n: u64, sample_rate: f32) -> f32 {
        let t = n as f32 / sample_rate;
        self.frequencies
            .iter()
            .enumerate()
            .map(|(k, &frequency)| {
                let phase = k as f32 * 1.3 + channel as f32 * 0.7;
                let envelope = 0.5 * (1.0 + (2.0 * PI * self.pulse_rate * t + phase).sin());
                self.amplitude * envelope * (2.0 * PI * frequency * t).sin()
            })
            .sum()
    }
}

/// Synthesizes audio on a background thread and publishes the latest
/// magnitude spectrum through a watch channel.
pub struct SignalGenerator {
    // Keep the thread handle to ensure it stays alive
    _generator_thread: thread::JoinHandle<()>,
    stop_flag: Arc<AtomicBool>,
}

impl Drop for SignalGenerator {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

impl SignalGenerator {
    pub fn start(
        format: SourceFormat,
        tones: ToneConfig,
        sender: watch::Sender<Arc<FftFrame>>,
    ) -> Result<Self> {
        validate_format(format)?;

        info!(
            "Starting signal generator: {} channel(s), {} Hz, fft size {}, {} tone(s)",
            format.channel_count,
            format.sample_rate,
            format.fft_size,
            tones.frequencies.len()
        );

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_clone = stop_flag.clone();

        let generator_thread = thread::spawn(move || {
            Self::generate_loop(format, tones, sender, stop_flag_clone);
        });

        Ok(Self {
            _generator_thread: generator_thread,
            stop_flag,
        })
    }

    fn generate_loop(
        format: SourceFormat,
        tones: ToneConfig,
        sender: watch::Sender<Arc<FftFrame>>,
        stop_flag: Arc<AtomicBool>,
    ) {
        let mut analyzer = FrequencyAnalyzer::new(format.fft_size);
        let sample_rate = format.sample_rate as f32;

        // Half-overlapping windows, published at the rate audio would arrive
        let hop = format.fft_size / 2;
        let hop_duration = Duration::from_secs_f64(hop as f64 / format.sample_rate as f64);

        let mut channels = vec![vec![0.0f32; format.fft_size]; format.channel_count];
        let mut position: u64 = 0;

        loop {
            if stop_flag.load(Ordering::Relaxed) {
                debug!("Stop flag set, ending generator loop");
                break;
            }

            for (channel, samples) in channels.iter_mut().enumerate() {
                for (i, sample) in samples.iter_mut().enumerate() {
                    *sample = tones.sample(channel, position + i as u64, sample_rate);
                }
            }

            let mut frame = FftFrame::for_format(format);
            analyzer.process(&channels, &mut frame);

            if sender.send(Arc::new(frame)).is_err() {
                debug!("Spectrum receiver dropped, stopping generator");
                break;
            }

            position += hop as u64;
            thread::sleep(hop_duration);
        }

        info!("Signal generator stopped");
    }
}

fn validate_format(format: SourceFormat) -> Result<(), ConfigError> {
    if format.channel_count == 0 {
        return Err(ConfigError::ZeroChannels);
    }
    if format.sample_rate == 0 {
        return Err(ConfigError::ZeroSampleRate);
    }
    if format.fft_size < 2 || !format.fft_size.is_power_of_two() {
        return Err(ConfigError::FftSizeNotPowerOfTwo(format.fft_size));
    }
    Ok(())
}

/// [`FftSource`] reading the most recent frame from a watch channel.
///
/// Each published frame is handed out once; later reads report no data
/// until the producer publishes again.
pub struct LatestFftSource {
    receiver: watch::Receiver<Arc<FftFrame>>,
    format: SourceFormat,
}

impl LatestFftSource {
    pub fn new(receiver: watch::Receiver<Arc<FftFrame>>, format: SourceFormat) -> Self {
        Self { receiver, format }
    }
}

impl FftSource for LatestFftSource {
    fn try_get_fft_magnitudes(&mut self, out: &mut FftFrame) -> bool {
        match self.receiver.has_changed() {
            Ok(true) => {
                let latest = self.receiver.borrow_and_update();
                out.copy_from(&latest);
                true
            }
            // Unchanged, or the producer is gone
            _ => false,
        }
    }

    fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    fn fft_size(&self) -> usize {
        self.format.fft_size
    }

    fn channel_count(&self) -> usize {
        self.format.channel_count
    }
}

/// Create a generator thread and the source that reads from it.
pub fn create_generator_pipeline(
    format: SourceFormat,
    tones: ToneConfig,
) -> Result<(SignalGenerator, LatestFftSource)> {
    let (tx, rx) = watch::channel(Arc::new(FftFrame::for_format(format)));
    let generator = SignalGenerator::start(format, tones, tx)?;
    Ok((generator, LatestFftSource::new(rx, format)))
}
