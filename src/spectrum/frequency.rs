//! Conversions between frequencies and FFT bin indices.
//!
//! These work without a live source, so they are shared by the mapper,
//! the renderers (frequency labels) and tests.

/// Returns the FFT bin holding `frequency`.
///
/// `round(fft_size * frequency / sample_rate)`, clamped to the last usable
/// bin (`fft_size / 2 - 1`). With a 44100 Hz stream and a 4096-point FFT a
/// 540 Hz tone lands in bin 50.
pub fn frequency_to_index(frequency: f64, fft_size: usize, sample_rate: u32) -> usize {
    let max_index = last_bin(fft_size);
    let index = (fft_size as f64 * frequency / sample_rate as f64).round();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(max_index)
    }
}

/// Returns the frequency (Hz, rounded) represented by FFT bin `index`.
///
/// With a 44100 Hz stream and a 4096-point FFT bin 50 represents 538 Hz.
pub fn index_to_frequency(index: usize, fft_size: usize, sample_rate: u32) -> u32 {
    (index as f64 * sample_rate as f64 / fft_size as f64).round() as u32
}

/// Width of one bin in Hz.
pub fn bin_width(fft_size: usize, sample_rate: u32) -> f64 {
    sample_rate as f64 / fft_size as f64
}

/// Highest usable bin index for an FFT of `fft_size` points.
pub fn last_bin(fft_size: usize) -> usize {
    (fft_size / 2).saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_540_hz_lands_in_bin_50() {
        assert_eq!(frequency_to_index(540.0, 4096, 44100), 50);
        assert_eq!(index_to_frequency(50, 4096, 44100), 538);
    }

    #[test]
    fn index_is_clamped_to_last_bin() {
        assert_eq!(frequency_to_index(22050.0, 4096, 44100), 2047);
        assert_eq!(frequency_to_index(100_000.0, 2048, 44100), 1023);
        assert_eq!(frequency_to_index(0.0, 2048, 44100), 0);
        assert_eq!(frequency_to_index(-10.0, 2048, 44100), 0);
    }

    #[test]
    fn conversions_round_trip_within_one_bin() {
        let formats = [(2048usize, 44100u32), (4096, 44100), (4096, 48000), (1024, 22050)];
        for &(fft_size, sample_rate) in &formats {
            let width = bin_width(fft_size, sample_rate);
            let nyquist_edge = index_to_frequency(last_bin(fft_size), fft_size, sample_rate) as f64;
            let mut frequency = 0.0;
            while frequency <= nyquist_edge {
                let index = frequency_to_index(frequency, fft_size, sample_rate);
                let back = index_to_frequency(index, fft_size, sample_rate) as f64;
                assert!(
                    (back - frequency).abs() <= width,
                    "{} Hz -> bin {} -> {} Hz (fft {}, rate {})",
                    frequency,
                    index,
                    back,
                    fft_size,
                    sample_rate
                );
                frequency += 37.5;
            }
        }
    }

    #[test]
    fn bin_width_matches_resolution() {
        approx::assert_relative_eq!(bin_width(4096, 44100), 10.766_601_562_5);
        assert_eq!(last_bin(2048), 1023);
    }
}
