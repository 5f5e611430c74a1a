//! Analyser node: passthrough that keeps a window of recent samples and
//! turns it into a byte spectrum on request.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::EngineError;
use crate::params::audio_constants::{
    FFT_SIZE_RANGE, MAX_DECIBELS, MIN_DECIBELS, SMOOTHING_TIME_CONSTANT,
};

/// Analyser node with a fixed-length time-domain history
pub struct AnalyserNode {
    fft_size: usize,
    /// Ring buffer of the last `fft_size` samples
    history: Vec<f32>,
    write_pos: usize,
    fft: Arc<dyn Fft<f32>>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Smoothed linear magnitudes, one per bin
    smoothed: Vec<f32>,
}

impl AnalyserNode {
    /// Create an analyser with the host default FFT size (2048)
    pub fn new() -> Self {
        Self::with_fft_size(2048)
    }

    fn with_fft_size(fft_size: usize) -> Self {
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            fft_size,
            history: vec![0.0; fft_size],
            write_pos: 0,
            fft,
            spectrum: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    /// Change the FFT size. History and smoothing restart from silence.
    pub fn set_fft_size(&mut self, fft_size: usize) -> Result<(), EngineError> {
        if !fft_size.is_power_of_two() || !FFT_SIZE_RANGE.contains(&fft_size) {
            return Err(EngineError::IndexSize(fft_size));
        }
        if fft_size != self.fft_size {
            *self = Self::with_fft_size(fft_size);
        }
        Ok(())
    }

    /// Copy input to output, remembering the samples
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        output.copy_from_slice(input);
        for &sample in input {
            self.history[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.fft_size;
        }
    }

    /// Fill `out` with the current byte spectrum (0..=255 per bin)
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        let n = self.fft_size;

        // Oldest sample first
        for i in 0..n {
            let sample = self.history[(self.write_pos + i) % n];
            self.spectrum[i] = Complex::new(sample * blackman_window(i, n), 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let tau = SMOOTHING_TIME_CONSTANT;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.spectrum[k].norm() / n as f32;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }

        let scale = 255.0 / (MAX_DECIBELS - MIN_DECIBELS);
        for (byte, &magnitude) in out.iter_mut().zip(&self.smoothed) {
            let db = 20.0 * magnitude.log10();
            *byte = (scale * (db - MIN_DECIBELS)).clamp(0.0, 255.0) as u8;
        }
    }
}

/// Blackman window function for spectrum analysis
pub fn blackman_window(index: usize, size: usize) -> f32 {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let phase = 2.0 * PI * index as f32 / size as f32;
    A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    #[test]
    fn test_blackman_window() {
        let size = 256;

        // Blackman window is ~0 at the edge and 1 at the center
        assert!(blackman_window(0, size).abs() < 0.01);
        assert!((blackman_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_rejects_invalid_fft_sizes() {
        let mut node = AnalyserNode::new();

        assert!(matches!(node.set_fft_size(100), Err(EngineError::IndexSize(100))));
        assert!(matches!(node.set_fft_size(16), Err(EngineError::IndexSize(16))));
        assert!(node.set_fft_size(256).is_ok());
        assert_eq!(node.smoothed.len(), 128);
    }

    #[test]
    fn test_silence_reads_as_zero() {
        let mut node = AnalyserNode::new();
        node.set_fft_size(256).unwrap();

        let mut out = [7u8; 128];
        node.byte_frequency_data(&mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let mut node = AnalyserNode::new();
        node.set_fft_size(256).unwrap();

        // Bin 20 center frequency
        let bin = 20;
        let freq = bin as f32 * SR / 256.0;
        let input: Vec<f32> = (0..1024)
            .map(|i| (2.0 * PI * freq * i as f32 / SR).sin())
            .collect();
        let mut output = vec![0.0; input.len()];
        node.process(&input, &mut output);
        assert_eq!(output, input);

        let mut out = [0u8; 128];
        for _ in 0..10 {
            node.byte_frequency_data(&mut out);
        }

        let peak = out
            .iter()
            .enumerate()
            .max_by_key(|&(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak as i32 - bin as i32).abs() <= 1);
        assert!(out[bin] > out[bin + 30]);
    }

    #[test]
    fn test_short_output_gets_leading_bins() {
        let mut node = AnalyserNode::new();
        node.set_fft_size(64).unwrap();

        let mut out = [9u8; 4];
        node.byte_frequency_data(&mut out);
        assert_eq!(out, [0, 0, 0, 0]);
    }
}
