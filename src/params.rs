//! Parameter definitions with physical units and documented semantics.
//!
//! Everything the playback graph starts from lives here:
//! - Physical units (Hz, dB, samples)
//! - Documented ranges and meanings
//! - The "disabled" settings the filter toggles fall back to

use std::ops::Range;

/// Last requested setting of a biquad filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    /// Cutoff frequency (Hz)
    pub frequency_hz: f32,

    /// Quality factor (dB for low/high-pass, as the engine interprets it)
    pub q: f32,
}

impl FilterState {
    pub const fn new(frequency_hz: f32, q: f32) -> Self {
        Self { frequency_hz, q }
    }
}

/// Playback graph defaults, fixed once the controller is set up
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Initial gain (linear, 0..1 nominal)
    pub gain: f32,

    /// Analyser resolution (samples per FFT, power of 2)
    /// Yields `fft_size / 2` spectrum bins.
    pub fft_size: usize,

    /// Stored high-pass setting recalled when the filter is toggled on
    pub high_pass: FilterState,

    /// Stored low-pass setting recalled when the filter is toggled on
    pub low_pass: FilterState,

    /// High-pass cutoff that lets everything through (Hz)
    pub high_pass_off_hz: f32,

    /// Low-pass cutoff that lets everything through (Hz, near Nyquist)
    pub low_pass_off_hz: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            gain: 0.5,
            fft_size: 256,
            high_pass: FilterState::new(12000.0, 0.5),
            low_pass: FilterState::new(100.0, 0.5),
            high_pass_off_hz: 0.0,
            low_pass_off_hz: 22000.0,
        }
    }
}

impl GraphConfig {
    /// Number of spectrum bins the analyser produces
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be a power of 2 the engine accepts)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if !audio_constants::FFT_SIZE_RANGE.contains(&self.fft_size) {
            return Err(format!(
                "FFT size must be within {}..={}, got {}",
                audio_constants::MIN_FFT_SIZE,
                audio_constants::MAX_FFT_SIZE,
                self.fft_size
            ));
        }
        Ok(())
    }
}

/// Spectrum band ranges used to summarize analyser output
#[derive(Debug, Clone)]
pub struct BandConfig {
    /// Context sample rate the analyser runs at (Hz)
    pub sample_rate_hz: f32,

    /// Analyser FFT size (samples)
    pub fft_size: usize,

    /// Bass frequency range (Hz)
    pub bass_range_hz: (f32, f32),

    /// Mid frequency range (Hz)
    pub mid_range_hz: (f32, f32),

    /// High frequency range (Hz)
    pub high_range_hz: (f32, f32),
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100.0,
            fft_size: 256,
            bass_range_hz: (20.0, 250.0),
            mid_range_hz: (250.0, 2000.0),
            high_range_hz: (2000.0, 16000.0),
        }
    }
}

impl BandConfig {
    pub fn new(sample_rate_hz: f32, fft_size: usize) -> Self {
        Self {
            sample_rate_hz,
            fft_size,
            ..Self::default()
        }
    }

    /// Convert frequency (Hz) to spectrum bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size as f32) / self.sample_rate_hz) as usize
    }

    /// Bin range for a frequency range, clipped to the bins that exist
    ///
    /// Always at least one bin wide so coarse resolutions still report energy.
    pub fn bins(&self, range_hz: (f32, f32)) -> Range<usize> {
        let bin_count = (self.fft_size / 2).max(1);
        let start = self.hz_to_bin(range_hz.0).min(bin_count - 1);
        let end = self.hz_to_bin(range_hz.1).clamp(start + 1, bin_count);
        start..end
    }

    pub fn bass_bins(&self) -> Range<usize> {
        self.bins(self.bass_range_hz)
    }

    pub fn mid_bins(&self) -> Range<usize> {
        self.bins(self.mid_range_hz)
    }

    pub fn high_bins(&self) -> Range<usize> {
        self.bins(self.high_range_hz)
    }
}

/// Audio constants (compile-time, shared by the native engine)
pub mod audio_constants {
    use std::ops::RangeInclusive;

    /// Frames rendered per graph pass (= 2.9ms @ 44.1kHz)
    pub const RENDER_QUANTUM: usize = 128;

    /// Sample rate used when no output device dictates one (Hz)
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44100;

    pub const MIN_FFT_SIZE: usize = 32;
    pub const MAX_FFT_SIZE: usize = 32768;
    pub const FFT_SIZE_RANGE: RangeInclusive<usize> = MIN_FFT_SIZE..=MAX_FFT_SIZE;

    /// Analyser smoothing between successive spectra (0 = none)
    pub const SMOOTHING_TIME_CONSTANT: f32 = 0.8;

    /// Analyser byte mapping: dB value that maps to 0
    pub const MIN_DECIBELS: f32 = -100.0;

    /// Analyser byte mapping: dB value that maps to 255
    pub const MAX_DECIBELS: f32 = -30.0;
}
