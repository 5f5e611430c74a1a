//! Band energies derived from the analyser's byte spectrum.

use crate::params::BandConfig;

/// Normalized frequency band energies (0..1) for audio-reactive visuals
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpectrumBands {
    pub low: f32,  // Bass
    pub mid: f32,  // Mids
    pub high: f32, // Highs
}

impl SpectrumBands {
    /// Average the byte bins of each band
    pub fn from_bins(bins: &[u8], config: &BandConfig) -> Self {
        Self {
            low: band_energy(bins, config.bass_bins()),
            mid: band_energy(bins, config.mid_bins()),
            high: band_energy(bins, config.high_bins()),
        }
    }
}

fn band_energy(bins: &[u8], range: std::ops::Range<usize>) -> f32 {
    let end = range.end.min(bins.len());
    let start = range.start.min(end);
    let band = &bins[start..end];
    if band.is_empty() {
        return 0.0;
    }
    band.iter().map(|&b| b as f32).sum::<f32>() / (band.len() as f32 * 255.0)
}

/// Render band energies as a one-line meter, e.g. `low ████░░░░ mid ...`
pub fn meter_line(bands: &SpectrumBands, width: usize) -> String {
    let bar = |value: f32| {
        let filled = ((value.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    };
    format!(
        "low {} mid {} high {}",
        bar(bands.low),
        bar(bands.mid),
        bar(bands.high)
    )
}
