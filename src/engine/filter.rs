//! Biquad filter node (high-pass / low-pass) backed by the `biquad` crate.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type};

use super::param::AudioParam;
use super::FilterKind;

/// Coefficients that copy input to output
const PASSTHROUGH: Coefficients<f32> = Coefficients {
    a1: 0.0,
    a2: 0.0,
    b0: 1.0,
    b1: 0.0,
    b2: 0.0,
};

/// Coefficients that output silence
const SILENCE: Coefficients<f32> = Coefficients {
    a1: 0.0,
    a2: 0.0,
    b0: 0.0,
    b1: 0.0,
    b2: 0.0,
};

/// Filter node with automatable cutoff and resonance
pub struct FilterNode {
    kind: FilterKind,
    pub frequency: AudioParam,
    /// Resonance in dB
    pub q: AudioParam,
    filter: DirectForm2Transposed<f32>,
}

impl FilterNode {
    /// Create a filter with the host defaults (350 Hz, Q 1)
    pub fn new(kind: FilterKind, sample_rate: f32) -> Self {
        let frequency = AudioParam::new(350.0);
        let q = AudioParam::new(1.0);
        let coeffs = coefficients(kind, sample_rate, frequency.value(), q.value());

        Self {
            kind,
            frequency,
            q,
            filter: DirectForm2Transposed::<f32>::new(coeffs),
        }
    }

    /// Apply due parameter events and recompute coefficients if anything moved
    pub fn advance(&mut self, now_s: f64, sample_rate: f32) {
        let freq_changed = self.frequency.advance(now_s);
        let q_changed = self.q.advance(now_s);
        if freq_changed || q_changed {
            self.refresh(sample_rate);
        }
    }

    /// Recompute coefficients from the current parameter values
    pub fn refresh(&mut self, sample_rate: f32) {
        let coeffs = coefficients(self.kind, sample_rate, self.frequency.value(), self.q.value());
        self.filter.update_coefficients(coeffs);
    }

    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.filter.run(x);
        }
    }
}

/// Biquad coefficients for a cutoff (Hz) and resonance (dB)
///
/// Cutoffs at 0 Hz or at/above Nyquist degenerate to passthrough or silence
/// depending on the response, matching how browser engines treat them.
fn coefficients(kind: FilterKind, sample_rate: f32, frequency_hz: f32, q_db: f32) -> Coefficients<f32> {
    let nyquist = sample_rate / 2.0;

    match kind {
        FilterKind::HighPass if frequency_hz <= 0.0 => return PASSTHROUGH,
        FilterKind::HighPass if frequency_hz >= nyquist => return SILENCE,
        FilterKind::LowPass if frequency_hz <= 0.0 => return SILENCE,
        FilterKind::LowPass if frequency_hz >= nyquist => return PASSTHROUGH,
        _ => {}
    }

    let filter_type = match kind {
        FilterKind::HighPass => Type::HighPass,
        FilterKind::LowPass => Type::LowPass,
    };
    let q_linear = 10f32.powf(q_db / 20.0);

    Coefficients::<f32>::from_params(filter_type, sample_rate.hz(), frequency_hz.hz(), q_linear)
        .unwrap_or_else(|e| {
            log::warn!(
                "Filter coefficients rejected ({:?} @ {} Hz, Q {} dB): {:?}",
                kind,
                frequency_hz,
                q_db,
                e
            );
            PASSTHROUGH
        })
}
