//! Media element: a decoded sound file with a play head.

use std::path::Path;

use super::EngineError;

/// Sound file decoded to mono samples at its native rate
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_s(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode a WAV file, mixing all channels down to mono
pub fn decode_wav(path: impl AsRef<Path>) -> Result<DecodedAudio, EngineError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    if channels == 0 {
        return Err(EngineError::UnsupportedFormat("zero channels".to_string()));
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => {
            reader.samples::<f32>().collect::<Result<Vec<f32>, _>>()?
        }
        (hound::SampleFormat::Int, bits @ 1..=32) => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<Vec<f32>, _>>()?
        }
        (format, bits) => {
            return Err(EngineError::UnsupportedFormat(format!(
                "{:?} samples at {} bits",
                format, bits
            )))
        }
    };

    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    let decoded = DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
    };
    log::debug!(
        "Decoded {} channel(s), {:.1}s @ {}Hz",
        channels,
        decoded.duration_s(),
        decoded.sample_rate
    );
    Ok(decoded)
}

/// Playable element bound to at most one source at a time
#[derive(Debug, Default)]
pub struct MediaElement {
    source: Option<DecodedAudio>,
    /// Play head in source frames (fractional when rates differ)
    position: f64,
    playing: bool,
    /// Whether a graph node already reads from this element
    pub(crate) has_source_node: bool,
}

impl MediaElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the outcome of decoding a new source, stopping and rewinding.
    ///
    /// On a decode failure the element is left without a source.
    pub fn load(&mut self, decoded: Result<DecodedAudio, EngineError>) -> Result<(), EngineError> {
        self.playing = false;
        self.position = 0.0;
        match decoded {
            Ok(audio) => {
                self.source = Some(audio);
                Ok(())
            }
            Err(e) => {
                self.source = None;
                Err(e)
            }
        }
    }

    /// Bind already-decoded audio (stops and rewinds)
    pub fn set_decoded(&mut self, decoded: DecodedAudio) {
        self.playing = false;
        self.position = 0.0;
        self.source = Some(decoded);
    }

    /// Start playback. Does nothing without a source.
    pub fn play(&mut self) {
        let Some(source) = self.source.as_ref() else {
            return;
        };
        // Playing from the end starts over
        if self.position >= source.samples.len() as f64 {
            self.position = 0.0;
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Render the next `out.len()` frames at `context_rate`.
    ///
    /// Writes silence when paused; stops at the end of the source.
    pub fn render(&mut self, out: &mut [f32], context_rate: f32) {
        out.fill(0.0);

        let Some(source) = self.source.as_ref() else {
            return;
        };
        if !self.playing {
            return;
        }

        let samples = &source.samples;
        let step = source.sample_rate as f64 / context_rate as f64;

        for slot in out.iter_mut() {
            let index = self.position as usize;
            if index >= samples.len() {
                self.playing = false;
                log::debug!("Media reached end");
                break;
            }
            let frac = (self.position - index as f64) as f32;
            let current = samples[index];
            let next = samples.get(index + 1).copied().unwrap_or(current);
            *slot = current + (next - current) * frac;
            self.position += step;
        }
    }
}
