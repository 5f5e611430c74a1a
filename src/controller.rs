//! Playback graph controller.
//!
//! Builds the fixed chain
//! `source → high-pass → low-pass → analyser → gain → destination`
//! once, then forwards parameter changes to the engine. Every write takes
//! effect at the engine's current time; nothing is ramped.

use crate::engine::{AudioEngine, FilterKind, MediaId, NodeId, ParamKind};
use crate::params::{FilterState, GraphConfig};

/// Handles of the six nodes in the chain, in signal order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphNodes {
    pub source: NodeId,
    pub high_pass: NodeId,
    pub low_pass: NodeId,
    pub analyser: NodeId,
    pub gain: NodeId,
    pub destination: NodeId,
}

impl GraphNodes {
    /// Nodes in the order audio flows through them
    pub fn chain(&self) -> [NodeId; 6] {
        [
            self.source,
            self.high_pass,
            self.low_pass,
            self.analyser,
            self.gain,
            self.destination,
        ]
    }
}

/// Spectrum bytes read from the analyser, allocated once
#[derive(Debug)]
pub struct AnalysisBuffer {
    bins: Box<[u8]>,
}

impl AnalysisBuffer {
    /// Buffer for an analyser running at `fft_size` (holds `fft_size / 2` bins)
    pub fn new(fft_size: usize) -> Self {
        Self {
            bins: vec![0; fft_size / 2].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bins
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bins
    }
}

/// Owner of the playback graph and the stored filter settings
pub struct PlaybackGraphController<E: AudioEngine> {
    engine: E,
    config: GraphConfig,
    media: MediaId,
    nodes: GraphNodes,
    /// Last requested high-pass setting (may not be the active one)
    high_pass: FilterState,
    /// Last requested low-pass setting (may not be the active one)
    low_pass: FilterState,
    analysis: AnalysisBuffer,
}

impl<E: AudioEngine> PlaybackGraphController<E> {
    /// Build the graph on `engine` and bind it to the sound file at `path`.
    ///
    /// Both filters start effectively disabled: high-pass at 0 Hz, low-pass
    /// near Nyquist, each with its stored Q. Engine errors are returned as-is.
    pub fn setup(mut engine: E, config: GraphConfig, path: &str) -> Result<Self, E::Error> {
        let media = engine.create_media_element()?;
        engine.set_media_source(media, path)?;
        let source = engine.create_media_source(media)?;

        let analyser = engine.create_analyser()?;
        engine.set_fft_size(analyser, config.fft_size)?;

        let gain = engine.create_gain()?;
        engine.set_param_value(gain, ParamKind::Gain, config.gain)?;

        let now = engine.current_time();
        let high_pass = engine.create_biquad_filter(FilterKind::HighPass)?;
        engine.set_param_value_at_time(
            high_pass,
            ParamKind::Frequency,
            config.high_pass_off_hz,
            now,
        )?;
        engine.set_param_value_at_time(high_pass, ParamKind::Q, config.high_pass.q, now)?;

        let low_pass = engine.create_biquad_filter(FilterKind::LowPass)?;
        engine.set_param_value_at_time(
            low_pass,
            ParamKind::Frequency,
            config.low_pass_off_hz,
            now,
        )?;
        engine.set_param_value_at_time(low_pass, ParamKind::Q, config.low_pass.q, now)?;

        let nodes = GraphNodes {
            source,
            high_pass,
            low_pass,
            analyser,
            gain,
            destination: engine.destination(),
        };
        for pair in nodes.chain().windows(2) {
            engine.connect(pair[0], pair[1])?;
        }

        log::info!(
            "Playback graph ready: gain {}, {} analysis bins",
            config.gain,
            config.bin_count()
        );

        Ok(Self {
            engine,
            media,
            nodes,
            high_pass: config.high_pass,
            low_pass: config.low_pass,
            analysis: AnalysisBuffer::new(config.fft_size),
            config,
        })
    }

    /// Point the media element at another file. Playback stops and rewinds.
    pub fn load_sound_file(&mut self, path: &str) -> Result<(), E::Error> {
        log::debug!("Loading {}", path);
        self.engine.set_media_source(self.media, path)
    }

    pub fn play(&mut self) -> Result<(), E::Error> {
        self.engine.play(self.media)
    }

    pub fn pause(&mut self) -> Result<(), E::Error> {
        self.engine.pause(self.media)
    }

    pub fn is_playing(&self) -> bool {
        self.engine.is_playing(self.media)
    }

    /// Write the gain directly.
    ///
    /// The value is not clamped: anything the engine accepts, including
    /// values above 1 or below 0, goes straight through.
    pub fn set_volume(&mut self, value: f32) -> Result<(), E::Error> {
        self.engine
            .set_param_value(self.nodes.gain, ParamKind::Gain, value)
    }

    pub fn set_high_pass_freq(&mut self, value: f32) -> Result<(), E::Error> {
        self.schedule(self.nodes.high_pass, ParamKind::Frequency, value)?;
        self.high_pass.frequency_hz = value;
        Ok(())
    }

    pub fn set_high_pass_q(&mut self, value: f32) -> Result<(), E::Error> {
        self.schedule(self.nodes.high_pass, ParamKind::Q, value)?;
        self.high_pass.q = value;
        Ok(())
    }

    pub fn set_low_pass_freq(&mut self, value: f32) -> Result<(), E::Error> {
        self.schedule(self.nodes.low_pass, ParamKind::Frequency, value)?;
        self.low_pass.frequency_hz = value;
        Ok(())
    }

    pub fn set_low_pass_q(&mut self, value: f32) -> Result<(), E::Error> {
        self.schedule(self.nodes.low_pass, ParamKind::Q, value)?;
        self.low_pass.q = value;
        Ok(())
    }

    /// Re-apply the stored high-pass setting, or open the filter fully (0 Hz, Q 0)
    pub fn toggle_high_pass(&mut self, enabled: bool) -> Result<(), E::Error> {
        let applied = if enabled {
            self.high_pass
        } else {
            FilterState::new(self.config.high_pass_off_hz, 0.0)
        };
        self.apply_filter(self.nodes.high_pass, applied)
    }

    /// Re-apply the stored low-pass setting, or open the filter fully (22 kHz, Q 0)
    pub fn toggle_low_pass(&mut self, enabled: bool) -> Result<(), E::Error> {
        let applied = if enabled {
            self.low_pass
        } else {
            FilterState::new(self.config.low_pass_off_hz, 0.0)
        };
        self.apply_filter(self.nodes.low_pass, applied)
    }

    /// Read the analyser into the analysis buffer and return it
    pub fn poll_analysis(&mut self) -> Result<&[u8], E::Error> {
        self.engine
            .byte_frequency_data(self.nodes.analyser, self.analysis.as_mut_slice())?;
        Ok(self.analysis.as_slice())
    }

    /// Contents of the last poll
    pub fn analysis(&self) -> &[u8] {
        self.analysis.as_slice()
    }

    pub fn high_pass(&self) -> FilterState {
        self.high_pass
    }

    pub fn low_pass(&self) -> FilterState {
        self.low_pass
    }

    pub fn nodes(&self) -> &GraphNodes {
        &self.nodes
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Engine clock (seconds)
    pub fn current_time(&self) -> f64 {
        self.engine.current_time()
    }

    fn apply_filter(&mut self, node: NodeId, state: FilterState) -> Result<(), E::Error> {
        self.schedule(node, ParamKind::Frequency, state.frequency_hz)?;
        self.schedule(node, ParamKind::Q, state.q)
    }

    fn schedule(&mut self, node: NodeId, param: ParamKind, value: f32) -> Result<(), E::Error> {
        let now = self.engine.current_time();
        self.engine.set_param_value_at_time(node, param, value, now)
    }
}
