//! Native engine: a [`RenderGraph`] driven by a cpal output stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::media::decode_wav;
use super::{AudioEngine, EngineError, FilterKind, MediaId, NodeId, ParamKind, RenderGraph};
use crate::params::audio_constants::DEFAULT_SAMPLE_RATE_HZ;

/// Audio engine rendering to the default output device
pub struct NativeEngine {
    /// Shared render graph (control thread + audio callback)
    graph: Arc<Mutex<RenderGraph>>,

    /// Audio output stream (kept alive), absent when rendering offline
    _stream: Option<cpal::Stream>,
}

impl NativeEngine {
    /// Open the default output device and start rendering into it
    pub fn new() -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::Device("No audio output device found".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| EngineError::Device(format!("Failed to get audio config: {}", e)))?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(EngineError::Device(format!(
                "Output sample format {:?} not supported (need f32)",
                config.sample_format()
            )));
        }

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        log::info!(
            "Audio: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels
        );

        let graph = Arc::new(Mutex::new(RenderGraph::new(sample_rate as f32)));
        let graph_callback = Arc::clone(&graph);

        // Build audio output stream
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    lock(&graph_callback).render(data, channels);
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| EngineError::Device(format!("Failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| EngineError::Device(format!("Failed to start audio stream: {}", e)))?;

        Ok(Self {
            graph,
            _stream: Some(stream),
        })
    }

    /// Engine with no device; audio advances only through [`NativeEngine::render`]
    pub fn offline(sample_rate: u32) -> Self {
        Self {
            graph: Arc::new(Mutex::new(RenderGraph::new(sample_rate as f32))),
            _stream: None,
        }
    }

    /// Pull interleaved frames from the graph (offline use)
    pub fn render(&self, data: &mut [f32], channels: usize) {
        self.graph().render(data, channels);
    }

    /// Lock the render graph for inspection
    pub fn graph(&self) -> MutexGuard<'_, RenderGraph> {
        lock(&self.graph)
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::offline(DEFAULT_SAMPLE_RATE_HZ)
    }
}

/// Lock the graph, recovering it if the audio thread panicked while holding it
fn lock(graph: &Mutex<RenderGraph>) -> MutexGuard<'_, RenderGraph> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AudioEngine for NativeEngine {
    type Error = EngineError;

    fn current_time(&self) -> f64 {
        self.graph().current_time()
    }

    fn sample_rate(&self) -> f32 {
        self.graph().sample_rate()
    }

    fn create_media_element(&mut self) -> Result<MediaId, EngineError> {
        Ok(self.graph().create_media_element())
    }

    fn set_media_source(&mut self, media: MediaId, path: &str) -> Result<(), EngineError> {
        // Decode before locking so the audio callback keeps running
        let decoded = decode_wav(path);
        if decoded.is_ok() {
            log::info!("Loaded {}", path);
        }
        self.graph().load_media(media, decoded)
    }

    fn play(&mut self, media: MediaId) -> Result<(), EngineError> {
        self.graph().play(media)
    }

    fn pause(&mut self, media: MediaId) -> Result<(), EngineError> {
        self.graph().pause(media)
    }

    fn is_playing(&self, media: MediaId) -> bool {
        self.graph().is_playing(media)
    }

    fn create_media_source(&mut self, media: MediaId) -> Result<NodeId, EngineError> {
        self.graph().create_media_source(media)
    }

    fn create_biquad_filter(&mut self, kind: FilterKind) -> Result<NodeId, EngineError> {
        Ok(self.graph().create_biquad_filter(kind))
    }

    fn create_analyser(&mut self) -> Result<NodeId, EngineError> {
        Ok(self.graph().create_analyser())
    }

    fn create_gain(&mut self) -> Result<NodeId, EngineError> {
        Ok(self.graph().create_gain())
    }

    fn destination(&self) -> NodeId {
        self.graph().destination()
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        self.graph().connect(from, to)
    }

    fn set_param_value(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
    ) -> Result<(), EngineError> {
        self.graph().set_param_value(node, param, value)
    }

    fn set_param_value_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        time: f64,
    ) -> Result<(), EngineError> {
        self.graph().set_param_value_at_time(node, param, value, time)
    }

    fn set_fft_size(&mut self, analyser: NodeId, fft_size: usize) -> Result<(), EngineError> {
        self.graph().set_fft_size(analyser, fft_size)
    }

    fn byte_frequency_data(&mut self, analyser: NodeId, out: &mut [u8]) -> Result<(), EngineError> {
        self.graph().byte_frequency_data(analyser, out)
    }
}
