//! Recording engine for controller tests: keeps parameter values, does no audio.

use std::collections::HashMap;
use std::fmt;

use super::{AudioEngine, FilterKind, MediaId, NodeId, ParamKind};

#[derive(Debug, Clone, PartialEq)]
pub enum FakeNode {
    MediaSource(MediaId),
    Filter(FilterKind),
    Analyser,
    Gain,
    Destination,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeError(pub String);

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fake engine: {}", self.0)
    }
}

impl std::error::Error for FakeError {}

#[derive(Debug, Default)]
pub struct FakeMedia {
    pub source: Option<String>,
    pub playing: bool,
    /// Number of times a source was bound
    pub loads: usize,
}

/// Engine double that records every command
#[derive(Debug)]
pub struct FakeEngine {
    pub time: f64,
    pub nodes: Vec<FakeNode>,
    pub media: Vec<FakeMedia>,
    pub connections: Vec<(NodeId, NodeId)>,
    pub params: HashMap<(NodeId, ParamKind), f32>,
    /// Every scheduled change as `(node, param, value, time)`
    pub scheduled: Vec<(NodeId, ParamKind, f32, f64)>,
    pub fft_sizes: HashMap<NodeId, usize>,
    /// Byte fed into every analyser bin on read
    pub spectrum_fill: u8,
    /// Paths that fail to load
    pub broken_paths: Vec<String>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            time: 0.0,
            nodes: vec![FakeNode::Destination],
            media: Vec::new(),
            connections: Vec::new(),
            params: HashMap::new(),
            scheduled: Vec::new(),
            fft_sizes: HashMap::new(),
            spectrum_fill: 0,
            broken_paths: Vec::new(),
        }
    }
}

impl FakeEngine {
    pub fn param(&self, node: NodeId, param: ParamKind) -> Option<f32> {
        self.params.get(&(node, param)).copied()
    }

    fn add(&mut self, node: FakeNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn media_mut(&mut self, id: MediaId) -> Result<&mut FakeMedia, FakeError> {
        self.media
            .get_mut(id.0)
            .ok_or_else(|| FakeError(format!("unknown {id}")))
    }
}

impl AudioEngine for FakeEngine {
    type Error = FakeError;

    fn current_time(&self) -> f64 {
        self.time
    }

    fn sample_rate(&self) -> f32 {
        44100.0
    }

    fn create_media_element(&mut self) -> Result<MediaId, FakeError> {
        self.media.push(FakeMedia::default());
        Ok(MediaId(self.media.len() - 1))
    }

    fn set_media_source(&mut self, media: MediaId, path: &str) -> Result<(), FakeError> {
        let broken = self.broken_paths.iter().any(|p| p == path);
        let element = self.media_mut(media)?;
        element.playing = false;
        if broken {
            element.source = None;
            return Err(FakeError(format!("cannot load {path}")));
        }
        element.source = Some(path.to_string());
        element.loads += 1;
        Ok(())
    }

    fn play(&mut self, media: MediaId) -> Result<(), FakeError> {
        let element = self.media_mut(media)?;
        if element.source.is_none() {
            return Err(FakeError("no source".to_string()));
        }
        element.playing = true;
        Ok(())
    }

    fn pause(&mut self, media: MediaId) -> Result<(), FakeError> {
        self.media_mut(media)?.playing = false;
        Ok(())
    }

    fn is_playing(&self, media: MediaId) -> bool {
        self.media.get(media.0).is_some_and(|m| m.playing)
    }

    fn create_media_source(&mut self, media: MediaId) -> Result<NodeId, FakeError> {
        self.media_mut(media)?;
        Ok(self.add(FakeNode::MediaSource(media)))
    }

    fn create_biquad_filter(&mut self, kind: FilterKind) -> Result<NodeId, FakeError> {
        Ok(self.add(FakeNode::Filter(kind)))
    }

    fn create_analyser(&mut self) -> Result<NodeId, FakeError> {
        let id = self.add(FakeNode::Analyser);
        self.fft_sizes.insert(id, 2048);
        Ok(id)
    }

    fn create_gain(&mut self) -> Result<NodeId, FakeError> {
        let id = self.add(FakeNode::Gain);
        self.params.insert((id, ParamKind::Gain), 1.0);
        Ok(id)
    }

    fn destination(&self) -> NodeId {
        NodeId(0)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), FakeError> {
        self.connections.push((from, to));
        Ok(())
    }

    fn set_param_value(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
    ) -> Result<(), FakeError> {
        self.params.insert((node, param), value);
        Ok(())
    }

    fn set_param_value_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        time: f64,
    ) -> Result<(), FakeError> {
        if !matches!(self.nodes.get(node.0), Some(FakeNode::Filter(_))) {
            return Err(FakeError(format!("{node} has no {param:?}")));
        }
        self.scheduled.push((node, param, value, time));
        // Every change the controller makes is "now"
        if time <= self.time {
            self.params.insert((node, param), value);
        }
        Ok(())
    }

    fn set_fft_size(&mut self, analyser: NodeId, fft_size: usize) -> Result<(), FakeError> {
        if !fft_size.is_power_of_two() {
            return Err(FakeError(format!("bad fft size {fft_size}")));
        }
        self.fft_sizes.insert(analyser, fft_size);
        Ok(())
    }

    fn byte_frequency_data(&mut self, analyser: NodeId, out: &mut [u8]) -> Result<(), FakeError> {
        let bins = self.fft_sizes.get(&analyser).copied().unwrap_or(0) / 2;
        for byte in out.iter_mut().take(bins) {
            *byte = self.spectrum_fill;
        }
        Ok(())
    }
}
