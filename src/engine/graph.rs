//! Render graph: node storage, routing and the per-quantum pull.
//!
//! [`RenderGraph`] owns every node and media element. Nodes are processed in
//! topological order one render quantum at a time; each node's output is the
//! sum of its inputs run through the node. The destination's output is what
//! gets written to the device.

use super::analyser::AnalyserNode;
use super::filter::FilterNode;
use super::media::{decode_wav, DecodedAudio, MediaElement};
use super::param::AudioParam;
use super::{EngineError, FilterKind, MediaId, NodeId, ParamKind};
use crate::params::audio_constants::RENDER_QUANTUM;

type Quantum = [f32; RENDER_QUANTUM];

enum NodeKind {
    MediaSource(MediaId),
    Filter(FilterNode),
    Analyser(AnalyserNode),
    Gain(AudioParam),
    Destination,
}

impl NodeKind {
    fn accepts_input(&self) -> bool {
        !matches!(self, NodeKind::MediaSource(_))
    }

    fn has_output(&self) -> bool {
        !matches!(self, NodeKind::Destination)
    }
}

struct Node {
    kind: NodeKind,
    inputs: Vec<NodeId>,
}

/// Graph of processing nodes rendered in fixed-size quanta
pub struct RenderGraph {
    sample_rate: f32,
    nodes: Vec<Node>,
    media: Vec<MediaElement>,
    /// Last rendered quantum of every node, indexed like `nodes`
    outputs: Vec<Quantum>,
    /// Processing order, recomputed on every connection
    order: Vec<NodeId>,
    frames_rendered: u64,
    /// Read position inside the destination's current quantum
    cursor: usize,
}

impl RenderGraph {
    /// Create a graph holding only its destination
    pub fn new(sample_rate: f32) -> Self {
        let mut graph = Self {
            sample_rate,
            nodes: Vec::new(),
            media: Vec::new(),
            outputs: Vec::new(),
            order: Vec::new(),
            frames_rendered: 0,
            cursor: RENDER_QUANTUM,
        };
        graph.add_node(NodeKind::Destination);
        graph
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Seconds of audio rendered so far
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    pub fn destination(&self) -> NodeId {
        NodeId(0)
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            inputs: Vec::new(),
        });
        self.outputs.push([0.0; RENDER_QUANTUM]);
        self.order.push(id);
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, EngineError> {
        self.nodes.get_mut(id.0).ok_or(EngineError::UnknownNode(id))
    }

    fn media_mut(&mut self, id: MediaId) -> Result<&mut MediaElement, EngineError> {
        self.media.get_mut(id.0).ok_or(EngineError::UnknownMedia(id))
    }

    // ---- media elements ----

    pub fn create_media_element(&mut self) -> MediaId {
        self.media.push(MediaElement::new());
        MediaId(self.media.len() - 1)
    }

    /// Decode `path` and bind it to the element (stops and rewinds)
    pub fn set_media_source(&mut self, id: MediaId, path: &str) -> Result<(), EngineError> {
        self.media_mut(id)?;
        self.load_media(id, decode_wav(path))
    }

    /// Bind the outcome of a decode done elsewhere, e.g. outside the graph lock
    pub fn load_media(
        &mut self,
        id: MediaId,
        decoded: Result<DecodedAudio, EngineError>,
    ) -> Result<(), EngineError> {
        self.media_mut(id)?.load(decoded)
    }

    pub fn play(&mut self, id: MediaId) -> Result<(), EngineError> {
        let media = self.media_mut(id)?;
        if !media.has_source() {
            return Err(EngineError::NoSource(id));
        }
        media.play();
        Ok(())
    }

    pub fn pause(&mut self, id: MediaId) -> Result<(), EngineError> {
        self.media_mut(id)?.pause();
        Ok(())
    }

    pub fn is_playing(&self, id: MediaId) -> bool {
        self.media.get(id.0).is_some_and(MediaElement::is_playing)
    }

    pub fn media(&self, id: MediaId) -> Option<&MediaElement> {
        self.media.get(id.0)
    }

    // ---- nodes ----

    /// Create the node reading from a media element (one per element)
    pub fn create_media_source(&mut self, media: MediaId) -> Result<NodeId, EngineError> {
        let element = self.media_mut(media)?;
        if element.has_source_node {
            return Err(EngineError::InvalidState(format!(
                "{media} is already connected to a source node"
            )));
        }
        element.has_source_node = true;
        Ok(self.add_node(NodeKind::MediaSource(media)))
    }

    pub fn create_biquad_filter(&mut self, kind: FilterKind) -> NodeId {
        let node = FilterNode::new(kind, self.sample_rate);
        self.add_node(NodeKind::Filter(node))
    }

    pub fn create_analyser(&mut self) -> NodeId {
        self.add_node(NodeKind::Analyser(AnalyserNode::new()))
    }

    pub fn create_gain(&mut self) -> NodeId {
        self.add_node(NodeKind::Gain(AudioParam::new(1.0)))
    }

    /// Route `from` into `to`. Duplicate connections are ignored.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        let source = self.nodes.get(from.0).ok_or(EngineError::UnknownNode(from))?;
        let target = self.nodes.get(to.0).ok_or(EngineError::UnknownNode(to))?;

        if !source.kind.has_output() {
            return Err(EngineError::InvalidConnection(format!(
                "{from} has no output"
            )));
        }
        if !target.kind.accepts_input() {
            return Err(EngineError::InvalidConnection(format!("{to} has no input")));
        }
        if target.inputs.contains(&from) {
            return Ok(());
        }
        if from == to || self.is_upstream(to, from) {
            return Err(EngineError::InvalidConnection(format!(
                "{from} -> {to} would create a cycle"
            )));
        }

        self.node_mut(to)?.inputs.push(from);
        self.order = self.topological_order();
        log::debug!("Connected {from} -> {to}");
        Ok(())
    }

    /// Whether `candidate` feeds (directly or transitively) into `node`
    fn is_upstream(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut stack = vec![node];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            for &input in &self.nodes[id.0].inputs {
                if input == candidate {
                    return true;
                }
                if !seen[input.0] {
                    seen[input.0] = true;
                    stack.push(input);
                }
            }
        }
        false
    }

    /// Depth-first post-order so every node comes after its inputs
    fn topological_order(&self) -> Vec<NodeId> {
        fn visit(graph: &RenderGraph, id: NodeId, seen: &mut [bool], order: &mut Vec<NodeId>) {
            if seen[id.0] {
                return;
            }
            seen[id.0] = true;
            for &input in &graph.nodes[id.0].inputs {
                visit(graph, input, seen, order);
            }
            order.push(id);
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        for id in 0..self.nodes.len() {
            visit(self, NodeId(id), &mut seen, &mut order);
        }
        order
    }

    /// Inputs of a node, in connection order
    pub fn inputs(&self, id: NodeId) -> Option<&[NodeId]> {
        self.nodes.get(id.0).map(|node| node.inputs.as_slice())
    }

    // ---- parameters ----

    fn param_mut(&mut self, id: NodeId, param: ParamKind) -> Result<&mut AudioParam, EngineError> {
        match (&mut self.node_mut(id)?.kind, param) {
            (NodeKind::Gain(gain), ParamKind::Gain) => Ok(gain),
            (NodeKind::Filter(filter), ParamKind::Frequency) => Ok(&mut filter.frequency),
            (NodeKind::Filter(filter), ParamKind::Q) => Ok(&mut filter.q),
            _ => Err(EngineError::InvalidParam(id, param)),
        }
    }

    pub fn param_value(&self, id: NodeId, param: ParamKind) -> Option<f32> {
        match (&self.nodes.get(id.0)?.kind, param) {
            (NodeKind::Gain(gain), ParamKind::Gain) => Some(gain.value()),
            (NodeKind::Filter(filter), ParamKind::Frequency) => Some(filter.frequency.value()),
            (NodeKind::Filter(filter), ParamKind::Q) => Some(filter.q.value()),
            _ => None,
        }
    }

    pub fn set_param_value(
        &mut self,
        id: NodeId,
        param: ParamKind,
        value: f32,
    ) -> Result<(), EngineError> {
        if !value.is_finite() {
            return Err(EngineError::NonFinite(value));
        }
        let sample_rate = self.sample_rate;
        self.param_mut(id, param)?.set_value(value);
        if let NodeKind::Filter(filter) = &mut self.node_mut(id)?.kind {
            filter.refresh(sample_rate);
        }
        Ok(())
    }

    /// Schedule a value change. Times at or before now apply on the next quantum.
    pub fn set_param_value_at_time(
        &mut self,
        id: NodeId,
        param: ParamKind,
        value: f32,
        time: f64,
    ) -> Result<(), EngineError> {
        if !value.is_finite() {
            return Err(EngineError::NonFinite(value));
        }
        self.param_mut(id, param)?.set_value_at_time(value, time);
        Ok(())
    }

    // ---- analysers ----

    fn analyser_mut(&mut self, id: NodeId) -> Result<&mut AnalyserNode, EngineError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Analyser(analyser) => Ok(analyser),
            _ => Err(EngineError::InvalidState(format!("{id} is not an analyser"))),
        }
    }

    pub fn set_fft_size(&mut self, id: NodeId, fft_size: usize) -> Result<(), EngineError> {
        self.analyser_mut(id)?.set_fft_size(fft_size)
    }

    pub fn byte_frequency_data(&mut self, id: NodeId, out: &mut [u8]) -> Result<(), EngineError> {
        self.analyser_mut(id)?.byte_frequency_data(out);
        Ok(())
    }

    // ---- rendering ----

    /// Render one quantum through every node
    fn render_quantum(&mut self) {
        let now = self.current_time();
        let sample_rate = self.sample_rate;
        let mut mix: Quantum = [0.0; RENDER_QUANTUM];

        for &id in &self.order {
            mix.fill(0.0);
            for &input in &self.nodes[id.0].inputs {
                for (m, s) in mix.iter_mut().zip(&self.outputs[input.0]) {
                    *m += s;
                }
            }

            let output = &mut self.outputs[id.0];
            match &mut self.nodes[id.0].kind {
                NodeKind::MediaSource(media) => {
                    self.media[media.0].render(output, sample_rate);
                }
                NodeKind::Filter(filter) => {
                    filter.advance(now, sample_rate);
                    filter.process(&mix, output);
                }
                NodeKind::Analyser(analyser) => analyser.process(&mix, output),
                NodeKind::Gain(gain) => {
                    gain.advance(now);
                    let g = gain.value();
                    for (out, &x) in output.iter_mut().zip(&mix) {
                        *out = x * g;
                    }
                }
                NodeKind::Destination => {
                    for (out, &x) in output.iter_mut().zip(&mix) {
                        *out = x.clamp(-1.0, 1.0);
                    }
                }
            }
        }

        self.frames_rendered += RENDER_QUANTUM as u64;
    }

    /// Fill an interleaved output buffer, copying the mono mix to every channel
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let destination = self.destination().0;

        for frame in data.chunks_mut(channels) {
            if self.cursor >= RENDER_QUANTUM {
                self.render_quantum();
                self.cursor = 0;
            }
            frame.fill(self.outputs[destination][self.cursor]);
            self.cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn graph_with_media(samples: Vec<f32>) -> (RenderGraph, MediaId, NodeId) {
        let mut graph = RenderGraph::new(SR);
        let media = graph.create_media_element();
        graph.media[media.0].set_decoded(DecodedAudio {
            samples,
            sample_rate: SR as u32,
        });
        let source = graph.create_media_source(media).unwrap();
        (graph, media, source)
    }

    #[test]
    fn test_source_gain_destination_renders() {
        let (mut graph, media, source) = graph_with_media(vec![0.8; 1024]);
        let gain = graph.create_gain();
        graph.connect(source, gain).unwrap();
        graph.connect(gain, graph.destination()).unwrap();
        graph.set_param_value(gain, ParamKind::Gain, 0.5).unwrap();
        graph.play(media).unwrap();

        let mut out = vec![0.0; 256 * 2];
        graph.render(&mut out, 2);
        assert!(out.iter().all(|&s| (s - 0.4).abs() < 1e-6));
        assert_eq!(graph.current_time(), 256.0 / SR as f64);
    }

    #[test]
    fn test_zero_gain_silences() {
        let (mut graph, media, source) = graph_with_media(vec![0.8; 1024]);
        let gain = graph.create_gain();
        graph.connect(source, gain).unwrap();
        graph.connect(gain, graph.destination()).unwrap();
        graph.set_param_value(gain, ParamKind::Gain, 0.0).unwrap();
        graph.play(media).unwrap();

        let mut out = vec![1.0; 128];
        graph.render(&mut out, 1);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_destination_clamps() {
        let (mut graph, media, source) = graph_with_media(vec![0.8; 256]);
        let gain = graph.create_gain();
        graph.connect(source, gain).unwrap();
        graph.connect(gain, graph.destination()).unwrap();
        graph.set_param_value(gain, ParamKind::Gain, 3.0).unwrap();
        graph.play(media).unwrap();

        assert_eq!(graph.param_value(gain, ParamKind::Gain), Some(3.0));
        let mut out = vec![0.0; 64];
        graph.render(&mut out, 1);
        assert!(out.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_scheduled_gain_applies_at_quantum_boundary() {
        let (mut graph, media, source) = graph_with_media(vec![1.0; 1024]);
        let gain = graph.create_gain();
        graph.connect(source, gain).unwrap();
        graph.connect(gain, graph.destination()).unwrap();
        graph.play(media).unwrap();

        let second_quantum = RENDER_QUANTUM as f64 / SR as f64;
        graph
            .set_param_value_at_time(gain, ParamKind::Gain, 0.25, second_quantum)
            .unwrap();

        let mut out = vec![0.0; RENDER_QUANTUM * 2];
        graph.render(&mut out, 1);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[RENDER_QUANTUM], 0.25);
    }

    #[test]
    fn test_rejects_cycles_and_bad_endpoints() {
        let (mut graph, _media, source) = graph_with_media(vec![0.0; 16]);
        let a = graph.create_gain();
        let b = graph.create_gain();
        graph.connect(a, b).unwrap();

        assert!(matches!(
            graph.connect(b, a),
            Err(EngineError::InvalidConnection(_))
        ));
        assert!(matches!(
            graph.connect(a, a),
            Err(EngineError::InvalidConnection(_))
        ));
        assert!(matches!(
            graph.connect(a, source),
            Err(EngineError::InvalidConnection(_))
        ));
        assert!(matches!(
            graph.connect(graph.destination(), a),
            Err(EngineError::InvalidConnection(_))
        ));
        assert!(matches!(
            graph.connect(a, NodeId(99)),
            Err(EngineError::UnknownNode(NodeId(99)))
        ));
    }

    #[test]
    fn test_duplicate_connection_is_ignored() {
        let (mut graph, _media, source) = graph_with_media(vec![0.0; 16]);
        let gain = graph.create_gain();
        graph.connect(source, gain).unwrap();
        graph.connect(source, gain).unwrap();

        assert_eq!(graph.inputs(gain), Some(&[source][..]));
    }

    #[test]
    fn test_one_source_node_per_media_element() {
        let (mut graph, media, _source) = graph_with_media(vec![0.0; 16]);

        assert!(matches!(
            graph.create_media_source(media),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn test_param_kind_must_match_node() {
        let mut graph = RenderGraph::new(SR);
        let gain = graph.create_gain();
        let filter = graph.create_biquad_filter(FilterKind::LowPass);

        assert!(matches!(
            graph.set_param_value(gain, ParamKind::Q, 1.0),
            Err(EngineError::InvalidParam(_, ParamKind::Q))
        ));
        assert!(matches!(
            graph.set_param_value_at_time(filter, ParamKind::Gain, 1.0, 0.0),
            Err(EngineError::InvalidParam(_, ParamKind::Gain))
        ));
        assert!(matches!(
            graph.set_param_value(gain, ParamKind::Gain, f32::NAN),
            Err(EngineError::NonFinite(_))
        ));
    }

    #[test]
    fn test_play_without_source() {
        let mut graph = RenderGraph::new(SR);
        let media = graph.create_media_element();

        assert!(matches!(graph.play(media), Err(EngineError::NoSource(_))));
        assert!(!graph.is_playing(media));
    }
}
