//! Audio engine capability and its native implementation.
//!
//! The playback controller never touches samples. It talks to an
//! [`AudioEngine`]: something that owns audio nodes, connects them and
//! applies parameter changes. [`NativeEngine`] renders a real graph to the
//! default output device; tests substitute a recording fake.

mod analyser;
mod error;
mod filter;
mod graph;
mod media;
mod native;
mod param;

#[cfg(test)]
pub(crate) mod fake;

pub use error::EngineError;
pub use graph::RenderGraph;
pub use media::{decode_wav, DecodedAudio, MediaElement};
pub use native::NativeEngine;

use std::fmt;

/// Opaque handle to an engine-owned processing node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Opaque handle to an engine-owned media element (the playable file)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaId({})", self.0)
    }
}

/// Biquad filter response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    HighPass,
    LowPass,
}

/// Automatable scalar parameter of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Linear gain of a gain node
    Gain,
    /// Cutoff frequency of a filter (Hz)
    Frequency,
    /// Resonance of a filter (dB)
    Q,
}

/// Node graph engine the playback controller drives.
///
/// Every method is a one-way command with immediate effect; rendering
/// happens inside the engine. Errors are the engine's own and are passed
/// through callers untouched.
pub trait AudioEngine {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Engine clock in seconds, the reference for scheduled changes
    fn current_time(&self) -> f64;

    /// Rate the graph renders at (Hz)
    fn sample_rate(&self) -> f32;

    /// Create an unbound media element
    fn create_media_element(&mut self) -> Result<MediaId, Self::Error>;

    /// Point a media element at a new resource. Stops and rewinds playback.
    fn set_media_source(&mut self, media: MediaId, path: &str) -> Result<(), Self::Error>;

    fn play(&mut self, media: MediaId) -> Result<(), Self::Error>;

    fn pause(&mut self, media: MediaId) -> Result<(), Self::Error>;

    fn is_playing(&self, media: MediaId) -> bool;

    /// Create the node that feeds a media element's audio into the graph
    fn create_media_source(&mut self, media: MediaId) -> Result<NodeId, Self::Error>;

    fn create_biquad_filter(&mut self, kind: FilterKind) -> Result<NodeId, Self::Error>;

    fn create_analyser(&mut self) -> Result<NodeId, Self::Error>;

    fn create_gain(&mut self) -> Result<NodeId, Self::Error>;

    /// The node that reaches the speakers
    fn destination(&self) -> NodeId;

    /// Route `from`'s output into `to`'s input
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), Self::Error>;

    /// Write a parameter's value directly
    fn set_param_value(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
    ) -> Result<(), Self::Error>;

    /// Schedule a parameter to jump to `value` at engine time `time`
    fn set_param_value_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        time: f64,
    ) -> Result<(), Self::Error>;

    /// Set an analyser's FFT size (samples)
    fn set_fft_size(&mut self, analyser: NodeId, fft_size: usize) -> Result<(), Self::Error>;

    /// Copy the analyser's current byte spectrum into `out`.
    ///
    /// Writes `min(out.len(), fft_size / 2)` bins.
    fn byte_frequency_data(&mut self, analyser: NodeId, out: &mut [u8])
        -> Result<(), Self::Error>;
}
