//! Errors raised by the native engine.

use std::fmt;

use super::{MediaId, NodeId, ParamKind};

/// Errors that can occur while building or driving the native graph.
#[derive(Debug)]
pub enum EngineError {
    /// The media file could not be opened.
    Io(std::io::Error),
    /// The media file is not decodable audio.
    Decode(hound::Error),
    /// Decoded fine, but the sample layout is not one the engine plays.
    UnsupportedFormat(String),
    /// `play()` on a media element that has no source bound.
    NoSource(MediaId),
    /// The node handle does not belong to this engine.
    UnknownNode(NodeId),
    /// The media handle does not belong to this engine.
    UnknownMedia(MediaId),
    /// The node has no parameter of this kind.
    InvalidParam(NodeId, ParamKind),
    /// Parameter values must be finite.
    NonFinite(f32),
    /// The connection is not allowed (cycle, into a source, out of the destination).
    InvalidConnection(String),
    /// An FFT size outside the accepted range or not a power of two.
    IndexSize(usize),
    /// The operation conflicts with the object's current state.
    InvalidState(String),
    /// The output device failed or could not be opened.
    Device(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot open media: {e}"),
            Self::Decode(e) => write!(f, "cannot decode media: {e}"),
            Self::UnsupportedFormat(msg) => write!(f, "unsupported audio format: {msg}"),
            Self::NoSource(id) => write!(f, "media element {id} has no source"),
            Self::UnknownNode(id) => write!(f, "node {id} not found"),
            Self::UnknownMedia(id) => write!(f, "media element {id} not found"),
            Self::InvalidParam(id, param) => write!(f, "node {id} has no {param:?} parameter"),
            Self::NonFinite(value) => write!(f, "parameter value {value} is not finite"),
            Self::InvalidConnection(msg) => write!(f, "invalid connection: {msg}"),
            Self::IndexSize(size) => write!(f, "FFT size {size} out of range"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::Device(msg) => write!(f, "audio device error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<hound::Error> for EngineError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => Self::Io(io),
            other => Self::Decode(other),
        }
    }
}
