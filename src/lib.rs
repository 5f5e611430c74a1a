//! Playgraph library - playback graph control with spectrum analysis

pub mod bands;
pub mod cli;
pub mod controller;
pub mod engine;
pub mod params;

pub use controller::{AnalysisBuffer, GraphNodes, PlaybackGraphController};
pub use engine::{AudioEngine, EngineError, NativeEngine};
pub use params::{FilterState, GraphConfig};
