//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::params::GraphConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "playgraph")]
#[command(about = "Play a sound file through high-pass, low-pass and gain with a live spectrum", long_about = None)]
pub struct Args {
    /// WAV file to play
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Playback gain (not clamped; 1.0 = unity)
    #[arg(long, value_name = "GAIN", allow_negative_numbers = true)]
    pub volume: Option<f32>,

    /// Enable the high-pass filter at this cutoff
    #[arg(long, value_name = "HZ")]
    pub high_pass: Option<f32>,

    /// High-pass resonance
    #[arg(long, value_name = "DB", allow_negative_numbers = true, requires = "high_pass")]
    pub high_pass_q: Option<f32>,

    /// Enable the low-pass filter at this cutoff
    #[arg(long, value_name = "HZ")]
    pub low_pass: Option<f32>,

    /// Low-pass resonance
    #[arg(long, value_name = "DB", allow_negative_numbers = true, requires = "low_pass")]
    pub low_pass_q: Option<f32>,

    /// Analyser resolution (power of 2, 32..=32768)
    #[arg(long, value_name = "SAMPLES", default_value = "256")]
    pub fft_size: usize,

    /// Spectrum meter refresh interval
    #[arg(long, value_name = "MS", default_value = "50")]
    pub meter_interval_ms: u64,

    /// Stop after this many seconds (default: end of file)
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,
}

impl Args {
    /// Graph configuration with command-line overrides applied
    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            fft_size: self.fft_size,
            ..GraphConfig::default()
        }
    }
}
