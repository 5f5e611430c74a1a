//! Playgraph - play a sound file through a filter chain and watch its spectrum.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use playgraph::bands::{meter_line, SpectrumBands};
use playgraph::cli::Args;
use playgraph::params::BandConfig;
use playgraph::{AudioEngine, EngineError, NativeEngine, PlaybackGraphController};

/// Width of each band bar in the meter (characters)
const METER_WIDTH: usize = 16;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.graph_config();
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid analyser configuration")?;

    let path = args
        .file
        .to_str()
        .context("File path is not valid UTF-8")?;

    let engine = NativeEngine::new().context("Failed to open audio output")?;
    let mut controller = PlaybackGraphController::setup(engine, config, path)
        .with_context(|| format!("Failed to set up playback of {}", path))?;

    apply_args(&mut controller, &args).context("Failed to apply settings")?;
    controller.play().context("Failed to start playback")?;

    let band_config = BandConfig::new(
        controller.engine().sample_rate(),
        controller.config().fft_size,
    );
    let interval = Duration::from_millis(args.meter_interval_ms);
    let start = Instant::now();

    while controller.is_playing() {
        if let Some(limit) = args.duration {
            if start.elapsed().as_secs_f32() >= limit {
                controller.pause()?;
                break;
            }
        }

        thread::sleep(interval);

        let bins = controller.poll_analysis()?;
        let bands = SpectrumBands::from_bins(bins, &band_config);
        print!("\r{}", meter_line(&bands, METER_WIDTH));
        io::stdout().flush()?;
    }

    println!();
    log::info!("Playback finished after {:.1}s", controller.current_time());
    Ok(())
}

/// Apply volume and filter flags; a filter is only switched on when its cutoff is given
fn apply_args(
    controller: &mut PlaybackGraphController<NativeEngine>,
    args: &Args,
) -> Result<(), EngineError> {
    if let Some(volume) = args.volume {
        controller.set_volume(volume)?;
    }

    if let Some(hz) = args.high_pass {
        controller.set_high_pass_freq(hz)?;
        if let Some(q) = args.high_pass_q {
            controller.set_high_pass_q(q)?;
        }
        log::info!("High-pass: {:?}", controller.high_pass());
    }

    if let Some(hz) = args.low_pass {
        controller.set_low_pass_freq(hz)?;
        if let Some(q) = args.low_pass_q {
            controller.set_low_pass_q(q)?;
        }
        log::info!("Low-pass: {:?}", controller.low_pass());
    }

    Ok(())
}
