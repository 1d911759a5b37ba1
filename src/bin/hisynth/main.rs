//! hisynth - play the polyphonic synth from the computer keyboard
//!
//! Run with: cargo run -- --voices 8 --waveform saw

mod app;
mod ui;

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use hisynth::{dsp::OscillatorWaveform, SynthConfig};

use app::HiSynth;

/// Terminal keyboard for the polyphonic synth
#[derive(Parser)]
#[command(name = "hisynth")]
#[command(version)]
struct Cli {
    /// Number of voices in the pool
    #[arg(short, long, default_value_t = 8)]
    voices: usize,

    /// Oscillator waveform
    #[arg(short, long, default_value = "saw")]
    waveform: Waveform,

    /// Level of a newly triggered voice (0.0-1.0)
    #[arg(long, default_value_t = 0.8)]
    level: f32,

    /// Envelope release in seconds
    #[arg(long, default_value_t = 0.5)]
    release: f32,

    /// Reverb wet amount (0.0-1.0)
    #[arg(long, default_value_t = 0.3)]
    reverb: f32,

    /// Write logs here; the terminal belongs to the UI (filter with RUST_LOG)
    #[arg(long, default_value = "hisynth.log")]
    log_file: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
    Pulse,
}

impl From<Waveform> for OscillatorWaveform {
    fn from(waveform: Waveform) -> Self {
        match waveform {
            Waveform::Sine => OscillatorWaveform::Sine,
            Waveform::Square => OscillatorWaveform::Square,
            Waveform::Saw => OscillatorWaveform::Saw,
            Waveform::Triangle => OscillatorWaveform::Triangle,
            Waveform::Pulse => OscillatorWaveform::pulse(),
        }
    }
}

fn init_logging(path: &Path) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let config = SynthConfig::default()
        .with_voices(cli.voices)
        .with_waveform(cli.waveform.into())
        .with_level(cli.level)
        .with_release(cli.release)
        .with_reverb_mix(cli.reverb);
    config.validate().wrap_err("invalid synth settings")?;

    log::info!("hisynth starting");
    HiSynth::new(config).run()
}
