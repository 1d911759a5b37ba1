//! HiSynth - audio device setup and the terminal session

use std::io::stdout;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::supports_keyboard_enhancement,
};
use rtrb::RingBuffer;

use hisynth::{Synth, SynthConfig, SynthParts, ThreadScheduler, MAX_BLOCK_SIZE};

use super::ui::{UiApp, VIS_BUFFER_SIZE};

pub struct HiSynth {
    config: SynthConfig,
}

impl HiSynth {
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    /// Open the default output device and play until the user quits.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        log::info!("output device: {sample_rate} Hz, {channels} channels");

        let scheduler = ThreadScheduler::new().wrap_err("failed to start release timer thread")?;
        let SynthParts {
            facade,
            mut bank,
            events,
        } = Synth::build(&self.config, sample_rate, scheduler)?;

        // Mono copy of the output for the oscilloscope and spectrum
        let (mut audio_tx, audio_rx) = RingBuffer::<f32>::new(VIS_BUFFER_SIZE * 4);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    bank.render(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                        // UI falling behind only costs visualization samples
                        let _ = audio_tx.push(s);
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        // Keyboard enhancements must be pushed before the alternate screen
        let release_events = supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        } else {
            log::warn!("terminal does not report key releases, notes auto-release");
        }

        let mut terminal = ratatui::init();
        let ui = UiApp::new(
            facade.clone(),
            events,
            audio_rx,
            sample_rate,
            &self.config,
            release_events,
        );
        let result = ui.run(&mut terminal);
        ratatui::restore();
        if release_events {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }

        facade.all_notes_off();
        log::info!("hisynth stopped");
        result
    }
}
