use std::time::Duration;

use log::debug;
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    config::SynthConfig,
    engine::allocator::ModulationSync,
    graph::{
        envelope::EnvNode,
        filter::SweptLowPass,
        node::{GraphNode, RenderCtx},
        oscillator::OscNode,
        reverb::ReverbNode,
    },
    synth::{
        message::{BusCommand, MessageReceiver, VoiceCommand},
        voice::VoiceOutput,
    },
    MAX_BLOCK_SIZE,
};

/*
Voice bank
==========

The audio-thread half of the instrument. Each slot is an oscillator shaped
by an envelope; the allocator reaches it only through a `VoiceHandle`, which
pushes commands into a small lock-free ring:

    allocator ──VoiceHandle──► ring ──► SlotVoice ─┐
    allocator ──VoiceHandle──► ring ──► SlotVoice ─┼─► Σ ─► swept low-pass ─► reverb ─► out
    allocator ──Modulation───► ring ───────────────┘        (LFO restart)

Commands are applied at the start of the next rendered block, so a steal
(retune + gate) lands atomically from the listener's point of view. If a ring
is full the command is dropped; at 64 entries per slot that only happens when
the audio thread has stopped pulling.
*/

const COMMAND_QUEUE_SIZE: usize = 64;

/// Allocator-side control of one slot.
pub struct VoiceHandle {
    slot: usize,
    tx: Producer<VoiceCommand>,
    release: Duration,
}

impl VoiceHandle {
    fn send(&mut self, command: VoiceCommand) {
        if self.tx.push(command).is_err() {
            debug!("slot {} command queue full, dropping {command:?}", self.slot);
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl VoiceOutput for VoiceHandle {
    fn set_frequency(&mut self, hz: f32) {
        self.send(VoiceCommand::SetFrequency(hz));
    }

    fn set_amplitude(&mut self, level: f32) {
        self.send(VoiceCommand::SetAmplitude(level));
    }

    fn open_gate(&mut self) {
        self.send(VoiceCommand::OpenGate);
    }

    fn close_gate(&mut self) {
        self.send(VoiceCommand::CloseGate);
    }

    fn release_duration(&self) -> Duration {
        self.release
    }
}

/// Allocator-side trigger for the filter-sweep LFO restart.
pub struct ModulationHandle {
    tx: Producer<BusCommand>,
}

impl ModulationSync for ModulationHandle {
    fn restart(&mut self) {
        if self.tx.push(BusCommand::RestartLfo).is_err() {
            debug!("bus command queue full, dropping LFO restart");
        }
    }
}

/// Audio-side oscillator + envelope for one slot.
pub struct SlotVoice {
    osc: OscNode,
    env: EnvNode,
    rx: Consumer<VoiceCommand>,
    frequency: f32,
    amplitude: f32,
    env_buffer: Vec<f32>,
}

impl SlotVoice {
    pub fn new(slot: usize, config: &SynthConfig) -> (Self, VoiceHandle) {
        let env = EnvNode::adsr(config.attack, config.decay, config.sustain, config.release);
        let (tx, rx) = RingBuffer::<VoiceCommand>::new(COMMAND_QUEUE_SIZE);

        let handle = VoiceHandle {
            slot,
            tx,
            release: env.release_duration(),
        };
        let voice = Self {
            osc: OscNode::new(config.waveform),
            env,
            rx,
            frequency: 0.0,
            amplitude: 0.0,
            env_buffer: vec![0.0; MAX_BLOCK_SIZE],
        };
        (voice, handle)
    }

    fn apply_commands(&mut self, sample_rate: f32) {
        while let Some(command) = MessageReceiver::pop(&mut self.rx) {
            let ctx = RenderCtx::from_freq(sample_rate, self.frequency, self.amplitude);
            match command {
                VoiceCommand::SetFrequency(hz) => self.frequency = hz,
                VoiceCommand::SetAmplitude(level) => self.amplitude = level.clamp(0.0, 1.0),
                VoiceCommand::OpenGate => self.env.note_on(&ctx),
                VoiceCommand::CloseGate => self.env.note_off(&ctx),
            }
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn envelope_level(&self) -> f32 {
        self.env.level()
    }
}

impl GraphNode for SlotVoice {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.apply_commands(ctx.sample_rate);
        if !self.env.is_active() {
            out.fill(0.0);
            return;
        }

        let voice_ctx = RenderCtx::from_freq(ctx.sample_rate, self.frequency, self.amplitude);
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let gain = &mut self.env_buffer[..chunk.len()];
            self.osc.render_block(chunk, &voice_ctx);
            self.env.render_block(gain, &voice_ctx);
            for (sample, &g) in chunk.iter_mut().zip(gain.iter()) {
                *sample *= g * self.amplitude;
            }
        }
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}

/// Every slot voice plus the mix bus, rendered from the audio callback.
pub struct VoiceBank {
    voices: Vec<SlotVoice>,
    bus_rx: Consumer<BusCommand>,
    filter: SweptLowPass,
    reverb: ReverbNode,
    sample_rate: f32,
    gain: f32,
    scratch: Vec<f32>,
}

impl VoiceBank {
    /// Build the bank and the control handles the allocator drives it with.
    pub fn new(
        config: &SynthConfig,
        sample_rate: f32,
    ) -> (Self, Vec<VoiceHandle>, ModulationHandle) {
        let (voices, handles): (Vec<_>, Vec<_>) = (0..config.voices)
            .map(|slot| SlotVoice::new(slot, config))
            .unzip();
        let (bus_tx, bus_rx) = RingBuffer::<BusCommand>::new(COMMAND_QUEUE_SIZE);

        let bank = Self {
            voices,
            bus_rx,
            filter: SweptLowPass::new(config.lfo_rate, config.filter_cutoff),
            reverb: ReverbNode::hall(config.reverb_mix),
            sample_rate,
            // keep a full chord from clipping
            gain: 1.0 / (config.voices.max(1) as f32).sqrt(),
            scratch: vec![0.0; MAX_BLOCK_SIZE],
        };
        (bank, handles, ModulationHandle { tx: bus_tx })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Slots whose envelope is still producing sound.
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn voices(&self) -> &[SlotVoice] {
        &self.voices
    }

    /// Render mono output. Never allocates.
    pub fn render(&mut self, out: &mut [f32]) {
        while let Some(BusCommand::RestartLfo) = MessageReceiver::pop(&mut self.bus_rx) {
            self.filter.restart_lfo();
        }

        let ctx = RenderCtx::from_freq(self.sample_rate, 0.0, 1.0);
        for block in out.chunks_mut(MAX_BLOCK_SIZE) {
            block.fill(0.0);
            let scratch = &mut self.scratch[..block.len()];
            for voice in &mut self.voices {
                voice.render_block(scratch, &ctx);
                for (o, &s) in block.iter_mut().zip(scratch.iter()) {
                    *o += s * self.gain;
                }
            }
            self.filter.render_block(block, &ctx);
            self.reverb.render_block(block, &ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::note::midi_note_to_freq;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn config() -> SynthConfig {
        SynthConfig::default()
            .with_voices(2)
            .with_envelope(0.001, 0.01, 1.0, 0.01)
            .with_reverb_mix(0.0)
    }

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn silent_until_gate_opens() {
        let (mut bank, _handles, _modulation) = VoiceBank::new(&config(), SAMPLE_RATE);
        let mut out = vec![0.0; 512];
        bank.render(&mut out);
        assert_eq!(peak(&out), 0.0);
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn commands_reach_the_slot() {
        let (mut bank, mut handles, _modulation) = VoiceBank::new(&config(), SAMPLE_RATE);
        handles[1].set_frequency(midi_note_to_freq(57));
        handles[1].open_gate();
        handles[1].set_amplitude(0.8);

        let mut out = vec![0.0; 1024];
        bank.render(&mut out);

        assert_eq!(bank.active_voices(), 1);
        assert!((bank.voices()[1].frequency() - 220.0).abs() < 1e-2);
        assert!(peak(&out) > 0.01);
    }

    #[test]
    fn closed_gate_decays_to_silence() {
        let (mut bank, mut handles, _modulation) = VoiceBank::new(&config(), SAMPLE_RATE);
        handles[0].set_frequency(440.0);
        handles[0].open_gate();
        handles[0].set_amplitude(1.0);
        let mut out = vec![0.0; 2048];
        bank.render(&mut out);

        handles[0].close_gate();
        // release is 10 ms = 480 samples
        bank.render(&mut out);
        assert_eq!(bank.active_voices(), 0);
        assert_eq!(handles[0].release_duration(), Duration::from_secs_f32(0.01));
    }

    #[test]
    fn full_queue_drops_commands() {
        let (_bank, mut handles, _modulation) = VoiceBank::new(&config(), SAMPLE_RATE);
        for _ in 0..(COMMAND_QUEUE_SIZE + 10) {
            handles[0].open_gate();
        }
        assert_eq!(handles[0].tx.slots(), 0);
    }
}
