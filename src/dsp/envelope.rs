use std::time::Duration;

use crate::{graph::node::RenderCtx, MIN_TIME};

/*
Gated Amplitude Envelope
========================

Each voice slot owns one of these. The allocator never touches samples; it
only flips the gate:

    open_gate   → Attack from 0, then Decay to sustain, hold at Sustain
    close_gate  → Release from whatever level we are at, down to 0, then Idle

    level
     1 ┤    ╱╲
     S ┤   ╱  ╲________
       │  ╱            ╲
     0 ┼─╱──────────────╲──── Idle
        gate open     gate closed
        │← attack →│      │← release →│

Every stage is a straight ramp from the level at stage entry to the stage
target, spread over `time * sample_rate` samples. Ramps are re-planned when
the stage changes, so reopening the gate in the middle of a release (voice
stealing, retrigger) restarts the attack cleanly from zero.

The release time is what the allocator reads back to know how long a slot
keeps ringing after the gate closes.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear segment from `from` to `to` over `total` samples.
#[derive(Debug, Clone, Copy)]
struct Ramp {
    from: f32,
    to: f32,
    total: u32,
    elapsed: u32,
}

impl Ramp {
    fn new(from: f32, to: f32, seconds: f32, sample_rate: f32) -> Self {
        let total = (seconds.max(MIN_TIME) * sample_rate).round().max(1.0) as u32;
        Self {
            from,
            to,
            total,
            elapsed: 0,
        }
    }

    fn idle() -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            total: 1,
            elapsed: 1,
        }
    }

    /// Advance one sample. Returns the new level and whether the ramp finished.
    #[inline]
    fn step(&mut self) -> (f32, bool) {
        self.elapsed = (self.elapsed + 1).min(self.total);
        let t = self.elapsed as f32 / self.total as f32;
        (self.from + (self.to - self.from) * t, self.elapsed >= self.total)
    }
}

pub struct Envelope {
    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,

    stage: EnvelopeState,
    level: f32,
    ramp: Ramp,
}

impl Envelope {
    /// Defaults match the instrument's voice: slow 0.5 s attack and release.
    pub fn new() -> Self {
        Self::adsr(0.5, 0.1, 1.0, 0.5)
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(MIN_TIME),
            decay: decay.max(MIN_TIME),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(MIN_TIME),
            stage: EnvelopeState::Idle,
            level: 0.0,
            ramp: Ramp::idle(),
        }
    }

    /// Gate open. Always restarts the attack from zero.
    pub fn note_on(&mut self, ctx: &RenderCtx) {
        self.level = 0.0;
        self.enter(EnvelopeState::Attack, ctx);
    }

    /// Gate closed. Releases from the current level; ignored while idle.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        if self.stage == EnvelopeState::Idle {
            return;
        }
        self.enter(EnvelopeState::Release, ctx);
    }

    fn enter(&mut self, stage: EnvelopeState, ctx: &RenderCtx) {
        self.stage = stage;
        self.ramp = match stage {
            EnvelopeState::Attack => Ramp::new(self.level, 1.0, self.attack, ctx.sample_rate),
            EnvelopeState::Decay => Ramp::new(self.level, self.sustain, self.decay, ctx.sample_rate),
            EnvelopeState::Release => Ramp::new(self.level, 0.0, self.release, ctx.sample_rate),
            EnvelopeState::Sustain | EnvelopeState::Idle => Ramp::idle(),
        };
    }

    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        match self.stage {
            EnvelopeState::Idle => self.level = 0.0,
            EnvelopeState::Sustain => self.level = self.sustain,
            stage => {
                let (level, done) = self.ramp.step();
                self.level = level.clamp(0.0, 1.0);
                if done {
                    match stage {
                        EnvelopeState::Attack => self.enter(EnvelopeState::Decay, ctx),
                        EnvelopeState::Decay => self.enter(EnvelopeState::Sustain, ctx),
                        _ => {
                            self.level = 0.0;
                            self.enter(EnvelopeState::Idle, ctx);
                        }
                    }
                }
            }
        }
        self.level
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(ctx);
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.ramp = Ramp::idle();
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }

    pub fn release_duration(&self) -> Duration {
        Duration::from_secs_f32(self.release)
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0)
    }

    fn run(env: &mut Envelope, samples: usize) {
        let ctx = ctx();
        for _ in 0..samples {
            env.next_sample(&ctx);
        }
    }

    #[test]
    fn attack_reaches_full_level_then_decays() {
        let mut env = Envelope::adsr(0.01, 0.05, 0.6, 0.2);
        env.note_on(&ctx());

        run(&mut env, 10);
        assert!(env.level() > 0.99);
        assert_eq!(env.state(), EnvelopeState::Decay);

        run(&mut env, 60);
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - 0.6).abs() < 1e-3);
    }

    #[test]
    fn release_from_mid_attack_reaches_idle() {
        let mut env = Envelope::adsr(0.1, 0.05, 0.5, 0.03);
        env.note_on(&ctx());
        run(&mut env, 50);
        let level_at_release = env.level();
        assert!(level_at_release > 0.4 && level_at_release < 0.6);

        env.note_off(&ctx());
        run(&mut env, 30);

        assert_eq!(env.state(), EnvelopeState::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn reopening_gate_during_release_restarts_attack() {
        let mut env = Envelope::adsr(0.01, 0.01, 1.0, 0.5);
        env.note_on(&ctx());
        run(&mut env, 30);
        env.note_off(&ctx());
        run(&mut env, 100);
        assert_eq!(env.state(), EnvelopeState::Release);

        env.note_on(&ctx());
        assert_eq!(env.state(), EnvelopeState::Attack);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn gate_close_while_idle_is_ignored() {
        let mut env = Envelope::new();
        env.note_off(&ctx());
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert_eq!(env.release_duration(), Duration::from_secs_f32(0.5));
    }
}
