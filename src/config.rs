//! Construction-time instrument settings.

use std::{error::Error, fmt, time::Duration};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::OscillatorWaveform;

/// Largest supported pool.
pub const MAX_VOICES: usize = 32;

/// Everything the instrument needs to know before it starts. Nothing here can
/// change while it runs.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Pool size N.
    pub voices: usize,
    /// Amplitude of a newly triggered voice (0.0-1.0).
    pub level: f32,
    pub waveform: OscillatorWaveform,
    /// Envelope times in seconds, sustain as a level.
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    /// Seconds added after the release before a slot is freed.
    pub guard_interval: f32,
    /// Filter-sweep LFO rate in Hz.
    pub lfo_rate: f32,
    /// Top of the filter sweep in Hz.
    pub filter_cutoff: f32,
    /// Reverb wet amount (0.0-1.0).
    pub reverb_mix: f32,
    /// Capacity of the UI event ring.
    pub event_capacity: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            voices: 8,
            level: 0.8,
            waveform: OscillatorWaveform::Saw,
            attack: 0.5,
            decay: 0.1,
            sustain: 1.0,
            release: 0.5,
            guard_interval: 0.1,
            lfo_rate: 3.0,
            filter_cutoff: 5000.0,
            reverb_mix: 0.3,
            event_capacity: 256,
        }
    }
}

impl SynthConfig {
    pub fn with_voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_level(mut self, level: f32) -> Self {
        self.level = level;
        self
    }

    pub fn with_waveform(mut self, waveform: OscillatorWaveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn with_envelope(mut self, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        self.attack = attack;
        self.decay = decay;
        self.sustain = sustain;
        self.release = release;
        self
    }

    pub fn with_release(mut self, release: f32) -> Self {
        self.release = release;
        self
    }

    pub fn with_guard_interval(mut self, seconds: f32) -> Self {
        self.guard_interval = seconds;
        self
    }

    pub fn with_filter_sweep(mut self, lfo_rate: f32, cutoff: f32) -> Self {
        self.lfo_rate = lfo_rate;
        self.filter_cutoff = cutoff;
        self
    }

    pub fn with_reverb_mix(mut self, mix: f32) -> Self {
        self.reverb_mix = mix;
        self
    }

    pub fn guard_interval(&self) -> Duration {
        Duration::from_secs_f32(self.guard_interval)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.voices == 0 {
            return Err(ConfigError::NoVoices);
        }
        if self.voices > MAX_VOICES {
            return Err(ConfigError::TooManyVoices {
                requested: self.voices,
                max: MAX_VOICES,
            });
        }
        check_unit("level", self.level)?;
        check_unit("sustain", self.sustain)?;
        check_unit("reverb_mix", self.reverb_mix)?;
        for (name, value) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
            ("guard_interval", self.guard_interval),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { name, value });
            }
        }
        for (name, value) in [("lfo_rate", self.lfo_rate), ("filter_cutoff", self.filter_cutoff)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidFrequency { name, value });
            }
        }
        if let OscillatorWaveform::Pulse { duty } = self.waveform {
            check_unit("pulse duty", duty)?;
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }
}

fn check_unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoVoices,
    TooManyVoices { requested: usize, max: usize },
    OutOfUnitRange { name: &'static str, value: f32 },
    InvalidDuration { name: &'static str, value: f32 },
    InvalidFrequency { name: &'static str, value: f32 },
    InvalidSampleRate(f32),
    ZeroEventCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoVoices => write!(f, "voice pool must have at least one voice"),
            ConfigError::TooManyVoices { requested, max } => {
                write!(f, "{requested} voices requested, at most {max} supported")
            }
            ConfigError::OutOfUnitRange { name, value } => {
                write!(f, "{name} must be within 0.0..=1.0, got {value}")
            }
            ConfigError::InvalidDuration { name, value } => {
                write!(f, "{name} must be a non-negative number of seconds, got {value}")
            }
            ConfigError::InvalidFrequency { name, value } => {
                write!(f, "{name} must be a positive frequency, got {value}")
            }
            ConfigError::InvalidSampleRate(rate) => write!(f, "invalid sample rate {rate}"),
            ConfigError::ZeroEventCapacity => write!(f, "event queue capacity must be non-zero"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SynthConfig::default().validate(), Ok(()));
        assert_eq!(SynthConfig::default().guard_interval(), Duration::from_secs_f32(0.1));
    }

    #[test]
    fn rejects_bad_pool_sizes() {
        assert_eq!(
            SynthConfig::default().with_voices(0).validate(),
            Err(ConfigError::NoVoices)
        );
        assert_eq!(
            SynthConfig::default().with_voices(64).validate(),
            Err(ConfigError::TooManyVoices {
                requested: 64,
                max: MAX_VOICES
            })
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            SynthConfig::default().with_level(1.5).validate(),
            Err(ConfigError::OutOfUnitRange { name: "level", .. })
        ));
        assert!(matches!(
            SynthConfig::default().with_release(-0.1).validate(),
            Err(ConfigError::InvalidDuration { name: "release", .. })
        ));
        assert!(matches!(
            SynthConfig::default().with_filter_sweep(0.0, 5000.0).validate(),
            Err(ConfigError::InvalidFrequency { name: "lfo_rate", .. })
        ));
        assert!(matches!(
            SynthConfig::default()
                .with_waveform(OscillatorWaveform::Pulse { duty: 2.0 })
                .validate(),
            Err(ConfigError::OutOfUnitRange { name: "pulse duty", .. })
        ));
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = SynthConfig::default().with_reverb_mix(3.0).validate().unwrap_err();
        assert_eq!(err.to_string(), "reverb_mix must be within 0.0..=1.0, got 3");
    }
}
