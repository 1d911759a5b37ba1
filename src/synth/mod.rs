// Purpose: voice slots, the audio-side voice bank and the note facade
// This layer sits between the allocator and the graph nodes

pub mod bank;
pub mod facade;
pub mod message;
pub mod note;
pub mod pool;
pub mod voice;

use rtrb::RingBuffer;

use crate::{
    config::{ConfigError, SynthConfig},
    engine::{allocator::VoiceAllocator, scheduler::ReleaseScheduler},
    synth::{
        bank::{VoiceBank, VoiceHandle},
        facade::SynthFacade,
        message::EventReceiver,
        pool::VoicePool,
    },
};

/// Facade over voices driven through the audio-thread command rings.
pub type Instrument<S> = SynthFacade<VoiceHandle, S>;

/// Everything `Synth::build` hands back: the note interface for the control
/// side, the bank for the audio callback, and the event stream for the UI.
pub struct SynthParts<S> {
    pub facade: Instrument<S>,
    pub bank: VoiceBank,
    pub events: EventReceiver,
}

pub struct Synth;

impl Synth {
    /// Validate `config` and wire allocator, voice bank and event ring
    /// together.
    pub fn build<S: ReleaseScheduler>(
        config: &SynthConfig,
        sample_rate: f32,
        scheduler: S,
    ) -> Result<SynthParts<S>, ConfigError> {
        config.validate()?;
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }

        let (bank, handles, modulation) = VoiceBank::new(config, sample_rate);
        let (event_tx, event_rx) = RingBuffer::new(config.event_capacity);

        let allocator = VoiceAllocator::new(VoicePool::new(handles), scheduler)
            .with_level(config.level)
            .with_guard_interval(config.guard_interval())
            .with_modulation(Box::new(modulation))
            .with_events(event_tx);

        log::info!(
            "synth ready: {} voices, {} wave, {sample_rate} Hz",
            config.voices,
            config.waveform.name()
        );

        Ok(SynthParts {
            facade: SynthFacade::new(allocator),
            bank,
            events: event_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::ManualScheduler,
        synth::message::{MessageReceiver, SynthEvent},
    };

    #[test]
    fn rejects_invalid_config() {
        let config = SynthConfig::default().with_voices(0);
        assert!(matches!(
            Synth::build(&config, 48_000.0, ManualScheduler::new()),
            Err(ConfigError::NoVoices)
        ));
        assert!(matches!(
            Synth::build(&SynthConfig::default(), 0.0, ManualScheduler::new()),
            Err(ConfigError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn notes_reach_the_bank_and_the_event_stream() {
        let config = SynthConfig::default()
            .with_voices(4)
            .with_envelope(0.001, 0.01, 1.0, 0.01);
        let SynthParts {
            facade,
            mut bank,
            mut events,
        } = Synth::build(&config, 48_000.0, ManualScheduler::new()).unwrap();

        facade.note_on(69);
        assert_eq!(
            MessageReceiver::pop(&mut events),
            Some(SynthEvent::ModulationSynced)
        );
        assert_eq!(
            MessageReceiver::pop(&mut events),
            Some(SynthEvent::NoteAllocated { note: 69, slot: 0 })
        );

        let mut out = vec![0.0; 1024];
        bank.render(&mut out);
        assert_eq!(bank.active_voices(), 1);
        assert!(out.iter().any(|s| s.abs() > 1e-3));
    }
}
