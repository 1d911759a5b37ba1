//! TUI module for hisynth
//!
//! Turns key presses into notes and shows what the voice pool is doing.

mod keyboard;
mod spectrum;
mod voices;
mod waveform;

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use hisynth::{
    engine::AllocatorSnapshot,
    synth::{
        message::{EventReceiver, MessageReceiver},
        note::note_name,
    },
    Instrument, SynthConfig, SynthEvent, ThreadScheduler,
};

use keyboard::{HeldKeys, Keyboard, AUTO_RELEASE};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use voices::render_voices;
use waveform::render_waveform;

/// Samples kept for the oscilloscope and one FFT frame
pub const VIS_BUFFER_SIZE: usize = 1024;

const EVENT_LOG_LEN: usize = 64;

pub struct UiApp {
    synth: Instrument<ThreadScheduler>,
    events: EventReceiver,
    audio_rx: Consumer<f32>,
    audio_buffer: VecDeque<f32>,
    visible: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    keyboard: Keyboard,
    held: HeldKeys,
    /// Most recent allocator events, newest last
    event_log: VecDeque<String>,
    snapshot: AllocatorSnapshot,
    header: String,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        synth: Instrument<ThreadScheduler>,
        events: EventReceiver,
        audio_rx: Consumer<f32>,
        sample_rate: f32,
        config: &SynthConfig,
        release_events: bool,
    ) -> Self {
        let auto_release = (!release_events).then_some(AUTO_RELEASE);
        let header = format!(
            " hisynth  {} voices  {}  {sample_rate} Hz ",
            config.voices,
            config.waveform.name()
        );
        let snapshot = synth.snapshot();

        Self {
            synth,
            events,
            audio_rx,
            audio_buffer: VecDeque::from(vec![0.0; VIS_BUFFER_SIZE]),
            visible: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, sample_rate),
            keyboard: Keyboard::new(),
            held: HeldKeys::new(auto_release),
            event_log: VecDeque::with_capacity(EVENT_LOG_LEN),
            snapshot,
            header,
            should_quit: false,
        }
    }

    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_events();
            for note in self.held.expire(Instant::now()) {
                self.synth.note_off(note);
            }
            self.snapshot = self.synth.snapshot();

            terminal.draw(|frame| self.render(frame))?;

            // Non-blocking, ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn poll_audio(&mut self) {
        let mut received = false;
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.push_back(sample);
            received = true;
        }
        if !received {
            return;
        }
        let excess = self.audio_buffer.len().saturating_sub(VIS_BUFFER_SIZE);
        self.audio_buffer.drain(..excess);
        for (dst, &src) in self.visible.iter_mut().zip(self.audio_buffer.iter()) {
            *dst = src;
        }
        self.spectrum.update(&self.visible);
    }

    fn poll_events(&mut self) {
        while let Some(event) = MessageReceiver::pop(&mut self.events) {
            if self.event_log.len() == EVENT_LOG_LEN {
                self.event_log.pop_front();
            }
            self.event_log.push_back(describe(event));
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let KeyCode::Char(c) = key.code else {
            if key.code == KeyCode::Esc && key.kind == KeyEventKind::Press {
                self.should_quit = true;
            }
            return;
        };

        match (c, key.kind) {
            ('q' | 'Q', KeyEventKind::Press) => self.should_quit = true,
            (' ', KeyEventKind::Press) => {
                self.held.clear();
                self.synth.all_notes_off();
            }
            ('z' | 'Z', KeyEventKind::Press) => self.keyboard.octave_down(),
            ('x' | 'X', KeyEventKind::Press) => self.keyboard.octave_up(),
            (c, KeyEventKind::Press | KeyEventKind::Repeat) => {
                let Some(note) = self.keyboard.note_for(c) else {
                    return;
                };
                if self.held.press(c.to_ascii_lowercase(), note, Instant::now()) {
                    self.synth.note_on(note);
                }
            }
            (c, KeyEventKind::Release) => {
                if let Some(note) = self.held.release(c.to_ascii_lowercase()) {
                    self.synth.note_off(note);
                }
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(8),    // Voices + event log
                Constraint::Length(9), // Scopes
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        let header = Paragraph::new(format!(
            "{}  octave {}  held {}",
            self.header,
            self.keyboard.octave(),
            self.snapshot.active.len()
        ))
        .style(Style::default().fg(Color::White));
        frame.render_widget(header, rows[0]);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
        render_voices(frame, middle[0], &self.snapshot);
        self.render_event_log(frame, middle[1]);

        let scopes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);
        render_waveform(frame, scopes[0], &self.visible);
        render_spectrum(frame, scopes[1], &self.spectrum);

        let help = Paragraph::new(
            " [A-;] Play  [Z/X] Octave  [Space] All notes off  [Q/Esc] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[3]);
    }

    fn render_event_log(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let items: Vec<ListItem> = self
            .event_log
            .iter()
            .rev()
            .take(height)
            .rev()
            .map(|line| ListItem::new(Line::from(line.as_str())))
            .collect();
        let list = List::new(items).block(Block::default().title(" Events ").borders(Borders::ALL));
        frame.render_widget(list, area);
    }
}

fn describe(event: SynthEvent) -> String {
    match event {
        SynthEvent::NoteAllocated { note, slot } => format!("{} → slot {slot}", note_name(note)),
        SynthEvent::NoteRetriggered { note, slot } => {
            format!("{} retriggered on slot {slot}", note_name(note))
        }
        SynthEvent::NoteStolen { stolen, note, slot } => format!(
            "{} stole slot {slot} from {}",
            note_name(note),
            note_name(stolen)
        ),
        SynthEvent::NoteReleased { note, slot } => {
            format!("{} released (slot {slot})", note_name(note))
        }
        SynthEvent::VoiceFreed { note, slot } => {
            format!("slot {slot} free ({} done)", note_name(note))
        }
        SynthEvent::ModulationSynced => "filter LFO restarted".to_string(),
    }
}
