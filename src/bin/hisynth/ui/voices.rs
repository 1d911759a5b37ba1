//! Voice slot table

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use hisynth::{
    engine::AllocatorSnapshot,
    synth::{note::note_name, voice::GateState},
};

/// One row per slot: which note holds it and where it is in its life cycle.
pub fn render_voices(frame: &mut Frame, area: Rect, snapshot: &AllocatorSnapshot) {
    let rows = snapshot.slots.iter().map(|slot| {
        let note = snapshot.note_in_slot(slot.index);
        let (status, color) = match (note, slot.gate) {
            (Some(_), GateState::Open) => ("sounding", Color::Green),
            (Some(_), GateState::Closed) => ("releasing", Color::Yellow),
            (None, _) => ("free", Color::DarkGray),
        };
        let queue = note
            .and_then(|n| snapshot.active.iter().position(|&a| a == n))
            .map(|position| format!("#{}", position + 1))
            .unwrap_or_default();

        Row::new(vec![
            Cell::from(slot.index.to_string()),
            Cell::from(note.map(note_name).unwrap_or_default()),
            Cell::from(match note {
                Some(_) => format!("{:.1} Hz", slot.frequency),
                None => String::new(),
            }),
            Cell::from(status),
            Cell::from(queue),
        ])
        .style(Style::default().fg(color))
    });

    let header = Row::new(vec!["Slot", "Note", "Freq", "State", "Age"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let title = format!(
        " Voices {}/{} ",
        snapshot.allocation.len(),
        snapshot.slots.len()
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(4),
        ],
    )
    .header(header)
    .block(Block::default().title(title).borders(Borders::ALL));

    frame.render_widget(table, area);
}
