mod common;

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use common::{init_logging, recording_allocator};
use hisynth::engine::ThreadScheduler;

const RELEASE: Duration = Duration::from_millis(20);
const GUARD: Duration = Duration::from_millis(10);

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    done()
}

#[test]
fn slot_is_freed_after_release_and_guard() {
    init_logging();
    let scheduler = ThreadScheduler::new().unwrap();
    let (allocator, _) = recording_allocator(2, RELEASE, scheduler);
    let allocator = allocator.with_guard_interval(GUARD);

    allocator.note_on(60);
    let released_at = Instant::now();
    allocator.note_off(60);
    assert_eq!(allocator.slot_of(60), Some(0));

    assert!(wait_until(Duration::from_secs(2), || allocator.slot_of(60).is_none()));
    assert!(released_at.elapsed() >= RELEASE + GUARD);
    assert_eq!(allocator.scheduler().pending(), 0);
}

#[test]
fn retrigger_survives_the_old_deadline() {
    init_logging();
    let scheduler = ThreadScheduler::new().unwrap();
    let (allocator, _) = recording_allocator(2, RELEASE, scheduler);
    let allocator = allocator.with_guard_interval(GUARD);

    allocator.note_on(60);
    allocator.note_off(60);
    allocator.note_on(60);

    thread::sleep((RELEASE + GUARD) * 3);
    assert_eq!(allocator.slot_of(60), Some(0));
    assert_eq!(allocator.snapshot().active, vec![60]);
}

#[test]
fn concurrent_players_keep_the_pool_consistent() {
    init_logging();
    const VOICES: usize = 3;
    let scheduler = ThreadScheduler::new().unwrap();
    let (allocator, _) = recording_allocator(VOICES, RELEASE, scheduler);
    let allocator = Arc::new(allocator.with_guard_interval(GUARD));

    let players: Vec<_> = (0..4u8)
        .map(|player| {
            let allocator = Arc::clone(&allocator);
            thread::spawn(move || {
                for i in 0..50u8 {
                    let note = 40 + player * 12 + i % 7;
                    allocator.note_on(note);
                    assert!(allocator.allocated_count() <= VOICES);
                    thread::sleep(Duration::from_millis(1));
                    allocator.note_off(note);
                }
            })
        })
        .collect();
    for player in players {
        player.join().unwrap();
    }

    assert_eq!(allocator.active_count(), 0);
    assert!(wait_until(Duration::from_secs(2), || allocator.allocated_count() == 0));
}
