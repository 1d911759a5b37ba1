use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};

/*
Release scheduling
==================

When a key is released the voice keeps ringing for its release time. The
allocator asks the scheduler to run a "finalize" task once that time (plus a
guard interval) has passed. If the same key is pressed again before then, the
task is cancelled.

    note_off ──schedule(release + guard)──► [ timeline ] ──deadline──► task()
    note_on  ──cancel(handle)─────────────►     ✕

Guarantees:
  - a cancel that happens before the deadline suppresses the task
  - a task runs at most once
  - tasks run with no scheduler lock held, so they may lock the allocator

Two clocks are provided: `ThreadScheduler` waits on a worker thread using
real time; `ManualScheduler` only moves when told to, which makes allocator
behaviour reproducible in tests.
*/

/// Token for a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait ReleaseScheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;

    /// Returns true if the task was still pending and will now never run.
    fn cancel(&self, handle: TimerHandle) -> bool;
}

impl<S: ReleaseScheduler + ?Sized> ReleaseScheduler for Arc<S> {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        (**self).schedule(delay, task)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        (**self).cancel(handle)
    }
}

/// Deadline-ordered task set shared by both clocks.
///
/// Cancelled tasks are removed from `tasks` immediately; their heap entries
/// are skipped lazily when they reach the top.
struct Timeline<T> {
    next_id: u64,
    deadlines: BinaryHeap<Reverse<(T, u64)>>,
    tasks: HashMap<u64, Task>,
}

impl<T: Ord + Copy> Timeline<T> {
    fn new() -> Self {
        Self {
            next_id: 0,
            deadlines: BinaryHeap::new(),
            tasks: HashMap::new(),
        }
    }

    fn insert(&mut self, deadline: T, task: Task) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.deadlines.push(Reverse((deadline, id)));
        self.tasks.insert(id, task);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.tasks.remove(&handle.0).is_some()
    }

    /// Earliest live deadline, discarding stale heap entries on the way.
    fn next_deadline(&mut self) -> Option<T> {
        while let Some(&Reverse((deadline, id))) = self.deadlines.peek() {
            if self.tasks.contains_key(&id) {
                return Some(deadline);
            }
            self.deadlines.pop();
        }
        None
    }

    /// Remove and return the earliest task due at or before `now`.
    fn pop_due(&mut self, now: T) -> Option<(T, Task)> {
        let deadline = self.next_deadline()?;
        if deadline > now {
            return None;
        }
        let Reverse((deadline, id)) = self.deadlines.pop()?;
        self.tasks.remove(&id).map(|task| (deadline, task))
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }
}

struct WorkerState {
    timeline: Timeline<Instant>,
    shutdown: bool,
}

struct WorkerShared {
    state: Mutex<WorkerState>,
    wake: Condvar,
}

/// Runs release tasks on a dedicated background thread.
///
/// Dropping the scheduler stops the thread; tasks still pending are discarded.
pub struct ThreadScheduler {
    shared: Arc<WorkerShared>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadScheduler {
    pub fn new() -> io::Result<Self> {
        let shared = Arc::new(WorkerShared {
            state: Mutex::new(WorkerState {
                timeline: Timeline::new(),
                shutdown: false,
            }),
            wake: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("hisynth-release".into())
            .spawn(move || run_worker(&worker_shared))?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().timeline.len()
    }
}

fn run_worker(shared: &WorkerShared) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            break;
        }

        if let Some((_, task)) = state.timeline.pop_due(Instant::now()) {
            MutexGuard::unlocked(&mut state, task);
            continue;
        }

        match state.timeline.next_deadline() {
            Some(deadline) => {
                shared.wake.wait_until(&mut state, deadline);
            }
            None => shared.wake.wait(&mut state),
        }
    }
    log::debug!(
        "release scheduler stopped with {} pending task(s)",
        state.timeline.len()
    );
}

impl ReleaseScheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let mut state = self.shared.state.lock();
        let handle = state.timeline.insert(Instant::now() + delay, task);
        self.shared.wake.notify_one();
        handle
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        self.shared.state.lock().timeline.cancel(handle)
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.wake.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("release scheduler thread panicked");
            }
        }
    }
}

struct ManualState {
    now: Duration,
    timeline: Timeline<Duration>,
}

/// Scheduler driven by an explicit virtual clock.
///
/// Nothing runs until `advance` is called; due tasks then run on the calling
/// thread in deadline order (ties in scheduling order).
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: Duration::ZERO,
                timeline: Timeline::new(),
            }),
        }
    }

    /// Virtual time elapsed since construction.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.state.lock().timeline.len()
    }

    /// Move the clock forward by `by`, running every task that falls due.
    /// Returns how many tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().now + by;
        let mut ran = 0;
        loop {
            let task = {
                let mut state = self.state.lock();
                match state.timeline.pop_due(target) {
                    Some((deadline, task)) => {
                        state.now = state.now.max(deadline);
                        task
                    }
                    None => {
                        state.now = target;
                        break;
                    }
                }
            };
            task();
            ran += 1;
        }
        ran
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let mut state = self.state.lock();
        let deadline = state.now + delay;
        state.timeline.insert(deadline, task)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        self.state.lock().timeline.cancel(handle)
    }
}
