//! Glue between the player's button and the store.
//!
//! A click starts playback when stopped and stops it when playing.
//! Starting playback also schedules a `Next` action, which advances the
//! screen to the next title after a delay.

use crate::{Action, PlayerStore, DEFAULT_TITLE};
use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    rc::Rc,
    time::Duration,
};

/// Title shown when playback starts.
pub const PLAY_TITLE: &str = "精彩继续...";
/// Title shown by the delayed `Next` action.
pub const NEXT_TITLE: &str = "下一个精彩...";
/// Delay between starting playback and the `Next` action.
pub const NEXT_DELAY: Duration = Duration::from_millis(2000);

/// Runs a task once, after a delay. All tasks run on the thread that
/// owns the store.
pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        (**self).schedule(delay, task)
    }
}

struct ScheduledTask {
    deadline: Duration,
    sequence: u64,
    task: Box<dyn FnOnce()>,
}

/// A [Scheduler] driven by hand, running tasks when time is advanced
/// with [advance()](ManualScheduler::advance()).
///
/// Tasks with the same deadline run in the order they were scheduled.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_sequence: Cell<u64>,
    tasks: RefCell<Vec<ScheduledTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// The number of tasks that have not run yet.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Move time forward by `by`, running every task that falls due,
    /// including tasks scheduled by those tasks. Returns the number of
    /// tasks that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get().saturating_add(by);
        let mut ran = 0;

        loop {
            let due = {
                let mut tasks = self.tasks.borrow_mut();
                let next = tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.deadline <= target)
                    .min_by_key(|(_, t)| (t.deadline, t.sequence))
                    .map(|(index, _)| index);
                next.map(|index| tasks.remove(index))
            };

            match due {
                Some(scheduled) => {
                    self.now.set(scheduled.deadline);
                    (scheduled.task)();
                    ran += 1;
                }
                None => break,
            }
        }

        self.now.set(target);
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        let sequence = self.next_sequence.get();
        self.next_sequence.set(sequence + 1);
        self.tasks.borrow_mut().push(ScheduledTask {
            deadline: self.now.get().saturating_add(delay),
            sequence,
            task,
        });
    }
}

impl Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now.get())
            .field("pending", &self.pending())
            .finish()
    }
}

/// What happens to a scheduled `Next` when playback is stopped before
/// it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingNextPolicy {
    /// The `Next` still runs, and replaces the title shown by the
    /// stopped player.
    FireAlways,
    /// Stopping cancels the pending `Next`.
    CancelOnStop,
}

impl Default for PendingNextPolicy {
    fn default() -> Self {
        PendingNextPolicy::FireAlways
    }
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    play_title: String,
    next_title: String,
    stop_title: String,
    next_delay: Duration,
    pending_next: PendingNextPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            play_title: PLAY_TITLE.to_string(),
            next_title: NEXT_TITLE.to_string(),
            stop_title: DEFAULT_TITLE.to_string(),
            next_delay: NEXT_DELAY,
            pending_next: PendingNextPolicy::default(),
        }
    }
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play_title<S: Into<String>>(mut self, title: S) -> Self {
        self.play_title = title.into();
        self
    }

    pub fn next_title<S: Into<String>>(mut self, title: S) -> Self {
        self.next_title = title.into();
        self
    }

    pub fn stop_title<S: Into<String>>(mut self, title: S) -> Self {
        self.stop_title = title.into();
        self
    }

    pub fn next_delay(mut self, delay: Duration) -> Self {
        self.next_delay = delay;
        self
    }

    pub fn pending_next(mut self, policy: PendingNextPolicy) -> Self {
        self.pending_next = policy;
        self
    }
}

/// Shared flag telling a scheduled task not to run.
#[derive(Debug, Clone, Default)]
struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    fn cancel(&self) {
        self.0.set(true);
    }

    fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Translates clicks on the player's button into actions.
pub struct PlayerController<S> {
    store: PlayerStore,
    scheduler: S,
    config: ControllerConfig,
    pending_next: RefCell<Option<CancellationToken>>,
}

impl<S: Scheduler> PlayerController<S> {
    pub fn new(store: PlayerStore, scheduler: S) -> Self {
        Self::with_config(store, scheduler, ControllerConfig::default())
    }

    pub fn with_config(store: PlayerStore, scheduler: S, config: ControllerConfig) -> Self {
        Self {
            store,
            scheduler,
            config,
            pending_next: RefCell::new(None),
        }
    }

    pub fn store(&self) -> &PlayerStore {
        &self.store
    }

    /// Handle a click on the button: play if stopped, stop if playing.
    pub fn click(&self) {
        if self.store.state().is_playing {
            self.stop();
        } else {
            self.play();
        }
    }

    fn play(&self) {
        self.store.dispatch(Action::play(self.config.play_title.as_str()));
        self.schedule_next();
    }

    fn stop(&self) {
        if let Some(token) = self.pending_next.borrow_mut().take() {
            if self.config.pending_next == PendingNextPolicy::CancelOnStop {
                log::debug!("cancelling pending next");
                token.cancel();
            }
        }
        self.store.dispatch(Action::stop(self.config.stop_title.as_str()));
    }

    fn schedule_next(&self) {
        let token = CancellationToken::default();
        let task_token = token.clone();
        let store = self.store.clone();
        let title = self.config.next_title.clone();

        self.scheduler.schedule(
            self.config.next_delay,
            Box::new(move || {
                if task_token.is_cancelled() {
                    return;
                }
                if !store.state().is_playing {
                    log::warn!("applying delayed next to a stopped player");
                }
                store.dispatch(Action::next(title));
            }),
        );

        *self.pending_next.borrow_mut() = Some(token);
    }
}
