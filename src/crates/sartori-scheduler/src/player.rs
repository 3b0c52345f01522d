//! Realtime player driving a [`Scheduler`] from a [`Clock`]

use crate::{Clock, EventSource, PlayState, Scheduler, TimeSource};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Owns a scheduler behind a lock shared with the clock thread, so the
/// source can be edited while it plays.
pub struct Player<S, T: ?Sized> {
    scheduler: Arc<Mutex<Scheduler<S>>>,
    time: Arc<T>,
    clock: Option<Clock>,
}

impl<S, T> Player<S, T>
where
    S: EventSource + 'static,
    T: TimeSource + ?Sized + 'static,
{
    pub fn new(scheduler: Scheduler<S>, time: Arc<T>) -> Self {
        Player {
            scheduler: Arc::new(Mutex::new(scheduler)),
            time,
            clock: None,
        }
    }

    /// Start from cycle 0 now. Restarts if already playing.
    pub fn play(&mut self) {
        self.stop();
        let now = self.time.now();
        self.scheduler.lock().play(now);
        info!(at = now, "playback started");

        let scheduler = Arc::clone(&self.scheduler);
        self.clock = Some(Clock::start(Arc::clone(&self.time), now, move |t| {
            scheduler.lock().tick(t).map(|report| report.next_tick)
        }));
    }

    pub fn stop(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.stop();
            self.scheduler.lock().stop();
            clock.join();
            info!("playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.clock.as_ref().is_some_and(Clock::is_running)
            && self.scheduler.lock().state() == PlayState::Running
    }

    /// Run `edit` against the source between ticks
    pub fn with_source<R>(&self, edit: impl FnOnce(&mut S) -> R) -> R {
        edit(self.scheduler.lock().source_mut())
    }

    pub fn scheduler(&self) -> Arc<Mutex<Scheduler<S>>> {
        Arc::clone(&self.scheduler)
    }
}

impl<S, T: ?Sized> Drop for Player<S, T> {
    fn drop(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.stop();
        }
    }
}
