//! Tick driver
//!
//! A [`Clock`] runs a thread that waits for each tick time on a
//! [`TimeSource`] and calls back. The callback returns the duration until
//! the following tick, so tempo changes take effect from the next tick.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Source of the current time in seconds
pub trait TimeSource: Send + Sync {
    fn now(&self) -> f64;

    /// Block until `now() >= time`
    fn sleep_until(&self, time: f64);
}

/// Wall-clock time measured from creation with a monotonic `Instant`
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    start: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        SystemTimeSource { start: Instant::now() }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn sleep_until(&self, time: f64) {
        let wait = time - self.now();
        if wait > 0.0 {
            thread::sleep(Duration::from_secs_f64(wait));
        }
    }
}

/// Time that only moves when told to. Sleeping jumps straight to the
/// requested time, which makes a clock on it run as fast as it can.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    time: Arc<Mutex<f64>>,
}

impl ManualTimeSource {
    pub fn new(start: f64) -> Self {
        ManualTimeSource {
            time: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, time: f64) {
        *self.time.lock() = time;
    }

    pub fn advance(&self, seconds: f64) {
        *self.time.lock() += seconds;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> f64 {
        *self.time.lock()
    }

    fn sleep_until(&self, time: f64) {
        let mut now = self.time.lock();
        if *now < time {
            *now = time;
        }
    }
}

/// A running tick thread
pub struct Clock {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Clock {
    /// Start ticking at `begin`. `on_tick` receives each tick's time and
    /// returns the seconds until the next tick, or `None` to stop.
    pub fn start<T, F>(time: Arc<T>, begin: f64, mut on_tick: F) -> Clock
    where
        T: TimeSource + ?Sized + 'static,
        F: FnMut(f64) -> Option<f64> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::spawn(move || {
            let mut next = begin;
            while flag.load(Ordering::Acquire) {
                time.sleep_until(next);
                if !flag.load(Ordering::Acquire) {
                    break;
                }
                match on_tick(next) {
                    Some(duration) if duration > 0.0 && duration.is_finite() => next += duration,
                    _ => break,
                }
            }
            flag.store(false, Ordering::Release);
        });

        Clock {
            running,
            handle: Some(handle),
        }
    }

    /// Stop after the current tick; a tick already running completes
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Wait for the tick thread to exit
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_time() {
        let time = ManualTimeSource::new(1.0);
        time.advance(0.5);
        assert_eq!(time.now(), 1.5);
        time.sleep_until(1.0);
        assert_eq!(time.now(), 1.5);
        time.sleep_until(4.0);
        assert_eq!(time.now(), 4.0);
    }

    #[test]
    fn test_clock_ticks_until_callback_stops() {
        let time = Arc::new(ManualTimeSource::new(0.0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        let clock = Clock::start(Arc::clone(&time), 1.0, move |t| {
            let mut log = log.lock();
            log.push(t);
            (log.len() < 4).then_some(0.25)
        });
        clock.join();

        assert_eq!(*seen.lock(), vec![1.0, 1.25, 1.5, 1.75]);
        assert_eq!(time.now(), 1.75);
    }

    #[test]
    fn test_clock_stop_flag() {
        let time = Arc::new(SystemTimeSource::new());
        let clock = Clock::start(time, 0.0, |_| Some(0.01));
        assert!(clock.is_running());
        clock.stop();
        assert!(!clock.is_running());
        clock.join();
    }
}
