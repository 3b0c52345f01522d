//! Scheduler for dispatching compiled events at precise times

use crate::{ErrorSink, Event, EventHandler, EventSource, SchedulerConfig, SchedulerError, TempoChange};
use std::time::Instant;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Running,
}

/// Piecewise-constant tempo: `cps` holds from `anchor_cycle`, which fell at
/// `anchor_time` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    pub cps: f64,
    pub anchor_time: f64,
    pub anchor_cycle: f64,
}

impl Tempo {
    pub fn new(cps: f64, anchor_time: f64) -> Self {
        Tempo {
            cps,
            anchor_time,
            anchor_cycle: 0.0,
        }
    }

    /// Seconds at which `cycle` falls
    pub fn time_at(&self, cycle: f64) -> f64 {
        self.anchor_time + (cycle - self.anchor_cycle) / self.cps
    }

    /// Switch to `cps` from `cycle` on, keeping earlier cycles where they were
    pub fn change(&mut self, cycle: f64, cps: f64) {
        self.anchor_time = self.time_at(cycle);
        self.anchor_cycle = cycle;
        self.cps = cps;
    }
}

/// Summary of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub from: f64,
    pub to: f64,
    pub dispatched: usize,
    /// Seconds until the next tick at the tempo in force after this one
    pub next_tick: f64,
    pub errors: Vec<SchedulerError>,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Ticks an [`EventSource`] and hands its events to the handlers
pub struct Scheduler<S> {
    source: S,
    handlers: Vec<Box<dyn EventHandler>>,
    config: SchedulerConfig,
    state: PlayState,
    phase: f64,
    origin: f64,
    tempo: Tempo,
    error_sink: Option<ErrorSink>,
}

impl<S: EventSource> Scheduler<S> {
    pub fn new(source: S, config: SchedulerConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Scheduler {
            source,
            handlers: Vec::new(),
            config,
            state: PlayState::Stopped,
            phase: 0.0,
            origin: 0.0,
            tempo: Tempo::new(config.default_cps, 0.0),
            error_sink: None,
        })
    }

    pub fn add_handler(&mut self, handler: Box<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Forward every tick error to `sink` in addition to the log
    pub fn set_error_sink(&mut self, sink: ErrorSink) {
        self.error_sink = Some(sink);
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Seconds at which cycle 0 of the current run fell
    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn cps(&self) -> f64 {
        self.tempo.cps
    }

    /// Seconds between ticks at the current tempo
    pub fn tick_seconds(&self) -> f64 {
        self.config.tick_duration / self.tempo.cps
    }

    /// Start from cycle 0 at `now`. Does nothing while already running.
    pub fn play(&mut self, now: f64) {
        if self.state == PlayState::Running {
            return;
        }
        self.phase = 0.0;
        self.origin = now;
        self.tempo = Tempo::new(self.tempo.cps, now);
        self.state = PlayState::Running;
        debug!(origin = now, cps = self.tempo.cps, "scheduler started");
    }

    /// Halt ticking; the phase is kept until the next `play`
    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
        debug!(phase = self.phase, "scheduler stopped");
    }

    /// Compile and dispatch the next window. `None` when stopped.
    pub fn tick(&mut self, now: f64) -> Option<TickReport> {
        if self.state != PlayState::Running {
            return None;
        }
        let started = Instant::now();
        let from = self.phase;
        let to = round3(from + self.config.tick_duration);

        let compiled = self.source.compile(from, to, self.tempo.cps);
        let mut changes = compiled.tempo;
        changes.sort_by(|a, b| a.cycle_time.total_cmp(&b.cycle_time));
        let mut changes = changes.into_iter().peekable();

        let mut errors = Vec::new();
        let mut dispatched = 0;
        for event in &compiled.events {
            while let Some(change) = changes.next_if(|c| c.cycle_time <= event.cycle_time) {
                self.apply_tempo(change);
            }
            let time = self.tempo.time_at(event.cycle_time) + self.config.latency;
            self.dispatch(event, time, &mut errors);
            dispatched += 1;
        }
        for change in changes {
            self.apply_tempo(change);
        }
        self.phase = to;

        let elapsed = started.elapsed().as_secs_f64();
        if elapsed > self.config.latency {
            errors.push(SchedulerError::Overrun {
                from,
                to,
                elapsed,
                budget: self.config.latency,
            });
        }
        for err in &errors {
            warn!(%err, "tick error");
            if let Some(sink) = &self.error_sink {
                sink(err);
            }
        }
        trace!(from, to, now, dispatched, "tick");

        Some(TickReport {
            from,
            to,
            dispatched,
            next_tick: self.tick_seconds(),
            errors,
        })
    }

    fn apply_tempo(&mut self, change: TempoChange) {
        if !(change.cps > 0.0 && change.cps.is_finite()) {
            warn!(cps = change.cps, cycle = change.cycle_time, "ignoring invalid tempo");
            return;
        }
        if change.cps != self.tempo.cps {
            debug!(cps = change.cps, cycle = change.cycle_time, "tempo change");
        }
        self.tempo.change(change.cycle_time, change.cps);
    }

    fn dispatch(&mut self, event: &Event, time: f64, errors: &mut Vec<SchedulerError>) {
        for handler in &mut self.handlers {
            if let Err(err) = handler.handle(event, time) {
                errors.push(SchedulerError::Handler {
                    handler: handler.name().to_string(),
                    message: format!("{err:#}"),
                });
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{Compiled, EventKind};
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::sync::Arc;

    /// Emits a fixed list of events and tempo changes, filtered to each window
    #[derive(Default)]
    pub(crate) struct FixedSource {
        pub events: Vec<f64>,
        pub tempo: Vec<TempoChange>,
        pub windows: Arc<Mutex<Vec<(f64, f64)>>>,
    }

    impl EventSource for FixedSource {
        fn compile(&mut self, from: f64, to: f64, _cps: f64) -> Compiled {
            self.windows.lock().push((from, to));
            let within = |t: f64| t >= from && t < to;
            Compiled {
                tempo: self.tempo.iter().copied().filter(|c| within(c.cycle_time)).collect(),
                events: self
                    .events
                    .iter()
                    .filter(|t| within(**t))
                    .map(|t| Event::new("s0", EventKind::Event, *t))
                    .collect(),
            }
        }
    }

    /// Records `(cycle_time, timestamp)` pairs
    pub(crate) struct Recorder(pub Arc<Mutex<Vec<(f64, f64)>>>);

    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn handle(&mut self, event: &Event, time: f64) -> anyhow::Result<()> {
            self.0.lock().push((event.cycle_time, time));
            Ok(())
        }
    }

    struct Failing;

    impl EventHandler for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn handle(&mut self, _event: &Event, _time: f64) -> anyhow::Result<()> {
            anyhow::bail!("device unplugged")
        }
    }

    fn scheduler(source: FixedSource) -> (Scheduler<FixedSource>, Arc<Mutex<Vec<(f64, f64)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new(source, SchedulerConfig::default()).unwrap();
        scheduler.add_handler(Box::new(Recorder(Arc::clone(&seen))));
        (scheduler, seen)
    }

    fn run(scheduler: &mut Scheduler<FixedSource>, ticks: usize) {
        let mut now = scheduler.origin();
        for _ in 0..ticks {
            let report = scheduler.tick(now).unwrap();
            now += report.next_tick;
        }
    }

    #[test]
    fn test_stopped_scheduler_does_not_tick() {
        let (mut scheduler, _) = scheduler(FixedSource::default());
        assert!(scheduler.tick(0.0).is_none());
    }

    #[test]
    fn test_windows_advance_by_tick_duration() {
        let source = FixedSource::default();
        let windows = Arc::clone(&source.windows);
        let (mut scheduler, _) = scheduler(source);
        scheduler.play(0.0);
        run(&mut scheduler, 3);

        assert_eq!(*windows.lock(), vec![(0.0, 0.125), (0.125, 0.25), (0.25, 0.375)]);
        assert_eq!(scheduler.phase(), 0.375);
    }

    #[test]
    fn test_timestamps_at_default_tempo() {
        let source = FixedSource {
            events: vec![0.0, 1.0],
            ..Default::default()
        };
        let (mut scheduler, seen) = scheduler(source);
        scheduler.play(10.0);
        run(&mut scheduler, 9);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!((seen[0].1 - 10.1).abs() < 1e-9);
        assert!((seen[1].1 - 12.1).abs() < 1e-9);
    }

    #[test]
    fn test_tempo_change_moves_later_events() {
        let source = FixedSource {
            events: vec![0.5, 1.0, 2.0],
            tempo: vec![TempoChange { cycle_time: 1.0, cps: 1.0 }],
            ..Default::default()
        };
        let (mut scheduler, seen) = scheduler(source);
        scheduler.play(0.0);
        run(&mut scheduler, 17);

        let times: Vec<f64> = seen.lock().iter().map(|(_, t)| *t).collect();
        // cycle 0.5 at 0.5 cps, then cycle 1 lands at 2s and cycle 2 one second later
        let expected = [1.1, 2.1, 3.1];
        for (time, want) in times.iter().zip(expected) {
            assert!((time - want).abs() < 1e-9, "{time} != {want}");
        }
        assert_eq!(scheduler.cps(), 1.0);
        assert!((scheduler.tick_seconds() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_tempo_ignored() {
        let source = FixedSource {
            tempo: vec![TempoChange { cycle_time: 0.0, cps: 0.0 }],
            ..Default::default()
        };
        let (mut scheduler, _) = scheduler(source);
        scheduler.play(0.0);
        scheduler.tick(0.0);
        assert_eq!(scheduler.cps(), 0.5);
    }

    #[test]
    fn test_handler_errors_are_reported_not_fatal() {
        let source = FixedSource {
            events: vec![0.0, 0.125],
            ..Default::default()
        };
        let (mut scheduler, seen) = scheduler(source);
        scheduler.add_handler(Box::new(Failing));
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);
        scheduler.set_error_sink(Box::new(move |err| sink.lock().push(err.clone())));

        scheduler.play(0.0);
        let first = scheduler.tick(0.0).unwrap();
        let second = scheduler.tick(0.25).unwrap();

        assert_eq!(first.dispatched, 1);
        assert_eq!(second.dispatched, 1);
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(reported.lock().len(), 2);
        assert!(matches!(
            &first.errors[0],
            SchedulerError::Handler { handler, message } if handler == "failing" && message == "device unplugged"
        ));
    }

    #[test]
    fn test_stop_keeps_phase_until_play() {
        let (mut scheduler, _) = scheduler(FixedSource::default());
        scheduler.play(0.0);
        run(&mut scheduler, 2);
        scheduler.stop();
        assert_eq!(scheduler.phase(), 0.25);
        assert!(scheduler.tick(1.0).is_none());

        scheduler.play(5.0);
        assert_eq!(scheduler.phase(), 0.0);
        assert_eq!(scheduler.origin(), 5.0);
    }

    #[test]
    fn test_phase_rounding() {
        let (mut scheduler, _) = scheduler(FixedSource::default());
        scheduler.play(0.0);
        run(&mut scheduler, 80);
        assert_eq!(scheduler.phase(), 10.0);
    }

    #[test]
    fn test_shortest_tick_still_advances() {
        let config = SchedulerConfig {
            tick_duration: 0.0004,
            ..Default::default()
        };
        assert!(Scheduler::new(FixedSource::default(), config).is_err());

        let config = SchedulerConfig {
            tick_duration: crate::MIN_TICK_DURATION,
            ..Default::default()
        };
        let mut scheduler = Scheduler::new(FixedSource::default(), config).unwrap();
        scheduler.play(0.0);
        run(&mut scheduler, 5);
        assert_eq!(scheduler.phase(), 0.005);
    }

    proptest! {
        #[test]
        fn prop_tempo_change_is_continuous(
            cps in 0.1f64..4.0,
            next in 0.1f64..4.0,
            at in 0.0f64..16.0,
        ) {
            let mut tempo = Tempo::new(cps, 3.0);
            let boundary = tempo.time_at(at);
            tempo.change(at, next);

            prop_assert!((tempo.time_at(at) - boundary).abs() < 1e-9);
            prop_assert!((tempo.time_at(at + 1.0) - (boundary + 1.0 / next)).abs() < 1e-9);
            prop_assert!(tempo.time_at(at + 0.5) > boundary);
        }
    }
}
