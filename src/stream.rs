//! Streams: named bags of parameter patterns
//!
//! A stream is one musical layer. Its `e` pattern marks discrete events and
//! its `m` pattern marks mutation pulses; at every truthy trigger the other
//! parameters are sampled to build the event's parameter map.

use sartori_core::{
    sample, set, silence, Event, EventKind, Hap, Pattern, PatternError, State, Value, EPSILON,
};
use std::collections::BTreeMap;

/// Keys `set` never stores
pub const RESERVED: &[&str] = &["id", "set", "query", "reset"];

/// Trigger key for events
pub const EVENTS: &str = "e";

/// Trigger key for mutations
pub const MUTATIONS: &str = "m";

/// Id of the tempo stream
pub const GLOBAL: &str = "global";

#[derive(Debug, Clone)]
pub struct Stream {
    id: String,
    params: BTreeMap<String, Pattern>,
}

impl Stream {
    pub fn new(id: impl Into<String>) -> Self {
        Stream {
            id: id.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Store parameters. Patterns are kept as they are, strings go through
    /// mini-notation and everything else repeats once per cycle.
    pub fn set<I>(&mut self, params: I) -> Result<(), PatternError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (key, value) in params {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            let value = match value {
                Value::String(source) => sartori_mini::coerce(&source),
                other => other,
            };
            let pattern = match value {
                Value::Pattern(pattern) => pattern,
                other => set(vec![other])?,
            };
            self.params.insert(key, pattern);
        }
        Ok(())
    }

    /// The pattern stored under `key`, or silence
    pub fn get(&self, key: &str) -> Pattern {
        self.params.get(key).cloned().unwrap_or_else(silence)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn reset(&mut self) {
        self.params.clear();
    }

    /// Resolve the events and mutations triggered inside `state.span`
    pub fn query(&self, state: &State) -> Vec<Event> {
        let mut events = Vec::new();
        for (trigger, kind) in [(EVENTS, EventKind::Event), (MUTATIONS, EventKind::Mutation)] {
            let Some(pattern) = self.params.get(trigger) else {
                continue;
            };
            for hap in pattern.query(state) {
                if !hap.value.is_truthy() || !state.span.contains(hap.from()) {
                    continue;
                }
                events.push(self.resolve(&hap, kind, state));
            }
        }
        events.sort_by(|a, b| a.cycle_time.total_cmp(&b.cycle_time));
        events
    }

    fn resolve(&self, trigger: &Hap, kind: EventKind, state: &State) -> Event {
        let mut event = Event::new(self.id.clone(), kind, trigger.from());
        let keys = self.params.iter().filter(|(key, _)| match kind {
            EventKind::Event => key.as_str() != EVENTS && key.as_str() != MUTATIONS,
            EventKind::Mutation => key.starts_with('_'),
        });
        for (key, pattern) in keys {
            if let Some(value) = nearest(pattern, trigger, state) {
                event.params.insert(key.clone(), value);
            }
        }
        event
    }
}

/// The value(s) of `pattern` starting closest to the trigger. Ties come
/// back as a list, a single value as itself.
fn nearest(pattern: &Pattern, trigger: &Hap, state: &State) -> Option<Value> {
    let haps = pattern.query(&state.set_span(trigger.span));
    let distance = |hap: &Hap| (hap.from() - trigger.from()).abs();
    let closest = haps.iter().map(distance).min_by(f64::total_cmp)?;

    let mut values: Vec<Value> = haps
        .iter()
        .filter(|hap| distance(hap) - closest < EPSILON)
        .map(|hap| sample(&hap.value, state, hap.from(), hap.to()))
        .filter(|value| !value.is_silence())
        .collect();

    match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(Value::List(values)),
    }
}

/// The fixed set of streams user code can address
#[derive(Debug, Clone)]
pub struct StreamPool {
    instruments: Vec<Stream>,
    effects: Vec<Stream>,
    global: Stream,
}

impl Default for StreamPool {
    fn default() -> Self {
        Self::new(16, 4)
    }
}

impl StreamPool {
    /// `s0..s{instruments-1}`, `fx0..fx{effects-1}` and `global`
    pub fn new(instruments: usize, effects: usize) -> Self {
        StreamPool {
            instruments: (0..instruments).map(|i| Stream::new(format!("s{i}"))).collect(),
            effects: (0..effects).map(|i| Stream::new(format!("fx{i}"))).collect(),
            global: Stream::new(GLOBAL),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Stream> {
        self.all().find(|stream| stream.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Stream> {
        self.instruments
            .iter_mut()
            .chain(self.effects.iter_mut())
            .chain(std::iter::once(&mut self.global))
            .find(|stream| stream.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn global(&self) -> &Stream {
        &self.global
    }

    pub fn instruments(&self) -> &[Stream] {
        &self.instruments
    }

    /// Instrument then effect streams, the ones that produce events
    pub fn streams(&self) -> impl Iterator<Item = &Stream> {
        self.instruments.iter().chain(self.effects.iter())
    }

    fn all(&self) -> impl Iterator<Item = &Stream> {
        self.streams().chain(std::iter::once(&self.global))
    }

    pub fn reset(&mut self) {
        self.instruments
            .iter_mut()
            .chain(self.effects.iter_mut())
            .for_each(Stream::reset);
        self.global.reset();
    }
}
