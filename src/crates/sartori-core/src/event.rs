//! Events handed from compiled streams to the scheduler

use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a trigger fired the `e` (event) or `m` (mutation) pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Event,
    Mutation,
}

/// A single triggered event with its resolved parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub stream_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub cycle_time: f64,
    pub params: BTreeMap<String, Value>,
}

impl Event {
    pub fn new(stream_id: impl Into<String>, kind: EventKind, cycle_time: f64) -> Self {
        Event {
            stream_id: stream_id.into(),
            kind,
            cycle_time,
            params: BTreeMap::new(),
        }
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Number parameter, or `default` when missing or not numeric
    pub fn number(&self, key: &str, default: f64) -> f64 {
        self.param(key).and_then(Value::as_number).unwrap_or(default)
    }
}

/// A tempo change requested by the global stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub cycle_time: f64,
    pub cps: f64,
}

/// Output of one compilation window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compiled {
    pub tempo: Vec<TempoChange>,
    pub events: Vec<Event>,
}

impl Compiled {
    pub fn is_empty(&self) -> bool {
        self.tempo.is_empty() && self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_flat() {
        let mut event = Event::new("s0", EventKind::Event, 0.5);
        event.params.insert("n".into(), Value::from(60.0));
        event.params.insert("s".into(), Value::from("bd"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "stream_id": "s0",
                "type": "event",
                "cycle_time": 0.5,
                "params": { "n": 60.0, "s": "bd" }
            })
        );
    }

    #[test]
    fn test_number_param_default() {
        let event = Event::new("s0", EventKind::Mutation, 0.0);
        assert_eq!(event.number("amp", 0.5), 0.5);
    }
}
