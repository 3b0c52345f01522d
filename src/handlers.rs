//! Event handlers: where scheduled events leave the engine

use anyhow::Context;
use sartori_core::{Event, EventKind, Value};
use sartori_scheduler::EventHandler;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, info};

/// An event with its dispatch time in seconds
#[derive(Debug, Serialize)]
struct Timed<'a> {
    time: f64,
    #[serde(flatten)]
    event: &'a Event,
}

/// Writes one JSON object per event
pub struct JsonLinesHandler<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesHandler<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesHandler { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventHandler for JsonLinesHandler<W> {
    fn name(&self) -> &str {
        "json"
    }

    fn handle(&mut self, event: &Event, time: f64) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, &Timed { time, event })
            .context("failed to serialize event")?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Logs every event at info level
#[derive(Debug, Default)]
pub struct LogHandler;

impl EventHandler for LogHandler {
    fn name(&self) -> &str {
        "log"
    }

    fn handle(&mut self, event: &Event, time: f64) -> anyhow::Result<()> {
        let params = serde_json::to_string(&event.params)?;
        info!(
            stream = %event.stream_id,
            kind = ?event.kind,
            cycle = event.cycle_time,
            time,
            %params,
            "event"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl MidiMessage {
    /// Raw status and data bytes
    pub fn to_bytes(self) -> [u8; 3] {
        match self {
            MidiMessage::NoteOn { channel, note, velocity } => [0x90 | (channel & 0x0F), note, velocity],
            MidiMessage::NoteOff { channel, note, velocity } => [0x80 | (channel & 0x0F), note, velocity],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => [0xB0 | (channel & 0x0F), controller, value],
        }
    }
}

/// A destination for timed MIDI messages
pub trait MidiOutput: Send {
    fn send(&mut self, time: f64, message: MidiMessage) -> anyhow::Result<()>;
}

/// Logs messages as raw bytes; the default when no device is attached
#[derive(Debug, Default)]
pub struct TraceMidiOutput {
    pub name: String,
}

impl MidiOutput for TraceMidiOutput {
    fn send(&mut self, time: f64, message: MidiMessage) -> anyhow::Result<()> {
        let bytes = message.to_bytes();
        info!(output = %self.name, time, ?message, ?bytes, "midi");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    #[error("unknown MIDI output '{requested}', sent to '{fallback}' instead")]
    UnknownOutput { requested: String, fallback: String },
}

/// Turns events carrying a `midi` parameter into note and controller
/// messages.
///
/// Recognised parameters: `midi` (output name), `midichan` (1-16, or a
/// list of channels; every channel when absent), `n` (note, default 60),
/// `amp` (0-1 velocity, default 0.5), `dur` (ms, default 500), `mididelay`
/// (ms) and `cc<N>` (0-1 controller values).
pub struct MidiHandler {
    outputs: BTreeMap<String, Box<dyn MidiOutput>>,
    default: String,
}

impl MidiHandler {
    pub fn new(default: impl Into<String>, output: Box<dyn MidiOutput>) -> Self {
        let default = default.into();
        let mut outputs = BTreeMap::new();
        outputs.insert(default.clone(), output);
        MidiHandler { outputs, default }
    }

    pub fn add_output(&mut self, name: impl Into<String>, output: Box<dyn MidiOutput>) {
        self.outputs.insert(name.into(), output);
    }

    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }
}

fn number(event: &Event, key: &str) -> Option<f64> {
    match event.params.get(key)? {
        Value::List(items) => items.first().and_then(Value::as_number),
        value => value.as_number(),
    }
}

fn byte(value: f64) -> u8 {
    value.round().clamp(0.0, 127.0) as u8
}

fn unit_byte(value: f64) -> u8 {
    byte(value.clamp(0.0, 1.0) * 127.0)
}

fn channels(event: &Event) -> Vec<u8> {
    let requested: Vec<f64> = match event.params.get("midichan") {
        Some(Value::List(items)) => items.iter().filter_map(Value::as_number).collect(),
        Some(value) => value.as_number().into_iter().collect(),
        None => Vec::new(),
    };
    let valid: Vec<u8> = requested
        .into_iter()
        .filter(|c| (1.0..=16.0).contains(c))
        .map(|c| c as u8 - 1)
        .collect();
    if valid.is_empty() {
        (0..16).collect()
    } else {
        valid
    }
}

/// The messages an event produces, with their times in seconds
pub fn midi_messages(event: &Event, time: f64) -> Vec<(f64, MidiMessage)> {
    let delay = number(event, "mididelay").unwrap_or(0.0) / 1000.0;
    let duration = number(event, "dur").unwrap_or(500.0) / 1000.0;
    let note = byte(number(event, "n").unwrap_or(60.0));
    let velocity = unit_byte(number(event, "amp").unwrap_or(0.5));
    let start = time + delay;

    let controllers: Vec<(u8, u8)> = event
        .params
        .keys()
        .filter_map(|key| {
            let controller = key.strip_prefix("cc")?.parse::<u8>().ok().filter(|c| *c < 128)?;
            Some((controller, unit_byte(number(event, key)?)))
        })
        .collect();

    let mut messages = Vec::new();
    for channel in channels(event) {
        for &(controller, value) in &controllers {
            messages.push((start, MidiMessage::ControlChange { channel, controller, value }));
        }
        messages.push((start, MidiMessage::NoteOn { channel, note, velocity }));
        messages.push((
            start + duration,
            MidiMessage::NoteOff {
                channel,
                note,
                velocity: 0,
            },
        ));
    }
    messages
}

impl EventHandler for MidiHandler {
    fn name(&self) -> &str {
        "midi"
    }

    fn handle(&mut self, event: &Event, time: f64) -> anyhow::Result<()> {
        if event.kind != EventKind::Event {
            return Ok(());
        }
        let Some(device) = event.params.get("midi") else {
            return Ok(());
        };
        let requested = device.to_string();

        let (name, routing) = if self.outputs.contains_key(&requested) {
            (requested, None)
        } else {
            let fallback = self.default.clone();
            let err = RoutingError::UnknownOutput {
                requested,
                fallback: fallback.clone(),
            };
            (fallback, Some(err))
        };

        if let Some(output) = self.outputs.get_mut(&name) {
            let messages = midi_messages(event, time);
            debug!(output = %name, count = messages.len(), "midi event");
            for (at, message) in messages {
                output.send(at, message)?;
            }
        }

        match routing {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}
