//! Sartori: a live-coding pattern language
//!
//! Scripts assign patterns to a fixed pool of [`stream::Stream`]s. The
//! [`compiler::Compiler`] turns a window of cycles into events, and the
//! scheduler from `sartori-scheduler` stamps them with wall-clock times
//! before handing them to the [`handlers`].
//!
//! ```
//! use sartori::compiler::Compiler;
//!
//! let mut compiler = Compiler::default();
//! compiler.evaluate("s0.set({ e: '1 0 1 0', n: '60 62 64 65' })").unwrap();
//!
//! let events = compiler.compile(0.0, 1.0, 0.5).events;
//! assert_eq!(events.len(), 2);
//! ```

pub mod builtins;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod handlers;
pub mod inspect;
pub mod script;
pub mod stream;

pub use compiler::Compiler;
pub use config::Settings;
pub use diagnostics::{Diagnostic, Diagnostics, MessageKind};
pub use script::ScriptError;
pub use stream::{Stream, StreamPool};

pub use sartori_core::{Compiled, Event, EventKind, Pattern, RandomSource, TempoChange, Value};
pub use sartori_scheduler::{Player, Scheduler, SchedulerConfig};
