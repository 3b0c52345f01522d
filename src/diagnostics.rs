//! Fire-and-forget diagnostics broadcast
//!
//! Every message is mirrored to `tracing` and fanned out to any number of
//! subscribers. Subscribers that went away are pruned on the next send.

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub message: String,
}

#[derive(Clone, Default)]
pub struct Diagnostics {
    subscribers: Arc<Mutex<Vec<Sender<Diagnostic>>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<Diagnostic> {
        let (sender, receiver) = unbounded();
        self.subscribers.lock().push(sender);
        receiver
    }

    pub fn log(&self, kind: MessageKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            MessageKind::Error => error!(target: "sartori::diagnostics", "{message}"),
            MessageKind::Warning => warn!(target: "sartori::diagnostics", "{message}"),
            MessageKind::Info => info!(target: "sartori::diagnostics", "{message}"),
        }
        let diagnostic = Diagnostic { kind, message };
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(diagnostic.clone()).is_ok());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(MessageKind::Error, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(MessageKind::Warning, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(MessageKind::Info, message);
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}
