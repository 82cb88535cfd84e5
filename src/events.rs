#[cfg(test)]
use std::sync::Mutex;

use log::warn;
use serde_json::Value;
use tauri::{AppHandle, Emitter};

pub const STATUS_CHANGED: &str = "status-changed";
pub const COUNTDOWN_CHANGED: &str = "countdown-changed";
pub const CAMERA_CHANGED: &str = "camera-changed";

/// Where controllers push state changes for the frontend.
pub trait EventSink: Send + Sync + 'static {
    fn emit_json(&self, event: &str, payload: Value);
}

/// Serialize and emit, logging instead of failing on bad payloads.
pub fn emit<S, T>(sink: &S, event: &str, payload: &T)
where
    S: EventSink + ?Sized,
    T: serde::Serialize,
{
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit_json(event, value),
        Err(err) => warn!("Failed to serialize {event} payload: {err}"),
    }
}

impl EventSink for AppHandle {
    fn emit_json(&self, event: &str, payload: Value) {
        if let Err(err) = Emitter::emit(self, event, payload) {
            warn!("Failed to emit {event}: {err}");
        }
    }
}

/// Sink that keeps every event in memory.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, Value)>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn named(&self, event: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|(name, _)| name == event)
            .map(|(_, payload)| payload)
            .collect()
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn emit_json(&self, event: &str, payload: Value) {
        let mut guard = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((event.to_string(), payload));
    }
}
