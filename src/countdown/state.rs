use serde::{Deserialize, Serialize};

use crate::quiz::ChoiceKey;

pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CountdownState {
    pub active: bool,
    pub remaining: u32,
    /// Label captured when the countdown was armed; only set while active
    pub pending_label: Option<ChoiceKey>,
}

impl CountdownState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, label: ChoiceKey, seconds: u32) {
        *self = Self {
            active: true,
            remaining: seconds,
            pending_label: Some(label),
        };
    }

    /// One second elapsed; returns what is left.
    pub fn tick(&mut self) -> u32 {
        if self.active {
            self.remaining = self.remaining.saturating_sub(1);
        }
        self.remaining
    }

    /// Back to idle, handing out the label that was pending.
    pub fn clear(&mut self) -> Option<ChoiceKey> {
        let label = self.pending_label.take();
        *self = Self::default();
        label
    }
}
