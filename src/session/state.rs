use serde::Serialize;

use crate::{camera::CameraState, game::GameState, quiz::QuizState, settings::GameplaySettings};

use super::view::ErrorKind;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Idle,
    Quiz,
    Game,
}

/// Everything the session owns besides the countdown, which has its own
/// controller and lock.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub initialized: bool,
    pub mode: Mode,
    /// Example count of the last fully loaded model
    pub model_examples: Option<usize>,
    pub camera: CameraState,
    pub hand_detected: bool,
    pub game: GameState,
    pub quiz: QuizState,
    pub settings: GameplaySettings,
    /// Sticky error shown until the next successful action
    pub last_error: Option<(ErrorKind, String)>,
}

impl SessionState {
    pub fn new(settings: GameplaySettings) -> Self {
        Self {
            game: GameState::new(settings.max_rounds),
            settings,
            ..Self::default()
        }
    }
}
