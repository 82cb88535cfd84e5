//! Markup-free view model for the status region.
//!
//! The frontend decides wording and layout; this only says what to show.

use serde::{Deserialize, Serialize};

use crate::{
    game::{FinalOutcome, Move, RoundOutcome, RoundRecord, Score},
    quiz::ChoiceKey,
};

use super::state::{Mode, SessionState};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Initialization,
    Camera,
    ModelLoad,
    Classification,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub key: ChoiceKey,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StatusView {
    Initializing,
    LoadModelPrompt,
    StartPrompt {
        examples: usize,
    },
    NoHand,
    Question {
        number: usize,
        total: usize,
        prompt: String,
        options: Vec<OptionView>,
        score: u32,
    },
    QuizResult {
        score: u32,
        total: usize,
    },
    AwaitingMove {
        round: u32,
        max_rounds: u32,
        score: Score,
    },
    RoundResult {
        round: u32,
        max_rounds: u32,
        player_move: Move,
        /// Percent, 0-100
        confidence: f32,
        computer_move: Move,
        outcome: RoundOutcome,
        score: Score,
    },
    GameOver {
        outcome: FinalOutcome,
        score: Score,
        last_round: Option<RoundRecord>,
    },
    Error {
        error: ErrorKind,
        message: String,
    },
}

impl StatusView {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        StatusView::Error {
            error: kind,
            message: message.into(),
        }
    }
}

/// Derive what the status region shows from the session alone.
pub fn status_view(state: &SessionState) -> StatusView {
    if let Some((kind, message)) = &state.last_error {
        return StatusView::error(*kind, message.clone());
    }
    if !state.initialized {
        return StatusView::Initializing;
    }

    match state.mode {
        Mode::Quiz => quiz_view(state),
        Mode::Game => game_view(state),
        Mode::Idle => {
            if let Some(examples) = state.model_examples {
                StatusView::StartPrompt { examples }
            } else if state.camera.capturing && !state.hand_detected {
                StatusView::NoHand
            } else {
                StatusView::LoadModelPrompt
            }
        }
    }
}

fn quiz_view(state: &SessionState) -> StatusView {
    let quiz = &state.quiz;
    if let Some(question) = quiz.current_question() {
        return StatusView::Question {
            number: quiz.current + 1,
            total: quiz.total(),
            prompt: question.prompt.clone(),
            options: question
                .options
                .iter()
                .map(|(key, text)| OptionView {
                    key: *key,
                    text: text.clone(),
                })
                .collect(),
            score: quiz.score,
        };
    }

    if quiz.finished {
        StatusView::QuizResult {
            score: quiz.score,
            total: quiz.total(),
        }
    } else {
        StatusView::LoadModelPrompt
    }
}

fn game_view(state: &SessionState) -> StatusView {
    let game = &state.game;
    if let Some(outcome) = game.final_outcome() {
        return StatusView::GameOver {
            outcome,
            score: game.score,
            last_round: game.last_round.clone(),
        };
    }

    match (&game.last_round, game.player_made_move) {
        (Some(record), true) => StatusView::RoundResult {
            round: record.round,
            max_rounds: game.max_rounds,
            player_move: record.player_move,
            confidence: record.confidence * 100.0,
            computer_move: record.computer_move,
            outcome: record.outcome,
            score: game.score,
        },
        _ if state.camera.capturing && !state.hand_detected => StatusView::NoHand,
        _ => StatusView::AwaitingMove {
            round: game.round + 1,
            max_rounds: game.max_rounds,
            score: game.score,
        },
    }
}
