use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::{error, info, warn};
use tokio::{sync::Mutex, time};
use tokio_util::sync::CancellationToken;

use crate::{
    camera::CaptureRequest,
    classifier::{ModelInfo, PoseClassifier},
    countdown::CountdownController,
    events::{emit, EventSink, CAMERA_CHANGED, STATUS_CHANGED},
    game::{computer_choice, GameState, Move, RoundRecord},
    quiz::{ChoiceKey, QuestionBank},
    settings::GameplaySettings,
};

use super::{
    state::{Mode, SessionState},
    view::{status_view, ErrorKind, StatusView},
};

/// What happened to a classified label.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelRoute {
    /// Answer countdown started for this key
    Armed(ChoiceKey),
    Round(RoundRecord),
    Ignored,
}

/// Owns all session state and the timers that mutate it.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    countdown: CountdownController,
    cooldown: Arc<Mutex<Option<CancellationToken>>>,
    classifier: PoseClassifier,
    bank: Arc<QuestionBank>,
    sink: Arc<dyn EventSink>,
}

impl Session {
    pub fn new(sink: Arc<dyn EventSink>, bank: QuestionBank, settings: GameplaySettings) -> Self {
        Self {
            countdown: CountdownController::new(sink.clone(), settings.countdown_seconds),
            classifier: PoseClassifier::new(settings.knn_k),
            state: Arc::new(Mutex::new(SessionState::new(settings))),
            cooldown: Arc::new(Mutex::new(None)),
            bank: Arc::new(bank),
            sink,
        }
    }

    pub fn classifier(&self) -> &PoseClassifier {
        &self.classifier
    }

    pub fn countdown(&self) -> &CountdownController {
        &self.countdown
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn status(&self) -> StatusView {
        status_view(&*self.state.lock().await)
    }

    /// The frontend finished setting up the landmark detector.
    pub async fn mark_initialized(&self) -> StatusView {
        let mut state = self.state.lock().await;
        state.initialized = true;
        state.last_error = None;
        info!("Landmark detector ready");
        self.publish(&state)
    }

    pub async fn report_error(&self, kind: ErrorKind, message: String) -> StatusView {
        warn!("{kind:?} error reported: {message}");
        if kind == ErrorKind::Camera {
            // Capture never started, or it died
            self.stop_timers().await;
        }
        let mut state = self.state.lock().await;
        if kind == ErrorKind::Camera {
            state.camera.set_capturing(false);
            state.hand_detected = false;
        }
        state.last_error = Some((kind, message));
        self.publish(&state)
    }

    pub async fn apply_settings(&self, settings: GameplaySettings) {
        self.countdown.set_seconds(settings.countdown_seconds);
        self.classifier.set_k(settings.knn_k);
        let mut state = self.state.lock().await;
        if state.mode != Mode::Game || state.game.round == 0 {
            state.game = GameState::new(settings.max_rounds);
        }
        state.settings = settings;
    }

    pub async fn load_model(&self, document: &str) -> Result<ModelInfo> {
        let result = self.classifier.load_training_set(document);

        let mut state = self.state.lock().await;
        match &result {
            Ok(_) => state.last_error = None,
            Err(err) => {
                error!("Model load failed: {err:#}");
                state.last_error = Some((ErrorKind::ModelLoad, format!("{err:#}")));
            }
        }
        // A failed load may still have replaced the examples
        state.model_examples = self
            .classifier
            .is_trained()
            .then(|| self.classifier.example_count());
        self.publish(&state);
        result
    }

    pub async fn start_quiz(&self) -> StatusView {
        self.stop_timers().await;

        let mut state = self.state.lock().await;
        let length = state.settings.quiz_length;
        state.mode = Mode::Quiz;
        state.last_error = None;
        state.quiz.start(&self.bank, length, &mut rand::thread_rng());
        info!(
            "Quiz started with {} questions (attempt {:?})",
            state.quiz.total(),
            state.quiz.attempt_id
        );
        self.publish(&state)
    }

    pub async fn start_game(&self) -> StatusView {
        self.stop_timers().await;

        let mut state = self.state.lock().await;
        state.mode = Mode::Game;
        state.last_error = None;
        state.quiz.reset();
        state.game = GameState::new(state.settings.max_rounds);
        info!("Rock-paper-scissors started, {} rounds", state.game.max_rounds);
        self.publish(&state)
    }

    /// Back to round one. Only the round cooldown belongs to the game; an
    /// answer countdown of a running quiz is left alone.
    pub async fn reset_game(&self) -> StatusView {
        self.cancel_cooldown().await;

        let mut state = self.state.lock().await;
        state.game.reset();
        self.publish(&state)
    }

    pub async fn toggle_camera(&self) -> CaptureRequest {
        let request = {
            let mut state = self.state.lock().await;
            let request = state.camera.toggle();
            state.last_error = None;
            if !request.capturing {
                state.hand_detected = false;
            }
            request
        };

        if request.release_tracks {
            info!("Capture stopped, cancelling pending timers");
            self.stop_timers().await;
        } else {
            info!(
                "Capture requested at {}x{}",
                request.width, request.height
            );
        }

        emit(self.sink.as_ref(), CAMERA_CHANGED, &request);
        let state = self.state.lock().await;
        self.publish(&state);
        request
    }

    pub async fn is_capturing(&self) -> bool {
        self.state.lock().await.camera.capturing
    }

    pub async fn set_hand_detected(&self, detected: bool) {
        self.state.lock().await.hand_detected = detected;
    }

    /// Feed one classified label into whichever mode is active.
    pub async fn route_label(&self, label: &str, confidence: f32) -> LabelRoute {
        let mode = self.state.lock().await.mode;
        match mode {
            Mode::Quiz => self.route_answer(label).await,
            Mode::Game => self.route_move(label, confidence).await,
            Mode::Idle => LabelRoute::Ignored,
        }
    }

    async fn route_answer(&self, label: &str) -> LabelRoute {
        let Some(key) = ChoiceKey::from_label(label) else {
            return LabelRoute::Ignored;
        };
        if !self.state.lock().await.quiz.is_active() {
            return LabelRoute::Ignored;
        }

        let session = self.clone();
        let armed = self
            .countdown
            .arm(key, move |key| async move {
                session.commit_answer(key).await;
            })
            .await;

        if armed {
            LabelRoute::Armed(key)
        } else {
            LabelRoute::Ignored
        }
    }

    /// Submit the answer the countdown locked in.
    pub async fn commit_answer(&self, key: ChoiceKey) -> Option<bool> {
        let mut state = self.state.lock().await;
        if state.mode != Mode::Quiz {
            return None;
        }
        let correct = state.quiz.submit_answer(key)?;
        info!(
            "Answer {} {} ({}/{})",
            key.as_str(),
            if correct { "correct" } else { "wrong" },
            state.quiz.current,
            state.quiz.total()
        );
        if state.quiz.finished {
            info!(
                "Quiz finished with {}/{}",
                state.quiz.score,
                state.quiz.total()
            );
        }
        self.publish(&state);
        Some(correct)
    }

    async fn route_move(&self, label: &str, confidence: f32) -> LabelRoute {
        let Some(player) = Move::from_label(label) else {
            return LabelRoute::Ignored;
        };

        let (record, cooldown) = {
            let mut state = self.state.lock().await;
            let computer = computer_choice(&mut rand::thread_rng());
            let Some(record) = state.game.play_round(player, confidence, computer) else {
                return LabelRoute::Ignored;
            };
            info!(
                "Round {}: {} vs {} -> {:?}",
                record.round,
                player.as_str(),
                computer.as_str(),
                record.outcome
            );
            self.publish(&state);
            let cooldown = (!state.game.game_over)
                .then(|| Duration::from_millis(state.settings.round_cooldown_ms));
            (record, cooldown)
        };

        if let Some(delay) = cooldown {
            self.schedule_cooldown(delay).await;
        }
        LabelRoute::Round(record)
    }

    async fn schedule_cooldown(&self, delay: Duration) {
        let token = CancellationToken::new();
        if let Some(previous) = self.cooldown.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let session = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(delay) => {
                    let mut state = session.state.lock().await;
                    if token.is_cancelled() {
                        return;
                    }
                    state.game.ready_for_next_move();
                    session.publish(&state);
                }
            }
        });
    }

    async fn cancel_cooldown(&self) {
        if let Some(token) = self.cooldown.lock().await.take() {
            token.cancel();
        }
    }

    async fn stop_timers(&self) {
        self.countdown.cancel().await;
        self.cancel_cooldown().await;
    }

    fn publish(&self, state: &SessionState) -> StatusView {
        let view = status_view(state);
        emit(self.sink.as_ref(), STATUS_CHANGED, &view);
        view
    }
}
