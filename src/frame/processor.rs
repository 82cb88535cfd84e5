use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    hand::{flatten_pose, skeleton_segments, Hand, LANDMARKS_PER_HAND},
    session::{ErrorKind, Session, StatusView},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// One animation-frame worth of detector output from the webview.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInput {
    /// `currentTime` of the video element when the frame was read
    pub video_time: f64,
    #[serde(default)]
    pub hands: Vec<Hand>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CountdownOverlay {
    pub value: u32,
    /// Drawn flipped horizontally to match the mirrored camera view
    pub mirrored: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HandReading {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameView {
    pub status: StatusView,
    pub hand_detected: bool,
    /// Line segments per hand, normalized coordinates
    pub skeletons: Vec<Vec<[(f32, f32); 2]>>,
    pub readings: Vec<HandReading>,
    /// A hand is visible but there is no model to classify it with
    pub needs_model: bool,
    pub countdown: Option<CountdownOverlay>,
    /// Schedule another animation frame
    pub continue_loop: bool,
    /// The previous frame was still being processed; nothing was done
    pub skipped: bool,
}

/// Re-uses the last detection while the video clock has not moved.
#[derive(Debug, Default)]
pub struct FrameTracker {
    last_video_time: Option<f64>,
    last_hands: Vec<Hand>,
}

impl FrameTracker {
    /// Returns the hands for this frame and whether they are new.
    pub fn advance(&mut self, input: FrameInput) -> (Vec<Hand>, bool) {
        if self.last_video_time == Some(input.video_time) {
            return (self.last_hands.clone(), false);
        }
        self.last_video_time = Some(input.video_time);
        self.last_hands = input.hands;
        (self.last_hands.clone(), true)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Drives one render-loop iteration against the session.
#[derive(Clone)]
pub struct FrameProcessor {
    session: Session,
    tracker: Arc<Mutex<FrameTracker>>,
}

impl FrameProcessor {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            tracker: Arc::new(Mutex::new(FrameTracker::default())),
        }
    }

    pub async fn process(&self, input: FrameInput) -> FrameView {
        // Frames never overlap; the tracker lock is held until the view is built
        let Ok(mut tracker) = self.tracker.try_lock() else {
            log_debug!("Frame at {:.3}s skipped, previous frame still running", input.video_time);
            return FrameView {
                status: self.session.status().await,
                hand_detected: false,
                skeletons: Vec::new(),
                readings: Vec::new(),
                needs_model: false,
                countdown: self.countdown_overlay().await,
                continue_loop: self.session.is_capturing().await,
                skipped: true,
            };
        };

        if !self.session.is_capturing().await {
            tracker.reset();
            return FrameView {
                status: self.session.status().await,
                hand_detected: false,
                skeletons: Vec::new(),
                readings: Vec::new(),
                needs_model: false,
                countdown: None,
                continue_loop: false,
                skipped: false,
            };
        }

        let (hands, fresh) = tracker.advance(input);
        let hand_detected = !hands.is_empty();
        self.session.set_hand_detected(hand_detected).await;

        let classifier = self.session.classifier();
        let trained = classifier.is_trained();
        let mut readings = Vec::with_capacity(hands.len());
        let mut frame_error = None;

        if fresh && trained {
            for hand in &hands {
                if hand.len() != LANDMARKS_PER_HAND {
                    log_debug!("Hand with {} keypoints instead of {LANDMARKS_PER_HAND}", hand.len());
                }
                match classifier.classify(flatten_pose(hand)).await {
                    Ok(result) => {
                        let confidence = result.confidence();
                        let route = self.session.route_label(&result.label, confidence).await;
                        log_debug!(
                            "Pose {} ({:.0}%) -> {:?}",
                            result.label,
                            confidence * 100.0,
                            route
                        );
                        readings.push(HandReading {
                            label: result.label,
                            confidence,
                        });
                    }
                    Err(err) => {
                        log_warn!("Classification failed: {err:#}");
                        frame_error = Some(StatusView::error(
                            ErrorKind::Classification,
                            format!("{err:#}"),
                        ));
                    }
                }
            }
        }

        let status = match frame_error {
            Some(error) => error,
            None => self.session.status().await,
        };

        FrameView {
            status,
            hand_detected,
            skeletons: hands.iter().map(|hand| skeleton_segments(hand)).collect(),
            readings,
            needs_model: hand_detected && !trained,
            countdown: self.countdown_overlay().await,
            continue_loop: self.session.is_capturing().await,
            skipped: false,
        }
    }

    async fn countdown_overlay(&self) -> Option<CountdownOverlay> {
        let countdown = self.session.countdown().snapshot().await;
        countdown.active.then_some(CountdownOverlay {
            value: countdown.remaining,
            mirrored: true,
        })
    }
}
