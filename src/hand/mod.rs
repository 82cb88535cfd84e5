//! Hand landmark model shared between the detector payload and the classifier.
//!
//! The webview runs the landmark detector and ships each detected hand as 21
//! normalized keypoints. Rust only flattens them into pose vectors and tells
//! the frontend which keypoints to connect when drawing the skeleton.

use serde::{Deserialize, Serialize};

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

pub const LANDMARKS_PER_HAND: usize = 21;

/// Hand skeleton connections (MediaPipe hand topology, palm included)
pub const HAND_SKELETON: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (WRIST, PINKY_MCP),
];

/// A single keypoint as reported by the detector (0-1 normalized x/y).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HandLandmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth; some detector builds omit it
    #[serde(default)]
    pub z: Option<f32>,
}

/// One detected hand.
pub type Hand = Vec<HandLandmark>;

/// Flatten keypoints into `[x0, y0, z0, x1, ...]`, missing depth counts as 0.
pub fn flatten_pose(landmarks: &[HandLandmark]) -> Vec<f32> {
    landmarks
        .iter()
        .flat_map(|lm| [lm.x, lm.y, lm.z.unwrap_or(0.0)])
        .collect()
}

/// Skeleton line segments in normalized coordinates for the overlay.
///
/// Connections that reference a missing keypoint are skipped so partial
/// detections still draw what they can.
pub fn skeleton_segments(landmarks: &[HandLandmark]) -> Vec<[(f32, f32); 2]> {
    HAND_SKELETON
        .iter()
        .filter_map(|&(from, to)| {
            let a = landmarks.get(from)?;
            let b = landmarks.get(to)?;
            Some([(a.x, a.y), (b.x, b.y)])
        })
        .collect()
}
