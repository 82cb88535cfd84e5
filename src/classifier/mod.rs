//! Pose classification: an in-process k-nearest-neighbor classifier and the
//! async adapter the frame loop talks to.

pub mod adapter;
pub mod knn;

pub use adapter::{ModelInfo, PoseClassifier};
