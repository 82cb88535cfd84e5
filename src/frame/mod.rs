pub mod commands;
pub mod processor;

pub use processor::{FrameInput, FrameProcessor, FrameView};
