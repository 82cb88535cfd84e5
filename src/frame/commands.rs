use tauri::State;

use crate::AppState;

use super::{FrameInput, FrameView};

/// One render-loop iteration. The webview keeps requesting animation frames
/// while `continueLoop` is set.
#[tauri::command]
pub async fn process_frame(state: State<'_, AppState>, frame: FrameInput) -> Result<FrameView, String> {
    let frames = state.frames.clone();
    Ok(frames.process(frame).await)
}
