use tauri::State;

use crate::{camera::CaptureRequest, classifier::ModelInfo, AppState};

use super::{ErrorKind, Session, StatusView};

fn session_from_state(state: &State<'_, AppState>) -> Session {
    state.session.clone()
}

#[tauri::command]
pub async fn get_status(state: State<'_, AppState>) -> Result<StatusView, String> {
    Ok(session_from_state(&state).status().await)
}

#[tauri::command]
pub async fn detector_ready(state: State<'_, AppState>) -> Result<StatusView, String> {
    Ok(session_from_state(&state).mark_initialized().await)
}

#[tauri::command]
pub async fn report_error(
    state: State<'_, AppState>,
    kind: ErrorKind,
    message: String,
) -> Result<StatusView, String> {
    Ok(session_from_state(&state).report_error(kind, message).await)
}

#[tauri::command]
pub async fn start_quiz(state: State<'_, AppState>) -> Result<StatusView, String> {
    Ok(session_from_state(&state).start_quiz().await)
}

#[tauri::command]
pub async fn start_game(state: State<'_, AppState>) -> Result<StatusView, String> {
    Ok(session_from_state(&state).start_game().await)
}

#[tauri::command]
pub async fn reset_game(state: State<'_, AppState>) -> Result<StatusView, String> {
    Ok(session_from_state(&state).reset_game().await)
}

/// `contents` is the text of the user-selected model file.
#[tauri::command]
pub async fn load_model(state: State<'_, AppState>, contents: String) -> Result<ModelInfo, String> {
    session_from_state(&state)
        .load_model(&contents)
        .await
        .map_err(|e| format!("{e:#}"))
}

#[tauri::command]
pub async fn toggle_camera(state: State<'_, AppState>) -> Result<CaptureRequest, String> {
    Ok(session_from_state(&state).toggle_camera().await)
}
