mod camera;
mod classifier;
mod countdown;
mod events;
mod frame;
mod game;
mod hand;
mod quiz;
mod session;
mod settings;
mod utils;

use std::sync::Arc;

use frame::{commands::process_frame, FrameProcessor};
use quiz::QuestionBank;
use session::{
    commands::{
        detector_ready, get_status, load_model, report_error, reset_game, start_game, start_quiz,
        toggle_camera,
    },
    Session,
};
use settings::{GameplaySettings, SettingsStore};
use tauri::{Manager, State};

pub(crate) struct AppState {
    pub(crate) session: Session,
    pub(crate) frames: FrameProcessor,
    pub(crate) settings: SettingsStore,
}

#[tauri::command]
fn get_gameplay_settings(state: State<AppState>) -> Result<GameplaySettings, String> {
    Ok(state.settings.gameplay())
}

/// Persists the settings; they take effect from the next quiz or game.
#[tauri::command]
async fn set_gameplay_settings(
    settings: GameplaySettings,
    state: State<'_, AppState>,
) -> Result<GameplaySettings, String> {
    state
        .settings
        .update_gameplay(settings.clone())
        .map_err(|e| e.to_string())?;
    state.session.apply_settings(settings.clone()).await;
    Ok(settings)
}

fn debug_requested() -> bool {
    matches!(
        std::env::var("HANDQUIZ_DEBUG").as_deref(),
        Ok("1") | Ok("true")
    )
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // RUST_LOG still wins over the default level
    let default_level = if debug_requested() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    log::info!("Hand Quiz starting up...");

    tauri::Builder::default()
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let settings_path = app_data_dir.join("settings.json");
                let settings_store = SettingsStore::new(settings_path)?;

                let bank = QuestionBank::builtin()?;
                log::info!("Loaded {} quiz questions", bank.len());

                let session = Session::new(
                    Arc::new(app.handle().clone()),
                    bank,
                    settings_store.gameplay(),
                );

                app.manage(AppState {
                    frames: FrameProcessor::new(session.clone()),
                    session,
                    settings: settings_store,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_status,
            detector_ready,
            report_error,
            load_model,
            start_quiz,
            start_game,
            reset_game,
            toggle_camera,
            process_frame,
            get_gameplay_settings,
            set_gameplay_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
