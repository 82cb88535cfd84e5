use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::{
    classifier::knn::DEFAULT_K, countdown::DEFAULT_COUNTDOWN_SECONDS,
    game::engine::DEFAULT_MAX_ROUNDS, quiz::DEFAULT_QUIZ_LENGTH,
};

const DEFAULT_ROUND_COOLDOWN_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameplaySettings {
    /// Seconds a recognized answer must wait before it is committed
    pub countdown_seconds: u32,
    /// Pause after a rock/paper/scissors round before the next gesture counts
    pub round_cooldown_ms: u64,
    pub quiz_length: usize,
    pub max_rounds: u32,
    /// Neighbors that vote in the pose classifier
    pub knn_k: usize,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            round_cooldown_ms: DEFAULT_ROUND_COOLDOWN_MS,
            quiz_length: DEFAULT_QUIZ_LENGTH,
            max_rounds: DEFAULT_MAX_ROUNDS,
            knn_k: DEFAULT_K,
        }
    }
}

impl GameplaySettings {
    pub fn validate(&self) -> Result<()> {
        if self.countdown_seconds == 0 {
            bail!("countdownSeconds must be at least 1");
        }
        if self.quiz_length == 0 {
            bail!("quizLength must be at least 1");
        }
        if self.max_rounds == 0 {
            bail!("maxRounds must be at least 1");
        }
        if self.knn_k == 0 {
            bail!("knnK must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    gameplay: GameplaySettings,
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<UserSettings>(&contents)
                .ok()
                .filter(|settings| settings.gameplay.validate().is_ok())
                .unwrap_or_else(|| {
                    warn!("Ignoring unusable settings file {}", path.display());
                    UserSettings::default()
                })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Defaults only, nothing written to disk.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(UserSettings::default()),
        }
    }

    pub fn gameplay(&self) -> GameplaySettings {
        match self.data.read() {
            Ok(guard) => guard.gameplay.clone(),
            Err(poisoned) => poisoned.into_inner().gameplay.clone(),
        }
    }

    pub fn update_gameplay(&self, settings: GameplaySettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        guard.gameplay = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}
