use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{AppPaths, LoopClock, LoopConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::autoplay::throws_to_clear;
use super::gameplay::{
    BoardZone, GridSpec, SceneConfig, BALLOON_PREFAB, DART_PREFAB, GRID_CELL_COUNT,
    STARTING_DARTS, WIN_MESSAGE_SECONDS,
};

pub const SETTINGS_ENV_VAR: &str = "CARNIVAL_SETTINGS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse settings json at {json_path} in {}: {source}", .file.display())]
    Parse {
        file: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrefabSettings {
    pub balloon: String,
    pub dart: String,
}

impl Default for PrefabSettings {
    fn default() -> Self {
        Self {
            balloon: BALLOON_PREFAB.to_string(),
            dart: DART_PREFAB.to_string(),
        }
    }
}

/// Scripted player used by the headless binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoplaySettings {
    pub rounds: u32,
    pub throw_interval_ticks: u32,
    /// Every Nth throw aims off the wall. 0 never misses.
    pub miss_every: u32,
}

impl Default for AutoplaySettings {
    fn default() -> Self {
        Self {
            rounds: 3,
            throw_interval_ticks: 6,
            miss_every: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopSettings {
    pub target_tps: u32,
    pub realtime: bool,
    pub max_ticks: Option<u64>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            target_tps: 60,
            realtime: false,
            max_ticks: Some(36_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarnivalSettings {
    pub grid: GridSpec,
    pub starting_darts: u32,
    pub win_message_seconds: f64,
    pub board: BoardZone,
    pub prefabs: PrefabSettings,
    pub enabled_mods: Vec<String>,
    pub autoplay: AutoplaySettings,
    #[serde(rename = "loop")]
    pub loop_settings: LoopSettings,
}

impl Default for CarnivalSettings {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            starting_darts: STARTING_DARTS,
            win_message_seconds: WIN_MESSAGE_SECONDS,
            board: BoardZone::default(),
            prefabs: PrefabSettings::default(),
            enabled_mods: Vec::new(),
            autoplay: AutoplaySettings::default(),
            loop_settings: LoopSettings::default(),
        }
    }
}

impl CarnivalSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.grid.origin.is_finite() {
            return Err(invalid("grid.origin", "must be finite"));
        }
        for (field, spacing) in [
            ("grid.spacing_x", self.grid.spacing_x),
            ("grid.spacing_y", self.grid.spacing_y),
        ] {
            if !spacing.is_finite() || spacing <= 0.0 {
                return Err(invalid(field, format!("expected > 0, got {spacing}")));
            }
        }
        if self.starting_darts == 0 {
            return Err(invalid("starting_darts", "expected at least 1"));
        }
        if !self.win_message_seconds.is_finite() || self.win_message_seconds < 0.0 {
            return Err(invalid(
                "win_message_seconds",
                format!("expected >= 0, got {}", self.win_message_seconds),
            ));
        }
        let board = &self.board;
        if !board.half_width.is_finite() || board.half_width < 0.0 {
            return Err(invalid("board.half_width", "expected finite and >= 0"));
        }
        if !board.near_depth.is_finite()
            || !board.far_depth.is_finite()
            || board.near_depth > board.far_depth
        {
            return Err(invalid(
                "board.far_depth",
                format!(
                    "expected near_depth <= far_depth, got {} > {}",
                    board.near_depth, board.far_depth
                ),
            ));
        }
        if self.prefabs.balloon.trim().is_empty() {
            return Err(invalid("prefabs.balloon", "must not be empty"));
        }
        if self.prefabs.dart.trim().is_empty() {
            return Err(invalid("prefabs.dart", "must not be empty"));
        }
        if self.autoplay.throw_interval_ticks == 0 {
            return Err(invalid("autoplay.throw_interval_ticks", "expected at least 1"));
        }
        if self.autoplay.miss_every == 1 {
            return Err(invalid("autoplay.miss_every", "1 would never hit; use 0 or >= 2"));
        }
        let needed = throws_to_clear(GRID_CELL_COUNT as u32, self.autoplay.miss_every);
        if needed > self.starting_darts {
            return Err(invalid(
                "autoplay.miss_every",
                format!(
                    "clearing the wall takes {needed} throws, starting_darts is {}",
                    self.starting_darts
                ),
            ));
        }
        if self.loop_settings.target_tps == 0 {
            return Err(invalid("loop.target_tps", "expected at least 1"));
        }
        Ok(())
    }

    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            grid: self.grid,
            board: self.board,
            starting_darts: self.starting_darts,
            win_message_seconds: self.win_message_seconds,
            balloon_prefab: self.prefabs.balloon.clone(),
            dart_prefab: self.prefabs.dart.clone(),
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            target_tps: self.loop_settings.target_tps,
            clock: if self.loop_settings.realtime {
                LoopClock::Realtime
            } else {
                LoopClock::Simulated
            },
            max_ticks: self.loop_settings.max_ticks,
            enabled_mods: self.enabled_mods.clone(),
            ..LoopConfig::default()
        }
    }
}

/// `CARNIVAL_SETTINGS` wins over `<root>/assets/settings.json`.
pub fn load_settings(app_paths: &AppPaths) -> Result<CarnivalSettings, SettingsError> {
    let path = env::var_os(SETTINGS_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| app_paths.settings_path.clone());
    load_settings_from(&path)
}

/// A missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<CarnivalSettings, SettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "settings_defaulted");
            return Ok(CarnivalSettings::default());
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let settings = parse_settings_json(&raw, path)?;
    settings.validate()?;
    info!(
        path = %path.display(),
        starting_darts = settings.starting_darts,
        rounds = settings.autoplay.rounds,
        "settings_loaded"
    );
    Ok(settings)
}

pub fn parse_settings_json(raw: &str, file: &Path) -> Result<CarnivalSettings, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, CarnivalSettings>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let json_path = if path.is_empty() {
            ".".to_string()
        } else {
            path
        };
        SettingsError::Parse {
            file: file.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

fn invalid(field: &'static str, message: impl Into<String>) -> SettingsError {
    SettingsError::Invalid {
        field,
        message: message.into(),
    }
}
