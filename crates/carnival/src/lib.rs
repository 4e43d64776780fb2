//! Carnival balloon-dart booth built on the `engine` crate.
//!
//! A round spawns a 27-balloon wall, counts pops until the wall is gone, and hands the win to
//! the [`WinCoordinator`], which keeps the session tally and runs the announcement.

pub mod app;

pub use app::autoplay::{AutoPhase, AutoPlayer};
pub use app::gameplay::{
    compute_positions, BoardZone, CarnivalScene, DartBudget, DeferredActions, GridSpec, Panel,
    PopOutcome, PopTracker, PopTrackers, RoundContext, RoundController, RoundError, RoundEvent,
    RoundEvents, RoundId, RoundState, SceneConfig, SessionContext, SubscriptionId, TextLabel,
    ThrowOutcome, TimerHandle, WinCoordinator, WinPhase, WinRecord, BALLOON_PREFAB, BALLOON_TAG,
    DART_PREFAB, DART_TAG, GRID_CELL_COUNT, STARTING_DARTS, WIN_MESSAGE_SECONDS,
};
pub use app::settings::{
    load_settings, load_settings_from, parse_settings_json, AutoplaySettings, CarnivalSettings,
    LoopSettings, PrefabSettings, SettingsError, SETTINGS_ENV_VAR,
};
