use engine::{resolve_app_paths, AppPaths, InputSource, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::autoplay::AutoPlayer;
use super::gameplay;
use super::settings::{load_settings, SettingsError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub struct AppWiring {
    pub config: LoopConfig,
    pub app_paths: AppPaths,
    pub scene: Box<dyn Scene>,
    pub input: Box<dyn InputSource>,
}

pub fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Carnival Startup ===");

    let app_paths = resolve_app_paths()?;
    let settings = load_settings(&app_paths)?;
    let config = settings.loop_config();
    let scene_config = settings.scene_config();
    let input = AutoPlayer::new(settings.autoplay, &scene_config, config.target_tps);
    info!(
        rounds = settings.autoplay.rounds,
        clock = ?config.clock,
        max_ticks = ?config.max_ticks,
        "autoplay_wired"
    );

    Ok(AppWiring {
        config,
        app_paths,
        scene: gameplay::build_scene(scene_config),
        input: Box::new(input),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
