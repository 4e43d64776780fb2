use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{compile_def_database, resolve_app_paths, AppPaths, ContentCompileError, StartupError};

use super::metrics::MetricsAccumulator;
use super::scene::SceneRuntime;
use super::{InputSource, MetricsHandle, Scene, SceneCommand};

/// How frame time advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopClock {
    /// Wall clock, paced with a sleep so ticks land at `target_tps`.
    Realtime,
    /// Every frame is exactly one fixed tick long and nothing sleeps.
    Simulated,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub clock: LoopClock,
    pub max_ticks: Option<u64>,
    pub enabled_mods: Vec<String>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            clock: LoopClock::Realtime,
            max_ticks: None,
            enabled_mods: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    InputQuit,
    SceneQuit,
    TickLimit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub frames: u64,
    pub hard_resets: u32,
    pub stop_reason: StopReason,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to compile content definitions: {0}")]
    Content(#[from] ContentCompileError),
}

pub fn run_app(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    input: Box<dyn InputSource>,
) -> Result<RunSummary, AppError> {
    let app_paths = resolve_app_paths()?;
    run_app_with_metrics(config, &app_paths, scene, input, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    app_paths: &AppPaths,
    scene: Box<dyn Scene>,
    mut input: Box<dyn InputSource>,
    metrics_handle: MetricsHandle,
) -> Result<RunSummary, AppError> {
    info!(
        root = %app_paths.root.display(),
        base_content_dir = %app_paths.base_content_dir.display(),
        mods_dir = %app_paths.mods_dir.display(),
        "startup"
    );
    let def_database = compile_def_database(app_paths, &config.enabled_mods)?;
    info!(
        def_count = def_database.entity_defs().len(),
        enabled_mods = config.enabled_mods.len(),
        "content_loaded"
    );

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let pacing_target = match config.clock {
        LoopClock::Realtime => Some(fixed_dt),
        LoopClock::Simulated => None,
    };

    let mut runtime = SceneRuntime::new(scene);
    runtime.set_def_database(def_database);
    runtime.load();
    runtime.apply_pending();
    info!(
        entity_count = runtime.world().entity_count(),
        "scene_loaded"
    );
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        clock = ?config.clock,
        max_ticks = ?config.max_ticks,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval, last_frame_instant);
    let mut last_title: Option<String> = None;
    let mut frames = 0u64;
    let mut hard_resets = 0u32;

    let stop_reason = 'frames: loop {
        let frame_start = Instant::now();
        let raw_frame_dt = match config.clock {
            LoopClock::Realtime => frame_start.saturating_duration_since(last_frame_instant),
            LoopClock::Simulated => fixed_dt,
        };
        last_frame_instant = frame_start;

        accumulator = accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            let tick = metrics_accumulator.total_ticks();
            if config.max_ticks.is_some_and(|limit| tick >= limit) {
                info!(tick, "tick_limit_reached");
                break 'frames StopReason::TickLimit;
            }

            let snapshot = input.snapshot_for_tick(tick);
            if snapshot.quit_requested() {
                info!(reason = "input", tick, "shutdown_requested");
                break 'frames StopReason::InputQuit;
            }

            let command = runtime.update(fixed_dt_seconds, &snapshot);
            runtime.apply_pending();
            metrics_accumulator.record_tick();

            match command {
                SceneCommand::None => {}
                SceneCommand::Quit => {
                    info!(reason = "scene", tick, "shutdown_requested");
                    break 'frames StopReason::SceneQuit;
                }
                SceneCommand::HardReset => {
                    runtime.hard_reset();
                    runtime.apply_pending();
                    hard_resets = hard_resets.saturating_add(1);
                    info!(
                        entity_count = runtime.world().entity_count(),
                        tick, "scene_hard_reset"
                    );
                }
            }
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            metrics_accumulator.record_clamp();
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        let next_title = runtime.debug_title();
        if next_title != last_title {
            if let Some(title) = &next_title {
                debug!(title = title.as_str(), "scene_title");
            }
            last_title = next_title;
        }

        frames = frames.saturating_add(1);
        metrics_accumulator.record_frame(raw_frame_dt);
        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now()) {
            metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                entity_count = runtime.world().entity_count(),
                "loop_metrics"
            );
        }

        let elapsed = Instant::now().saturating_duration_since(frame_start);
        let pacing_sleep = compute_pacing_sleep(elapsed, pacing_target);
        if pacing_sleep > Duration::ZERO {
            thread::sleep(pacing_sleep);
        }
    };

    metrics_handle.publish(metrics_accumulator.flush(Instant::now()));
    runtime.shutdown();
    let summary = RunSummary {
        ticks: metrics_accumulator.total_ticks(),
        frames,
        hard_resets,
        stop_reason,
    };
    info!(
        ticks = summary.ticks,
        frames = summary.frames,
        hard_resets = summary.hard_resets,
        stop_reason = ?summary.stop_reason,
        "shutdown"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_pacing_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}
