use std::process::ExitCode;

use engine::{run_app_with_metrics, MetricsHandle};
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub fn run(app: AppWiring) -> ExitCode {
    let metrics = MetricsHandle::default();
    match run_app_with_metrics(
        app.config,
        &app.app_paths,
        app.scene,
        app.input,
        metrics.clone(),
    ) {
        Ok(summary) => {
            let final_metrics = metrics.snapshot();
            info!(
                ticks = summary.ticks,
                frames = summary.frames,
                hard_resets = summary.hard_resets,
                stop_reason = ?summary.stop_reason,
                tps = final_metrics.tps,
                clamp_events = final_metrics.clamp_events,
                "run_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
