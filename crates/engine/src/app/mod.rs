mod input;
mod loop_runner;
mod metrics;
mod scene;

pub use input::{InputAction, InputSource};
pub use loop_runner::{
    run_app, run_app_with_metrics, AppError, LoopClock, LoopConfig, RunSummary, StopReason,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use scene::{
    Entity, EntityId, InputSnapshot, RenderableDesc, RenderableKind, Scene, SceneCommand,
    SceneWorld, Transform, Vec3,
};
