//! Balloon-dart booth: the round state machine and everything that feeds it.

mod board;
mod darts;
mod display;
mod events;
mod grid;
mod pop;
mod round;
mod scene_impl;
mod session;
mod timer;
mod win;

pub use board::BoardZone;
pub use darts::{DartBudget, STARTING_DARTS};
pub use display::{Panel, TextLabel};
pub use events::{RoundEvent, RoundEvents, SubscriptionId};
pub use grid::{
    compute_positions, GridSpec, DEFAULT_GRID_ORIGIN, DEFAULT_SPACING_X, DEFAULT_SPACING_Y,
    GRID_CELL_COUNT, GRID_ROWS, LEFT_SWEEP_COLUMNS, RIGHT_SWEEP_COLUMNS,
};
pub use pop::{PopTracker, PopTrackers};
pub use round::{
    PopOutcome, RoundContext, RoundController, RoundError, RoundId, RoundState,
    BALLOON_ROTATION_DEGREES, BALLOON_TAG, DART_TAG,
};
pub use scene_impl::{
    CarnivalScene, SceneConfig, ThrowOutcome, BALLOON_PREFAB, DART_PREFAB, DEFAULT_HIT_RADIUS,
};
pub use session::SessionContext;
pub use timer::{DeferredActions, TimerHandle};
pub use win::{WinCoordinator, WinPhase, WinRecord, WIN_MESSAGE_SECONDS};

use engine::Scene;

pub(crate) fn build_scene(config: SceneConfig) -> Box<dyn Scene> {
    Box::new(CarnivalScene::new(config))
}

#[cfg(test)]
mod tests;
