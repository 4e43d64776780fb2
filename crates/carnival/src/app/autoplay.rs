use engine::{InputAction, InputSnapshot, InputSource, Vec3};
use tracing::{debug, info, warn};

use super::gameplay::SceneConfig;
use super::settings::AutoplaySettings;

const MISS_HEIGHT_ABOVE_WALL: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPhase {
    Idle,
    Throwing,
    Settling,
    Finished,
}

/// Deterministic scripted player: start a round, throw at every cell in grid order with the
/// occasional deliberate miss, wait out the win announcement, repeat.
#[derive(Debug, Clone)]
pub struct AutoPlayer {
    plan: AutoplaySettings,
    targets: Vec<Vec3>,
    darts_per_round: u32,
    miss_point: Vec3,
    settle_ticks: u64,
    phase: AutoPhase,
    rounds_started: u32,
    next_target: usize,
    throws_this_round: u32,
    wait_until: u64,
}

impl AutoPlayer {
    pub fn new(plan: AutoplaySettings, scene: &SceneConfig, target_tps: u32) -> Self {
        let interval = u64::from(plan.throw_interval_ticks.max(1));
        let announcement_ticks =
            (scene.win_message_seconds.max(0.0) * f64::from(target_tps.max(1))).ceil();
        let origin = scene.grid.origin;
        Self {
            plan,
            targets: scene.grid.positions(),
            darts_per_round: scene.starting_darts,
            miss_point: Vec3::new(origin.x, origin.y + MISS_HEIGHT_ABOVE_WALL, origin.z),
            settle_ticks: announcement_ticks as u64 + interval,
            phase: AutoPhase::Idle,
            rounds_started: 0,
            next_target: 0,
            throws_this_round: 0,
            wait_until: 0,
        }
    }

    pub fn phase(&self) -> AutoPhase {
        self.phase
    }

    pub fn rounds_started(&self) -> u32 {
        self.rounds_started
    }

    fn interval(&self) -> u64 {
        u64::from(self.plan.throw_interval_ticks.max(1))
    }

    fn next_aim(&mut self) -> Vec3 {
        self.throws_this_round += 1;
        let miss_every = self.plan.miss_every;
        if miss_every > 0 && self.throws_this_round % miss_every == 0 {
            return self.miss_point;
        }
        let target = self.targets[self.next_target];
        self.next_target += 1;
        target
    }
}

impl InputSource for AutoPlayer {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot {
        match self.phase {
            AutoPhase::Finished => InputSnapshot::empty().with_quit_requested(true),
            AutoPhase::Idle => {
                if self.rounds_started >= self.plan.rounds {
                    info!(rounds = self.rounds_started, tick, "autoplay_finished");
                    self.phase = AutoPhase::Finished;
                    return InputSnapshot::empty().with_quit_requested(true);
                }
                self.rounds_started += 1;
                self.next_target = 0;
                self.throws_this_round = 0;
                self.wait_until = tick + self.interval();
                self.phase = AutoPhase::Throwing;
                debug!(round = self.rounds_started, tick, "autoplay_round_requested");
                InputSnapshot::empty().with_action_pressed(InputAction::StartRound, true)
            }
            AutoPhase::Throwing => {
                if tick < self.wait_until {
                    return InputSnapshot::empty();
                }
                let wall_left = self.targets.len() - self.next_target;
                if wall_left > 0 && self.throws_this_round >= self.darts_per_round {
                    warn!(
                        round = self.rounds_started,
                        balloons_left = wall_left,
                        "autoplay_round_unfinished"
                    );
                }
                if wall_left == 0 || self.throws_this_round >= self.darts_per_round {
                    self.phase = AutoPhase::Settling;
                    self.wait_until = tick + self.settle_ticks;
                    return InputSnapshot::empty();
                }
                let aim = self.next_aim();
                self.wait_until = tick + self.interval();
                InputSnapshot::empty()
                    .with_action_pressed(InputAction::Throw, true)
                    .with_aim_point(Some(aim))
            }
            AutoPhase::Settling => {
                if tick < self.wait_until {
                    return InputSnapshot::empty();
                }
                self.phase = AutoPhase::Idle;
                InputSnapshot::empty().with_action_pressed(InputAction::DumpStatus, true)
            }
        }
    }
}

/// Throws needed to hit `cells` targets when every `miss_every`th throw is a miss.
/// `u32::MAX` when no throw ever hits.
pub fn throws_to_clear(cells: u32, miss_every: u32) -> u32 {
    match miss_every {
        0 => cells,
        1 => u32::MAX,
        k => cells.saturating_add(cells.saturating_sub(1) / (k - 1)),
    }
}
