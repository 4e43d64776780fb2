use std::cell::RefCell;
use std::rc::Rc;

use engine::{
    EntityArchetype, EntityId, InputAction, InputSnapshot, Scene, SceneCommand, SceneWorld,
    Transform, Vec3,
};
use tracing::{debug, info, warn};

use super::board::BoardZone;
use super::darts::{DartBudget, STARTING_DARTS};
use super::display::{Panel, TextLabel};
use super::events::SubscriptionId;
use super::grid::GridSpec;
use super::pop::PopTrackers;
use super::round::{RoundContext, RoundController, BALLOON_TAG, DART_TAG};
use super::session::SessionContext;
use super::win::{WinCoordinator, WIN_MESSAGE_SECONDS};

pub const DEFAULT_HIT_RADIUS: f32 = 0.2;
pub const BALLOON_PREFAB: &str = "carnival.balloon";
pub const DART_PREFAB: &str = "carnival.dart";

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub grid: GridSpec,
    pub board: BoardZone,
    pub starting_darts: u32,
    pub win_message_seconds: f64,
    pub balloon_prefab: String,
    pub dart_prefab: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            board: BoardZone::default(),
            starting_darts: STARTING_DARTS,
            win_message_seconds: WIN_MESSAGE_SECONDS,
            balloon_prefab: BALLOON_PREFAB.to_string(),
            dart_prefab: DART_PREFAB.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrowOutcome {
    PrefabMissing,
    OutOfDarts,
    /// The dart was spent without a landing point.
    NoAim,
    Landed {
        dart: EntityId,
        stuck: bool,
        popped: Option<EntityId>,
    },
}

/// The dart booth: one balloon wall, one dart budget, and the win tally.
pub struct CarnivalScene {
    config: SceneConfig,
    displays_attached: bool,
    controller: RoundController,
    trackers: PopTrackers,
    darts: DartBudget,
    session: SessionContext,
    win: Rc<RefCell<WinCoordinator>>,
    win_subscription: Option<SubscriptionId>,
    dart_counter: Option<TextLabel>,
}

impl CarnivalScene {
    pub fn new(config: SceneConfig) -> Self {
        let controller = RoundController::new(config.grid, config.balloon_prefab.clone());
        let darts = DartBudget::new(config.starting_darts);
        let win = WinCoordinator::new(
            config.win_message_seconds,
            Some(TextLabel::default()),
            Some(Panel::default()),
        );
        Self {
            config,
            displays_attached: true,
            controller,
            trackers: PopTrackers::default(),
            darts,
            session: SessionContext::default(),
            win: Rc::new(RefCell::new(win)),
            win_subscription: None,
            dart_counter: None,
        }
    }

    /// Runs without HUD elements; display updates are skipped with a warning.
    pub fn without_displays(mut self) -> Self {
        self.displays_attached = false;
        self
    }

    pub fn controller(&self) -> &RoundController {
        &self.controller
    }

    pub fn darts(&self) -> &DartBudget {
        &self.darts
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn trackers(&self) -> &PopTrackers {
        &self.trackers
    }

    pub fn win_handle(&self) -> Rc<RefCell<WinCoordinator>> {
        Rc::clone(&self.win)
    }

    pub fn dart_counter_text(&self) -> Option<&str> {
        self.dart_counter.as_ref().map(TextLabel::text)
    }

    pub fn throw_dart(&mut self, aim_point: Option<Vec3>, world: &mut SceneWorld) -> ThrowOutcome {
        let Some(dart_def) = resolve_tagged(world, &self.config.dart_prefab, DART_TAG) else {
            warn!(def_name = %self.config.dart_prefab, "dart_prefab_missing");
            return ThrowOutcome::PrefabMissing;
        };
        if !self.darts.try_throw() {
            debug!("throw_refused_out_of_darts");
            return ThrowOutcome::OutOfDarts;
        }
        let Some(landing) = aim_point.filter(|point| point.is_finite()) else {
            debug!(remaining = self.darts.remaining(), "dart_missed");
            return ThrowOutcome::NoAim;
        };

        let dart = world.spawn_archetype(&dart_def, Transform::at(landing));
        let stuck = self.config.board.contains(landing);
        if !stuck {
            world.despawn(dart);
        }

        let popped = nearest_balloon(world, landing, self.hit_radius(world));
        if let Some(balloon) = popped {
            world.despawn(balloon);
        }

        debug!(
            x = landing.x,
            y = landing.y,
            z = landing.z,
            stuck,
            popped = popped.is_some(),
            remaining = self.darts.remaining(),
            "dart_thrown"
        );
        ThrowOutcome::Landed {
            dart,
            stuck,
            popped,
        }
    }

    /// Starts a round, replacing any round in progress.
    fn request_round_start(&mut self, world: &mut SceneWorld) {
        if let Err(err) = self.controller.start_round(RoundContext {
            world,
            trackers: &mut self.trackers,
            darts: &mut self.darts,
        }) {
            debug!(error = %err, "start_request_failed");
        }
    }

    fn hit_radius(&self, world: &SceneWorld) -> f32 {
        world
            .def_database()
            .and_then(|database| database.entity_def_by_name(&self.config.balloon_prefab))
            .and_then(|archetype| archetype.hit_radius)
            .unwrap_or(DEFAULT_HIT_RADIUS)
    }

    fn refresh_dart_counter(&mut self) {
        let remaining = self.darts.remaining().to_string();
        match self.dart_counter.as_mut() {
            Some(label) => label.set_text(remaining),
            None if self.displays_attached => warn!("dart_counter_label_missing"),
            None => {}
        }
    }

    fn log_status(&self, world: &SceneWorld) {
        let win_status = self.win.borrow().status_line();
        info!(
            round = self.controller.round_id().0,
            state = ?self.controller.state(),
            popped = self.controller.popped_count(),
            total_balloons = self.controller.total_balloons(),
            late_reports = self.controller.late_reports(),
            live_balloons = world.live_count_with_tag(BALLOON_TAG),
            darts = self.darts.remaining(),
            paused = self.session.is_paused(),
            win = %win_status,
            "carnival_status"
        );
    }
}

impl Scene for CarnivalScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.controller = RoundController::new(self.config.grid, self.config.balloon_prefab.clone());
        self.trackers = PopTrackers::default();
        self.darts = DartBudget::new(self.config.starting_darts);
        self.session = SessionContext::default();

        let (counter_label, panel) = if self.displays_attached {
            (Some(TextLabel::default()), Some(Panel::default()))
        } else {
            (None, None)
        };
        *self.win.borrow_mut() =
            WinCoordinator::new(self.config.win_message_seconds, counter_label, panel);
        self.win_subscription = Some(WinCoordinator::subscribe_shared(
            &self.win,
            self.controller.events_mut(),
        ));
        self.dart_counter = self
            .displays_attached
            .then(|| TextLabel::new(self.darts.remaining().to_string()));

        info!(
            balloon_prefab = %self.config.balloon_prefab,
            dart_prefab = %self.config.dart_prefab,
            starting_darts = self.config.starting_darts,
            entity_count = world.entity_count(),
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let destroyed = world.take_despawned();
        if !destroyed.is_empty() {
            self.trackers
                .notify_destroyed(&destroyed, Some(&mut self.controller), world);
        }

        if input.pressed(InputAction::TogglePause) {
            self.session.toggle_pause();
        }
        if input.pressed(InputAction::ReturnToMenu) && self.session.is_paused() {
            info!("return_to_menu");
            return SceneCommand::HardReset;
        }
        if input.pressed(InputAction::DumpStatus) {
            self.log_status(world);
        }
        if input.pressed(InputAction::ResetWins) {
            self.win.borrow_mut().reset_win_counter();
        }

        self.session.sync_dialog(input.dialog_active());
        if self.session.gameplay_input_allowed() {
            if input.pressed(InputAction::StartRound) {
                self.request_round_start(world);
            }
            if input.pressed(InputAction::Throw) {
                self.throw_dart(input.aim_point(), world);
            }
        }

        {
            let mut win = self.win.borrow_mut();
            win.observe_round_activity(
                self.controller.is_active(),
                world.live_count_with_tag(BALLOON_TAG),
            );
            let scaled_dt = f64::from(fixed_dt_seconds) * f64::from(self.session.time_scale());
            if scaled_dt > 0.0 {
                win.tick(scaled_dt);
            }
        }

        self.refresh_dart_counter();
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        let torn_down = self.trackers.drain_for_teardown(world);
        if let Some(id) = self.win_subscription.take() {
            self.controller.events_mut().unsubscribe(id);
        }
        info!(
            trackers = torn_down,
            total_wins = self.win.borrow().total_wins(),
            "scene_unloaded"
        );
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some(format!(
            "Carnival | Round {} {:?} | Popped {}/{} | Darts {} | Wins {}",
            self.controller.round_id().0,
            self.controller.state(),
            self.controller.popped_count(),
            self.controller.total_balloons(),
            self.darts.remaining(),
            self.win.borrow().total_wins()
        ))
    }
}

fn resolve_tagged(world: &SceneWorld, def_name: &str, tag: &str) -> Option<EntityArchetype> {
    let mut archetype = world.def_database()?.entity_def_by_name(def_name)?.clone();
    if !archetype.tags.iter().any(|existing| existing == tag) {
        archetype.tags.push(tag.to_string());
    }
    Some(archetype)
}

fn nearest_balloon(world: &SceneWorld, point: Vec3, radius: f32) -> Option<EntityId> {
    let radius_sq = radius * radius;
    world
        .entities_with_tag(BALLOON_TAG)
        .map(|entity| (entity.id, entity.transform.position.distance_squared(point)))
        .filter(|(_, distance_sq)| *distance_sq <= radius_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(id, _)| id)
}
