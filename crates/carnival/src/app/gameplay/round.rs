use engine::{EntityArchetype, SceneWorld, Transform, Vec3};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::darts::DartBudget;
use super::events::{RoundEvent, RoundEvents};
use super::grid::GridSpec;
use super::pop::PopTrackers;

pub const BALLOON_TAG: &str = "Balloon";
pub const DART_TAG: &str = "Dart";
pub const BALLOON_ROTATION_DEGREES: Vec3 = Vec3::new(270.0, 0.0, 0.0);

/// Generation handle for one round. Every `start_round` issues a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoundId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    Active,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("no prefab database is loaded")]
    MissingDefDatabase,
    #[error("balloon prefab `{def_name}` is not defined")]
    MissingPrefab { def_name: String },
}

/// What a pop report did to the round it named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome {
    Counted,
    Completed,
    /// The round already finished; recorded only.
    Late,
    /// The report belongs to an earlier round.
    Stale,
}

/// Everything a round start touches besides the controller itself.
pub struct RoundContext<'a> {
    pub world: &'a mut SceneWorld,
    pub trackers: &'a mut PopTrackers,
    pub darts: &'a mut DartBudget,
}

#[derive(Debug)]
pub struct RoundController {
    grid: GridSpec,
    balloon_def: String,
    state: RoundState,
    round_id: RoundId,
    popped_count: u32,
    total_balloons: u32,
    late_reports: u32,
    events: RoundEvents,
}

impl RoundController {
    pub fn new(grid: GridSpec, balloon_def: impl Into<String>) -> Self {
        Self {
            grid,
            balloon_def: balloon_def.into(),
            state: RoundState::Idle,
            round_id: RoundId::default(),
            popped_count: 0,
            total_balloons: 0,
            late_reports: 0,
            events: RoundEvents::default(),
        }
    }

    /// Spawns a fresh balloon wall and arms the round. Restarting an active round is allowed
    /// and discards it.
    pub fn start_round(&mut self, ctx: RoundContext<'_>) -> Result<RoundId, RoundError> {
        let archetype = match self.resolve_balloon(ctx.world) {
            Ok(archetype) => archetype,
            Err(err) => {
                error!(def_name = %self.balloon_def, error = %err, "round_start_failed");
                return Err(err);
            }
        };

        if self.state == RoundState::Active {
            warn!(
                round = self.round_id.0,
                popped = self.popped_count,
                total_balloons = self.total_balloons,
                "round_force_restart"
            );
            self.state = RoundState::Idle;
        }
        despawn_round_entities(ctx.world);

        self.round_id = RoundId(self.round_id.0.saturating_add(1));
        let round = self.round_id;
        let mut spawned = 0u32;
        for position in self.grid.positions() {
            let balloon = ctx.world.spawn_archetype(
                &archetype,
                Transform {
                    position,
                    rotation_euler_degrees: BALLOON_ROTATION_DEGREES,
                },
            );
            ctx.trackers.attach(balloon, round);
            spawned += 1;
        }

        self.popped_count = 0;
        self.total_balloons = spawned;
        self.late_reports = 0;
        ctx.darts.reset();
        self.state = RoundState::Active;

        info!(
            round = round.0,
            total_balloons = spawned,
            darts = ctx.darts.remaining(),
            "round_started"
        );
        self.events.publish(RoundEvent::Started {
            round,
            total_balloons: spawned,
        });
        Ok(round)
    }

    /// Removes balloons and darts. An active round is abandoned without completing.
    pub fn clear(&mut self, world: &mut SceneWorld) {
        if self.state == RoundState::Active {
            info!(
                round = self.round_id.0,
                popped = self.popped_count,
                total_balloons = self.total_balloons,
                "round_abandoned"
            );
            self.state = RoundState::Idle;
        }
        despawn_round_entities(world);
    }

    pub fn on_balloon_popped(&mut self, round: RoundId, world: &SceneWorld) -> PopOutcome {
        if round != self.round_id {
            debug!(
                report_round = round.0,
                current_round = self.round_id.0,
                "pop_report_stale"
            );
            return PopOutcome::Stale;
        }
        if self.state == RoundState::Idle {
            self.late_reports = self.late_reports.saturating_add(1);
            debug!(round = round.0, late_reports = self.late_reports, "pop_report_late");
            return PopOutcome::Late;
        }

        self.popped_count = (self.popped_count + 1).min(self.total_balloons);
        if self.popped_count < self.total_balloons {
            return PopOutcome::Counted;
        }

        self.state = RoundState::Idle;
        if !self.live_scan_agrees(world) {
            warn!(
                round = round.0,
                live_balloons = world.live_count_with_tag(BALLOON_TAG),
                "round_live_scan_disagrees"
            );
        }
        info!(
            round = round.0,
            popped = self.popped_count,
            total_balloons = self.total_balloons,
            "round_completed"
        );
        self.events.publish(RoundEvent::Completed {
            round,
            popped: self.popped_count,
            total_balloons: self.total_balloons,
        });
        PopOutcome::Completed
    }

    /// True when no balloon is left in the world. Diagnostic only.
    pub fn live_scan_agrees(&self, world: &SceneWorld) -> bool {
        world.live_count_with_tag(BALLOON_TAG) == 0
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == RoundState::Active
    }

    pub fn round_id(&self) -> RoundId {
        self.round_id
    }

    pub fn popped_count(&self) -> u32 {
        self.popped_count
    }

    pub fn total_balloons(&self) -> u32 {
        self.total_balloons
    }

    pub fn late_reports(&self) -> u32 {
        self.late_reports
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn events_mut(&mut self) -> &mut RoundEvents {
        &mut self.events
    }

    fn resolve_balloon(&self, world: &SceneWorld) -> Result<EntityArchetype, RoundError> {
        let database = world.def_database().ok_or(RoundError::MissingDefDatabase)?;
        let mut archetype = database
            .entity_def_by_name(&self.balloon_def)
            .cloned()
            .ok_or_else(|| RoundError::MissingPrefab {
                def_name: self.balloon_def.clone(),
            })?;
        if !archetype.tags.iter().any(|tag| tag == BALLOON_TAG) {
            archetype.tags.push(BALLOON_TAG.to_string());
        }
        Ok(archetype)
    }
}

fn despawn_round_entities(world: &mut SceneWorld) {
    for tag in [DART_TAG, BALLOON_TAG] {
        for id in world.ids_with_tag(tag) {
            world.despawn(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use engine::{DefDatabase, EntityDefId, EntityId, RenderableKind};

    use super::*;

    fn balloon_def(tags: Vec<String>) -> EntityArchetype {
        EntityArchetype {
            id: EntityDefId(0),
            def_name: "carnival.balloon".to_string(),
            label: "Balloon".to_string(),
            renderable: RenderableKind::Model("balloon".to_string()),
            hit_radius: Some(0.2),
            tags,
        }
    }

    fn world_with_balloon_def() -> SceneWorld {
        let mut world = SceneWorld::default();
        world.set_def_database(DefDatabase::from_entity_defs(vec![balloon_def(vec![
            BALLOON_TAG.to_string(),
        ])]));
        world
    }

    struct Fixture {
        world: SceneWorld,
        trackers: PopTrackers,
        darts: DartBudget,
        controller: RoundController,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: world_with_balloon_def(),
                trackers: PopTrackers::default(),
                darts: DartBudget::default(),
                controller: RoundController::new(GridSpec::default(), "carnival.balloon"),
            }
        }

        fn start(&mut self) -> Result<RoundId, RoundError> {
            let result = self.controller.start_round(RoundContext {
                world: &mut self.world,
                trackers: &mut self.trackers,
                darts: &mut self.darts,
            });
            self.world.apply_pending();
            result
        }

        fn balloons(&self) -> Vec<EntityId> {
            self.world.ids_with_tag(BALLOON_TAG)
        }

        fn pop(&mut self, ids: &[EntityId]) -> usize {
            for id in ids {
                self.world.despawn(*id);
            }
            self.world.apply_pending();
            let destroyed = self.world.take_despawned();
            self.trackers
                .notify_destroyed(&destroyed, Some(&mut self.controller), &self.world)
        }
    }

    #[test]
    fn start_spawns_full_wall_with_fixed_rotation() {
        let mut fixture = Fixture::new();
        let round = fixture.start().expect("start");

        assert_eq!(round, RoundId(1));
        assert!(fixture.controller.is_active());
        assert_eq!(fixture.controller.total_balloons(), 27);
        assert_eq!(fixture.controller.popped_count(), 0);
        assert_eq!(fixture.balloons().len(), 27);
        assert_eq!(fixture.trackers.len(), 27);

        let positions = GridSpec::default().positions();
        let balloons = fixture
            .world
            .entities_with_tag(BALLOON_TAG)
            .collect::<Vec<_>>();
        for (entity, expected) in balloons.iter().zip(positions) {
            assert_eq!(entity.transform.position, expected);
            assert_eq!(entity.transform.rotation_euler_degrees, BALLOON_ROTATION_DEGREES);
        }
    }

    #[test]
    fn completes_exactly_once_when_every_balloon_pops() {
        let mut fixture = Fixture::new();
        let completions = Rc::new(RefCell::new(Vec::new()));
        {
            let completions = Rc::clone(&completions);
            fixture.controller.events_mut().subscribe(move |event| {
                if let RoundEvent::Completed { round, popped, .. } = event {
                    completions.borrow_mut().push((*round, *popped));
                }
            });
        }
        fixture.start().expect("start");

        let balloons = fixture.balloons();
        assert_eq!(fixture.pop(&balloons[..26]), 26);
        assert!(fixture.controller.is_active());
        assert_eq!(fixture.controller.popped_count(), 26);

        assert_eq!(fixture.pop(&balloons[26..]), 1);
        assert_eq!(fixture.controller.state(), RoundState::Idle);
        assert_eq!(fixture.controller.popped_count(), 27);
        assert_eq!(*completions.borrow(), vec![(RoundId(1), 27)]);
    }

    #[test]
    fn reports_after_completion_are_late_and_never_recomplete() {
        let mut fixture = Fixture::new();
        fixture.start().expect("start");
        let balloons = fixture.balloons();
        fixture.pop(&balloons);

        let round = fixture.controller.round_id();
        assert_eq!(
            fixture.controller.on_balloon_popped(round, &fixture.world),
            PopOutcome::Late
        );
        assert_eq!(
            fixture.controller.on_balloon_popped(round, &fixture.world),
            PopOutcome::Late
        );
        assert_eq!(fixture.controller.late_reports(), 2);
        assert_eq!(fixture.controller.popped_count(), 27);
        assert_eq!(fixture.controller.events_mut().published_count(), 2);
    }

    #[test]
    fn counter_completes_even_when_a_stray_balloon_is_live() {
        let mut fixture = Fixture::new();
        fixture.start().expect("start");
        let wall = fixture.balloons();
        fixture.world.spawn_tagged(
            Transform::at(Vec3::new(4.0, 1.0, 6.0)),
            engine::RenderableDesc {
                kind: RenderableKind::Placeholder,
                debug_name: "stray balloon".to_string(),
            },
            vec![BALLOON_TAG.to_string()],
        );
        fixture.world.apply_pending();

        assert_eq!(fixture.pop(&wall[..26]), 26);
        assert!(fixture.controller.is_active());
        assert_eq!(fixture.pop(&wall[26..]), 1);

        assert_eq!(fixture.controller.state(), RoundState::Idle);
        assert_eq!(fixture.controller.popped_count(), 27);
        assert_eq!(fixture.world.live_count_with_tag(BALLOON_TAG), 1);
        assert!(!fixture.controller.live_scan_agrees(&fixture.world));
        assert_eq!(fixture.controller.events_mut().published_count(), 2);

        let round = fixture.controller.round_id();
        assert_eq!(
            fixture.controller.on_balloon_popped(round, &fixture.world),
            PopOutcome::Late
        );
        assert_eq!(fixture.controller.events_mut().published_count(), 2);
    }

    #[test]
    fn restart_discards_old_wall_and_ignores_its_reports() {
        let mut fixture = Fixture::new();
        fixture.start().expect("first start");
        let first_wall = fixture.balloons();
        fixture.pop(&first_wall[..5]);
        assert_eq!(fixture.controller.popped_count(), 5);

        let second = fixture.start().expect("restart");
        assert_eq!(second, RoundId(2));
        let stale = fixture.world.take_despawned();
        assert_eq!(stale.len(), 22);
        fixture
            .trackers
            .notify_destroyed(&stale, Some(&mut fixture.controller), &fixture.world);

        assert_eq!(fixture.controller.popped_count(), 0);
        assert!(fixture.controller.is_active());
        assert_eq!(fixture.balloons().len(), 27);
        assert_eq!(
            fixture.controller.on_balloon_popped(RoundId(1), &fixture.world),
            PopOutcome::Stale
        );
    }

    #[test]
    fn restart_resets_darts_and_removes_stuck_darts() {
        let mut fixture = Fixture::new();
        fixture.start().expect("start");
        assert!(fixture.darts.try_throw());
        fixture.world.spawn_tagged(
            Transform::at(Vec3::new(0.0, 2.0, 5.0)),
            engine::RenderableDesc {
                kind: RenderableKind::Placeholder,
                debug_name: "dart".to_string(),
            },
            vec![DART_TAG.to_string()],
        );
        fixture.world.apply_pending();
        assert_eq!(fixture.world.live_count_with_tag(DART_TAG), 1);

        fixture.start().expect("restart");
        assert_eq!(fixture.world.live_count_with_tag(DART_TAG), 0);
        assert_eq!(fixture.darts.remaining(), 30);
    }

    #[test]
    fn missing_prefab_fails_and_stays_idle() {
        let mut fixture = Fixture::new();
        fixture.controller = RoundController::new(GridSpec::default(), "carnival.zeppelin");

        let err = fixture.start().expect_err("missing prefab");
        assert_eq!(
            err,
            RoundError::MissingPrefab {
                def_name: "carnival.zeppelin".to_string()
            }
        );
        assert!(!fixture.controller.is_active());
        assert_eq!(fixture.controller.round_id(), RoundId(0));
        assert!(fixture.balloons().is_empty());
    }

    #[test]
    fn missing_database_fails() {
        let mut fixture = Fixture::new();
        fixture.world = SceneWorld::default();
        assert_eq!(fixture.start(), Err(RoundError::MissingDefDatabase));
    }

    #[test]
    fn untagged_prefab_still_spawns_balloons() {
        let mut fixture = Fixture::new();
        fixture
            .world
            .set_def_database(DefDatabase::from_entity_defs(vec![balloon_def(Vec::new())]));
        fixture.start().expect("start");
        assert_eq!(fixture.balloons().len(), 27);
    }

    #[test]
    fn clear_abandons_active_round_without_completion() {
        let mut fixture = Fixture::new();
        fixture.start().expect("start");
        fixture.controller.clear(&mut fixture.world);
        fixture.world.apply_pending();

        assert_eq!(fixture.controller.state(), RoundState::Idle);
        assert!(fixture.balloons().is_empty());
        assert_eq!(fixture.controller.events_mut().published_count(), 1);
    }
}
