use engine::{
    DefDatabase, EntityArchetype, EntityDefId, InputAction, InputSnapshot, RenderableKind, Scene,
    SceneCommand, SceneWorld, Vec3,
};

use super::*;

const DT: f32 = 1.0 / 60.0;
const MISS_POINT: Vec3 = Vec3::new(0.0, 10.0, 6.0);

fn archetype(def_name: &str, tag: &str, hit_radius: Option<f32>) -> EntityArchetype {
    EntityArchetype {
        id: EntityDefId(0),
        def_name: def_name.to_string(),
        label: def_name.to_string(),
        renderable: RenderableKind::Model(tag.to_lowercase()),
        hit_radius,
        tags: vec![tag.to_string()],
    }
}

fn seeded_world(defs: Vec<EntityArchetype>) -> SceneWorld {
    let mut world = SceneWorld::default();
    world.set_def_database(DefDatabase::from_entity_defs(defs));
    world
}

fn booth_defs() -> Vec<EntityArchetype> {
    vec![
        archetype(BALLOON_PREFAB, BALLOON_TAG, Some(DEFAULT_HIT_RADIUS)),
        archetype(DART_PREFAB, DART_TAG, None),
    ]
}

struct Harness {
    scene: CarnivalScene,
    world: SceneWorld,
}

impl Harness {
    fn new() -> Self {
        Self::with(CarnivalScene::new(SceneConfig::default()), booth_defs())
    }

    fn with(mut scene: CarnivalScene, defs: Vec<EntityArchetype>) -> Self {
        let mut world = seeded_world(defs);
        scene.load(&mut world);
        world.apply_pending();
        Self { scene, world }
    }

    fn step(&mut self, input: InputSnapshot) -> SceneCommand {
        let command = self.scene.update(DT, &input, &mut self.world);
        self.world.apply_pending();
        command
    }

    fn press(&mut self, action: InputAction) -> SceneCommand {
        self.step(InputSnapshot::empty().with_action_pressed(action, true))
    }

    fn throw_at(&mut self, point: Vec3) -> SceneCommand {
        self.step(
            InputSnapshot::empty()
                .with_action_pressed(InputAction::Throw, true)
                .with_aim_point(Some(point)),
        )
    }

    fn idle(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.step(InputSnapshot::empty());
        }
    }

    fn balloon_positions(&self) -> Vec<Vec3> {
        self.world
            .entities_with_tag(BALLOON_TAG)
            .map(|entity| entity.transform.position)
            .collect()
    }

    fn live(&self, tag: &str) -> usize {
        self.world.live_count_with_tag(tag)
    }

    fn wins(&self) -> u32 {
        self.scene.win_handle().borrow().total_wins()
    }

    fn panel_visible(&self) -> bool {
        self.scene
            .win_handle()
            .borrow()
            .panel()
            .map(Panel::is_visible)
            .unwrap_or(false)
    }

    fn win_round(&mut self) {
        self.press(InputAction::StartRound);
        for position in self.balloon_positions() {
            self.throw_at(position);
        }
        self.idle(1);
    }
}

#[test]
fn start_round_spawns_full_wall() {
    let mut harness = Harness::new();
    assert_eq!(harness.scene.dart_counter_text(), Some("30"));

    harness.press(InputAction::StartRound);

    assert!(harness.scene.controller().is_active());
    assert_eq!(harness.live(BALLOON_TAG), 27);
    assert_eq!(harness.scene.controller().total_balloons(), 27);
    assert_eq!(harness.scene.trackers().len(), 27);
    assert_eq!(
        harness.balloon_positions(),
        SceneConfig::default().grid.positions()
    );
}

#[test]
fn popping_every_balloon_wins_exactly_once() {
    let mut harness = Harness::new();
    harness.win_round();

    let controller = harness.scene.controller();
    assert_eq!(controller.state(), RoundState::Idle);
    assert_eq!(controller.popped_count(), 27);
    assert_eq!(controller.late_reports(), 0);
    assert_eq!(harness.live(BALLOON_TAG), 0);
    assert_eq!(harness.wins(), 1);
    assert!(harness.panel_visible());

    let win = harness.scene.win_handle();
    let win = win.borrow();
    assert_eq!(win.counter_label().map(TextLabel::text), Some("Wins: 1"));
    assert_eq!(win.panel().map(Panel::text), Some("You Win!\nTotal Wins: 1"));
}

#[test]
fn popping_does_not_touch_dart_budget_beyond_throws() {
    let mut harness = Harness::new();
    harness.win_round();

    assert_eq!(harness.scene.darts().remaining(), 3);
    assert_eq!(harness.scene.dart_counter_text(), Some("3"));
    assert_eq!(harness.live(DART_TAG), 27);
}

#[test]
fn throws_refused_once_budget_is_spent() {
    let mut harness = Harness::new();
    harness.press(InputAction::StartRound);
    for _ in 0..30 {
        harness.throw_at(MISS_POINT);
    }
    assert_eq!(harness.scene.darts().remaining(), 0);
    assert_eq!(harness.live(DART_TAG), 30);

    let outcome = harness.scene.throw_dart(Some(MISS_POINT), &mut harness.world);
    assert_eq!(outcome, ThrowOutcome::OutOfDarts);
    harness.world.apply_pending();
    assert_eq!(harness.live(DART_TAG), 30);
    assert_eq!(harness.scene.darts().remaining(), 0);
    assert!(harness.scene.controller().is_active());
    assert_eq!(harness.scene.controller().popped_count(), 0);
}

#[test]
fn restart_refills_darts_and_clears_stuck_darts() {
    let mut harness = Harness::new();
    harness.win_round();
    assert_eq!(harness.live(DART_TAG), 27);

    harness.press(InputAction::StartRound);
    assert_eq!(harness.live(DART_TAG), 0);
    assert_eq!(harness.scene.darts().remaining(), 30);
    assert_eq!(harness.scene.dart_counter_text(), Some("30"));
}

#[test]
fn start_while_active_restarts_round() {
    let mut harness = Harness::new();
    harness.press(InputAction::StartRound);
    let first = harness.balloon_positions()[0];
    harness.throw_at(first);
    harness.idle(1);
    assert_eq!(harness.scene.controller().popped_count(), 1);

    harness.press(InputAction::StartRound);
    assert_eq!(harness.scene.controller().round_id(), RoundId(2));
    assert!(harness.scene.controller().is_active());
    assert_eq!(harness.scene.controller().popped_count(), 0);
    assert_eq!(harness.live(BALLOON_TAG), 27);
    assert_eq!(harness.live(DART_TAG), 0);
    assert_eq!(harness.scene.darts().remaining(), 30);

    harness.idle(1);
    assert_eq!(harness.scene.controller().popped_count(), 0);
    assert_eq!(harness.scene.trackers().len(), 27);
    assert_eq!(harness.wins(), 0);
}

#[test]
fn restart_after_darts_run_out() {
    let mut harness = Harness::new();
    harness.press(InputAction::StartRound);
    for _ in 0..30 {
        harness.throw_at(MISS_POINT);
    }
    assert_eq!(harness.scene.darts().remaining(), 0);
    assert!(harness.scene.controller().is_active());

    harness.press(InputAction::StartRound);
    assert_eq!(harness.scene.controller().round_id(), RoundId(2));
    assert_eq!(harness.scene.darts().remaining(), 30);
    assert_eq!(harness.scene.dart_counter_text(), Some("30"));

    let first = harness.balloon_positions()[0];
    harness.throw_at(first);
    harness.idle(1);
    assert_eq!(harness.scene.darts().remaining(), 29);
    assert_eq!(harness.scene.controller().popped_count(), 1);
}

#[test]
fn dart_sticks_only_inside_board_zone() {
    let mut harness = Harness::new();

    let inside = harness
        .scene
        .throw_dart(Some(Vec3::new(0.0, 0.5, 5.0)), &mut harness.world);
    let outside = harness
        .scene
        .throw_dart(Some(Vec3::new(3.0, 0.5, 5.0)), &mut harness.world);
    harness.world.apply_pending();

    assert!(matches!(
        inside,
        ThrowOutcome::Landed {
            stuck: true,
            popped: None,
            ..
        }
    ));
    assert!(matches!(
        outside,
        ThrowOutcome::Landed {
            stuck: false,
            popped: None,
            ..
        }
    ));
    assert_eq!(harness.live(DART_TAG), 1);
    assert_eq!(harness.scene.darts().remaining(), 28);
}

#[test]
fn throw_without_aim_spends_a_dart() {
    let mut harness = Harness::new();
    harness.press(InputAction::Throw);
    assert_eq!(harness.scene.darts().remaining(), 29);
    assert_eq!(harness.live(DART_TAG), 0);
}

#[test]
fn pause_gates_gameplay_input() {
    let mut harness = Harness::new();
    harness.press(InputAction::TogglePause);
    assert!(harness.scene.session().is_paused());

    harness.press(InputAction::StartRound);
    harness.throw_at(MISS_POINT);
    assert!(!harness.scene.controller().is_active());
    assert_eq!(harness.scene.darts().remaining(), 30);

    harness.press(InputAction::TogglePause);
    harness.press(InputAction::StartRound);
    assert!(harness.scene.controller().is_active());
}

#[test]
fn dialog_gates_gameplay_input() {
    let mut harness = Harness::new();
    harness.step(
        InputSnapshot::empty()
            .with_dialog_active(true)
            .with_action_pressed(InputAction::StartRound, true),
    );
    assert!(harness.scene.session().is_dialog_active());
    assert!(!harness.scene.controller().is_active());

    harness.press(InputAction::StartRound);
    assert!(!harness.scene.session().is_dialog_active());
    assert!(harness.scene.controller().is_active());
}

#[test]
fn dialog_cannot_open_over_pause_menu() {
    let mut harness = Harness::new();
    harness.press(InputAction::TogglePause);
    harness.step(InputSnapshot::empty().with_dialog_active(true));
    assert!(!harness.scene.session().is_dialog_active());

    harness.press(InputAction::TogglePause);
    harness.step(InputSnapshot::empty().with_dialog_active(true));
    assert!(harness.scene.session().is_dialog_active());
}

#[test]
fn pause_freezes_win_announcement() {
    let mut harness = Harness::new();
    harness.win_round();
    harness.press(InputAction::TogglePause);
    harness.idle(600);
    assert!(harness.panel_visible());

    harness.press(InputAction::TogglePause);
    harness.idle(181);
    assert!(!harness.panel_visible());
    assert_eq!(
        harness.scene.win_handle().borrow().phase(),
        WinPhase::WaitingForRound
    );
}

#[test]
fn announcement_clears_after_three_seconds() {
    let mut harness = Harness::new();
    harness.win_round();
    harness.idle(170);
    assert!(harness.panel_visible());
    harness.idle(20);
    assert!(!harness.panel_visible());
    assert!(!harness.scene.win_handle().borrow().record().round_active);
}

#[test]
fn new_round_during_announcement_cancels_hide() {
    let mut harness = Harness::new();
    harness.win_round();
    harness.idle(60);

    harness.press(InputAction::StartRound);
    assert!(!harness.panel_visible());
    harness.idle(240);

    let win = harness.scene.win_handle();
    assert_eq!(win.borrow().phase(), WinPhase::RoundActive);
    assert!(win.borrow().record().round_active);
    assert_eq!(win.borrow().total_wins(), 1);
}

#[test]
fn consecutive_rounds_accumulate_wins() {
    let mut harness = Harness::new();
    harness.win_round();
    harness.idle(200);
    harness.win_round();
    assert_eq!(harness.wins(), 2);
}

#[test]
fn reset_wins_key_zeroes_counter() {
    let mut harness = Harness::new();
    harness.win_round();
    harness.press(InputAction::ResetWins);

    assert_eq!(harness.wins(), 0);
    let win = harness.scene.win_handle();
    assert_eq!(
        win.borrow().counter_label().map(TextLabel::text),
        Some("Wins: 0")
    );
}

#[test]
fn return_to_menu_requires_pause() {
    let mut harness = Harness::new();
    assert_eq!(harness.press(InputAction::ReturnToMenu), SceneCommand::None);

    harness.press(InputAction::TogglePause);
    assert_eq!(
        harness.press(InputAction::ReturnToMenu),
        SceneCommand::HardReset
    );
}

#[test]
fn reload_after_hard_reset_starts_fresh_session() {
    let mut harness = Harness::new();
    harness.win_round();

    harness.scene.unload(&mut harness.world);
    harness.world.clear();
    harness.scene.load(&mut harness.world);

    assert_eq!(harness.wins(), 0);
    assert!(!harness.scene.controller().is_active());
    assert_eq!(harness.scene.darts().remaining(), 30);

    harness.win_round();
    assert_eq!(harness.wins(), 1);
}

#[test]
fn missing_balloon_prefab_keeps_booth_running() {
    let mut harness = Harness::with(
        CarnivalScene::new(SceneConfig::default()),
        vec![archetype(DART_PREFAB, DART_TAG, None)],
    );
    harness.press(InputAction::StartRound);

    assert!(!harness.scene.controller().is_active());
    assert_eq!(harness.scene.controller().round_id(), RoundId(0));
    assert_eq!(harness.live(BALLOON_TAG), 0);

    harness.throw_at(MISS_POINT);
    assert_eq!(harness.scene.darts().remaining(), 29);
}

#[test]
fn missing_dart_prefab_refuses_throw_without_spending() {
    let mut harness = Harness::with(
        CarnivalScene::new(SceneConfig::default()),
        vec![archetype(BALLOON_PREFAB, BALLOON_TAG, None)],
    );
    let outcome = harness.scene.throw_dart(Some(MISS_POINT), &mut harness.world);
    assert_eq!(outcome, ThrowOutcome::PrefabMissing);
    assert_eq!(harness.scene.darts().remaining(), 30);
}

#[test]
fn unload_tears_down_trackers_without_counting() {
    let mut harness = Harness::new();
    harness.press(InputAction::StartRound);
    assert_eq!(harness.scene.trackers().len(), 27);

    harness.scene.unload(&mut harness.world);
    assert!(harness.scene.trackers().is_empty());
    assert_eq!(harness.scene.controller().popped_count(), 0);
    assert_eq!(harness.wins(), 0);
}

#[test]
fn booth_without_displays_still_counts_wins() {
    let mut harness = Harness::with(
        CarnivalScene::new(SceneConfig::default()).without_displays(),
        booth_defs(),
    );
    harness.win_round();

    assert_eq!(harness.wins(), 1);
    assert_eq!(harness.scene.dart_counter_text(), None);
    assert!(harness.scene.win_handle().borrow().panel().is_none());
}

#[test]
fn debug_title_reports_round_progress() {
    let mut harness = Harness::new();
    harness.press(InputAction::StartRound);
    let title = harness.scene.debug_title(&harness.world).expect("title");
    assert!(title.contains("Popped 0/27"), "{title}");
    assert!(title.contains("Darts 30"), "{title}");
}
