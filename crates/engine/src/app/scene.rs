use std::mem;

use serde::{Deserialize, Serialize};

use super::input::{ActionStates, InputAction};
use crate::content::{DefDatabase, EntityArchetype};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
    HardReset,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    aim_point: Option<Vec3>,
    dialog_active: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested || self.actions.is_pressed(InputAction::Quit)
    }

    pub fn pressed(&self, action: InputAction) -> bool {
        self.actions.is_pressed(action)
    }

    pub fn with_action_pressed(mut self, action: InputAction, pressed: bool) -> Self {
        self.actions.set(action, pressed);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    /// World point the external aim raycast resolved for this tick, if any.
    pub fn with_aim_point(mut self, aim_point: Option<Vec3>) -> Self {
        self.aim_point = aim_point;
        self
    }

    pub fn aim_point(&self) -> Option<Vec3> {
        self.aim_point
    }

    /// Whether the host's dialog UI is open this tick.
    pub fn with_dialog_active(mut self, dialog_active: bool) -> Self {
        self.dialog_active = dialog_active;
        self
    }

    pub fn dialog_active(&self) -> bool {
        self.dialog_active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_squared(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation_euler_degrees: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation_euler_degrees: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableKind {
    Placeholder,
    Model(String),
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub debug_name: String,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub renderable: RenderableDesc,
    pub tags: Vec<String>,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Entity storage for one scene.
///
/// Spawns and despawns are queued and only take effect in [`SceneWorld::apply_pending`].
/// Every id removed there is recorded and handed out once by [`SceneWorld::take_despawned`],
/// which is how scenes observe destruction.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    despawned: Vec<EntityId>,
    next_applied_spawn_order: u64,
    def_database: Option<DefDatabase>,
}

impl SceneWorld {
    pub fn spawn(&mut self, transform: Transform, renderable: RenderableDesc) -> EntityId {
        self.spawn_tagged(transform, renderable, Vec::new())
    }

    pub fn spawn_tagged(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        tags: Vec<String>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            renderable,
            tags,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn spawn_archetype(&mut self, archetype: &EntityArchetype, transform: Transform) -> EntityId {
        self.spawn_tagged(
            transform,
            RenderableDesc {
                kind: archetype.renderable.clone(),
                debug_name: archetype.def_name.clone(),
            },
            archetype.tags.clone(),
        )
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_unstable();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            let despawned = &mut self.despawned;
            self.entities.retain(|entity| {
                let doomed = pending.binary_search(&entity.id).is_ok();
                if doomed {
                    despawned.push(entity.id);
                }
                !doomed
            });
            self.pending_spawns.retain(|entity| {
                let doomed = pending.binary_search(&entity.id).is_ok();
                if doomed {
                    despawned.push(entity.id);
                }
                !doomed
            });
            self.pending_despawns.clear();
        }

        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    /// Ids removed by previous `apply_pending` calls, oldest first. Each id is returned once.
    pub fn take_despawned(&mut self) -> Vec<EntityId> {
        mem::take(&mut self.despawned)
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.despawned.clear();
        self.next_applied_spawn_order = 0;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn is_pending_despawn(&self, id: EntityId) -> bool {
        self.pending_despawns.contains(&id)
    }

    /// Applied entities carrying `tag` that are not queued for despawn.
    pub fn entities_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities
            .iter()
            .filter(move |entity| entity.has_tag(tag) && !self.is_pending_despawn(entity.id))
    }

    /// Every id carrying `tag` that will exist after the next `apply_pending`.
    pub fn ids_with_tag(&self, tag: &str) -> Vec<EntityId> {
        self.entities
            .iter()
            .chain(self.pending_spawns.iter())
            .filter(|entity| entity.has_tag(tag) && !self.is_pending_despawn(entity.id))
            .map(|entity| entity.id)
            .collect()
    }

    pub fn live_count_with_tag(&self, tag: &str) -> usize {
        self.entities
            .iter()
            .chain(self.pending_spawns.iter())
            .filter(|entity| entity.has_tag(tag) && !self.is_pending_despawn(entity.id))
            .count()
    }

    pub fn set_def_database(&mut self, def_database: DefDatabase) {
        self.def_database = Some(def_database);
    }

    pub fn def_database(&self) -> Option<&DefDatabase> {
        self.def_database.as_ref()
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn set_def_database(&mut self, def_database: DefDatabase) {
        self.world.set_def_database(def_database);
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        self.scene.update(fixed_dt_seconds, input, &mut self.world)
    }

    pub(crate) fn apply_pending(&mut self) {
        self.world.apply_pending();
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn hard_reset(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
        }
        self.world.clear();
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }
}
