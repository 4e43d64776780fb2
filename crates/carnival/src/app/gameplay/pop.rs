use std::collections::HashMap;

use engine::{EntityId, SceneWorld};
use tracing::debug;

use super::round::{PopOutcome, RoundController, RoundId};

/// Per-balloon hook that turns destruction into a pop report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopTracker {
    balloon: EntityId,
    round: RoundId,
    reported: bool,
}

impl PopTracker {
    pub fn new(balloon: EntityId, round: RoundId) -> Self {
        Self {
            balloon,
            round,
            reported: false,
        }
    }

    /// Reports at most once. With no controller (scene teardown) the report is dropped.
    pub fn on_balloon_destroyed(
        &mut self,
        controller: Option<&mut RoundController>,
        world: &SceneWorld,
    ) -> Option<PopOutcome> {
        if self.reported {
            return None;
        }
        self.reported = true;
        let controller = controller?;
        Some(controller.on_balloon_popped(self.round, world))
    }

    pub fn balloon(&self) -> EntityId {
        self.balloon
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn has_reported(&self) -> bool {
        self.reported
    }
}

/// Trackers keyed by the balloon they watch.
#[derive(Debug, Default)]
pub struct PopTrackers {
    trackers: HashMap<EntityId, PopTracker>,
}

impl PopTrackers {
    pub fn attach(&mut self, balloon: EntityId, round: RoundId) {
        self.trackers.insert(balloon, PopTracker::new(balloon, round));
    }

    /// Forwards destruction of tracked balloons. Untracked ids are ignored. Returns how many
    /// reports reached the controller.
    pub fn notify_destroyed(
        &mut self,
        destroyed: &[EntityId],
        mut controller: Option<&mut RoundController>,
        world: &SceneWorld,
    ) -> usize {
        let mut delivered = 0;
        for id in destroyed {
            let Some(mut tracker) = self.trackers.remove(id) else {
                continue;
            };
            if tracker
                .on_balloon_destroyed(controller.as_deref_mut(), world)
                .is_some()
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// Fires every remaining tracker with no controller attached.
    pub fn drain_for_teardown(&mut self, world: &SceneWorld) -> usize {
        let drained = self.trackers.len();
        for (_, mut tracker) in self.trackers.drain() {
            tracker.on_balloon_destroyed(None, world);
        }
        if drained > 0 {
            debug!(trackers = drained, "pop_trackers_torn_down");
        }
        drained
    }

    pub fn contains(&self, balloon: EntityId) -> bool {
        self.trackers.contains_key(&balloon)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
