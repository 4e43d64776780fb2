use std::fmt;

use super::round::RoundId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    Started {
        round: RoundId,
        total_balloons: u32,
    },
    Completed {
        round: RoundId,
        popped: u32,
        total_balloons: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&RoundEvent)>;

/// Round notifications with explicit subscribe/unsubscribe.
///
/// Delivery is synchronous and follows subscription order. Listeners must not hold strong
/// references back to whatever owns this registry.
#[derive(Default)]
pub struct RoundEvents {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    published: u64,
}

impl fmt::Debug for RoundEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundEvents")
            .field("listeners", &self.listeners.len())
            .field("published", &self.published)
            .finish()
    }
}

impl RoundEvents {
    pub fn subscribe(&mut self, listener: impl FnMut(&RoundEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(candidate, _)| *candidate != id);
        self.listeners.len() != before
    }

    /// Returns how many listeners received the event.
    pub fn publish(&mut self, event: RoundEvent) -> usize {
        self.published = self.published.saturating_add(1);
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
        self.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn published_count(&self) -> u64 {
        self.published
    }
}
