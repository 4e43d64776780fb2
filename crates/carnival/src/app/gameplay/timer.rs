const DUE_EPSILON_SECONDS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Scheduled<A> {
    handle: TimerHandle,
    due_at: f64,
    action: A,
}

/// Fire-once delayed actions driven by the fixed tick clock.
#[derive(Debug, Clone)]
pub struct DeferredActions<A> {
    now: f64,
    next_handle: u64,
    scheduled: Vec<Scheduled<A>>,
}

impl<A> Default for DeferredActions<A> {
    fn default() -> Self {
        Self {
            now: 0.0,
            next_handle: 0,
            scheduled: Vec::new(),
        }
    }
}

impl<A> DeferredActions<A> {
    /// Negative or non-finite delays fire on the next `advance`.
    pub fn schedule(&mut self, delay_seconds: f64, action: A) -> TimerHandle {
        let delay = if delay_seconds.is_finite() {
            delay_seconds.max(0.0)
        } else {
            0.0
        };
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.scheduled.push(Scheduled {
            handle,
            due_at: self.now + delay,
            action,
        });
        handle
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.scheduled.len();
        self.scheduled.retain(|entry| entry.handle != handle);
        self.scheduled.len() != before
    }

    /// Moves the clock forward and returns the actions now due, earliest first. Ties keep
    /// scheduling order.
    pub fn advance(&mut self, dt_seconds: f64) -> Vec<A> {
        if dt_seconds.is_finite() && dt_seconds > 0.0 {
            self.now += dt_seconds;
        }
        let now = self.now + DUE_EPSILON_SECONDS;

        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .scheduled
            .drain(..)
            .partition(|entry| entry.due_at <= now);
        self.scheduled = pending;

        due.sort_by(|a, b| {
            a.due_at
                .total_cmp(&b.due_at)
                .then_with(|| a.handle.cmp(&b.handle))
        });
        due.into_iter().map(|entry| entry.action).collect()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.scheduled.iter().any(|entry| entry.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }

    pub fn now(&self) -> f64 {
        self.now
    }
}
