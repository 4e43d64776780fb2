pub const STARTING_DARTS: u32 = 30;

/// Throws left this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DartBudget {
    starting: u32,
    remaining: u32,
}

impl Default for DartBudget {
    fn default() -> Self {
        Self::new(STARTING_DARTS)
    }
}

impl DartBudget {
    pub fn new(starting: u32) -> Self {
        Self {
            starting,
            remaining: starting,
        }
    }

    /// Spends one dart if any remain. This is the only place the budget decreases.
    pub fn try_throw(&mut self) -> bool {
        match self.remaining.checked_sub(1) {
            Some(next) => {
                self.remaining = next;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.remaining = self.starting;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn starting(&self) -> u32 {
        self.starting
    }

    pub fn thrown(&self) -> u32 {
        self.starting - self.remaining
    }
}
