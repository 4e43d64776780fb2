use super::scene::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    StartRound,
    Throw,
    TogglePause,
    ResetWins,
    DumpStatus,
    ReturnToMenu,
    Quit,
}

const ACTION_COUNT: usize = 7;

/// Per-tick press edges. A set entry means the action was pressed during this tick only.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, pressed: bool) {
        self.pressed[action.index()] = pressed;
    }

    pub(crate) fn is_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::StartRound => 0,
            InputAction::Throw => 1,
            InputAction::TogglePause => 2,
            InputAction::ResetWins => 3,
            InputAction::DumpStatus => 4,
            InputAction::ReturnToMenu => 5,
            InputAction::Quit => 6,
        }
    }
}

/// Produces one input snapshot per fixed tick. Implementations own their edge bookkeeping.
pub trait InputSource {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot;
}
