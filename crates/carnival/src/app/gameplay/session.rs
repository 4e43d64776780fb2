use tracing::{debug, info};

/// Pause and dialog flags shared by everything that gates gameplay input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionContext {
    paused: bool,
    dialog_active: bool,
}

impl SessionContext {
    pub fn gameplay_input_allowed(&self) -> bool {
        !self.paused && !self.dialog_active
    }

    /// 0 while paused.
    pub fn time_scale(&self) -> f32 {
        if self.paused {
            0.0
        } else {
            1.0
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        info!(paused = self.paused, "pause_toggled");
        self.paused
    }

    /// Dialogs cannot open over the pause menu.
    pub fn begin_dialog(&mut self) -> bool {
        if self.paused {
            debug!("dialog_refused_while_paused");
            return false;
        }
        self.dialog_active = true;
        true
    }

    pub fn end_dialog(&mut self) {
        self.dialog_active = false;
    }

    /// Follows the host's dialog state. Opening is still refused while paused.
    pub fn sync_dialog(&mut self, open: bool) {
        if open == self.dialog_active {
            return;
        }
        if open {
            self.begin_dialog();
        } else {
            self.end_dialog();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_dialog_active(&self) -> bool {
        self.dialog_active
    }
}
