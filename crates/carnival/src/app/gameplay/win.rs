use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::display::{Panel, TextLabel};
use super::events::{RoundEvent, RoundEvents, SubscriptionId};
use super::timer::{DeferredActions, TimerHandle};

pub const WIN_MESSAGE_SECONDS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinPhase {
    WaitingForRound,
    RoundActive,
    Announcing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinRecord {
    pub total_wins: u32,
    pub game_completed: bool,
    pub round_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WinAction {
    HideAnnouncement,
}

/// Counts wins across rounds and runs the win announcement.
#[derive(Debug)]
pub struct WinCoordinator {
    message_seconds: f64,
    counter_label: Option<TextLabel>,
    panel: Option<Panel>,
    record: WinRecord,
    phase: WinPhase,
    starting_balloons: u32,
    timers: DeferredActions<WinAction>,
    pending_hide: Option<TimerHandle>,
}

impl WinCoordinator {
    pub fn new(message_seconds: f64, counter_label: Option<TextLabel>, panel: Option<Panel>) -> Self {
        let mut coordinator = Self {
            message_seconds,
            counter_label,
            panel,
            record: WinRecord::default(),
            phase: WinPhase::WaitingForRound,
            starting_balloons: 0,
            timers: DeferredActions::default(),
            pending_hide: None,
        };
        coordinator.refresh_counter_label();
        coordinator.set_panel_visible(false);
        coordinator
    }

    /// Registers a listener that forwards round events without keeping the coordinator alive.
    pub fn subscribe_shared(this: &Rc<RefCell<Self>>, events: &mut RoundEvents) -> SubscriptionId {
        let weak = Rc::downgrade(this);
        events.subscribe(move |event| {
            let Some(coordinator) = weak.upgrade() else {
                return;
            };
            match coordinator.try_borrow_mut() {
                Ok(mut coordinator) => coordinator.on_round_event(event),
                Err(_) => warn!(?event, "win_coordinator_busy"),
            };
        })
    }

    pub fn on_round_event(&mut self, event: &RoundEvent) {
        match *event {
            RoundEvent::Started { total_balloons, .. } => self.begin_round(total_balloons),
            RoundEvent::Completed { .. } => {
                self.on_all_balloons_popped();
            }
        }
    }

    pub fn begin_round(&mut self, total_balloons: u32) {
        if let Some(handle) = self.pending_hide.take() {
            self.timers.cancel(handle);
        }
        self.set_panel_visible(false);
        self.starting_balloons = total_balloons;
        self.record.game_completed = false;
        self.record.round_active = true;
        self.phase = WinPhase::RoundActive;
        debug!(starting_balloons = total_balloons, "win_tracking_round");
    }

    /// Picks up a round that started before this coordinator was listening.
    pub fn observe_round_activity(&mut self, is_active: bool, live_balloons: usize) -> bool {
        if !is_active || self.record.round_active {
            return false;
        }
        self.begin_round(u32::try_from(live_balloons).unwrap_or(u32::MAX));
        true
    }

    /// Returns true when this notice counted as a win.
    pub fn on_all_balloons_popped(&mut self) -> bool {
        if self.phase != WinPhase::RoundActive || self.record.game_completed {
            debug!(phase = ?self.phase, "win_notice_ignored");
            return false;
        }

        self.record.game_completed = true;
        self.record.total_wins = self.record.total_wins.saturating_add(1);
        self.refresh_counter_label();

        let message = format!("You Win!\nTotal Wins: {}", self.record.total_wins);
        match self.panel.as_mut() {
            Some(panel) => {
                panel.set_text(message);
                panel.set_active(true);
            }
            None => warn!("win_panel_missing"),
        }
        self.pending_hide = Some(
            self.timers
                .schedule(self.message_seconds, WinAction::HideAnnouncement),
        );
        self.phase = WinPhase::Announcing;

        info!(
            total_wins = self.record.total_wins,
            starting_balloons = self.starting_balloons,
            "player_won"
        );
        true
    }

    pub fn tick(&mut self, dt_seconds: f64) {
        for action in self.timers.advance(dt_seconds) {
            match action {
                WinAction::HideAnnouncement => {
                    self.pending_hide = None;
                    self.set_panel_visible(false);
                    self.record.round_active = false;
                    self.phase = WinPhase::WaitingForRound;
                    debug!(total_wins = self.record.total_wins, "win_announcement_hidden");
                }
            }
        }
    }

    pub fn reset_win_counter(&mut self) {
        self.record.total_wins = 0;
        self.refresh_counter_label();
        info!("wins_reset");
    }

    pub fn status_line(&self) -> String {
        format!(
            "wins={} round_active={} game_completed={} starting_balloons={} phase={:?}",
            self.record.total_wins,
            self.record.round_active,
            self.record.game_completed,
            self.starting_balloons,
            self.phase
        )
    }

    pub fn total_wins(&self) -> u32 {
        self.record.total_wins
    }

    pub fn record(&self) -> WinRecord {
        self.record
    }

    pub fn phase(&self) -> WinPhase {
        self.phase
    }

    pub fn starting_balloons(&self) -> u32 {
        self.starting_balloons
    }

    pub fn is_announcing(&self) -> bool {
        self.pending_hide.is_some()
    }

    pub fn counter_label(&self) -> Option<&TextLabel> {
        self.counter_label.as_ref()
    }

    pub fn panel(&self) -> Option<&Panel> {
        self.panel.as_ref()
    }

    fn refresh_counter_label(&mut self) {
        let text = format!("Wins: {}", self.record.total_wins);
        match self.counter_label.as_mut() {
            Some(label) => label.set_text(text),
            None => warn!("win_counter_label_missing"),
        }
    }

    fn set_panel_visible(&mut self, visible: bool) {
        match self.panel.as_mut() {
            Some(panel) => panel.set_active(visible),
            None => warn!(visible, "win_panel_missing"),
        }
    }
}
