use tracing::info;

pub(crate) const DEFAULT_SESSION_SECONDS: u32 = 600;

/// Whole-second countdown. Starts once, never restarts, never goes up, and
/// stops at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionTimer {
    total_seconds: u32,
    remaining_seconds: u32,
    started: bool,
}

impl SessionTimer {
    pub(crate) fn new(total_seconds: u32) -> Self {
        Self {
            total_seconds,
            remaining_seconds: total_seconds,
            started: false,
        }
    }

    pub(crate) fn restore(total_seconds: u32, remaining_seconds: u32, started: bool) -> Self {
        Self {
            total_seconds: total_seconds.max(remaining_seconds),
            remaining_seconds,
            started,
        }
    }

    /// Returns true only for the call that actually starts the countdown.
    pub(crate) fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        self.remaining_seconds = self.total_seconds;
        info!(seconds = self.total_seconds, "timer_started");
        true
    }

    /// One elapsed second. Returns true on the tick that reaches zero.
    pub(crate) fn tick(&mut self) -> bool {
        if !self.started || self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            info!("timer_expired");
            return true;
        }
        false
    }

    pub(crate) fn started(&self) -> bool {
        self.started
    }

    pub(crate) fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub(crate) fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub(crate) fn expired(&self) -> bool {
        self.started && self.remaining_seconds == 0
    }

    pub(crate) fn clock_text(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }
}
