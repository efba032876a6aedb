//! Fixed-step pacing for a host that calls back once per display frame.

use crate::config::SessionConfig;
use crate::engine::GameSession;
use crate::types::TickOutcome;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The loop is not running; nothing was simulated.
    Stopped,
    /// Too early for the next tick.
    Waiting,
    Ticked(TickOutcome),
}

impl FrameOutcome {
    /// Whether the host should schedule another frame.
    pub fn should_reschedule(&self) -> bool {
        matches!(self, Self::Waiting | Self::Ticked(TickOutcome::Running))
    }
}

/// Runs at most one session tick per frame, and only once `interval_ms` has
/// elapsed since the previous tick.
#[derive(Clone, Debug)]
pub struct FixedStepLoop {
    interval_ms: f64,
    last_tick_ms: Option<f64>,
    running: bool,
}

impl FixedStepLoop {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_tick_ms: None,
            running: false,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.tick_interval_ms())
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The first frame after this call only records the timing baseline.
    pub fn start(&mut self) {
        self.running = true;
        self.last_tick_ms = None;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn on_frame(&mut self, now_ms: f64, session: &mut GameSession) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Stopped;
        }
        let Some(last) = self.last_tick_ms else {
            self.last_tick_ms = Some(now_ms);
            return FrameOutcome::Waiting;
        };
        if now_ms - last < self.interval_ms {
            return FrameOutcome::Waiting;
        }

        self.last_tick_ms = Some(now_ms);
        let outcome = session.tick();
        if outcome != TickOutcome::Running {
            self.running = false;
        }
        FrameOutcome::Ticked(outcome)
    }
}
