//! Simulation and match clocks
//!
//! `SimClock` advances by a fixed step every time the step schedule runs, so
//! timers fire on the same step no matter how the schedule is driven (window
//! loop or headless test). `MatchClock` counts the match down to full time.

use bevy::prelude::*;
use std::time::Duration;

use crate::constants::*;
use crate::events::{EventBus, GameEvent};
use crate::scoring::Score;

/// Fixed-step simulated time
#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    step: u64,
    dt: Duration,
    elapsed: Duration,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::from_hz(STEP_HZ)
    }
}

impl SimClock {
    pub fn new(dt: Duration) -> Self {
        Self {
            step: 0,
            dt,
            elapsed: Duration::ZERO,
        }
    }

    pub fn from_hz(hz: f64) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / hz))
    }

    /// Advance one step
    pub fn tick(&mut self) {
        self.step += 1;
        self.elapsed += self.dt;
    }

    /// Elapsed simulated time at the current step
    pub fn now(&self) -> Duration {
        self.elapsed
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn dt(&self) -> Duration {
        self.dt
    }

    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

/// First system of every step
pub fn advance_sim_clock(mut clock: ResMut<SimClock>, mut bus: ResMut<EventBus>) {
    clock.tick();
    bus.update_time(clock.now());
}

/// Match countdown
#[derive(Resource, Debug, Clone)]
pub struct MatchClock {
    duration: f32,
    remaining: f32,
    finished: bool,
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::new(MATCH_DURATION)
    }
}

impl MatchClock {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            remaining: duration,
            finished: false,
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// "MM:SS" for display
    pub fn display(&self) -> String {
        let secs = self.remaining.max(0.0) as u32;
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Count down; returns true on the step the match ends
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.finished {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.finished = true;
            return true;
        }
        false
    }
}

/// Runs at the end of the control stage
pub fn update_match_clock(
    clock: Res<SimClock>,
    score: Res<Score>,
    mut match_clock: ResMut<MatchClock>,
    mut bus: ResMut<EventBus>,
) {
    if match_clock.advance(clock.dt_secs()) {
        info!("Full time after {:.0}s, final score {}", match_clock.duration, *score);
        bus.emit(GameEvent::MatchEnd {
            duration: match_clock.duration,
        });
    }
}

/// Run condition: step systems only run while the match is in progress
pub fn match_in_progress(match_clock: Res<MatchClock>) -> bool {
    !match_clock.is_finished()
}
