//! Ball-related components

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::REATTACH_GRACE;
use crate::player::ActorId;
use crate::tuning::duration_secs;

/// Marker for ball entities
#[derive(Component)]
pub struct Ball;

/// Stable ball handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId(pub u32);

impl std::fmt::Display for BallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// Ball state machine. There is no in-flight state: a kicked ball is Free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallState {
    Free,
    Held(ActorId),
}

/// Holder bookkeeping for one ball.
///
/// Only `ball::possession` writes these fields.
#[derive(Component, Debug, Clone)]
pub struct Possession {
    pub(super) ball: BallId,
    pub(super) holder: Option<ActorId>,
    pub(super) control_offset: Vec3,
    /// Last actor to lose the ball, and when
    pub(super) last_release: Option<(ActorId, Duration)>,
}

impl Possession {
    pub fn new(ball: BallId) -> Self {
        Self {
            ball,
            holder: None,
            control_offset: Vec3::ZERO,
            last_release: None,
        }
    }

    pub fn ball(&self) -> BallId {
        self.ball
    }

    pub fn holder(&self) -> Option<ActorId> {
        self.holder
    }

    pub fn state(&self) -> BallState {
        match self.holder {
            Some(actor) => BallState::Held(actor),
            None => BallState::Free,
        }
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    /// Follow target for a holder whose anchor is at `anchor`
    pub fn target(&self, anchor: Vec3) -> Vec3 {
        anchor + self.control_offset
    }

    /// True if `actor` released this ball less than `grace` ago
    pub fn in_grace(&self, actor: ActorId, now: Duration, grace: Duration) -> bool {
        match self.last_release {
            Some((who, at)) => who == actor && now.saturating_sub(at) < grace,
            None => false,
        }
    }
}

/// Rigid-body state of the ball, owned by the physics stage
#[derive(Component, Debug, Clone, PartialEq)]
pub struct BallBody {
    pub velocity: Vec3,
    pub mass: f32,
    pub use_gravity: bool,
    pub damping: f32,
    /// Controlled (kinematic-like) while held
    pub controlled: bool,
}

impl BallBody {
    pub fn new(config: &BallConfig) -> Self {
        Self {
            velocity: Vec3::ZERO,
            mass: config.mass,
            use_gravity: true,
            damping: config.idle_damping,
            controlled: false,
        }
    }

    /// Switch between held and free physical behaviour
    pub fn set_controlled(&mut self, controlled: bool, config: &BallConfig) {
        self.controlled = controlled;
        if controlled {
            self.use_gravity = false;
            self.damping = config.held_damping;
        } else {
            self.use_gravity = true;
            self.damping = config.idle_damping;
        }
    }
}

/// Per-ball tuning, constant for the ball's lifetime
#[derive(Component, Debug, Clone)]
pub struct BallConfig {
    pub follow_sharpness: f32,
    pub max_control_distance: f32,
    pub reattach_grace: f32,
    pub held_damping: f32,
    pub idle_damping: f32,
    pub gravity: f32,
    pub mass: f32,
    pub radius: f32,
}

impl BallConfig {
    pub fn reattach_grace(&self) -> Duration {
        duration_secs("reattach_grace", self.reattach_grace, REATTACH_GRACE)
    }
}
