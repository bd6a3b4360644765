//! Actor-related components

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable actor handle, independent of ECS entity ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Which team (roster) an actor belongs to.
/// Ordering is part of the overlap tie-break: Home before Away.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Team {
    Home,
    Away,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }

    pub fn code(self) -> char {
        match self {
            Team::Home => 'H',
            Team::Away => 'A',
        }
    }
}

/// A player entity capable of holding and kicking the ball
#[derive(Component, Debug, Clone, Copy)]
pub struct Actor {
    pub id: ActorId,
    pub team: Team,
}

/// Point the ball follows while held, in actor-local space
#[derive(Component, Debug, Clone, Copy)]
pub struct HoldAnchor(pub Vec3);

impl HoldAnchor {
    /// World-space anchor for an actor at `transform`
    pub fn world(&self, transform: &Transform) -> Vec3 {
        transform.translation + transform.rotation * self.0
    }
}

/// Per-actor tuning, constant for the actor's lifetime
#[derive(Component, Debug, Clone)]
pub struct ActorConfig {
    pub move_speed: f32,
    pub rotation_speed: f32,
    pub kick_force: f32,
    pub pass_force: f32,
    /// Anchor-to-ball distance at which the actor touches the ball
    pub control_radius: f32,
}

/// Actor velocity from locomotion (metres per second)
#[derive(Component, Default, Debug)]
pub struct Velocity(pub Vec3);

/// Marker for the actor currently receiving human input.
/// Mirrors `RosterSwitcher::active`; only one actor carries it at a time.
#[derive(Component)]
pub struct HumanControlled;

/// Visual "active actor" marker state, set through physics requests
#[derive(Component, Default, Debug, PartialEq)]
pub struct ControlMarker(pub bool);
