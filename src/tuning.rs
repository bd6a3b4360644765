//! Global gameplay tuning settings

use bevy::log::warn;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ball::BallConfig;
use crate::constants::*;
use crate::control::RosterSwitcher;
use crate::player::ActorConfig;

// Serde default functions so partial config files keep working
fn default_move_speed() -> f32 {
    MOVE_SPEED
}
fn default_rotation_speed() -> f32 {
    ROTATION_SPEED
}
fn default_follow_sharpness() -> f32 {
    FOLLOW_SHARPNESS
}
fn default_max_control_distance() -> f32 {
    MAX_CONTROL_DISTANCE
}
fn default_control_radius() -> f32 {
    CONTROL_RADIUS
}
fn default_reattach_grace() -> f32 {
    REATTACH_GRACE
}
fn default_kick_force() -> f32 {
    KICK_FORCE
}
fn default_pass_force() -> f32 {
    PASS_FORCE
}
fn default_switch_cooldown() -> f32 {
    SWITCH_COOLDOWN
}
fn default_transfer_delay() -> f32 {
    TRANSFER_DELAY
}
fn default_held_damping() -> f32 {
    HELD_DAMPING
}
fn default_idle_damping() -> f32 {
    IDLE_DAMPING
}
fn default_ball_gravity() -> f32 {
    BALL_GRAVITY
}
fn default_ball_mass() -> f32 {
    BALL_MASS
}

/// Path to global gameplay tuning config
pub const GAMEPLAY_TUNING_FILE: &str = "config/gameplay_tuning.json";

/// Serializable tuning values stored in config.
///
/// Values are read once when entities are spawned and stay constant for the
/// entity's lifetime.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameplayTuning {
    // Locomotion
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f32,
    // Ball control
    #[serde(default = "default_follow_sharpness")]
    pub follow_sharpness: f32,
    #[serde(default = "default_max_control_distance")]
    pub max_control_distance: f32,
    #[serde(default = "default_control_radius")]
    pub control_radius: f32,
    #[serde(default = "default_reattach_grace")]
    pub reattach_grace: f32,
    // Kicking
    #[serde(default = "default_kick_force")]
    pub kick_force: f32,
    #[serde(default = "default_pass_force")]
    pub pass_force: f32,
    // Switching
    #[serde(default = "default_switch_cooldown")]
    pub switch_cooldown: f32,
    #[serde(default = "default_transfer_delay")]
    pub transfer_delay: f32,
    // Ball body
    #[serde(default = "default_held_damping")]
    pub held_damping: f32,
    #[serde(default = "default_idle_damping")]
    pub idle_damping: f32,
    #[serde(default = "default_ball_gravity")]
    pub ball_gravity: f32,
    #[serde(default = "default_ball_mass")]
    pub ball_mass: f32,
}

impl Default for GameplayTuning {
    fn default() -> Self {
        Self {
            move_speed: default_move_speed(),
            rotation_speed: default_rotation_speed(),
            follow_sharpness: default_follow_sharpness(),
            max_control_distance: default_max_control_distance(),
            control_radius: default_control_radius(),
            reattach_grace: default_reattach_grace(),
            kick_force: default_kick_force(),
            pass_force: default_pass_force(),
            switch_cooldown: default_switch_cooldown(),
            transfer_delay: default_transfer_delay(),
            held_damping: default_held_damping(),
            idle_damping: default_idle_damping(),
            ball_gravity: default_ball_gravity(),
            ball_mass: default_ball_mass(),
        }
    }
}

impl GameplayTuning {
    /// Per-actor configuration derived from these values
    pub fn actor_config(&self) -> ActorConfig {
        ActorConfig {
            move_speed: self.move_speed,
            rotation_speed: self.rotation_speed,
            kick_force: self.kick_force,
            pass_force: self.pass_force,
            control_radius: self.control_radius,
        }
    }

    /// Per-ball configuration derived from these values
    pub fn ball_config(&self) -> BallConfig {
        BallConfig {
            follow_sharpness: self.follow_sharpness,
            max_control_distance: self.max_control_distance,
            reattach_grace: self.reattach_grace,
            held_damping: self.held_damping,
            idle_damping: self.idle_damping,
            gravity: self.ball_gravity,
            mass: self.ball_mass,
            radius: BALL_RADIUS,
        }
    }

    /// A fresh switcher for one match
    pub fn switcher(&self) -> RosterSwitcher {
        RosterSwitcher::new(self.switch_cooldown, self.transfer_delay)
    }
}

/// Seconds from a config value. Negative values clamp to zero; values a
/// `Duration` cannot hold (infinite, overflowing) fall back to `default`.
pub fn duration_secs(name: &str, value: f32, default: f32) -> Duration {
    match Duration::try_from_secs_f32(value.max(0.0)) {
        Ok(duration) => duration,
        Err(e) => {
            warn!("{} = {} is not a usable duration ({}), using {}", name, value, e, default);
            Duration::try_from_secs_f32(default).unwrap_or_default()
        }
    }
}

pub fn load_gameplay_tuning_from_file(path: &str) -> Result<GameplayTuning, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
}

/// Load the global tuning file, falling back to defaults
pub fn load_global_tuning() -> GameplayTuning {
    match load_gameplay_tuning_from_file(GAMEPLAY_TUNING_FILE) {
        Ok(tuning) => tuning,
        Err(err) => {
            warn!("{}, using default tuning", err);
            GameplayTuning::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let tuning: GameplayTuning =
            serde_json::from_str(r#"{ "kick_force": 25.0, "transfer_delay": 0.75 }"#).unwrap();
        assert_eq!(tuning.kick_force, 25.0);
        assert_eq!(tuning.transfer_delay, 0.75);
        assert_eq!(tuning.pass_force, PASS_FORCE);
        assert_eq!(tuning.max_control_distance, MAX_CONTROL_DISTANCE);
    }

    #[test]
    fn test_derived_configs() {
        let tuning = GameplayTuning {
            control_radius: 0.8,
            follow_sharpness: 12.0,
            ..Default::default()
        };
        assert_eq!(tuning.actor_config().control_radius, 0.8);
        assert_eq!(tuning.ball_config().follow_sharpness, 12.0);
    }

    #[test]
    fn test_duration_secs_rejects_unrepresentable_values() {
        assert_eq!(duration_secs("grace", 0.25, 1.0), Duration::from_millis(250));
        assert_eq!(duration_secs("grace", -3.0, 1.0), Duration::ZERO);
        assert_eq!(duration_secs("grace", f32::INFINITY, 0.5), Duration::from_millis(500));

        // 1e39 does not fit in an f32 and parses as infinity
        let tuning: GameplayTuning =
            serde_json::from_str(r#"{ "switch_cooldown": 1e39 }"#).unwrap();
        assert!(tuning.switch_cooldown.is_infinite());
        let switcher = tuning.switcher();
        assert_eq!(
            switcher.switch_cooldown(),
            Duration::from_secs_f32(SWITCH_COOLDOWN)
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_gameplay_tuning_from_file("config/does_not_exist.json");
        assert!(result.is_err());
    }
}
