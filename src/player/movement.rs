//! Actor locomotion

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::constants::*;
use crate::input::PlayerInput;
use crate::player::components::*;

/// Turn a raw 2D axis (x, z) into a planar direction with magnitude <= 1
pub fn movement_direction(axis: Vec2) -> Vec3 {
    if axis.length() < INPUT_DEADZONE {
        return Vec3::ZERO;
    }
    Vec3::new(axis.x, 0.0, axis.y).normalize_or_zero()
}

/// Runs in the physics stage.
/// The human-controlled actor follows the movement axis; everyone else stands
/// still (AI is not implemented).
pub fn move_actors(
    clock: Res<SimClock>,
    input: Res<PlayerInput>,
    mut actors: Query<(
        &mut Transform,
        &mut Velocity,
        &ActorConfig,
        Option<&HumanControlled>,
    )>,
) {
    let dt = clock.dt_secs();

    for (mut transform, mut velocity, config, human) in &mut actors {
        let direction = if human.is_some() {
            movement_direction(input.move_axis)
        } else {
            Vec3::ZERO
        };

        velocity.0 = direction * config.move_speed;
        if velocity.0 == Vec3::ZERO {
            continue;
        }

        transform.translation += velocity.0 * dt;

        // Rotate toward movement direction
        let target = Transform::IDENTITY.looking_to(direction, Vec3::Y).rotation;
        let t = (config.rotation_speed * dt).min(1.0);
        transform.rotation = transform.rotation.slerp(target, t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let dir = movement_direction(Vec2::new(1.0, 1.0));
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert_eq!(dir.y, 0.0);
    }

    #[test]
    fn test_deadzone() {
        assert_eq!(movement_direction(Vec2::new(0.05, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn test_axis_maps_to_ground_plane() {
        let dir = movement_direction(Vec2::new(0.0, -1.0));
        assert_eq!(dir, Vec3::new(0.0, 0.0, -1.0));
    }
}
