//! Input module - PlayerInput resource and capture_input system

use bevy::prelude::*;

use crate::constants::*;
use crate::player::ActorId;

/// Buffered input for the active actor.
/// Press flags accumulate until a step system consumes them.
#[derive(Resource, Default, Debug, Clone)]
pub struct PlayerInput {
    /// Movement axis (x = right, y = toward +Z), length <= 1
    pub move_axis: Vec2,
    pub kick_pressed: bool,   // E / South - shoot along facing
    pub pass_pressed: bool,   // Q / West - pass to a teammate
    pub switch_pressed: bool, // Tab / L shoulder - next roster member
    pub reset_pressed: bool,  // R / Select - ball back to kickoff
    /// Explicit pass receiver; nearest teammate when None
    pub pass_target: Option<ActorId>,
}

impl PlayerInput {
    /// Clamp the movement axis to unit length
    pub fn set_move_axis(&mut self, axis: Vec2) {
        self.move_axis = axis.clamp_length_max(1.0);
    }
}

/// Runs in Update to capture input state before it's cleared.
pub fn capture_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    gamepads: Query<&Gamepad>,
    mut input: ResMut<PlayerInput>,
) {
    // Movement (continuous - overwrite each frame)
    let mut axis = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft) {
        axis.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight) {
        axis.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp) {
        axis.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown) {
        axis.y += 1.0;
    }

    for gamepad in &gamepads {
        let stick = Vec2::new(
            gamepad.get(GamepadAxis::LeftStickX).unwrap_or(0.0),
            -gamepad.get(GamepadAxis::LeftStickY).unwrap_or(0.0),
        );
        if stick.length() > INPUT_DEADZONE {
            axis += stick;
        }
    }

    input.set_move_axis(axis);

    // Discrete presses - accumulate until consumed
    if keyboard.just_pressed(KeyCode::KeyE)
        || gamepads.iter().any(|gp| gp.just_pressed(GamepadButton::South))
    {
        input.kick_pressed = true;
    }
    if keyboard.just_pressed(KeyCode::KeyQ)
        || gamepads.iter().any(|gp| gp.just_pressed(GamepadButton::West))
    {
        input.pass_pressed = true;
    }
    if keyboard.just_pressed(KeyCode::Tab)
        || gamepads
            .iter()
            .any(|gp| gp.just_pressed(GamepadButton::LeftTrigger))
    {
        input.switch_pressed = true;
    }
    if keyboard.just_pressed(KeyCode::KeyR)
        || gamepads.iter().any(|gp| gp.just_pressed(GamepadButton::Select))
    {
        input.reset_pressed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_axis_is_clamped() {
        let mut input = PlayerInput::default();
        input.set_move_axis(Vec2::new(1.0, 1.0));
        assert!((input.move_axis.length() - 1.0).abs() < 1e-5);

        input.set_move_axis(Vec2::new(0.5, 0.0));
        assert_eq!(input.move_axis, Vec2::new(0.5, 0.0));
    }
}
