//! Scripted input injection for scenarios

use bevy::prelude::*;
use std::collections::HashMap;

use super::parser::{FrameInput, parse_actor};
use crate::input::PlayerInput;
use crate::player::ActorId;

/// Scripted inputs for one scenario, keyed by frame
#[derive(Debug, Default)]
pub struct ScriptedInputs {
    frames: HashMap<u64, FrameInput>,
    /// Movement axis (x, z); holds between frames
    move_axis: Vec2,
}

impl ScriptedInputs {
    pub fn from_inputs(inputs: &[FrameInput]) -> Result<Self, String> {
        let mut frames = HashMap::new();
        for fi in inputs {
            if let Some(target) = &fi.pass_target {
                parse_actor(target)?;
            }
            if frames.insert(fi.frame, fi.clone()).is_some() {
                return Err(format!("Duplicate [[input]] for frame {}", fi.frame));
            }
        }

        Ok(Self {
            frames,
            move_axis: Vec2::ZERO,
        })
    }

    /// Input state for `frame`. Presses are only set on frames that list them.
    pub fn input_for(&mut self, frame: u64) -> PlayerInput {
        let mut input = PlayerInput::default();

        if let Some(fi) = self.frames.get(&frame) {
            if let Some(x) = fi.move_x {
                self.move_axis.x = x;
            }
            if let Some(z) = fi.move_z {
                self.move_axis.y = z;
            }
            input.kick_pressed = fi.kick;
            input.pass_pressed = fi.pass;
            input.switch_pressed = fi.switch;
            input.reset_pressed = fi.reset;
            input.pass_target = fi
                .pass_target
                .as_deref()
                .and_then(|t| parse_actor(t).ok());
        }

        input.set_move_axis(self.move_axis);
        input
    }
}

/// Actor named in a scenario
pub fn scenario_name(actor: ActorId) -> String {
    actor.to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presses_last_one_frame_and_axis_holds() {
        let inputs = vec![
            FrameInput {
                frame: 2,
                move_x: Some(1.0),
                kick: true,
                ..Default::default()
            },
            FrameInput {
                frame: 5,
                move_x: Some(0.0),
                ..Default::default()
            },
        ];
        let mut scripted = ScriptedInputs::from_inputs(&inputs).unwrap();

        assert_eq!(scripted.input_for(1).move_axis, Vec2::ZERO);
        let second = scripted.input_for(2);
        assert!(second.kick_pressed);
        assert_eq!(second.move_axis, Vec2::X);
        let third = scripted.input_for(3);
        assert!(!third.kick_pressed);
        assert_eq!(third.move_axis, Vec2::X);
        assert_eq!(scripted.input_for(5).move_axis, Vec2::ZERO);
    }

    #[test]
    fn test_duplicate_frames_rejected() {
        let inputs = vec![
            FrameInput {
                frame: 1,
                ..Default::default()
            },
            FrameInput {
                frame: 1,
                ..Default::default()
            },
        ];
        assert!(ScriptedInputs::from_inputs(&inputs).is_err());
    }
}
