//! Tunable constants for kickabout
//!
//! Defaults for every gameplay value. Most of them can be overridden at startup
//! through config/gameplay_tuning.json (see `tuning`).

use bevy::prelude::*;

// =============================================================================
// PITCH
// =============================================================================

pub const PITCH_LENGTH: f32 = 40.0; // Along X
pub const PITCH_WIDTH: f32 = 26.0; // Along Z
pub const PITCH_COLOR: Color = Color::srgb(0.18, 0.42, 0.2);
pub const GOAL_WIDTH: f32 = 7.32; // Between the posts, along Z
pub const GOAL_HEIGHT: f32 = 2.44; // Underside of the crossbar
pub const GOAL_DEPTH: f32 = 1.5; // Goal line to the back of the net
pub const GOAL_COLOR: Color = Color::srgb(0.95, 0.95, 0.95);
pub const BACKGROUND_COLOR: Color = Color::srgb(0.08, 0.1, 0.12);

// =============================================================================
// ACTOR LOCOMOTION
// =============================================================================

pub const MOVE_SPEED: f32 = 5.0; // Metres per second at full stick
pub const ROTATION_SPEED: f32 = 10.0; // Slerp rate toward movement direction
pub const INPUT_DEADZONE: f32 = 0.1; // Below this the movement axis counts as idle
pub const ACTOR_RADIUS: f32 = 0.35;
pub const ACTOR_HEIGHT: f32 = 1.8;

// =============================================================================
// BALL
// =============================================================================

pub const BALL_RADIUS: f32 = 0.11;
pub const BALL_MASS: f32 = 1.0;
pub const BALL_GRAVITY: f32 = 9.81;
pub const BALL_BOUNCE: f32 = 0.5; // Vertical velocity retained on ground contact
pub const BALL_REST_SPEED: f32 = 0.2; // Bounces slower than this stop
pub const HELD_DAMPING: f32 = 10.0; // Linear damping while controlled
pub const IDLE_DAMPING: f32 = 0.5; // Linear damping while free

// =============================================================================
// BALL CONTROL
// =============================================================================

pub const FOLLOW_SHARPNESS: f32 = 15.0; // Closing rate toward the follow target
pub const MAX_CONTROL_DISTANCE: f32 = 0.5; // Separation that forces a release
pub const CONTROL_RADIUS: f32 = 0.5; // Anchor-to-ball distance that counts as contact
pub const REATTACH_GRACE: f32 = 0.3; // Seconds before a releasing actor may re-attach
/// Hold anchor in actor-local space: ball height, slightly in front (-Z is forward)
pub const HOLD_ANCHOR_OFFSET: Vec3 = Vec3::new(0.0, BALL_RADIUS, -0.6);

// =============================================================================
// KICKING
// =============================================================================

pub const KICK_FORCE: f32 = 20.0; // Shot impulse
pub const PASS_FORCE: f32 = 10.0; // Pass impulse

// =============================================================================
// CONTROL SWITCHING
// =============================================================================

pub const SWITCH_COOLDOWN: f32 = 0.25; // Seconds between manual switches
pub const TRANSFER_DELAY: f32 = 0.5; // Seconds between a pass and the receiver taking control

// =============================================================================
// MATCH
// =============================================================================

pub const STEP_HZ: f64 = 64.0; // Fixed simulation rate
pub const MATCH_DURATION: f32 = 420.0; // 7 minutes
pub const ROSTER_SIZE: usize = 3;
pub const KICKOFF_SPOT: Vec3 = Vec3::new(0.0, BALL_RADIUS, 0.0);
