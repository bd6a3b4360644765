//! Physics collaborator
//!
//! Gameplay code never writes rigid-body state directly. It pushes
//! `PhysicsRequest`s into the `PhysicsRequests` outbox, and the physics stage
//! applies them at the start of the next step before integrating.

use bevy::prelude::*;

use crate::ball::{Ball, BallBody, BallConfig, BallId, Possession};
use crate::clock::SimClock;
use crate::constants::*;
use crate::player::{Actor, ActorId, ControlMarker};

/// Outbound request from gameplay to physics
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsRequest {
    /// Instantaneous impulse (velocity += impulse / mass)
    ApplyImpulse { ball: BallId, impulse: Vec3 },
    /// Held (no gravity, high damping) or free
    SetControlled { ball: BallId, controlled: bool },
    /// Follow velocity for a held ball
    DriveToward { ball: BallId, velocity: Vec3 },
    /// Move the ball and stop it
    Teleport { ball: BallId, position: Vec3 },
    /// Active-actor visual marker
    SetActiveMarker { actor: ActorId, active: bool },
}

/// Requests queued this step
#[derive(Resource, Default, Debug)]
pub struct PhysicsRequests {
    queue: Vec<PhysicsRequest>,
}

impl PhysicsRequests {
    pub fn push(&mut self, request: PhysicsRequest) {
        self.queue.push(request);
    }

    pub fn drain(&mut self) -> Vec<PhysicsRequest> {
        std::mem::take(&mut self.queue)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhysicsRequest> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Apply a ball request to its body. Teleport and marker requests need more
/// than the body and are handled by `apply_physics_requests`.
pub fn apply_to_body(body: &mut BallBody, request: &PhysicsRequest, config: &BallConfig) {
    match request {
        PhysicsRequest::ApplyImpulse { impulse, .. } => {
            body.velocity += *impulse / body.mass.max(f32::EPSILON);
        }
        PhysicsRequest::SetControlled { controlled, .. } => {
            body.set_controlled(*controlled, config);
        }
        PhysicsRequest::DriveToward { velocity, .. } => {
            body.velocity = *velocity;
        }
        PhysicsRequest::Teleport { .. } => {
            body.velocity = Vec3::ZERO;
        }
        PhysicsRequest::SetActiveMarker { .. } => {}
    }
}

/// Apply a ball request, including teleports
pub fn apply_ball_request(
    transform: &mut Transform,
    body: &mut BallBody,
    config: &BallConfig,
    request: &PhysicsRequest,
) {
    if let PhysicsRequest::Teleport { position, .. } = request {
        transform.translation = *position;
    }
    apply_to_body(body, request, config);
}

/// Drain the outbox, in the order requests were pushed
pub fn apply_physics_requests(
    mut requests: ResMut<PhysicsRequests>,
    mut balls: Query<(&Possession, &mut Transform, &mut BallBody, &BallConfig), With<Ball>>,
    mut markers: Query<(&Actor, &mut ControlMarker)>,
) {
    for request in requests.drain() {
        match request {
            PhysicsRequest::SetActiveMarker { actor, active } => {
                for (a, mut marker) in &mut markers {
                    if a.id == actor {
                        marker.0 = active;
                    }
                }
            }
            PhysicsRequest::ApplyImpulse { ball, .. }
            | PhysicsRequest::SetControlled { ball, .. }
            | PhysicsRequest::DriveToward { ball, .. }
            | PhysicsRequest::Teleport { ball, .. } => {
                let Some((_, mut transform, mut body, config)) =
                    balls.iter_mut().find(|(p, ..)| p.ball() == ball)
                else {
                    warn!("Physics request for missing ball {}", ball);
                    continue;
                };
                apply_ball_request(&mut transform, &mut body, config, &request);
            }
        }
    }
}

/// Advance one ball body by `dt`
pub fn step_body(body: &mut BallBody, position: &mut Vec3, config: &BallConfig, dt: f32) {
    if body.use_gravity {
        body.velocity.y -= config.gravity * dt;
    }
    body.velocity *= 1.0 / (1.0 + body.damping * dt);
    *position += body.velocity * dt;

    // Ground
    if position.y < config.radius {
        position.y = config.radius;
        if body.velocity.y < 0.0 {
            body.velocity.y = -body.velocity.y * BALL_BOUNCE;
            if body.velocity.y < BALL_REST_SPEED {
                body.velocity.y = 0.0;
            }
        }
    }

    // Pitch boundary; inside the goal mouth the back of the net stops the ball
    let in_mouth = position.z.abs() < GOAL_WIDTH / 2.0 - config.radius
        && position.y < GOAL_HEIGHT - config.radius;
    let half_length = if in_mouth {
        PITCH_LENGTH / 2.0 + GOAL_DEPTH - config.radius
    } else {
        PITCH_LENGTH / 2.0 - config.radius
    };
    if position.x.abs() > half_length {
        position.x = position.x.clamp(-half_length, half_length);
        body.velocity.x = -body.velocity.x * BALL_BOUNCE;
    }
    let half_width = PITCH_WIDTH / 2.0 - config.radius;
    if position.z.abs() > half_width {
        position.z = position.z.clamp(-half_width, half_width);
        body.velocity.z = -body.velocity.z * BALL_BOUNCE;
    }
}

/// Integrate ball bodies
pub fn integrate_balls(
    clock: Res<SimClock>,
    mut balls: Query<(&mut Transform, &mut BallBody, &BallConfig), With<Ball>>,
) {
    let dt = clock.dt_secs();
    for (mut transform, mut body, config) in &mut balls {
        step_body(&mut body, &mut transform.translation, config, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BallConfig {
        BallConfig {
            follow_sharpness: FOLLOW_SHARPNESS,
            max_control_distance: MAX_CONTROL_DISTANCE,
            reattach_grace: REATTACH_GRACE,
            held_damping: HELD_DAMPING,
            idle_damping: IDLE_DAMPING,
            gravity: BALL_GRAVITY,
            mass: 2.0,
            radius: BALL_RADIUS,
        }
    }

    #[test]
    fn test_impulse_divides_by_mass() {
        let cfg = config();
        let mut body = BallBody::new(&cfg);
        apply_to_body(
            &mut body,
            &PhysicsRequest::ApplyImpulse {
                ball: BallId(0),
                impulse: Vec3::new(10.0, 0.0, 0.0),
            },
            &cfg,
        );
        assert_eq!(body.velocity, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_controlled_toggle() {
        let cfg = config();
        let mut body = BallBody::new(&cfg);
        let ball = BallId(0);

        apply_to_body(&mut body, &PhysicsRequest::SetControlled { ball, controlled: true }, &cfg);
        assert!(!body.use_gravity);
        assert_eq!(body.damping, HELD_DAMPING);

        apply_to_body(&mut body, &PhysicsRequest::SetControlled { ball, controlled: false }, &cfg);
        assert!(body.use_gravity);
        assert_eq!(body.damping, IDLE_DAMPING);
    }

    #[test]
    fn test_resting_ball_stays_on_ground() {
        let cfg = config();
        let mut body = BallBody::new(&cfg);
        let mut pos = Vec3::new(0.0, BALL_RADIUS, 0.0);
        for _ in 0..64 {
            step_body(&mut body, &mut pos, &cfg, 1.0 / 64.0);
        }
        assert_eq!(pos.y, BALL_RADIUS);
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_held_ball_ignores_gravity() {
        let cfg = config();
        let mut body = BallBody::new(&cfg);
        body.set_controlled(true, &cfg);
        let mut pos = Vec3::new(0.0, 1.0, 0.0);
        step_body(&mut body, &mut pos, &cfg, 1.0 / 64.0);
        assert_eq!(pos.y, 1.0);
    }

    #[test]
    fn test_ball_stays_on_pitch() {
        let cfg = config();
        let mut body = BallBody::new(&cfg);
        body.velocity = Vec3::new(5000.0, 0.0, 0.0);
        // Wide of the posts
        let mut pos = Vec3::new(0.0, BALL_RADIUS, GOAL_WIDTH);
        step_body(&mut body, &mut pos, &cfg, 1.0 / 64.0);
        assert!(pos.x <= PITCH_LENGTH / 2.0);
        assert!(body.velocity.x < 0.0);
    }

    #[test]
    fn test_goal_mouth_lets_ball_into_net() {
        let cfg = config();
        let mut body = BallBody::new(&cfg);
        body.velocity = Vec3::new(-5000.0, 0.0, 0.0);
        let mut pos = Vec3::new(0.0, BALL_RADIUS, 0.0);
        step_body(&mut body, &mut pos, &cfg, 1.0 / 64.0);
        assert!(pos.x < -PITCH_LENGTH / 2.0);
        assert!(pos.x >= -(PITCH_LENGTH / 2.0 + GOAL_DEPTH));
    }
}
