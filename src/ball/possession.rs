//! Possession controller - the single authority over `Possession::holder`
//!
//! Every transition goes through one of these functions. Each one mutates the
//! `Possession` and pushes the physics requests that go with it; none of them
//! touch the ECS directly, so they are easy to drive from tests.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ball::components::{BallConfig, Possession};
use crate::physics::{PhysicsRequest, PhysicsRequests};
use crate::player::ActorId;

/// Why a possession request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PossessionRejection {
    /// Ball already has a holder
    AlreadyHeld { holder: ActorId },
    /// Kick/pass on a free ball
    NotHeld,
    /// Kick/pass from someone other than the holder
    NotHolder { holder: ActorId },
    /// Request names an actor that does not exist
    UnknownActor,
}

impl std::fmt::Display for PossessionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PossessionRejection::AlreadyHeld { holder } => write!(f, "already held by {}", holder),
            PossessionRejection::NotHeld => write!(f, "ball is free"),
            PossessionRejection::NotHolder { holder } => write!(f, "held by {}", holder),
            PossessionRejection::UnknownActor => write!(f, "unknown actor"),
        }
    }
}

/// Why possession ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseReason {
    Kick,
    Pass,
    /// Ball drifted further than `max_control_distance` from its target
    Distance,
    Reset,
    /// Holder no longer exists
    DanglingHolder,
}

impl ReleaseReason {
    pub fn code(self) -> char {
        match self {
            ReleaseReason::Kick => 'K',
            ReleaseReason::Pass => 'P',
            ReleaseReason::Distance => 'D',
            ReleaseReason::Reset => 'R',
            ReleaseReason::DanglingHolder => 'X',
        }
    }
}

impl std::fmt::Display for ReleaseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReleaseReason::Kick => "kick",
            ReleaseReason::Pass => "pass",
            ReleaseReason::Distance => "distance",
            ReleaseReason::Reset => "reset",
            ReleaseReason::DanglingHolder => "dangling holder",
        };
        f.write_str(s)
    }
}

/// Result of one follow step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowOutcome {
    /// Nobody holds the ball
    Free,
    /// Ball is being driven toward its target
    Driving { velocity: Vec3 },
    /// Ball got too far away and was released
    Released(ActorId),
}

/// A kick or pass that went through
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub actor: ActorId,
    pub impulse: Vec3,
}

/// Attach a free ball to `actor`.
///
/// Fails without touching anything if the ball is already held, so when two
/// actors reach the ball in the same step the first request processed wins.
pub fn try_attach(
    possession: &mut Possession,
    ball_pos: Vec3,
    actor: ActorId,
    anchor: Vec3,
    out: &mut PhysicsRequests,
) -> Result<(), PossessionRejection> {
    if let Some(holder) = possession.holder {
        return Err(PossessionRejection::AlreadyHeld { holder });
    }

    possession.holder = Some(actor);
    possession.control_offset = ball_pos - anchor;
    out.push(PhysicsRequest::SetControlled {
        ball: possession.ball,
        controlled: true,
    });
    Ok(())
}

/// Drive a held ball toward `anchor + control_offset`
pub fn follow(
    possession: &mut Possession,
    ball_pos: Vec3,
    anchor: Vec3,
    config: &BallConfig,
    now: Duration,
    out: &mut PhysicsRequests,
) -> FollowOutcome {
    let Some(holder) = possession.holder else {
        return FollowOutcome::Free;
    };

    let target = possession.target(anchor);
    if ball_pos.distance(target) > config.max_control_distance {
        forced_release(possession, now, out);
        return FollowOutcome::Released(holder);
    }

    let velocity = (target - ball_pos) * config.follow_sharpness;
    out.push(PhysicsRequest::DriveToward {
        ball: possession.ball,
        velocity,
    });
    FollowOutcome::Driving { velocity }
}

/// Check that `actor` is the one holding the ball
pub fn ensure_holder(possession: &Possession, actor: ActorId) -> Result<(), PossessionRejection> {
    match possession.holder {
        None => Err(PossessionRejection::NotHeld),
        Some(holder) if holder != actor => Err(PossessionRejection::NotHolder { holder }),
        Some(_) => Ok(()),
    }
}

/// Hand a held ball from `from` straight to `to`. The holder changes without
/// the ball ever being free, and the offset is measured from the new anchor.
pub fn transfer(
    possession: &mut Possession,
    ball_pos: Vec3,
    from: ActorId,
    to: ActorId,
    anchor: Vec3,
) -> Result<(), PossessionRejection> {
    ensure_holder(possession, from)?;
    if from == to {
        return Err(PossessionRejection::AlreadyHeld { holder: from });
    }

    possession.holder = Some(to);
    possession.control_offset = ball_pos - anchor;
    Ok(())
}

/// Release the ball with an impulse of `force` along `direction`.
///
/// A zero direction still releases the ball; the impulse is then zero.
pub fn kick(
    possession: &mut Possession,
    direction: Vec3,
    force: f32,
    now: Duration,
    out: &mut PhysicsRequests,
) -> Result<Release, PossessionRejection> {
    let actor = forced_release(possession, now, out).ok_or(PossessionRejection::NotHeld)?;

    let impulse = direction.normalize_or_zero() * force;
    out.push(PhysicsRequest::ApplyImpulse {
        ball: possession.ball,
        impulse,
    });
    Ok(Release { actor, impulse })
}

/// Kick toward a teammate's anchor
pub fn pass(
    possession: &mut Possession,
    ball_pos: Vec3,
    target_anchor: Vec3,
    force: f32,
    now: Duration,
    out: &mut PhysicsRequests,
) -> Result<Release, PossessionRejection> {
    kick(possession, target_anchor - ball_pos, force, now, out)
}

/// Clear the holder and hand the ball back to free physics.
///
/// Returns the previous holder; a free ball is left alone and yields `None`.
pub fn forced_release(
    possession: &mut Possession,
    now: Duration,
    out: &mut PhysicsRequests,
) -> Option<ActorId> {
    let holder = possession.holder.take()?;
    possession.control_offset = Vec3::ZERO;
    possession.last_release = Some((holder, now));
    out.push(PhysicsRequest::SetControlled {
        ball: possession.ball,
        controlled: false,
    });
    Some(holder)
}

/// Release, then put the ball at rest on `spot`
pub fn reset(
    possession: &mut Possession,
    spot: Vec3,
    now: Duration,
    out: &mut PhysicsRequests,
) -> Option<ActorId> {
    let holder = forced_release(possession, now, out);
    possession.last_release = None;
    out.push(PhysicsRequest::Teleport {
        ball: possession.ball,
        position: spot,
    });
    holder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ball::components::{BallBody, BallId};
    use crate::physics::apply_to_body;

    fn config() -> BallConfig {
        BallConfig {
            follow_sharpness: 15.0,
            max_control_distance: 0.5,
            reattach_grace: 0.3,
            held_damping: 10.0,
            idle_damping: 0.5,
            gravity: 9.81,
            mass: 1.0,
            radius: 0.11,
        }
    }

    const P0: ActorId = ActorId(0);
    const P1: ActorId = ActorId(1);

    #[test]
    fn test_attach_then_kick() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();

        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();
        assert_eq!(p.holder(), Some(P0));

        let release = kick(&mut p, Vec3::X, 10.0, Duration::ZERO, &mut out).unwrap();
        assert_eq!(p.holder(), None);
        assert_eq!(release.actor, P0);
        assert_eq!(release.impulse, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(
            out.drain().last(),
            Some(&PhysicsRequest::ApplyImpulse {
                ball: BallId(0),
                impulse: Vec3::new(10.0, 0.0, 0.0),
            })
        );
    }

    #[test]
    fn test_kick_direction_is_normalized() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();

        let release = kick(&mut p, Vec3::new(0.0, 0.0, -4.0), 20.0, Duration::ZERO, &mut out)
            .unwrap();
        assert!((release.impulse - Vec3::new(0.0, 0.0, -20.0)).length() < 1e-5);
    }

    #[test]
    fn test_second_attach_loses() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();

        assert!(try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).is_ok());
        assert_eq!(
            try_attach(&mut p, Vec3::ZERO, P1, Vec3::ZERO, &mut out),
            Err(PossessionRejection::AlreadyHeld { holder: P0 })
        );
        assert_eq!(p.holder(), Some(P0));
        // Only the winner produced a controlled toggle
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_kick_free_ball_rejected() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        assert_eq!(
            kick(&mut p, Vec3::X, 10.0, Duration::ZERO, &mut out),
            Err(PossessionRejection::NotHeld)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();

        assert_eq!(forced_release(&mut p, Duration::ZERO, &mut out), Some(P0));
        let before = out.len();
        assert_eq!(forced_release(&mut p, Duration::ZERO, &mut out), None);
        assert_eq!(out.len(), before);
    }

    #[test]
    fn test_release_symmetry() {
        let cfg = config();

        let mut kicked = BallBody::new(&cfg);
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();
        kick(&mut p, Vec3::ZERO, 0.0, Duration::ZERO, &mut out).unwrap();
        for req in out.drain() {
            apply_to_body(&mut kicked, &req, &cfg);
        }

        let mut dropped = BallBody::new(&cfg);
        let mut p = Possession::new(BallId(0));
        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();
        forced_release(&mut p, Duration::ZERO, &mut out);
        for req in out.drain() {
            apply_to_body(&mut dropped, &req, &cfg);
        }

        assert_eq!(kicked, dropped);
        assert!(kicked.use_gravity);
        assert_eq!(kicked.damping, cfg.idle_damping);
    }

    #[test]
    fn test_follow_drives_toward_target() {
        let cfg = config();
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        try_attach(&mut p, Vec3::new(0.1, 0.0, 0.0), P0, Vec3::ZERO, &mut out).unwrap();

        // Anchor moved 0.2 along x; target is 0.3, ball still at 0.1
        let outcome = follow(
            &mut p,
            Vec3::new(0.1, 0.0, 0.0),
            Vec3::new(0.2, 0.0, 0.0),
            &cfg,
            Duration::ZERO,
            &mut out,
        );
        match outcome {
            FollowOutcome::Driving { velocity } => {
                assert!((velocity.x - 3.0).abs() < 1e-4);
            }
            other => panic!("expected Driving, got {:?}", other),
        }
    }

    #[test]
    fn test_follow_distance_bound_releases() {
        let cfg = config();
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();

        let outcome = follow(
            &mut p,
            Vec3::ZERO,
            Vec3::new(0.6, 0.0, 0.0),
            &cfg,
            Duration::ZERO,
            &mut out,
        );
        assert_eq!(outcome, FollowOutcome::Released(P0));
        assert!(!p.is_held());
    }

    #[test]
    fn test_pass_aims_at_target() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();

        let release = pass(
            &mut p,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 5.0),
            10.0,
            Duration::ZERO,
            &mut out,
        )
        .unwrap();
        assert!((release.impulse - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_grace_after_release() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();
        kick(&mut p, Vec3::X, 1.0, Duration::from_millis(100), &mut out).unwrap();

        let grace = Duration::from_millis(300);
        assert!(p.in_grace(P0, Duration::from_millis(200), grace));
        assert!(!p.in_grace(P1, Duration::from_millis(200), grace));
        assert!(!p.in_grace(P0, Duration::from_millis(400), grace));
    }

    #[test]
    fn test_transfer_never_frees_the_ball() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();
        out.drain();

        let ball_pos = Vec3::new(1.0, 0.0, 0.0);
        transfer(&mut p, ball_pos, P0, P1, Vec3::new(1.2, 0.0, 0.0)).unwrap();
        assert_eq!(p.holder(), Some(P1));
        assert!(out.is_empty());
        // New holder's follow target is where the ball already is
        assert_eq!(p.target(Vec3::new(1.2, 0.0, 0.0)), ball_pos);
        assert!(!p.in_grace(P0, Duration::ZERO, Duration::from_secs(1)));
    }

    #[test]
    fn test_transfer_requires_the_holder() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        assert_eq!(
            transfer(&mut p, Vec3::ZERO, P0, P1, Vec3::ZERO),
            Err(PossessionRejection::NotHeld)
        );

        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();
        assert_eq!(
            transfer(&mut p, Vec3::ZERO, P1, P0, Vec3::ZERO),
            Err(PossessionRejection::NotHolder { holder: P0 })
        );
        assert_eq!(
            transfer(&mut p, Vec3::ZERO, P0, P0, Vec3::ZERO),
            Err(PossessionRejection::AlreadyHeld { holder: P0 })
        );
        assert_eq!(p.holder(), Some(P0));
    }

    #[test]
    fn test_ensure_holder() {
        let mut p = Possession::new(BallId(0));
        let mut out = PhysicsRequests::default();
        assert_eq!(ensure_holder(&p, P0), Err(PossessionRejection::NotHeld));
        try_attach(&mut p, Vec3::ZERO, P0, Vec3::ZERO, &mut out).unwrap();
        assert_eq!(ensure_holder(&p, P0), Ok(()));
        assert_eq!(
            ensure_holder(&p, P1),
            Err(PossessionRejection::NotHolder { holder: P0 })
        );
    }
}
