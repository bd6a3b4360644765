//! Possession-stage systems: turn input and overlaps into possession events,
//! then apply them through the possession controller

use bevy::prelude::*;

use crate::ball::components::*;
use crate::ball::possession::{
    FollowOutcome, PossessionRejection, ReleaseReason, follow, forced_release, kick, pass, reset,
    transfer, try_attach,
};
use crate::clock::SimClock;
use crate::control::{ControlRequest, ControlRequests, RosterSwitcher, Rosters, SwitchRejection};
use crate::events::{EventBus, GameEvent};
use crate::input::PlayerInput;
use crate::physics::PhysicsRequests;
use crate::player::{Actor, ActorConfig, ActorId, HoldAnchor, HumanControlled};
use crate::settings::MatchSettings;

/// Transient possession request, consumed within the step it is raised
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PossessionEvent {
    AttachRequested {
        ball: BallId,
        actor: ActorId,
    },
    KickRequested {
        actor: ActorId,
        direction: Vec3,
        force: f32,
    },
    PassRequested {
        actor: ActorId,
        target: ActorId,
    },
    ForcedRelease {
        ball: BallId,
        reason: ReleaseReason,
    },
    ResetRequested {
        ball: BallId,
    },
}

#[derive(Resource, Default, Debug)]
pub struct PossessionEvents {
    queue: Vec<PossessionEvent>,
}

impl PossessionEvents {
    pub fn push(&mut self, event: PossessionEvent) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> Vec<PossessionEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

fn tuple(v: Vec3) -> (f32, f32, f32) {
    (v.x, v.y, v.z)
}

/// Kick, pass and reset presses for the human-controlled actor
pub fn queue_actor_commands(
    mut input: ResMut<PlayerInput>,
    rosters: Res<Rosters>,
    human: Query<(&Actor, &Transform, &ActorConfig), With<HumanControlled>>,
    actors: Query<(&Actor, &Transform)>,
    balls: Query<&Possession, With<Ball>>,
    mut events: ResMut<PossessionEvents>,
    mut bus: ResMut<EventBus>,
) {
    if input.reset_pressed {
        input.reset_pressed = false;
        for possession in &balls {
            events.push(PossessionEvent::ResetRequested {
                ball: possession.ball(),
            });
        }
    }

    let kick_pressed = std::mem::take(&mut input.kick_pressed);
    let pass_pressed = std::mem::take(&mut input.pass_pressed);
    let explicit_target = input.pass_target.take();
    if !kick_pressed && !pass_pressed {
        return;
    }

    let Ok((actor, transform, config)) = human.single() else {
        return;
    };

    if kick_pressed {
        events.push(PossessionEvent::KickRequested {
            actor: actor.id,
            direction: transform.forward().as_vec3(),
            force: config.kick_force,
        });
    }

    if pass_pressed {
        let position_of = |id: ActorId| {
            actors
                .iter()
                .find(|(a, _)| a.id == id)
                .map(|(_, t)| t.translation)
        };
        let target = explicit_target.or_else(|| {
            rosters
                .get(actor.team)
                .and_then(|r| RosterSwitcher::nearest_teammate(r, actor.id, position_of))
        });

        match target {
            Some(target) => events.push(PossessionEvent::PassRequested {
                actor: actor.id,
                target,
            }),
            None => {
                debug!("{} has nobody to pass to", actor.id);
                bus.emit(GameEvent::SwitchRejected {
                    reason: SwitchRejection::NoTeammate,
                });
            }
        }
    }
}

/// Overlap query: every actor whose control volume touches a free ball asks
/// to attach. Requests are ordered by roster position (team, then index) so
/// the same contacts always produce the same winner.
pub fn queue_overlap_attachments(
    clock: Res<SimClock>,
    rosters: Res<Rosters>,
    balls: Query<(&Possession, &Transform, &BallConfig), With<Ball>>,
    actors: Query<(&Actor, &Transform, &HoldAnchor, &ActorConfig)>,
    mut events: ResMut<PossessionEvents>,
) {
    let now = clock.now();

    for (possession, ball_transform, config) in &balls {
        if possession.is_held() {
            continue;
        }
        let grace = config.reattach_grace();
        let ball_pos = ball_transform.translation;

        let mut candidates: Vec<ActorId> = actors
            .iter()
            .filter(|(actor, transform, anchor, actor_config)| {
                anchor.world(transform).distance(ball_pos) <= actor_config.control_radius
                    && !possession.in_grace(actor.id, now, grace)
            })
            .map(|(actor, ..)| actor.id)
            .collect();
        candidates.sort_by_key(|&id| rosters.order_key(id));

        for actor in candidates {
            events.push(PossessionEvent::AttachRequested {
                ball: possession.ball(),
                actor,
            });
        }
    }
}

/// Drain `PossessionEvents` in the order they were queued
pub fn process_possession_events(
    clock: Res<SimClock>,
    settings: Res<MatchSettings>,
    mut events: ResMut<PossessionEvents>,
    mut balls: Query<(&mut Possession, &Transform), With<Ball>>,
    actors: Query<(&Actor, &Transform, &HoldAnchor, &ActorConfig)>,
    mut physics: ResMut<PhysicsRequests>,
    mut control: ResMut<ControlRequests>,
    mut bus: ResMut<EventBus>,
) {
    let now = clock.now();
    let find_actor = |id: ActorId| actors.iter().find(|(a, ..)| a.id == id);

    for event in events.drain() {
        match event {
            PossessionEvent::AttachRequested { ball, actor } => {
                let Some((mut possession, ball_transform)) =
                    balls.iter_mut().find(|(p, _)| p.ball() == ball)
                else {
                    warn!("Attach to missing ball {}", ball);
                    continue;
                };
                let Some((a, transform, anchor, _)) = find_actor(actor) else {
                    bus.emit(GameEvent::AttachRejected {
                        ball,
                        actor,
                        reason: PossessionRejection::UnknownActor,
                    });
                    continue;
                };

                match try_attach(
                    &mut possession,
                    ball_transform.translation,
                    actor,
                    anchor.world(transform),
                    &mut physics,
                ) {
                    Ok(()) => {
                        info!("{} took {}", actor, ball);
                        bus.emit(GameEvent::Attach { ball, actor });
                        control.push(ControlRequest::BallPossessed {
                            ball,
                            holder: actor,
                            team: a.team,
                        });
                    }
                    Err(reason) => {
                        debug!("{} attach to {} refused: {}", actor, ball, reason);
                        bus.emit(GameEvent::AttachRejected {
                            ball,
                            actor,
                            reason,
                        });
                    }
                }
            }

            PossessionEvent::KickRequested {
                actor,
                direction,
                force,
            } => {
                let Some((mut possession, _)) =
                    balls.iter_mut().find(|(p, _)| p.holder() == Some(actor))
                else {
                    bus.emit(GameEvent::KickRejected {
                        actor,
                        reason: PossessionRejection::NotHeld,
                    });
                    continue;
                };
                let ball = possession.ball();

                match kick(&mut possession, direction, force, now, &mut physics) {
                    Ok(release) => {
                        info!("{} kicked {}", actor, ball);
                        bus.emit(GameEvent::Kick {
                            ball,
                            actor,
                            impulse: tuple(release.impulse),
                        });
                        bus.emit(GameEvent::Release {
                            ball,
                            actor,
                            reason: ReleaseReason::Kick,
                        });
                    }
                    Err(reason) => bus.emit(GameEvent::KickRejected { actor, reason }),
                }
            }

            PossessionEvent::PassRequested { actor, target } => {
                let (
                    Some((passer, _, _, passer_config)),
                    Some((receiver, target_transform, target_anchor, receiver_config)),
                ) = (find_actor(actor), find_actor(target))
                else {
                    bus.emit(GameEvent::KickRejected {
                        actor,
                        reason: PossessionRejection::UnknownActor,
                    });
                    continue;
                };
                let Some((mut possession, ball_transform)) =
                    balls.iter_mut().find(|(p, _)| p.holder() == Some(actor))
                else {
                    bus.emit(GameEvent::KickRejected {
                        actor,
                        reason: PossessionRejection::NotHeld,
                    });
                    continue;
                };
                let ball = possession.ball();
                let receiver_anchor = target_anchor.world(target_transform);

                // Teammate already on the ball: hand it over without a kick
                let within_reach = receiver_anchor.distance(ball_transform.translation)
                    <= receiver_config.control_radius;
                if within_reach && receiver.team == passer.team {
                    match transfer(
                        &mut possession,
                        ball_transform.translation,
                        actor,
                        target,
                        receiver_anchor,
                    ) {
                        Ok(()) => {
                            info!("{} handed {} to {}", actor, ball, target);
                            bus.emit(GameEvent::Handoff {
                                ball,
                                from: actor,
                                to: target,
                            });
                            control.push(ControlRequest::BallPossessed {
                                ball,
                                holder: target,
                                team: receiver.team,
                            });
                        }
                        Err(reason) => bus.emit(GameEvent::KickRejected { actor, reason }),
                    }
                    continue;
                }

                match pass(
                    &mut possession,
                    ball_transform.translation,
                    receiver_anchor,
                    passer_config.pass_force,
                    now,
                    &mut physics,
                ) {
                    Ok(release) => {
                        info!("{} passed {} to {}", actor, ball, target);
                        bus.emit(GameEvent::Pass {
                            ball,
                            from: actor,
                            to: target,
                            impulse: tuple(release.impulse),
                        });
                        bus.emit(GameEvent::Release {
                            ball,
                            actor,
                            reason: ReleaseReason::Pass,
                        });
                        control.push(ControlRequest::SchedulePassSwitch {
                            team: passer.team,
                            ball,
                            receiver: target,
                        });
                    }
                    Err(reason) => bus.emit(GameEvent::KickRejected { actor, reason }),
                }
            }

            PossessionEvent::ForcedRelease { ball, reason } => {
                let Some((mut possession, _)) = balls.iter_mut().find(|(p, _)| p.ball() == ball)
                else {
                    continue;
                };
                if let Some(actor) = forced_release(&mut possession, now, &mut physics)
                {
                    info!("{} released {} ({})", actor, ball, reason);
                    bus.emit(GameEvent::Release {
                        ball,
                        actor,
                        reason,
                    });
                }
            }

            PossessionEvent::ResetRequested { ball } => {
                let Some((mut possession, _)) = balls.iter_mut().find(|(p, _)| p.ball() == ball)
                else {
                    continue;
                };
                if let Some(actor) =
                    reset(&mut possession, settings.kickoff(), now, &mut physics)
                {
                    bus.emit(GameEvent::Release {
                        ball,
                        actor,
                        reason: ReleaseReason::Reset,
                    });
                }
                info!("{} reset to kickoff", ball);
                bus.emit(GameEvent::BallReset { ball });
            }
        }
    }
}

/// Drive held balls toward their holder; release any that fell too far behind
pub fn follow_holders(
    clock: Res<SimClock>,
    mut balls: Query<(&mut Possession, &Transform, &BallConfig), With<Ball>>,
    actors: Query<(&Actor, &Transform, &HoldAnchor)>,
    mut physics: ResMut<PhysicsRequests>,
    mut bus: ResMut<EventBus>,
) {
    let now = clock.now();

    for (mut possession, ball_transform, config) in &mut balls {
        let holder = match possession.state() {
            BallState::Free => continue,
            BallState::Held(holder) => holder,
        };
        let ball = possession.ball();

        let Some((_, transform, anchor)) = actors.iter().find(|(a, ..)| a.id == holder) else {
            error!("{} held by missing actor {}", ball, holder);
            debug_assert!(false, "{} held by missing actor {}", ball, holder);
            forced_release(&mut possession, now, &mut physics);
            bus.emit(GameEvent::Release {
                ball,
                actor: holder,
                reason: ReleaseReason::DanglingHolder,
            });
            continue;
        };

        let outcome = follow(
            &mut possession,
            ball_transform.translation,
            anchor.world(transform),
            config,
            now,
            &mut physics,
        );
        if let FollowOutcome::Released(actor) = outcome {
            info!("{} lost {}: too far from anchor", actor, ball);
            bus.emit(GameEvent::Release {
                ball,
                actor,
                reason: ReleaseReason::Distance,
            });
        }
    }
}
