//! Control-stage systems: the caller-side policy around `RosterSwitcher`

use bevy::prelude::*;

use super::roster::Rosters;
use super::switcher::{RosterSwitcher, SwitchFired, SwitchRejection};
use crate::ball::{BallId, Possession};
use crate::clock::SimClock;
use crate::events::{EventBus, GameEvent};
use crate::input::PlayerInput;
use crate::physics::{PhysicsRequest, PhysicsRequests};
use crate::player::{Actor, ActorId, HumanControlled, Team};
use crate::settings::MatchSettings;

/// Notifications from the possession stage to the control stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlRequest {
    /// A ball was attached to `holder`
    BallPossessed {
        ball: BallId,
        holder: ActorId,
        team: Team,
    },
    /// A pass went out; switch to the receiver after the transfer delay
    SchedulePassSwitch {
        team: Team,
        ball: BallId,
        receiver: ActorId,
    },
    /// Actor removed from its roster
    ActorLeft { actor: ActorId },
}

#[derive(Resource, Default, Debug)]
pub struct ControlRequests {
    queue: Vec<ControlRequest>,
}

impl ControlRequests {
    pub fn push(&mut self, request: ControlRequest) {
        self.queue.push(request);
    }

    pub fn drain(&mut self) -> Vec<ControlRequest> {
        std::mem::take(&mut self.queue)
    }
}

fn emit_cancelled(bus: &mut EventBus, cancelled: &[super::pending::PendingSwitch]) {
    for p in cancelled {
        debug!("Pending switch to {} cancelled", p.receiver);
        bus.emit(GameEvent::SwitchCancelled {
            receiver: p.receiver,
        });
    }
}

/// Apply possession notifications to the switcher.
///
/// A human-team actor that takes the ball becomes the active actor at once,
/// unless a deferred switch is already waiting to activate it.
pub fn apply_control_requests(
    clock: Res<SimClock>,
    settings: Res<MatchSettings>,
    mut requests: ResMut<ControlRequests>,
    mut rosters: ResMut<Rosters>,
    mut switcher: ResMut<RosterSwitcher>,
    mut bus: ResMut<EventBus>,
) {
    for request in requests.drain() {
        match request {
            ControlRequest::BallPossessed { ball, holder, team } => {
                let change = switcher.on_ball_possessed(ball, holder, team);
                if !change.cancelled.is_empty() {
                    debug!("{} taken by {} ({:?})", ball, holder, team);
                }
                emit_cancelled(&mut bus, &change.cancelled);
                for previous in &change.retargeted {
                    debug!("{} intercepted by {}, switch moves from {}", ball, holder, previous.receiver);
                    bus.emit(GameEvent::SwitchCancelled {
                        receiver: previous.receiver,
                    });
                    bus.emit(GameEvent::SwitchScheduled {
                        receiver: holder,
                        deadline_ms: previous.deadline.as_millis() as u32,
                    });
                }

                if team != settings.human_team
                    || switcher.is_active(holder)
                    || switcher.has_pending_for(holder)
                {
                    continue;
                }
                let Some(roster) = rosters.get(team) else {
                    continue;
                };
                match switcher.set_active(roster, holder) {
                    Ok(switched) => {
                        info!("{} picked up {}, control follows", holder, ball);
                        bus.emit(GameEvent::ControlSwitch {
                            from: switched.from,
                            to: switched.to,
                        });
                    }
                    Err(reason) => bus.emit(GameEvent::SwitchRejected { reason }),
                }
            }
            ControlRequest::SchedulePassSwitch {
                team,
                ball,
                receiver,
            } => {
                let Some(roster) = rosters.get(team) else {
                    warn!("Pass to {} from unknown team {:?}", receiver, team);
                    continue;
                };
                let delay = switcher.transfer_delay();
                match switcher.switch_on_pass_completion(roster, ball, receiver, clock.now(), delay)
                {
                    Ok(pending) => bus.emit(GameEvent::SwitchScheduled {
                        receiver,
                        deadline_ms: pending.deadline.as_millis() as u32,
                    }),
                    Err(reason) => bus.emit(GameEvent::SwitchRejected { reason }),
                }
            }
            ControlRequest::ActorLeft { actor } => {
                rosters.remove_actor(actor);
                let cancelled = switcher.on_actor_left(actor);
                emit_cancelled(&mut bus, &cancelled);
            }
        }
    }
}

/// Human switch request. Refused while the human team holds a ball.
pub fn handle_switch_input(
    clock: Res<SimClock>,
    mut input: ResMut<PlayerInput>,
    settings: Res<MatchSettings>,
    rosters: Res<Rosters>,
    mut switcher: ResMut<RosterSwitcher>,
    balls: Query<&Possession>,
    mut bus: ResMut<EventBus>,
) {
    if !input.switch_pressed {
        return;
    }
    input.switch_pressed = false;

    let team = settings.human_team;
    let Some(roster) = rosters.get(team) else {
        bus.emit(GameEvent::SwitchRejected {
            reason: SwitchRejection::EmptyRoster,
        });
        return;
    };

    let team_has_ball = balls
        .iter()
        .filter_map(|p| p.holder())
        .any(|holder| roster.contains(holder));
    if team_has_ball {
        debug!("Switch refused: {:?} has the ball", team);
        bus.emit(GameEvent::SwitchRejected {
            reason: SwitchRejection::TeamHasBall,
        });
        return;
    }

    match switcher.switch_to_next(roster, clock.now()) {
        Ok(switched) => {
            info!("Control switched to {}", switched.to);
            bus.emit(GameEvent::ControlSwitch {
                from: switched.from,
                to: switched.to,
            });
        }
        Err(reason) => {
            debug!("Switch refused: {}", reason);
            bus.emit(GameEvent::SwitchRejected { reason });
        }
    }
}

/// Fire deferred switches whose deadline elapsed this step
pub fn poll_pending_switches(
    clock: Res<SimClock>,
    rosters: Res<Rosters>,
    mut switcher: ResMut<RosterSwitcher>,
    mut bus: ResMut<EventBus>,
) {
    for fired in switcher.poll(&rosters, clock.now()) {
        match fired {
            SwitchFired::Activated { switched, .. } => {
                info!("Pass completed, control to {}", switched.to);
                bus.emit(GameEvent::ControlSwitch {
                    from: switched.from,
                    to: switched.to,
                });
            }
            SwitchFired::Dropped(pending) => {
                bus.emit(GameEvent::SwitchCancelled {
                    receiver: pending.receiver,
                });
            }
        }
    }
}

/// Mirror the switcher's active actor onto the `HumanControlled` marker
pub fn sync_control_markers(
    mut commands: Commands,
    switcher: Res<RosterSwitcher>,
    actors: Query<(Entity, &Actor, Has<HumanControlled>)>,
    mut physics: ResMut<PhysicsRequests>,
) {
    for (entity, actor, marked) in &actors {
        let active = switcher.is_active(actor.id);
        if active == marked {
            continue;
        }
        if active {
            commands.entity(entity).insert(HumanControlled);
        } else {
            commands.entity(entity).remove::<HumanControlled>();
        }
        physics.push(PhysicsRequest::SetActiveMarker {
            actor: actor.id,
            active,
        });
    }
}

/// At most one actor carries the human-control marker
pub fn check_control_invariants(
    switcher: Res<RosterSwitcher>,
    marked: Query<&Actor, With<HumanControlled>>,
) {
    let count = marked.iter().count();
    debug_assert!(count <= 1, "{} actors marked active", count);
    if let Some(actor) = marked.iter().next() {
        debug_assert!(
            switcher.is_active(actor.id),
            "{} marked active but switcher has {:?}",
            actor.id,
            switcher.active()
        );
    }
}
