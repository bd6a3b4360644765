//! Match setup
//!
//! Entity bundles for actors and balls, the startup system that lays out both
//! rosters, and actor removal.

use bevy::prelude::*;

use crate::ball::{
    Ball, BallBody, BallId, Possession, PossessionEvent, PossessionEvents, ReleaseReason,
};
use crate::constants::*;
use crate::control::{ControlRequest, ControlRequests, Roster, RosterSwitcher, Rosters};
use crate::events::{EventBus, GameEvent};
use crate::player::{Actor, ActorId, ControlMarker, HoldAnchor, HumanControlled, Team, Velocity};
use crate::settings::MatchSettings;
use crate::tuning::GameplayTuning;

/// Components for one actor
pub fn actor_bundle(
    id: ActorId,
    team: Team,
    transform: Transform,
    tuning: &GameplayTuning,
) -> impl Bundle {
    (
        Actor { id, team },
        team,
        transform,
        Velocity::default(),
        tuning.actor_config(),
        HoldAnchor(HOLD_ANCHOR_OFFSET),
        ControlMarker::default(),
    )
}

/// Components for one ball
pub fn ball_bundle(id: BallId, position: Vec3, tuning: &GameplayTuning) -> impl Bundle {
    let config = tuning.ball_config();
    (
        Ball,
        Possession::new(id),
        BallBody::new(&config),
        config,
        Transform::from_translation(position),
    )
}

/// Kickoff formation: teams on opposite halves facing each other, members
/// spread across the pitch width
pub fn formation(team: Team, index: usize, roster_size: usize) -> Transform {
    let side = match team {
        Team::Home => -1.0,
        Team::Away => 1.0,
    };
    let spread = PITCH_WIDTH / (roster_size as f32 + 1.0);
    let z = -PITCH_WIDTH / 2.0 + spread * (index as f32 + 1.0);
    let x = side * (PITCH_LENGTH / 4.0);

    Transform::from_xyz(x, 0.0, z).looking_to(Vec3::new(-side, 0.0, 0.0), Vec3::Y)
}

/// Startup: spawn both rosters and the ball, activate the human team's first
/// member.
pub fn setup_match(
    mut commands: Commands,
    settings: Res<MatchSettings>,
    tuning: Res<GameplayTuning>,
    mut rosters: ResMut<Rosters>,
    mut switcher: ResMut<RosterSwitcher>,
    mut bus: ResMut<EventBus>,
) {
    let n = settings.roster_size;
    let mut next_id = 0;

    for team in [Team::Home, Team::Away] {
        let members: Vec<ActorId> = (0..n)
            .map(|_| {
                let id = ActorId(next_id);
                next_id += 1;
                id
            })
            .collect();

        match Roster::new(team, members.clone()) {
            Ok(roster) => rosters.insert(roster),
            Err(e) => {
                warn!("Skipping {:?} roster: {}", team, e);
                continue;
            }
        }

        for (i, &id) in members.iter().enumerate() {
            let mut entity = commands.spawn(actor_bundle(id, team, formation(team, i, n), &tuning));
            if team == settings.human_team && i == 0 {
                entity.insert((HumanControlled, ControlMarker(true)));
            }
        }
    }

    if let Some(roster) = rosters.get(settings.human_team)
        && let Some(&first) = roster.members().first()
    {
        match switcher.set_active(roster, first) {
            Ok(_) => info!("{} starts under human control", first),
            Err(e) => warn!("Could not activate {}: {}", first, e),
        }
    }

    commands.spawn(ball_bundle(BallId(0), settings.kickoff(), &tuning));

    info!(
        "Kickoff: {} v {}, {:.0}s",
        n, n, settings.match_duration
    );
    bus.emit(GameEvent::MatchStart {
        home: n,
        away: n,
        duration: settings.match_duration,
    });
}

/// Take an actor out of play: any ball it holds is released and it leaves its
/// roster at the next step. Returns false if no such actor exists.
pub fn remove_actor(world: &mut World, actor: ActorId) -> bool {
    let mut actors = world.query::<(Entity, &Actor)>();
    let Some(entity) = actors
        .iter(world)
        .find(|(_, a)| a.id == actor)
        .map(|(e, _)| e)
    else {
        return false;
    };

    let mut balls = world.query::<&Possession>();
    let held: Vec<BallId> = balls
        .iter(world)
        .filter(|p| p.holder() == Some(actor))
        .map(|p| p.ball())
        .collect();

    let mut events = world.resource_mut::<PossessionEvents>();
    for ball in held {
        events.push(PossessionEvent::ForcedRelease {
            ball,
            reason: ReleaseReason::DanglingHolder,
        });
    }
    world
        .resource_mut::<ControlRequests>()
        .push(ControlRequest::ActorLeft { actor });
    world.despawn(entity);
    true
}
