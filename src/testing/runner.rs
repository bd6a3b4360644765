//! Scenario execution engine
//!
//! Builds a headless app, spawns the scenario's actors and balls, then runs
//! `FixedUpdate` once per frame with scripted input. Events are drained from
//! the bus after every frame and matched against the expected sequence.

use bevy::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ball::{Ball, BallBody, BallId, Possession, try_attach};
use crate::clock::SimClock;
use crate::constants::HOLD_ANCHOR_OFFSET;
use crate::control::{Roster, RosterSwitcher, Rosters};
use crate::events::{EventBus, GameEvent};
use crate::input::PlayerInput;
use crate::physics::PhysicsRequests;
use crate::player::{Actor, ActorId, ControlMarker, HoldAnchor, HumanControlled, Team};
use crate::scoring::Score;
use crate::simulation::{HeadlessAppBuilder, actor_bundle, ball_bundle, remove_actor};
use crate::tuning::GameplayTuning;

use super::assertions::{
    ActorState, AssertionError, BallState, CapturedEvent, WorldState, check_absent,
    check_sequence, check_state,
};
use super::input::{ScriptedInputs, scenario_name};
use super::parser::{EntityDef, TestDefinition, TestSetup, parse_actor, parse_team};

/// Frames to run when a scenario names none
const DEFAULT_FRAMES: u64 = 64;

/// Result of running a scenario
#[derive(Debug)]
pub enum TestResult {
    Pass { frames: u64 },
    Fail { error: AssertionError },
    Error { message: String },
}

/// Run a single scenario and return the result
pub fn run_test(test: &TestDefinition) -> TestResult {
    match run_scenario(test) {
        Ok(Ok(frames)) => TestResult::Pass { frames },
        Ok(Err(error)) => TestResult::Fail { error },
        Err(message) => TestResult::Error { message },
    }
}

/// Outer error: the scenario itself is broken. Inner error: an assertion failed.
fn run_scenario(test: &TestDefinition) -> Result<Result<u64, AssertionError>, String> {
    let tuning = scenario_tuning(&test.setup);
    let mut scripted = ScriptedInputs::from_inputs(&test.input)?;

    let mut app = HeadlessAppBuilder::new()
        .with_tuning(tuning.clone())
        .with_minimal_threads()
        .build();
    spawn_scenario(app.world_mut(), &test.setup, &tuning)?;

    let teleports = test
        .teleport
        .iter()
        .map(|t| Ok((t.frame, parse_actor(&t.actor)?, Vec2::new(t.x, t.z))))
        .collect::<Result<Vec<_>, String>>()?;
    let removals = test
        .remove
        .iter()
        .map(|r| Ok((r.frame, parse_actor(&r.actor)?)))
        .collect::<Result<Vec<_>, String>>()?;

    let last_frame = match test.last_frame() {
        0 => DEFAULT_FRAMES,
        n => n,
    };
    let mut captured = Vec::new();

    for frame in 1..=last_frame {
        for &(_, actor, position) in teleports.iter().filter(|(f, _, _)| *f == frame) {
            if !teleport_actor(app.world_mut(), actor, position) {
                return Err(format!("Teleport at frame {}: no actor {}", frame, actor));
            }
        }
        for &(_, actor) in removals.iter().filter(|(f, _)| *f == frame) {
            if !remove_actor(app.world_mut(), actor) {
                return Err(format!("Remove at frame {}: no actor {}", frame, actor));
            }
        }

        *app.world_mut().resource_mut::<PlayerInput>() = scripted.input_for(frame);
        app.world_mut().run_schedule(FixedUpdate);

        captured.extend(
            app.world_mut()
                .resource_mut::<EventBus>()
                .drain()
                .iter()
                .map(|e| CapturedEvent::from_game_event(frame, &e.event)),
        );

        let due: Vec<_> = test
            .expect
            .state
            .iter()
            .filter(|s| s.after_frame == frame)
            .collect();
        if !due.is_empty() {
            let state = extract_world_state(app.world_mut());
            for assertion in due {
                if let Err(e) = check_state(assertion, &state) {
                    return Ok(Err(e));
                }
            }
        }
    }

    if let Err(e) = check_sequence(&test.expect.sequence, &captured) {
        return Ok(Err(e));
    }
    if let Err(e) = check_absent(&test.expect.absent, &captured) {
        return Ok(Err(e));
    }

    Ok(Ok(last_frame))
}

/// Default tuning with the scenario's overrides. The config file is not read
/// so scenarios stay independent of local tweaks.
fn scenario_tuning(setup: &TestSetup) -> GameplayTuning {
    let mut tuning = GameplayTuning::default();
    if let Some(v) = setup.switch_cooldown {
        tuning.switch_cooldown = v;
    }
    if let Some(v) = setup.transfer_delay {
        tuning.transfer_delay = v;
    }
    if let Some(v) = setup.reattach_grace {
        tuning.reattach_grace = v;
    }
    if let Some(v) = setup.max_control_distance {
        tuning.max_control_distance = v;
    }
    tuning
}

struct ActorDef {
    id: ActorId,
    team: Team,
    transform: Transform,
}

/// Spawn actors (in seeded order), rosters (in file order) and balls
fn spawn_scenario(
    world: &mut World,
    setup: &TestSetup,
    tuning: &GameplayTuning,
) -> Result<(), String> {
    let mut actors = Vec::new();
    let mut seen = HashSet::new();
    for def in &setup.entities {
        if let EntityDef::Actor {
            id,
            team,
            x,
            z,
            facing,
        } = def
        {
            let id = parse_actor(id)?;
            if !seen.insert(id) {
                return Err(format!("Actor {} defined twice", id));
            }
            let direction = Vec3::new(facing[0], 0.0, facing[1]);
            actors.push(ActorDef {
                id,
                team: parse_team(team)?,
                transform: Transform::from_xyz(*x, 0.0, *z).looking_to(direction, Vec3::Y),
            });
        }
    }

    let mut members: BTreeMap<Team, Vec<ActorId>> = BTreeMap::new();
    for actor in &actors {
        members.entry(actor.team).or_default().push(actor.id);
    }
    {
        let mut rosters = world.resource_mut::<Rosters>();
        for (team, ids) in members {
            let roster = Roster::new(team, ids).map_err(|e| e.to_string())?;
            rosters.insert(roster);
        }
    }

    let mut spawn_order: Vec<&ActorDef> = actors.iter().collect();
    if let Some(seed) = setup.seed {
        let mut rng = StdRng::seed_from_u64(seed);
        spawn_order.shuffle(&mut rng);
    }
    let mut entities = HashMap::new();
    for actor in spawn_order {
        let entity = world
            .spawn(actor_bundle(actor.id, actor.team, actor.transform, tuning))
            .id();
        entities.insert(actor.id, entity);
    }

    let balls = setup.entities.iter().filter_map(|def| match def {
        EntityDef::Ball { x, y, z, holder } => Some((Vec3::new(*x, *y, *z), holder)),
        EntityDef::Actor { .. } => None,
    });
    for (index, (position, holder)) in balls.enumerate() {
        let ball = BallId(index as u32);
        let mut possession = Possession::new(ball);
        let mut position = position;

        if let Some(holder) = holder {
            let holder = parse_actor(holder)?;
            let actor = actors
                .iter()
                .find(|a| a.id == holder)
                .ok_or_else(|| format!("Ball holder {} is not an actor", holder))?;
            let anchor = HoldAnchor(HOLD_ANCHOR_OFFSET).world(&actor.transform);
            position = anchor;
            let mut physics = world.resource_mut::<PhysicsRequests>();
            try_attach(&mut possession, position, holder, anchor, &mut physics)
                .map_err(|e| format!("{} cannot start with {}: {}", holder, ball, e))?;
            world
                .resource_mut::<EventBus>()
                .emit(GameEvent::Attach { ball, actor: holder });
        }

        world
            .spawn(ball_bundle(ball, position, tuning))
            .insert(possession);
    }

    if let Some(active) = &setup.active {
        let active = parse_actor(active)?;
        let entity = entities
            .get(&active)
            .copied()
            .ok_or_else(|| format!("Active actor {} is not spawned", active))?;
        let roster = actors
            .iter()
            .find(|a| a.id == active)
            .and_then(|a| world.resource::<Rosters>().get(a.team).cloned())
            .ok_or_else(|| format!("No roster for {}", active))?;
        world
            .resource_mut::<RosterSwitcher>()
            .set_active(&roster, active)
            .map_err(|e| e.to_string())?;
        world
            .entity_mut(entity)
            .insert((HumanControlled, ControlMarker(true)));
    }

    Ok(())
}

fn teleport_actor(world: &mut World, actor: ActorId, position: Vec2) -> bool {
    let mut query = world.query::<(&Actor, &mut Transform)>();
    for (a, mut transform) in query.iter_mut(world) {
        if a.id == actor {
            transform.translation.x = position.x;
            transform.translation.z = position.y;
            return true;
        }
    }
    false
}

/// Extract world state for assertions
fn extract_world_state(world: &mut World) -> WorldState {
    let mut state = WorldState {
        step: world.resource::<SimClock>().step(),
        ..Default::default()
    };

    let switcher = world.resource::<RosterSwitcher>();
    state.active = switcher.active().map(scenario_name);
    state.pending = switcher.pending().len();

    for roster in world.resource::<Rosters>().iter() {
        let team = format!("{:?}", roster.team()).to_lowercase();
        state.rosters.insert(team, roster.len());
    }

    let score = world.resource::<Score>();
    for team in [Team::Home, Team::Away] {
        let name = format!("{:?}", team).to_lowercase();
        state.score.insert(name, score.goals(team));
    }

    let mut actor_query =
        world.query::<(&Actor, &Transform, Has<HumanControlled>, &ControlMarker)>();
    for (actor, transform, human, marker) in actor_query.iter(world) {
        state.actors.insert(
            scenario_name(actor.id),
            ActorState {
                x: transform.translation.x,
                z: transform.translation.z,
                human,
                marker: marker.0,
            },
        );
    }

    // First ball by id
    let mut ball_query = world.query_filtered::<(&Possession, &Transform, &BallBody), With<Ball>>();
    state.ball = ball_query
        .iter(world)
        .min_by_key(|(p, _, _)| p.ball())
        .map(|(possession, transform, body)| BallState {
            x: transform.translation.x,
            y: transform.translation.y,
            z: transform.translation.z,
            speed: body.velocity.length(),
            holder: possession.holder().map(scenario_name),
            controlled: body.controlled,
        });

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SCENARIOS_DIR, run_scenarios};
    use std::path::Path;

    fn scenario(toml: &str) -> TestDefinition {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_held_ball_kicked_away() {
        let test = scenario(
            r#"
name = "kick"
[setup]
active = "p0"
[[setup.entities]]
type = "actor"
id = "p0"
x = 0.0
z = 0.0
[[setup.entities]]
type = "ball"
holder = "p0"

[[input]]
frame = 2
kick = true

[[expect.sequence]]
event = "Attach"
actor = "p0"
[[expect.sequence]]
event = "Kick"
actor = "p0"
frame_max = 2

[[expect.state]]
after_frame = 20
checks = ["holder = none", "ball.x > 2", "active = p0"]
"#,
        );
        match run_test(&test) {
            TestResult::Pass { frames } => assert_eq!(frames, 20),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_broken_scenario_is_error() {
        let test = scenario(
            r#"
name = "broken"
[setup]
active = "p7"
[[setup.entities]]
type = "actor"
id = "p0"
x = 0.0
z = 0.0
"#,
        );
        assert!(matches!(run_test(&test), TestResult::Error { .. }));
    }

    #[test]
    fn test_seed_does_not_change_attach_winner() {
        let toml = |seed: u64| {
            format!(
                r#"
name = "race"
[setup]
seed = {seed}
[[setup.entities]]
type = "actor"
id = "p2"
team = "away"
x = 1.2
z = 0.0
facing = [-1.0, 0.0]
[[setup.entities]]
type = "actor"
id = "p0"
x = 0.0
z = 0.0
[[setup.entities]]
type = "ball"
x = 0.6
z = 0.0

[[expect.state]]
after_frame = 1
checks = ["holder = p0"]
"#
            )
        };
        for seed in [1, 2, 3, 42] {
            let test = scenario(&toml(seed));
            assert!(
                matches!(run_test(&test), TestResult::Pass { .. }),
                "seed {}",
                seed
            );
        }
    }

    #[test]
    fn test_scenario_files_pass() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join(SCENARIOS_DIR);
        let outcomes = run_scenarios(&root, None, false);
        assert!(outcomes.len() >= 20, "found {} scenarios", outcomes.len());

        let failures: Vec<String> = outcomes
            .iter()
            .filter(|o| !matches!(o.result, TestResult::Pass { .. }))
            .map(|o| format!("{}/{}: {:?}", o.category, o.name, o.result))
            .collect();
        assert!(failures.is_empty(), "{}", failures.join("\n"));
    }
}
