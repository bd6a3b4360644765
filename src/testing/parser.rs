//! TOML scenario file parsing

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::player::{ActorId, Team};

/// Complete scenario from a TOML file
#[derive(Debug, Deserialize)]
pub struct TestDefinition {
    pub name: String,
    pub description: Option<String>,
    pub setup: TestSetup,
    #[serde(default)]
    pub input: Vec<FrameInput>,
    #[serde(default)]
    pub teleport: Vec<Teleport>,
    #[serde(default)]
    pub remove: Vec<Removal>,
    #[serde(default)]
    pub expect: TestExpectations,
}

/// Scenario setup
#[derive(Debug, Deserialize)]
pub struct TestSetup {
    /// Shuffles entity spawn order
    pub seed: Option<u64>,
    /// Actor that starts under human control
    pub active: Option<String>,
    pub switch_cooldown: Option<f32>,
    pub transfer_delay: Option<f32>,
    pub reattach_grace: Option<f32>,
    pub max_control_distance: Option<f32>,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

/// Entity to spawn. Actors join their team's roster in file order.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum EntityDef {
    #[serde(rename = "actor")]
    Actor {
        id: String,
        #[serde(default = "default_team")]
        team: String,
        x: f32,
        z: f32,
        /// Facing direction on the ground plane, +X by default
        #[serde(default = "default_facing")]
        facing: [f32; 2],
    },
    #[serde(rename = "ball")]
    Ball {
        #[serde(default)]
        x: f32,
        #[serde(default = "default_ball_height")]
        y: f32,
        #[serde(default)]
        z: f32,
        /// Actor holding the ball at the start
        holder: Option<String>,
    },
}

fn default_team() -> String {
    "home".to_string()
}

fn default_facing() -> [f32; 2] {
    [1.0, 0.0]
}

fn default_ball_height() -> f32 {
    crate::constants::BALL_RADIUS
}

/// Input for the human-controlled actor at a specific frame.
/// Presses last one frame; the movement axis holds until changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameInput {
    pub frame: u64,
    pub move_x: Option<f32>,
    pub move_z: Option<f32>,
    #[serde(default)]
    pub kick: bool,
    #[serde(default)]
    pub pass: bool,
    #[serde(default)]
    pub switch: bool,
    #[serde(default)]
    pub reset: bool,
    pub pass_target: Option<String>,
}

/// Move an actor before a frame runs
#[derive(Debug, Clone, Deserialize)]
pub struct Teleport {
    pub frame: u64,
    pub actor: String,
    pub x: f32,
    pub z: f32,
}

/// Take an actor out of play before a frame runs
#[derive(Debug, Clone, Deserialize)]
pub struct Removal {
    pub frame: u64,
    pub actor: String,
}

/// Expected outcomes
#[derive(Debug, Default, Deserialize)]
pub struct TestExpectations {
    #[serde(default)]
    pub sequence: Vec<ExpectedEvent>,
    /// State assertions at different frames (`[[expect.state]]`)
    #[serde(default)]
    pub state: Vec<StateAssertion>,
    /// Events that must never be seen
    #[serde(default)]
    pub absent: Vec<String>,
}

/// Expected event in sequence
#[derive(Debug, Deserialize)]
pub struct ExpectedEvent {
    pub event: String,
    pub actor: Option<String>,
    pub frame_min: Option<u64>,
    pub frame_max: Option<u64>,
}

/// State assertion after a frame
#[derive(Debug, Clone, Deserialize)]
pub struct StateAssertion {
    pub after_frame: u64,
    #[serde(default)]
    pub checks: Vec<String>,
}

/// Parse "p3" (any case) into an actor id
pub fn parse_actor(name: &str) -> Result<ActorId, String> {
    let name = name.trim();
    name.strip_prefix('p')
        .or_else(|| name.strip_prefix('P'))
        .and_then(|n| n.parse::<u32>().ok())
        .map(ActorId)
        .ok_or_else(|| format!("Bad actor id '{}', expected p<number>", name))
}

pub fn parse_team(name: &str) -> Result<Team, String> {
    match name.to_lowercase().as_str() {
        "home" | "h" => Ok(Team::Home),
        "away" | "a" => Ok(Team::Away),
        _ => Err(format!("Unknown team '{}'", name)),
    }
}

impl TestDefinition {
    /// Last frame any input, teleport, removal or expectation refers to
    pub fn last_frame(&self) -> u64 {
        let inputs = self.input.iter().map(|i| i.frame);
        let teleports = self.teleport.iter().map(|t| t.frame);
        let removals = self.remove.iter().map(|r| r.frame);
        let states = self.expect.state.iter().map(|s| s.after_frame);
        let sequence = self
            .expect
            .sequence
            .iter()
            .filter_map(|e| e.frame_max.or(e.frame_min));

        inputs
            .chain(teleports)
            .chain(removals)
            .chain(states)
            .chain(sequence)
            .max()
            .unwrap_or(0)
    }
}

/// Parse a scenario file from path
pub fn parse_test_file(path: &Path) -> Result<TestDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}
