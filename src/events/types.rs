//! Event type definitions for the logging system

use serde::{Deserialize, Serialize};

use crate::ball::{BallId, PossessionRejection, ReleaseReason};
use crate::control::SwitchRejection;
use crate::player::{ActorId, Team};
use crate::tuning::GameplayTuning;

/// All game events that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    // === Session Events ===
    /// Session started (generated once per game launch)
    SessionStart {
        session_id: String, // UUID v4
        timestamp: String,
    },
    /// Tuning snapshot (logged after session start)
    Config(GameplayTuning),

    // === Match Events ===
    MatchStart {
        home: usize,
        away: usize,
        duration: f32,
    },
    MatchEnd {
        duration: f32,
    },

    // === Possession Events ===
    /// Ball attached to an actor
    Attach { ball: BallId, actor: ActorId },
    /// Attach request refused (ball already held, ...)
    AttachRejected {
        ball: BallId,
        actor: ActorId,
        reason: PossessionRejection,
    },
    /// Holder kicked the ball
    Kick {
        ball: BallId,
        actor: ActorId,
        impulse: (f32, f32, f32),
    },
    /// Kick or pass refused
    KickRejected {
        actor: ActorId,
        reason: PossessionRejection,
    },
    /// Holder passed to a teammate
    Pass {
        ball: BallId,
        from: ActorId,
        to: ActorId,
        impulse: (f32, f32, f32),
    },
    /// Possession cleared
    Release {
        ball: BallId,
        actor: ActorId,
        reason: ReleaseReason,
    },
    /// Holder handed the ball straight to a teammate, no release in between
    Handoff {
        ball: BallId,
        from: ActorId,
        to: ActorId,
    },
    /// Ball put back on the kickoff spot
    BallReset { ball: BallId },
    /// Ball crossed a goal line; score after the goal
    Goal {
        ball: BallId,
        team: Team,
        home: u32,
        away: u32,
    },

    // === Control Events ===
    /// Active actor changed
    ControlSwitch {
        from: Option<ActorId>,
        to: ActorId,
    },
    /// Switch request refused
    SwitchRejected { reason: SwitchRejection },
    /// Deferred switch queued after a pass
    SwitchScheduled { receiver: ActorId, deadline_ms: u32 },
    /// Deferred switch dropped before firing
    SwitchCancelled { receiver: ActorId },
}

impl GameEvent {
    /// Get the event type code for compact serialization
    pub fn type_code(&self) -> &'static str {
        match self {
            GameEvent::SessionStart { .. } => "SE",
            GameEvent::Config(_) => "CF",
            GameEvent::MatchStart { .. } => "MS",
            GameEvent::MatchEnd { .. } => "ME",
            GameEvent::Attach { .. } => "AT",
            GameEvent::AttachRejected { .. } => "AR",
            GameEvent::Kick { .. } => "K",
            GameEvent::KickRejected { .. } => "KR",
            GameEvent::Pass { .. } => "PS",
            GameEvent::Release { .. } => "RL",
            GameEvent::Handoff { .. } => "HO",
            GameEvent::BallReset { .. } => "BR",
            GameEvent::Goal { .. } => "G",
            GameEvent::ControlSwitch { .. } => "CS",
            GameEvent::SwitchRejected { .. } => "SX",
            GameEvent::SwitchScheduled { .. } => "SQ",
            GameEvent::SwitchCancelled { .. } => "SC",
        }
    }

    /// Event name used by scenario expectations
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::SessionStart { .. } => "SessionStart",
            GameEvent::Config(_) => "Config",
            GameEvent::MatchStart { .. } => "MatchStart",
            GameEvent::MatchEnd { .. } => "MatchEnd",
            GameEvent::Attach { .. } => "Attach",
            GameEvent::AttachRejected { .. } => "AttachRejected",
            GameEvent::Kick { .. } => "Kick",
            GameEvent::KickRejected { .. } => "KickRejected",
            GameEvent::Pass { .. } => "Pass",
            GameEvent::Release { .. } => "Release",
            GameEvent::Handoff { .. } => "Handoff",
            GameEvent::BallReset { .. } => "BallReset",
            GameEvent::Goal { .. } => "Goal",
            GameEvent::ControlSwitch { .. } => "ControlSwitch",
            GameEvent::SwitchRejected { .. } => "SwitchRejected",
            GameEvent::SwitchScheduled { .. } => "SwitchScheduled",
            GameEvent::SwitchCancelled { .. } => "SwitchCancelled",
        }
    }

    /// The actor an event is about, if any
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            GameEvent::Attach { actor, .. }
            | GameEvent::AttachRejected { actor, .. }
            | GameEvent::Kick { actor, .. }
            | GameEvent::KickRejected { actor, .. }
            | GameEvent::Release { actor, .. } => Some(*actor),
            GameEvent::Pass { from, .. } => Some(*from),
            GameEvent::Handoff { to, .. } => Some(*to),
            GameEvent::ControlSwitch { to, .. } => Some(*to),
            GameEvent::SwitchScheduled { receiver, .. }
            | GameEvent::SwitchCancelled { receiver } => Some(*receiver),
            _ => None,
        }
    }
}
