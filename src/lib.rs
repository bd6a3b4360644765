//! Kickabout - ball possession and active-actor control for a team ball game
//! built with Bevy
//!
//! This crate provides all game components, resources, and systems organized into modules.

// Core modules
pub mod clock;
pub mod constants;
pub mod events;
pub mod settings;
pub mod simulation;
pub mod testing;
pub mod tuning;

// Game logic modules
pub mod ball;
pub mod control;
pub mod input;
pub mod physics;
pub mod player;
pub mod scoring;

// Re-export commonly used types for convenience
pub use ball::{
    Ball, BallBody, BallConfig, BallId, BallState, Possession, PossessionEvent, PossessionEvents,
    PossessionRejection, ReleaseReason,
};
pub use clock::{MatchClock, SimClock, match_in_progress};
pub use constants::*;
pub use control::{
    ControlRequest, ControlRequests, PendingSwitch, Repossession, Roster, RosterError,
    RosterSwitcher, Rosters, SwitchQueue, SwitchRejection, Switched,
};
pub use events::{BusEvent, EventBus, EventLogConfig, EventLogger, GameEvent, write_bus_events};
pub use input::PlayerInput;
pub use physics::{PhysicsRequest, PhysicsRequests};
pub use player::{
    Actor, ActorConfig, ActorId, ControlMarker, HoldAnchor, HumanControlled, Team, Velocity,
};
pub use scoring::Score;
pub use settings::MatchSettings;
pub use simulation::{HeadlessAppBuilder, KickaboutPlugin, StepSet, setup_match};
pub use tuning::{GameplayTuning, load_global_tuning};
