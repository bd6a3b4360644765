//! Fixed-step simulation
//!
//! `KickaboutPlugin` registers every gameplay system in `FixedUpdate`, split
//! into three chained stages that run in the same order every step:
//! physics, then possession, then control.

pub mod app_builder;
pub mod setup;

use bevy::prelude::*;

use crate::ball::{
    PossessionEvents, follow_holders, process_possession_events, queue_actor_commands,
    queue_overlap_attachments,
};
use crate::clock::{MatchClock, SimClock, advance_sim_clock, match_in_progress, update_match_clock};
use crate::control::{
    ControlRequests, Rosters, apply_control_requests, check_control_invariants,
    handle_switch_input, poll_pending_switches, sync_control_markers,
};
use crate::events::EventBus;
use crate::input::PlayerInput;
use crate::physics::{PhysicsRequests, apply_physics_requests, integrate_balls};
use crate::player::move_actors;
use crate::scoring::{Score, check_goals};
use crate::settings::MatchSettings;
use crate::tuning::GameplayTuning;

pub use app_builder::HeadlessAppBuilder;
pub use setup::{actor_bundle, ball_bundle, formation, remove_actor, setup_match};

/// Stages of one simulation step
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepSet {
    Physics,
    Possession,
    Control,
}

/// Gameplay plugin. Insert `GameplayTuning` and `MatchSettings` before adding
/// it to override the defaults.
pub struct KickaboutPlugin;

impl Plugin for KickaboutPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameplayTuning>()
            .init_resource::<MatchSettings>();

        let tuning = app.world().resource::<GameplayTuning>().clone();
        let duration = app.world().resource::<MatchSettings>().match_duration;

        app.insert_resource(tuning.switcher())
            .insert_resource(MatchClock::new(duration))
            .init_resource::<SimClock>()
            .init_resource::<EventBus>()
            .init_resource::<PlayerInput>()
            .init_resource::<Rosters>()
            .init_resource::<Score>()
            .init_resource::<PossessionEvents>()
            .init_resource::<ControlRequests>()
            .init_resource::<PhysicsRequests>();

        app.configure_sets(
            FixedUpdate,
            (StepSet::Physics, StepSet::Possession, StepSet::Control).chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                advance_sim_clock,
                apply_physics_requests,
                move_actors,
                integrate_balls,
                check_goals,
            )
                .chain()
                .in_set(StepSet::Physics)
                .run_if(match_in_progress),
        )
        .add_systems(
            FixedUpdate,
            (
                queue_actor_commands,
                queue_overlap_attachments,
                process_possession_events,
                follow_holders,
            )
                .chain()
                .in_set(StepSet::Possession)
                .run_if(match_in_progress),
        )
        .add_systems(
            FixedUpdate,
            (
                apply_control_requests,
                handle_switch_input,
                poll_pending_switches,
                sync_control_markers,
                check_control_invariants,
                update_match_clock,
            )
                .chain()
                .in_set(StepSet::Control)
                .run_if(match_in_progress),
        );
    }
}
