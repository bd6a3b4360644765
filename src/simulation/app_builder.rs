//! Headless App Builder
//!
//! Builds windowless Bevy apps for the scenario runner and tests. Steps are
//! driven by running the `FixedUpdate` schedule directly, one call per step.

use bevy::prelude::*;

use super::KickaboutPlugin;
use super::setup::setup_match;
use crate::settings::MatchSettings;
use crate::tuning::GameplayTuning;

/// Builder for creating headless Bevy apps
pub struct HeadlessAppBuilder {
    tuning: GameplayTuning,
    settings: MatchSettings,
    minimal_threads: bool,
    match_setup: bool,
}

impl Default for HeadlessAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessAppBuilder {
    /// Default tuning and settings, no entities
    pub fn new() -> Self {
        Self {
            tuning: GameplayTuning::default(),
            settings: MatchSettings::default(),
            minimal_threads: false,
            match_setup: false,
        }
    }

    pub fn with_tuning(mut self, tuning: GameplayTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_settings(mut self, settings: MatchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Enable minimal thread mode (task pools = 1)
    ///
    /// Use this when running many apps in parallel to avoid hitting OS thread limits.
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Spawn the full kickoff layout (both rosters and the ball)
    pub fn with_match_setup(mut self) -> Self {
        self.match_setup = true;
        self
    }

    /// Build the app. Startup has already run when this returns.
    pub fn build(self) -> App {
        let mut app = App::new();

        if self.minimal_threads {
            app.add_plugins(MinimalPlugins.set(TaskPoolPlugin {
                task_pool_options: TaskPoolOptions::with_num_threads(1),
            }));
        } else {
            app.add_plugins(MinimalPlugins);
        }

        app.insert_resource(self.tuning)
            .insert_resource(self.settings)
            .add_plugins(KickaboutPlugin);

        if self.match_setup {
            app.add_systems(Startup, setup_match);
        }

        app.finish();
        app.cleanup();
        // No Startup schedule exists when nothing was registered in it
        let _ = app.world_mut().try_run_schedule(Startup);

        app
    }
}
