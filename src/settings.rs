//! Match setup settings
//!
//! Loads roster size, the human-controlled team and match length from
//! config/match_settings.json. Missing or broken files fall back to defaults.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::*;
use crate::player::Team;

/// Path to the settings file
pub const SETTINGS_FILE: &str = "config/match_settings.json";

/// Settings that shape a match
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Actors per team
    pub roster_size: usize,
    /// Team whose active actor receives human input
    pub human_team: Team,
    /// Match length in seconds
    pub match_duration: f32,
    /// Where the ball is placed at kickoff and after a reset
    pub kickoff_spot: [f32; 3],
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            roster_size: ROSTER_SIZE,
            human_team: Team::Home,
            match_duration: MATCH_DURATION,
            kickoff_spot: KICKOFF_SPOT.to_array(),
        }
    }
}

impl MatchSettings {
    /// Load settings from file, or return defaults if file doesn't exist
    pub fn load() -> Self {
        let path = Path::new(SETTINGS_FILE);
        if !path.exists() {
            info!("No match_settings.json found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<MatchSettings>(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {}", SETTINGS_FILE);
                    settings.sanitized()
                }
                Err(e) => {
                    warn!("Failed to parse match_settings.json: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read match_settings.json: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = Path::new(SETTINGS_FILE).parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(SETTINGS_FILE, json)?;
        info!("Saved settings to {}", SETTINGS_FILE);
        Ok(())
    }

    pub fn kickoff(&self) -> Vec3 {
        Vec3::from_array(self.kickoff_spot)
    }

    /// Clamp values a hand-edited file could get wrong
    fn sanitized(mut self) -> Self {
        if self.roster_size == 0 {
            warn!("roster_size must be at least 1, using {}", ROSTER_SIZE);
            self.roster_size = ROSTER_SIZE;
        }
        if self.match_duration <= 0.0 {
            self.match_duration = MATCH_DURATION;
        }
        self
    }
}
