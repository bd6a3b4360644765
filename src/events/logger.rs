//! Event logger - writes bus events to `logs/<timestamp>_<session>.evlog`

use bevy::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use uuid::Uuid;

use super::bus::EventBus;
use super::format::serialize_event;
use super::types::GameEvent;
use crate::tuning::GameplayTuning;

/// Configuration for event logging
#[derive(Resource, Clone)]
pub struct EventLogConfig {
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Whether logging is enabled
    pub enabled: bool,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            enabled: true,
        }
    }
}

/// Active event logger with file handle
#[derive(Resource)]
pub struct EventLogger {
    writer: Option<BufWriter<File>>,
    session_id: String,
    config: EventLogConfig,
}

impl EventLogger {
    /// Create a new event logger (but don't open file yet)
    pub fn new(config: EventLogConfig) -> Self {
        Self {
            writer: None,
            session_id: String::new(),
            config,
        }
    }

    /// Start a new log session with a fresh UUID and log SessionStart
    pub fn start_session(&mut self, timestamp: &str) {
        if !self.config.enabled {
            return;
        }

        self.session_id = Uuid::new_v4().to_string();

        if let Err(e) = std::fs::create_dir_all(&self.config.log_dir) {
            warn!("Failed to create log directory: {}", e);
            return;
        }

        let filename = format!("{}_{}.evlog", timestamp, &self.session_id[..8]);
        let path = self.config.log_dir.join(filename);

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
        {
            Ok(file) => {
                self.writer = Some(BufWriter::new(file));
                info!(
                    "Event logging started: {} (session: {})",
                    path.display(),
                    &self.session_id[..8]
                );
                self.log(
                    0,
                    GameEvent::SessionStart {
                        session_id: self.session_id.clone(),
                        timestamp: timestamp.to_string(),
                    },
                );
            }
            Err(e) => {
                warn!("Failed to open event log: {}", e);
            }
        }
    }

    /// Log the tuning in effect (call after start_session)
    pub fn log_config(&mut self, tuning: &GameplayTuning) {
        self.log(0, GameEvent::Config(tuning.clone()));
    }

    /// Flush and close the current log
    pub fn end_session(&mut self) {
        if let Some(mut writer) = self.writer.take()
            && let Err(e) = writer.flush()
        {
            warn!("Failed to flush event log: {}", e);
        }
    }

    /// Log an event at `time_ms` simulated milliseconds
    pub fn log(&mut self, time_ms: u32, event: GameEvent) {
        let Some(writer) = &mut self.writer else {
            return;
        };

        let line = serialize_event(time_ms, &event);
        if let Err(e) = writeln!(writer, "{}", line) {
            warn!("Failed to write event: {}", e);
        }
    }

    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new(EventLogConfig::default())
    }
}

/// Drain the bus into the log file
pub fn write_bus_events(mut bus: ResMut<EventBus>, mut logger: ResMut<EventLogger>) {
    for bus_event in bus.drain() {
        let full_time = matches!(bus_event.event, GameEvent::MatchEnd { .. });
        logger.log(bus_event.time_ms, bus_event.event);
        if full_time {
            logger.end_session();
        }
    }
}
