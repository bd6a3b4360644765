//! Compact text format for game event serialization
//!
//! Format: `T:NNNNN|CODE|data...`
//! - T:NNNNN = timestamp in milliseconds (5 digits, wraps at 99999)
//! - CODE = event type code
//! - data = pipe-separated values specific to event type
//!
//! Examples:
//! ```text
//! T:00000|MS|3|3|420.0
//! T:00140|AT|B0|P0
//! T:01200|PS|B0|P0|P1|0.0,0.0,10.0
//! T:01200|RL|B0|P0|P
//! T:01200|SQ|P1|1700
//! T:01700|CS|P0|P1
//! T:09300|G|B0|H|1|0
//! ```

use super::types::GameEvent;

/// Format a float with fixed precision (1 decimal)
fn fmt_f1(v: f32) -> String {
    format!("{:.1}", v)
}

/// Format a vector tuple
fn fmt_vec(v: (f32, f32, f32)) -> String {
    format!("{:.1},{:.1},{:.1}", v.0, v.1, v.2)
}

/// Serialize a GameEvent to compact text format
pub fn serialize_event(time_ms: u32, event: &GameEvent) -> String {
    let ts = format!("T:{:05}", time_ms % 100000);
    let code = event.type_code();

    let data = match event {
        GameEvent::SessionStart {
            session_id,
            timestamp,
        } => format!("{}|{}", session_id, timestamp),
        GameEvent::Config(tuning) => {
            // Compact JSON for easy parsing
            serde_json::to_string(tuning).unwrap_or_else(|_| "{}".to_string())
        }
        GameEvent::MatchStart {
            home,
            away,
            duration,
        } => format!("{}|{}|{}", home, away, fmt_f1(*duration)),
        GameEvent::MatchEnd { duration } => fmt_f1(*duration),
        GameEvent::Attach { ball, actor } => format!("{}|{}", ball, actor),
        GameEvent::AttachRejected {
            ball,
            actor,
            reason,
        } => format!("{}|{}|{}", ball, actor, reason),
        GameEvent::Kick {
            ball,
            actor,
            impulse,
        } => format!("{}|{}|{}", ball, actor, fmt_vec(*impulse)),
        GameEvent::KickRejected { actor, reason } => format!("{}|{}", actor, reason),
        GameEvent::Pass {
            ball,
            from,
            to,
            impulse,
        } => format!("{}|{}|{}|{}", ball, from, to, fmt_vec(*impulse)),
        GameEvent::Release {
            ball,
            actor,
            reason,
        } => format!("{}|{}|{}", ball, actor, reason.code()),
        GameEvent::Handoff { ball, from, to } => format!("{}|{}|{}", ball, from, to),
        GameEvent::BallReset { ball } => ball.to_string(),
        GameEvent::Goal {
            ball,
            team,
            home,
            away,
        } => format!("{}|{}|{}|{}", ball, team.code(), home, away),
        GameEvent::ControlSwitch { from, to } => {
            let from = from.map_or_else(|| "-".to_string(), |f| f.to_string());
            format!("{}|{}", from, to)
        }
        GameEvent::SwitchRejected { reason } => reason.to_string(),
        GameEvent::SwitchScheduled {
            receiver,
            deadline_ms,
        } => format!("{}|{}", receiver, deadline_ms),
        GameEvent::SwitchCancelled { receiver } => receiver.to_string(),
    };

    format!("{}|{}|{}", ts, code, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ball::{BallId, ReleaseReason};
    use crate::player::ActorId;

    #[test]
    fn test_serialize_pass() {
        let line = serialize_event(
            1200,
            &GameEvent::Pass {
                ball: BallId(0),
                from: ActorId(0),
                to: ActorId(1),
                impulse: (0.0, 0.0, 10.0),
            },
        );
        assert_eq!(line, "T:01200|PS|B0|P0|P1|0.0,0.0,10.0");
    }

    #[test]
    fn test_serialize_release_and_switch() {
        let line = serialize_event(
            50,
            &GameEvent::Release {
                ball: BallId(0),
                actor: ActorId(2),
                reason: ReleaseReason::Distance,
            },
        );
        assert_eq!(line, "T:00050|RL|B0|P2|D");

        let line = serialize_event(
            0,
            &GameEvent::ControlSwitch {
                from: None,
                to: ActorId(0),
            },
        );
        assert_eq!(line, "T:00000|CS|-|P0");
    }

    #[test]
    fn test_serialize_goal() {
        let line = serialize_event(
            9300,
            &GameEvent::Goal {
                ball: BallId(0),
                team: crate::player::Team::Away,
                home: 2,
                away: 1,
            },
        );
        assert_eq!(line, "T:09300|G|B0|A|2|1");
    }

    #[test]
    fn test_timestamp_wraps() {
        let line = serialize_event(123456, &GameEvent::MatchEnd { duration: 420.0 });
        assert_eq!(line, "T:23456|ME|420.0");
    }
}
