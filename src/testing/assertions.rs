//! Assertion checking for scenario expectations

use std::collections::HashMap;

use super::input::scenario_name;
use super::parser::{ExpectedEvent, StateAssertion};
use crate::events::GameEvent;

/// Error when an assertion fails
#[derive(Debug, Clone)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n    Expected: {}\n    Actual: {}",
            self.message, self.expected, self.actual
        )
    }
}

/// Captured event with timing info
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub frame: u64,
    pub event_type: String,
    pub actor: Option<String>,
}

impl CapturedEvent {
    pub fn from_game_event(frame: u64, event: &GameEvent) -> Self {
        CapturedEvent {
            frame,
            event_type: event.name().to_string(),
            actor: event.actor().map(scenario_name),
        }
    }
}

/// Check if captured events match the expected sequence (in order, gaps allowed)
pub fn check_sequence(
    expected: &[ExpectedEvent],
    captured: &[CapturedEvent],
) -> Result<(), AssertionError> {
    let mut captured_idx = 0;

    for (i, exp) in expected.iter().enumerate() {
        let found = captured[captured_idx..].iter().enumerate().find(|(_, cap)| {
            cap.event_type == exp.event
                && exp
                    .actor
                    .as_ref()
                    .is_none_or(|a| cap.actor.as_deref() == Some(a.to_lowercase().as_str()))
        });

        match found {
            Some((offset, cap)) => {
                if let Some(min) = exp.frame_min
                    && cap.frame < min
                {
                    return Err(AssertionError {
                        message: format!("Event #{} '{}' occurred too early", i + 1, exp.event),
                        expected: format!("frame >= {}", min),
                        actual: format!("frame {}", cap.frame),
                    });
                }
                if let Some(max) = exp.frame_max
                    && cap.frame > max
                {
                    return Err(AssertionError {
                        message: format!("Event #{} '{}' occurred too late", i + 1, exp.event),
                        expected: format!("frame <= {}", max),
                        actual: format!("frame {}", cap.frame),
                    });
                }
                captured_idx += offset + 1;
            }
            None => {
                let actor_str = exp
                    .actor
                    .as_ref()
                    .map(|a| format!(" (actor: {})", a))
                    .unwrap_or_default();
                return Err(AssertionError {
                    message: format!("Event #{} '{}'{} not found", i + 1, exp.event, actor_str),
                    expected: format!("'{}' event in sequence", exp.event),
                    actual: format!(
                        "events after position {}: {:?}",
                        captured_idx,
                        captured[captured_idx..]
                            .iter()
                            .map(|e| describe(e))
                            .collect::<Vec<_>>()
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Fail if any of the named events was captured
pub fn check_absent(absent: &[String], captured: &[CapturedEvent]) -> Result<(), AssertionError> {
    for name in absent {
        if let Some(cap) = captured.iter().find(|c| &c.event_type == name) {
            return Err(AssertionError {
                message: format!("Unexpected '{}' event", name),
                expected: format!("no '{}' events", name),
                actual: describe(cap),
            });
        }
    }
    Ok(())
}

fn describe(event: &CapturedEvent) -> String {
    match &event.actor {
        Some(actor) => format!("{}@{}({})", event.event_type, event.frame, actor),
        None => format!("{}@{}", event.event_type, event.frame),
    }
}

/// World state for assertions
#[derive(Debug, Default)]
pub struct WorldState {
    pub step: u64,
    pub actors: HashMap<String, ActorState>,
    pub ball: Option<BallState>,
    /// Scenario name of the active actor
    pub active: Option<String>,
    pub pending: usize,
    /// Roster sizes keyed by "home" / "away"
    pub rosters: HashMap<String, usize>,
    /// Goals keyed by "home" / "away"
    pub score: HashMap<String, u32>,
}

#[derive(Debug)]
pub struct ActorState {
    pub x: f32,
    pub z: f32,
    pub human: bool,
    pub marker: bool,
}

#[derive(Debug)]
pub struct BallState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub speed: f32,
    pub holder: Option<String>,
    pub controlled: bool,
}

/// Parse a check string into (path, operator, value)
fn parse_check(check: &str) -> Option<(&str, &str, &str)> {
    // Two-character operators first
    for op in &[">=", "<=", "!=", "=", ">", "<"] {
        if let Some(idx) = check.find(op) {
            let path = check[..idx].trim();
            let value = check[idx + op.len()..].trim();
            return Some((path, op, value));
        }
    }
    None
}

/// Check state assertions against world state
pub fn check_state(assertion: &StateAssertion, state: &WorldState) -> Result<(), AssertionError> {
    for check in &assertion.checks {
        let (path, operator, expected_value) =
            parse_check(check).ok_or_else(|| AssertionError {
                message: format!("Invalid check syntax: {}", check),
                expected: "format: 'path = value' or 'path > value'".to_string(),
                actual: check.clone(),
            })?;

        let path_parts: Vec<&str> = path.split('.').collect();

        match path_parts.as_slice() {
            ["active"] => check_name(check, state.active.as_deref(), operator, expected_value)?,
            ["holder"] => {
                let holder = state.ball.as_ref().and_then(|b| b.holder.as_deref());
                check_name(check, holder, operator, expected_value)?
            }
            ["pending"] => {
                check_float_comparison(path, state.pending as f32, operator, expected_value)?
            }
            ["step"] => check_float_comparison(path, state.step as f32, operator, expected_value)?,
            ["roster", team] => {
                let size = state.rosters.get(*team).copied().unwrap_or(0);
                check_float_comparison(path, size as f32, operator, expected_value)?
            }
            ["score", team] => {
                let goals = state.score.get(*team).copied().unwrap_or(0);
                check_float_comparison(path, goals as f32, operator, expected_value)?
            }
            ["ball", field] => {
                let ball = state.ball.as_ref().ok_or_else(|| AssertionError {
                    message: "Ball state check failed".to_string(),
                    expected: "ball exists".to_string(),
                    actual: "no ball".to_string(),
                })?;
                match *field {
                    "x" => check_float_comparison(path, ball.x, operator, expected_value)?,
                    "y" => check_float_comparison(path, ball.y, operator, expected_value)?,
                    "z" => check_float_comparison(path, ball.z, operator, expected_value)?,
                    "speed" => check_float_comparison(path, ball.speed, operator, expected_value)?,
                    "controlled" => check_bool(check, ball.controlled, expected_value)?,
                    _ => return Err(unknown_path(check)),
                }
            }
            [actor, field] => {
                let entity = state.actors.get(*actor).ok_or_else(|| AssertionError {
                    message: format!("Actor '{}' not found", actor),
                    expected: format!("actor '{}'", actor),
                    actual: format!("available: {:?}", state.actors.keys().collect::<Vec<_>>()),
                })?;
                match *field {
                    "x" => check_float_comparison(path, entity.x, operator, expected_value)?,
                    "z" => check_float_comparison(path, entity.z, operator, expected_value)?,
                    "human" => check_bool(check, entity.human, expected_value)?,
                    "marker" => check_bool(check, entity.marker, expected_value)?,
                    _ => return Err(unknown_path(check)),
                }
            }
            _ => return Err(unknown_path(check)),
        }
    }

    Ok(())
}

fn unknown_path(check: &str) -> AssertionError {
    AssertionError {
        message: format!("Unknown check path: {}", check),
        expected: "active, holder, pending, step, roster.<team>, score.<team>, ball.<field>, <actor>.<field>"
            .to_string(),
        actual: check.to_string(),
    }
}

/// Compare an optional actor name; "none" matches no actor
fn check_name(
    check: &str,
    actual: Option<&str>,
    operator: &str,
    expected: &str,
) -> Result<(), AssertionError> {
    let expected = expected.trim_matches('"').to_lowercase();
    let actual = actual.unwrap_or("none");
    let pass = match operator {
        "=" => actual == expected,
        "!=" => actual != expected,
        _ => {
            return Err(AssertionError {
                message: format!("Operator '{}' not supported: {}", operator, check),
                expected: "= or !=".to_string(),
                actual: operator.to_string(),
            });
        }
    };

    if !pass {
        return Err(AssertionError {
            message: format!("Check failed: {}", check),
            expected: format!("{} {}", operator, expected),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn check_bool(check: &str, actual: bool, expected: &str) -> Result<(), AssertionError> {
    let expected = expected == "true";
    if actual != expected {
        return Err(AssertionError {
            message: format!("Check failed: {}", check),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Check float comparison with operator
fn check_float_comparison(
    path: &str,
    actual: f32,
    operator: &str,
    expected_str: &str,
) -> Result<(), AssertionError> {
    let value: f32 = expected_str.trim().parse().map_err(|_| AssertionError {
        message: format!("Invalid value for {}", path),
        expected: "number".to_string(),
        actual: expected_str.to_string(),
    })?;

    let pass = match operator {
        ">=" => actual >= value,
        "<=" => actual <= value,
        ">" => actual > value,
        "<" => actual < value,
        "=" => (actual - value).abs() < 0.01,
        "!=" => (actual - value).abs() >= 0.01,
        _ => false,
    };

    if !pass {
        return Err(AssertionError {
            message: format!(
                "Check failed: {} {} {} (actual: {:.2})",
                path, operator, expected_str, actual
            ),
            expected: format!("{} {} {}", path, operator, value),
            actual: format!("{:.2}", actual),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(frame: u64, event_type: &str, actor: Option<&str>) -> CapturedEvent {
        CapturedEvent {
            frame,
            event_type: event_type.to_string(),
            actor: actor.map(str::to_string),
        }
    }

    fn expected(event: &str, actor: Option<&str>, frame_max: Option<u64>) -> ExpectedEvent {
        ExpectedEvent {
            event: event.to_string(),
            actor: actor.map(str::to_string),
            frame_min: None,
            frame_max,
        }
    }

    #[test]
    fn test_sequence_in_order_with_gaps() {
        let events = vec![
            captured(1, "Attach", Some("p0")),
            captured(3, "Pass", Some("p0")),
            captured(3, "Release", Some("p0")),
            captured(35, "ControlSwitch", Some("p1")),
        ];
        let ok = [
            expected("Attach", Some("P0"), None),
            expected("ControlSwitch", Some("p1"), Some(40)),
        ];
        assert!(check_sequence(&ok, &events).is_ok());

        let out_of_order = [
            expected("ControlSwitch", None, None),
            expected("Pass", None, None),
        ];
        assert!(check_sequence(&out_of_order, &events).is_err());

        let too_late = [expected("ControlSwitch", None, Some(30))];
        assert!(check_sequence(&too_late, &events).is_err());

        assert!(check_absent(&["Kick".to_string()], &events).is_ok());
        assert!(check_absent(&["Pass".to_string()], &events).is_err());
    }

    #[test]
    fn test_state_checks() {
        let mut state = WorldState {
            step: 10,
            active: Some("p1".to_string()),
            ..Default::default()
        };
        state.actors.insert(
            "p0".to_string(),
            ActorState {
                x: 2.0,
                z: 0.0,
                human: false,
                marker: false,
            },
        );
        state.ball = Some(BallState {
            x: 1.5,
            y: 0.11,
            z: 0.0,
            speed: 0.0,
            holder: None,
            controlled: false,
        });
        state.rosters.insert("home".to_string(), 3);
        state.score.insert("away".to_string(), 1);

        let assertion = StateAssertion {
            after_frame: 10,
            checks: vec![
                "active = p1".to_string(),
                "holder = none".to_string(),
                "ball.x > 1".to_string(),
                "p0.x >= 2".to_string(),
                "p0.human = false".to_string(),
                "roster.home = 3".to_string(),
                "score.away = 1".to_string(),
                "score.home = 0".to_string(),
                "step = 10".to_string(),
            ],
        };
        assert!(check_state(&assertion, &state).is_ok());

        let failing = StateAssertion {
            after_frame: 10,
            checks: vec!["active = p0".to_string()],
        };
        assert!(check_state(&failing, &state).is_err());

        let unknown = StateAssertion {
            after_frame: 10,
            checks: vec!["p9.x = 0".to_string()],
        };
        assert!(check_state(&unknown, &state).is_err());
    }
}
