//! Scoring - goal detection and the match score

use bevy::prelude::*;

use crate::ball::{Ball, BallBody, BallConfig, Possession, ReleaseReason, reset};
use crate::clock::SimClock;
use crate::constants::*;
use crate::events::{EventBus, GameEvent};
use crate::physics::{PhysicsRequests, apply_ball_request};
use crate::player::Team;
use crate::settings::MatchSettings;

/// Goals per team
#[derive(Resource, Default, Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn record(&mut self, team: Team) {
        match team {
            Team::Home => self.home += 1,
            Team::Away => self.away += 1,
        }
    }

    pub fn goals(&self, team: Team) -> u32 {
        match team {
            Team::Home => self.home,
            Team::Away => self.away,
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.home, self.away)
    }
}

/// Team credited with a goal if a ball of `radius` at `position` is wholly
/// over a goal line between the posts and under the bar.
///
/// Home kicks off on the -X half, so it scores in the +X goal.
pub fn goal_scored_at(position: Vec3, radius: f32) -> Option<Team> {
    let over_line = position.x.abs() > PITCH_LENGTH / 2.0 + radius;
    let in_mouth = position.z.abs() < GOAL_WIDTH / 2.0 && position.y < GOAL_HEIGHT;
    if !(over_line && in_mouth) {
        return None;
    }

    let defending = if position.x > 0.0 { Team::Away } else { Team::Home };
    Some(defending.opponent())
}

/// Last physics system: award goals and put the ball back on the kickoff
/// spot. The reset is applied to the body here so the ball never spends a
/// possession stage inside the net.
pub fn check_goals(
    clock: Res<SimClock>,
    settings: Res<MatchSettings>,
    mut score: ResMut<Score>,
    mut balls: Query<(&mut Possession, &mut Transform, &mut BallBody, &BallConfig), With<Ball>>,
    mut bus: ResMut<EventBus>,
) {
    for (mut possession, mut transform, mut body, config) in &mut balls {
        let Some(team) = goal_scored_at(transform.translation, config.radius) else {
            continue;
        };
        let ball = possession.ball();

        score.record(team);
        info!("GOAL {:?}! {}", team, *score);
        bus.emit(GameEvent::Goal {
            ball,
            team,
            home: score.home,
            away: score.away,
        });

        let mut requests = PhysicsRequests::default();
        if let Some(actor) = reset(&mut possession, settings.kickoff(), clock.now(), &mut requests) {
            bus.emit(GameEvent::Release {
                ball,
                actor,
                reason: ReleaseReason::Reset,
            });
        }
        for request in requests.drain() {
            apply_ball_request(&mut transform, &mut body, config, &request);
        }
        bus.emit(GameEvent::BallReset { ball });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_sides() {
        let line = PITCH_LENGTH / 2.0;
        assert_eq!(
            goal_scored_at(Vec3::new(line + 0.5, BALL_RADIUS, 1.0), BALL_RADIUS),
            Some(Team::Home)
        );
        assert_eq!(
            goal_scored_at(Vec3::new(-line - 0.5, BALL_RADIUS, -1.0), BALL_RADIUS),
            Some(Team::Away)
        );
    }

    #[test]
    fn test_no_goal_on_the_line_or_wide() {
        let line = PITCH_LENGTH / 2.0;
        // Ball still touching the line
        assert_eq!(goal_scored_at(Vec3::new(line, BALL_RADIUS, 0.0), BALL_RADIUS), None);
        // Wide of the post
        assert_eq!(
            goal_scored_at(Vec3::new(line + 0.5, BALL_RADIUS, GOAL_WIDTH), BALL_RADIUS),
            None
        );
        // Over the bar
        assert_eq!(
            goal_scored_at(Vec3::new(line + 0.5, GOAL_HEIGHT + 1.0, 0.0), BALL_RADIUS),
            None
        );
    }

    #[test]
    fn test_score_tally() {
        let mut score = Score::default();
        score.record(Team::Home);
        score.record(Team::Away);
        score.record(Team::Home);
        assert_eq!(score.goals(Team::Home), 2);
        assert_eq!(score.goals(Team::Away), 1);
        assert_eq!(score.to_string(), "2 - 1");
    }
}
