//! Active-actor selection
//!
//! The switcher owns the one "currently active" reference for the whole match.
//! Every activation replaces it, so at most one actor is ever active. It knows
//! nothing about the ball: refusing to switch while the team has possession is
//! the caller's job (see `policy`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::pending::{PendingSwitch, SwitchQueue};
use super::roster::{Roster, Rosters};
use crate::ball::BallId;
use crate::constants::*;
use crate::player::{ActorId, Team};
use crate::tuning::duration_secs;

/// Why a switch request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchRejection {
    EmptyRoster,
    /// Next member would be the current one
    NoOtherMember,
    NotInRoster { actor: ActorId },
    Cooldown,
    /// Human team has the ball
    TeamHasBall,
    /// No teammate to pass or switch to
    NoTeammate,
}

impl std::fmt::Display for SwitchRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwitchRejection::EmptyRoster => write!(f, "roster is empty"),
            SwitchRejection::NoOtherMember => write!(f, "no other member"),
            SwitchRejection::NotInRoster { actor } => write!(f, "{} not in roster", actor),
            SwitchRejection::Cooldown => write!(f, "cooldown"),
            SwitchRejection::TeamHasBall => write!(f, "team has the ball"),
            SwitchRejection::NoTeammate => write!(f, "no teammate"),
        }
    }
}

/// A completed activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switched {
    pub from: Option<ActorId>,
    pub to: ActorId,
}

/// What happened to a pending switch whose deadline elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchFired {
    Activated {
        pending: PendingSwitch,
        switched: Switched,
    },
    /// Receiver was no longer in its roster
    Dropped(PendingSwitch),
}

/// Pending switches touched by a change of holder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repossession {
    /// Dropped: the ball went to another roster
    pub cancelled: Vec<PendingSwitch>,
    /// Moved to the new holder, as they were before the move
    pub retargeted: Vec<PendingSwitch>,
}

#[derive(Resource, Debug, Clone)]
pub struct RosterSwitcher {
    active: Option<ActorId>,
    last_switch: Option<Duration>,
    switch_cooldown: Duration,
    transfer_delay: Duration,
    pending: SwitchQueue,
}

impl Default for RosterSwitcher {
    fn default() -> Self {
        Self::new(SWITCH_COOLDOWN, TRANSFER_DELAY)
    }
}

impl RosterSwitcher {
    /// Cooldown and transfer delay in seconds
    pub fn new(switch_cooldown: f32, transfer_delay: f32) -> Self {
        Self {
            active: None,
            last_switch: None,
            switch_cooldown: duration_secs("switch_cooldown", switch_cooldown, SWITCH_COOLDOWN),
            transfer_delay: duration_secs("transfer_delay", transfer_delay, TRANSFER_DELAY),
            pending: SwitchQueue::default(),
        }
    }

    pub fn active(&self) -> Option<ActorId> {
        self.active
    }

    pub fn is_active(&self, actor: ActorId) -> bool {
        self.active == Some(actor)
    }

    pub fn transfer_delay(&self) -> Duration {
        self.transfer_delay
    }

    pub fn switch_cooldown(&self) -> Duration {
        self.switch_cooldown
    }

    pub fn pending(&self) -> &SwitchQueue {
        &self.pending
    }

    fn activate(&mut self, actor: ActorId) -> Switched {
        let from = self.active.replace(actor);
        Switched { from, to: actor }
    }

    /// Make `actor` the only active actor
    pub fn set_active(&mut self, roster: &Roster, actor: ActorId) -> Result<Switched, SwitchRejection> {
        if !roster.contains(actor) {
            return Err(SwitchRejection::NotInRoster { actor });
        }
        Ok(self.activate(actor))
    }

    /// Advance to the next roster member in declaration order.
    /// Rate limited by `switch_cooldown`; a rejected request does not restart it.
    pub fn switch_to_next(&mut self, roster: &Roster, now: Duration) -> Result<Switched, SwitchRejection> {
        if roster.is_empty() {
            return Err(SwitchRejection::EmptyRoster);
        }
        if let Some(last) = self.last_switch
            && now.saturating_sub(last) < self.switch_cooldown
        {
            return Err(SwitchRejection::Cooldown);
        }

        let next = roster
            .next_after(self.active)
            .ok_or(SwitchRejection::EmptyRoster)?;
        if self.active == Some(next) {
            return Err(SwitchRejection::NoOtherMember);
        }

        self.last_switch = Some(now);
        Ok(self.activate(next))
    }

    /// Closest other member of `roster` to `from`; ties go to the earlier member.
    pub fn nearest_teammate(
        roster: &Roster,
        from: ActorId,
        position_of: impl Fn(ActorId) -> Option<Vec3>,
    ) -> Option<ActorId> {
        let origin = position_of(from)?;
        let mut best: Option<(ActorId, f32)> = None;

        for &member in roster.members() {
            if member == from {
                continue;
            }
            let Some(pos) = position_of(member) else {
                continue;
            };
            let dist = origin.distance(pos);
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((member, dist));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Activate the member nearest to `from`
    pub fn switch_to_nearest(
        &mut self,
        roster: &Roster,
        from: ActorId,
        position_of: impl Fn(ActorId) -> Option<Vec3>,
    ) -> Result<Switched, SwitchRejection> {
        let target =
            Self::nearest_teammate(roster, from, position_of).ok_or(SwitchRejection::NoTeammate)?;
        Ok(self.activate(target))
    }

    /// Queue activation of `receiver` once `delay` has elapsed.
    /// The current active actor keeps control until then.
    pub fn switch_on_pass_completion(
        &mut self,
        roster: &Roster,
        ball: BallId,
        receiver: ActorId,
        now: Duration,
        delay: Duration,
    ) -> Result<PendingSwitch, SwitchRejection> {
        if !roster.contains(receiver) {
            return Err(SwitchRejection::NotInRoster { actor: receiver });
        }
        Ok(self.pending.push(roster.team(), ball, receiver, now + delay))
    }

    /// Fire every pending switch whose deadline has elapsed, earliest first
    pub fn poll(&mut self, rosters: &Rosters, now: Duration) -> Vec<SwitchFired> {
        let mut fired = Vec::new();
        while let Some(pending) = self.pending.pop_due(now) {
            let still_member = rosters
                .get(pending.team)
                .is_some_and(|r| r.contains(pending.receiver));
            if still_member {
                let switched = self.activate(pending.receiver);
                fired.push(SwitchFired::Activated { pending, switched });
            } else {
                fired.push(SwitchFired::Dropped(pending));
            }
        }
        fired
    }

    /// Ball was taken by `holder` of `team`. Pending switches for that ball
    /// are dropped when another roster took it, and moved to `holder` when a
    /// teammate other than the receiver did.
    pub fn on_ball_possessed(&mut self, ball: BallId, holder: ActorId, team: Team) -> Repossession {
        let cancelled = self
            .pending
            .cancel_where(|p| p.ball == ball && p.team != team);
        let retargeted = self
            .pending
            .retarget_where(holder, |p| p.ball == ball && p.receiver != holder);
        Repossession {
            cancelled,
            retargeted,
        }
    }

    /// True if a deferred switch will activate `actor`
    pub fn has_pending_for(&self, actor: ActorId) -> bool {
        self.pending.contains_receiver(actor)
    }

    /// Actor left its roster: drop switches targeting it, and clear it if active
    pub fn on_actor_left(&mut self, actor: ActorId) -> Vec<PendingSwitch> {
        if self.active == Some(actor) {
            self.active = None;
        }
        self.pending.cancel_where(|p| p.receiver == actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;

    const P0: ActorId = ActorId(0);
    const P1: ActorId = ActorId(1);
    const P2: ActorId = ActorId(2);

    fn roster3() -> Roster {
        Roster::new(Team::Home, vec![P0, P1, P2]).unwrap()
    }

    fn rosters(roster: Roster) -> Rosters {
        let mut r = Rosters::default();
        r.insert(roster);
        r
    }

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn test_switch_to_next_cycles() {
        let roster = roster3();
        let mut switcher = RosterSwitcher::new(0.25, 0.5);
        switcher.set_active(&roster, P0).unwrap();

        let mut seen = Vec::new();
        for i in 0..3 {
            let switched = switcher.switch_to_next(&roster, secs(i as f32)).unwrap();
            seen.push(switched.to);
        }
        assert_eq!(seen, vec![P1, P2, P0]);
    }

    #[test]
    fn test_cooldown_rejects_fast_switches() {
        let roster = roster3();
        let mut switcher = RosterSwitcher::new(0.25, 0.5);
        switcher.set_active(&roster, P0).unwrap();

        assert!(switcher.switch_to_next(&roster, secs(1.0)).is_ok());
        assert_eq!(
            switcher.switch_to_next(&roster, secs(1.1)),
            Err(SwitchRejection::Cooldown)
        );
        assert_eq!(switcher.active(), Some(P1));
        // Rejection did not restart the cooldown
        assert!(switcher.switch_to_next(&roster, secs(1.25)).is_ok());
        assert_eq!(switcher.active(), Some(P2));
    }

    #[test]
    fn test_singleton_roster_is_noop() {
        let roster = Roster::new(Team::Home, vec![P0]).unwrap();
        let mut switcher = RosterSwitcher::new(0.0, 0.5);
        switcher.set_active(&roster, P0).unwrap();

        assert_eq!(
            switcher.switch_to_next(&roster, secs(1.0)),
            Err(SwitchRejection::NoOtherMember)
        );
        assert_eq!(switcher.active(), Some(P0));
    }

    #[test]
    fn test_empty_roster_rejected() {
        let mut roster = Roster::new(Team::Home, vec![P0]).unwrap();
        roster.remove(P0);
        let mut switcher = RosterSwitcher::new(0.0, 0.5);
        assert_eq!(
            switcher.switch_to_next(&roster, secs(1.0)),
            Err(SwitchRejection::EmptyRoster)
        );
        assert_eq!(switcher.active(), None);
    }

    #[test]
    fn test_set_active_is_exclusive_across_rosters() {
        let home = roster3();
        let away = Roster::new(Team::Away, vec![ActorId(10), ActorId(11)]).unwrap();
        let mut switcher = RosterSwitcher::default();

        switcher.set_active(&home, P1).unwrap();
        let switched = switcher.set_active(&away, ActorId(11)).unwrap();
        assert_eq!(switched.from, Some(P1));
        assert!(!switcher.is_active(P1));
        assert!(switcher.is_active(ActorId(11)));

        assert_eq!(
            switcher.set_active(&home, ActorId(11)),
            Err(SwitchRejection::NotInRoster { actor: ActorId(11) })
        );
        assert_eq!(switcher.active(), Some(ActorId(11)));
    }

    #[test]
    fn test_unknown_current_starts_at_first_member() {
        let roster = roster3();
        let mut switcher = RosterSwitcher::new(0.0, 0.5);
        let switched = switcher.switch_to_next(&roster, secs(0.0)).unwrap();
        assert_eq!(switched, Switched { from: None, to: P0 });
    }

    #[test]
    fn test_nearest_teammate_breaks_ties_by_roster_order() {
        let roster = roster3();
        let positions = |id: ActorId| match id.0 {
            0 => Some(Vec3::ZERO),
            1 => Some(Vec3::new(0.0, 0.0, 3.0)),
            2 => Some(Vec3::new(3.0, 0.0, 0.0)),
            _ => None,
        };
        assert_eq!(RosterSwitcher::nearest_teammate(&roster, P0, positions), Some(P1));

        let positions = |id: ActorId| match id.0 {
            0 => Some(Vec3::ZERO),
            1 => Some(Vec3::new(0.0, 0.0, 4.0)),
            2 => Some(Vec3::new(2.0, 0.0, 0.0)),
            _ => None,
        };
        let mut switcher = RosterSwitcher::default();
        assert_eq!(switcher.switch_to_nearest(&roster, P0, positions).unwrap().to, P2);
    }

    #[test]
    fn test_pass_completion_fires_at_first_step_past_delay() {
        let roster = roster3();
        let rosters = rosters(roster.clone());
        let mut switcher = RosterSwitcher::new(0.25, 0.5);
        switcher.set_active(&roster, P0).unwrap();

        let mut clock = SimClock::from_hz(64.0);
        switcher
            .switch_on_pass_completion(&roster, BallId(0), P1, clock.now(), switcher.transfer_delay())
            .unwrap();

        let mut fired_at = None;
        for _ in 0..64 {
            clock.tick();
            let fired = switcher.poll(&rosters, clock.now());
            if fired.is_empty() {
                assert_eq!(switcher.active(), Some(P0));
            } else {
                fired_at = Some(clock.step());
                break;
            }
        }

        assert_eq!(fired_at, Some(32));
        assert_eq!(switcher.active(), Some(P1));
    }

    #[test]
    fn test_multiple_pending_fire_in_deadline_order() {
        let roster = roster3();
        let rosters = rosters(roster.clone());
        let mut switcher = RosterSwitcher::default();
        switcher
            .switch_on_pass_completion(&roster, BallId(0), P1, Duration::ZERO, secs(0.5))
            .unwrap();
        switcher
            .switch_on_pass_completion(&roster, BallId(1), P2, Duration::ZERO, secs(0.25))
            .unwrap();

        let fired = switcher.poll(&rosters, secs(1.0));
        let order: Vec<_> = fired
            .iter()
            .map(|f| match f {
                SwitchFired::Activated { switched, .. } => switched.to,
                SwitchFired::Dropped(p) => p.receiver,
            })
            .collect();
        assert_eq!(order, vec![P2, P1]);
        assert_eq!(switcher.active(), Some(P1));
    }

    #[test]
    fn test_interception_cancels_pending_switch() {
        let roster = roster3();
        let rosters = rosters(roster.clone());
        let mut switcher = RosterSwitcher::default();
        switcher.set_active(&roster, P0).unwrap();
        switcher
            .switch_on_pass_completion(&roster, BallId(0), P1, Duration::ZERO, secs(0.5))
            .unwrap();

        let change = switcher.on_ball_possessed(BallId(0), ActorId(10), Team::Away);
        assert_eq!(change.cancelled.len(), 1);
        assert!(change.retargeted.is_empty());
        assert!(switcher.poll(&rosters, secs(1.0)).is_empty());
        assert_eq!(switcher.active(), Some(P0));
    }

    #[test]
    fn test_teammate_interception_moves_pending_switch() {
        let roster = roster3();
        let rosters = rosters(roster.clone());
        let mut switcher = RosterSwitcher::default();
        switcher.set_active(&roster, P0).unwrap();
        switcher
            .switch_on_pass_completion(&roster, BallId(0), P1, Duration::ZERO, secs(0.5))
            .unwrap();

        let change = switcher.on_ball_possessed(BallId(0), P2, Team::Home);
        assert!(change.cancelled.is_empty());
        assert_eq!(change.retargeted.len(), 1);
        assert_eq!(change.retargeted[0].receiver, P1);
        assert!(switcher.has_pending_for(P2));
        assert!(!switcher.has_pending_for(P1));

        // Same deadline as the original pass
        assert!(switcher.poll(&rosters, secs(0.4)).is_empty());
        assert_eq!(switcher.active(), Some(P0));
        assert_eq!(switcher.poll(&rosters, secs(0.5)).len(), 1);
        assert_eq!(switcher.active(), Some(P2));
    }

    #[test]
    fn test_receiver_catching_keeps_pending_switch() {
        let roster = roster3();
        let mut switcher = RosterSwitcher::default();
        switcher
            .switch_on_pass_completion(&roster, BallId(0), P1, Duration::ZERO, secs(0.5))
            .unwrap();
        assert_eq!(
            switcher.on_ball_possessed(BallId(0), P1, Team::Home),
            Repossession::default()
        );
        assert_eq!(switcher.pending().len(), 1);
        assert!(switcher.has_pending_for(P1));
    }

    #[test]
    fn test_receiver_leaving_cancels() {
        let roster = roster3();
        let mut rosters = rosters(roster.clone());
        let mut switcher = RosterSwitcher::default();
        switcher.set_active(&roster, P0).unwrap();
        switcher
            .switch_on_pass_completion(&roster, BallId(0), P1, Duration::ZERO, secs(0.5))
            .unwrap();

        rosters.remove_actor(P1);
        assert_eq!(switcher.on_actor_left(P1).len(), 1);
        assert!(switcher.poll(&rosters, secs(1.0)).is_empty());
        assert_eq!(switcher.active(), Some(P0));
    }

    #[test]
    fn test_stale_receiver_is_dropped_on_poll() {
        let roster = roster3();
        let mut rosters = rosters(roster.clone());
        let mut switcher = RosterSwitcher::default();
        switcher.set_active(&roster, P0).unwrap();
        switcher
            .switch_on_pass_completion(&roster, BallId(0), P2, Duration::ZERO, secs(0.5))
            .unwrap();

        // Removed without notifying the switcher
        rosters.remove_actor(P2);
        let fired = switcher.poll(&rosters, secs(0.5));
        assert!(matches!(fired.as_slice(), [SwitchFired::Dropped(_)]));
        assert_eq!(switcher.active(), Some(P0));
    }
}
