//! Team rosters

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::player::{ActorId, Team};

/// Roster construction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterError {
    Empty,
    Duplicate(ActorId),
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::Empty => write!(f, "roster is empty"),
            RosterError::Duplicate(id) => write!(f, "{} listed twice", id),
        }
    }
}

/// Ordered team members. Declaration order is switch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    team: Team,
    members: Vec<ActorId>,
}

impl Roster {
    pub fn new(team: Team, members: Vec<ActorId>) -> Result<Self, RosterError> {
        if members.is_empty() {
            return Err(RosterError::Empty);
        }
        for (i, id) in members.iter().enumerate() {
            if members[..i].contains(id) {
                return Err(RosterError::Duplicate(*id));
            }
        }
        Ok(Self { team, members })
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn members(&self) -> &[ActorId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.members.contains(&actor)
    }

    pub fn index_of(&self, actor: ActorId) -> Option<usize> {
        self.members.iter().position(|&m| m == actor)
    }

    /// Member after `current`, wrapping. A missing or unknown current
    /// yields the first member.
    pub fn next_after(&self, current: Option<ActorId>) -> Option<ActorId> {
        if self.members.is_empty() {
            return None;
        }
        let next = match current.and_then(|c| self.index_of(c)) {
            Some(i) => (i + 1) % self.members.len(),
            None => 0,
        };
        Some(self.members[next])
    }

    /// Drop a member; returns false if it was not in the roster.
    /// A roster may become empty this way; switching then reports it.
    pub fn remove(&mut self, actor: ActorId) -> bool {
        let before = self.members.len();
        self.members.retain(|&m| m != actor);
        self.members.len() != before
    }
}

/// All rosters of the match, keyed by team
#[derive(Resource, Debug, Default, Clone)]
pub struct Rosters {
    teams: BTreeMap<Team, Roster>,
}

impl Rosters {
    pub fn insert(&mut self, roster: Roster) {
        self.teams.insert(roster.team(), roster);
    }

    pub fn get(&self, team: Team) -> Option<&Roster> {
        self.teams.get(&team)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Roster> {
        self.teams.values()
    }

    pub fn team_of(&self, actor: ActorId) -> Option<Team> {
        self.teams
            .values()
            .find(|r| r.contains(actor))
            .map(|r| r.team())
    }

    /// Deterministic tie-break key: team, then roster index
    pub fn order_key(&self, actor: ActorId) -> (Team, usize, ActorId) {
        for roster in self.teams.values() {
            if let Some(i) = roster.index_of(actor) {
                return (roster.team(), i, actor);
            }
        }
        // Unrostered actors sort last, by id
        (Team::Away, usize::MAX, actor)
    }

    /// Remove an actor from whichever roster holds it
    pub fn remove_actor(&mut self, actor: ActorId) -> bool {
        self.teams.values_mut().any(|r| r.remove(actor))
    }
}
