//! Opponent lookup.
//!
//! Agents never hold references to each other. Each agent remembers only the
//! [`AgentId`] of its opponent and reads a copied [`OpponentSnapshot`] at the
//! start of its tick, so cross-agent reads never observe a half-updated body.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::body::Pose;
use crate::geometry::AgentId;
use crate::math::UP;

/// Read-only copy of another agent's body state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpponentSnapshot {
    /// Opponent id.
    pub id: AgentId,
    /// Opponent pose at snapshot time.
    pub pose: Pose,
    /// Opponent eye height above its feet.
    pub eye_height: f32,
    /// Whether the opponent is alive.
    pub alive: bool,
}

impl OpponentSnapshot {
    /// Live snapshot.
    #[must_use]
    pub const fn new(id: AgentId, pose: Pose, eye_height: f32) -> Self {
        Self {
            id,
            pose,
            eye_height,
            alive: true,
        }
    }

    /// Opponent eye position.
    #[must_use]
    pub fn eye_point(&self) -> Vec3 {
        self.pose.position + UP * self.eye_height
    }
}

/// Source of opponent identities and snapshots.
pub trait Roster {
    /// Opponent of `requester`, if one is currently registered.
    fn resolve_opponent(&self, requester: AgentId) -> Option<AgentId>;

    /// Current snapshot of `id`, or `None` if it is gone.
    fn snapshot(&self, id: AgentId) -> Option<OpponentSnapshot>;
}

/// A roster with nobody in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRoster;

impl Roster for EmptyRoster {
    fn resolve_opponent(&self, _requester: AgentId) -> Option<AgentId> {
        None
    }

    fn snapshot(&self, _id: AgentId) -> Option<OpponentSnapshot> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    team: u8,
    snapshot: OpponentSnapshot,
}

/// Team-keyed registry.
///
/// An agent's opponent is the lowest-id live agent registered on a different
/// team. Iteration is in id order, so resolution is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleRegistry {
    entries: BTreeMap<AgentId, Entry>,
}

impl RoleRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an agent.
    pub fn register(&mut self, team: u8, snapshot: OpponentSnapshot) {
        self.entries.insert(snapshot.id, Entry { team, snapshot });
    }

    /// Refresh the published snapshot of an already registered agent.
    ///
    /// Returns `false` if the agent is unknown.
    pub fn publish(&mut self, snapshot: OpponentSnapshot) -> bool {
        match self.entries.get_mut(&snapshot.id) {
            Some(entry) => {
                entry.snapshot = snapshot;
                true
            }
            None => false,
        }
    }

    /// Remove an agent.
    pub fn remove(&mut self, id: AgentId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no agents are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Roster for RoleRegistry {
    fn resolve_opponent(&self, requester: AgentId) -> Option<AgentId> {
        let team = self.entries.get(&requester)?.team;
        self.entries
            .iter()
            .find(|(id, entry)| **id != requester && entry.team != team && entry.snapshot.alive)
            .map(|(id, _)| *id)
    }

    fn snapshot(&self, id: AgentId) -> Option<OpponentSnapshot> {
        self.entries
            .get(&id)
            .map(|e| e.snapshot)
            .filter(|s| s.alive)
    }
}
