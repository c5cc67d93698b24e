//! Combat event sink.
//!
//! Anything outside the agent that reacts to combat (projectile spawning,
//! scoreboards, audio, telemetry) listens through [`CombatEventSink`]. Every
//! method has an empty default, so a sink only implements what it needs and
//! [`NullSink`] is a complete implementation.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::AgentId;
use crate::state_machine::CombatState;

/// Request to launch a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireCommand {
    /// Muzzle position.
    pub origin: Vec3,
    /// Unit launch direction.
    pub direction: Vec3,
    /// Launch speed.
    pub speed: f32,
}

/// Combat notifications emitted by an agent.
pub trait CombatEventSink {
    /// The agent fired; the host should spawn a projectile.
    fn on_shot_fired(&mut self, _agent: AgentId, _shot: &FireCommand) {}

    /// The agent started a dash.
    fn on_dash(&mut self, _agent: AgentId) {}

    /// The agent was struck.
    fn on_hit(&mut self, _agent: AgentId) {}

    /// The agent's projectile struck its opponent.
    fn on_hit_landed(&mut self, _agent: AgentId) {}

    /// A projectile passed the agent without hitting.
    fn on_dodge(&mut self, _agent: AgentId) {}

    /// The agent was reset to its spawn pose.
    fn on_respawn(&mut self, _agent: AgentId) {}

    /// The combat state machine switched state.
    fn on_state_changed(&mut self, _agent: AgentId, _from: CombatState, _to: CombatState) {}
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl CombatEventSink for NullSink {}

/// Recorded combat notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// See [`CombatEventSink::on_shot_fired`].
    ShotFired {
        /// Shooter.
        agent: AgentId,
        /// Launch parameters.
        shot: FireCommand,
    },
    /// See [`CombatEventSink::on_dash`].
    Dash {
        /// Dashing agent.
        agent: AgentId,
    },
    /// See [`CombatEventSink::on_hit`].
    Hit {
        /// Struck agent.
        agent: AgentId,
    },
    /// See [`CombatEventSink::on_hit_landed`].
    HitLanded {
        /// Shooter.
        agent: AgentId,
    },
    /// See [`CombatEventSink::on_dodge`].
    Dodge {
        /// Dodging agent.
        agent: AgentId,
    },
    /// See [`CombatEventSink::on_respawn`].
    Respawn {
        /// Respawned agent.
        agent: AgentId,
    },
    /// See [`CombatEventSink::on_state_changed`].
    StateChanged {
        /// Agent.
        agent: AgentId,
        /// Previous state.
        from: CombatState,
        /// New state.
        to: CombatState,
    },
}

/// Sink that records events until drained.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<CombatEvent>,
}

impl EventLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Take every recorded event.
    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Shots recorded so far.
    pub fn shots(&self) -> impl Iterator<Item = &FireCommand> {
        self.events.iter().filter_map(|e| match e {
            CombatEvent::ShotFired { shot, .. } => Some(shot),
            _ => None,
        })
    }
}

impl CombatEventSink for EventLog {
    fn on_shot_fired(&mut self, agent: AgentId, shot: &FireCommand) {
        self.events.push(CombatEvent::ShotFired { agent, shot: *shot });
    }

    fn on_dash(&mut self, agent: AgentId) {
        self.events.push(CombatEvent::Dash { agent });
    }

    fn on_hit(&mut self, agent: AgentId) {
        self.events.push(CombatEvent::Hit { agent });
    }

    fn on_hit_landed(&mut self, agent: AgentId) {
        self.events.push(CombatEvent::HitLanded { agent });
    }

    fn on_dodge(&mut self, agent: AgentId) {
        self.events.push(CombatEvent::Dodge { agent });
    }

    fn on_respawn(&mut self, agent: AgentId) {
        self.events.push(CombatEvent::Respawn { agent });
    }

    fn on_state_changed(&mut self, agent: AgentId, from: CombatState, to: CombatState) {
        self.events.push(CombatEvent::StateChanged { agent, from, to });
    }
}

impl<T: CombatEventSink + ?Sized> CombatEventSink for &mut T {
    fn on_shot_fired(&mut self, agent: AgentId, shot: &FireCommand) {
        (**self).on_shot_fired(agent, shot);
    }

    fn on_dash(&mut self, agent: AgentId) {
        (**self).on_dash(agent);
    }

    fn on_hit(&mut self, agent: AgentId) {
        (**self).on_hit(agent);
    }

    fn on_hit_landed(&mut self, agent: AgentId) {
        (**self).on_hit_landed(agent);
    }

    fn on_dodge(&mut self, agent: AgentId) {
        (**self).on_dodge(agent);
    }

    fn on_respawn(&mut self, agent: AgentId) {
        (**self).on_respawn(agent);
    }

    fn on_state_changed(&mut self, agent: AgentId, from: CombatState, to: CombatState) {
        (**self).on_state_changed(agent, from, to);
    }
}
