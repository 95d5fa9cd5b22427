//! The switch/door rule: every door opens only while every switch is on.

use serde::Serialize;
use tracing::{debug, trace};

use crate::state::{AgentState, Cell, CellUpdate, Map};

use super::registry::SwitchRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoordinationState {
    Unsolved,
    Solved,
}

impl CoordinationState {
    pub fn door_cell(self) -> Cell {
        match self {
            CoordinationState::Unsolved => Cell::DoorClosed,
            CoordinationState::Solved => Cell::DoorOpen,
        }
    }
}

/// Outcome of one coordination pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinationUpdate {
    pub activated: usize,
    /// Change in activated switches since the previous step.
    pub delta: i64,
    pub state: CoordinationState,
    /// Reward added to every agent this step.
    pub shared_reward: f32,
}

#[derive(Debug, Clone)]
pub struct Coordinator {
    previous_activated: usize,
    external_switch_reward: bool,
}

impl Coordinator {
    pub fn new(external_switch_reward: bool) -> Self {
        Self {
            previous_activated: 0,
            external_switch_reward,
        }
    }

    pub fn reset(&mut self) {
        self.previous_activated = 0;
    }

    pub fn previous_activated(&self) -> usize {
        self.previous_activated
    }

    /// Count switches currently on, scanning only registered switch cells.
    pub fn count_activated(registry: &SwitchRegistry, map: &Map) -> usize {
        registry
            .switch_locations()
            .iter()
            .filter(|pos| map.get(pos) == Some(Cell::SwitchOn))
            .count()
    }

    /// Recompute activation from the grid, pay the shared reward and set every door.
    pub fn update(
        &mut self,
        registry: &SwitchRegistry,
        map: &mut Map,
        agents: &mut [AgentState],
    ) -> CoordinationUpdate {
        let activated = Self::count_activated(registry, map);
        let delta = activated as i64 - self.previous_activated as i64;
        let shared_reward = if self.external_switch_reward {
            delta as f32
        } else {
            0.0
        };

        for agent in agents.iter_mut() {
            agent.reward_this_turn += shared_reward;
        }

        let state = if activated == registry.switch_count() {
            CoordinationState::Solved
        } else {
            CoordinationState::Unsolved
        };
        let door_cell = state.door_cell();
        let updates: Vec<CellUpdate> = registry
            .door_locations()
            .iter()
            .map(|&pos| CellUpdate::new(pos, door_cell))
            .collect();
        map.update_map(&updates);

        if delta != 0 {
            debug!(
                "Switches on: {} -> {} of {} ({:?})",
                self.previous_activated,
                activated,
                registry.switch_count(),
                state
            );
        } else {
            trace!(activated, ?state, "Switch state unchanged");
        }

        self.previous_activated = activated;

        CoordinationUpdate {
            activated,
            delta,
            state,
            shared_reward,
        }
    }
}
