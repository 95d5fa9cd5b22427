//! Base multi-agent grid engine: owns the shared map and agents, resolves
//! movement and beams, and drives reset/step. Game rules plug in through
//! [`MapHooks`].

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::EnvConfig;
use crate::error::SwitchError;
use crate::infra::{Orientation, Position};
use crate::state::{AgentState, Cell, CellUpdate, Map};

use super::actions::Action;
use super::beam::{BeamRequest, fire_beam};
use super::render::{ColorMap, render_view};

/// Game-specific behaviour layered on the base engine.
pub trait MapHooks {
    /// Restore game cells on a freshly built map.
    fn custom_reset(&mut self, map: &mut Map);

    /// Handle an action the engine does not know. Returned updates are applied immediately.
    fn custom_action(
        &mut self,
        agent: &AgentState,
        action: Action,
        ctx: &mut ActionContext<'_>,
    ) -> Vec<CellUpdate>;

    /// Runs once per step after every agent has acted.
    fn custom_map_update(&mut self, map: &mut Map, agents: &mut [AgentState]);

    /// Called for every agent still in play with the cell it stands on after moving.
    fn consume(&mut self, _agent: &mut AgentState, cell: Cell) -> Cell {
        cell
    }
}

/// What a custom action may touch: a read-only view of the grid and the beam primitive.
pub struct ActionContext<'a> {
    map: &'a Map,
    agent_positions: &'a [Position],
    trail: &'a mut HashMap<Position, Cell>,
}

impl ActionContext<'_> {
    /// Fire a beam and return the cell updates it causes.
    pub fn fire_beam(&mut self, request: &BeamRequest) -> Vec<CellUpdate> {
        let outcome = fire_beam(self.map, self.agent_positions, request);
        for cell in outcome.trail {
            self.trail.insert(cell.pos, cell.cell);
        }
        if !outcome.hits.is_empty() {
            trace!(hits = ?outcome.hits, "Beam absorbed by agents");
        }
        outcome.updates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Packed RGB window, row-major, see `shape`.
    pub curr_obs: Vec<u8>,
    pub shape: [usize; 3],
    /// Previous action index of every other agent, in agent order.
    pub other_agent_actions: Option<Vec<u8>>,
    /// 1 for every other agent inside this agent's view window.
    pub visible_agents: Option<Vec<u8>>,
}

/// Raw engine output for one step.
#[derive(Debug, Clone)]
pub struct MapStep {
    pub observations: BTreeMap<String, Observation>,
    pub rewards: BTreeMap<String, f32>,
    pub dones: BTreeMap<String, bool>,
    /// True once any agent is done.
    pub all_done: bool,
}

pub struct MapEnv<H: MapHooks> {
    base_map: Map,
    world_map: Map,
    walls: Vec<Position>,
    spawn_points: Vec<Position>,
    floor_cells: Vec<Position>,
    agents: Vec<AgentState>,
    last_actions: Vec<Option<Action>>,
    trail: HashMap<Position, Cell>,
    hooks: H,
    colors: ColorMap,
    num_agents: usize,
    view_len: i32,
    return_agent_actions: bool,
    rng: StdRng,
}

impl<H: MapHooks> MapEnv<H> {
    pub fn new<S: AsRef<str>>(
        layout: &[S],
        hooks: H,
        config: &EnvConfig,
        colors: ColorMap,
    ) -> Result<Self, SwitchError> {
        if config.num_agents == 0 {
            return Err(SwitchError::NoAgents);
        }

        let base_map = Map::from_ascii(layout)?;
        let walls = base_map.positions_of(Cell::Wall);
        let spawn_points = base_map.positions_of(Cell::Spawn);
        let floor_cells = base_map.positions_of(Cell::Empty);

        let available = spawn_points.len() + floor_cells.len();
        if available < config.num_agents {
            return Err(SwitchError::NotEnoughSpawnPoints {
                agents: config.num_agents,
                available,
            });
        }

        Ok(Self {
            world_map: Map::new(base_map.height, base_map.width),
            base_map,
            walls,
            spawn_points,
            floor_cells,
            agents: Vec::new(),
            last_actions: Vec::new(),
            trail: HashMap::new(),
            hooks,
            colors,
            num_agents: config.num_agents,
            view_len: config.view_len,
            return_agent_actions: config.return_agent_actions,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Rebuild the world map, let the hooks restore their cells and respawn all agents.
    pub fn reset(&mut self) -> BTreeMap<String, Observation> {
        self.trail.clear();
        self.world_map.fill(Cell::Empty);
        for wall in &self.walls {
            self.world_map.insert(*wall, Cell::Wall);
        }
        self.hooks.custom_reset(&mut self.world_map);
        self.setup_agents();
        self.last_actions = vec![None; self.num_agents];

        self.observations()
    }

    fn setup_agents(&mut self) {
        // Spawn markers first, then any free floor when there are more agents than markers
        let mut spawns = self.spawn_points.clone();
        spawns.shuffle(&mut self.rng);
        let mut floor = self.floor_cells.clone();
        floor.shuffle(&mut self.rng);

        self.agents = spawns
            .into_iter()
            .chain(floor)
            .take(self.num_agents)
            .enumerate()
            .map(|(i, pos)| {
                let turn = self.rng.random_range(0..Orientation::ALL.len());
                let orientation = Orientation::ALL[turn];
                AgentState::new(format!("agent-{}", i), pos, orientation, self.view_len)
            })
            .collect();

        for agent in &self.agents {
            debug!(
                "Spawned {} at ({}, {}) facing {:?}",
                agent.id, agent.position.row, agent.position.col, agent.orientation
            );
        }
    }

    /// Advance one timestep. Agents missing from `actions` stay in place.
    pub fn step(&mut self, actions: &[(String, Action)]) -> Result<MapStep, SwitchError> {
        if self.agents.is_empty() {
            return Err(SwitchError::NotReset);
        }

        let mut chosen: Vec<Option<Action>> = vec![None; self.agents.len()];
        let mut order = Vec::with_capacity(actions.len());
        for (id, action) in actions {
            let index = self
                .agent_index(id)
                .ok_or_else(|| SwitchError::UnknownAgent(id.clone()))?;
            if chosen[index].is_none() {
                order.push(index);
            }
            chosen[index] = Some(*action);
        }

        self.trail.clear();
        self.update_moves(&chosen);

        for agent in self.agents.iter_mut().filter(|a| !a.is_done) {
            if let Some(cell) = self.world_map.get(&agent.position) {
                let new_cell = self.hooks.consume(agent, cell);
                if new_cell != cell {
                    self.world_map.insert(agent.position, new_cell);
                }
            }
        }

        self.update_custom_moves(&chosen, &order);
        self.hooks
            .custom_map_update(&mut self.world_map, &mut self.agents);
        self.last_actions = chosen;

        let observations = self.observations();
        let rewards = self
            .agents
            .iter_mut()
            .map(|a| (a.id.clone(), a.compute_reward()))
            .collect();
        let dones: BTreeMap<String, bool> =
            self.agents.iter().map(|a| (a.id.clone(), a.is_done)).collect();
        let all_done = dones.values().any(|&d| d);

        Ok(MapStep {
            observations,
            rewards,
            dones,
            all_done,
        })
    }

    /// Apply turns, then resolve all moves simultaneously.
    fn update_moves(&mut self, chosen: &[Option<Action>]) {
        let current: Vec<Position> = self.agents.iter().map(|a| a.position).collect();
        let mut targets = current.clone();

        for (i, agent) in self.agents.iter_mut().enumerate() {
            match chosen[i] {
                Some(Action::TurnClockwise) => agent.orientation = agent.orientation.clockwise(),
                Some(Action::TurnCounterclockwise) => {
                    agent.orientation = agent.orientation.counterclockwise()
                }
                Some(action) => {
                    if let Some(vector) = action.move_vector() {
                        let target = agent.position.offset(agent.orientation.rotate(vector));
                        if self
                            .world_map
                            .get(&target)
                            .is_some_and(|cell| cell.is_walkable())
                        {
                            targets[i] = target;
                        }
                    }
                }
                None => {}
            }
        }

        resolve_conflicts(&current, &mut targets);

        for (agent, target) in self.agents.iter_mut().zip(targets) {
            agent.position = target;
        }
    }

    fn update_custom_moves(&mut self, chosen: &[Option<Action>], order: &[usize]) {
        for &index in order {
            let Some(action) = chosen[index].filter(|a| a.is_custom()) else {
                continue;
            };

            let positions: Vec<Position> = self.agents.iter().map(|a| a.position).collect();
            let mut ctx = ActionContext {
                map: &self.world_map,
                agent_positions: &positions,
                trail: &mut self.trail,
            };
            let updates = self
                .hooks
                .custom_action(&self.agents[index], action, &mut ctx);
            if !updates.is_empty() {
                self.world_map.update_map(&updates);
            }
        }
    }

    fn observations(&self) -> BTreeMap<String, Observation> {
        let positions: Vec<Position> = self.agents.iter().map(|a| a.position).collect();
        let side = (2 * self.view_len + 1) as usize;

        self.agents
            .iter()
            .enumerate()
            .map(|(i, agent)| {
                let curr_obs = render_view(
                    &self.world_map,
                    &self.trail,
                    &positions,
                    agent.position,
                    agent.view_len,
                    &self.colors,
                );

                let (other_agent_actions, visible_agents) = if self.return_agent_actions {
                    let others = (0..self.agents.len()).filter(|&j| j != i);
                    let actions = others
                        .clone()
                        .map(|j| self.last_actions[j].unwrap_or(Action::Stay).index())
                        .collect();
                    let visible = others
                        .map(|j| u8::from(agent.can_see(&positions[j])))
                        .collect();
                    (Some(actions), Some(visible))
                } else {
                    (None, None)
                };

                let observation = Observation {
                    curr_obs,
                    shape: [side, side, 3],
                    other_agent_actions,
                    visible_agents,
                };
                (agent.id.clone(), observation)
            })
            .collect()
    }

    pub fn agent_index(&self, id: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.id == id)
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    /// Place an agent directly, bypassing movement rules. Meant for scripted setups.
    pub fn place_agent(
        &mut self,
        id: &str,
        position: Position,
        orientation: Orientation,
    ) -> Result<(), SwitchError> {
        self.place_agents(&[(id, position, orientation)])
    }

    /// Place several agents at once. Targets must be walkable and no two agents
    /// may end up sharing a cell. Nothing moves if any placement is rejected.
    pub fn place_agents(
        &mut self,
        placements: &[(&str, Position, Orientation)],
    ) -> Result<(), SwitchError> {
        let mut positions: Vec<Position> = self.agents.iter().map(|a| a.position).collect();
        let mut moves = Vec::with_capacity(placements.len());
        for &(id, position, orientation) in placements {
            let index = self
                .agent_index(id)
                .ok_or_else(|| SwitchError::UnknownAgent(id.to_string()))?;
            if !self.world_map.get(&position).is_some_and(|c| c.is_walkable()) {
                return Err(SwitchError::BlockedCell { pos: position });
            }
            positions[index] = position;
            moves.push((index, position, orientation));
        }

        for (i, pos) in positions.iter().enumerate() {
            if positions[..i].contains(pos) {
                return Err(SwitchError::CellOccupied { pos: *pos });
            }
        }

        for (index, position, orientation) in moves {
            let agent = &mut self.agents[index];
            agent.position = position;
            agent.orientation = orientation;
        }
        Ok(())
    }

    pub fn world_map(&self) -> &Map {
        &self.world_map
    }

    /// Direct grid access for external edits between steps.
    pub fn world_map_mut(&mut self) -> &mut Map {
        &mut self.world_map
    }

    pub fn base_map(&self) -> &Map {
        &self.base_map
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn colors(&self) -> &ColorMap {
        &self.colors
    }

    pub fn num_agents(&self) -> usize {
        self.num_agents
    }

    pub fn view_len(&self) -> i32 {
        self.view_len
    }

    /// World map with beams and agents (drawn as their index digit).
    pub fn draw_ascii_map(&self) -> String {
        let overlay: Vec<(Position, char)> = self
            .trail
            .iter()
            .map(|(pos, cell)| (*pos, cell.symbol()))
            .chain(self.agents.iter().enumerate().map(|(i, a)| {
                let digit = char::from_digit((i % 10) as u32, 10).unwrap_or('?');
                (a.position, digit)
            }))
            .collect();
        self.world_map.draw_ascii(&overlay)
    }
}

/// Cancel moves until no two agents share a cell and no pair swaps places.
/// The earlier agent wins a contested cell.
fn resolve_conflicts(current: &[Position], targets: &mut [Position]) {
    loop {
        let mut changed = false;
        for i in 0..targets.len() {
            if targets[i] == current[i] {
                continue;
            }
            let blocked = (0..targets.len()).any(|j| {
                j != i
                    && ((targets[j] == targets[i] && (j < i || targets[j] == current[j]))
                        || (targets[j] == current[i] && current[j] == targets[i]))
            });
            if blocked {
                targets[i] = current[i];
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}
