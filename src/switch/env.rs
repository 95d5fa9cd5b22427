//! The switch game: the base engine with switch/door rules plugged in.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::EnvConfig;
use crate::engine::spaces::{BoxSpace, Discrete, DictSpace};
use crate::engine::{
    Action, ActionContext, ColorMap, MapEnv, MapHooks, NUM_ACTIONS, Observation, Rgb,
};
use crate::error::SwitchError;
use crate::infra::{Orientation, Position};
use crate::state::{AgentState, Cell, CellUpdate, Map};

use super::coordination::{CoordinationUpdate, Coordinator};
use super::map_gen::construct_map;
use super::metrics::EpisodeMetrics;
use super::registry::SwitchRegistry;
use super::translator::toggle_switch;

pub const SWITCH_COLORS: [(Cell, Rgb); 4] = [
    (Cell::DoorClosed, [180, 180, 180]),
    (Cell::DoorOpen, [255, 255, 255]),
    (Cell::SwitchOn, [0, 255, 0]),
    (Cell::SwitchOff, [255, 0, 0]),
];

/// Switch rules, state machine and episode bookkeeping, driven by the engine hooks.
#[derive(Debug, Clone)]
pub struct SwitchCore {
    registry: SwitchRegistry,
    coordinator: Coordinator,
    metrics: EpisodeMetrics,
    timestep: u64,
    door_reward: f32,
    last_update: Option<CoordinationUpdate>,
}

impl SwitchCore {
    pub fn new(registry: SwitchRegistry, config: &EnvConfig) -> Self {
        Self {
            registry,
            coordinator: Coordinator::new(config.external_switch_reward),
            metrics: EpisodeMetrics::default(),
            timestep: 0,
            door_reward: config.door_reward,
            last_update: None,
        }
    }

    pub fn registry(&self) -> &SwitchRegistry {
        &self.registry
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn metrics(&self) -> &EpisodeMetrics {
        &self.metrics
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    /// Coordination result of the latest step, `None` right after reset.
    pub fn last_update(&self) -> Option<&CoordinationUpdate> {
        self.last_update.as_ref()
    }
}

impl MapHooks for SwitchCore {
    fn custom_reset(&mut self, map: &mut Map) {
        self.registry.restore(map);
        self.coordinator.reset();
        self.metrics = EpisodeMetrics::default();
        self.timestep = 0;
        self.last_update = None;
    }

    fn custom_action(
        &mut self,
        agent: &AgentState,
        action: Action,
        ctx: &mut ActionContext<'_>,
    ) -> Vec<CellUpdate> {
        match action {
            Action::ToggleSwitch => toggle_switch(agent, ctx),
            _ => Vec::new(),
        }
    }

    fn custom_map_update(&mut self, map: &mut Map, agents: &mut [AgentState]) {
        let update = self.coordinator.update(&self.registry, map, agents);
        self.metrics.record_transition(self.timestep, &update);
        self.last_update = Some(update);
    }

    fn consume(&mut self, agent: &mut AgentState, cell: Cell) -> Cell {
        if cell == Cell::DoorOpen {
            agent.reward_this_turn += self.door_reward;
            agent.is_done = true;
            debug!(
                "{} walked through the door at ({}, {})",
                agent.id, agent.position.row, agent.position.col
            );
        }
        cell
    }
}

/// Result of one switch game step.
#[derive(Debug, Clone)]
pub struct SwitchStep {
    pub observations: BTreeMap<String, Observation>,
    pub rewards: BTreeMap<String, f32>,
    pub dones: BTreeMap<String, bool>,
    pub all_done: bool,
    /// Episode metrics so far, keyed by the first agent in the submitted actions.
    pub infos: BTreeMap<String, EpisodeMetrics>,
}

pub struct SwitchEnv {
    inner: MapEnv<SwitchCore>,
    return_agent_actions: bool,
}

impl SwitchEnv {
    /// Environment on a generated map with `config.num_switches` switches.
    pub fn new(config: &EnvConfig) -> Result<Self, SwitchError> {
        let layout = construct_map(config.num_switches)?;
        Self::with_layout(&layout, config)
    }

    /// Environment on a hand-written layout. Switches and doors are taken from the layout.
    pub fn with_layout<S: AsRef<str>>(
        layout: &[S],
        config: &EnvConfig,
    ) -> Result<Self, SwitchError> {
        let mut colors = ColorMap::default();
        colors.update(SWITCH_COLORS);

        let core = SwitchCore::new(SwitchRegistry::default(), config);
        let mut inner = MapEnv::new(layout, core, config, colors)?;
        let registry = SwitchRegistry::scan(inner.base_map());
        inner.hooks_mut().registry = registry;

        info!(
            "Switch environment ready: {}x{} map, {} switches, {} doors, {} agents",
            inner.base_map().height,
            inner.base_map().width,
            inner.hooks().registry.switch_count(),
            inner.hooks().registry.door_locations().len(),
            config.num_agents
        );

        Ok(Self {
            inner,
            return_agent_actions: config.return_agent_actions,
        })
    }

    pub fn reset(&mut self) -> BTreeMap<String, Observation> {
        self.inner.reset()
    }

    /// Advance one timestep. The first entry of `actions` decides who receives
    /// the episode info and whose reward counts towards `total_successes`.
    pub fn step(&mut self, actions: &[(String, Action)]) -> Result<SwitchStep, SwitchError> {
        let step = self.inner.step(actions)?;

        let mut infos = BTreeMap::new();
        if let Some((first_agent, _)) = actions.first() {
            let reward = step.rewards.get(first_agent).copied().unwrap_or_default();
            let core = self.inner.hooks_mut();
            core.metrics.record_reward(reward);
            infos.insert(first_agent.clone(), core.metrics.clone());
        }
        self.inner.hooks_mut().timestep += 1;

        Ok(SwitchStep {
            observations: step.observations,
            rewards: step.rewards,
            dones: step.dones,
            all_done: step.all_done,
            infos,
        })
    }

    /// Like [`SwitchEnv::step`] but with raw action indices.
    pub fn step_indices(&mut self, actions: &[(String, u8)]) -> Result<SwitchStep, SwitchError> {
        let actions = actions
            .iter()
            .map(|(id, index)| Ok((id.clone(), Action::try_from(*index)?)))
            .collect::<Result<Vec<_>, SwitchError>>()?;
        self.step(&actions)
    }

    pub fn action_space(&self) -> Discrete {
        Discrete { n: NUM_ACTIONS }
    }

    pub fn observation_space(&self) -> DictSpace {
        let side = (2 * self.inner.view_len() + 1) as usize;
        let space = DictSpace::default().with("curr_obs", BoxSpace::new(0, 255, vec![side, side, 3]));
        if !self.return_agent_actions {
            return space;
        }

        let others = self.inner.num_agents() - 1;
        let max_agents = u8::try_from(self.inner.num_agents()).unwrap_or(u8::MAX);
        space
            .with(
                "other_agent_actions",
                BoxSpace::new(0, NUM_ACTIONS as u8, vec![others]),
            )
            .with("visible_agents", BoxSpace::new(0, max_agents, vec![others]))
    }

    pub fn core(&self) -> &SwitchCore {
        self.inner.hooks()
    }

    pub fn agents(&self) -> &[AgentState] {
        self.inner.agents()
    }

    pub fn agent_ids(&self) -> Vec<String> {
        self.inner.agents().iter().map(|a| a.id.clone()).collect()
    }

    pub fn world_map(&self) -> &Map {
        self.inner.world_map()
    }

    /// Direct grid access; the next step recounts switches from whatever is here.
    pub fn world_map_mut(&mut self) -> &mut Map {
        self.inner.world_map_mut()
    }

    pub fn place_agent(
        &mut self,
        id: &str,
        position: Position,
        orientation: Orientation,
    ) -> Result<(), SwitchError> {
        self.inner.place_agent(id, position, orientation)
    }

    pub fn place_agents(
        &mut self,
        placements: &[(&str, Position, Orientation)],
    ) -> Result<(), SwitchError> {
        self.inner.place_agents(placements)
    }

    pub fn colors(&self) -> &ColorMap {
        self.inner.colors()
    }

    pub fn draw_ascii_map(&self) -> String {
        self.inner.draw_ascii_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{Policy, RandomPolicy};
    use crate::switch::coordination::CoordinationState;
    use crate::switch::metrics::{LastInfoSource, on_episode_end};

    fn env(num_switches: usize, num_agents: usize) -> SwitchEnv {
        let config = EnvConfig {
            num_switches,
            num_agents,
            ..EnvConfig::default()
        };
        let mut env = SwitchEnv::new(&config).unwrap();
        env.reset();
        env
    }

    fn act(id: &str, action: Action) -> (String, Action) {
        (id.to_string(), action)
    }

    fn doors(env: &SwitchEnv) -> Vec<Cell> {
        env.core()
            .registry()
            .door_locations()
            .iter()
            .filter_map(|pos| env.world_map().get(pos))
            .collect()
    }

    fn activated(env: &SwitchEnv) -> usize {
        env.core().last_update().map(|u| u.activated).unwrap_or_default()
    }

    #[test]
    fn test_two_agents_solve_in_one_step() {
        let mut env = env(2, 2);
        env.place_agents(&[
            ("agent-0", Position::new(1, 2), Orientation::Left),
            ("agent-1", Position::new(1, 4), Orientation::Right),
        ])
        .unwrap();

        let step = env
            .step(&[
                act("agent-0", Action::ToggleSwitch),
                act("agent-1", Action::ToggleSwitch),
            ])
            .unwrap();

        assert_eq!(activated(&env), 2);
        assert_eq!(doors(&env), vec![Cell::DoorOpen]);
        let info = &step.infos["agent-0"];
        assert_eq!(info.total_pulled_on, 2);
        assert_eq!(info.total_pulled_off, 0);
        assert_eq!(info.timestep_first_switch_pull, Some(0));
        assert_eq!(info.timestep_last_switch_pull, Some(0));
        assert_eq!(info.switches_on_at_termination, 2);
        assert!(!step.infos.contains_key("agent-1"));
    }

    #[test]
    fn test_toggle_sequence_never_opens_doors() {
        let mut env = env(3, 1);
        let sequence = [
            (Position::new(1, 2), Orientation::Left, 1),
            (Position::new(2, 2), Orientation::Left, 2),
            (Position::new(1, 2), Orientation::Left, 1),
        ];

        for (position, orientation, expected) in sequence {
            env.place_agent("agent-0", position, orientation).unwrap();
            env.step(&[act("agent-0", Action::ToggleSwitch)]).unwrap();
            assert_eq!(activated(&env), expected);
            assert!(doors(&env).iter().all(|&c| c == Cell::DoorClosed));
        }

        let metrics = env.core().metrics();
        assert_eq!(metrics.total_pulled_on, 2);
        assert_eq!(metrics.total_pulled_off, 1);
        assert_eq!(metrics.timestep_first_switch_pull, Some(0));
        assert_eq!(metrics.timestep_last_switch_pull, Some(2));
        assert_eq!(metrics.switches_on_at_termination, 1);
    }

    #[test]
    fn test_zero_switches() {
        let mut env = env(0, 1);
        assert_eq!(env.core().registry().switch_count(), 0);
        assert!(env.core().registry().door_locations().is_empty());

        let before = env.world_map().clone();
        for _ in 0..3 {
            env.step(&[act("agent-0", Action::Stay)]).unwrap();
            let update = env.core().last_update().unwrap();
            assert_eq!(update.activated, 0);
            assert_eq!(update.state, CoordinationState::Solved);
        }
        assert_eq!(env.world_map(), &before);
        assert_eq!(env.core().metrics().timestep_first_switch_pull, None);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut env = env(2, 2);
        let fresh = env.world_map().clone();

        env.place_agents(&[
            ("agent-0", Position::new(1, 2), Orientation::Left),
            ("agent-1", Position::new(1, 4), Orientation::Up),
        ])
        .unwrap();
        env.step(&[act("agent-0", Action::ToggleSwitch)]).unwrap();
        assert_ne!(env.world_map(), &fresh);

        env.reset();
        let first = env.world_map().clone();
        env.reset();
        assert_eq!(env.world_map(), &first);
        assert_eq!(env.world_map(), &fresh);
        assert_eq!(env.core().metrics(), &EpisodeMetrics::default());
        assert_eq!(env.core().coordinator().previous_activated(), 0);
        assert_eq!(env.core().timestep(), 0);
        assert!(env.core().last_update().is_none());
    }

    #[test]
    fn test_same_switch_toggled_twice_cancels() {
        let mut env = env(3, 2);
        // Agents may stand on switches
        env.place_agents(&[
            ("agent-0", Position::new(1, 2), Orientation::Left),
            ("agent-1", Position::new(2, 1), Orientation::Up),
        ])
        .unwrap();

        env.step(&[
            act("agent-0", Action::ToggleSwitch),
            act("agent-1", Action::ToggleSwitch),
        ])
        .unwrap();

        assert_eq!(env.world_map().get(&Position::new(1, 1)), Some(Cell::SwitchOff));
        assert_eq!(activated(&env), 0);
        assert_eq!(env.core().metrics().timestep_first_switch_pull, None);
    }

    #[test]
    fn test_open_door_rewards_and_ends_episode() {
        let mut env = env(2, 2);
        env.place_agents(&[
            ("agent-0", Position::new(1, 2), Orientation::Left),
            ("agent-1", Position::new(1, 4), Orientation::Right),
        ])
        .unwrap();
        env.step(&[
            act("agent-0", Action::ToggleSwitch),
            act("agent-1", Action::ToggleSwitch),
        ])
        .unwrap();

        // Step over the switch, then through the door
        let step = env.step(&[act("agent-1", Action::MoveUp)]).unwrap();
        assert_eq!(env.agents()[1].position, Position::new(1, 5));
        assert!(!step.all_done);

        let step = env
            .step(&[act("agent-1", Action::MoveUp), act("agent-0", Action::Stay)])
            .unwrap();
        assert_eq!(env.agents()[1].position, Position::new(1, 6));
        assert_eq!(step.rewards["agent-1"], 1.0);
        assert_eq!(step.rewards["agent-0"], 0.0);
        assert!(step.dones["agent-1"]);
        assert!(!step.dones["agent-0"]);
        assert!(step.all_done);
        assert_eq!(step.infos["agent-1"].total_successes, 1);
    }

    #[test]
    fn test_closed_door_blocks() {
        let mut env = env(2, 1);
        env.place_agent("agent-0", Position::new(1, 5), Orientation::Right)
            .unwrap();
        let step = env.step(&[act("agent-0", Action::MoveUp)]).unwrap();
        assert_eq!(env.agents()[0].position, Position::new(1, 5));
        assert!(!step.all_done);
    }

    #[test]
    fn test_external_reward_tracks_delta() {
        let config = EnvConfig {
            num_switches: 2,
            num_agents: 2,
            external_switch_reward: true,
            ..EnvConfig::default()
        };
        let mut env = SwitchEnv::new(&config).unwrap();
        env.reset();
        env.place_agents(&[
            ("agent-0", Position::new(1, 2), Orientation::Left),
            ("agent-1", Position::new(1, 4), Orientation::Right),
        ])
        .unwrap();

        let step = env.step(&[act("agent-0", Action::ToggleSwitch)]).unwrap();
        assert_eq!(step.rewards["agent-0"], 1.0);
        assert_eq!(step.rewards["agent-1"], 1.0);
        assert_eq!(step.infos["agent-0"].total_successes, 1);

        let step = env.step(&[act("agent-0", Action::ToggleSwitch)]).unwrap();
        assert_eq!(step.rewards["agent-1"], -1.0);
        assert_eq!(step.infos["agent-0"].total_successes, 1);
    }

    #[test]
    fn test_external_edit_is_picked_up() {
        let mut env = env(2, 1);
        let switches = env.core().registry().switch_locations().to_vec();
        for pos in &switches {
            env.world_map_mut().insert(*pos, Cell::SwitchOn);
        }
        let step = env.step(&[act("agent-0", Action::Stay)]).unwrap();
        assert_eq!(doors(&env), vec![Cell::DoorOpen]);
        assert_eq!(step.infos["agent-0"].total_pulled_on, 2);
    }

    #[test]
    fn test_episode_end_hook_reads_last_info() {
        let mut env = env(2, 2);
        env.place_agents(&[
            ("agent-0", Position::new(1, 2), Orientation::Left),
            ("agent-1", Position::new(1, 4), Orientation::Up),
        ])
        .unwrap();
        let mut last_info: BTreeMap<String, EpisodeMetrics> = BTreeMap::new();
        for _ in 0..2 {
            let step = env.step(&[act("agent-0", Action::ToggleSwitch)]).unwrap();
            last_info.extend(step.infos);
        }
        assert!(last_info.last_info_for("agent-0").is_some());

        let custom = on_episode_end(&last_info).unwrap();
        assert_eq!(custom["total_pulled_on"], Some(1));
        assert_eq!(custom["total_pulled_off"], Some(1));
        assert_eq!(custom["timestep_first_switch_pull"], Some(0));
        assert_eq!(custom["timestep_last_switch_pull"], Some(1));
        assert_eq!(custom["switches_on_at_termination"], Some(0));
    }

    #[test]
    fn test_random_rollouts_keep_counters_consistent() {
        for num_switches in [0, 1, 2, 3, 5] {
            let mut env = env(num_switches, 3);
            let mut policy = RandomPolicy::new(num_switches as u64 + 11);

            for _episode in 0..3 {
                let mut observations = env.reset();
                let mut previous = EpisodeMetrics::default();

                for _ in 0..300 {
                    let actions = policy.act(&env, &observations);
                    let step = env.step(&actions).unwrap();
                    let metrics = env.core().metrics().clone();
                    let recount =
                        Coordinator::count_activated(env.core().registry(), env.world_map());

                    assert!(metrics.total_pulled_on >= previous.total_pulled_on);
                    assert!(metrics.total_pulled_off >= previous.total_pulled_off);
                    assert_eq!(
                        metrics.total_pulled_on - metrics.total_pulled_off,
                        recount as u64,
                        "n={} t={}",
                        num_switches,
                        env.core().timestep()
                    );
                    assert_eq!(metrics.switches_on_at_termination, recount);
                    assert_eq!(activated(&env), recount);

                    let doors = doors(&env);
                    assert!(doors.windows(2).all(|pair| pair[0] == pair[1]));
                    let expected_door = if recount == num_switches {
                        Cell::DoorOpen
                    } else {
                        Cell::DoorClosed
                    };
                    assert!(doors.iter().all(|&c| c == expected_door));

                    previous = metrics;
                    observations = step.observations;
                    if step.all_done {
                        break;
                    }
                }
            }
        }
    }

    #[test]
    fn test_invalid_action_index() {
        let mut env = env(2, 1);
        let err = env
            .step_indices(&[("agent-0".to_string(), 8)])
            .unwrap_err();
        assert!(matches!(err, SwitchError::InvalidAction(8)));

        env.step_indices(&[("agent-0".to_string(), 7)]).unwrap();
        assert_eq!(env.core().timestep(), 1);
    }

    #[test]
    fn test_spaces() {
        let env = env(2, 3);
        assert_eq!(env.action_space(), Discrete { n: 8 });
        let space = env.observation_space();
        assert_eq!(space.entries.len(), 1);
        assert_eq!(space.get("curr_obs").unwrap().shape, vec![7, 7, 3]);

        let config = EnvConfig {
            num_agents: 3,
            return_agent_actions: true,
            ..EnvConfig::default()
        };
        let space = SwitchEnv::new(&config).unwrap().observation_space();
        let actions = space.get("other_agent_actions").unwrap();
        assert_eq!((actions.high, actions.shape.clone()), (8, vec![2]));
        let visible = space.get("visible_agents").unwrap();
        assert_eq!((visible.high, visible.shape.clone()), (3, vec![2]));
    }

    #[test]
    fn test_switch_colors() {
        let env = env(2, 1);
        assert_eq!(env.colors().cell(Cell::SwitchOn), [0, 255, 0]);
        assert_eq!(env.colors().cell(Cell::SwitchOff), [255, 0, 0]);
        assert_eq!(env.colors().cell(Cell::DoorClosed), [180, 180, 180]);
        assert_eq!(env.colors().cell(Cell::DoorOpen), [255, 255, 255]);
    }

    #[test]
    fn test_layout_without_room_for_agents_fails() {
        let config = EnvConfig {
            num_agents: 3,
            ..EnvConfig::default()
        };
        let result = SwitchEnv::with_layout(&["@@@@", "@sPD", "@@@@"], &config);
        assert!(matches!(
            result,
            Err(SwitchError::NotEnoughSpawnPoints { agents: 3, available: 1 })
        ));
    }
}
