use std::env;
use std::str::FromStr;

use crate::error::SwitchError;

/// Environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    /// Number of switches the generated map should contain
    pub num_switches: usize,
    /// Number of agents sharing the map
    pub num_agents: usize,
    /// Add other agents' last actions and visibility flags to observations
    pub return_agent_actions: bool,
    /// Pay every agent the change in activated switches each step
    pub external_switch_reward: bool,
    /// Reward for walking through an open door
    pub door_reward: f32,
    /// Observation window radius
    pub view_len: i32,
    /// Seed for spawn placement and orientation
    pub seed: u64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            num_switches: 2,
            num_agents: 2,
            return_agent_actions: false,
            external_switch_reward: false,
            door_reward: 1.0,
            view_len: 3,
            seed: 0,
        }
    }
}

impl EnvConfig {
    /// Defaults overridden by `SWITCH_*` environment variables.
    pub fn from_env() -> Result<Self, SwitchError> {
        let defaults = Self::default();
        Ok(Self {
            num_switches: env_or("SWITCH_NUM_SWITCHES", defaults.num_switches)?,
            num_agents: env_or("SWITCH_NUM_AGENTS", defaults.num_agents)?,
            return_agent_actions: env_or(
                "SWITCH_RETURN_AGENT_ACTIONS",
                defaults.return_agent_actions,
            )?,
            external_switch_reward: env_or(
                "SWITCH_EXTERNAL_REWARD",
                defaults.external_switch_reward,
            )?,
            door_reward: env_or("SWITCH_DOOR_REWARD", defaults.door_reward)?,
            view_len: defaults.view_len,
            seed: env_or("SWITCH_SEED", defaults.seed)?,
        })
    }
}

/// Episode loop configuration for the binary
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub episodes: usize,
    /// Episodes are cut off after this many steps
    pub max_steps: usize,
    /// Write one JSON line per episode into this folder
    pub episode_log_folder: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            episodes: 10,
            max_steps: 200,
            episode_log_folder: None,
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Result<Self, SwitchError> {
        let defaults = Self::default();
        Ok(Self {
            episodes: env_or("SWITCH_EPISODES", defaults.episodes)?,
            max_steps: env_or("SWITCH_MAX_STEPS", defaults.max_steps)?,
            episode_log_folder: env::var("SWITCH_EPISODE_LOG_FOLDER").ok(),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, SwitchError> {
    match env::var(key) {
        Ok(value) => parse_value(key, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, SwitchError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| SwitchError::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        })
}
