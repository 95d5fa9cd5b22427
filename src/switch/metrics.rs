//! Per-episode switch statistics and the episode-end export.

use std::collections::BTreeMap;

use serde::Serialize;

use super::coordination::CoordinationUpdate;

/// Reward above which the first agent's step counts as a success.
pub const SUCCESS_REWARD_THRESHOLD: f32 = 0.1;

/// Agent whose last info is exported at episode end.
pub const REPORTING_AGENT: &str = "agent-0";

pub const EXTRA_INFO_KEYS: [&str; 6] = [
    "switches_on_at_termination",
    "total_pulled_on",
    "total_pulled_off",
    "timestep_first_switch_pull",
    "timestep_last_switch_pull",
    "total_successes",
];

/// Flat metric name to value mapping; `None` means the metric was never set.
pub type CustomMetrics = BTreeMap<String, Option<u64>>;

/// Counters for one episode. A fresh value is installed on every reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EpisodeMetrics {
    /// Switches on after the most recent step.
    pub switches_on_at_termination: usize,
    pub total_pulled_on: u64,
    pub total_pulled_off: u64,
    /// Unset until the first step that changes the number of active switches.
    pub timestep_first_switch_pull: Option<u64>,
    pub timestep_last_switch_pull: Option<u64>,
    pub total_successes: u64,
}

impl EpisodeMetrics {
    /// Fold one coordination pass, taken at `timestep`, into the counters.
    pub fn record_transition(&mut self, timestep: u64, update: &CoordinationUpdate) {
        if update.delta != 0 {
            self.timestep_last_switch_pull = Some(timestep);
            if self.timestep_first_switch_pull.is_none() {
                self.timestep_first_switch_pull = Some(timestep);
            }
            self.total_pulled_on += update.delta.max(0) as u64;
            self.total_pulled_off += (-update.delta).max(0) as u64;
        }
        self.switches_on_at_termination = update.activated;
    }

    /// Count a success when the first agent's step reward clears the threshold.
    pub fn record_reward(&mut self, first_agent_reward: f32) {
        if first_agent_reward > SUCCESS_REWARD_THRESHOLD {
            self.total_successes += 1;
        }
    }

    pub fn to_custom_metrics(&self) -> CustomMetrics {
        let values = [
            Some(self.switches_on_at_termination as u64),
            Some(self.total_pulled_on),
            Some(self.total_pulled_off),
            self.timestep_first_switch_pull,
            self.timestep_last_switch_pull,
            Some(self.total_successes),
        ];
        EXTRA_INFO_KEYS
            .iter()
            .map(|key| key.to_string())
            .zip(values)
            .collect()
    }
}

/// Anything that remembers the last info emitted for an agent during an episode.
pub trait LastInfoSource {
    fn last_info_for(&self, agent_id: &str) -> Option<&EpisodeMetrics>;
}

impl LastInfoSource for BTreeMap<String, EpisodeMetrics> {
    fn last_info_for(&self, agent_id: &str) -> Option<&EpisodeMetrics> {
        self.get(agent_id)
    }
}

/// Episode-end hook: copy the reporting agent's last info into flat custom metrics.
pub fn on_episode_end(source: &impl LastInfoSource) -> Option<CustomMetrics> {
    source
        .last_info_for(REPORTING_AGENT)
        .map(EpisodeMetrics::to_custom_metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch::coordination::CoordinationState;

    fn update(activated: usize, delta: i64) -> CoordinationUpdate {
        CoordinationUpdate {
            activated,
            delta,
            state: CoordinationState::Unsolved,
            shared_reward: 0.0,
        }
    }

    #[test]
    fn test_pull_timestamps_start_unset() {
        let mut metrics = EpisodeMetrics::default();
        metrics.record_transition(0, &update(0, 0));
        metrics.record_transition(1, &update(0, 0));
        assert_eq!(metrics.timestep_first_switch_pull, None);
        assert_eq!(metrics.timestep_last_switch_pull, None);
    }

    #[test]
    fn test_pull_at_timestep_zero_is_recorded() {
        let mut metrics = EpisodeMetrics::default();
        metrics.record_transition(0, &update(1, 1));
        assert_eq!(metrics.timestep_first_switch_pull, Some(0));
        assert_eq!(metrics.timestep_last_switch_pull, Some(0));
    }

    #[test]
    fn test_last_pull_moves_first_pull_does_not() {
        let mut metrics = EpisodeMetrics::default();
        metrics.record_transition(2, &update(1, 1));
        metrics.record_transition(3, &update(1, 0));
        metrics.record_transition(5, &update(0, -1));
        assert_eq!(metrics.timestep_first_switch_pull, Some(2));
        assert_eq!(metrics.timestep_last_switch_pull, Some(5));
        assert_eq!(metrics.total_pulled_on, 1);
        assert_eq!(metrics.total_pulled_off, 1);
        assert_eq!(metrics.switches_on_at_termination, 0);
    }

    #[test]
    fn test_success_threshold() {
        let mut metrics = EpisodeMetrics::default();
        metrics.record_reward(0.1);
        assert_eq!(metrics.total_successes, 0);
        metrics.record_reward(1.0);
        metrics.record_reward(0.0);
        metrics.record_reward(0.11);
        assert_eq!(metrics.total_successes, 2);
    }

    #[test]
    fn test_on_episode_end_copies_reporting_agent() {
        let mut metrics = EpisodeMetrics::default();
        metrics.record_transition(4, &update(2, 2));
        let mut last_info = BTreeMap::new();
        last_info.insert(REPORTING_AGENT.to_string(), metrics);

        let custom = on_episode_end(&last_info).unwrap();
        assert_eq!(custom.len(), EXTRA_INFO_KEYS.len());
        assert_eq!(custom["switches_on_at_termination"], Some(2));
        assert_eq!(custom["total_pulled_on"], Some(2));
        assert_eq!(custom["total_pulled_off"], Some(0));
        assert_eq!(custom["timestep_first_switch_pull"], Some(4));
        assert_eq!(custom["timestep_last_switch_pull"], Some(4));
        assert_eq!(custom["total_successes"], Some(0));
    }

    #[test]
    fn test_on_episode_end_keeps_unset_pulls_unset() {
        let mut last_info = BTreeMap::new();
        last_info.insert(REPORTING_AGENT.to_string(), EpisodeMetrics::default());
        let custom = on_episode_end(&last_info).unwrap();
        assert_eq!(custom["timestep_first_switch_pull"], None);
        assert_eq!(custom["total_pulled_on"], Some(0));
    }

    #[test]
    fn test_on_episode_end_without_info() {
        let last_info: BTreeMap<String, EpisodeMetrics> = BTreeMap::new();
        assert!(on_episode_end(&last_info).is_none());
    }
}
