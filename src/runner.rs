//! Episode loop: policies pick joint actions, the runner steps the environment
//! and reports to an observer.

use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::engine::{Action, Observation};
use crate::error::SwitchError;
use crate::infra::EpisodeObserver;
use crate::switch::{CustomMetrics, EpisodeMetrics, SwitchEnv, on_episode_end};

/// Chooses the joint action for one step.
pub trait Policy {
    fn act(
        &mut self,
        env: &SwitchEnv,
        observations: &BTreeMap<String, Observation>,
    ) -> Vec<(String, Action)>;
}

/// Uniformly random actions for every agent, seeded for reproducible runs.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn act(
        &mut self,
        env: &SwitchEnv,
        _observations: &BTreeMap<String, Observation>,
    ) -> Vec<(String, Action)> {
        env.agent_ids()
            .into_iter()
            .map(|id| {
                let action = Action::ALL[self.rng.random_range(0..Action::ALL.len())];
                (id, action)
            })
            .collect()
    }
}

/// Replays a fixed list of joint actions. Everyone stays once the script runs out.
pub struct ScriptedPolicy {
    script: VecDeque<Vec<(String, Action)>>,
}

impl ScriptedPolicy {
    pub fn new(script: Vec<Vec<(String, Action)>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Policy for ScriptedPolicy {
    fn act(
        &mut self,
        env: &SwitchEnv,
        _observations: &BTreeMap<String, Observation>,
    ) -> Vec<(String, Action)> {
        self.script.pop_front().unwrap_or_else(|| {
            env.agent_ids()
                .into_iter()
                .map(|id| (id, Action::Stay))
                .collect()
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub steps: usize,
    /// True when an agent finished, false when cut off by `max_steps`.
    pub done: bool,
    pub total_rewards: BTreeMap<String, f32>,
    /// Last info emitted for each agent.
    pub last_info: BTreeMap<String, EpisodeMetrics>,
    pub custom_metrics: CustomMetrics,
}

impl EpisodeSummary {
    pub fn team_reward(&self) -> f32 {
        self.total_rewards.values().sum()
    }
}

pub struct EpisodeRunner {
    env: SwitchEnv,
    observer: Box<dyn EpisodeObserver>,
    max_steps: usize,
}

impl EpisodeRunner {
    pub fn new(env: SwitchEnv, observer: impl EpisodeObserver + 'static, max_steps: usize) -> Self {
        Self {
            env,
            observer: Box::new(observer),
            max_steps,
        }
    }

    pub fn env(&self) -> &SwitchEnv {
        &self.env
    }

    /// Play one episode from reset until an agent is done or `max_steps` is reached.
    pub fn run_episode(
        &mut self,
        episode: usize,
        policy: &mut dyn Policy,
    ) -> Result<EpisodeSummary, SwitchError> {
        let mut observations = self.env.reset();
        self.observer.on_episode_start(episode, &self.env);

        let mut total_rewards: BTreeMap<String, f32> = self
            .env
            .agent_ids()
            .into_iter()
            .map(|id| (id, 0.0))
            .collect();
        let mut last_info: BTreeMap<String, EpisodeMetrics> = BTreeMap::new();
        let mut steps = 0;
        let mut done = false;

        while steps < self.max_steps && !done {
            let actions = policy.act(&self.env, &observations);
            let step = self.env.step(&actions)?;

            for (id, reward) in &step.rewards {
                *total_rewards.entry(id.clone()).or_default() += reward;
            }
            last_info.extend(step.infos.iter().map(|(id, info)| (id.clone(), info.clone())));
            self.observer.on_step(episode, steps as u64, &step, &self.env);

            done = step.all_done;
            observations = step.observations;
            steps += 1;
        }

        let custom_metrics = on_episode_end(&last_info).unwrap_or_default();
        let summary = EpisodeSummary {
            episode,
            steps,
            done,
            total_rewards,
            last_info,
            custom_metrics,
        };
        self.observer.on_episode_end(&summary);
        Ok(summary)
    }

    /// Run `episodes` episodes back to back and collect their statistics.
    pub fn run(
        &mut self,
        episodes: usize,
        policy: &mut dyn Policy,
    ) -> Result<RunStatistics, SwitchError> {
        let mut stats = RunStatistics::new(episodes.max(1));
        for episode in 0..episodes {
            let summary = self.run_episode(episode, policy)?;
            stats.record_episode(&summary);
        }
        Ok(stats)
    }
}

/// Moving average over the last `window_size` values
#[derive(Debug, Clone)]
pub struct MovingAverage {
    values: VecDeque<f32>,
    window_size: usize,
    sum: f32,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.values.len() >= self.window_size
            && let Some(old) = self.values.pop_front()
        {
            self.sum -= old;
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn average(&self) -> f32 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f32
        }
    }
}

/// Aggregate statistics over a run of episodes
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// Summed team reward per episode
    pub team_rewards: MovingAverage,
    /// Steps per episode
    pub episode_lengths: MovingAverage,
    /// 1.0 for episodes that ended with an agent through the door
    pub completion_rate: MovingAverage,
    /// Switches on when the episode ended
    pub switches_on: MovingAverage,
    /// Total toggles (on and off) per episode
    pub switch_pulls: MovingAverage,
    pub episodes: usize,
    /// Episodes in which a switch was ever pulled
    pub episodes_with_pull: usize,
}

impl RunStatistics {
    pub fn new(window_size: usize) -> Self {
        Self {
            team_rewards: MovingAverage::new(window_size),
            episode_lengths: MovingAverage::new(window_size),
            completion_rate: MovingAverage::new(window_size),
            switches_on: MovingAverage::new(window_size),
            switch_pulls: MovingAverage::new(window_size),
            episodes: 0,
            episodes_with_pull: 0,
        }
    }

    pub fn record_episode(&mut self, summary: &EpisodeSummary) {
        let metric = |key: &str| summary.custom_metrics.get(key).copied().flatten();

        self.team_rewards.push(summary.team_reward());
        self.episode_lengths.push(summary.steps as f32);
        self.completion_rate.push(if summary.done { 1.0 } else { 0.0 });
        self.switches_on
            .push(metric("switches_on_at_termination").unwrap_or_default() as f32);
        let pulls = metric("total_pulled_on").unwrap_or_default()
            + metric("total_pulled_off").unwrap_or_default();
        self.switch_pulls.push(pulls as f32);

        self.episodes += 1;
        if metric("timestep_first_switch_pull").is_some() {
            self.episodes_with_pull += 1;
        }
    }

    pub fn log_summary(&self) {
        info!("Episodes: {}", self.episodes);
        info!(
            "  reward={:.2}, length={:.1}, completion={:.1}%",
            self.team_rewards.average(),
            self.episode_lengths.average(),
            self.completion_rate.average() * 100.0
        );
        info!(
            "  switches on at end={:.2}, pulls={:.1}, episodes with a pull={}",
            self.switches_on.average(),
            self.switch_pulls.average(),
            self.episodes_with_pull
        );
    }
}
