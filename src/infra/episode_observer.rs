use crate::runner::EpisodeSummary;
use crate::switch::{SwitchEnv, SwitchStep};

/// Trait for observing episode events while a runner drives the environment
pub trait EpisodeObserver {
    /// Called right after reset, before the first step
    fn on_episode_start(&mut self, episode: usize, env: &SwitchEnv);

    /// Called after every step with the step result and the updated environment
    fn on_step(&mut self, episode: usize, timestep: u64, step: &SwitchStep, env: &SwitchEnv);

    /// Called once the episode is done or cut off
    fn on_episode_end(&mut self, summary: &EpisodeSummary);
}
