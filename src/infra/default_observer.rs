use tracing::{debug, info};

use crate::runner::EpisodeSummary;
use crate::switch::{SwitchEnv, SwitchStep};

use super::episode_observer::EpisodeObserver;

/// Logs episode progress through `tracing`; the map is drawn at debug level.
pub struct DefaultObserver;

impl EpisodeObserver for DefaultObserver {
    fn on_episode_start(&mut self, episode: usize, env: &SwitchEnv) {
        let registry = env.core().registry();
        info!("Episode {} started", episode);
        info!("- switches: {}", registry.switch_count());
        info!("- doors: {}", registry.door_locations().len());
        info!("- agents: {}", env.agents().len());
        debug!("\n{}", env.draw_ascii_map());
    }

    fn on_step(&mut self, episode: usize, timestep: u64, step: &SwitchStep, env: &SwitchEnv) {
        let switches_on = env
            .core()
            .last_update()
            .map(|update| update.activated)
            .unwrap_or_default();
        debug!(
            "episode: {}, timestep: {}, switches on: {}/{}, rewards: {:?}",
            episode,
            timestep,
            switches_on,
            env.core().registry().switch_count(),
            step.rewards
        );
        debug!("\n{}", env.draw_ascii_map());
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        info!(
            "Episode {} finished after {} steps (done: {})",
            summary.episode, summary.steps, summary.done
        );
        for (key, value) in &summary.custom_metrics {
            match value {
                Some(value) => info!("- {}: {}", key, value),
                None => info!("- {}: unset", key),
            }
        }
    }
}
