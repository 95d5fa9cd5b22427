use crate::runner::EpisodeSummary;
use crate::switch::{SwitchEnv, SwitchStep};

use super::episode_observer::EpisodeObserver;

/// Fans every event out to a list of observers, in order.
pub struct CompositeObserver {
    observers: Vec<Box<dyn EpisodeObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Box<dyn EpisodeObserver>>) -> Self {
        Self { observers }
    }

    pub fn push(&mut self, observer: impl EpisodeObserver + 'static) {
        self.observers.push(Box::new(observer));
    }
}

impl EpisodeObserver for CompositeObserver {
    fn on_episode_start(&mut self, episode: usize, env: &SwitchEnv) {
        for observer in &mut self.observers {
            observer.on_episode_start(episode, env);
        }
    }

    fn on_step(&mut self, episode: usize, timestep: u64, step: &SwitchStep, env: &SwitchEnv) {
        for observer in &mut self.observers {
            observer.on_step(episode, timestep, step, env);
        }
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        for observer in &mut self.observers {
            observer.on_episode_end(summary);
        }
    }
}
