mod composite_observer;
mod default_observer;
mod episode_log;
mod episode_observer;
mod types;

pub use composite_observer::CompositeObserver;
pub use default_observer::DefaultObserver;
pub use episode_log::EpisodeLogObserver;
pub use episode_observer::EpisodeObserver;
pub use types::{Bounds, Orientation, Position};
