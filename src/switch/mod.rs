//! Switch/door coordination game built on the base engine.

mod coordination;
mod env;
mod map_gen;
mod metrics;
mod registry;
mod translator;

pub use coordination::{CoordinationState, CoordinationUpdate, Coordinator};
pub use env::{SWITCH_COLORS, SwitchCore, SwitchEnv, SwitchStep};
pub use map_gen::{SwitchMapElements, construct_map, interior_rows, place_spawn};
pub use metrics::{
    CustomMetrics, EXTRA_INFO_KEYS, EpisodeMetrics, LastInfoSource, REPORTING_AGENT,
    SUCCESS_REWARD_THRESHOLD, on_episode_end,
};
pub use registry::SwitchRegistry;
pub use translator::{toggle_request, toggle_switch};
