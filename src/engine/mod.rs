//! Generic gridworld engine the switch game runs on.

mod actions;
mod beam;
mod map_env;
mod render;
pub mod spaces;

pub use actions::{Action, NUM_ACTIONS};
pub use beam::{BeamOutcome, BeamRequest, BeamWidth, fire_beam};
pub use map_env::{ActionContext, MapEnv, MapHooks, MapStep, Observation};
pub use render::{ColorMap, Rgb, render_view};
