mod agent_state;
mod cell;
mod map;

pub use agent_state::AgentState;
pub use cell::Cell;
pub use map::{CellUpdate, Map, count_switches};
