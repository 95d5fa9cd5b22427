pub mod config;
pub mod engine;
pub mod error;
pub mod infra;
pub mod runner;
pub mod state;
pub mod switch;

// Re-export commonly used types for convenience
pub use config::{EnvConfig, RunConfig};
pub use error::SwitchError;
pub use infra::Position;
pub use state::Map;
pub use switch::SwitchEnv;
