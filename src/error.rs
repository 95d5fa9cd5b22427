use thiserror::Error;

use crate::infra::Position;

#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("layout is empty")]
    EmptyLayout,
    #[error("layout row {row} has width {found}, expected {expected}")]
    RaggedLayout {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown map symbol {symbol:?} at {pos:?}")]
    UnknownSymbol { symbol: char, pos: Position },
    #[error("spawn marker at {pos:?} would overwrite {symbol:?}")]
    SpawnCollision { pos: Position, symbol: char },
    #[error("not enough spawn cells: {agents} agents, {available} free cells")]
    NotEnoughSpawnPoints { agents: usize, available: usize },
    #[error("environment needs at least one agent")]
    NoAgents,
    #[error("unknown agent {0}")]
    UnknownAgent(String),
    #[error("cell {pos:?} is not walkable")]
    BlockedCell { pos: Position },
    #[error("cell {pos:?} is already taken by another agent")]
    CellOccupied { pos: Position },
    #[error("action index {0} out of range (expected 0..8)")]
    InvalidAction(u8),
    #[error("environment stepped before reset")]
    NotReset,
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: String, value: String },
}
