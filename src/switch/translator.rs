use tracing::debug;

use crate::engine::{ActionContext, BeamRequest, BeamWidth};
use crate::state::{AgentState, Cell, CellUpdate};

const TOGGLE_TARGETS: [Cell; 2] = [Cell::SwitchOff, Cell::SwitchOn];
const TOGGLE_REPLACEMENTS: [Cell; 2] = [Cell::SwitchOn, Cell::SwitchOff];

/// The one-cell beam an agent fires to flip the switch in front of it.
pub fn toggle_request(agent: &AgentState) -> BeamRequest<'static> {
    BeamRequest {
        origin: agent.position,
        orientation: agent.orientation,
        length: 1,
        fire_cell: Cell::Beam,
        targets: &TOGGLE_TARGETS,
        replacements: &TOGGLE_REPLACEMENTS,
        width: BeamWidth::Narrow,
    }
}

/// Fire the toggle beam and return the switch flip, if any.
pub fn toggle_switch(agent: &AgentState, ctx: &mut ActionContext<'_>) -> Vec<CellUpdate> {
    let updates = ctx.fire_beam(&toggle_request(agent));
    for update in &updates {
        debug!(
            "{} toggled switch at ({}, {}) to {:?}",
            agent.id, update.pos.row, update.pos.col, update.cell
        );
    }
    updates
}
