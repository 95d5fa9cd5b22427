use crate::infra::{Orientation, Position};
use crate::state::{Cell, CellUpdate, Map};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamWidth {
    /// A single ray from the shooter.
    Narrow,
    /// Three parallel rays; the side rays start one step behind the shooter.
    Wide,
}

/// A generic beam shot. The first cell on each ray matching `targets[i]`
/// is rewritten to `replacements[i]`.
#[derive(Debug, Clone)]
pub struct BeamRequest<'a> {
    pub origin: Position,
    pub orientation: Orientation,
    pub length: usize,
    pub fire_cell: Cell,
    pub targets: &'a [Cell],
    pub replacements: &'a [Cell],
    pub width: BeamWidth,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeamOutcome {
    /// Cell rewrites caused by the beam, to be applied with `Map::update_map`.
    pub updates: Vec<CellUpdate>,
    /// Cells the beam passed through, drawn as an overlay for one step.
    pub trail: Vec<CellUpdate>,
    /// Indices of agents that absorbed the beam.
    pub hits: Vec<usize>,
}

fn firing_points(request: &BeamRequest) -> Vec<Position> {
    match request.width {
        BeamWidth::Narrow => vec![request.origin],
        BeamWidth::Wide => {
            let (f_row, f_col) = request.orientation.delta();
            let (r_row, r_col) = request.orientation.clockwise().delta();
            vec![
                request.origin,
                request.origin.offset((r_row - f_row, r_col - f_col)),
                request.origin.offset((-r_row - f_row, -r_col - f_col)),
            ]
        }
    }
}

/// Trace a beam over `map` without mutating it.
pub fn fire_beam(map: &Map, agent_positions: &[Position], request: &BeamRequest) -> BeamOutcome {
    let mut outcome = BeamOutcome::default();
    let step = request.orientation.delta();

    for start in firing_points(request) {
        let mut next = start.offset(step);
        for _ in 0..request.length {
            let Some(cell) = map.get(&next) else {
                break;
            };
            if cell.stops_beam() {
                break;
            }

            outcome.trail.push(CellUpdate::new(next, request.fire_cell));

            if let Some(i) = request.targets.iter().position(|&t| t == cell)
                && let Some(&replacement) = request.replacements.get(i)
            {
                outcome.updates.push(CellUpdate::new(next, replacement));
            }

            if let Some(agent) = agent_positions.iter().position(|p| *p == next) {
                outcome.hits.push(agent);
                break;
            }

            next = next.offset(step);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOGGLE_TARGETS: [Cell; 2] = [Cell::SwitchOff, Cell::SwitchOn];
    const TOGGLE_REPLACEMENTS: [Cell; 2] = [Cell::SwitchOn, Cell::SwitchOff];

    fn request(origin: Position, orientation: Orientation, length: usize) -> BeamRequest<'static> {
        BeamRequest {
            origin,
            orientation,
            length,
            fire_cell: Cell::Beam,
            targets: &TOGGLE_TARGETS,
            replacements: &TOGGLE_REPLACEMENTS,
            width: BeamWidth::Narrow,
        }
    }

    #[test]
    fn test_beam_swaps_adjacent_switch() {
        let map = Map::from_ascii(&["@@@@@", "@s  @", "@@@@@"]).unwrap();
        let outcome = fire_beam(&map, &[], &request(Position::new(1, 2), Orientation::Left, 1));
        assert_eq!(
            outcome.updates,
            vec![CellUpdate::new(Position::new(1, 1), Cell::SwitchOn)]
        );
        assert_eq!(outcome.trail.len(), 1);
    }

    #[test]
    fn test_beam_stops_at_walls() {
        let map = Map::from_ascii(&["@@@@@", "@s  @", "@@@@@"]).unwrap();
        let outcome = fire_beam(&map, &[], &request(Position::new(1, 1), Orientation::Up, 3));
        assert!(outcome.updates.is_empty());
        assert!(outcome.trail.is_empty());
    }

    #[test]
    fn test_beam_length_limits_reach() {
        let map = Map::from_ascii(&["@@@@@", "@s  @", "@@@@@"]).unwrap();
        let outcome = fire_beam(&map, &[], &request(Position::new(1, 3), Orientation::Left, 1));
        assert!(outcome.updates.is_empty());
        assert_eq!(outcome.trail, vec![CellUpdate::new(Position::new(1, 2), Cell::Beam)]);
    }

    #[test]
    fn test_agents_absorb_beams() {
        let map = Map::from_ascii(&["@@@@@@", "@s   @", "@@@@@@"]).unwrap();
        let blocker = Position::new(1, 2);
        let outcome = fire_beam(
            &map,
            &[Position::new(1, 4), blocker],
            &request(Position::new(1, 3), Orientation::Left, 5),
        );
        assert_eq!(outcome.hits, vec![1]);
        assert!(outcome.updates.is_empty());
    }

    #[test]
    fn test_wide_beam_fires_three_rays() {
        let map = Map::new(5, 5);
        let mut req = request(Position::new(2, 2), Orientation::Up, 1);
        req.width = BeamWidth::Wide;
        let outcome = fire_beam(&map, &[], &req);
        let mut cells: Vec<Position> = outcome.trail.iter().map(|u| u.pos).collect();
        cells.sort();
        assert_eq!(
            cells,
            vec![Position::new(1, 2), Position::new(2, 1), Position::new(2, 3)]
        );
    }
}
