use std::collections::HashMap;

use crate::infra::Position;
use crate::state::{Cell, Map};

pub type Rgb = [u8; 3];

const OUT_OF_BOUNDS: Rgb = [0, 0, 0];

const AGENT_COLORS: [Rgb; 10] = [
    [0, 0, 255],
    [254, 151, 0],
    [216, 30, 54],
    [159, 67, 255],
    [100, 255, 255],
    [99, 99, 255],
    [250, 204, 255],
    [238, 223, 16],
    [141, 169, 47],
    [127, 97, 57],
];

/// Cell and agent colours used to turn the grid into image observations.
#[derive(Debug, Clone)]
pub struct ColorMap {
    cells: HashMap<Cell, Rgb>,
}

impl ColorMap {
    pub fn cell(&self, cell: Cell) -> Rgb {
        self.cells.get(&cell).copied().unwrap_or(OUT_OF_BOUNDS)
    }

    pub fn agent(&self, index: usize) -> Rgb {
        AGENT_COLORS[index % AGENT_COLORS.len()]
    }

    /// Override or add cell colours.
    pub fn update(&mut self, colors: impl IntoIterator<Item = (Cell, Rgb)>) {
        self.cells.extend(colors);
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self {
            cells: HashMap::from([
                (Cell::Empty, [0, 0, 0]),
                (Cell::Spawn, [0, 0, 0]),
                (Cell::Wall, [180, 180, 180]),
                (Cell::Beam, [252, 252, 106]),
            ]),
        }
    }
}

/// Render the `(2 * view_len + 1)^2` window centred on `center` as packed RGB rows.
///
/// Layering, bottom to top: map cells, beam trail, agents.
pub fn render_view(
    map: &Map,
    trail: &HashMap<Position, Cell>,
    agents: &[Position],
    center: Position,
    view_len: i32,
    colors: &ColorMap,
) -> Vec<u8> {
    let side = (2 * view_len + 1) as usize;
    let mut pixels = Vec::with_capacity(side * side * 3);

    for d_row in -view_len..=view_len {
        for d_col in -view_len..=view_len {
            let pos = center.offset((d_row, d_col));
            let rgb = if let Some(index) = agents.iter().position(|p| *p == pos) {
                colors.agent(index)
            } else if let Some(&beam) = trail.get(&pos) {
                colors.cell(beam)
            } else {
                map.get(&pos).map(|c| colors.cell(c)).unwrap_or(OUT_OF_BOUNDS)
            };
            pixels.extend_from_slice(&rgb);
        }
    }

    pixels
}
