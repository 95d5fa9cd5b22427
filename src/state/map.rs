use serde::Serialize;

use crate::error::SwitchError;
use crate::infra::Position;
use crate::state::Cell;

/// A single cell write, as produced by beams and hooks and applied in batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellUpdate {
    pub pos: Position,
    pub cell: Cell,
}

impl CellUpdate {
    pub fn new(pos: Position, cell: Cell) -> Self {
        Self { pos, cell }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Map {
    pub width: i32,
    pub height: i32,
    cells: Vec<Cell>,
}

impl Map {
    pub fn new(height: i32, width: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Empty; (width.max(0) * height.max(0)) as usize],
        }
    }

    /// Parse layout rows. Every row must have the same width and only known symbols.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S]) -> Result<Self, SwitchError> {
        let first = rows.first().ok_or(SwitchError::EmptyLayout)?;
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(SwitchError::EmptyLayout);
        }

        let mut map = Map::new(rows.len() as i32, width as i32);
        for (row, line) in rows.iter().enumerate() {
            let found = line.as_ref().chars().count();
            if found != width {
                return Err(SwitchError::RaggedLayout {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, symbol) in line.as_ref().chars().enumerate() {
                let pos = Position::new(row as i32, col as i32);
                let cell =
                    Cell::from_symbol(symbol).ok_or(SwitchError::UnknownSymbol { symbol, pos })?;
                map.insert(pos, cell);
            }
        }
        Ok(map)
    }

    pub fn in_bounds(&self, pos: &Position) -> bool {
        pos.row >= 0 && pos.row < self.height && pos.col >= 0 && pos.col < self.width
    }

    fn index(&self, pos: &Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.row * self.width + pos.col) as usize)
    }

    pub fn get(&self, pos: &Position) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Write a cell, returning what was there. Out-of-bounds writes are ignored.
    pub fn insert(&mut self, pos: Position, cell: Cell) -> Option<Cell> {
        let i = self.index(&pos)?;
        Some(std::mem::replace(&mut self.cells[i], cell))
    }

    /// Apply a batch of updates in order.
    pub fn update_map(&mut self, updates: &[CellUpdate]) {
        for update in updates {
            self.insert(update.pos, update.cell);
        }
    }

    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(i, &cell)| {
            let i = i as i32;
            (Position::new(i / width, i % width), cell)
        })
    }

    pub fn positions_of(&self, cell: Cell) -> Vec<Position> {
        self.iter()
            .filter(|&(_, c)| c == cell)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Render rows of symbols, with `overlay` drawn on top (agents, beams).
    pub fn draw_ascii(&self, overlay: &[(Position, char)]) -> String {
        let mut rows: Vec<Vec<char>> = (0..self.height)
            .map(|row| {
                (0..self.width)
                    .map(|col| {
                        self.get(&Position::new(row, col))
                            .map(Cell::symbol)
                            .unwrap_or(' ')
                    })
                    .collect()
            })
            .collect();

        for (pos, symbol) in overlay {
            if self.in_bounds(pos) {
                rows[pos.row as usize][pos.col as usize] = *symbol;
            }
        }

        rows.into_iter()
            .map(|row| row.into_iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Number of activated switches in a window of cells.
pub fn count_switches(window: &[Cell]) -> usize {
    window.iter().filter(|&&c| c == Cell::SwitchOn).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ascii_round_trips_symbols() {
        let rows = ["@@D@", "@sP@", "@@@@"];
        let map = Map::from_ascii(&rows).unwrap();
        assert_eq!(map.height, 3);
        assert_eq!(map.width, 4);
        assert_eq!(map.get(&Position::new(0, 2)), Some(Cell::DoorClosed));
        assert_eq!(map.get(&Position::new(1, 1)), Some(Cell::SwitchOff));
        assert_eq!(map.draw_ascii(&[]), rows.join("\n"));
    }

    #[test]
    fn test_from_ascii_rejects_ragged_rows() {
        let err = Map::from_ascii(&["@@@", "@ "]).unwrap_err();
        assert!(matches!(
            err,
            SwitchError::RaggedLayout {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_from_ascii_rejects_unknown_symbols() {
        let err = Map::from_ascii(&["@x@"]).unwrap_err();
        assert!(matches!(err, SwitchError::UnknownSymbol { symbol: 'x', .. }));
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut map = Map::new(2, 2);
        assert_eq!(map.get(&Position::new(-1, 0)), None);
        assert_eq!(map.insert(Position::new(2, 0), Cell::Wall), None);
        assert!(map.positions_of(Cell::Wall).is_empty());
    }

    #[test]
    fn test_update_map_applies_in_order() {
        let mut map = Map::new(1, 1);
        let pos = Position::new(0, 0);
        map.update_map(&[
            CellUpdate::new(pos, Cell::SwitchOn),
            CellUpdate::new(pos, Cell::SwitchOff),
        ]);
        assert_eq!(map.get(&pos), Some(Cell::SwitchOff));
    }

    #[test]
    fn test_count_switches_in_window() {
        let window = [Cell::SwitchOn, Cell::SwitchOff, Cell::Wall, Cell::SwitchOn];
        assert_eq!(count_switches(&window), 2);
    }
}
