use serde::Serialize;

/// Grid coordinate. Rows grow downwards, columns grow to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(&self, (d_row, d_col): (i32, i32)) -> Position {
        Position::new(self.row + d_row, self.col + d_col)
    }
}

/// Direction an agent is facing. Beams fire along it and moves are relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Orientation {
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Right,
        Orientation::Down,
        Orientation::Left,
    ];

    /// Unit (row, col) step in the facing direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Orientation::Up => (-1, 0),
            Orientation::Right => (0, 1),
            Orientation::Down => (1, 0),
            Orientation::Left => (0, -1),
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Orientation::Up => Orientation::Right,
            Orientation::Right => Orientation::Down,
            Orientation::Down => Orientation::Left,
            Orientation::Left => Orientation::Up,
        }
    }

    pub fn counterclockwise(self) -> Self {
        match self {
            Orientation::Up => Orientation::Left,
            Orientation::Left => Orientation::Down,
            Orientation::Down => Orientation::Right,
            Orientation::Right => Orientation::Up,
        }
    }

    /// Rotate a (row, col) vector expressed for an agent facing up into this frame.
    pub fn rotate(self, (d_row, d_col): (i32, i32)) -> (i32, i32) {
        match self {
            Orientation::Up => (d_row, d_col),
            Orientation::Right => (d_col, -d_row),
            Orientation::Down => (-d_row, -d_col),
            Orientation::Left => (-d_col, d_row),
        }
    }
}

/// Inclusive rectangle of grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_row: i32,
    pub max_row: i32,
    pub min_col: i32,
    pub max_col: i32,
}

impl Bounds {
    pub fn from_center_and_range(center: Position, range: i32) -> Self {
        Self {
            min_row: center.row - range,
            max_row: center.row + range,
            min_col: center.col - range,
            max_col: center.col + range,
        }
    }

    pub fn contains(&self, pos: &Position) -> bool {
        pos.row >= self.min_row
            && pos.row <= self.max_row
            && pos.col >= self.min_col
            && pos.col <= self.max_col
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turning_is_a_cycle() {
        for orientation in Orientation::ALL {
            assert_eq!(orientation.clockwise().counterclockwise(), orientation);
            assert_eq!(
                orientation.clockwise().clockwise().clockwise().clockwise(),
                orientation
            );
        }
    }

    #[test]
    fn test_rotate_forward_matches_facing() {
        // "Up" in the agent frame is always straight ahead
        for orientation in Orientation::ALL {
            assert_eq!(orientation.rotate((-1, 0)), orientation.delta());
        }
        // Sideways moves follow the agent's left and right
        assert_eq!(Orientation::Right.rotate((0, 1)), Orientation::Down.delta());
        assert_eq!(Orientation::Left.rotate((0, -1)), Orientation::Down.delta());
    }

    #[test]
    fn test_bounds_contains_window() {
        let bounds = Bounds::from_center_and_range(Position::new(2, 2), 1);
        assert!(bounds.contains(&Position::new(1, 3)));
        assert!(!bounds.contains(&Position::new(0, 2)));
    }
}
