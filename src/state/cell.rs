use serde::Serialize;

/// Contents of a single grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cell {
    Empty,
    Wall,
    /// Only present in layouts, cleared to `Empty` in the live map.
    Spawn,
    SwitchOff,
    SwitchOn,
    DoorClosed,
    DoorOpen,
    /// Overlay drawn for one step where a beam passed.
    Beam,
}

impl Cell {
    pub fn from_symbol(symbol: char) -> Option<Cell> {
        match symbol {
            ' ' => Some(Cell::Empty),
            '@' => Some(Cell::Wall),
            'P' => Some(Cell::Spawn),
            's' => Some(Cell::SwitchOff),
            'S' => Some(Cell::SwitchOn),
            'D' => Some(Cell::DoorClosed),
            'd' => Some(Cell::DoorOpen),
            'F' => Some(Cell::Beam),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Wall => '@',
            Cell::Spawn => 'P',
            Cell::SwitchOff => 's',
            Cell::SwitchOn => 'S',
            Cell::DoorClosed => 'D',
            Cell::DoorOpen => 'd',
            Cell::Beam => 'F',
        }
    }

    pub fn is_switch(self) -> bool {
        matches!(self, Cell::SwitchOff | Cell::SwitchOn)
    }

    pub fn is_door(self) -> bool {
        matches!(self, Cell::DoorClosed | Cell::DoorOpen)
    }

    /// Only walls and closed doors block movement; agents may stand on switches.
    pub fn is_walkable(self) -> bool {
        !matches!(self, Cell::Wall | Cell::DoorClosed)
    }

    /// Walls stop beams before they are drawn; everything else lets the beam enter.
    pub fn stops_beam(self) -> bool {
        matches!(self, Cell::Wall)
    }
}
