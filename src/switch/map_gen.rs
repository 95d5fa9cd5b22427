//! Procedural layouts that grow with the number of switches.

use crate::error::SwitchError;
use crate::infra::Position;

/// Row templates the generated layouts are stitched from.
pub struct SwitchMapElements;

impl SwitchMapElements {
    pub const TOP_ROW: &'static str = "@@@@@@@";
    pub const TWO_SWITCH_ROW: &'static str = "@s   sD";
    pub const ONE_SWITCH_ROW: &'static str = "@s    D";
    pub const EMPTY_ROW: &'static str = "@     @";
    pub const BOTTOM_ROW: &'static str = "@@@@@@@";
}

/// Column of the middle interior row that receives the spawn marker.
pub const SPAWN_COLUMN: usize = 3;

pub const SPAWN_SYMBOL: char = 'P';

/// Number of interior rows for `num_switches`; never zero so an agent can spawn.
pub fn interior_rows(num_switches: usize) -> usize {
    num_switches.div_ceil(2).max(1)
}

/// Build a layout holding exactly `num_switches` switches, two per row.
/// Every row with a switch also carries a door in its right wall.
pub fn construct_map(num_switches: usize) -> Result<Vec<String>, SwitchError> {
    let num_rows = interior_rows(num_switches);
    let mut remaining = num_switches;

    let mut layout = Vec::with_capacity(num_rows + 2);
    layout.push(SwitchMapElements::TOP_ROW.to_string());
    for _ in 0..num_rows {
        let row = match remaining {
            0 => SwitchMapElements::EMPTY_ROW,
            1 => {
                remaining -= 1;
                SwitchMapElements::ONE_SWITCH_ROW
            }
            _ => {
                remaining -= 2;
                SwitchMapElements::TWO_SWITCH_ROW
            }
        };
        layout.push(row.to_string());
    }
    layout.push(SwitchMapElements::BOTTOM_ROW.to_string());

    // The top border is row 0, so this lands on an interior row
    let middle_row = num_rows.div_ceil(2);
    place_spawn(&mut layout, Position::new(middle_row as i32, SPAWN_COLUMN as i32))?;

    Ok(layout)
}

/// Write the spawn marker into `layout`, refusing to overwrite anything but floor.
pub fn place_spawn(layout: &mut [String], pos: Position) -> Result<(), SwitchError> {
    // Outside the layout there is nothing to stand on
    let outside = SwitchError::SpawnCollision { pos, symbol: '@' };
    let Some(line) = usize::try_from(pos.row)
        .ok()
        .and_then(|row| layout.get_mut(row))
    else {
        return Err(outside);
    };
    let Some((offset, symbol)) = usize::try_from(pos.col)
        .ok()
        .and_then(|col| line.char_indices().nth(col))
    else {
        return Err(outside);
    };

    if symbol != ' ' {
        return Err(SwitchError::SpawnCollision { pos, symbol });
    }
    line.replace_range(offset..offset + symbol.len_utf8(), &SPAWN_SYMBOL.to_string());
    Ok(())
}
