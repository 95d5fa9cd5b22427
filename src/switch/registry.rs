use crate::infra::Position;
use crate::state::{CellUpdate, Map};

/// Where the switches and doors of a layout are, and how they start out.
///
/// Built once from the base map and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchRegistry {
    switch_locations: Vec<Position>,
    door_locations: Vec<Position>,
    initial_state: Vec<CellUpdate>,
}

impl SwitchRegistry {
    #[tracing::instrument(level = "trace", skip(base_map), fields(width = base_map.width, height = base_map.height))]
    pub fn scan(base_map: &Map) -> Self {
        let mut registry = Self::default();

        for (pos, cell) in base_map.iter() {
            if cell.is_switch() {
                registry.switch_locations.push(pos);
            } else if cell.is_door() {
                registry.door_locations.push(pos);
            } else {
                continue;
            }
            registry.initial_state.push(CellUpdate::new(pos, cell));
        }

        tracing::trace!(
            switches = registry.switch_locations.len(),
            doors = registry.door_locations.len(),
            "Registry scan complete"
        );
        registry
    }

    /// Number of switches actually present, which is what solving is measured against.
    pub fn switch_count(&self) -> usize {
        self.switch_locations.len()
    }

    pub fn switch_locations(&self) -> &[Position] {
        &self.switch_locations
    }

    pub fn door_locations(&self) -> &[Position] {
        &self.door_locations
    }

    /// Put every switch and door back to its layout state.
    pub fn restore(&self, map: &mut Map) {
        map.update_map(&self.initial_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Cell;
    use crate::switch::map_gen::construct_map;

    #[test]
    fn test_scan_generated_layout() {
        let map = Map::from_ascii(&construct_map(3).unwrap()).unwrap();
        let registry = SwitchRegistry::scan(&map);
        assert_eq!(registry.switch_count(), 3);
        assert_eq!(
            registry.switch_locations(),
            &[Position::new(1, 1), Position::new(1, 5), Position::new(2, 1)]
        );
        assert_eq!(
            registry.door_locations(),
            &[Position::new(1, 6), Position::new(2, 6)]
        );
    }

    #[test]
    fn test_scanned_count_follows_layout_not_request() {
        // A hand-edited layout with one switch already on and an open door
        let map = Map::from_ascii(&["@@d@@", "@sPS@", "@@@@@"]).unwrap();
        let registry = SwitchRegistry::scan(&map);
        assert_eq!(registry.switch_count(), 2);

        // Restoring reproduces the layout's own switch and door states
        let mut live = Map::new(map.height, map.width);
        registry.restore(&mut live);
        assert_eq!(live.get(&Position::new(1, 3)), Some(Cell::SwitchOn));
        assert_eq!(live.get(&Position::new(0, 2)), Some(Cell::DoorOpen));
        assert_eq!(live.get(&Position::new(1, 2)), Some(Cell::Empty));
    }

    #[test]
    fn test_restore_resets_switches_and_doors() {
        let base = Map::from_ascii(&construct_map(2).unwrap()).unwrap();
        let registry = SwitchRegistry::scan(&base);

        let mut live = Map::new(base.height, base.width);
        registry.restore(&mut live);
        for pos in registry.switch_locations() {
            assert_eq!(live.get(pos), Some(Cell::SwitchOff));
        }

        live.insert(Position::new(1, 1), Cell::SwitchOn);
        live.insert(Position::new(1, 6), Cell::DoorOpen);
        registry.restore(&mut live);
        assert_eq!(live.get(&Position::new(1, 1)), Some(Cell::SwitchOff));
        assert_eq!(live.get(&Position::new(1, 6)), Some(Cell::DoorClosed));
    }

    #[test]
    fn test_no_doors_is_valid() {
        let map = Map::from_ascii(&["@@@@", "@sP@", "@@@@"]).unwrap();
        let registry = SwitchRegistry::scan(&map);
        assert!(registry.door_locations().is_empty());
        assert_eq!(registry.switch_locations(), &[Position::new(1, 1)]);
    }
}
