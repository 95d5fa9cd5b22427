use serde::Serialize;

use crate::error::SwitchError;

/// Size of the discrete action space.
pub const NUM_ACTIONS: usize = 8;

/// Discrete agent actions. Moves are relative to the agent's orientation,
/// so `MoveUp` always steps forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Action {
    MoveLeft = 0,
    MoveRight = 1,
    MoveUp = 2,
    MoveDown = 3,
    Stay = 4,
    TurnClockwise = 5,
    TurnCounterclockwise = 6,
    ToggleSwitch = 7,
}

impl Action {
    pub const ALL: [Action; NUM_ACTIONS] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::Stay,
        Action::TurnClockwise,
        Action::TurnCounterclockwise,
        Action::ToggleSwitch,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Movement vector for an agent facing up, `None` for non-movement actions.
    pub fn move_vector(self) -> Option<(i32, i32)> {
        match self {
            Action::MoveLeft => Some((0, -1)),
            Action::MoveRight => Some((0, 1)),
            Action::MoveUp => Some((-1, 0)),
            Action::MoveDown => Some((1, 0)),
            Action::Stay => Some((0, 0)),
            _ => None,
        }
    }

    pub fn is_turn(self) -> bool {
        matches!(self, Action::TurnClockwise | Action::TurnCounterclockwise)
    }

    /// Actions the engine does not handle itself; they go to the custom action hook.
    pub fn is_custom(self) -> bool {
        self.move_vector().is_none() && !self.is_turn()
    }
}

impl TryFrom<u8> for Action {
    type Error = SwitchError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Action::ALL
            .get(v as usize)
            .copied()
            .ok_or(SwitchError::InvalidAction(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_indices_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::try_from(action.index()).unwrap(), action);
        }
        assert!(matches!(
            Action::try_from(8),
            Err(SwitchError::InvalidAction(8))
        ));
    }

    #[test]
    fn test_only_toggle_is_custom() {
        let custom: Vec<Action> = Action::ALL.into_iter().filter(|a| a.is_custom()).collect();
        assert_eq!(custom, vec![Action::ToggleSwitch]);
    }
}
