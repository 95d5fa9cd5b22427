use crate::infra::{Bounds, Orientation, Position};

#[derive(Debug, Clone)]
pub struct AgentState {
    pub id: String,
    pub position: Position,
    pub orientation: Orientation,
    /// Radius of the square observation window.
    pub view_len: i32,
    /// Reward accumulated during the current step, drained by `compute_reward`.
    pub reward_this_turn: f32,
    pub is_done: bool,
}

impl AgentState {
    pub fn new(id: String, position: Position, orientation: Orientation, view_len: i32) -> Self {
        Self {
            id,
            position,
            orientation,
            view_len,
            reward_this_turn: 0.0,
            is_done: false,
        }
    }

    pub fn compute_reward(&mut self) -> f32 {
        std::mem::take(&mut self.reward_this_turn)
    }

    pub fn view_bounds(&self) -> Bounds {
        Bounds::from_center_and_range(self.position, self.view_len)
    }

    pub fn can_see(&self, pos: &Position) -> bool {
        self.view_bounds().contains(pos)
    }
}
