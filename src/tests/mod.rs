pub mod test_agent;
pub mod test_layers;

use crate::types::{CellType, Position, StateSnapshot};

/// A `width` x `height` grid of pellets inside a wall border, the agent in
/// the first open cell.
pub fn walled_grid(width: usize, height: usize) -> StateSnapshot {
    let grid = (0..height)
        .map(|y| {
            (0..width)
                .map(|x| {
                    if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                        CellType::Wall
                    } else {
                        CellType::Pellet
                    }
                })
                .collect()
        })
        .collect();
    StateSnapshot {
        grid,
        agent: Position::new(1, 1),
        opponents: Vec::new(),
        goals_remaining: ((width - 2) * (height - 2)) as u32,
        power_mode: false,
        score: 0,
        lives: 3,
    }
}
