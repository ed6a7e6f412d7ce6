use serde::{Serialize, Deserialize};

use super::action::Direction;

/// Contents of one grid cell. The discriminant is the cell code fed to the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CellType {
    #[default]
    Empty = 0,
    Wall = 1,
    Pellet = 2,
    PowerPellet = 3,
    OpponentSpawn = 4,
    AgentSpawn = 5,
}

impl CellType {
    /// Largest cell code; used to normalize codes into `[0, 1]`.
    pub const MAX_CODE: u8 = 5;

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_passable(self) -> bool {
        self != CellType::Wall
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// The neighbouring cell one step in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Position { x: self.x.saturating_add(dx), y: self.y.saturating_add(dy) }
    }
}

/// Pursuer archetype. Only used as an input feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpponentKind {
    Chaser = 0,
    Ambusher = 1,
    Flanker = 2,
    Wanderer = 3,
}

/// Behavioural state of an opponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpponentMode {
    Hunting = 0,
    Frightened = 1,
    Neutralized = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opponent {
    pub position: Position,
    pub kind: OpponentKind,
    pub mode: OpponentMode,
}

/// Read-only view of the environment at one tick.
///
/// Cloning is a full deep copy, which is what the replay buffer relies on to
/// keep stored history independent of the live environment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Row-major cells, `grid[y][x]`.
    pub grid: Vec<Vec<CellType>>,
    pub agent: Position,
    pub opponents: Vec<Opponent>,
    /// Goal items (pellets) still on the level.
    pub goals_remaining: u32,
    pub power_mode: bool,
    pub score: u32,
    pub lives: u32,
}

impl StateSnapshot {
    /// Width of the first row; rows are not required to be equally long.
    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }

    /// Cell at `position`, or `None` when it lies outside the grid.
    pub fn cell(&self, position: Position) -> Option<CellType> {
        let x = usize::try_from(position.x).ok()?;
        let y = usize::try_from(position.y).ok()?;
        self.grid.get(y)?.get(x).copied()
    }

    /// True when `position` is inside the grid and not a wall.
    pub fn is_passable(&self, position: Position) -> bool {
        self.cell(position).map_or(false, CellType::is_passable)
    }

    pub fn neutralized_opponents(&self) -> usize {
        self.opponents
            .iter()
            .filter(|o| o.mode == OpponentMode::Neutralized)
            .count()
    }
}
