//! Types shared between the environment and the learning core.
//!
//! The environment hands the agent a [`StateSnapshot`] every tick and receives
//! a [`Direction`] back. Neither type is ever mutated by the core.

pub mod action;
pub mod snapshot;

pub use action::{Direction, ACTION_COUNT};
pub use snapshot::{CellType, Opponent, OpponentKind, OpponentMode, Position, StateSnapshot};
