//! # Gridchase - Deep Q-Learning for a Grid Pursuit Game
//!
//! Gridchase trains an agent that moves through a tile grid collecting goal
//! items while avoiding opponents. The environment itself lives outside the
//! crate; gridchase turns its state snapshots into decisions and learns from
//! the outcome.
//!
//! ## Key Features
//!
//! - **Feature encoding**: any grid and opponent layout becomes a fixed 128-value vector
//! - **Neural Networks**: dense ReLU network with a bounded Q-value output and
//!   in-place recovery from numeric faults
//! - **DQN**: epsilon-greedy exploration, experience replay and a target network
//! - **Persistence**: JSON model documents and binary network checkpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridchase::agent::AgentBuilder;
//! use gridchase::session::{Environment, TrainingSession};
//! # use gridchase::types::{Direction, StateSnapshot};
//! # struct Maze;
//! # impl Environment for Maze {
//! #     fn observe(&self) -> StateSnapshot { StateSnapshot::default() }
//! #     fn step(&mut self, _action: Direction) {}
//! #     fn is_done(&self) -> bool { false }
//! #     fn restart(&mut self) {}
//! # }
//!
//! let agent = AgentBuilder::new().batch_size(32).build().unwrap();
//! let mut session = TrainingSession::new(Maze, agent);
//! for _ in 0..10_000 {
//!     session.tick();
//! }
//! let document = session.agent().save_model().unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - ReLU and the bounded Q-value output
//! - [`agent`] - The DQN agent, its configuration and observers
//! - [`encoder`] - Snapshot to feature vector
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialization
//! - [`metrics`] - Training metrics and tracking
//! - [`model`] - The persisted JSON model document
//! - [`network`] - Core neural network implementation
//! - [`optimizer`] - Clipped SGD
//! - [`replay_buffer`] - Experience replay
//! - [`reward`] - Reward shaping per tick
//! - [`session`] - Tick-driven training loop over an environment
//! - [`types`] - Snapshots, cells, opponents and directions

pub mod activations;
pub mod agent;
pub mod encoder;
pub mod error;
pub mod layers;
pub mod metrics;
pub mod model;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod reward;
pub mod session;
pub mod types;

#[cfg(test)]
mod tests;
