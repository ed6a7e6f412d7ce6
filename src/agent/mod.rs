//! # Agent Module
//!
//! The DQN agent that plays the grid chase game.
//!
//! ## Core Concepts
//!
//! - **Epsilon-greedy**: in training mode a random action is taken with
//!   probability epsilon, which decays multiplicatively after every `learn`
//!   toward `epsilon_min`
//! - **Experience replay**: every transition goes into a circular buffer;
//!   training samples minibatches from it
//! - **Target network**: TD targets are computed with a lagged copy of the
//!   online network that is overwritten every `target_update_frequency`
//!   training steps
//! - **Modes**: `Training`, `Inference` and `Evaluation`, switched only by
//!   `set_mode`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gridchase::agent::{AgentBuilder, AgentConfig};
//! use gridchase::types::StateSnapshot;
//!
//! let mut agent = AgentBuilder::new()
//!     .config(AgentConfig::default())
//!     .build()
//!     .unwrap();
//!
//! let state = StateSnapshot::default();
//! let decision = agent.get_action(&state);
//! // ... the environment applies decision.action ...
//! let next_state = StateSnapshot::default();
//! let reward = agent.calculate_reward(&state, &next_state, decision.action);
//! agent.learn(&next_state, reward, false);
//!
//! let document = agent.save_model().unwrap();
//! ```

mod config;
mod dqn;
mod mode;
mod observer;

pub use config::{AgentBuilder, AgentConfig, DEFAULT_HIDDEN_LAYERS};
pub use dqn::{greedy_action, Decision, DqnAgent, EXPLOITATION_CONFIDENCE, EXPLORATION_CONFIDENCE};
pub use mode::AgentMode;
pub use observer::{softmax, DecisionKind, Observers, Visualization};
