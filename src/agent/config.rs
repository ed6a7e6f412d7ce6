use serde::{Serialize, Deserialize};

use crate::error::{GridChaseError, Result};
use crate::metrics::DEFAULT_HISTORY;
use crate::reward::RewardConfig;
use super::dqn::DqnAgent;
use super::mode::AgentMode;

/// Hidden layer widths used when none are given.
pub const DEFAULT_HIDDEN_LAYERS: [usize; 3] = [256, 256, 128];

/// Agent hyperparameters, in the shape they are persisted in a model document.
///
/// `epsilon` is the *current* exploration rate; it decays in place while
/// training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AgentConfig {
    pub learning_rate: f32,
    pub epsilon: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
    /// Replay buffer capacity.
    pub memory_size: usize,
    pub batch_size: usize,
    /// Training steps between hard target-network syncs.
    pub target_update_frequency: usize,
    /// Discount factor.
    pub gamma: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            learning_rate: 0.00005,
            epsilon: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.9995,
            memory_size: 50_000,
            batch_size: 16,
            target_update_frequency: 2000,
            gamma: 0.95,
        }
    }
}

fn in_unit(v: f32) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, reason: String| -> Result<()> {
            Err(GridChaseError::invalid_parameter(name.to_string(), reason))
        };

        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid("learningRate", format!("{} must be a positive number", self.learning_rate));
        }
        if !in_unit(self.epsilon) {
            return invalid("epsilon", format!("{} is outside [0, 1]", self.epsilon));
        }
        if !in_unit(self.epsilon_min) || self.epsilon_min > self.epsilon {
            return invalid("epsilonMin", format!("{} must lie in [0, epsilon]", self.epsilon_min));
        }
        if !self.epsilon_decay.is_finite() || self.epsilon_decay <= 0.0 || self.epsilon_decay > 1.0 {
            return invalid("epsilonDecay", format!("{} is outside (0, 1]", self.epsilon_decay));
        }
        if self.memory_size == 0 {
            return invalid("memorySize", "must be at least 1".to_string());
        }
        if self.batch_size == 0 || self.batch_size > self.memory_size {
            return invalid("batchSize", format!("{} must lie in [1, memorySize]", self.batch_size));
        }
        if self.target_update_frequency == 0 {
            return invalid("targetUpdateFrequency", "must be at least 1".to_string());
        }
        if !in_unit(self.gamma) {
            return invalid("gamma", format!("{} is outside [0, 1]", self.gamma));
        }
        Ok(())
    }
}

/// Builder pattern for DqnAgent
#[derive(Debug, Clone)]
pub struct AgentBuilder {
    pub(crate) config: AgentConfig,
    pub(crate) hidden_layers: Vec<usize>,
    pub(crate) rewards: RewardConfig,
    pub(crate) seed: Option<u64>,
    pub(crate) mode: AgentMode,
    pub(crate) history_size: usize,
}

impl AgentBuilder {
    pub fn new() -> Self {
        AgentBuilder {
            config: AgentConfig::default(),
            hidden_layers: DEFAULT_HIDDEN_LAYERS.to_vec(),
            rewards: RewardConfig::default(),
            seed: None,
            mode: AgentMode::Training,
            history_size: DEFAULT_HISTORY,
        }
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn epsilon_min(mut self, epsilon_min: f32) -> Self {
        self.config.epsilon_min = epsilon_min;
        self
    }

    pub fn epsilon_decay(mut self, epsilon_decay: f32) -> Self {
        self.config.epsilon_decay = epsilon_decay;
        self
    }

    pub fn memory_size(mut self, memory_size: usize) -> Self {
        self.config.memory_size = memory_size;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn target_update_frequency(mut self, frequency: usize) -> Self {
        self.config.target_update_frequency = frequency;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn hidden_layers(mut self, sizes: &[usize]) -> Self {
        self.hidden_layers = sizes.to_vec();
        self
    }

    pub fn rewards(mut self, rewards: RewardConfig) -> Self {
        self.rewards = rewards;
        self
    }

    /// Seed every random draw the agent makes: initialization, exploration
    /// and minibatch sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Episodes kept in the window behind best/average score.
    pub fn history_size(mut self, episodes: usize) -> Self {
        self.history_size = episodes;
        self
    }

    pub fn build(self) -> Result<DqnAgent> {
        DqnAgent::from_builder(self)
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
