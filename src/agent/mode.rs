use serde::{Serialize, Deserialize};

/// Operating mode of the agent. Only [`set_mode`](super::DqnAgent::set_mode)
/// changes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentMode {
    /// Epsilon-greedy actions, transitions stored and learned from.
    #[default]
    Training,
    /// Greedy actions, no learning.
    Inference,
    /// Greedy actions, no learning. Kept apart from `Inference` so callers can
    /// bucket results separately.
    Evaluation,
}

impl AgentMode {
    pub fn explores(self) -> bool {
        matches!(self, AgentMode::Training)
    }

    pub fn learns(self) -> bool {
        matches!(self, AgentMode::Training)
    }
}
