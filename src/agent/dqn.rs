use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::encoder::{FeatureEncoder, FEATURE_LEN};
use crate::error::{GridChaseError, Result};
use crate::metrics::{MetricsTracker, TrainingMetrics};
use crate::model::ModelDocument;
use crate::network::{NeuralNetwork, NumericReport};
use crate::replay_buffer::{Experience, ReplayBuffer};
use crate::reward::RewardConfig;
use crate::types::{Direction, StateSnapshot, ACTION_COUNT};
use super::config::{AgentBuilder, AgentConfig};
use super::mode::AgentMode;
use super::observer::{DecisionKind, Observers, Visualization};

/// Confidence reported with a greedy decision.
pub const EXPLOITATION_CONFIDENCE: f32 = 0.8;
/// Confidence reported with a random decision.
pub const EXPLORATION_CONFIDENCE: f32 = 0.2;

/// The outcome of [`DqnAgent::get_action`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub action: Direction,
    pub kind: DecisionKind,
    pub confidence: f32,
}

/// Index of the largest finite Q-value. Exact ties go to the lowest index;
/// with no finite value at all the answer is `0`.
pub fn greedy_action(q_values: &[f32]) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (idx, &q) in q_values.iter().enumerate() {
        if q.is_finite() && q > best_value {
            best = idx;
            best_value = q;
        }
    }
    best
}

fn max_finite(values: &Array1<f32>) -> f32 {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if max.is_finite() { max } else { 0.0 }
}

/// State and action of the last training-mode decision, waiting for its outcome.
#[derive(Debug, Clone)]
struct Pending {
    state: StateSnapshot,
    action: Direction,
}

/// Deep Q-Network agent with experience replay and a lagged target network.
///
/// The agent is driven one tick at a time: [`get_action`](Self::get_action)
/// followed by [`learn`](Self::learn) with the resulting state. Both take
/// `&mut self`, so whoever owns the agent is the single writer of its
/// parameters. A backward pass updates every layer before it returns, so an
/// agent observed between calls is always consistent.
///
/// # Example
///
/// ```rust
/// use gridchase::agent::{AgentBuilder, AgentMode};
/// use gridchase::types::{CellType, Position, StateSnapshot};
///
/// let mut agent = AgentBuilder::new()
///     .hidden_layers(&[16])
///     .batch_size(4)
///     .seed(7)
///     .build()
///     .unwrap();
///
/// let state = StateSnapshot {
///     grid: vec![vec![CellType::Empty; 3]; 3],
///     agent: Position::new(1, 1),
///     goals_remaining: 5,
///     lives: 3,
///     ..Default::default()
/// };
///
/// let decision = agent.get_action(&state);
/// let reward = agent.calculate_reward(&state, &state, decision.action);
/// agent.learn(&state, reward, false);
///
/// agent.set_mode(AgentMode::Evaluation);
/// let greedy = agent.get_action(&state);
/// assert_eq!(greedy.confidence, 0.8);
/// ```
#[derive(Debug)]
pub struct DqnAgent {
    config: AgentConfig,
    initial_epsilon: f32,
    mode: AgentMode,
    online: NeuralNetwork,
    target: NeuralNetwork,
    buffer: ReplayBuffer,
    encoder: FeatureEncoder,
    rewards: RewardConfig,
    tracker: MetricsTracker,
    pending: Option<Pending>,
    train_steps: u64,
    visualization: Visualization,
    observers: Observers,
    rng: StdRng,
}

impl DqnAgent {
    /// Agent with the default architecture and the given hyperparameters.
    pub fn new(config: AgentConfig) -> Result<Self> {
        AgentBuilder::new().config(config).build()
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub(crate) fn from_builder(builder: AgentBuilder) -> Result<Self> {
        let AgentBuilder { config, hidden_layers, rewards, seed, mode, history_size } = builder;
        config.validate()?;

        let online = match seed {
            Some(seed) => NeuralNetwork::seeded(FEATURE_LEN, &hidden_layers, ACTION_COUNT, seed)?,
            None => NeuralNetwork::new(FEATURE_LEN, &hidden_layers, ACTION_COUNT)?,
        };
        let target = online.clone();
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        let mut tracker = MetricsTracker::new(history_size);
        tracker.restore(TrainingMetrics {
            epsilon: config.epsilon,
            exploration_rate: config.epsilon,
            ..TrainingMetrics::default()
        });

        debug!(sizes = ?online.layer_sizes(), ?mode, "created DQN agent");

        Ok(DqnAgent {
            initial_epsilon: config.epsilon,
            buffer: ReplayBuffer::new(config.memory_size),
            config,
            mode,
            online,
            target,
            encoder: FeatureEncoder::default(),
            rewards,
            tracker,
            pending: None,
            train_steps: 0,
            visualization: Visualization::default(),
            observers: Observers::default(),
            rng,
        })
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    /// Switch mode. Any pending decision is dropped so no stored transition
    /// spans two modes.
    pub fn set_mode(&mut self, mode: AgentMode) {
        if mode != self.mode {
            info!(from = ?self.mode, to = ?mode, "agent mode changed");
            self.mode = mode;
        }
        self.pending = None;
    }

    /// Choose an action for `state`.
    ///
    /// In training mode the action is random with probability epsilon and
    /// the state/action pair is kept for the next [`learn`](Self::learn)
    /// call. Otherwise the action is always greedy.
    pub fn get_action(&mut self, state: &StateSnapshot) -> Decision {
        let features = self.encoder.encode(state);
        let pass = self.online.forward(features.view());

        let explore = self.mode.explores() && self.rng.gen::<f32>() < self.config.epsilon;
        let (index, kind) = if explore {
            (self.rng.gen_range(0..ACTION_COUNT), DecisionKind::Exploration)
        } else {
            (greedy_action(&pass.output.to_vec()), DecisionKind::Exploitation)
        };
        let action = Direction::from_index(index).unwrap_or(Direction::Up);

        self.visualization = Visualization::from_forward(&pass, kind);
        self.observers.notify_visualization(&self.visualization);

        if self.mode.learns() {
            self.pending = Some(Pending { state: state.clone(), action });
        }

        let confidence = match kind {
            DecisionKind::Exploitation => EXPLOITATION_CONFIDENCE,
            DecisionKind::Exploration => EXPLORATION_CONFIDENCE,
        };
        Decision { action, kind, confidence }
    }

    /// Learn from the outcome of the pending decision.
    ///
    /// Stores the transition, runs one training step once the buffer holds a
    /// full batch, and decays epsilon. Returns the batch-mean loss when a
    /// training step ran. Without a pending decision this does nothing.
    pub fn learn(&mut self, next_state: &StateSnapshot, reward: f32, done: bool) -> Option<f32> {
        if !self.mode.learns() {
            return None;
        }
        let pending = self.pending.take()?;

        self.buffer.add(Experience {
            state: pending.state,
            action: pending.action,
            reward,
            next_state: next_state.clone(),
            done,
        });

        let loss = if self.buffer.len() >= self.config.batch_size {
            Some(self.train_step())
        } else {
            None
        };

        self.decay_exploration();

        self.tracker.record_step(next_state.score as f32, reward, self.config.epsilon, done);
        if let Some(loss) = loss {
            self.tracker.record_loss(loss);
        }
        if done {
            let metrics = self.tracker.metrics();
            info!(
                episode = metrics.episode,
                score = metrics.score,
                average_score = metrics.average_score,
                epsilon = self.config.epsilon,
                "episode finished"
            );
        }
        if loss.is_some() || done {
            self.observers.notify_metrics(self.tracker.metrics());
        }

        loss
    }

    /// One minibatch update of the online network against TD targets from
    /// the target network.
    fn train_step(&mut self) -> f32 {
        let gamma = self.config.gamma;
        let learning_rate = self.config.learning_rate;
        let batch = self.buffer.sample(self.config.batch_size, &mut self.rng);

        let mut total_loss = 0.0;
        for experience in &batch {
            let state = self.encoder.encode(&experience.state);
            let mut target = self.online.predict(state.view());

            let td_target = if experience.done {
                experience.reward
            } else {
                let next_state = self.encoder.encode(&experience.next_state);
                let next_q = self.target.predict(next_state.view());
                experience.reward + gamma * max_finite(&next_q)
            };
            target[experience.action.index()] = td_target;

            total_loss += self.online.backward(state.view(), target.view(), learning_rate);
        }
        let loss = total_loss / batch.len().max(1) as f32;

        self.train_steps += 1;
        if self.train_steps % self.config.target_update_frequency as u64 == 0 {
            self.target.hard_sync_from(&self.online);
            info!(train_steps = self.train_steps, "synchronized target network");
        }
        debug!(train_steps = self.train_steps, loss, batch = batch.len(), "training step");

        loss
    }

    fn decay_exploration(&mut self) {
        self.config.epsilon = (self.config.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
    }

    /// Reward for one tick under this agent's reward weights.
    pub fn calculate_reward(&self, prev: &StateSnapshot, curr: &StateSnapshot, action: Direction) -> f32 {
        self.rewards.calculate(prev, curr, action)
    }

    /// Forget the pending decision. Parameters, buffer and epsilon are untouched.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Restore epsilon to the value the agent was built with, or to the
    /// epsilon of the most recently loaded model.
    pub fn reset_exploration(&mut self) {
        self.config.epsilon = self.initial_epsilon;
    }

    /// Q-values of the online network for `state`.
    pub fn q_values(&self, state: &StateSnapshot) -> Array1<f32> {
        self.online.predict(self.encoder.encode(state).view())
    }

    /// Serialize weights, hyperparameters and metrics as a JSON model document.
    pub fn save_model(&self) -> Result<String> {
        ModelDocument {
            weights: self.online.save_weights(),
            config: self.config.clone(),
            metrics: self.tracker.metrics().clone(),
        }
        .to_json()
    }

    /// Restore from a JSON model document.
    ///
    /// Either everything is replaced (both networks, hyperparameters, metrics)
    /// or, when the document is rejected, nothing is.
    pub fn load_model(&mut self, document: &str) -> Result<()> {
        let result = self.try_load_model(document);
        if let Err(err) = &result {
            warn!(error = %err, "rejected model document, keeping current model");
        }
        result
    }

    fn try_load_model(&mut self, document: &str) -> Result<()> {
        let document = ModelDocument::from_json(document)?;

        let mut online = self.online.clone();
        online.load_weights(&document.weights)?;
        let target = online.clone();

        if document.config.memory_size != self.buffer.capacity() {
            self.buffer.set_capacity(document.config.memory_size);
        }
        self.online = online;
        self.target = target;
        self.initial_epsilon = document.config.epsilon;
        self.config = document.config;
        self.tracker.restore(document.metrics);
        self.pending = None;

        info!(
            sizes = ?self.online.layer_sizes(),
            epsilon = self.config.epsilon,
            episode = self.tracker.metrics().episode,
            "loaded model"
        );
        Ok(())
    }

    /// Write [`save_model`](Self::save_model) output to `path`.
    pub fn save_model_to<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.save_model()?)?;
        Ok(())
    }

    /// [`load_model`](Self::load_model) from a file.
    pub fn load_model_from<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<()> {
        let document = std::fs::read_to_string(path).map_err(GridChaseError::from)?;
        self.load_model(&document)
    }

    /// Register a callback run after every training step and every finished episode.
    pub fn on_metrics<F>(&mut self, callback: F)
    where
        F: FnMut(&TrainingMetrics) + Send + 'static,
    {
        self.observers.on_metrics(callback);
    }

    /// Register a callback run after every decision.
    pub fn on_visualization<F>(&mut self, callback: F)
    where
        F: FnMut(&Visualization) + Send + 'static,
    {
        self.observers.on_visualization(callback);
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f32 {
        self.config.epsilon
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        self.tracker.metrics()
    }

    /// The most recent decision's visualization snapshot.
    pub fn visualization(&self) -> &Visualization {
        &self.visualization
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn online_network(&self) -> &NeuralNetwork {
        &self.online
    }

    pub fn target_network(&self) -> &NeuralNetwork {
        &self.target
    }

    pub fn train_steps(&self) -> u64 {
        self.train_steps
    }

    /// Numeric faults the online network recovered from.
    pub fn numeric_report(&self) -> NumericReport {
        self.online.report()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
