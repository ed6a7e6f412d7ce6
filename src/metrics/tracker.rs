use std::collections::VecDeque;
use serde::{Serialize, Deserialize};

/// Default size of the recent-episode window behind best/average score.
pub const DEFAULT_HISTORY: usize = 100;

/// Training progress, in the shape it is persisted inside a model document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrainingMetrics {
    /// Completed episodes.
    pub episode: u64,
    /// Score at the most recent tick.
    pub score: f32,
    pub epsilon: f32,
    /// Mean loss of the most recent training step.
    pub loss: f32,
    /// Mean total reward per episode over the recent window.
    pub average_reward: f32,
    pub exploration_rate: f32,
    pub games_played: u64,
    /// Best final score over the recent window.
    pub best_score: f32,
    /// Mean final score over the recent window.
    pub average_score: f32,
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        TrainingMetrics {
            episode: 0,
            score: 0.0,
            epsilon: 1.0,
            loss: 0.0,
            average_reward: 0.0,
            exploration_rate: 1.0,
            games_played: 0,
            best_score: 0.0,
            average_score: 0.0,
        }
    }
}

/// Tracks metrics during training
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    metrics: TrainingMetrics,
    history_size: usize,
    scores: VecDeque<f32>,
    episode_rewards: VecDeque<f32>,
    current_episode_reward: f32,
}

fn mean(values: &VecDeque<f32>) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

impl MetricsTracker {
    pub fn new(history_size: usize) -> Self {
        let history_size = history_size.max(1);
        MetricsTracker {
            metrics: TrainingMetrics::default(),
            history_size,
            scores: VecDeque::with_capacity(history_size),
            episode_rewards: VecDeque::with_capacity(history_size),
            current_episode_reward: 0.0,
        }
    }

    /// Record the mean loss of a training step
    pub fn record_loss(&mut self, loss: f32) {
        if loss.is_finite() {
            self.metrics.loss = loss;
        }
    }

    /// Record one tick. On a terminal tick the episode is closed and the
    /// recent-window statistics are refreshed.
    pub fn record_step(&mut self, score: f32, reward: f32, exploration_rate: f32, done: bool) {
        if reward.is_finite() {
            self.current_episode_reward += reward;
        }
        self.metrics.score = score;
        self.metrics.epsilon = exploration_rate;
        self.metrics.exploration_rate = exploration_rate;

        if done {
            self.end_episode(score);
        }
    }

    fn end_episode(&mut self, score: f32) {
        if self.scores.len() >= self.history_size {
            self.scores.pop_front();
        }
        self.scores.push_back(score);

        if self.episode_rewards.len() >= self.history_size {
            self.episode_rewards.pop_front();
        }
        self.episode_rewards.push_back(self.current_episode_reward);
        self.current_episode_reward = 0.0;

        self.metrics.episode += 1;
        self.metrics.games_played += 1;
        self.metrics.best_score = self.scores.iter().fold(0.0_f32, |best, &s| best.max(s));
        self.metrics.average_score = mean(&self.scores);
        self.metrics.average_reward = mean(&self.episode_rewards);
    }

    /// Get a reference to the metrics
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Final scores in the recent window, oldest first.
    pub fn recent_scores(&self) -> impl Iterator<Item = f32> + '_ {
        self.scores.iter().copied()
    }

    /// Replace the metrics with a restored copy. The recent-episode window is
    /// not persisted, so it starts empty.
    pub fn restore(&mut self, metrics: TrainingMetrics) {
        self.metrics = metrics;
        self.scores.clear();
        self.episode_rewards.clear();
        self.current_episode_reward = 0.0;
    }

    /// Clear all metrics
    pub fn clear(&mut self) {
        self.restore(TrainingMetrics::default());
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}
