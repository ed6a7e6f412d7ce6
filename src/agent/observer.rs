use std::fmt;
use serde::{Serialize, Deserialize};

use crate::metrics::TrainingMetrics;
use crate::network::ForwardPass;
use crate::types::ACTION_COUNT;

/// How an action was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Exploration,
    Exploitation,
}

/// Per-decision view of what the online network saw.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visualization {
    pub q_values: Vec<f32>,
    /// Softmax of the Q-values, or uniform when the action was random.
    pub action_probabilities: Vec<f32>,
    /// Largest Q-value.
    pub state_value: f32,
    pub decision: DecisionKind,
    pub network_activations: Vec<Vec<f32>>,
}

impl Default for Visualization {
    fn default() -> Self {
        Visualization {
            q_values: vec![0.0; ACTION_COUNT],
            action_probabilities: uniform(ACTION_COUNT),
            state_value: 0.0,
            decision: DecisionKind::Exploration,
            network_activations: Vec::new(),
        }
    }
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

impl Visualization {
    pub fn from_forward(pass: &ForwardPass, decision: DecisionKind) -> Self {
        let q_values: Vec<f32> = pass.output.iter().copied().map(finite_or_zero).collect();
        let action_probabilities = match decision {
            DecisionKind::Exploration => uniform(q_values.len()),
            DecisionKind::Exploitation => softmax(&q_values),
        };
        let state_value = q_values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        Visualization {
            state_value: finite_or_zero(state_value),
            action_probabilities,
            q_values,
            decision,
            network_activations: pass
                .activations
                .iter()
                .map(|layer| layer.iter().copied().map(finite_or_zero).collect())
                .collect(),
        }
    }
}

pub fn uniform(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f32; n]
}

/// Numerically stable softmax. Falls back to uniform if the result would not
/// be a valid distribution.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values
        .iter()
        .map(|&v| finite_or_zero((v - max).exp()))
        .collect();
    let sum: f32 = exps.iter().sum();
    if !(sum > 0.0 && sum.is_finite()) {
        return uniform(values.len());
    }
    exps.into_iter().map(|e| e / sum).collect()
}

type MetricsCallback = Box<dyn FnMut(&TrainingMetrics) + Send>;
type VisualizationCallback = Box<dyn FnMut(&Visualization) + Send>;

/// Registered listeners. Callbacks run synchronously inside the agent call
/// that produced the update.
#[derive(Default)]
pub struct Observers {
    metrics: Vec<MetricsCallback>,
    visualization: Vec<VisualizationCallback>,
}

impl Observers {
    pub fn on_metrics<F>(&mut self, callback: F)
    where
        F: FnMut(&TrainingMetrics) + Send + 'static,
    {
        self.metrics.push(Box::new(callback));
    }

    pub fn on_visualization<F>(&mut self, callback: F)
    where
        F: FnMut(&Visualization) + Send + 'static,
    {
        self.visualization.push(Box::new(callback));
    }

    pub fn notify_metrics(&mut self, metrics: &TrainingMetrics) {
        for callback in &mut self.metrics {
            callback(metrics);
        }
    }

    pub fn notify_visualization(&mut self, visualization: &Visualization) {
        for callback in &mut self.visualization {
            callback(visualization);
        }
    }

    pub fn clear(&mut self) {
        self.metrics.clear();
        self.visualization.clear();
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("metrics", &self.metrics.len())
            .field("visualization", &self.visualization.len())
            .finish()
    }
}
