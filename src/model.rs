//! The JSON model document an agent is saved to and restored from.
//!
//! ```json
//! {
//!   "weights": [{ "weights": [[...], ...], "biases": [...] }, ...],
//!   "config":  { "learningRate": 0.00005, "epsilon": 1.0, ... },
//!   "metrics": { "episode": 0, "score": 0, ... }
//! }
//! ```
//!
//! Unknown fields are rejected at every level. On read, `weights` may also be
//! an object `{ "layers": [...] }`, the shape older documents were written in.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

use crate::agent::AgentConfig;
use crate::encoder::FEATURE_LEN;
use crate::error::{GridChaseError, Result};
use crate::metrics::TrainingMetrics;
use crate::network::{LayerWeights, NetworkWeights};
use crate::types::ACTION_COUNT;

/// Everything needed to restore an agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDocument {
    #[serde(deserialize_with = "deserialize_weights")]
    pub weights: NetworkWeights,
    pub config: AgentConfig,
    pub metrics: TrainingMetrics,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacyWeights {
    layers: Vec<LayerWeights>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WeightsRepr {
    List(Vec<LayerWeights>),
    Legacy(LegacyWeights),
}

fn deserialize_weights<'de, D>(deserializer: D) -> std::result::Result<NetworkWeights, D::Error>
where
    D: Deserializer<'de>,
{
    let layers = match WeightsRepr::deserialize(deserializer)? {
        WeightsRepr::List(layers) => layers,
        WeightsRepr::Legacy(legacy) => legacy.layers,
    };
    Ok(NetworkWeights { layers })
}

impl ModelDocument {
    /// Parse and validate a document. Any schema violation, shape mismatch,
    /// non-finite value or out-of-range hyperparameter is an error.
    ///
    /// Writers that decay only while `epsilon > epsilonMin` leave epsilon one
    /// step under the floor; such an epsilon is raised to `epsilonMin`.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut document: ModelDocument =
            serde_json::from_str(json).map_err(|e| GridChaseError::malformed_model(e.to_string()))?;
        document.settle_exploration();
        document.validate()?;
        Ok(document)
    }

    fn settle_exploration(&mut self) {
        let floor = self.config.epsilon_min;
        if !floor.is_finite() || !self.config.epsilon.is_finite() || self.config.epsilon >= floor {
            return;
        }
        self.config.epsilon = floor;
        if self.metrics.epsilon.is_finite() && self.metrics.epsilon < floor {
            self.metrics.epsilon = floor;
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate(FEATURE_LEN, ACTION_COUNT)?;
        self.config.validate()?;

        let m = &self.metrics;
        let finite = [m.score, m.epsilon, m.loss, m.average_reward, m.exploration_rate, m.best_score, m.average_score]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GridChaseError::malformed_model("metrics contain non-finite values"));
        }
        Ok(())
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}
