use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::activations::Activation;
use crate::error::{GridChaseError, Result};
use crate::layers::DenseLayer;
use crate::optimizer::{GradientClipper, SGD};

/// The gradient of the loss with respect to the network output is clipped
/// into `[-OUTPUT_GRADIENT_LIMIT, OUTPUT_GRADIENT_LIMIT]`.
pub const OUTPUT_GRADIENT_LIMIT: f32 = 10.0;

/// Parameters of one layer in their exchange form: `weights[output][input]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerWeights {
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<f32>,
}

/// A deep copy of every layer's parameters, ordered input to output.
///
/// Serializes as a bare JSON array of [`LayerWeights`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkWeights {
    pub layers: Vec<LayerWeights>,
}

impl NetworkWeights {
    /// Check that these weights describe a well-formed network mapping
    /// `input_size` features to `output_size` values.
    pub fn validate(&self, input_size: usize, output_size: usize) -> Result<()> {
        if self.layers.is_empty() {
            return Err(GridChaseError::malformed_model("network has no layers"));
        }

        let mut expected_inputs = input_size;
        for (idx, layer) in self.layers.iter().enumerate() {
            let rows = layer.weights.len();
            if rows == 0 {
                return Err(GridChaseError::malformed_model(format!("layer {} has no outputs", idx)));
            }
            if layer.biases.len() != rows {
                return Err(GridChaseError::malformed_model(format!(
                    "layer {} has {} weight rows but {} biases",
                    idx,
                    rows,
                    layer.biases.len()
                )));
            }
            if let Some(row) = layer.weights.iter().position(|row| row.len() != expected_inputs) {
                return Err(GridChaseError::malformed_model(format!(
                    "layer {} row {} has {} inputs, expected {}",
                    idx,
                    row,
                    layer.weights[row].len(),
                    expected_inputs
                )));
            }
            let finite = layer.weights.iter().flatten().chain(layer.biases.iter()).all(|v| v.is_finite());
            if !finite {
                return Err(GridChaseError::malformed_model(format!("layer {} contains non-finite values", idx)));
            }
            expected_inputs = rows;
        }

        if expected_inputs != output_size {
            return Err(GridChaseError::malformed_model(format!(
                "network produces {} outputs, expected {}",
                expected_inputs, output_size
            )));
        }
        Ok(())
    }

    fn to_layers(&self) -> Result<Vec<DenseLayer>> {
        let last = self.layers.len().saturating_sub(1);
        self.layers
            .iter()
            .enumerate()
            .map(|(idx, layer)| {
                let rows = layer.weights.len();
                let cols = layer.weights.first().map_or(0, Vec::len);
                let flat: Vec<f32> = layer.weights.iter().flatten().copied().collect();
                let weights = Array2::from_shape_vec((rows, cols), flat)
                    .map_err(|e| GridChaseError::malformed_model(e.to_string()))?;
                let activation = if idx == last { Activation::q_output() } else { Activation::Relu };
                DenseLayer::from_parts(weights, Array1::from(layer.biases.clone()), activation)
            })
            .collect()
    }
}

/// Counters for numeric faults the network recovered from on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericReport {
    /// `backward` calls rejected because an input, target or learning rate was not usable.
    pub skipped_updates: u64,
    /// Parameters that became non-finite after an update and were re-initialized.
    pub repaired_parameters: u64,
}

/// Result of a forward pass.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// Final layer output, one Q-value per action.
    pub output: Array1<f32>,
    /// The sanitized input followed by every layer's post-activation output.
    pub activations: Vec<Array1<f32>>,
    /// Clamped pre-activation sums for every layer.
    pub pre_activations: Vec<Array1<f32>>,
}

fn fresh_rng() -> StdRng {
    StdRng::from_entropy()
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

/// A feedforward Q-network: ReLU hidden layers and a bounded output layer.
///
/// The network owns its parameters outright. Copies handed out by
/// [`save_weights`](Self::save_weights) or taken in by
/// [`load_weights`](Self::load_weights) never share storage with it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: SGD,
    pub output_clipper: GradientClipper,
    #[serde(skip)]
    report: NumericReport,
    #[serde(skip, default = "fresh_rng")]
    rng: StdRng,
}

impl NeuralNetwork {
    /// Create a new network `input_size -> hidden_sizes... -> output_size`.
    pub fn new(input_size: usize, hidden_sizes: &[usize], output_size: usize) -> Result<Self> {
        Self::with_rng(input_size, hidden_sizes, output_size, fresh_rng())
    }

    /// Same as [`new`](Self::new) but with reproducible initialization.
    pub fn seeded(input_size: usize, hidden_sizes: &[usize], output_size: usize, seed: u64) -> Result<Self> {
        Self::with_rng(input_size, hidden_sizes, output_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(input_size: usize, hidden_sizes: &[usize], output_size: usize, mut rng: StdRng) -> Result<Self> {
        let mut sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        sizes.push(input_size);
        sizes.extend_from_slice(hidden_sizes);
        sizes.push(output_size);

        if let Some(idx) = sizes.iter().position(|&s| s == 0) {
            return Err(GridChaseError::invalid_parameter(
                "layer_sizes".to_string(),
                format!("layer {} has zero width", idx),
            ));
        }

        let last = sizes.len() - 2;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(idx, window)| {
                let activation = if idx == last { Activation::q_output() } else { Activation::Relu };
                DenseLayer::new(window[0], window[1], activation, &mut rng)
            })
            .collect();

        Ok(NeuralNetwork {
            layers,
            optimizer: SGD::new(),
            output_clipper: GradientClipper::symmetric(OUTPUT_GRADIENT_LIMIT),
            report: NumericReport::default(),
            rng,
        })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    /// Widths of every layer, input first.
    pub fn layer_sizes(&self) -> Vec<usize> {
        debug_assert!(self.is_consistent(), "layer shapes do not chain");
        let mut sizes = vec![self.input_size()];
        sizes.extend(self.layers.iter().map(DenseLayer::output_size));
        sizes
    }

    /// Check that the layers form a Q-network: every layer has as many
    /// inputs as the previous one has outputs, one bias per output, ReLU
    /// hidden layers and a bounded output layer.
    pub fn check_structure(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(GridChaseError::malformed_model("network has no layers"));
        }

        let last = self.layers.len() - 1;
        let mut expected_inputs = self.input_size();
        if expected_inputs == 0 {
            return Err(GridChaseError::malformed_model("network has zero input width"));
        }
        for (idx, layer) in self.layers.iter().enumerate() {
            let (rows, cols) = layer.weights.dim();
            if rows == 0 {
                return Err(GridChaseError::malformed_model(format!("layer {} has no outputs", idx)));
            }
            if cols != expected_inputs {
                return Err(GridChaseError::malformed_model(format!(
                    "layer {} has {} inputs, expected {}",
                    idx, cols, expected_inputs
                )));
            }
            if layer.biases.len() != rows {
                return Err(GridChaseError::malformed_model(format!(
                    "layer {} has {} outputs but {} biases",
                    idx,
                    rows,
                    layer.biases.len()
                )));
            }
            let expected = if idx == last { Activation::q_output() } else { Activation::Relu };
            if layer.activation != expected {
                return Err(GridChaseError::malformed_model(format!(
                    "layer {} uses {:?}, expected {:?}",
                    idx, layer.activation, expected
                )));
            }
            expected_inputs = rows;
        }
        Ok(())
    }

    /// True when [`check_structure`](Self::check_structure) passes.
    pub fn is_consistent(&self) -> bool {
        self.check_structure().is_ok()
    }

    pub fn report(&self) -> NumericReport {
        self.report
    }

    /// True when every parameter of every layer is finite.
    pub fn is_finite(&self) -> bool {
        self.layers.iter().all(DenseLayer::is_finite)
    }

    fn sanitize_input(&self, input: ArrayView1<f32>) -> Array1<f32> {
        Array1::from_shape_fn(self.input_size(), |i| input.get(i).copied().map_or(0.0, finite_or_zero))
    }

    /// Perform a forward pass for a single input vector.
    ///
    /// Never fails: non-finite inputs are read as zero and the input is
    /// zero-padded or truncated to the network's input width.
    pub fn forward(&self, input: ArrayView1<f32>) -> ForwardPass {
        let mut current = self.sanitize_input(input);
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        activations.push(current.clone());

        for layer in &self.layers {
            let (pre, out) = layer.forward(current.view());
            pre_activations.push(pre);
            activations.push(out.clone());
            current = out;
        }

        ForwardPass { output: current, activations, pre_activations }
    }

    /// Forward output only.
    pub fn predict(&self, input: ArrayView1<f32>) -> Array1<f32> {
        self.forward(input).output
    }

    /// One supervised update toward `target`; returns the mean-squared error
    /// measured before the update.
    ///
    /// The call is all-or-nothing: if the input, the target or the learning
    /// rate is unusable it returns `0.0` and leaves every parameter alone.
    /// Otherwise gradients for all layers are computed first and then applied
    /// together.
    pub fn backward(&mut self, input: ArrayView1<f32>, target: ArrayView1<f32>, learning_rate: f32) -> f32 {
        let usable = input.len() == self.input_size()
            && target.len() == self.output_size()
            && input.iter().all(|v| v.is_finite())
            && target.iter().all(|v| v.is_finite())
            && learning_rate.is_finite()
            && learning_rate >= 0.0;
        if !usable {
            self.report.skipped_updates += 1;
            warn!(
                input_len = input.len(),
                target_len = target.len(),
                learning_rate,
                "skipping network update on unusable input or target"
            );
            return 0.0;
        }

        let pass = self.forward(input);
        let width = pass.output.len() as f32;
        let error = &pass.output - &target;
        let loss = error.iter().map(|e| e * e).sum::<f32>() / width;

        let mut gradient = error.mapv(|e| 2.0 * e / width);
        self.output_clipper.clip_vector(&mut gradient);

        let mut gradients = Vec::with_capacity(self.layers.len());
        for (idx, layer) in self.layers.iter().enumerate().rev() {
            let layer_gradients = layer.backward(
                pass.activations[idx].view(),
                &pass.pre_activations[idx],
                gradient.view(),
            );
            gradient = layer_gradients.input.clone();
            gradients.push(layer_gradients);
        }
        gradients.reverse();

        let mut repaired = 0;
        for (layer, layer_gradients) in self.layers.iter_mut().zip(&gradients) {
            repaired += layer.apply_gradients(layer_gradients, &mut self.optimizer, learning_rate, &mut self.rng);
        }
        if repaired > 0 {
            self.report.repaired_parameters += repaired as u64;
            warn!(repaired, "re-initialized non-finite network parameters");
        }

        loss
    }

    /// Deep copy of the current parameters.
    pub fn save_weights(&self) -> NetworkWeights {
        NetworkWeights {
            layers: self
                .layers
                .iter()
                .map(|layer| LayerWeights {
                    weights: layer.weights.outer_iter().map(|row| row.to_vec()).collect(),
                    biases: layer.biases.to_vec(),
                })
                .collect(),
        }
    }

    /// Replace the parameters with a deep copy of `weights`.
    ///
    /// The hidden widths may differ from the current ones, the input and
    /// output widths may not. On error nothing is changed.
    pub fn load_weights(&mut self, weights: &NetworkWeights) -> Result<()> {
        weights.validate(self.input_size(), self.output_size())?;
        self.layers = weights.to_layers()?;
        debug!(sizes = ?self.layer_sizes(), "loaded network weights");
        Ok(())
    }

    /// Overwrite every parameter with a copy of `source`'s.
    pub fn hard_sync_from(&mut self, source: &NeuralNetwork) {
        self.layers = source.layers.clone();
    }

    /// Soft update `self = tau * source + (1 - tau) * self`, elementwise over
    /// weights and biases. `tau == 1` is a hard sync.
    pub fn sync_from(&mut self, source: &NeuralNetwork, tau: f32) -> Result<()> {
        if !tau.is_finite() || !(0.0..=1.0).contains(&tau) {
            return Err(GridChaseError::invalid_parameter(
                "tau".to_string(),
                format!("{} is outside [0, 1]", tau),
            ));
        }
        let ours = self.layer_sizes();
        let theirs = source.layer_sizes();
        if ours != theirs {
            return Err(GridChaseError::dimension_mismatch(format!("{:?}", ours), format!("{:?}", theirs)));
        }

        if tau == 1.0 {
            self.hard_sync_from(source);
            return Ok(());
        }

        for (target, src) in self.layers.iter_mut().zip(&source.layers) {
            target.weights.zip_mut_with(&src.weights, |t, &s| *t = tau * s + (1.0 - tau) * *t);
            target.biases.zip_mut_with(&src.biases, |t, &s| *t = tau * s + (1.0 - tau) * *t);
        }
        Ok(())
    }

    /// Save the network to a binary checkpoint.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Load a network from a binary checkpoint written by [`save`](Self::save).
    ///
    /// A checkpoint whose layers do not chain, or that holds non-finite
    /// parameters, is rejected.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        let network: Self = bincode::deserialize(&data)?;
        network.check_structure()?;
        if !network.is_finite() {
            return Err(GridChaseError::malformed_model("checkpoint contains non-finite parameters"));
        }
        Ok(network)
    }
}
