use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{GridChaseError, Result};
use crate::optimizer::Optimizer;
use super::initialization::WeightInit;

/// Every pre-activation sum is clamped into `[-PRE_ACTIVATION_LIMIT, PRE_ACTIVATION_LIMIT]`.
pub const PRE_ACTIVATION_LIMIT: f32 = 10_000.0;

/// Gradients of one layer, computed against the parameters as they were
/// before any update in the current backward pass.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    /// Gradient with respect to this layer's input. The previous layer applies
    /// its own activation derivative to it.
    pub input: Array1<f32>,
}

/// A fully connected (dense) layer in a neural network.
///
/// `weights` is shaped `(outputs, inputs)` so that row `o` holds the incoming
/// weights of output unit `o`, which is also the persisted layout.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

impl DenseLayer {
    /// Create a new dense layer with Xavier/Glorot uniform weights and zero biases.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, activation: Activation, rng: &mut R) -> Self {
        Self::with_init(input_size, output_size, activation, WeightInit::XavierUniform, rng)
    }

    pub fn with_init<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Self {
        DenseLayer {
            weights: init.initialize_weights((output_size, input_size), rng),
            biases: init.initialize_biases(output_size, rng),
            activation,
        }
    }

    /// Build a layer from existing parameters, checking that the shapes agree.
    pub fn from_parts(weights: Array2<f32>, biases: Array1<f32>, activation: Activation) -> Result<Self> {
        if weights.nrows() != biases.len() {
            return Err(GridChaseError::dimension_mismatch(
                format!("{} biases", weights.nrows()),
                format!("{} biases", biases.len()),
            ));
        }
        Ok(DenseLayer { weights, biases, activation })
    }

    pub fn input_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn output_size(&self) -> usize {
        self.weights.nrows()
    }

    /// Affine transform `W·x + b`.
    ///
    /// Any product whose weight or input is non-finite contributes nothing, a
    /// non-finite bias counts as zero, and the resulting sum is clamped to
    /// [`PRE_ACTIVATION_LIMIT`]. Inputs shorter than the layer are treated as
    /// zero-padded; extra inputs are ignored.
    pub fn pre_activation(&self, input: ArrayView1<f32>) -> Array1<f32> {
        let mut sums = Array1::zeros(self.output_size());
        for ((row, &bias), sum) in self.weights.outer_iter().zip(self.biases.iter()).zip(sums.iter_mut()) {
            let mut acc = finite_or_zero(bias);
            for (&w, &x) in row.iter().zip(input.iter()) {
                if w.is_finite() && x.is_finite() {
                    acc += w * x;
                }
            }
            *sum = if acc.is_nan() {
                0.0
            } else {
                acc.max(-PRE_ACTIVATION_LIMIT).min(PRE_ACTIVATION_LIMIT)
            };
        }
        sums
    }

    /// Forward pass returning `(pre_activation, activation)`.
    pub fn forward(&self, input: ArrayView1<f32>) -> (Array1<f32>, Array1<f32>) {
        let pre_activation = self.pre_activation(input);
        let mut output = pre_activation.clone();
        self.activation.apply(&mut output);
        (pre_activation, output)
    }

    /// Compute gradients for this layer given the gradient of the loss with
    /// respect to its *output*.
    ///
    /// The activation derivative is applied here, so for a ReLU layer every
    /// unit whose pre-activation was `<= 0` contributes no gradient.
    pub fn backward(
        &self,
        input: ArrayView1<f32>,
        pre_activation: &Array1<f32>,
        output_gradient: ArrayView1<f32>,
    ) -> LayerGradients {
        let delta = &output_gradient * &self.activation.derivative(pre_activation);
        let input = input.mapv(finite_or_zero);

        let weight_gradients = delta
            .view()
            .insert_axis(Axis(1))
            .dot(&input.view().insert_axis(Axis(0)));
        let input_gradient = self.weights.t().dot(&delta).mapv(finite_or_zero);

        LayerGradients {
            weights: weight_gradients,
            biases: delta,
            input: input_gradient,
        }
    }

    /// Apply an optimizer step, then replace every parameter that is no longer
    /// finite. Returns how many parameters had to be replaced.
    pub fn apply_gradients<O: Optimizer, R: Rng + ?Sized>(
        &mut self,
        gradients: &LayerGradients,
        optimizer: &mut O,
        learning_rate: f32,
        rng: &mut R,
    ) -> usize {
        optimizer.update_weights(&mut self.weights, &gradients.weights, learning_rate);
        optimizer.update_biases(&mut self.biases, &gradients.biases, learning_rate);
        self.repair_non_finite(rng)
    }

    /// Re-initialize non-finite parameters to small random values.
    pub fn repair_non_finite<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let mut repaired = 0;
        for p in self.weights.iter_mut().chain(self.biases.iter_mut()) {
            if !p.is_finite() {
                *p = WeightInit::small_value(rng);
                repaired += 1;
            }
        }
        repaired
    }

    /// True when every weight and bias is finite.
    pub fn is_finite(&self) -> bool {
        self.weights.iter().chain(self.biases.iter()).all(|p| p.is_finite())
    }
}
