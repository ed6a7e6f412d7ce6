use ndarray::Array1;
use serde::{Serialize, Deserialize};

/// Magnitude cap on every Q-value produced by the output layer.
pub const Q_BOUND: f32 = 1000.0;

/// An enumeration of the activation functions a dense layer can apply.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    /// `bound * tanh(x / bound)`, so outputs always lie in `(-bound, bound)`.
    ScaledTanh { bound: f32 },
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Relu
    }
}

impl Activation {
    /// Bounded output activation used by the Q-network.
    pub fn q_output() -> Self {
        Activation::ScaledTanh { bound: Q_BOUND }
    }

    /// Apply the activation function to a single value.
    #[inline]
    pub fn apply_scalar(&self, v: f32) -> f32 {
        match self {
            Activation::Relu => v.max(0.0),
            Activation::ScaledTanh { bound } => bound * (v / bound).tanh(),
        }
    }

    /// Derivative with respect to the pre-activation value.
    #[inline]
    pub fn derivative_scalar(&self, v: f32) -> f32 {
        match self {
            Activation::Relu => {
                if v > 0.0 { 1.0 } else { 0.0 }
            }
            Activation::ScaledTanh { bound } => {
                let t = (v / bound).tanh();
                1.0 - t * t
            }
        }
    }

    /// Apply the activation function to an input array in-place.
    pub fn apply(&self, input: &mut Array1<f32>) {
        input.mapv_inplace(|v| self.apply_scalar(v));
    }

    /// Compute the derivative of the activation function for an array of pre-activations.
    pub fn derivative(&self, input: &Array1<f32>) -> Array1<f32> {
        input.mapv(|v| self.derivative_scalar(v))
    }
}
