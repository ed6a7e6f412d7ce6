//! # Optimizers Module
//!
//! Parameter updates for the Q-network. Plain stochastic gradient descent is
//! the only rule the agent needs; what it adds over the textbook version is
//! two layers of containment:
//!
//! - every per-parameter step (`learning_rate * gradient`) is clipped by the
//!   configured [`GradientClipper`] before it is applied;
//! - every finite parameter is clamped into `[-parameter_limit, parameter_limit]`
//!   after the step.
//!
//! Parameters that come out non-finite are left as they are so the owning
//! layer can detect and re-initialize them.

pub mod gradient_clipper;

pub use gradient_clipper::GradientClipper;

use ndarray::{Array1, Array2};
use serde::{Serialize, Deserialize};

/// Largest magnitude of a single parameter step.
pub const UPDATE_LIMIT: f32 = 1.0;

/// Every weight and bias is kept within `[-PARAMETER_LIMIT, PARAMETER_LIMIT]`.
pub const PARAMETER_LIMIT: f32 = 100.0;

pub trait Optimizer {
    fn update_weights(&mut self, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);
}

/// Stochastic gradient descent with clipped steps and bounded parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SGD {
    pub step_clipper: GradientClipper,
    pub parameter_limit: f32,
}

impl SGD {
    pub fn new() -> SGD {
        SGD {
            step_clipper: GradientClipper::symmetric(UPDATE_LIMIT),
            parameter_limit: PARAMETER_LIMIT,
        }
    }

    pub fn with_step_clipper(mut self, clipper: GradientClipper) -> SGD {
        self.step_clipper = clipper;
        self
    }

    #[inline]
    fn bound(&self, value: f32) -> f32 {
        if value.is_finite() {
            value.max(-self.parameter_limit).min(self.parameter_limit)
        } else {
            value
        }
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let mut steps = gradients * learning_rate;
        self.step_clipper.clip_matrix(&mut steps);
        weights.zip_mut_with(&steps, |w, &s| *w = self.bound(*w - s));
    }

    fn update_biases(&mut self, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let mut steps = gradients * learning_rate;
        self.step_clipper.clip_vector(&mut steps);
        biases.zip_mut_with(&steps, |b, &s| *b = self.bound(*b - s));
    }
}
