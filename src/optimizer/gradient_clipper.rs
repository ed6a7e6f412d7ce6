use ndarray::{Array1, Array2};
use serde::{Serialize, Deserialize};

/// Gradient clipping methods
///
/// NaN entries pass through untouched so that the caller can still detect and
/// repair them; clipping is not a substitute for that check.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GradientClipper {
    /// Clip each entry into `[min, max]`
    ClipByValue { min: f32, max: f32 },

    /// No clipping
    None,
}

impl GradientClipper {
    /// Symmetric value clipping into `[-limit, limit]`.
    pub fn symmetric(limit: f32) -> Self {
        GradientClipper::ClipByValue { min: -limit, max: limit }
    }

    /// Clip a single value
    #[inline]
    pub fn clip(&self, g: f32) -> f32 {
        match self {
            GradientClipper::ClipByValue { min, max } => {
                if g.is_nan() { g } else { g.max(*min).min(*max) }
            }
            GradientClipper::None => g,
        }
    }

    /// Clip a matrix of weight gradients in place
    pub fn clip_matrix(&self, gradients: &mut Array2<f32>) {
        if let GradientClipper::None = self {
            return;
        }
        gradients.mapv_inplace(|g| self.clip(g));
    }

    /// Clip a vector of gradients in place
    pub fn clip_vector(&self, gradients: &mut Array1<f32>) {
        if let GradientClipper::None = self {
            return;
        }
        gradients.mapv_inplace(|g| self.clip(g));
    }
}
