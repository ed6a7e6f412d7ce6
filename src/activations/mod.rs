//! # Activation Functions Module
//!
//! The Q-network only ever uses two nonlinearities:
//!
//! - **ReLU**: `max(0, x)` on every hidden layer
//! - **Scaled tanh**: `bound * tanh(x / bound)` on the output layer
//!
//! [`Q_BOUND`] matches the reward clamp. Outputs are nearly linear for
//! realistic returns and saturate smoothly beyond them.
//!
//! ## Usage Example
//!
//! ```rust
//! use gridchase::activations::{Activation, Q_BOUND};
//! use ndarray::array;
//!
//! let mut data = array![1.0, -0.5, 0.0, 2.0];
//! Activation::Relu.apply(&mut data);
//! assert_eq!(data, array![1.0, 0.0, 0.0, 2.0]);
//!
//! let mut q = array![1.0e9];
//! Activation::ScaledTanh { bound: Q_BOUND }.apply(&mut q);
//! assert!(q[0] <= Q_BOUND);
//! ```

pub mod functions;

pub use functions::{Activation, Q_BOUND};
