pub mod dense;
pub mod initialization;

pub use dense::{DenseLayer, LayerGradients, PRE_ACTIVATION_LIMIT};
pub use initialization::{WeightInit, REINIT_SCALE};
