pub mod tracker;

pub use tracker::{MetricsTracker, TrainingMetrics, DEFAULT_HISTORY};
