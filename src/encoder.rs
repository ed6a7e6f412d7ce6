//! Fixed-length feature encoding of a [`StateSnapshot`].
//!
//! Layout of the [`FEATURE_LEN`] entries with the default encoder:
//!
//! | range   | content                                                  |
//! |---------|----------------------------------------------------------|
//! | 0..64   | 8×8 nearest-neighbour downsample of the grid, `code / 5` |
//! | 64..66  | agent `x / width`, `y / height`                          |
//! | 66..82  | 4 opponent slots: `x`, `y`, `kind / 4`, `mode / 3`       |
//! | 82      | goals remaining / 100                                    |
//! | 83      | power mode flag                                          |
//! | 84      | score / 10 000                                           |
//! | 85      | lives / 3                                                |
//! | 86..128 | zero padding                                             |
//!
//! Every entry is finite and lies in `[0, 1]`.

use ndarray::Array1;

use crate::types::{CellType, StateSnapshot};

/// Length of every encoded feature vector.
pub const FEATURE_LEN: usize = 128;

/// Side of the downsampled grid.
pub const ENCODED_GRID: usize = 8;

/// Opponent slots; missing opponents are zero-padded, extra ones dropped.
pub const MAX_OPPONENTS: usize = 4;

const OPPONENT_KIND_SCALE: f32 = 4.0;
const OPPONENT_MODE_SCALE: f32 = 3.0;
const GOALS_SCALE: f32 = 100.0;
const SCORE_SCALE: f32 = 10_000.0;
const LIVES_SCALE: f32 = 3.0;

pub type FeatureVector = Array1<f32>;

/// Map into `[0, 1]`, sending anything non-finite to zero.
#[inline]
fn unit(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0).min(1.0) } else { 0.0 }
}

/// Converts snapshots into feature vectors. Pure and total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEncoder {
    grid_size: usize,
    max_opponents: usize,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        FeatureEncoder {
            grid_size: ENCODED_GRID,
            max_opponents: MAX_OPPONENTS,
        }
    }
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder with a different downsample size or opponent slot count. The
    /// output is still truncated or padded to [`FEATURE_LEN`].
    pub fn with_layout(grid_size: usize, max_opponents: usize) -> Self {
        FeatureEncoder { grid_size, max_opponents }
    }

    pub fn encode(&self, snapshot: &StateSnapshot) -> FeatureVector {
        let mut features = Vec::with_capacity(FEATURE_LEN.max(self.grid_size * self.grid_size + 6 + 4 * self.max_opponents));

        self.encode_grid(snapshot, &mut features);

        let width = snapshot.width() as f32;
        let height = snapshot.height() as f32;
        features.push(unit(snapshot.agent.x as f32 / width));
        features.push(unit(snapshot.agent.y as f32 / height));

        for slot in 0..self.max_opponents {
            match snapshot.opponents.get(slot) {
                Some(opponent) => {
                    features.push(unit(opponent.position.x as f32 / width));
                    features.push(unit(opponent.position.y as f32 / height));
                    features.push(unit(opponent.kind as u8 as f32 / OPPONENT_KIND_SCALE));
                    features.push(unit(opponent.mode as u8 as f32 / OPPONENT_MODE_SCALE));
                }
                None => features.extend_from_slice(&[0.0; 4]),
            }
        }

        features.push(unit(snapshot.goals_remaining as f32 / GOALS_SCALE));
        features.push(if snapshot.power_mode { 1.0 } else { 0.0 });
        features.push(unit(snapshot.score as f32 / SCORE_SCALE));
        features.push(unit(snapshot.lives as f32 / LIVES_SCALE));

        features.resize(FEATURE_LEN, 0.0);
        Array1::from(features)
    }

    /// Nearest-neighbour downsample: target cell `t` reads source index
    /// `floor(t * source / target)`, bounds-checked against each row.
    fn encode_grid(&self, snapshot: &StateSnapshot, features: &mut Vec<f32>) {
        let src_h = snapshot.height();
        let src_w = snapshot.width();
        let n = self.grid_size;

        for ty in 0..n {
            let sy = ty * src_h / n;
            let row = snapshot.grid.get(sy);
            for tx in 0..n {
                let sx = tx * src_w / n;
                let value = row
                    .and_then(|r| r.get(sx))
                    .map_or(0.0, |cell| cell.code() as f32 / CellType::MAX_CODE as f32);
                features.push(unit(value));
            }
        }
    }
}

/// Encode with the default layout.
pub fn encode(snapshot: &StateSnapshot) -> FeatureVector {
    FeatureEncoder::default().encode(snapshot)
}
