use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;

use crate::types::{Direction, StateSnapshot};

/// One stored transition. Snapshots are owned copies, so later changes to
/// the live environment cannot reach stored history.
#[derive(Clone, Debug, PartialEq)]
pub struct Experience {
    pub state: StateSnapshot,
    pub action: Direction,
    pub reward: f32,
    pub next_state: StateSnapshot,
    pub done: bool,
}

/// Fixed-capacity circular store of transitions.
///
/// Below capacity, `add` appends. At capacity, `add` overwrites the slot under
/// a write cursor that advances modulo the capacity, which always holds the
/// oldest surviving entry.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: Vec<Experience>,
    capacity: usize,
    cursor: usize,
}

impl ReplayBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        ReplayBuffer {
            buffer: Vec::new(),
            capacity,
            cursor: 0,
        }
    }

    pub fn add(&mut self, experience: Experience) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(experience);
        } else {
            self.buffer[self.cursor] = experience;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    /// Uniform sample of `batch_size` distinct experiences, or every stored
    /// experience when fewer than `batch_size` are held.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<&Experience> {
        if self.buffer.len() <= batch_size {
            return self.buffer.iter().collect();
        }
        index::sample(rng, self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| &self.buffer[i])
            .collect()
    }

    /// Sample with probability proportional to `priorities[i]`, with
    /// replacement. Falls back to [`sample`](Self::sample) when priorities are
    /// absent, of the wrong length, or not a usable distribution (negative,
    /// non-finite or all zero).
    pub fn sample_prioritized<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        priorities: Option<&[f32]>,
        rng: &mut R,
    ) -> Vec<&Experience> {
        let weights = match priorities {
            Some(p) if p.len() == self.buffer.len() && !p.is_empty() && p.iter().all(|w| w.is_finite()) => p,
            _ => return self.sample(batch_size, rng),
        };
        let distribution = match WeightedIndex::new(weights) {
            Ok(d) => d,
            Err(_) => return self.sample(batch_size, rng),
        };
        (0..batch_size.min(self.buffer.len()))
            .map(|_| &self.buffer[distribution.sample(rng)])
            .collect()
    }

    /// Stored experiences from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        let (newer, older) = self.buffer.split_at(self.cursor);
        older.iter().chain(newer.iter())
    }

    /// The `count` most recent experiences, oldest first.
    pub fn latest(&self, count: usize) -> Vec<&Experience> {
        let skip = self.buffer.len().saturating_sub(count);
        self.iter().skip(skip).collect()
    }

    /// Change the capacity. Shrinking keeps only the most recent entries.
    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = capacity.max(1);
        let keep = self.buffer.len().min(capacity);
        let mut ordered: Vec<Experience> = self.buffer.drain(..).collect();
        ordered.rotate_left(self.cursor);
        ordered.drain(..ordered.len() - keep);
        self.buffer = ordered;
        self.capacity = capacity;
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
