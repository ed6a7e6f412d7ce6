//! Reward shaping for one environment tick.

use serde::{Serialize, Deserialize};

use crate::types::{Direction, StateSnapshot};

pub const GOAL_ITEM_BONUS: f32 = 10.0;
pub const POWER_MODE_BONUS: f32 = 50.0;
pub const OPPONENT_BONUS: f32 = 200.0;
pub const LEVEL_CLEARED_BONUS: f32 = 1000.0;
pub const LIFE_LOST_PENALTY: f32 = -500.0;
pub const BLOCKED_MOVE_PENALTY: f32 = -10.0;
pub const TIME_PENALTY: f32 = -1.0;
/// Rewards are clamped into `[-REWARD_LIMIT, REWARD_LIMIT]`.
pub const REWARD_LIMIT: f32 = 1000.0;

/// Weights of every reward component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardConfig {
    /// Per goal item consumed this tick.
    pub goal_item: f32,
    /// Once, when power mode switches on.
    pub power_mode: f32,
    /// Per opponent newly neutralized.
    pub opponent_neutralized: f32,
    /// Once, when the last goal item is consumed.
    pub level_cleared: f32,
    /// When lives decrease.
    pub life_lost: f32,
    /// When the agent stood still because it pushed into a wall or off the grid.
    pub blocked_move: f32,
    /// Every tick.
    pub time_penalty: f32,
    pub limit: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            goal_item: GOAL_ITEM_BONUS,
            power_mode: POWER_MODE_BONUS,
            opponent_neutralized: OPPONENT_BONUS,
            level_cleared: LEVEL_CLEARED_BONUS,
            life_lost: LIFE_LOST_PENALTY,
            blocked_move: BLOCKED_MOVE_PENALTY,
            time_penalty: TIME_PENALTY,
            limit: REWARD_LIMIT,
        }
    }
}

impl RewardConfig {
    /// Reward for the transition `prev -> curr` caused by `action`.
    ///
    /// Pure. The result is clamped to `[-limit, limit]` and is `0.0` whenever
    /// an intermediate value stops being finite.
    pub fn calculate(&self, prev: &StateSnapshot, curr: &StateSnapshot, action: Direction) -> f32 {
        let mut reward = self.time_penalty;

        let consumed = prev.goals_remaining.saturating_sub(curr.goals_remaining);
        if consumed > 0 {
            reward += consumed as f32 * self.goal_item;
        }

        if curr.power_mode && !prev.power_mode {
            reward += self.power_mode;
        }

        let neutralized = curr.neutralized_opponents().saturating_sub(prev.neutralized_opponents());
        if neutralized > 0 {
            reward += neutralized as f32 * self.opponent_neutralized;
        }

        if curr.lives < prev.lives {
            reward += self.life_lost;
        }

        if prev.goals_remaining > 0 && curr.goals_remaining == 0 {
            reward += self.level_cleared;
        }

        if is_blocked_move(prev, curr, action) {
            reward += self.blocked_move;
        }

        let limit = if self.limit.is_finite() { self.limit.abs() } else { REWARD_LIMIT };
        let clamped = reward.max(-limit).min(limit);
        if reward.is_finite() { clamped } else { 0.0 }
    }
}

/// True when the agent did not move and could not have: the cell it tried to
/// enter is a wall or outside the grid.
pub fn is_blocked_move(prev: &StateSnapshot, curr: &StateSnapshot, action: Direction) -> bool {
    prev.agent == curr.agent && !prev.is_passable(prev.agent.step(action))
}

/// [`RewardConfig::calculate`] with the default weights.
pub fn calculate_reward(prev: &StateSnapshot, curr: &StateSnapshot, action: Direction) -> f32 {
    RewardConfig::default().calculate(prev, curr, action)
}
