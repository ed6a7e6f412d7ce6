//! Tick-driven training loop over an external environment.
//!
//! A [`TrainingSession`] owns both the environment and the agent. Each call
//! to [`tick`](TrainingSession::tick) runs one observe → act → reward → learn
//! cycle to completion, so the caller decides the pacing and can stop between
//! any two ticks without leaving the agent half updated.

use tracing::debug;

use crate::agent::{Decision, DqnAgent};
use crate::types::{Direction, StateSnapshot};

/// The game the agent plays.
pub trait Environment {
    /// Snapshot of the current state.
    fn observe(&self) -> StateSnapshot;

    /// Apply `action` and advance exactly one tick.
    fn step(&mut self, action: Direction);

    /// True once the current episode is over.
    fn is_done(&self) -> bool;

    /// Start a new episode.
    fn restart(&mut self);
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Ticks completed by the session, this one included.
    pub tick: u64,
    pub decision: Decision,
    pub reward: f32,
    pub done: bool,
    /// Batch loss when a training step ran.
    pub loss: Option<f32>,
}

impl TickReport {
    pub fn action(&self) -> Direction {
        self.decision.action
    }
}

#[derive(Debug)]
pub struct TrainingSession<E: Environment> {
    environment: E,
    agent: DqnAgent,
    ticks: u64,
    episodes: u64,
}

impl<E: Environment> TrainingSession<E> {
    pub fn new(environment: E, agent: DqnAgent) -> Self {
        TrainingSession { environment, agent, ticks: 0, episodes: 0 }
    }

    /// Run one full cycle. A terminal tick restarts the environment and
    /// clears the agent's pending decision before returning.
    pub fn tick(&mut self) -> TickReport {
        if self.environment.is_done() {
            self.environment.restart();
            self.agent.reset();
        }

        let state = self.environment.observe();
        let decision = self.agent.get_action(&state);
        self.environment.step(decision.action);

        let next_state = self.environment.observe();
        let done = self.environment.is_done();
        let reward = self.agent.calculate_reward(&state, &next_state, decision.action);
        let loss = self.agent.learn(&next_state, reward, done);

        self.ticks += 1;
        if done {
            self.episodes += 1;
            debug!(episode = self.episodes, tick = self.ticks, score = next_state.score, "restarting environment");
            self.agent.reset();
            self.environment.restart();
        }

        TickReport { tick: self.ticks, decision, reward, done, loss }
    }

    /// Run `ticks` ticks and return the reports of those that trained.
    pub fn run(&mut self, ticks: u64) -> Vec<TickReport> {
        (0..ticks).map(|_| self.tick()).filter(|report| report.loss.is_some()).collect()
    }

    pub fn agent(&self) -> &DqnAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut DqnAgent {
        &mut self.agent
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Episodes finished in this session.
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn into_parts(self) -> (E, DqnAgent) {
        (self.environment, self.agent)
    }
}
