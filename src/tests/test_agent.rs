use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use crate::agent::{greedy_action, AgentBuilder, AgentConfig, AgentMode, DecisionKind, DqnAgent};
use crate::types::{Direction, Position, StateSnapshot};
use super::walled_grid;

fn small_agent() -> AgentBuilder {
    AgentBuilder::new().hidden_layers(&[8]).seed(5)
}

/// Move one cell right, eating a pellet.
fn step_right(state: &StateSnapshot) -> StateSnapshot {
    let mut next = state.clone();
    next.agent = Position::new(state.agent.x + 1, state.agent.y);
    next.goals_remaining = next.goals_remaining.saturating_sub(1);
    next.score += 10;
    next
}

#[test]
fn test_default_config() {
    let config = AgentConfig::default();
    assert_eq!(config.learning_rate, 0.00005);
    assert_eq!(config.epsilon, 1.0);
    assert_eq!(config.epsilon_min, 0.01);
    assert_eq!(config.epsilon_decay, 0.9995);
    assert_eq!(config.memory_size, 50_000);
    assert_eq!(config.batch_size, 16);
    assert_eq!(config.target_update_frequency, 2000);
    assert_eq!(config.gamma, 0.95);
    assert!(config.validate().is_ok());
}

#[test]
fn test_dqn_builder() {
    let agent = small_agent().epsilon(0.3).memory_size(64).batch_size(8).build().unwrap();

    assert_eq!(agent.epsilon(), 0.3);
    assert_eq!(agent.buffer().capacity(), 64);
    assert_eq!(agent.mode(), AgentMode::Training);
    assert_eq!(agent.online_network().layer_sizes(), vec![128, 8, 4]);
    assert_eq!(agent.online_network().save_weights(), agent.target_network().save_weights());
}

#[test]
fn test_invalid_config_rejected() {
    assert!(small_agent().gamma(1.5).build().is_err());
    assert!(small_agent().epsilon_decay(0.0).build().is_err());
    assert!(small_agent().epsilon(0.1).epsilon_min(0.2).build().is_err());
    assert!(small_agent().batch_size(0).build().is_err());
    assert!(small_agent().memory_size(4).batch_size(8).build().is_err());
    assert!(small_agent().learning_rate(f32::NAN).build().is_err());
    assert!(small_agent().target_update_frequency(0).build().is_err());
    assert!(small_agent().hidden_layers(&[0]).build().is_err());
}

#[test]
fn test_greedy_action_tie_break() {
    assert_eq!(greedy_action(&[1.0, 3.0, 3.0, 2.0]), 1);
    assert_eq!(greedy_action(&[5.0, 5.0, 5.0, 5.0]), 0);
    assert_eq!(greedy_action(&[f32::NAN, -1.0, f32::INFINITY, -2.0]), 1);
    assert_eq!(greedy_action(&[f32::NAN; 4]), 0);
}

#[test]
fn test_full_exploration_in_training() {
    let mut agent = small_agent().epsilon(1.0).build().unwrap();
    let state = walled_grid(6, 6);

    let decision = agent.get_action(&state);
    assert_eq!(decision.kind, DecisionKind::Exploration);
    assert_eq!(decision.confidence, 0.2);
    assert!(agent.has_pending());

    let probabilities = &agent.visualization().action_probabilities;
    assert!(probabilities.iter().all(|&p| (p - 0.25).abs() < 1e-6));
}

#[test]
fn test_greedy_in_evaluation() {
    let mut agent = small_agent().mode(AgentMode::Evaluation).build().unwrap();
    let state = walled_grid(6, 6);
    let q_values = agent.q_values(&state);

    for _ in 0..20 {
        let decision = agent.get_action(&state);
        assert_eq!(decision.kind, DecisionKind::Exploitation);
        assert_eq!(decision.confidence, 0.8);
        assert_eq!(decision.action.index(), greedy_action(q_values.as_slice().unwrap()));
    }
    assert!(!agent.has_pending());

    let visualization = agent.visualization();
    assert_eq!(visualization.q_values, q_values.to_vec());
    let total: f32 = visualization.action_probabilities.iter().sum();
    assert!((total - 1.0).abs() < 1e-5);
    let max = q_values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    assert_eq!(visualization.state_value, max);
    assert_eq!(visualization.network_activations.len(), 3);
    assert_eq!(visualization.network_activations[0].len(), 128);
}

#[test]
fn test_learn_is_noop_outside_training() {
    let mut agent = small_agent().mode(AgentMode::Inference).batch_size(1).build().unwrap();
    let state = walled_grid(6, 6);

    agent.get_action(&state);
    assert_eq!(agent.learn(&step_right(&state), 9.0, false), None);
    assert!(agent.buffer().is_empty());
    assert_eq!(agent.epsilon(), 1.0);
}

#[test]
fn test_learn_without_pending_decision() {
    let mut agent = small_agent().batch_size(1).build().unwrap();
    let state = walled_grid(6, 6);

    assert_eq!(agent.learn(&state, 1.0, false), None);
    assert!(agent.buffer().is_empty());

    agent.get_action(&state);
    agent.learn(&step_right(&state), 9.0, false);
    // The pending pair is consumed by the first learn
    assert_eq!(agent.learn(&state, 1.0, false), None);
    assert_eq!(agent.buffer().len(), 1);
}

#[test]
fn test_epsilon_decay_schedule() {
    let mut agent = small_agent().memory_size(10_000).batch_size(10_000).build().unwrap();
    let state = walled_grid(6, 6);
    let next = step_right(&state);

    let mut expected = 1.0f32;
    for _ in 0..5000 {
        agent.get_action(&state);
        agent.learn(&next, 9.0, false);
        expected = (expected * 0.9995).max(0.01);
        assert!(agent.epsilon() <= 1.0 && agent.epsilon() >= 0.01);
    }
    assert_eq!(agent.epsilon(), expected);
    assert!((agent.epsilon() - 0.9995f32.powi(5000)).abs() < 1e-3);
    assert_eq!(agent.train_steps(), 0);
}

#[test]
fn test_epsilon_floor() {
    let mut agent = small_agent().epsilon_decay(0.5).epsilon_min(0.1).build().unwrap();
    let state = walled_grid(6, 6);
    for _ in 0..20 {
        agent.get_action(&state);
        agent.learn(&state, -11.0, false);
    }
    assert_eq!(agent.epsilon(), 0.1);

    agent.reset_exploration();
    assert_eq!(agent.epsilon(), 1.0);
}

#[test]
fn test_training_starts_with_full_batch() {
    let mut agent = small_agent().batch_size(4).build().unwrap();
    let state = walled_grid(6, 6);
    let next = step_right(&state);

    for _ in 0..3 {
        agent.get_action(&state);
        assert_eq!(agent.learn(&next, 9.0, false), None);
    }
    agent.get_action(&state);
    let loss = agent.learn(&next, 9.0, false);
    assert!(loss.map_or(false, |l| l.is_finite() && l >= 0.0));
    assert_eq!(agent.train_steps(), 1);
    assert_eq!(agent.metrics().loss, loss.unwrap_or_default());
}

#[test]
fn test_target_network_update() {
    let mut agent = small_agent()
        .batch_size(1)
        .memory_size(16)
        .learning_rate(0.01)
        .target_update_frequency(2)
        .build()
        .unwrap();
    let state = walled_grid(6, 6);
    let next = step_right(&state);

    agent.get_action(&state);
    agent.learn(&next, 9.0, false);
    assert_eq!(agent.train_steps(), 1);
    assert_ne!(agent.online_network().save_weights(), agent.target_network().save_weights());

    agent.get_action(&state);
    agent.learn(&next, 9.0, false);
    assert_eq!(agent.train_steps(), 2);
    assert_eq!(agent.online_network().save_weights(), agent.target_network().save_weights());
}

#[test]
fn test_set_mode_clears_pending() {
    let mut agent = small_agent().batch_size(1).build().unwrap();
    let state = walled_grid(6, 6);

    agent.get_action(&state);
    assert!(agent.has_pending());
    agent.set_mode(AgentMode::Evaluation);
    assert!(!agent.has_pending());

    agent.set_mode(AgentMode::Training);
    assert_eq!(agent.learn(&state, 1.0, true), None);
    assert!(agent.buffer().is_empty());
}

#[test]
fn test_episode_metrics() {
    let mut agent = small_agent().build().unwrap();
    let state = walled_grid(6, 6);
    let mut next = step_right(&state);

    for score in [30, 10] {
        agent.get_action(&state);
        agent.learn(&next, 5.0, false);
        next.score = score;
        agent.get_action(&state);
        agent.learn(&next, 15.0, true);
    }

    let metrics = agent.metrics();
    assert_eq!(metrics.episode, 2);
    assert_eq!(metrics.games_played, 2);
    assert_eq!(metrics.score, 10.0);
    assert_eq!(metrics.best_score, 30.0);
    assert_eq!(metrics.average_score, 20.0);
    assert_eq!(metrics.average_reward, 20.0);
    assert_eq!(metrics.epsilon, agent.epsilon());
}

#[test]
fn test_observers_are_notified() {
    let mut agent = small_agent().batch_size(2).build().unwrap();
    let decisions = Arc::new(AtomicUsize::new(0));
    let episodes = Arc::new(Mutex::new(Vec::new()));

    let counter = Arc::clone(&decisions);
    agent.on_visualization(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let seen = Arc::clone(&episodes);
    agent.on_metrics(move |metrics| {
        if let Ok(mut seen) = seen.lock() {
            seen.push(metrics.episode);
        }
    });

    let state = walled_grid(6, 6);
    agent.get_action(&state);
    agent.learn(&state, -1.0, false);
    agent.get_action(&state);
    agent.learn(&state, -1.0, false);
    agent.get_action(&state);
    agent.learn(&state, -501.0, true);

    assert_eq!(decisions.load(Ordering::SeqCst), 3);
    // Two training steps and one finished episode
    assert_eq!(*episodes.lock().unwrap(), vec![0, 1]);
}

#[test]
fn test_reward_uses_configured_weights() {
    let agent = DqnAgent::builder().hidden_layers(&[4]).build().unwrap();
    let prev = walled_grid(6, 6);
    let next = step_right(&prev);
    assert_eq!(agent.calculate_reward(&prev, &next, Direction::Right), 9.0);
}

#[test]
fn test_buffer_stores_snapshots_by_value() {
    let mut agent = small_agent().build().unwrap();
    let mut state = walled_grid(6, 6);
    agent.get_action(&state);
    let next = step_right(&state);
    agent.learn(&next, 9.0, false);

    state.score = 12345;
    let stored = agent.buffer().latest(1);
    assert_eq!(stored[0].state.score, 0);
    assert_eq!(stored[0].next_state, next);
}
