#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;
    use gridchase::activations::Q_BOUND;
    use gridchase::encoder::{encode, FEATURE_LEN};
    use gridchase::network::NeuralNetwork;
    use gridchase::optimizer::PARAMETER_LIMIT;
    use gridchase::replay_buffer::{Experience, ReplayBuffer};
    use gridchase::reward::{calculate_reward, REWARD_LIMIT};
    use gridchase::types::{
        CellType, Direction, Opponent, OpponentKind, OpponentMode, Position, StateSnapshot,
    };
    use ndarray::Array1;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn cell_strategy() -> impl Strategy<Value = CellType> {
        prop_oneof![
            Just(CellType::Empty),
            Just(CellType::Wall),
            Just(CellType::Pellet),
            Just(CellType::PowerPellet),
            Just(CellType::OpponentSpawn),
            Just(CellType::AgentSpawn),
        ]
    }

    fn opponent_strategy() -> impl Strategy<Value = Opponent> {
        (
            -50i32..50,
            -50i32..50,
            prop_oneof![
                Just(OpponentKind::Chaser),
                Just(OpponentKind::Ambusher),
                Just(OpponentKind::Flanker),
                Just(OpponentKind::Wanderer),
            ],
            prop_oneof![
                Just(OpponentMode::Hunting),
                Just(OpponentMode::Frightened),
                Just(OpponentMode::Neutralized),
            ],
        )
            .prop_map(|(x, y, kind, mode)| Opponent { position: Position::new(x, y), kind, mode })
    }

    // Grids of any size, including ragged and empty rows
    fn snapshot_strategy() -> impl Strategy<Value = StateSnapshot> {
        (
            prop::collection::vec(prop::collection::vec(cell_strategy(), 0..40), 0..40),
            -100i32..100,
            -100i32..100,
            prop::collection::vec(opponent_strategy(), 0..8),
            any::<u32>(),
            any::<bool>(),
            any::<u32>(),
            0u32..10,
        )
            .prop_map(|(grid, x, y, opponents, goals_remaining, power_mode, score, lives)| StateSnapshot {
                grid,
                agent: Position::new(x, y),
                opponents,
                goals_remaining,
                power_mode,
                score,
                lives,
            })
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        (0usize..4).prop_map(|i| Direction::from_index(i).unwrap_or(Direction::Up))
    }

    fn experience(tag: u32) -> Experience {
        let state = StateSnapshot { score: tag, ..Default::default() };
        Experience { next_state: state.clone(), state, action: Direction::Left, reward: tag as f32, done: false }
    }

    proptest! {
        #[test]
        fn test_encoding_is_fixed_length_and_bounded(snapshot in snapshot_strategy()) {
            let features = encode(&snapshot);
            prop_assert_eq!(features.len(), FEATURE_LEN);
            for &v in features.iter() {
                prop_assert!(v.is_finite());
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }

        #[test]
        fn test_reward_is_clamped(
            prev in snapshot_strategy(),
            curr in snapshot_strategy(),
            action in direction_strategy(),
        ) {
            let reward = calculate_reward(&prev, &curr, action);
            prop_assert!(reward.is_finite());
            prop_assert!(reward.abs() <= REWARD_LIMIT);
        }

        #[test]
        fn test_forward_output_bounded(
            input in prop::collection::vec(any::<f32>(), 0..200),
            seed in any::<u64>(),
        ) {
            let network = NeuralNetwork::seeded(FEATURE_LEN, &[16, 8], 4, seed).unwrap();
            let output = network.predict(Array1::from(input).view());
            prop_assert_eq!(output.len(), 4);
            for &q in output.iter() {
                prop_assert!(q.is_finite());
                prop_assert!(q.abs() <= Q_BOUND);
            }
        }

        #[test]
        fn test_parameters_stay_clamped(
            input in prop::collection::vec(-1.0e3f32..1.0e3, 6),
            target in prop::collection::vec(-1.0e4f32..1.0e4, 3),
            learning_rate in 0.0f32..5.0,
            steps in 1usize..20,
        ) {
            let mut network = NeuralNetwork::seeded(6, &[5], 3, 1).unwrap();
            let input = Array1::from(input);
            let target = Array1::from(target);
            for _ in 0..steps {
                let loss = network.backward(input.view(), target.view(), learning_rate);
                prop_assert!(loss.is_finite());
            }
            prop_assert!(network.is_finite());
            for layer in &network.layers {
                for &p in layer.weights.iter().chain(layer.biases.iter()) {
                    prop_assert!(p.abs() <= PARAMETER_LIMIT);
                }
            }
        }

        #[test]
        fn test_buffer_keeps_most_recent(capacity in 1usize..32, inserts in 0u32..100) {
            let mut buffer = ReplayBuffer::new(capacity);
            for tag in 0..inserts {
                buffer.add(experience(tag));
            }
            let expected_len = (inserts as usize).min(capacity);
            prop_assert_eq!(buffer.len(), expected_len);

            let stored: Vec<u32> = buffer.iter().map(|e| e.reward as u32).collect();
            let expected: Vec<u32> = (inserts - expected_len as u32..inserts).collect();
            prop_assert_eq!(stored, expected);
        }

        #[test]
        fn test_samples_are_distinct(len in 1u32..64, batch in 1usize..64, seed in any::<u64>()) {
            let mut buffer = ReplayBuffer::new(64);
            for tag in 0..len {
                buffer.add(experience(tag));
            }
            let mut rng = StdRng::seed_from_u64(seed);
            let sampled: Vec<u32> = buffer.sample(batch, &mut rng).iter().map(|e| e.reward as u32).collect();
            prop_assert_eq!(sampled.len(), batch.min(len as usize));
            let unique: HashSet<u32> = sampled.iter().copied().collect();
            prop_assert_eq!(unique.len(), sampled.len());
        }
    }
}
