//! Train a DQN agent on a small pursuit maze.
//!
//! ```text
//! RUST_LOG=gridchase=info,chase_training=info cargo run --release --example chase_training
//! ```

use gridchase::agent::{AgentBuilder, AgentMode};
use gridchase::error::Result;
use gridchase::session::{Environment, TrainingSession};
use gridchase::types::{CellType, Direction, Opponent, OpponentKind, OpponentMode, Position, StateSnapshot};
use tracing::info;

const LAYOUT: [&str; 9] = [
    "###########",
    "#o...#...o#",
    "#.##.#.##.#",
    "#.........#",
    "#.##.G.##.#",
    "#.........#",
    "#.##.#.##.#",
    "#o..P#...o#",
    "###########",
];
const POWER_TICKS: u32 = 20;
const MAX_TICKS: u32 = 400;
const TRAINING_TICKS: u64 = 30_000;

struct Maze {
    state: StateSnapshot,
    spawn: Position,
    opponent_spawn: Position,
    power_left: u32,
    ticks: u32,
}

impl Maze {
    fn new() -> Self {
        let mut maze = Maze {
            state: StateSnapshot::default(),
            spawn: Position::default(),
            opponent_spawn: Position::default(),
            power_left: 0,
            ticks: 0,
        };
        maze.restart();
        maze
    }

    /// Greedy pursuit; frightened opponents flee instead.
    fn move_opponents(&mut self) {
        let agent = self.state.agent;
        for i in 0..self.state.opponents.len() {
            let opponent = self.state.opponents[i];
            if opponent.mode == OpponentMode::Neutralized {
                continue;
            }
            let flee = opponent.mode == OpponentMode::Frightened;
            let distance = |p: Position| (p.x - agent.x).abs() + (p.y - agent.y).abs();
            let best = Direction::ALL
                .iter()
                .map(|&d| opponent.position.step(d))
                .filter(|&p| self.state.is_passable(p))
                .min_by_key(|&p| if flee { -distance(p) } else { distance(p) });
            if let Some(position) = best {
                self.state.opponents[i].position = position;
            }
        }
    }

    fn resolve_contacts(&mut self) {
        let agent = self.state.agent;
        for i in 0..self.state.opponents.len() {
            let opponent = self.state.opponents[i];
            if opponent.position != agent || opponent.mode == OpponentMode::Neutralized {
                continue;
            }
            if opponent.mode == OpponentMode::Frightened {
                self.state.opponents[i].mode = OpponentMode::Neutralized;
                self.state.score += 200;
            } else {
                self.state.lives = self.state.lives.saturating_sub(1);
                self.state.agent = self.spawn;
                self.state.opponents[i].position = self.opponent_spawn;
            }
        }
    }
}

impl Environment for Maze {
    fn observe(&self) -> StateSnapshot {
        self.state.clone()
    }

    fn step(&mut self, action: Direction) {
        self.ticks += 1;

        let target = self.state.agent.step(action);
        if self.state.is_passable(target) {
            self.state.agent = target;
            let (x, y) = (target.x as usize, target.y as usize);
            match self.state.grid[y][x] {
                CellType::Pellet => {
                    self.state.grid[y][x] = CellType::Empty;
                    self.state.goals_remaining -= 1;
                    self.state.score += 10;
                }
                CellType::PowerPellet => {
                    self.state.grid[y][x] = CellType::Empty;
                    self.state.power_mode = true;
                    self.power_left = POWER_TICKS;
                    self.state.score += 50;
                    for opponent in &mut self.state.opponents {
                        if opponent.mode == OpponentMode::Hunting {
                            opponent.mode = OpponentMode::Frightened;
                        }
                    }
                }
                _ => {}
            }
        }

        self.resolve_contacts();
        if self.ticks % 2 == 0 {
            self.move_opponents();
            self.resolve_contacts();
        }

        if self.power_left > 0 {
            self.power_left -= 1;
            if self.power_left == 0 {
                self.state.power_mode = false;
                for opponent in &mut self.state.opponents {
                    if opponent.mode == OpponentMode::Frightened {
                        opponent.mode = OpponentMode::Hunting;
                    }
                }
            }
        }
    }

    fn is_done(&self) -> bool {
        self.state.lives == 0 || self.state.goals_remaining == 0 || self.ticks >= MAX_TICKS
    }

    fn restart(&mut self) {
        let mut grid = Vec::with_capacity(LAYOUT.len());
        let mut goals = 0;
        for (y, row) in LAYOUT.iter().enumerate() {
            let mut cells = Vec::with_capacity(row.len());
            for (x, c) in row.chars().enumerate() {
                let cell = match c {
                    '#' => CellType::Wall,
                    '.' => CellType::Pellet,
                    'o' => CellType::PowerPellet,
                    'G' => {
                        self.opponent_spawn = Position::new(x as i32, y as i32);
                        CellType::OpponentSpawn
                    }
                    'P' => {
                        self.spawn = Position::new(x as i32, y as i32);
                        CellType::AgentSpawn
                    }
                    _ => CellType::Empty,
                };
                if cell == CellType::Pellet {
                    goals += 1;
                }
                cells.push(cell);
            }
            grid.push(cells);
        }

        self.state = StateSnapshot {
            grid,
            agent: self.spawn,
            opponents: vec![Opponent {
                position: self.opponent_spawn,
                kind: OpponentKind::Chaser,
                mode: OpponentMode::Hunting,
            }],
            goals_remaining: goals,
            power_mode: false,
            score: 0,
            lives: 3,
        };
        self.power_left = 0;
        self.ticks = 0;
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let mut agent = AgentBuilder::new()
        .hidden_layers(&[128, 64])
        .learning_rate(0.0005)
        .memory_size(20_000)
        .batch_size(32)
        .target_update_frequency(500)
        .epsilon_decay(0.9998)
        .build()?;
    let mut last_logged = 0;
    agent.on_metrics(move |metrics| {
        if metrics.episode % 25 == 0 && metrics.episode != last_logged {
            last_logged = metrics.episode;
            info!(episode = metrics.episode, average_score = metrics.average_score, "progress");
        }
    });

    let mut session = TrainingSession::new(Maze::new(), agent);
    info!(ticks = TRAINING_TICKS, "training");
    session.run(TRAINING_TICKS);

    let metrics = session.agent().metrics().clone();
    info!(
        episodes = session.episodes(),
        best_score = metrics.best_score,
        average_score = metrics.average_score,
        epsilon = metrics.epsilon,
        "training finished"
    );

    session.agent_mut().set_mode(AgentMode::Evaluation);
    let mut score = 0;
    while !session.tick().done {
        score = session.environment().observe().score;
    }
    info!(score, "greedy episode");

    let path = std::env::temp_dir().join("chase_model.json");
    session.agent().save_model_to(&path)?;
    info!(path = %path.display(), "saved model");
    Ok(())
}
