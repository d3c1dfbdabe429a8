//! Core game logic - deterministic, no terminal or file I/O on the hot path
//!
//! A session is a falling-block puzzle with turtle hazards: small creatures
//! that drop onto the stack, walk along it and drain a life if left alone.
//! Locking a piece onto a hazard stomps it; clearing the row it stands in
//! removes it for a bonus.
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 grid with collision, support queries and line clearing
//! - [`pieces`]: shapes, rotation and wall-kick resolution
//! - [`rng`]: seeded LCG and 7-bag piece queue
//! - [`scoring`]: line, T-Spin, back-to-back, combo and drop scoring
//! - [`hazard`]: hazard state machine and per-variant behaviour
//! - [`scheduler`]: timer and carrier hazard spawning
//! - [`game_state`]: session state and the lock pipeline
//! - [`controller`]: fixed-timestep loop with a command queue
//! - [`snapshot`]: render-facing view of a session
//! - [`persistence`]: high scores and progression config (JSON)
//!
//! # Example
//!
//! ```
//! use turtle_tetris_core::{GameLoop, GameState};
//! use turtle_tetris_types::GameAction;
//!
//! let mut state = GameState::new(12345);
//! state.start();
//! let mut game = GameLoop::new(state);
//!
//! game.push(GameAction::MoveRight);
//! game.push(GameAction::HardDrop);
//! game.update(16);
//!
//! assert!(game.state().score() > 0);
//! ```

pub mod board;
pub mod controller;
pub mod game_state;
pub mod hazard;
pub mod persistence;
pub mod pieces;
pub mod rng;
pub mod scheduler;
pub mod scoring;
pub mod snapshot;

pub use turtle_tetris_types as types;

pub use board::Board;
pub use controller::GameLoop;
pub use game_state::{CueBuffer, GameState, Tetromino};
pub use hazard::{Hazard, StompOutcome};
pub use persistence::{AlignmentOffsets, HighScores, PersistError, ProgressionConfig, ScoreEntry};
pub use pieces::{get_shape, try_rotate, RotationResult};
pub use rng::{PieceQueue, SimpleRng};
pub use scheduler::{HazardScheduler, SpawnMode, SpawnRequest};
pub use scoring::{calculate_drop_score, calculate_score, ScoreResult};
pub use snapshot::{ActiveSnapshot, GameSnapshot, HazardSnapshot};
