//! Turtle Tetris (workspace facade crate).
//!
//! Re-exports the workspace crates under one path:
//! `turtle_tetris::{core, input, term, types}`.

pub use turtle_tetris_core as core;
pub use turtle_tetris_input as input;
pub use turtle_tetris_term as term;
pub use turtle_tetris_types as types;
