//! Terminal input: key mapping and auto-shift.
//!
//! Maps `crossterm` key events onto [`crate::types::GameAction`] and turns
//! held direction keys into DAS/ARR repeats. Works in terminals that never
//! report key releases: a held key is considered released once no press for
//! it has arrived within a short timeout.

pub mod handler;
pub mod map;

pub use turtle_tetris_types as types;

pub use handler::{InputHandler, ShiftDirection};
pub use map::{action_for_code, handle_key_event, should_quit};
