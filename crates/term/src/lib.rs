//! Terminal rendering for the game.
//!
//! [`GameView`] turns a snapshot into a [`FrameBuffer`]; [`TerminalRenderer`]
//! writes framebuffers to the terminal, redrawing only what changed. No
//! widget toolkit is involved.

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use turtle_tetris_core as core;
pub use turtle_tetris_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{AnchorY, GameView, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
