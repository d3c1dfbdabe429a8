//! Fixed-timestep driver around [`GameState`].
//!
//! Commands are queued as they arrive and applied at the start of the next
//! [`GameLoop::update`], before any simulation tick, so a command never
//! lands in the middle of a lock.

use arrayvec::ArrayVec;
use log::{trace, warn};

use crate::game_state::{CueBuffer, GameState};
use crate::snapshot::GameSnapshot;
use crate::types::{GameAction, GameMode, TICK_MS};

/// Commands buffered between two updates.
pub const MAX_PENDING_COMMANDS: usize = 64;

/// Longest wall-clock gap simulated in one update. Anything beyond is
/// dropped so a stalled terminal cannot trigger a burst of catch-up ticks.
pub const MAX_FRAME_MS: u32 = 250;

#[derive(Debug, Clone)]
pub struct GameLoop {
    state: GameState,
    commands: ArrayVec<GameAction, MAX_PENDING_COMMANDS>,
    accumulator_ms: u32,
}

impl GameLoop {
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            commands: ArrayVec::new(),
            accumulator_ms: 0,
        }
    }

    /// Queue a command for the next update. Returns false if the queue is full.
    pub fn push(&mut self, action: GameAction) -> bool {
        if self.commands.try_push(action).is_err() {
            warn!("command queue full, dropping {}", action.as_str());
            return false;
        }
        true
    }

    pub fn pending(&self) -> usize {
        self.commands.len()
    }

    /// Apply queued commands, then run as many whole ticks as `elapsed_ms`
    /// (plus the leftover from the last call) allows.
    ///
    /// Returns the number of ticks run.
    pub fn update(&mut self, elapsed_ms: u32) -> u32 {
        for action in self.commands.drain(..) {
            let applied = self.state.apply_action(action);
            trace!("command {} applied={applied}", action.as_str());
        }

        if self.state.mode() != GameMode::Playing {
            self.accumulator_ms = 0;
            return 0;
        }

        self.accumulator_ms = (self.accumulator_ms + elapsed_ms).min(MAX_FRAME_MS);
        let mut ticks = 0;
        while self.accumulator_ms >= TICK_MS {
            self.accumulator_ms -= TICK_MS;
            self.state.tick(TICK_MS);
            ticks += 1;
            if self.state.mode() != GameMode::Playing {
                self.accumulator_ms = 0;
                break;
            }
        }
        ticks
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.state.snapshot_into(out);
    }

    pub fn take_cues(&mut self) -> CueBuffer {
        self.state.take_cues()
    }
}
