//! DAS/ARR input handler for terminal environments.
//!
//! Time only advances through [`InputHandler::update`], so the handler is
//! fully deterministic under test.

use arrayvec::ArrayVec;
use crossterm::event::KeyCode;

use crate::map::action_for_code;
use crate::types::{GameAction, DEFAULT_ARR_MS, DEFAULT_DAS_MS};

/// Actions produced by one update.
pub type InputActions = ArrayVec<GameAction, 32>;

// Without key-release events a single tap would otherwise stay "held" forever.
const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Left,
    Right,
}

impl ShiftDirection {
    fn action(self) -> GameAction {
        match self {
            ShiftDirection::Left => GameAction::MoveLeft,
            ShiftDirection::Right => GameAction::MoveRight,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputHandler {
    horizontal: Option<ShiftDirection>,
    soft_drop_held: bool,
    das_timer_ms: u32,
    arr_accumulator_ms: u32,
    /// Time since the last movement key press.
    idle_ms: u32,
    das_delay_ms: u32,
    arr_rate_ms: u32,
    key_release_timeout_ms: u32,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_DAS_MS, DEFAULT_ARR_MS)
    }

    pub fn with_config(das_delay_ms: u32, arr_rate_ms: u32) -> Self {
        Self {
            horizontal: None,
            soft_drop_held: false,
            das_timer_ms: 0,
            arr_accumulator_ms: 0,
            idle_ms: 0,
            das_delay_ms,
            arr_rate_ms: arr_rate_ms.max(1),
            key_release_timeout_ms: DEFAULT_KEY_RELEASE_TIMEOUT_MS,
        }
    }

    pub fn with_key_release_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.key_release_timeout_ms = timeout_ms;
        self
    }

    pub fn key_release_timeout_ms(&self) -> u32 {
        self.key_release_timeout_ms
    }

    pub fn horizontal(&self) -> Option<ShiftDirection> {
        self.horizontal
    }

    pub fn soft_drop_held(&self) -> bool {
        self.soft_drop_held
    }

    fn start_shift(&mut self, direction: ShiftDirection) -> Option<GameAction> {
        if self.horizontal == Some(direction) {
            return None;
        }
        self.horizontal = Some(direction);
        self.das_timer_ms = 0;
        self.arr_accumulator_ms = 0;
        Some(direction.action())
    }

    fn stop_shift(&mut self) {
        self.horizontal = None;
        self.das_timer_ms = 0;
        self.arr_accumulator_ms = 0;
    }

    /// Returns the immediate action for a movement key, or `None` for keys
    /// this handler does not own and for repeats of a key already held.
    pub fn handle_key_press(&mut self, code: KeyCode) -> Option<GameAction> {
        match action_for_code(code)? {
            GameAction::MoveLeft => {
                self.idle_ms = 0;
                self.start_shift(ShiftDirection::Left)
            }
            GameAction::MoveRight => {
                self.idle_ms = 0;
                self.start_shift(ShiftDirection::Right)
            }
            GameAction::SoftDropHold(_) => {
                self.idle_ms = 0;
                if self.soft_drop_held {
                    return None;
                }
                self.soft_drop_held = true;
                Some(GameAction::SoftDropHold(true))
            }
            _ => None,
        }
    }

    pub fn handle_key_release(&mut self, code: KeyCode) -> Option<GameAction> {
        match action_for_code(code)? {
            GameAction::MoveLeft if self.horizontal == Some(ShiftDirection::Left) => {
                self.stop_shift();
                None
            }
            GameAction::MoveRight if self.horizontal == Some(ShiftDirection::Right) => {
                self.stop_shift();
                None
            }
            GameAction::SoftDropHold(_) if self.soft_drop_held => {
                self.soft_drop_held = false;
                Some(GameAction::SoftDropHold(false))
            }
            _ => None,
        }
    }

    pub fn update(&mut self, elapsed_ms: u32) -> InputActions {
        let mut actions = InputActions::new();

        self.idle_ms = self.idle_ms.saturating_add(elapsed_ms);
        if self.idle_ms > self.key_release_timeout_ms {
            if self.horizontal.is_some() {
                self.stop_shift();
            }
            if self.soft_drop_held {
                self.soft_drop_held = false;
                let _ = actions.try_push(GameAction::SoftDropHold(false));
            }
        }

        let Some(direction) = self.horizontal else {
            return actions;
        };

        let prev_das = self.das_timer_ms;
        self.das_timer_ms = self.das_timer_ms.saturating_add(elapsed_ms);
        if self.das_timer_ms < self.das_delay_ms {
            return actions;
        }

        let excess = if prev_das < self.das_delay_ms {
            self.das_timer_ms - self.das_delay_ms
        } else {
            elapsed_ms
        };
        self.arr_accumulator_ms += excess;
        while self.arr_accumulator_ms >= self.arr_rate_ms {
            let _ = actions.try_push(direction.action());
            self.arr_accumulator_ms -= self.arr_rate_ms;
        }
        actions
    }

    /// Forget held keys without emitting anything.
    pub fn reset(&mut self) {
        self.stop_shift();
        self.soft_drop_held = false;
        self.idle_ms = 0;
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
