//! Read-only view of a session, filled once per frame for renderers.

use arrayvec::ArrayVec;

use crate::game_state::Tetromino;
use crate::hazard::Hazard;
use crate::types::{
    GameMode, HazardState, HazardVariant, PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH,
    LIFE_DRAIN_MS, MAX_HAZARDS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl From<Tetromino> for ActiveSnapshot {
    fn from(value: Tetromino) -> Self {
        Self {
            kind: value.kind,
            rotation: value.rotation,
            x: value.x,
            y: value.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardSnapshot {
    pub id: u32,
    pub variant: HazardVariant,
    pub state: HazardState,
    pub x: i8,
    pub y: f32,
    pub direction: i8,
    pub frame: u8,
    /// Fraction of the drain timer used up, 0.0..=1.0.
    pub drain: f32,
}

impl From<&Hazard> for HazardSnapshot {
    fn from(h: &Hazard) -> Self {
        Self {
            id: h.id,
            variant: h.variant,
            state: h.state,
            x: h.x,
            y: h.y,
            direction: h.direction,
            frame: h.frame(),
            drain: (h.drain_ms() as f32 / LIFE_DRAIN_MS as f32).min(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimersSnapshot {
    pub drop_ms: u32,
    pub lock_ms: u32,
    pub tspin_flash_ms: u32,
    pub b2b_flash_ms: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub board: [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
    pub active: Option<ActiveSnapshot>,
    pub ghost_y: Option<i8>,
    pub hold: Option<PieceKind>,
    pub next_queue: [PieceKind; 5],
    pub can_hold: bool,
    pub mode: GameMode,
    pub episode_id: u32,
    pub seed: u32,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub lives: u8,
    pub combo: i32,
    pub back_to_back: bool,
    pub stomps: u32,
    pub hazards: ArrayVec<HazardSnapshot, MAX_HAZARDS>,
    /// Left edge of the carrier, when one is active.
    pub carrier_x: Option<f32>,
    pub timers: TimersSnapshot,
}

impl GameSnapshot {
    pub fn playable(&self) -> bool {
        self.mode == GameMode::Playing
    }

    pub fn show_tspin(&self) -> bool {
        self.timers.tspin_flash_ms > 0
    }

    pub fn show_b2b(&self) -> bool {
        self.timers.b2b_flash_ms > 0
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            board: [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
            active: None,
            ghost_y: None,
            hold: None,
            next_queue: [PieceKind::I; 5],
            can_hold: true,
            mode: GameMode::Ready,
            episode_id: 0,
            seed: 0,
            score: 0,
            level: 1,
            lines: 0,
            lives: 0,
            combo: -1,
            back_to_back: false,
            stomps: 0,
            hazards: ArrayVec::new(),
            carrier_x: None,
            timers: TimersSnapshot::default(),
        }
    }
}
