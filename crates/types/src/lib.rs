//! Core types module - shared data structures and constants
//!
//! This module defines the vocabulary shared by the gameplay core, the input
//! collector and the terminal view. Everything here is plain data; the only
//! dependency is `serde`, used so hazard variants can be named in the
//! progression config file.
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 at the top)
//!
//! # Game Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Fixed timestep interval (~60 FPS) |
//! | `BASE_DROP_MS` | 800 | Gravity at level 1 |
//! | `DROP_STEP_MS` | 50 | Gravity speed-up per level |
//! | `DROP_INTERVAL_MIN_MS` | 100 | Fastest gravity |
//! | `SOFT_DROP_INTERVAL_MS` | 50 | Gravity while soft drop is held |
//! | `LOCK_DELAY_MS` | 500 | Grounded time before a piece locks |
//! | `LOCK_RESET_LIMIT` | 15 | Max lock timer resets per piece |
//! | `LIFE_DRAIN_MS` | 10000 | Time a landed hazard may stay before it costs a life |
//!
//! # Examples
//!
//! ```
//! use turtle_tetris_types::{HazardVariant, PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! let piece = PieceKind::from_str("t").unwrap();
//! assert_eq!(piece, PieceKind::T);
//! assert_eq!(PieceKind::from_code(piece.code()), Some(PieceKind::T));
//!
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//! assert_eq!(HazardVariant::from_str("buzzy_beetle"), Some(HazardVariant::Buzzy));
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

use serde::{Deserialize, Serialize};

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Gravity interval at level 1.
pub const BASE_DROP_MS: u32 = 800;

/// Gravity gets this much faster with every level.
pub const DROP_STEP_MS: u32 = 50;

/// Absolute minimum drop interval (100ms)
pub const DROP_INTERVAL_MIN_MS: u32 = 100;

/// Gravity interval while soft drop is held.
pub const SOFT_DROP_INTERVAL_MS: u32 = 50;

/// Lock delay when piece is grounded (500ms)
pub const LOCK_DELAY_MS: u32 = 500;

/// Maximum number of lock delay resets per piece
pub const LOCK_RESET_LIMIT: u8 = 15;

/// DAS (Delayed Auto Shift) delay in milliseconds.
pub const DEFAULT_DAS_MS: u32 = 150;

/// ARR (Auto Repeat Rate) in milliseconds.
pub const DEFAULT_ARR_MS: u32 = 60;

/// Lines needed per level.
pub const LINES_PER_LEVEL: u32 = 10;

/// How long "T-SPIN" / "B2B" banners stay on screen.
pub const MESSAGE_FLASH_MS: u32 = 1000;

/// Upper bound of the life pool.
pub const MAX_LIVES: u8 = 5;

/// Lives at the start of a session.
pub const STARTING_LIVES: u8 = 5;

/// A landed hazard that survives this long costs a life (or escapes, if golden).
pub const LIFE_DRAIN_MS: u32 = 10_000;

/// Interval between walk steps of a landed hazard.
pub const HAZARD_WALK_INTERVAL_MS: u32 = 500;

/// Duration of the death animation after a stomp.
pub const HAZARD_DYING_MS: u32 = 2_000;

/// Duration of the escape animation of a golden hazard.
pub const HAZARD_ESCAPE_MS: u32 = 1_000;

/// Sink speed while dying (rows per second).
pub const HAZARD_SINK_SPEED: f32 = 10.0;

/// Rise speed while escaping (rows per second).
pub const HAZARD_ESCAPE_SPEED: f32 = 3.0;

/// Fall speed at level 1 (rows per second).
pub const HAZARD_BASE_SPEED: f32 = 1.5;

/// Fall speed added per level.
pub const HAZARD_SPEED_STEP: f32 = 0.1;

/// Fall speed cap.
pub const HAZARD_MAX_SPEED: f32 = 4.0;

/// Row at which timer-spawned hazards appear (above the board).
pub const HAZARD_SPAWN_ROW: f32 = -2.0;

/// Row at which carrier-dropped hazards appear.
pub const CARRIER_DROP_ROW: f32 = -1.0;

/// Animation frame duration for hazards.
pub const HAZARD_ANIM_FRAME_MS: u32 = 200;

/// How many times a smart hazard turns back at a ledge before stepping off.
pub const SMART_TURN_LIMIT: u8 = 3;

/// Capacity of the hazard collection.
pub const MAX_HAZARDS: usize = 16;

/// First level at which the carrier replaces the random spawn timer.
pub const CARRIER_LEVEL: u32 = 4;

/// Carrier horizontal speed (columns per second).
pub const CARRIER_SPEED: f32 = 1.6;

/// Carrier sweep bounds (columns, may be off-board).
pub const CARRIER_MIN_X: f32 = -3.0;
pub const CARRIER_MAX_X: f32 = 12.0;

/// Score for stomping a standard hazard.
pub const STOMP_BONUS: u32 = 500;

/// Score for stomping a golden hazard.
pub const GOLDEN_STOMP_BONUS: u32 = 2_500;

/// Score for removing a hazard by clearing the row it stands on.
pub const LINE_CLEAR_HAZARD_BONUS: u32 = 1_000;

/// Every N counted stomps grant an extra life.
pub const STOMPS_PER_LIFE: u32 = 3;

/// Default stomps per progression tier.
pub const STOMPS_PER_TIER: u32 = 3;

/// Number of entries kept in the high-score table.
pub const HIGH_SCORE_SLOTS: usize = 5;


/// The seven tetromino piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// All kinds in bag order.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Parse piece kind from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "o" => Some(PieceKind::O),
            "t" => Some(PieceKind::T),
            "s" => Some(PieceKind::S),
            "z" => Some(PieceKind::Z),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::T => "t",
            PieceKind::S => "s",
            PieceKind::Z => "z",
            PieceKind::J => "j",
            PieceKind::L => "l",
        }
    }

    /// Non-zero color token used in snapshot grids (0 means empty).
    pub fn code(&self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::O => 2,
            PieceKind::T => 3,
            PieceKind::S => 4,
            PieceKind::Z => 5,
            PieceKind::J => 6,
            PieceKind::L => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=7 => Some(Self::ALL[(code - 1) as usize]),
            _ => None,
        }
    }
}

/// Rotation states, in clockwise order starting from spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise (90°)
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotate counter-clockwise (-90°)
    pub fn rotate_ccw(&self) -> Self {
        match self {
            Rotation::North => Rotation::West,
            Rotation::West => Rotation::South,
            Rotation::South => Rotation::East,
            Rotation::East => Rotation::North,
        }
    }

    /// Rotation index 0-3 (number of clockwise quarter turns from spawn).
    pub fn index(&self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }
}

/// Commands accepted by the game loop.
///
/// Both the keyboard collector and tests speak this vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Start (`true`) or stop (`false`) holding soft drop
    SoftDropHold(bool),
    /// Instantly drop piece to lowest valid position and lock it
    HardDrop,
    /// Rotate piece 90° clockwise
    RotateCw,
    /// Rotate piece 90° counter-clockwise
    RotateCcw,
    /// Swap the active piece with the hold slot (once per piece)
    Hold,
    /// Toggle pause state
    Pause,
    /// Restart the session with the same seed and settings
    Restart,
}

impl GameAction {
    /// camelCase name, used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::SoftDropHold(true) => "softDropOn",
            GameAction::SoftDropHold(false) => "softDropOff",
            GameAction::HardDrop => "hardDrop",
            GameAction::RotateCw => "rotateCw",
            GameAction::RotateCcw => "rotateCcw",
            GameAction::Hold => "hold",
            GameAction::Pause => "pause",
            GameAction::Restart => "restart",
        }
    }
}

/// Hazard ("turtle") variants.
///
/// Names match the progression config file; `buzzy_beetle` is accepted as an
/// alias for [`HazardVariant::Buzzy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardVariant {
    /// Walks off ledges without hesitation.
    Green,
    /// Turns back at ledges a few times before stepping off.
    Red,
    /// Cannot be stomped; touching it costs a life.
    Spiny,
    /// Shrugs off stomps with a thud.
    #[serde(alias = "buzzy_beetle")]
    Buzzy,
    /// Rare bonus hazard; escapes instead of draining a life.
    Golden,
}

impl HazardVariant {
    pub const ALL: [HazardVariant; 5] = [
        HazardVariant::Green,
        HazardVariant::Red,
        HazardVariant::Spiny,
        HazardVariant::Buzzy,
        HazardVariant::Golden,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "green" => Some(HazardVariant::Green),
            "red" => Some(HazardVariant::Red),
            "spiny" => Some(HazardVariant::Spiny),
            "buzzy" | "buzzy_beetle" => Some(HazardVariant::Buzzy),
            "golden" => Some(HazardVariant::Golden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardVariant::Green => "green",
            HazardVariant::Red => "red",
            HazardVariant::Spiny => "spiny",
            HazardVariant::Buzzy => "buzzy",
            HazardVariant::Golden => "golden",
        }
    }
}

/// Hazard lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardState {
    /// Dropping through the board at its fall speed.
    Falling,
    /// Standing on support; walking and draining.
    Landed,
    /// Stomped; sinking away before removal.
    Dying,
    /// Leaving the board without penalty.
    Escaped,
}

/// Named audio cues emitted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Rotate,
    Lock,
    LineClear,
    Stomp,
    /// A stomp that did nothing.
    Thud,
    LifeGain,
    LifeLoss,
    LevelUp,
    GameOver,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// The next piece collided at its spawn position.
    ToppedOut,
    /// Hazards drained the last life.
    OutOfLives,
}

/// Top-level session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    /// Created but not started.
    Ready,
    Playing,
    Paused,
    GameOver(GameOverReason),
}

impl GameMode {
    pub fn is_game_over(&self) -> bool {
        matches!(self, GameMode::GameOver(_))
    }
}

/// Core-side event emitted after a piece locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockEvent {
    pub lines_cleared: u32,
    /// Line-clear points including B2B and combo (excludes hazard bonuses).
    pub line_clear_score: u32,
    pub tspin: bool,
    pub combo: i32,
    pub back_to_back: bool,
    /// Hazards eliminated by stomping during this lock.
    pub stomps: u32,
    /// Hazards removed by line clears during this lock.
    pub hazards_cleared: u32,
}

/// A cell on the game board
///
/// - `None`: Empty cell
/// - `Some(PieceKind)`: Cell filled with the specified piece kind
pub type Cell = Option<PieceKind>;

/// Line clear scoring table, multiplied by the level.
///
/// Index is the number of lines cleared (0-4).
pub const LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 800];

/// T-Spin scoring table, multiplied by the level.
///
/// Index 0 is the flat bonus for a T-Spin that clears no lines.
pub const TSPIN_SCORES: [u32; 4] = [100, 800, 1200, 1600];

/// Combo scoring base value (50 points per combo step, times level)
pub const COMBO_BASE: u32 = 50;

/// Back-to-back bonus numerator (3/2 = 1.5x multiplier)
pub const B2B_NUMERATOR: u32 = 3;

/// Back-to-back bonus denominator
pub const B2B_DENOMINATOR: u32 = 2;
