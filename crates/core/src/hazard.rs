//! Hazard module - turtle entities and their per-variant behaviour
//!
//! A hazard is a single-cell creature that drops onto the stack, walks along
//! it and drains a life if it is left standing for too long. Behaviour that
//! differs between variants (what a stomp does, what happens at a ledge,
//! what happens when the drain timer runs out, which frames to animate) is
//! looked up in a static [`VariantBehavior`] table instead of being spread
//! through `match` arms.

use crate::board::Board;
use crate::types::{
    HazardState, HazardVariant, BOARD_WIDTH, GOLDEN_STOMP_BONUS, HAZARD_ANIM_FRAME_MS,
    HAZARD_DYING_MS, HAZARD_ESCAPE_MS, HAZARD_ESCAPE_SPEED, HAZARD_SINK_SPEED,
    HAZARD_WALK_INTERVAL_MS, LIFE_DRAIN_MS, SMART_TURN_LIMIT, STOMP_BONUS,
};

/// Result of locking a piece onto a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StompOutcome {
    /// The hazard starts dying.
    Eliminated {
        bonus: u32,
        extra_life: bool,
        /// Counts toward the stomp counter (life bonus and progression tiers).
        counts_toward_progress: bool,
    },
    /// The hazard survives and the player loses a life.
    Hurt,
    /// The hazard survives; nothing else happens.
    Resisted,
}

/// What a landed hazard does when the next step has no ground under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgeAction {
    Turn,
    StepOff,
}

/// What happens when a landed hazard's drain timer runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    LoseLife,
    Escape,
}

/// Frame counts per animation strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationSet {
    pub falling: u8,
    pub walking: u8,
    pub shell: u8,
}

impl AnimationSet {
    pub fn frames(&self, state: HazardState) -> u8 {
        let n = match state {
            HazardState::Falling => self.falling,
            HazardState::Landed => self.walking,
            HazardState::Dying | HazardState::Escaped => self.shell,
        };
        n.max(1)
    }
}

/// Capability table for one variant.
pub struct VariantBehavior {
    pub stomp: fn(&mut Hazard) -> StompOutcome,
    pub ledge: fn(&mut Hazard) -> LedgeAction,
    pub drain: DrainOutcome,
    pub animation: &'static AnimationSet,
}

static SHELLED_FRAMES: AnimationSet = AnimationSet {
    falling: 2,
    walking: 2,
    shell: 1,
};

static SPINY_FRAMES: AnimationSet = AnimationSet {
    falling: 1,
    walking: 2,
    shell: 1,
};

static GOLDEN_FRAMES: AnimationSet = AnimationSet {
    falling: 2,
    walking: 4,
    shell: 2,
};

static GREEN: VariantBehavior = VariantBehavior {
    stomp: stomp_standard,
    ledge: step_off,
    drain: DrainOutcome::LoseLife,
    animation: &SHELLED_FRAMES,
};

static RED: VariantBehavior = VariantBehavior {
    stomp: stomp_standard,
    ledge: turn_back_limited,
    drain: DrainOutcome::LoseLife,
    animation: &SHELLED_FRAMES,
};

static SPINY: VariantBehavior = VariantBehavior {
    stomp: stomp_spiked,
    ledge: step_off,
    drain: DrainOutcome::LoseLife,
    animation: &SPINY_FRAMES,
};

static BUZZY: VariantBehavior = VariantBehavior {
    stomp: stomp_armored,
    ledge: step_off,
    drain: DrainOutcome::LoseLife,
    animation: &SHELLED_FRAMES,
};

static GOLDEN: VariantBehavior = VariantBehavior {
    stomp: stomp_golden,
    ledge: step_off,
    drain: DrainOutcome::Escape,
    animation: &GOLDEN_FRAMES,
};

pub fn behavior(variant: HazardVariant) -> &'static VariantBehavior {
    match variant {
        HazardVariant::Green => &GREEN,
        HazardVariant::Red => &RED,
        HazardVariant::Spiny => &SPINY,
        HazardVariant::Buzzy => &BUZZY,
        HazardVariant::Golden => &GOLDEN,
    }
}

fn stomp_standard(hazard: &mut Hazard) -> StompOutcome {
    hazard.begin_dying();
    StompOutcome::Eliminated {
        bonus: STOMP_BONUS,
        extra_life: false,
        counts_toward_progress: true,
    }
}

fn stomp_golden(hazard: &mut Hazard) -> StompOutcome {
    hazard.begin_dying();
    StompOutcome::Eliminated {
        bonus: GOLDEN_STOMP_BONUS,
        extra_life: true,
        counts_toward_progress: false,
    }
}

fn stomp_spiked(_hazard: &mut Hazard) -> StompOutcome {
    StompOutcome::Hurt
}

fn stomp_armored(_hazard: &mut Hazard) -> StompOutcome {
    StompOutcome::Resisted
}

fn step_off(_hazard: &mut Hazard) -> LedgeAction {
    LedgeAction::StepOff
}

fn turn_back_limited(hazard: &mut Hazard) -> LedgeAction {
    if hazard.ledge_turns < SMART_TURN_LIMIT {
        hazard.ledge_turns += 1;
        LedgeAction::Turn
    } else {
        LedgeAction::StepOff
    }
}

/// What the session must do after a hazard update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardUpdate {
    Continue,
    /// Drain expired: remove the hazard and take a life.
    Drained,
    /// Death or escape finished: remove the hazard, nothing else.
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hazard {
    pub id: u32,
    pub variant: HazardVariant,
    pub state: HazardState,
    pub x: i8,
    /// Fractional row; the occupied row is `floor(y)`.
    pub y: f32,
    /// Fall speed in rows per second.
    pub speed: f32,
    /// +1 walks right, -1 walks left.
    pub direction: i8,
    drain_ms: u32,
    walk_ms: u32,
    exit_ms: u32,
    ledge_turns: u8,
    frame: u8,
    frame_ms: u32,
}

impl Hazard {
    pub fn new(id: u32, variant: HazardVariant, x: i8, y: f32, speed: f32, direction: i8) -> Self {
        Self {
            id,
            variant,
            state: HazardState::Falling,
            x,
            y,
            speed,
            direction: if direction < 0 { -1 } else { 1 },
            drain_ms: 0,
            walk_ms: 0,
            exit_ms: 0,
            ledge_turns: 0,
            frame: 0,
            frame_ms: 0,
        }
    }

    pub fn behavior(&self) -> &'static VariantBehavior {
        behavior(self.variant)
    }

    pub fn row(&self) -> i32 {
        self.y.floor() as i32
    }

    /// Falling or landed; dying and escaping hazards no longer interact.
    pub fn is_live(&self) -> bool {
        matches!(self.state, HazardState::Falling | HazardState::Landed)
    }

    pub fn occupies(&self, x: i8, row: i32) -> bool {
        self.is_live() && self.x == x && self.row() == row
    }

    pub fn drain_ms(&self) -> u32 {
        self.drain_ms
    }

    pub fn ledge_turns(&self) -> u8 {
        self.ledge_turns
    }

    pub fn frame(&self) -> u8 {
        self.frame
    }

    /// Resolve a stomp through this variant's handler.
    pub fn stomp(&mut self) -> StompOutcome {
        (self.behavior().stomp)(self)
    }

    pub fn begin_dying(&mut self) {
        self.state = HazardState::Dying;
        self.exit_ms = 0;
        self.frame = 0;
    }

    /// Move a landed hazard down with the blocks under it after a line clear.
    pub fn shift_down(&mut self, rows: usize) {
        self.y += rows as f32;
    }

    pub fn update(&mut self, elapsed_ms: u32, board: &Board) -> HazardUpdate {
        self.advance_frame(elapsed_ms);
        let dt = elapsed_ms as f32 / 1000.0;

        match self.state {
            HazardState::Falling => {
                self.fall(dt, board);
                HazardUpdate::Continue
            }
            HazardState::Landed => self.update_landed(elapsed_ms, board),
            HazardState::Dying => {
                self.y += HAZARD_SINK_SPEED * dt;
                self.tick_exit(elapsed_ms, HAZARD_DYING_MS)
            }
            HazardState::Escaped => {
                self.y -= HAZARD_ESCAPE_SPEED * dt;
                self.tick_exit(elapsed_ms, HAZARD_ESCAPE_MS)
            }
        }
    }

    fn tick_exit(&mut self, elapsed_ms: u32, duration_ms: u32) -> HazardUpdate {
        self.exit_ms += elapsed_ms;
        if self.exit_ms >= duration_ms {
            HazardUpdate::Expired
        } else {
            HazardUpdate::Continue
        }
    }

    /// Drop toward `y + speed * dt`, stopping on the first supported row
    /// crossed on the way.
    fn fall(&mut self, dt: f32, board: &Board) {
        let target = self.y + self.speed * dt;
        let from = self.row();
        let to = target.floor() as i32;
        for row in from..=to {
            if board.has_support(self.x, row) {
                self.land(row);
                return;
            }
        }
        self.y = target;
    }

    fn land(&mut self, row: i32) {
        self.state = HazardState::Landed;
        self.y = row as f32;
        self.walk_ms = 0;
    }

    fn update_landed(&mut self, elapsed_ms: u32, board: &Board) -> HazardUpdate {
        if !board.has_support(self.x, self.row()) {
            self.state = HazardState::Falling;
            return HazardUpdate::Continue;
        }

        self.drain_ms += elapsed_ms;
        if self.drain_ms >= LIFE_DRAIN_MS {
            return match self.behavior().drain {
                DrainOutcome::LoseLife => HazardUpdate::Drained,
                DrainOutcome::Escape => {
                    self.state = HazardState::Escaped;
                    self.exit_ms = 0;
                    HazardUpdate::Continue
                }
            };
        }

        self.walk_ms += elapsed_ms;
        while self.walk_ms >= HAZARD_WALK_INTERVAL_MS && self.state == HazardState::Landed {
            self.walk_ms -= HAZARD_WALK_INTERVAL_MS;
            self.walk(board);
        }
        HazardUpdate::Continue
    }

    fn walk(&mut self, board: &Board) {
        let next_x = self.x + self.direction;
        let row = self.row();

        if next_x < 0 || next_x >= BOARD_WIDTH as i8 {
            self.direction = -self.direction;
            return;
        }
        if row >= 0 && board.is_occupied(next_x, row as i8) {
            self.direction = -self.direction;
            return;
        }
        if board.has_support(next_x, row) {
            self.x = next_x;
            return;
        }

        match (self.behavior().ledge)(self) {
            LedgeAction::Turn => self.direction = -self.direction,
            LedgeAction::StepOff => {
                self.x = next_x;
                self.state = HazardState::Falling;
            }
        }
    }

    fn advance_frame(&mut self, elapsed_ms: u32) {
        let frames = self.behavior().animation.frames(self.state);
        self.frame_ms += elapsed_ms;
        while self.frame_ms >= HAZARD_ANIM_FRAME_MS {
            self.frame_ms -= HAZARD_ANIM_FRAME_MS;
            self.frame = self.frame.wrapping_add(1);
        }
        self.frame %= frames;
    }
}
