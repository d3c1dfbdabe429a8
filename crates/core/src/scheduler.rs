//! Hazard scheduler - decides when, where and which hazard appears
//!
//! Levels below [`CARRIER_LEVEL`] use a random countdown and drop hazards at
//! a random column above the board. From that level on, a carrier sweeps back
//! and forth over the board and releases hazards beneath itself on its own
//! timer.

use log::debug;

use crate::board::Board;
use crate::persistence::ProgressionConfig;
use crate::rng::SimpleRng;
use crate::types::{
    HazardVariant, BOARD_WIDTH, CARRIER_DROP_ROW, CARRIER_LEVEL, CARRIER_MAX_X, CARRIER_MIN_X,
    CARRIER_SPEED, HAZARD_BASE_SPEED, HAZARD_MAX_SPEED, HAZARD_SPAWN_ROW, HAZARD_SPEED_STEP,
};

/// How the variant of each spawn is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnMode {
    /// Always the same variant.
    Fixed(HazardVariant),
    /// Walk the configured order as the stomp counter grows.
    Progressive,
}

/// A hazard the session should create this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub variant: HazardVariant,
    pub x: i8,
    pub y: f32,
    pub speed: f32,
    pub direction: i8,
}

/// The overhead carrier used at higher levels.
#[derive(Debug, Clone, PartialEq)]
pub struct Carrier {
    /// Left edge, in columns (may be off-board).
    pub x: f32,
    direction: f32,
    timer_ms: u32,
    interval_ms: u32,
}

/// Carrier body width in columns; drops happen under its middle.
pub const CARRIER_WIDTH: f32 = 3.0;

impl Carrier {
    fn new(rng: &mut SimpleRng) -> Self {
        Self {
            x: CARRIER_MIN_X,
            direction: 1.0,
            timer_ms: 0,
            interval_ms: rng.range_inclusive(15_000, 30_000),
        }
    }

    fn sweep(&mut self, dt: f32) {
        self.x += CARRIER_SPEED * self.direction * dt;
        if self.x >= CARRIER_MAX_X {
            self.x = CARRIER_MAX_X;
            self.direction = -1.0;
        } else if self.x <= CARRIER_MIN_X {
            self.x = CARRIER_MIN_X;
            self.direction = 1.0;
        }
    }

    /// Board column under the carrier's centre, clamped onto the board.
    pub fn drop_column(&self) -> i8 {
        let center = (self.x + CARRIER_WIDTH / 2.0).floor() as i32;
        center.clamp(0, BOARD_WIDTH as i32 - 1) as i8
    }

    fn facing(&self) -> i8 {
        if self.direction < 0.0 {
            -1
        } else {
            1
        }
    }
}

/// Fall speed for hazards spawned at `level`.
pub fn hazard_speed(level: u32) -> f32 {
    let steps = level.saturating_sub(1) as f32;
    (HAZARD_BASE_SPEED + HAZARD_SPEED_STEP * steps).min(HAZARD_MAX_SPEED)
}

/// Random spawn interval after the first spawn, in ms.
fn timer_interval_ms(level: u32, rng: &mut SimpleRng) -> u32 {
    let level = level as i64;
    let lo = (20 - level).max(10) as u32;
    let hi = (35 - 2 * level).max(15) as u32;
    rng.range_inclusive(lo * 1000, hi.max(lo) * 1000)
}

#[derive(Debug, Clone)]
pub struct HazardScheduler {
    mode: SpawnMode,
    order: Vec<HazardVariant>,
    stomps_per_tier: u32,
    golden_chance_percent: u32,
    timer_ms: u32,
    interval_ms: u32,
    carrier: Option<Carrier>,
}

impl HazardScheduler {
    pub fn new(mode: SpawnMode, config: &ProgressionConfig, rng: &mut SimpleRng) -> Self {
        Self {
            mode,
            order: config.enemy_order.clone(),
            stomps_per_tier: config.stomps_per_tier.max(1),
            golden_chance_percent: config.golden_chance_percent.min(100),
            timer_ms: 0,
            interval_ms: rng.range_inclusive(20_000, 35_000),
            carrier: None,
        }
    }

    pub fn mode(&self) -> SpawnMode {
        self.mode
    }

    pub fn carrier(&self) -> Option<&Carrier> {
        self.carrier.as_ref()
    }

    /// Milliseconds until the next timer or carrier drop.
    pub fn time_to_next_ms(&self) -> u32 {
        match &self.carrier {
            Some(c) => c.interval_ms.saturating_sub(c.timer_ms),
            None => self.interval_ms.saturating_sub(self.timer_ms),
        }
    }

    /// Variant for the current stomp count, before the golden roll.
    pub fn scheduled_variant(&self, stomps: u32) -> HazardVariant {
        match self.mode {
            SpawnMode::Fixed(v) => v,
            SpawnMode::Progressive => {
                let tier = (stomps / self.stomps_per_tier) as usize;
                self.order
                    .get(tier)
                    .or_else(|| self.order.last())
                    .copied()
                    .unwrap_or(HazardVariant::Green)
            }
        }
    }

    fn pick_variant(&self, stomps: u32, rng: &mut SimpleRng) -> HazardVariant {
        let variant = self.scheduled_variant(stomps);
        if variant != HazardVariant::Golden && rng.chance(self.golden_chance_percent) {
            HazardVariant::Golden
        } else {
            variant
        }
    }

    /// Advance timers and return at most one spawn.
    ///
    /// A spawn whose top-row cell is filled is dropped; the countdown restarts
    /// either way, so there is no retry within the same tick.
    pub fn update(
        &mut self,
        elapsed_ms: u32,
        level: u32,
        stomps: u32,
        board: &Board,
        rng: &mut SimpleRng,
    ) -> Option<SpawnRequest> {
        let (x, y, direction) = if level >= CARRIER_LEVEL {
            let carrier = self.carrier.get_or_insert_with(|| Carrier::new(rng));
            carrier.sweep(elapsed_ms as f32 / 1000.0);
            carrier.timer_ms += elapsed_ms;
            if carrier.timer_ms < carrier.interval_ms {
                return None;
            }
            carrier.timer_ms = 0;
            carrier.interval_ms = if level >= 8 {
                rng.range_inclusive(8_000, 15_000)
            } else {
                rng.range_inclusive(15_000, 25_000)
            };
            (carrier.drop_column(), CARRIER_DROP_ROW, carrier.facing())
        } else {
            self.timer_ms += elapsed_ms;
            if self.timer_ms < self.interval_ms {
                return None;
            }
            self.timer_ms = 0;
            self.interval_ms = timer_interval_ms(level, rng);
            let x = rng.next_range(BOARD_WIDTH as u32) as i8;
            let direction = if rng.next_range(2) == 0 { -1 } else { 1 };
            (x, HAZARD_SPAWN_ROW, direction)
        };

        if board.is_occupied(x, 0) {
            debug!("hazard spawn at column {x} rejected: top cell filled");
            return None;
        }

        let variant = self.pick_variant(stomps, rng);
        Some(SpawnRequest {
            variant,
            x,
            y,
            speed: hazard_speed(level),
            direction,
        })
    }
}
