//! Scoring module - line clears, T-Spins, back-to-back, combos and gravity
//!
//! Rules:
//! - Line clears score `LINE_SCORES[lines] * level`.
//! - A T-Spin replaces that table with `TSPIN_SCORES`; a T-Spin that clears
//!   nothing still earns the flat index-0 bonus.
//! - A difficult clear is any T-Spin or a four-line clear. A difficult clear
//!   following a difficult clear gets a 3/2 multiplier on its base points.
//! - Combo bonus is `COMBO_BASE * combo * level` for combo index 1 and up.

use crate::types::{
    B2B_DENOMINATOR, B2B_NUMERATOR, BASE_DROP_MS, COMBO_BASE, DROP_INTERVAL_MIN_MS, DROP_STEP_MS,
    LINES_PER_LEVEL, LINE_SCORES, TSPIN_SCORES,
};

/// Score calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    /// Base points for the clear (includes B2B multiplier, excludes combo bonus).
    pub line_clear_score: u32,
    /// Combo bonus added on top of `line_clear_score`.
    pub combo_bonus: u32,
    pub total: u32,
    /// T-Spin or four lines.
    pub difficult: bool,
    /// Whether a B2B multiplier was applied to this clear.
    pub b2b_applied: bool,
}

pub fn calculate_line_score(lines: usize, level: u32) -> u32 {
    LINE_SCORES.get(lines).copied().unwrap_or(0) * level
}

pub fn calculate_tspin_score(lines: usize, level: u32) -> u32 {
    TSPIN_SCORES.get(lines).copied().unwrap_or(0) * level
}

/// Combo bonus for a combo index (-1 = no chain, 0 = first clear).
pub fn calculate_combo_bonus(combo_index: i32, level: u32) -> u32 {
    if combo_index <= 0 {
        return 0;
    }
    COMBO_BASE * (combo_index as u32) * level
}

pub fn is_difficult_clear(tspin: bool, lines: usize) -> bool {
    tspin || lines == 4
}

pub fn apply_b2b_multiplier(points: u32) -> u32 {
    points.saturating_mul(B2B_NUMERATOR) / B2B_DENOMINATOR
}

/// Score a lock.
///
/// `previous_difficult` is the session's back-to-back flag before this lock.
/// A lock that clears nothing and is not a T-Spin scores zero.
pub fn calculate_score(
    lines: usize,
    level: u32,
    tspin: bool,
    combo_index: i32,
    previous_difficult: bool,
) -> ScoreResult {
    if lines == 0 && !tspin {
        return ScoreResult::default();
    }

    let difficult = is_difficult_clear(tspin, lines);
    let base_points = if tspin {
        calculate_tspin_score(lines, level)
    } else {
        calculate_line_score(lines, level)
    };

    let b2b_applied = difficult && previous_difficult;
    let line_clear_score = if b2b_applied {
        apply_b2b_multiplier(base_points)
    } else {
        base_points
    };

    let combo_bonus = if lines > 0 {
        calculate_combo_bonus(combo_index, level)
    } else {
        0
    };

    ScoreResult {
        line_clear_score,
        combo_bonus,
        total: line_clear_score.saturating_add(combo_bonus),
        difficult,
        b2b_applied,
    }
}

/// soft drop: +1 per cell, hard drop: +2 per cell
pub fn calculate_drop_score(cells: u32, is_hard_drop: bool) -> u32 {
    if is_hard_drop {
        cells * 2
    } else {
        cells
    }
}

/// Levels start at 1 and rise every ten lines.
pub fn calculate_level(total_lines: u32) -> u32 {
    total_lines / LINES_PER_LEVEL + 1
}

/// Gravity interval for a level, floored at 100ms.
pub fn get_drop_interval_ms(level: u32) -> u32 {
    let speedup = level.saturating_sub(1).saturating_mul(DROP_STEP_MS);
    BASE_DROP_MS
        .saturating_sub(speedup)
        .max(DROP_INTERVAL_MIN_MS)
}
