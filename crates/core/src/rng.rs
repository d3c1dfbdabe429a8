//! RNG module - deterministic randomness for pieces and hazards
//!
//! `SimpleRng` is a 32-bit LCG; the same seed always yields the same game.
//! `PieceQueue` deals pieces from shuffled 7-bags so every kind shows up once
//! per seven draws.

use crate::types::PieceKind;

/// Simple LCG (Numerical Recipes constants).
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    pub fn new(seed: u32) -> Self {
        // Seed 0 is remapped to 1.
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Uniform value in `[0, max)`. Returns 0 when `max` is 0.
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// Uniform value in `[lo, hi]`.
    pub fn range_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        lo + self.next_range(hi - lo + 1)
    }

    /// Uniform float in `[0, 1)`, from the high bits of the state.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Percent roll: true with probability `percent / 100`.
    pub fn chance(&mut self, percent: u32) -> bool {
        self.next_range(100) < percent
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

/// 7-bag piece generator
#[derive(Debug, Clone)]
pub struct PieceQueue {
    bag: [PieceKind; 7],
    bag_index: usize,
    rng: SimpleRng,
    seed: u32,
}

impl PieceQueue {
    pub fn new(seed: u32) -> Self {
        let mut rng = SimpleRng::new(seed);
        let bag = Self::shuffled_bag(&mut rng);
        Self {
            bag,
            bag_index: 0,
            rng,
            seed,
        }
    }

    fn shuffled_bag(rng: &mut SimpleRng) -> [PieceKind; 7] {
        let mut bag = PieceKind::ALL;
        rng.shuffle(&mut bag);
        bag
    }

    /// The bag that follows the current one, computed on a copy of the RNG so
    /// previews never disturb the real sequence.
    fn preview_next_bag(&self) -> [PieceKind; 7] {
        let mut rng = self.rng.clone();
        Self::shuffled_bag(&mut rng)
    }

    pub fn peek(&self) -> PieceKind {
        match self.bag.get(self.bag_index) {
            Some(&kind) => kind,
            None => self.preview_next_bag()[0],
        }
    }

    /// The next five pieces, in draw order. Stack-only.
    pub fn peek_5(&self) -> [PieceKind; 5] {
        let remaining = &self.bag[self.bag_index.min(7)..];
        let next_bag = self.preview_next_bag();
        let mut out = [PieceKind::I; 5];
        for (slot, kind) in out.iter_mut().zip(remaining.iter().chain(next_bag.iter())) {
            *slot = *kind;
        }
        out
    }

    pub fn draw(&mut self) -> PieceKind {
        if self.bag_index >= 7 {
            self.bag = Self::shuffled_bag(&mut self.rng);
            self.bag_index = 0;
        }
        let piece = self.bag[self.bag_index];
        self.bag_index += 1;
        piece
    }

    /// Seed the queue was created with (used to restart the same sequence).
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for PieceQueue {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_is_deterministic() {
        let mut a = SimpleRng::new(12345);
        let mut b = SimpleRng::new(12345);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_ranges_stay_in_bounds() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..1000 {
            let v = rng.range_inclusive(20_000, 35_000);
            assert!((20_000..=35_000).contains(&v));
            let f = rng.next_f32();
            assert!((0.0..1.0).contains(&f));
        }
        assert_eq!(rng.range_inclusive(5, 5), 5);
        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn test_each_bag_holds_all_seven() {
        let mut queue = PieceQueue::new(1);
        for _ in 0..3 {
            let mut drawn: Vec<PieceKind> = (0..7).map(|_| queue.draw()).collect();
            drawn.sort_by_key(|k| k.code());
            assert_eq!(drawn, PieceKind::ALL.to_vec());
        }
    }

    #[test]
    fn test_peek_5_matches_following_draws_across_bag_boundary() {
        let mut queue = PieceQueue::new(99);
        for _ in 0..4 {
            queue.draw();
        }
        let preview = queue.peek_5();
        let drawn: Vec<PieceKind> = (0..5).map(|_| queue.draw()).collect();
        assert_eq!(preview.to_vec(), drawn);
    }

    #[test]
    fn test_peek_after_full_bag_previews_next_bag() {
        let mut queue = PieceQueue::new(1);
        for _ in 0..7 {
            queue.draw();
        }
        let peeked = queue.peek();
        assert_eq!(queue.draw(), peeked);
    }
}
