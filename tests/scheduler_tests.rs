//! Scheduler tests - timer spawns, carrier drops and variant selection

use turtle_tetris::core::scheduler::{HazardScheduler, SpawnMode, SpawnRequest};
use turtle_tetris::core::{Board, ProgressionConfig, SimpleRng};
use turtle_tetris::types::{
    HazardVariant, PieceKind, BOARD_WIDTH, CARRIER_DROP_ROW, HAZARD_SPAWN_ROW, TICK_MS,
};

fn config(golden_chance_percent: u32) -> ProgressionConfig {
    ProgressionConfig {
        golden_chance_percent,
        ..ProgressionConfig::default()
    }
}

/// Run the scheduler for `duration_ms`, collecting `(time, request)` pairs.
fn run(
    scheduler: &mut HazardScheduler,
    rng: &mut SimpleRng,
    board: &Board,
    level: u32,
    duration_ms: u32,
) -> Vec<(u32, SpawnRequest)> {
    let mut spawns = Vec::new();
    let mut now = 0;
    while now < duration_ms {
        now += TICK_MS;
        if let Some(req) = scheduler.update(TICK_MS, level, 0, board, rng) {
            spawns.push((now, req));
        }
    }
    spawns
}

#[test]
fn test_first_timer_spawn_in_window() {
    let mut rng = SimpleRng::new(42);
    let mut scheduler = HazardScheduler::new(SpawnMode::Progressive, &config(0), &mut rng);
    assert!((20_000..=35_000).contains(&scheduler.time_to_next_ms()));

    let spawns = run(&mut scheduler, &mut rng, &Board::new(), 1, 36_000);
    assert_eq!(spawns.len(), 1, "{spawns:?}");

    let (at, req) = spawns[0];
    assert!((20_000..35_000 + TICK_MS).contains(&at), "spawned at {at}");
    assert_eq!(req.variant, HazardVariant::Green);
    assert_eq!(req.y, HAZARD_SPAWN_ROW);
    assert_eq!(req.speed, 1.5);
    assert!((0..BOARD_WIDTH as i8).contains(&req.x));
    assert!(req.direction == 1 || req.direction == -1);
    assert!(scheduler.carrier().is_none());
}

#[test]
fn test_filled_top_row_rejects_every_spawn() {
    let mut board = Board::new();
    for x in 0..BOARD_WIDTH as i8 {
        board.set(x, 0, Some(PieceKind::I));
    }
    let mut rng = SimpleRng::new(7);
    let mut scheduler = HazardScheduler::new(SpawnMode::Progressive, &config(0), &mut rng);

    assert!(run(&mut scheduler, &mut rng, &board, 1, 120_000).is_empty());
}

#[test]
fn test_carrier_takes_over_from_level_four() {
    let mut rng = SimpleRng::new(9);
    let mut scheduler = HazardScheduler::new(SpawnMode::Progressive, &config(0), &mut rng);

    let spawns = run(&mut scheduler, &mut rng, &Board::new(), 4, 30_000 + TICK_MS);
    assert!(scheduler.carrier().is_some());
    assert_eq!(spawns.len(), 1, "{spawns:?}");

    let (_, req) = spawns[0];
    assert_eq!(req.y, CARRIER_DROP_ROW);
    assert!((0..BOARD_WIDTH as i8).contains(&req.x));
    assert!(req.speed > 1.5);
}

#[test]
fn test_carrier_interval_after_drop() {
    let mut rng = SimpleRng::new(11);
    let mut scheduler = HazardScheduler::new(SpawnMode::Progressive, &config(0), &mut rng);
    let board = Board::new();

    for _ in 0..(30_000 / TICK_MS + 2) {
        if scheduler.update(TICK_MS, 5, 0, &board, &mut rng).is_some() {
            let next = scheduler.time_to_next_ms();
            assert!((15_000..=25_000).contains(&next), "next drop in {next}");
            return;
        }
    }
    panic!("carrier never dropped");
}

#[test]
fn test_progressive_variant_tiers() {
    let mut rng = SimpleRng::new(1);
    let scheduler = HazardScheduler::new(SpawnMode::Progressive, &config(0), &mut rng);

    assert_eq!(scheduler.scheduled_variant(0), HazardVariant::Green);
    assert_eq!(scheduler.scheduled_variant(2), HazardVariant::Green);
    assert_eq!(scheduler.scheduled_variant(3), HazardVariant::Red);
    assert_eq!(scheduler.scheduled_variant(6), HazardVariant::Buzzy);
    assert_eq!(scheduler.scheduled_variant(9), HazardVariant::Spiny);
    // Past the end of the order the last entry repeats.
    assert_eq!(scheduler.scheduled_variant(100), HazardVariant::Spiny);
}

#[test]
fn test_fixed_mode_ignores_stomps() {
    let mut rng = SimpleRng::new(1);
    let scheduler =
        HazardScheduler::new(SpawnMode::Fixed(HazardVariant::Red), &config(0), &mut rng);
    assert_eq!(scheduler.mode(), SpawnMode::Fixed(HazardVariant::Red));
    for stomps in [0, 5, 50] {
        assert_eq!(scheduler.scheduled_variant(stomps), HazardVariant::Red);
    }
}

#[test]
fn test_certain_golden_roll_overrides_variant() {
    let mut rng = SimpleRng::new(5);
    let mut scheduler =
        HazardScheduler::new(SpawnMode::Fixed(HazardVariant::Spiny), &config(100), &mut rng);

    let spawns = run(&mut scheduler, &mut rng, &Board::new(), 1, 36_000);
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].1.variant, HazardVariant::Golden);
}
