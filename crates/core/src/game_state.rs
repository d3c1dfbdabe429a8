//! Game state module - one play session
//!
//! `GameState` owns the board, the active piece, the hazards and every
//! counter of a session. It is advanced by [`GameState::tick`] with a fixed
//! timestep and mutated by [`GameState::apply_action`]. When a piece settles,
//! [`GameState::lock_piece`] runs the lock pipeline in a fixed order:
//!
//! 1. T-Spin check (T piece, last successful move was a rotation, 3 of the 4
//!    box corners blocked)
//! 2. write the piece into the board
//! 3. stomp hazards under the piece's cells, each at most once
//! 4. clear full rows and remove live hazards standing in them
//! 5. score (line table or T-Spin table, back-to-back, combo)
//! 6. level update
//! 7. spawn the next piece, or top out
//!
//! The `last_move_was_rotate` flag is set by a successful rotation and
//! cleared by any successful lateral or downward move. Failed moves and
//! failed rotations leave it alone.

use arrayvec::ArrayVec;
use log::{debug, info, warn};

use crate::board::{Board, ClearedRows};
use crate::hazard::{Hazard, HazardUpdate, StompOutcome};
use crate::persistence::ProgressionConfig;
use crate::pieces::{get_shape, spawn_x, try_rotate, PieceShape};
use crate::rng::{PieceQueue, SimpleRng};
use crate::scheduler::{HazardScheduler, SpawnMode, SpawnRequest};
use crate::scoring::{calculate_drop_score, calculate_level, calculate_score, get_drop_interval_ms};
use crate::snapshot::{ActiveSnapshot, GameSnapshot, HazardSnapshot, TimersSnapshot};
use crate::types::*;

/// Cues buffered between two `take_cues` calls.
pub const MAX_PENDING_CUES: usize = 32;

pub type CueBuffer = ArrayVec<SoundCue, MAX_PENDING_CUES>;

/// Mixed into the seed so hazards and pieces draw from separate streams.
const HAZARD_SEED_SALT: u32 = 0x9E37_79B9;

/// Box corners checked for a T-Spin, relative to the piece origin.
const T_CORNERS: [(i8, i8); 4] = [(0, 0), (2, 0), (0, 2), (2, 2)];

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl Tetromino {
    /// A fresh piece at its spawn position.
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            x: spawn_x(kind),
            y: 0,
        }
    }

    pub fn shape(&self) -> PieceShape {
        get_shape(self.kind, self.rotation)
    }

    /// Absolute board cells.
    pub fn cells(&self) -> [(i8, i8); 4] {
        self.shape().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    pub fn collides(&self, board: &Board) -> bool {
        board.collides(&self.shape(), self.x, self.y)
    }

    /// Resting on something: one row lower would collide.
    pub fn is_grounded(&self, board: &Board) -> bool {
        board.collides(&self.shape(), self.x, self.y + 1)
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    active: Option<Tetromino>,
    hold: Option<PieceKind>,
    next_queue: [PieceKind; 5],
    piece_queue: PieceQueue,
    hazards: ArrayVec<Hazard, MAX_HAZARDS>,
    next_hazard_id: u32,
    scheduler: HazardScheduler,
    hazard_rng: SimpleRng,
    config: ProgressionConfig,
    mode: GameMode,
    /// Increments on restart.
    episode_id: u32,
    score: u32,
    level: u32,
    lines: u32,
    lives: u8,
    /// -1 when no chain is running.
    combo: i32,
    /// The last clearing lock was a difficult clear.
    back_to_back: bool,
    /// Counted stomps (drives life bonuses and progression tiers).
    stomps: u32,
    drop_timer_ms: u32,
    lock_timer_ms: u32,
    /// Lateral moves and rotations that restarted the lock delay of this piece.
    lock_reset_count: u8,
    tspin_flash_ms: u32,
    b2b_flash_ms: u32,
    soft_drop_held: bool,
    can_hold: bool,
    last_move_was_rotate: bool,
    last_event: Option<LockEvent>,
    cues: CueBuffer,
}

impl GameState {
    /// Progressive mode with the default progression config.
    pub fn new(seed: u32) -> Self {
        Self::with_config(seed, SpawnMode::Progressive, ProgressionConfig::default())
    }

    pub fn with_config(seed: u32, mode: SpawnMode, config: ProgressionConfig) -> Self {
        let piece_queue = PieceQueue::new(seed);
        let next_queue = piece_queue.peek_5();
        let mut hazard_rng = SimpleRng::new(seed ^ HAZARD_SEED_SALT);
        let scheduler = HazardScheduler::new(mode, &config, &mut hazard_rng);

        Self {
            board: Board::new(),
            active: None,
            hold: None,
            next_queue,
            piece_queue,
            hazards: ArrayVec::new(),
            next_hazard_id: 1,
            scheduler,
            hazard_rng,
            config,
            mode: GameMode::Ready,
            episode_id: 0,
            score: 0,
            level: 1,
            lines: 0,
            lives: STARTING_LIVES,
            combo: -1,
            back_to_back: false,
            stomps: 0,
            drop_timer_ms: 0,
            lock_timer_ms: 0,
            lock_reset_count: 0,
            tspin_flash_ms: 0,
            b2b_flash_ms: 0,
            soft_drop_held: false,
            can_hold: true,
            last_move_was_rotate: false,
            last_event: None,
            cues: CueBuffer::new(),
        }
    }

    /// Leave `Ready` and spawn the first piece.
    pub fn start(&mut self) {
        if self.mode != GameMode::Ready {
            return;
        }
        self.mode = GameMode::Playing;
        self.can_hold = true;
        self.spawn_piece();
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn is_game_over(&self) -> bool {
        self.mode.is_game_over()
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn seed(&self) -> u32 {
        self.piece_queue.seed()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn combo(&self) -> i32 {
        self.combo
    }

    pub fn back_to_back(&self) -> bool {
        self.back_to_back
    }

    pub fn stomps(&self) -> u32 {
        self.stomps
    }

    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    pub fn last_move_was_rotate(&self) -> bool {
        self.last_move_was_rotate
    }

    pub fn hold_piece(&self) -> Option<PieceKind> {
        self.hold
    }

    pub fn next_queue(&self) -> &[PieceKind; 5] {
        &self.next_queue
    }

    pub fn active(&self) -> Option<Tetromino> {
        self.active
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    pub fn scheduler(&self) -> &HazardScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.board.write_u8_grid(&mut out.board);

        out.active = self.active.map(ActiveSnapshot::from);
        out.ghost_y = self.ghost_y();
        out.hold = self.hold;
        out.next_queue = self.next_queue;
        out.can_hold = self.can_hold;
        out.mode = self.mode;
        out.episode_id = self.episode_id;
        out.seed = self.piece_queue.seed();
        out.score = self.score;
        out.level = self.level;
        out.lines = self.lines;
        out.lives = self.lives;
        out.combo = self.combo;
        out.back_to_back = self.back_to_back;
        out.stomps = self.stomps;

        out.hazards.clear();
        for hazard in &self.hazards {
            let _ = out.hazards.try_push(HazardSnapshot::from(hazard));
        }
        out.carrier_x = self.scheduler.carrier().map(|c| c.x);

        out.timers = TimersSnapshot {
            drop_ms: self.drop_timer_ms,
            lock_ms: self.lock_timer_ms,
            tspin_flash_ms: self.tspin_flash_ms,
            b2b_flash_ms: self.b2b_flash_ms,
        };
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Take the last lock event (consumed by observers).
    pub fn take_last_event(&mut self) -> Option<LockEvent> {
        self.last_event.take()
    }

    /// Drain pending sound cues.
    pub fn take_cues(&mut self) -> CueBuffer {
        std::mem::take(&mut self.cues)
    }

    /// Queue a cue. When nobody drains the buffer the oldest cue makes room,
    /// so the latest events (game over in particular) are always kept.
    fn push_cue(&mut self, cue: SoundCue) {
        if self.cues.is_full() {
            let dropped = self.cues.remove(0);
            warn!("cue buffer full, dropping {dropped:?}");
        }
        self.cues.push(cue);
    }

    /// Draw the next piece and make it active. Returns false on top-out.
    pub fn spawn_piece(&mut self) -> bool {
        let kind = self.piece_queue.draw();
        self.next_queue = self.piece_queue.peek_5();
        self.begin_piece(Tetromino::new(kind))
    }

    fn begin_piece(&mut self, piece: Tetromino) -> bool {
        self.lock_timer_ms = 0;
        self.lock_reset_count = 0;
        self.drop_timer_ms = 0;
        self.last_move_was_rotate = false;

        if piece.collides(&self.board) {
            self.active = None;
            self.end_game(GameOverReason::ToppedOut);
            return false;
        }
        self.active = Some(piece);
        true
    }

    fn end_game(&mut self, reason: GameOverReason) {
        if self.is_game_over() {
            return;
        }
        info!(
            "game over ({reason:?}): score {} level {} lines {}",
            self.score, self.level, self.lines
        );
        self.mode = GameMode::GameOver(reason);
        self.active = None;
        self.soft_drop_held = false;
        self.push_cue(SoundCue::GameOver);
    }

    fn lose_life(&mut self) {
        if self.lives == 0 {
            return;
        }
        self.lives -= 1;
        self.push_cue(SoundCue::LifeLoss);
        if self.lives == 0 {
            self.end_game(GameOverReason::OutOfLives);
        }
    }

    fn gain_life(&mut self) {
        if self.lives < MAX_LIVES {
            self.lives += 1;
            self.push_cue(SoundCue::LifeGain);
        }
    }

    /// Gravity interval for the current level and soft-drop state.
    pub fn drop_interval_ms(&self) -> u32 {
        let base = get_drop_interval_ms(self.level);
        if self.soft_drop_held {
            base.min(SOFT_DROP_INTERVAL_MS)
        } else {
            base
        }
    }

    fn try_move(&mut self, dx: i8, dy: i8) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        if self.board.collides(&active.shape(), active.x + dx, active.y + dy) {
            return false;
        }

        self.active = Some(Tetromino {
            x: active.x + dx,
            y: active.y + dy,
            ..active
        });
        if dy > 0 {
            // A lower row is a fresh settle position.
            self.lock_timer_ms = 0;
            self.lock_reset_count = 0;
        } else {
            self.reset_lock_timer();
        }
        self.last_move_was_rotate = false;
        true
    }

    /// Restart a running lock delay, at most `LOCK_RESET_LIMIT` times per
    /// piece. Moves made while the delay is not running cost nothing.
    fn reset_lock_timer(&mut self) {
        if self.lock_timer_ms > 0 && self.lock_reset_count < LOCK_RESET_LIMIT {
            self.lock_timer_ms = 0;
            self.lock_reset_count += 1;
        }
    }

    fn rotate(&mut self, clockwise: bool) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        let board = &self.board;
        let Some(result) = try_rotate(
            active.kind,
            active.rotation,
            active.x,
            active.y,
            clockwise,
            |x, y| board.is_valid(x, y),
        ) else {
            return false;
        };

        self.active = Some(Tetromino {
            rotation: result.rotation,
            x: result.x,
            y: result.y,
            ..active
        });
        self.reset_lock_timer();
        self.last_move_was_rotate = true;
        self.push_cue(SoundCue::Rotate);
        true
    }

    /// Rows the active piece can fall before it is grounded.
    fn drop_distance(&self) -> i8 {
        let Some(active) = self.active else {
            return 0;
        };
        let shape = active.shape();
        let mut distance = 0;
        while !self.board.collides(&shape, active.x, active.y + distance + 1) {
            distance += 1;
        }
        distance
    }

    /// Drop to the ghost position and lock. Returns the rows dropped.
    fn hard_drop(&mut self) -> u32 {
        let Some(active) = self.active else {
            return 0;
        };
        let distance = self.drop_distance();
        if distance > 0 {
            self.active = Some(Tetromino {
                y: active.y + distance,
                ..active
            });
            self.last_move_was_rotate = false;
        }
        self.score += calculate_drop_score(distance as u32, true);
        self.lock_piece();
        distance as u32
    }

    /// Swap the active piece with the hold slot (once per piece).
    pub fn hold(&mut self) -> bool {
        if !self.can_hold {
            return false;
        }
        let Some(active) = self.active else {
            return false;
        };

        self.can_hold = false;
        match self.hold.replace(active.kind) {
            Some(held) => self.begin_piece(Tetromino::new(held)),
            None => self.spawn_piece(),
        };
        true
    }

    pub fn is_grounded(&self) -> bool {
        self.active
            .map_or(false, |piece| piece.is_grounded(&self.board))
    }

    /// Row the active piece would land on.
    pub fn ghost_y(&self) -> Option<i8> {
        self.active.map(|active| active.y + self.drop_distance())
    }

    fn detect_tspin(&self, piece: &Tetromino) -> bool {
        if piece.kind != PieceKind::T || !self.last_move_was_rotate {
            return false;
        }
        let blocked = T_CORNERS
            .iter()
            .filter(|&&(cx, cy)| !self.board.is_valid(piece.x + cx, piece.y + cy))
            .count();
        blocked >= 3
    }

    /// Lock the active piece and run the lock pipeline.
    pub fn lock_piece(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        let tspin = self.detect_tspin(&active);

        if !self
            .board
            .lock_piece(&active.shape(), active.x, active.y, active.kind)
        {
            self.end_game(GameOverReason::ToppedOut);
            return;
        }
        self.push_cue(SoundCue::Lock);

        let stomped = self.resolve_stomps(&active.cells());

        let cleared = self.board.clear_full_rows();
        let lines = cleared.len();
        let hazards_cleared = self.clear_hazards_on_rows(&cleared);
        if lines > 0 {
            self.push_cue(SoundCue::LineClear);
        }

        if lines > 0 {
            self.combo += 1;
        } else {
            self.combo = -1;
        }
        let result = calculate_score(lines, self.level, tspin, self.combo, self.back_to_back);
        self.score += result.total + hazards_cleared * LINE_CLEAR_HAZARD_BONUS;
        if tspin || lines > 0 {
            self.back_to_back = result.difficult;
        }
        if tspin {
            self.tspin_flash_ms = MESSAGE_FLASH_MS;
        }
        if result.b2b_applied {
            self.b2b_flash_ms = MESSAGE_FLASH_MS;
        }

        self.lines += lines as u32;
        let level = calculate_level(self.lines);
        if level > self.level {
            info!("level up: {} -> {}", self.level, level);
            self.level = level;
            self.push_cue(SoundCue::LevelUp);
        }

        self.last_event = Some(LockEvent {
            lines_cleared: lines as u32,
            line_clear_score: result.total,
            tspin,
            combo: self.combo,
            back_to_back: result.b2b_applied,
            stomps: stomped,
            hazards_cleared,
        });

        if self.mode == GameMode::Playing {
            self.can_hold = true;
            self.spawn_piece();
        }
    }

    /// Run the stomp handler of every live hazard under `cells`.
    ///
    /// Returns how many hazards were eliminated.
    fn resolve_stomps(&mut self, cells: &[(i8, i8)]) -> u32 {
        let mut bonus = 0;
        let mut eliminated = 0;
        let mut counted = 0;
        let mut extra_lives = 0;
        let mut hurts = 0;
        let mut thuds = 0;

        for hazard in self.hazards.iter_mut() {
            if !cells
                .iter()
                .any(|&(x, y)| hazard.occupies(x, y as i32))
            {
                continue;
            }
            match hazard.stomp() {
                StompOutcome::Eliminated {
                    bonus: b,
                    extra_life,
                    counts_toward_progress,
                } => {
                    debug!("stomped {} hazard #{}", hazard.variant.as_str(), hazard.id);
                    bonus += b;
                    eliminated += 1;
                    if extra_life {
                        extra_lives += 1;
                    }
                    if counts_toward_progress {
                        counted += 1;
                    }
                }
                StompOutcome::Hurt => hurts += 1,
                StompOutcome::Resisted => thuds += 1,
            }
        }

        self.score += bonus;
        if eliminated > 0 {
            self.push_cue(SoundCue::Stomp);
        }
        if thuds > 0 {
            self.push_cue(SoundCue::Thud);
        }
        for _ in 0..extra_lives {
            self.gain_life();
        }
        for _ in 0..counted {
            self.stomps += 1;
            if self.stomps % STOMPS_PER_LIFE == 0 {
                self.gain_life();
            }
        }
        for _ in 0..hurts {
            self.lose_life();
        }
        eliminated
    }

    /// Remove live hazards standing in cleared rows and move landed ones down
    /// with the stack. Returns the number removed.
    fn clear_hazards_on_rows(&mut self, cleared: &ClearedRows) -> u32 {
        if cleared.is_empty() {
            return 0;
        }

        let before = self.hazards.len();
        self.hazards.retain(|h| {
            let row = h.row();
            !(h.is_live() && row >= 0 && cleared.contains(&(row as usize)))
        });
        let removed = (before - self.hazards.len()) as u32;

        for hazard in self.hazards.iter_mut() {
            if hazard.state != HazardState::Landed {
                continue;
            }
            let row = hazard.row();
            let below = cleared.iter().filter(|&&r| r as i32 > row).count();
            if below > 0 {
                hazard.shift_down(below);
            }
        }
        removed
    }

    /// Add a hazard. Returns its id, or `None` when the collection is full.
    pub fn spawn_hazard(&mut self, request: SpawnRequest) -> Option<u32> {
        if self.hazards.is_full() {
            debug!("hazard spawn dropped: {} hazards active", self.hazards.len());
            return None;
        }
        let id = self.next_hazard_id;
        self.next_hazard_id = self.next_hazard_id.wrapping_add(1);
        self.hazards.push(Hazard::new(
            id,
            request.variant,
            request.x,
            request.y,
            request.speed,
            request.direction,
        ));
        debug!(
            "spawned {} hazard #{id} at column {}",
            request.variant.as_str(),
            request.x
        );
        Some(id)
    }

    fn update_hazards(&mut self, elapsed_ms: u32) {
        let board = &self.board;
        let mut drained = 0;
        self.hazards.retain(|h| match h.update(elapsed_ms, board) {
            HazardUpdate::Continue => true,
            HazardUpdate::Drained => {
                drained += 1;
                false
            }
            HazardUpdate::Expired => false,
        });
        for _ in 0..drained {
            debug!("hazard drained a life");
            self.lose_life();
        }
    }

    fn update_scheduler(&mut self, elapsed_ms: u32) {
        let request = self.scheduler.update(
            elapsed_ms,
            self.level,
            self.stomps,
            &self.board,
            &mut self.hazard_rng,
        );
        if let Some(request) = request {
            self.spawn_hazard(request);
        }
    }

    fn update_piece(&mut self, elapsed_ms: u32) -> bool {
        if self.active.is_none() {
            return false;
        }

        if self.is_grounded() {
            self.lock_timer_ms += elapsed_ms;
            if self.lock_timer_ms >= LOCK_DELAY_MS {
                self.lock_piece();
                return true;
            }
            return false;
        }

        self.drop_timer_ms += elapsed_ms;
        if self.drop_timer_ms < self.drop_interval_ms() {
            return false;
        }
        self.drop_timer_ms = 0;
        if self.try_move(0, 1) && self.soft_drop_held {
            self.score += calculate_drop_score(1, false);
        }
        true
    }

    /// Advance the session by one timestep.
    ///
    /// Returns true if the active piece moved or locked.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        if self.mode != GameMode::Playing {
            return false;
        }

        self.tspin_flash_ms = self.tspin_flash_ms.saturating_sub(elapsed_ms);
        self.b2b_flash_ms = self.b2b_flash_ms.saturating_sub(elapsed_ms);

        self.update_hazards(elapsed_ms);
        if self.mode != GameMode::Playing {
            return false;
        }
        self.update_scheduler(elapsed_ms);
        self.update_piece(elapsed_ms)
    }

    fn restart(&mut self) {
        let episode_id = self.episode_id.wrapping_add(1);
        let seed = self.piece_queue.seed();
        let mode = self.scheduler.mode();
        let config = self.config.clone();
        *self = Self::with_config(seed, mode, config);
        self.episode_id = episode_id;
        self.start();
    }

    /// Apply a command. Returns true if it changed anything.
    ///
    /// Only `Pause` and `Restart` are honoured outside `Playing`; a finished
    /// session accepts nothing but `Restart`.
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        if action == GameAction::Restart {
            self.restart();
            return true;
        }

        match (self.mode, action) {
            (GameMode::Playing, GameAction::Pause) => {
                self.mode = GameMode::Paused;
                true
            }
            (GameMode::Paused, GameAction::Pause) => {
                self.mode = GameMode::Playing;
                true
            }
            (GameMode::Playing, _) => self.apply_play_action(action),
            _ => false,
        }
    }

    fn apply_play_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::MoveLeft => self.try_move(-1, 0),
            GameAction::MoveRight => self.try_move(1, 0),
            GameAction::SoftDropHold(held) => {
                if held == self.soft_drop_held {
                    return false;
                }
                self.soft_drop_held = held;
                self.drop_timer_ms = 0;
                true
            }
            GameAction::HardDrop => {
                if self.active.is_none() {
                    return false;
                }
                self.hard_drop();
                true
            }
            GameAction::RotateCw => self.rotate(true),
            GameAction::RotateCcw => self.rotate(false),
            GameAction::Hold => self.hold(),
            GameAction::Pause | GameAction::Restart => false,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(seed: u32) -> GameState {
        let mut state = GameState::new(seed);
        state.start();
        state
    }

    fn fill_row_except(state: &mut GameState, y: i8, holes: &[i8]) {
        for x in 0..BOARD_WIDTH as i8 {
            if !holes.contains(&x) {
                state.board.set(x, y, Some(PieceKind::J));
            }
        }
    }

    fn place(state: &mut GameState, kind: PieceKind, rotation: Rotation, x: i8, y: i8) {
        state.active = Some(Tetromino {
            kind,
            rotation,
            x,
            y,
        });
    }

    fn add_landed(state: &mut GameState, variant: HazardVariant, x: i8, row: i8) -> usize {
        let id = state
            .spawn_hazard(SpawnRequest {
                variant,
                x,
                y: row as f32,
                speed: 1.5,
                direction: 1,
            })
            .unwrap();
        let idx = state.hazards.iter().position(|h| h.id == id).unwrap();
        state.hazards[idx].state = HazardState::Landed;
        idx
    }

    /// Vertical I covering column `col`, rows 16-19.
    fn place_vertical_i(state: &mut GameState, col: i8) {
        place(state, PieceKind::I, Rotation::East, col - 2, 16);
    }

    #[test]
    fn test_new_session_is_ready() {
        let state = GameState::new(12345);
        assert_eq!(state.mode(), GameMode::Ready);
        assert_eq!(state.level, 1);
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.combo, -1);
        assert!(state.active.is_none());
    }

    #[test]
    fn test_ready_ignores_actions_until_started() {
        let mut state = GameState::new(1);
        assert!(!state.apply_action(GameAction::MoveLeft));
        assert!(!state.tick(TICK_MS));
        state.start();
        assert_eq!(state.mode(), GameMode::Playing);
        assert!(state.active.is_some());
    }

    #[test]
    fn test_spawn_follows_preview() {
        let mut state = playing(12345);
        let next = state.next_queue[0];
        state.lock_piece();
        assert_eq!(state.active.unwrap().kind, next);
        assert_eq!(state.active.unwrap().x, spawn_x(next));
    }

    #[test]
    fn test_rotation_flag_rules() {
        let mut state = playing(1);
        place(&mut state, PieceKind::T, Rotation::North, 4, 5);

        assert!(state.apply_action(GameAction::RotateCw));
        assert!(state.last_move_was_rotate);

        // East T covers (5,5),(5,6),(6,6),(5,7); block the cell left of it.
        state.board.set(4, 6, Some(PieceKind::O));
        assert!(!state.apply_action(GameAction::MoveLeft));
        assert!(state.last_move_was_rotate);

        assert!(state.apply_action(GameAction::MoveRight));
        assert!(!state.last_move_was_rotate);

        assert!(state.apply_action(GameAction::RotateCcw));
        assert!(state.last_move_was_rotate);
        assert!(state.try_move(0, 1));
        assert!(!state.last_move_was_rotate);
    }

    #[test]
    fn test_blocked_rotation_restores_everything() {
        let mut state = playing(1);
        for y in 0..BOARD_HEIGHT as i8 {
            fill_row_except(&mut state, y, &[]);
        }
        // Carve out exactly the cells of a T pointing north.
        let piece = Tetromino {
            kind: PieceKind::T,
            rotation: Rotation::North,
            x: 4,
            y: 10,
        };
        for (x, y) in piece.cells() {
            state.board.set(x, y, None);
        }
        state.active = Some(piece);
        state.last_move_was_rotate = false;

        assert!(!state.apply_action(GameAction::RotateCw));
        assert!(!state.apply_action(GameAction::RotateCcw));
        assert_eq!(state.active, Some(piece));
        assert!(!state.last_move_was_rotate);
    }

    #[test]
    fn test_lock_writes_piece_color() {
        let mut state = playing(1);
        place(&mut state, PieceKind::S, Rotation::North, 2, 10);
        let cells = state.active.unwrap().cells();
        state.lock_piece();
        for (x, y) in cells {
            assert_eq!(state.board.get(x, y), Some(Some(PieceKind::S)));
        }
    }

    fn tspin_double_setup(state: &mut GameState) {
        fill_row_except(state, 19, &[4]);
        fill_row_except(state, 18, &[3, 4, 5]);
        state.board.set(3, 17, Some(PieceKind::Z));
        place(state, PieceKind::T, Rotation::South, 3, 17);
    }

    #[test]
    fn test_tspin_double_scores_table_value() {
        let mut state = playing(1);
        tspin_double_setup(&mut state);
        state.last_move_was_rotate = true;

        state.lock_piece();
        assert_eq!(state.lines, 2);
        assert_eq!(state.score, 1200);
        assert!(state.back_to_back);
        assert!(state.tspin_flash_ms > 0);
        let ev = state.take_last_event().unwrap();
        assert!(ev.tspin);
        assert_eq!(ev.lines_cleared, 2);
    }

    #[test]
    fn test_tspin_requires_rotation_as_last_move() {
        let mut state = playing(1);
        tspin_double_setup(&mut state);
        state.last_move_was_rotate = false;

        state.lock_piece();
        assert_eq!(state.lines, 2);
        assert_eq!(state.score, 300);
        assert!(!state.back_to_back);
        assert!(!state.take_last_event().unwrap().tspin);
    }

    #[test]
    fn test_zero_line_tspin_awards_flat_bonus() {
        let mut state = playing(1);
        fill_row_except(&mut state, 19, &[0]);
        fill_row_except(&mut state, 18, &[0, 3, 4, 5]);
        state.board.set(3, 17, Some(PieceKind::Z));
        state.board.set(5, 17, Some(PieceKind::Z));
        // T north occupies (4,17),(3,18),(4,18),(5,18); all four corners blocked.
        place(&mut state, PieceKind::T, Rotation::North, 3, 17);
        state.last_move_was_rotate = true;

        state.lock_piece();
        assert_eq!(state.lines, 0);
        assert_eq!(state.score, 100);
        assert_eq!(state.combo, -1);
        assert!(state.back_to_back);
    }

    fn tetris(state: &mut GameState) -> u32 {
        for y in 16..20 {
            fill_row_except(state, y, &[0]);
        }
        place_vertical_i(state, 0);
        let before = state.score;
        state.lock_piece();
        state.score - before
    }

    fn single(state: &mut GameState) -> u32 {
        fill_row_except(state, 19, &[6, 7, 8, 9]);
        place(state, PieceKind::I, Rotation::North, 6, 18);
        let before = state.score;
        state.lock_piece();
        state.score - before
    }

    #[test]
    fn test_back_to_back_tetris_beats_two_singles() {
        let mut state = playing(1);
        let first = tetris(&mut state);
        assert_eq!(first, 800);
        assert_eq!(state.b2b_flash_ms, 0);

        let second = tetris(&mut state);
        // 800 * 3/2 plus combo step 1 at level 1.
        assert_eq!(second, 1200 + 50);
        assert!(state.b2b_flash_ms > 0);
        assert!(state.take_last_event().unwrap().back_to_back);

        let mut other = playing(1);
        let singles = single(&mut other) + single(&mut other);
        assert!(first + second > singles);
    }

    #[test]
    fn test_ordinary_clear_breaks_back_to_back() {
        let mut state = playing(1);
        tetris(&mut state);
        assert!(state.back_to_back);
        single(&mut state);
        assert!(!state.back_to_back);
    }

    #[test]
    fn test_zero_line_lock_resets_combo_but_keeps_b2b() {
        let mut state = playing(1);
        tetris(&mut state);
        assert_eq!(state.combo, 0);

        place(&mut state, PieceKind::O, Rotation::North, 3, 10);
        state.lock_piece();
        assert_eq!(state.combo, -1);
        assert!(state.back_to_back);
    }

    #[test]
    fn test_level_up_emits_cue() {
        let mut state = playing(1);
        state.lines = 9;
        state.take_cues();
        single(&mut state);
        assert_eq!(state.level, 2);
        assert!(state.take_cues().contains(&SoundCue::LevelUp));
    }

    #[test]
    fn test_green_stomp_awards_bonus_once() {
        let mut state = playing(1);
        state.board.set(5, 18, Some(PieceKind::L));
        let idx = add_landed(&mut state, HazardVariant::Green, 5, 17);

        // O box (1,0),(2,0),(1,1),(2,1) at x=4,y=16 covers (5,17).
        place(&mut state, PieceKind::O, Rotation::North, 4, 16);
        state.lock_piece();

        assert_eq!(state.score, STOMP_BONUS);
        assert_eq!(state.hazards[idx].state, HazardState::Dying);
        assert_eq!(state.stomps, 1);
        assert_eq!(state.take_last_event().unwrap().stomps, 1);
        assert!(state.take_cues().contains(&SoundCue::Stomp));
    }

    #[test]
    fn test_golden_stomp_awards_life_and_big_bonus() {
        let mut state = playing(1);
        state.lives = 3;
        state.board.set(5, 18, Some(PieceKind::L));
        add_landed(&mut state, HazardVariant::Golden, 5, 17);

        place(&mut state, PieceKind::O, Rotation::North, 4, 16);
        state.lock_piece();

        assert_eq!(state.score, GOLDEN_STOMP_BONUS);
        assert_eq!(state.lives, 4);
        assert_eq!(state.stomps, 0);
    }

    #[test]
    fn test_spiny_stomp_costs_a_life_and_survives() {
        let mut state = playing(1);
        state.board.set(5, 18, Some(PieceKind::L));
        let idx = add_landed(&mut state, HazardVariant::Spiny, 5, 17);

        place(&mut state, PieceKind::O, Rotation::North, 4, 16);
        state.lock_piece();

        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert_eq!(state.score, 0);
        assert_eq!(state.hazards[idx].state, HazardState::Landed);
    }

    #[test]
    fn test_third_stomp_grants_life() {
        let mut state = playing(1);
        state.lives = 2;
        state.stomps = 2;
        state.board.set(5, 18, Some(PieceKind::L));
        add_landed(&mut state, HazardVariant::Red, 5, 17);

        place(&mut state, PieceKind::O, Rotation::North, 4, 16);
        state.lock_piece();
        assert_eq!(state.stomps, 3);
        assert_eq!(state.lives, 3);
    }

    #[test]
    fn test_buzzy_resists_stomp_but_line_clear_removes_it() {
        let mut state = playing(1);
        fill_row_except(&mut state, 19, &[4]);
        add_landed(&mut state, HazardVariant::Buzzy, 4, 19);

        place_vertical_i(&mut state, 4);
        state.lock_piece();

        assert_eq!(state.lines, 1);
        assert_eq!(state.score, 100 + LINE_CLEAR_HAZARD_BONUS);
        assert!(state.hazards.is_empty());
        let ev = state.take_last_event().unwrap();
        assert_eq!(ev.stomps, 0);
        assert_eq!(ev.hazards_cleared, 1);
        assert!(state.take_cues().contains(&SoundCue::Thud));
    }

    #[test]
    fn test_stomp_takes_precedence_over_line_clear_bonus() {
        let mut state = playing(1);
        fill_row_except(&mut state, 19, &[4]);
        add_landed(&mut state, HazardVariant::Green, 4, 19);

        place_vertical_i(&mut state, 4);
        state.lock_piece();

        assert_eq!(state.score, 100 + STOMP_BONUS);
        let ev = state.take_last_event().unwrap();
        assert_eq!(ev.stomps, 1);
        assert_eq!(ev.hazards_cleared, 0);
        assert_eq!(state.hazards.len(), 1);
        assert_eq!(state.hazards[0].state, HazardState::Dying);
    }

    #[test]
    fn test_landed_hazards_ride_the_stack_down() {
        let mut state = playing(1);
        state.board.set(0, 18, Some(PieceKind::L));
        fill_row_except(&mut state, 19, &[9]);
        let idx = add_landed(&mut state, HazardVariant::Green, 0, 17);

        place_vertical_i(&mut state, 9);
        state.lock_piece();

        assert_eq!(state.lines, 1);
        assert_eq!(state.hazards[idx].row(), 18);
        assert!(state.board.is_occupied(0, 19));
    }

    #[test]
    fn test_drain_costs_exactly_one_life_at_threshold() {
        let mut state = playing(1);
        let idx = add_landed(&mut state, HazardVariant::Green, 0, 19);
        assert_eq!(state.hazards[idx].drain_ms(), 0);

        for _ in 0..(LIFE_DRAIN_MS / TICK_MS - 1) {
            state.update_hazards(TICK_MS);
        }
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.hazards.len(), 1);

        state.update_hazards(TICK_MS);
        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert!(state.hazards.is_empty());
    }

    #[test]
    fn test_last_life_ends_the_session() {
        let mut state = playing(1);
        state.lives = 1;
        state.lose_life();
        assert_eq!(state.mode(), GameMode::GameOver(GameOverReason::OutOfLives));
        assert!(!state.apply_action(GameAction::MoveLeft));
        assert!(!state.tick(TICK_MS));
        assert!(state.take_cues().contains(&SoundCue::GameOver));

        assert!(state.apply_action(GameAction::Restart));
        assert_eq!(state.mode(), GameMode::Playing);
        assert_eq!(state.episode_id(), 1);
        assert_eq!(state.lives, STARTING_LIVES);
    }

    #[test]
    fn test_blocked_spawn_tops_out() {
        let mut state = playing(1);
        for y in 0..2 {
            fill_row_except(&mut state, y, &[0]);
        }
        place(&mut state, PieceKind::O, Rotation::North, 0, 17);
        state.lock_piece();
        assert_eq!(state.mode(), GameMode::GameOver(GameOverReason::ToppedOut));
        assert!(state.active.is_none());
    }

    #[test]
    fn test_hold_once_per_piece() {
        let mut state = playing(12345);
        let first = state.active.unwrap().kind;

        assert!(state.apply_action(GameAction::Hold));
        assert_eq!(state.hold, Some(first));
        assert!(!state.apply_action(GameAction::Hold));

        state.lock_piece();
        assert!(state.can_hold);
        let third = state.active.unwrap().kind;
        assert!(state.apply_action(GameAction::Hold));
        assert_eq!(state.active.unwrap().kind, first);
        assert_eq!(state.hold, Some(third));
    }

    #[test]
    fn test_hard_drop_scores_two_per_row_and_locks() {
        let mut state = playing(1);
        place(&mut state, PieceKind::O, Rotation::North, 3, 0);
        state.apply_action(GameAction::HardDrop);
        // O rows 0-1 fall to rows 18-19.
        assert_eq!(state.score, 36);
        assert!(state.board.is_occupied(4, 19));
        assert!(state.take_last_event().is_some());
    }

    #[test]
    fn test_gravity_and_lock_delay() {
        let mut state = playing(1);
        place(&mut state, PieceKind::O, Rotation::North, 3, 17);

        // 800ms gravity at level 1.
        for _ in 0..(800 / TICK_MS) {
            state.tick(TICK_MS);
        }
        assert_eq!(state.active.unwrap().y, 18);
        assert!(state.is_grounded());

        for _ in 0..(LOCK_DELAY_MS / TICK_MS + 1) {
            state.tick(TICK_MS);
        }
        assert!(state.board.is_occupied(4, 19));
    }

    #[test]
    fn test_move_resets_lock_timer() {
        let mut state = playing(1);
        place(&mut state, PieceKind::O, Rotation::North, 3, 18);
        for _ in 0..20 {
            state.tick(TICK_MS);
        }
        assert!(state.lock_timer_ms > 0);
        assert!(state.apply_action(GameAction::MoveLeft));
        assert_eq!(state.lock_timer_ms, 0);
    }

    #[test]
    fn test_soft_drop_hold_speeds_gravity_and_scores() {
        let mut state = playing(1);
        place(&mut state, PieceKind::O, Rotation::North, 3, 0);
        assert!(state.apply_action(GameAction::SoftDropHold(true)));
        assert!(!state.apply_action(GameAction::SoftDropHold(true)));
        assert_eq!(state.drop_interval_ms(), SOFT_DROP_INTERVAL_MS);

        for _ in 0..4 {
            state.tick(TICK_MS);
        }
        assert_eq!(state.active.unwrap().y, 1);
        assert_eq!(state.score, 1);

        assert!(state.apply_action(GameAction::SoftDropHold(false)));
        assert_eq!(state.drop_interval_ms(), 800);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut state = playing(1);
        add_landed(&mut state, HazardVariant::Green, 0, 19);
        assert!(state.apply_action(GameAction::Pause));
        let before = state.snapshot();
        for _ in 0..100 {
            assert!(!state.tick(TICK_MS));
        }
        assert!(!state.apply_action(GameAction::MoveLeft));
        assert_eq!(state.snapshot(), before);
        assert!(state.apply_action(GameAction::Pause));
        assert_eq!(state.mode(), GameMode::Playing);
    }

    #[test]
    fn test_full_hazard_collection_drops_spawns() {
        let mut state = playing(1);
        for i in 0..MAX_HAZARDS {
            assert!(state
                .spawn_hazard(SpawnRequest {
                    variant: HazardVariant::Green,
                    x: (i % 10) as i8,
                    y: -2.0,
                    speed: 1.5,
                    direction: 1,
                })
                .is_some());
        }
        assert!(state
            .spawn_hazard(SpawnRequest {
                variant: HazardVariant::Green,
                x: 0,
                y: -2.0,
                speed: 1.5,
                direction: 1,
            })
            .is_none());
    }

    #[test]
    fn test_snapshot_carries_hazards() {
        let mut state = playing(1);
        add_landed(&mut state, HazardVariant::Red, 2, 19);
        let snap = state.snapshot();
        assert_eq!(snap.hazards.len(), 1);
        assert_eq!(snap.hazards[0].variant, HazardVariant::Red);
        assert_eq!(snap.hazards[0].x, 2);
        assert_eq!(snap.lives, STARTING_LIVES);
        assert!(snap.playable());
    }

    #[test]
    fn test_one_lock_stomps_each_covered_hazard_once() {
        let mut state = playing(1);
        state.board.set(4, 18, Some(PieceKind::L));
        state.board.set(5, 18, Some(PieceKind::L));
        let green = add_landed(&mut state, HazardVariant::Green, 4, 17);
        let spiny = add_landed(&mut state, HazardVariant::Spiny, 5, 17);
        state.take_cues();

        // O at x=3,y=16 covers (4,16),(5,16),(4,17),(5,17).
        place(&mut state, PieceKind::O, Rotation::North, 3, 16);
        state.lock_piece();

        assert_eq!(state.score, STOMP_BONUS);
        assert_eq!(state.stomps, 1);
        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert_eq!(state.hazards[green].state, HazardState::Dying);
        assert_eq!(state.hazards[spiny].state, HazardState::Landed);
        assert_eq!(state.take_last_event().unwrap().stomps, 1);

        let cues = state.take_cues();
        assert_eq!(cues.iter().filter(|&&c| c == SoundCue::Stomp).count(), 1);
        assert_eq!(cues.iter().filter(|&&c| c == SoundCue::LifeLoss).count(), 1);

        // The dying green is out of play; the surviving spiny is hit again.
        // I East at x=2,y=10 covers column 4, rows 10-13.
        place(&mut state, PieceKind::I, Rotation::East, 2, 10);
        let before = state.score;
        state.hazards[green].y = 11.0;
        state.hazards[spiny].x = 4;
        state.hazards[spiny].y = 12.0;
        state.lock_piece();
        assert_eq!(state.score, before);
        assert_eq!(state.stomps, 1);
        assert_eq!(state.lives, STARTING_LIVES - 2);
    }

    #[test]
    fn test_hold_into_empty_slot_can_top_out() {
        let mut state = playing(12345);
        for y in 0..2 {
            fill_row_except(&mut state, y, &[]);
        }
        state.take_cues();

        assert!(state.apply_action(GameAction::Hold));
        assert_eq!(state.mode(), GameMode::GameOver(GameOverReason::ToppedOut));
        assert!(state.active.is_none());
        assert!(state.take_cues().contains(&SoundCue::GameOver));
    }

    #[test]
    fn test_hold_swap_can_top_out() {
        let mut state = playing(12345);
        let first = state.active.unwrap().kind;
        assert!(state.apply_action(GameAction::Hold));
        assert_eq!(state.hold, Some(first));

        state.can_hold = true;
        for y in 0..2 {
            fill_row_except(&mut state, y, &[]);
        }
        state.take_cues();

        assert!(state.apply_action(GameAction::Hold));
        assert_eq!(state.mode(), GameMode::GameOver(GameOverReason::ToppedOut));
        assert!(state.take_cues().contains(&SoundCue::GameOver));
        assert!(!state.apply_action(GameAction::Hold));
    }

    #[test]
    fn test_lock_reset_limit() {
        let mut state = playing(1);
        place(&mut state, PieceKind::O, Rotation::North, 3, 18);

        for i in 0..LOCK_RESET_LIMIT {
            state.tick(TICK_MS);
            assert!(state.lock_timer_ms > 0);
            let action = if i % 2 == 0 {
                GameAction::MoveLeft
            } else {
                GameAction::MoveRight
            };
            assert!(state.apply_action(action));
            assert_eq!(state.lock_timer_ms, 0);
        }
        assert_eq!(state.lock_reset_count, LOCK_RESET_LIMIT);

        // Out of resets: the move still happens but the delay keeps running.
        state.tick(TICK_MS);
        assert!(state.apply_action(GameAction::MoveRight));
        assert_eq!(state.lock_timer_ms, TICK_MS);
        assert_eq!(state.active.unwrap().x, 3);

        for _ in 0..(LOCK_DELAY_MS / TICK_MS) {
            state.tick(TICK_MS);
        }
        assert!(state.board.is_occupied(4, 19));
        assert!(state.board.is_occupied(5, 18));
        assert_eq!(state.lock_reset_count, 0);
    }

    #[test]
    fn test_lower_row_restores_lock_resets() {
        let mut state = playing(1);
        place(&mut state, PieceKind::O, Rotation::North, 3, 0);
        state.lock_reset_count = LOCK_RESET_LIMIT;
        state.lock_timer_ms = 100;

        assert!(state.try_move(0, 1));
        assert_eq!(state.lock_reset_count, 0);
        assert_eq!(state.lock_timer_ms, 0);
    }

    #[test]
    fn test_full_cue_buffer_keeps_latest() {
        let mut state = playing(1);
        state.take_cues();
        for _ in 0..MAX_PENDING_CUES + 8 {
            state.push_cue(SoundCue::Rotate);
        }
        state.push_cue(SoundCue::GameOver);

        let cues = state.take_cues();
        assert_eq!(cues.len(), MAX_PENDING_CUES);
        assert_eq!(cues.last(), Some(&SoundCue::GameOver));
    }
}
