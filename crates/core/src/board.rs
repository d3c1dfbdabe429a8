//! Board module - the 10x20 playfield
//!
//! Cells are stored in a flat row-major array. Coordinates are `(x, y)` with
//! `x` growing to the right and `y` growing downward; row 0 is the top.
//! Hazards use the same coordinates but may sit on negative rows while they
//! are still above the board.

use arrayvec::ArrayVec;

use crate::types::{Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// A single piece can complete at most four rows.
pub const MAX_CLEARED_ROWS: usize = 4;

/// Rows removed by one clear, in ascending order, as indexed before removal.
pub type ClearedRows = ArrayVec<usize, MAX_CLEARED_ROWS>;

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * (BOARD_WIDTH as usize) + (x as usize))
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Cell at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set a cell. Returns false if out of bounds.
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// In bounds and empty.
    pub fn is_valid(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(None))
    }

    /// In bounds and filled.
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// True if any cell of `shape` placed at `(x, y)` is out of bounds or
    /// overlaps a filled cell.
    pub fn collides(&self, shape: &[(i8, i8)], x: i8, y: i8) -> bool {
        shape
            .iter()
            .any(|&(dx, dy)| !self.is_valid(x + dx, y + dy))
    }

    /// Whether something standing at `(x, row)` has ground beneath it.
    ///
    /// The floor supports the bottom row. A row above the board is supported
    /// only by a filled top row.
    pub fn has_support(&self, x: i8, row: i32) -> bool {
        let below = row + 1;
        if below == BOARD_HEIGHT as i32 {
            return true;
        }
        if below < 0 || below > BOARD_HEIGHT as i32 {
            return false;
        }
        self.is_occupied(x, below as i8)
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        let start = y * BOARD_WIDTH as usize;
        self.cells[start..start + BOARD_WIDTH as usize]
            .iter()
            .all(|cell| cell.is_some())
    }

    /// Remove every full row, shift the rest down and pad the top with empty
    /// rows.
    ///
    /// Returns the cleared row indices as they were before removal, ascending.
    /// With no full rows the board is left untouched.
    pub fn clear_full_rows(&mut self) -> ClearedRows {
        let mut cleared = ClearedRows::new();
        let width = BOARD_WIDTH as usize;
        let mut write_y = BOARD_HEIGHT as usize;

        for read_y in (0..BOARD_HEIGHT as usize).rev() {
            if self.is_row_full(read_y) {
                if cleared.try_push(read_y).is_err() {
                    // More than four full rows cannot come from one lock; keep the row.
                    write_y -= 1;
                    self.move_row(read_y, write_y);
                }
            } else {
                write_y -= 1;
                self.move_row(read_y, write_y);
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = None;
        }

        cleared.reverse();
        cleared
    }

    fn move_row(&mut self, from: usize, to: usize) {
        if from != to {
            let width = BOARD_WIDTH as usize;
            self.cells
                .copy_within(from * width..(from + 1) * width, to * width);
        }
    }

    /// Write `kind` into every cell of `shape` at `(x, y)`.
    ///
    /// Refuses (and writes nothing) when the placement collides.
    pub fn lock_piece(&mut self, shape: &[(i8, i8)], x: i8, y: i8, kind: PieceKind) -> bool {
        if self.collides(shape, x, y) {
            return false;
        }
        for &(dx, dy) in shape {
            self.set(x + dx, y + dy, Some(kind));
        }
        true
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Export as color tokens (0 = empty, see [`PieceKind::code`]).
    pub fn write_u8_grid(&self, out: &mut [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize]) {
        for (y, row) in out.iter_mut().enumerate() {
            let start = y * BOARD_WIDTH as usize;
            for (x, slot) in row.iter_mut().enumerate() {
                *slot = self.cells[start + x].map_or(0, |k| k.code());
            }
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row_except(board: &mut Board, y: i8, holes: &[i8]) {
        for x in 0..BOARD_WIDTH as i8 {
            if !holes.contains(&x) {
                board.set(x, y, Some(PieceKind::I));
            }
        }
    }

    #[test]
    fn test_index_calculation() {
        assert_eq!(Board::index(0, 0), Some(0));
        assert_eq!(Board::index(9, 19), Some(199));
        assert_eq!(Board::index(-1, 0), None);
        assert_eq!(Board::index(10, 0), None);
        assert_eq!(Board::index(0, 20), None);
    }

    #[test]
    fn test_collides_exhaustive_on_single_cell_shape() {
        let mut board = Board::new();
        board.set(4, 10, Some(PieceKind::T));
        let dot = [(0, 0)];

        for y in -2..22i8 {
            for x in -2..12i8 {
                let out = x < 0 || x >= 10 || y < 0 || y >= 20;
                let expected = out || (x == 4 && y == 10);
                assert_eq!(board.collides(&dot, x, y), expected, "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_clear_returns_ascending_pre_removal_rows() {
        let mut board = Board::new();
        fill_row_except(&mut board, 19, &[]);
        fill_row_except(&mut board, 18, &[3]);
        fill_row_except(&mut board, 17, &[]);
        board.set(0, 16, Some(PieceKind::Z));

        let cleared = board.clear_full_rows();
        assert_eq!(cleared.as_slice(), &[17, 19]);

        // Row 18 (with hole) lands on the floor, row 16 sits on top of it.
        assert!(board.is_valid(3, 19));
        assert!(board.is_occupied(0, 19));
        assert_eq!(board.get(0, 18), Some(Some(PieceKind::Z)));
        assert!(board.is_valid(1, 18));
    }

    #[test]
    fn test_support_rules() {
        let mut board = Board::new();
        assert!(board.has_support(0, 19));
        assert!(!board.has_support(0, 18));
        assert!(!board.has_support(0, -1));
        assert!(!board.has_support(0, -3));

        board.set(0, 0, Some(PieceKind::O));
        assert!(board.has_support(0, -1));
        assert!(!board.has_support(0, -2));
    }

    #[test]
    fn test_u8_grid_uses_piece_codes() {
        let mut board = Board::new();
        board.set(2, 5, Some(PieceKind::L));
        let mut grid = [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];
        board.write_u8_grid(&mut grid);
        assert_eq!(grid[5][2], PieceKind::L.code());
        assert_eq!(grid[0][0], 0);
    }
}
