//! Pieces module - tetromino shapes, rotation and wall kicks
//!
//! Every kind has a base shape inside a square bounding box (3x3 for JLSTZ,
//! 4x4 for I and O). Each further rotation is the clockwise matrix rotation
//! (transpose then reverse) of the previous one, so rotation state is always
//! one of exactly four shapes.
//!
//! Wall kick tables are authored Cartesian-up (positive `dy` moves up), the
//! board grows downward, so a kick `(dx, dy)` is applied as `(x + dx, y - dy)`.

use crate::types::{PieceKind, Rotation, BOARD_WIDTH};

/// Offset of a single mino relative to piece origin
pub type MinoOffset = (i8, i8);

/// Shape of a piece - 4 mino offsets from piece origin
pub type PieceShape = [MinoOffset; 4];

/// Spawn orientation of each kind, in its bounding box.
fn base_shape(kind: PieceKind) -> PieceShape {
    match kind {
        PieceKind::I => [(0, 1), (1, 1), (2, 1), (3, 1)],
        PieceKind::O => [(1, 0), (2, 0), (1, 1), (2, 1)],
        PieceKind::T => [(1, 0), (0, 1), (1, 1), (2, 1)],
        PieceKind::S => [(1, 0), (2, 0), (0, 1), (1, 1)],
        PieceKind::Z => [(0, 0), (1, 0), (1, 1), (2, 1)],
        PieceKind::J => [(0, 0), (0, 1), (1, 1), (2, 1)],
        PieceKind::L => [(2, 0), (0, 1), (1, 1), (2, 1)],
    }
}

/// Side length of the kind's bounding box.
pub fn box_size(kind: PieceKind) -> i8 {
    match kind {
        PieceKind::I | PieceKind::O => 4,
        _ => 3,
    }
}

/// Rotate a shape a quarter turn clockwise inside an `n`x`n` box.
pub fn rotate_shape_cw(shape: PieceShape, n: i8) -> PieceShape {
    shape.map(|(x, y)| (n - 1 - y, x))
}

/// Get the shape (mino offsets) for a piece kind and rotation.
///
/// The O piece keeps its spawn shape in every orientation.
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    let mut shape = base_shape(kind);
    if kind == PieceKind::O {
        return shape;
    }
    let n = box_size(kind);
    for _ in 0..rotation.index() {
        shape = rotate_shape_cw(shape, n);
    }
    shape
}

/// Column at which a fresh piece appears, centering its box on the board.
pub fn spawn_x(kind: PieceKind) -> i8 {
    (BOARD_WIDTH as i8) / 2 - box_size(kind) / 2
}

/// Five kick candidates per transition.
pub type KickTable = [[(i8, i8); 5]; 8];

/// Kick tables are indexed by transition:
/// 0:0→R 1:R→0 2:R→2 3:2→R 4:2→L 5:L→2 6:L→0 7:0→L
const JLSTZ_KICKS: KickTable = [
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
];

const I_KICKS: KickTable = [
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
];

pub fn get_kick_table(kind: PieceKind) -> &'static KickTable {
    match kind {
        PieceKind::I => &I_KICKS,
        _ => &JLSTZ_KICKS,
    }
}

/// Transition index for rotating away from `from`.
pub fn kick_index(from: Rotation, clockwise: bool) -> usize {
    let base = from.index() * 2;
    if clockwise {
        base % 8
    } else {
        (base + 7) % 8
    }
}

/// Outcome of a successful rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationResult {
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
    /// Kick offset that was used, as authored in the table.
    pub kick: (i8, i8),
}

/// Try to rotate a piece with wall kicks.
///
/// `is_valid(x, y)` reports whether a board cell is free. Returns `None`
/// when every candidate collides; the caller keeps its previous state.
pub fn try_rotate(
    kind: PieceKind,
    rotation: Rotation,
    x: i8,
    y: i8,
    clockwise: bool,
    is_valid: impl Fn(i8, i8) -> bool,
) -> Option<RotationResult> {
    if kind == PieceKind::O {
        return None;
    }

    let new_rotation = if clockwise {
        rotation.rotate_cw()
    } else {
        rotation.rotate_ccw()
    };
    let new_shape = get_shape(kind, new_rotation);
    let kicks = &get_kick_table(kind)[kick_index(rotation, clockwise)];

    kicks.iter().find_map(|&(dx, dy)| {
        let nx = x + dx;
        let ny = y - dy;
        new_shape
            .iter()
            .all(|&(mx, my)| is_valid(nx + mx, ny + my))
            .then_some(RotationResult {
                rotation: new_rotation,
                x: nx,
                y: ny,
                kick: (dx, dy),
            })
    })
}
