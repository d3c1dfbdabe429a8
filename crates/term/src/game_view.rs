//! GameView: draws a [`GameSnapshot`] into a framebuffer.
//!
//! Pure, no I/O. Each board cell is `cell_w` x `cell_h` terminal cells; the
//! default 2x1 roughly squares the board on common terminal fonts.

use crate::core::{get_shape, GameSnapshot, HazardSnapshot};
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{
    GameMode, GameOverReason, HazardState, HazardVariant, PieceKind, BOARD_HEIGHT, BOARD_WIDTH,
    MAX_LIVES,
};

const PLAYFIELD_BG: Rgb = Rgb::new(30, 30, 40);
const PANEL_BG: Rgb = Rgb::new(0, 0, 0);
const CARRIER_CELLS: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

#[derive(Debug, Clone)]
pub struct GameView {
    cell_w: u16,
    cell_h: u16,
    anchor_y: AnchorY,
    /// Extra shift of the whole layout, from the progression config.
    offset: (i16, i16),
}

impl Default for GameView {
    fn default() -> Self {
        Self::new(2, 1)
    }
}

/// Screen position of the playfield frame.
#[derive(Debug, Clone, Copy)]
struct Layout {
    x: u16,
    y: u16,
    w: u16,
    h: u16,
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
            anchor_y: AnchorY::Center,
            offset: (0, 0),
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    pub fn with_offset(mut self, dx: i16, dy: i16) -> Self {
        self.offset = (dx, dy);
        self
    }

    fn layout(&self, viewport: Viewport) -> Layout {
        let w = BOARD_WIDTH as u16 * self.cell_w + 2;
        let h = BOARD_HEIGHT as u16 * self.cell_h + 2;
        let x = viewport.width.saturating_sub(w) / 2;
        let y = match self.anchor_y {
            AnchorY::Center => viewport.height.saturating_sub(h) / 2,
            AnchorY::Top => 0,
        };
        Layout {
            x: x.saturating_add_signed(self.offset.0),
            y: y.saturating_add_signed(self.offset.1),
            w,
            h,
        }
    }

    /// Render into a reused framebuffer.
    pub fn render_into(&self, snap: &GameSnapshot, viewport: Viewport, fb: &mut FrameBuffer) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let layout = self.layout(viewport);
        self.draw_playfield(fb, snap, layout);
        self.draw_carrier(fb, snap, layout);
        self.draw_hazards(fb, &snap.hazards, layout);
        self.draw_pieces(fb, snap, layout);
        self.draw_side_panel(fb, snap, viewport, layout);
        self.draw_overlay(fb, snap, layout);
    }

    pub fn render(&self, snap: &GameSnapshot, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, viewport, &mut fb);
        fb
    }

    fn fill_cell(&self, fb: &mut FrameBuffer, layout: Layout, x: u16, y: u16, ch: char, style: CellStyle) {
        let px = layout.x + 1 + x * self.cell_w;
        let py = layout.y + 1 + y * self.cell_h;
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    /// Board coordinates that are on screen.
    fn on_board(x: i8, y: i32) -> Option<(u16, u16)> {
        ((0..BOARD_WIDTH as i8).contains(&x) && (0..BOARD_HEIGHT as i32).contains(&y))
            .then_some((x as u16, y as u16))
    }

    fn draw_playfield(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, layout: Layout) {
        let border = CellStyle::new(Rgb::new(200, 200, 200), PANEL_BG);
        let Layout { x, y, w, h } = layout;

        fb.put_char(x, y, '┌', border);
        fb.put_char(x + w - 1, y, '┐', border);
        fb.put_char(x, y + h - 1, '└', border);
        fb.put_char(x + w - 1, y + h - 1, '┘', border);
        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', border);
            fb.put_char(x + dx, y + h - 1, '─', border);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', border);
            fb.put_char(x + w - 1, y + dy, '│', border);
        }

        let empty = CellStyle::new(Rgb::new(90, 90, 100), PLAYFIELD_BG).dim();
        for (row, cells) in snap.board.iter().enumerate() {
            for (col, &code) in cells.iter().enumerate() {
                match PieceKind::from_code(code) {
                    Some(kind) => {
                        self.fill_cell(fb, layout, col as u16, row as u16, '█', piece_style(kind))
                    }
                    None => self.fill_cell(fb, layout, col as u16, row as u16, '·', empty),
                }
            }
        }
    }

    fn draw_pieces(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, layout: Layout) {
        let Some(active) = snap.active else {
            return;
        };
        let shape = get_shape(active.kind, active.rotation);

        if let Some(ghost_y) = snap.ghost_y {
            let ghost = CellStyle::new(Rgb::new(140, 140, 140), PLAYFIELD_BG).dim();
            for &(dx, dy) in shape.iter() {
                if let Some((x, y)) = Self::on_board(active.x + dx, (ghost_y + dy) as i32) {
                    self.fill_cell(fb, layout, x, y, '░', ghost);
                }
            }
        }

        for &(dx, dy) in shape.iter() {
            if let Some((x, y)) = Self::on_board(active.x + dx, (active.y + dy) as i32) {
                self.fill_cell(fb, layout, x, y, '█', piece_style(active.kind).bold());
            }
        }
    }

    fn draw_hazards(&self, fb: &mut FrameBuffer, hazards: &[HazardSnapshot], layout: Layout) {
        for hazard in hazards {
            let Some((x, y)) = Self::on_board(hazard.x, hazard.y.floor() as i32) else {
                continue;
            };
            let px = layout.x + 1 + x * self.cell_w;
            let py = layout.y + 1 + y * self.cell_h + self.cell_h - 1;
            let style = hazard_style(hazard);
            let [a, b] = hazard_glyph(hazard);
            fb.put_char(px, py, a, style);
            if self.cell_w > 1 {
                fb.put_char(px + 1, py, b, style);
            }
        }
    }

    /// The carrier rides the top border.
    fn draw_carrier(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, layout: Layout) {
        let Some(carrier_x) = snap.carrier_x else {
            return;
        };
        let style = CellStyle::new(Rgb::new(230, 230, 230), PANEL_BG).bold();
        let left = carrier_x.floor() as i32;
        for i in 0..CARRIER_CELLS as i32 {
            let col = left + i;
            if !(0..BOARD_WIDTH as i32).contains(&col) {
                continue;
            }
            let px = layout.x + 1 + col as u16 * self.cell_w;
            let ch = if i == 1 { '▼' } else { '▀' };
            fb.fill_rect(px, layout.y, self.cell_w, 1, ch, style);
        }
    }

    fn draw_side_panel(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, viewport: Viewport, layout: Layout) {
        let panel_x = layout.x.saturating_add(layout.w).saturating_add(2);
        if panel_x >= viewport.width || viewport.width - panel_x < 12 {
            return;
        }

        let label = CellStyle::new(Rgb::new(220, 220, 220), PANEL_BG).bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), PANEL_BG);
        let mut y = layout.y;

        for (name, number) in [("SCORE", snap.score), ("LEVEL", snap.level), ("LINES", snap.lines)] {
            fb.put_str(panel_x, y, name, label);
            fb.put_u32(panel_x, y + 1, number, value);
            y += 3;
        }

        fb.put_str(panel_x, y, "LIVES", label);
        let heart = CellStyle::new(Rgb::new(230, 70, 90), PANEL_BG);
        for i in 0..MAX_LIVES as u16 {
            let ch = if i < snap.lives as u16 { '♥' } else { '♡' };
            fb.put_char(panel_x + i * 2, y + 1, ch, heart);
        }
        y += 3;

        fb.put_str(panel_x, y, "STOMPS", label);
        fb.put_u32(panel_x, y + 1, snap.stomps, value);
        y += 3;

        fb.put_str(panel_x, y, "HOLD", label);
        let hold_style = if snap.can_hold { value } else { value.dim() };
        fb.put_str(panel_x, y + 1, snap.hold.map_or("-", |k| k.as_str()), hold_style);
        y += 3;

        fb.put_str(panel_x, y, "NEXT", label);
        for (i, kind) in snap.next_queue.iter().enumerate() {
            let style = if i == 0 { piece_style(*kind).bold() } else { value.dim() };
            fb.put_str(panel_x + i as u16 * 2, y + 1, kind.as_str(), style);
        }
        y += 3;

        let flash = CellStyle::new(Rgb::new(255, 215, 0), PANEL_BG).bold();
        if snap.combo > 0 {
            let end = fb.put_str(panel_x, y, "COMBO x", flash);
            fb.put_u32(end, y, snap.combo as u32, flash);
        }
        y += 1;
        if snap.show_tspin() {
            fb.put_str(panel_x, y, "T-SPIN!", flash);
        }
        y += 1;
        if snap.show_b2b() {
            fb.put_str(panel_x, y, "BACK-TO-BACK", flash);
        }
    }

    fn draw_overlay(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, layout: Layout) {
        let (title, hint) = match snap.mode {
            GameMode::Playing => return,
            GameMode::Ready => ("READY", "any key"),
            GameMode::Paused => ("PAUSED", "p resume"),
            GameMode::GameOver(GameOverReason::ToppedOut) => ("TOPPED OUT", "r restart"),
            GameMode::GameOver(GameOverReason::OutOfLives) => ("NO LIVES", "r restart"),
        };

        let style = CellStyle::new(Rgb::new(255, 255, 255), PANEL_BG).bold();
        let mid_y = layout.y + layout.h / 2;
        for (dy, text) in [(0, title), (1, hint)] {
            let text_w = text.chars().count() as u16;
            let x = layout.x + layout.w.saturating_sub(text_w) / 2;
            let s = if dy == 0 { style } else { style.dim() };
            fb.put_str(x, mid_y + dy, text, s);
        }
    }
}

fn piece_style(kind: PieceKind) -> CellStyle {
    let fg = match kind {
        PieceKind::I => Rgb::new(80, 220, 220),
        PieceKind::O => Rgb::new(240, 220, 80),
        PieceKind::T => Rgb::new(200, 120, 220),
        PieceKind::S => Rgb::new(100, 220, 120),
        PieceKind::Z => Rgb::new(220, 80, 80),
        PieceKind::J => Rgb::new(80, 120, 220),
        PieceKind::L => Rgb::new(255, 165, 0),
    };
    CellStyle::new(fg, PLAYFIELD_BG)
}

fn variant_color(variant: HazardVariant) -> Rgb {
    match variant {
        HazardVariant::Green => Rgb::new(90, 210, 90),
        HazardVariant::Red => Rgb::new(230, 70, 60),
        HazardVariant::Spiny => Rgb::new(245, 150, 40),
        HazardVariant::Buzzy => Rgb::new(100, 120, 230),
        HazardVariant::Golden => Rgb::new(255, 215, 0),
    }
}

fn hazard_style(hazard: &HazardSnapshot) -> CellStyle {
    let fg = variant_color(hazard.variant);
    match hazard.state {
        HazardState::Dying => CellStyle::new(fg.darken(), PLAYFIELD_BG).dim(),
        HazardState::Escaped => CellStyle::new(fg, PLAYFIELD_BG).dim(),
        // Blink red once most of the drain is used up.
        _ if hazard.drain > 0.75 && hazard.frame % 2 == 1 => {
            CellStyle::new(fg, Rgb::new(120, 20, 20)).bold()
        }
        _ => CellStyle::new(fg, PLAYFIELD_BG).bold(),
    }
}

fn hazard_glyph(hazard: &HazardSnapshot) -> [char; 2] {
    let shell = match hazard.variant {
        HazardVariant::Spiny => '✶',
        HazardVariant::Buzzy => '◆',
        HazardVariant::Golden => '★',
        HazardVariant::Green | HazardVariant::Red => '@',
    };
    match hazard.state {
        HazardState::Falling => [shell, 'v'],
        HazardState::Dying => ['x', 'x'],
        HazardState::Escaped => ['^', '^'],
        HazardState::Landed => {
            let stride = hazard.frame % 2 == 0;
            if hazard.direction < 0 {
                [if stride { '<' } else { '‹' }, shell]
            } else {
                [shell, if stride { '>' } else { '›' }]
            }
        }
    }
}
