#![forbid(unsafe_code)]

//! The drawing surface screens render into.
//!
//! A [`Surface`] is a row-major grid of [`Cell`]s. All drawing operations
//! clip silently to the surface bounds, so screens may draw without checking
//! sizes first.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height` at all times.
//! 2. A wide glyph at column `x` is always followed by a continuation cell at
//!    `x + 1`; a wide glyph that would not fit is not drawn.
//! 3. `Surface::default()` is a zero-sized surface. It exists so a host can
//!    lend its surface out with `std::mem::take` and get it back later.

use deckbot_core::geometry::Rect;

use crate::cell::{Cell, Rgb};
use crate::char_width;

/// A grid of cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Surface {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Surface {
    /// Create a blank surface.
    pub fn new(width: u16, height: u16) -> Self {
        let len = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            cells: vec![Cell::default(); len],
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The full surface area.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Row-major view of all cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(usize::from(y) * usize::from(self.width) + usize::from(x))
        } else {
            None
        }
    }

    /// Cell at `(x, y)`, or `None` outside the surface.
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Overwrite one cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Change the size, clearing all content.
    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    /// Clear the whole surface to `bg`.
    pub fn fill(&mut self, bg: Rgb) {
        self.cells.fill(Cell::blank(bg));
    }

    /// Clear `rect` (clipped) to `bg`.
    pub fn fill_rect(&mut self, rect: Rect, bg: Rgb) {
        let area = rect.intersection(&self.rect());
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.set(x, y, Cell::blank(bg));
            }
        }
    }

    /// Put one glyph at `(x, y)`.
    ///
    /// Returns the number of columns consumed: 0 for zero-width or clipped
    /// glyphs, 1 or 2 otherwise.
    pub fn put_char(&mut self, x: u16, y: u16, ch: char, fg: Rgb, bg: Rgb) -> u16 {
        let w = char_width(ch);
        if w == 0 || y >= self.height {
            return 0;
        }
        if w == 2 {
            if x.saturating_add(1) >= self.width {
                return 0;
            }
            self.set(x, y, Cell::new(ch, fg, bg));
            self.set(x + 1, y, Cell::CONTINUATION);
            return 2;
        }
        if x >= self.width {
            return 0;
        }
        self.set(x, y, Cell::new(ch, fg, bg));
        1
    }

    /// Draw a single line of text starting at `(x, y)`, clipped at the right
    /// edge. Returns the column just past the last glyph drawn.
    pub fn draw_text(&mut self, x: u16, y: u16, text: &str, fg: Rgb, bg: Rgb) -> u16 {
        let mut col = x;
        for ch in text.chars() {
            if col >= self.width {
                break;
            }
            let w = char_width(ch) as u16;
            if w == 0 {
                continue;
            }
            if self.put_char(col, y, ch, fg, bg) == 0 {
                break;
            }
            col += w;
        }
        col
    }

    /// Draw text horizontally centred in `area` on row `y`.
    pub fn draw_text_centered(&mut self, area: Rect, y: u16, text: &str, fg: Rgb, bg: Rgb) -> u16 {
        let w = crate::text_width(text).min(usize::from(area.width)) as u16;
        let x = area.x + (area.width - w) / 2;
        self.draw_text(x, y, text, fg, bg)
    }

    /// Horizontal line of `ch` from `x` for `len` cells.
    pub fn hline(&mut self, x: u16, y: u16, len: u16, ch: char, fg: Rgb, bg: Rgb) {
        for dx in 0..len {
            self.put_char(x.saturating_add(dx), y, ch, fg, bg);
        }
    }

    /// Vertical line of `ch` from `y` for `len` cells.
    pub fn vline(&mut self, x: u16, y: u16, len: u16, ch: char, fg: Rgb, bg: Rgb) {
        for dy in 0..len {
            self.put_char(x, y.saturating_add(dy), ch, fg, bg);
        }
    }

    /// Single-line box outline along the edges of `rect`.
    pub fn draw_border(&mut self, rect: Rect, fg: Rgb, bg: Rgb) {
        if rect.width < 2 || rect.height < 2 {
            return;
        }
        let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);
        self.hline(rect.x + 1, rect.y, rect.width - 2, '─', fg, bg);
        self.hline(rect.x + 1, bottom, rect.width - 2, '─', fg, bg);
        self.vline(rect.x, rect.y + 1, rect.height - 2, '│', fg, bg);
        self.vline(right, rect.y + 1, rect.height - 2, '│', fg, bg);
        self.put_char(rect.x, rect.y, '┌', fg, bg);
        self.put_char(right, rect.y, '┐', fg, bg);
        self.put_char(rect.x, bottom, '└', fg, bg);
        self.put_char(right, bottom, '┘', fg, bg);
    }

    /// Outline of a circle with radius `r` rows centred on `(cx, cy)`.
    ///
    /// Cells are roughly twice as tall as they are wide, so the horizontal
    /// radius is doubled.
    pub fn draw_ring(&mut self, cx: i32, cy: i32, r: i32, ch: char, fg: Rgb) {
        self.for_each_in_circle(cx, cy, r, |surface, x, y, dist| {
            if (dist - r as f32).abs() < 0.5 {
                let bg = surface.get(x, y).map_or(Rgb::BLACK, |c| c.bg);
                surface.put_char(x, y, ch, fg, bg);
            }
        });
    }

    /// Filled circle with radius `r` rows centred on `(cx, cy)`.
    pub fn draw_disc(&mut self, cx: i32, cy: i32, r: i32, bg: Rgb) {
        self.for_each_in_circle(cx, cy, r, |surface, x, y, dist| {
            if dist <= r as f32 + 0.25 {
                surface.set(x, y, Cell::blank(bg));
            }
        });
    }

    fn for_each_in_circle(
        &mut self,
        cx: i32,
        cy: i32,
        r: i32,
        mut f: impl FnMut(&mut Self, u16, u16, f32),
    ) {
        let r = r.max(0);
        for y in (cy - r - 1)..=(cy + r + 1) {
            for x in (cx - 2 * r - 2)..=(cx + 2 * r + 2) {
                let (Ok(ux), Ok(uy)) = (u16::try_from(x), u16::try_from(y)) else {
                    continue;
                };
                if ux >= self.width || uy >= self.height {
                    continue;
                }
                let dx = (x - cx) as f32 / 2.0;
                let dy = (y - cy) as f32;
                f(self, ux, uy, (dx * dx + dy * dy).sqrt());
            }
        }
    }

    /// Glyphs on row `y` as a string, continuation cells skipped.
    ///
    /// Mostly useful for assertions in tests.
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = usize::from(y) * usize::from(self.width);
        self.cells[start..start + usize::from(self.width)]
            .iter()
            .filter(|c| !c.is_continuation())
            .map(|c| c.ch)
            .collect()
    }

    /// Whether any row contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        (0..self.height).any(|y| self.row_text(y).contains(needle))
    }
}
