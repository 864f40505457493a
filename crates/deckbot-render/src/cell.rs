#![forbid(unsafe_code)]

//! Colors and cells.
//!
//! A [`Cell`] is one character position on a [`Surface`](crate::Surface):
//! a glyph plus foreground and background colors. Wide glyphs occupy their
//! own cell followed by a [`Cell::CONTINUATION`] placeholder that presenters
//! skip.

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const GRAY: Self = Self::new(128, 128, 128);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);
    pub const MAGENTA: Self = Self::new(255, 0, 255);
    /// Highlight color for the selected menu row.
    pub const SKY: Self = Self::new(0, 128, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend towards `other`; `t` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let v = f32::from(a) + (f32::from(b) - f32::from(a)) * t;
            v.round() as u8
        };
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

/// A single character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Cell {
    /// Placeholder occupying the second column of a wide glyph.
    pub const CONTINUATION: Self = Self {
        ch: '\0',
        fg: Rgb::BLACK,
        bg: Rgb::BLACK,
    };

    /// A blank cell with the given background.
    #[inline]
    pub const fn blank(bg: Rgb) -> Self {
        Self {
            ch: ' ',
            fg: Rgb::WHITE,
            bg,
        }
    }

    #[inline]
    pub const fn new(ch: char, fg: Rgb, bg: Rgb) -> Self {
        Self { ch, fg, bg }
    }

    /// Whether this cell is the tail of a wide glyph.
    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.ch == '\0'
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(Rgb::BLACK)
    }
}
