#![forbid(unsafe_code)]

//! Render kernel: colors, cells, the drawing surface, and frame diffs.
//!
//! Screens draw into a [`Surface`]; the terminal embedding diffs successive
//! surfaces and only writes what changed.

pub mod cell;
pub mod diff;
pub mod surface;

pub use cell::{Cell, Rgb};
pub use diff::{ChangeRun, SurfaceDiff};
pub use surface::Surface;

/// Display width of `text` in cells.
///
/// Control characters count as zero; East Asian wide characters count as two.
#[must_use]
pub fn text_width(text: &str) -> usize {
    if text.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return text.len();
    }
    unicode_width::UnicodeWidthStr::width(text)
}

/// Display width of a single character in cells.
#[inline]
#[must_use]
pub fn char_width(ch: char) -> usize {
    if ch.is_ascii() {
        return usize::from(!ch.is_ascii_control());
    }
    unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_width_is_byte_length() {
        assert_eq!(text_width("hello"), 5);
        assert_eq!(text_width(""), 0);
    }

    #[test]
    fn wide_chars_count_double() {
        assert_eq!(char_width('日'), 2);
        assert_eq!(text_width("日本"), 4);
    }

    #[test]
    fn control_chars_are_zero_width() {
        assert_eq!(char_width('\n'), 0);
        assert_eq!(char_width('\u{7}'), 0);
    }
}
