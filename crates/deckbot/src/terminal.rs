#![forbid(unsafe_code)]

//! Terminal ownership and frame presentation.
//!
//! # Invariants
//!
//! 1. While a [`TerminalSession`] is alive the terminal is in raw mode on the
//!    alternate screen with the cursor hidden.
//! 2. The terminal is restored when the session drops, and also from the
//!    panic hook (release builds abort on panic, so `Drop` never runs there).
//! 3. [`Presenter`] only writes cells that differ from the last presented
//!    frame, one cursor move per changed run.

use std::io::{self, Write};
use std::sync::OnceLock;

use crossterm::style::{Color, Print, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, event, queue, terminal};
use deckbot_render::{Rgb, Surface, SurfaceDiff};
use tracing::info;

/// Raw-mode, alternate-screen session. Restores the terminal on drop.
#[derive(Debug)]
pub struct TerminalSession {
    active: bool,
}

impl TerminalSession {
    pub fn new() -> io::Result<Self> {
        install_panic_hook();

        terminal::enable_raw_mode()?;
        let session = Self { active: true };
        let mut stdout = io::stdout();
        crossterm::execute!(
            stdout,
            terminal::EnterAlternateScreen,
            event::EnableBracketedPaste,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        )?;
        info!("terminal session started");
        Ok(session)
    }

    /// Current size in cells (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn cleanup(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        restore();
        info!("terminal session ended");
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            previous(info);
        }));
    });
}

fn restore() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Reset),
        SetBackgroundColor(Color::Reset),
        event::DisableBracketedPaste,
        cursor::Show,
        terminal::LeaveAlternateScreen
    );
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// Writes surfaces to the terminal, diffing against the previous frame.
#[derive(Debug, Default)]
pub struct Presenter {
    previous: Option<Surface>,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last frame so the next one is written in full.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Write the cells of `surface` that changed. Returns how many runs were
    /// written.
    pub fn present(&mut self, out: &mut impl Write, surface: &Surface) -> io::Result<usize> {
        let diff = match &self.previous {
            Some(previous) => SurfaceDiff::compute(previous, surface),
            None => SurfaceDiff::full(surface),
        };
        if diff.is_empty() {
            return Ok(0);
        }

        let runs = diff.runs();
        let mut pen: Option<(Rgb, Rgb)> = None;
        for run in &runs {
            queue!(out, cursor::MoveTo(run.x0, run.y))?;
            for x in run.x0..=run.x1 {
                let Some(cell) = surface.get(x, run.y) else {
                    continue;
                };
                if cell.is_continuation() {
                    continue;
                }
                if pen != Some((cell.fg, cell.bg)) {
                    queue!(out, SetForegroundColor(color(cell.fg)), SetBackgroundColor(color(cell.bg)))?;
                    pen = Some((cell.fg, cell.bg));
                }
                queue!(out, Print(cell.ch))?;
            }
        }
        out.flush()?;
        self.previous = Some(surface.clone());
        Ok(runs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_written_in_full() {
        let mut presenter = Presenter::new();
        let mut surface = Surface::new(4, 2);
        surface.draw_text(0, 0, "ab", Rgb::WHITE, Rgb::BLACK);
        let mut out = Vec::new();
        assert_eq!(presenter.present(&mut out, &surface).unwrap(), 2);
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("ab"));
    }

    #[test]
    fn unchanged_frame_writes_nothing() {
        let mut presenter = Presenter::new();
        let surface = Surface::new(4, 2);
        presenter.present(&mut Vec::new(), &surface).unwrap();
        let mut out = Vec::new();
        assert_eq!(presenter.present(&mut out, &surface).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn only_changed_run_is_written() {
        let mut presenter = Presenter::new();
        let mut surface = Surface::new(10, 3);
        presenter.present(&mut Vec::new(), &surface).unwrap();

        surface.draw_text(2, 1, "hey", Rgb::RED, Rgb::BLACK);
        let mut out = Vec::new();
        assert_eq!(presenter.present(&mut out, &surface).unwrap(), 1);
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("hey"));
        // Cursor move to row 2, column 3 (1-based).
        assert!(text.contains("\x1b[2;3H"));
    }

    #[test]
    fn invalidate_forces_full_redraw() {
        let mut presenter = Presenter::new();
        let surface = Surface::new(3, 1);
        presenter.present(&mut Vec::new(), &surface).unwrap();
        presenter.invalidate();
        assert_eq!(presenter.present(&mut Vec::new(), &surface).unwrap(), 1);
    }
}
