//! The full-screen terminal surface.
//!
//! [`TerminalSurface`] owns the terminal for the lifetime of the dashboard:
//! it drains queued view updates, lets the caller lay out views, draws them
//! with ratatui and dispatches key presses to registered handlers.

mod keys;
mod screen;
mod view;

use std::io::{stdout, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute, ExecutableCommand};
use log::debug;
use multi_watch_core::error::Result;
use multi_watch_core::output::UpdateReceiver;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

pub use keys::{Control, KeyBinding, Keybindings};
pub use screen::Screen;
pub use view::{View, MAX_LINES};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Disable raw mode on drop
        let _ = disable_raw_mode();
        let mut stdout = stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
        let _ = stdout.execute(cursor::Show);
    }
}

pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    screen: Screen,
    updates: UpdateReceiver,
    keys: Keybindings,
    // Declared last so the terminal is restored after everything else is dropped.
    _raw_mode_guard: RawModeGuard,
}

impl TerminalSurface {
    /// Switches the terminal to the alternate screen in raw mode.
    ///
    /// The terminal is restored when the surface is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up.
    pub fn new(updates: UpdateReceiver) -> Result<Self> {
        enable_raw_mode()?;
        let raw_mode_guard = RawModeGuard;

        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        let (width, height) = terminal::size()?;

        Ok(Self {
            terminal,
            screen: Screen::new(width, height),
            updates,
            keys: Keybindings::default(),
            _raw_mode_guard: raw_mode_guard,
        })
    }

    /// # Errors
    ///
    /// Returns an error if `key` is already bound.
    pub fn bind(&mut self, key: KeyBinding, handler: impl FnMut() -> Control + 'static) -> Result<()> {
        self.keys.bind(key, handler)
    }

    /// Runs until a key handler asks to quit.
    ///
    /// Each iteration applies queued updates, calls `layout` with the
    /// current screen, draws and then waits briefly for input.
    ///
    /// # Errors
    ///
    /// Returns the first terminal or layout error.
    pub fn main_loop(&mut self, mut layout: impl FnMut(&mut Screen) -> Result<()>) -> Result<()> {
        loop {
            let applied = self.updates.drain(|update| self.screen.apply(update));
            if applied > 0 {
                debug!("Applied {applied} view update(s)");
            }

            let (width, height) = terminal::size()?;
            self.screen.resize(width, height);
            layout(&mut self.screen)?;

            self.terminal.draw(|frame| self.screen.render(frame))?;

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }

            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.keys.dispatch(&key) == Some(Control::Quit) {
                        return Ok(());
                    }
                }
                Event::Resize(width, height) => {
                    debug!("Terminal resized to {width}x{height}");
                    self.terminal.autoresize()?;
                }
                _ => {}
            }
        }
    }
}
