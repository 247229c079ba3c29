//! Terminal setup and teardown.
//!
//! Entering puts the terminal in raw mode on the alternate screen with
//! bracketed paste on and mouse reporting on. Leaving undoes all of it in
//! reverse order. `restore` does the same without a backend value so the
//! panic hook can call it.

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
        size,
    },
};
use std::io::stdout;
use tracing::{debug, warn};

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
    /// Turn mouse reporting on or off. No-op when already in that state.
    fn set_mouse_capture(&mut self, on: bool) -> Result<()>;
    /// Current size in cells (columns, rows).
    fn size(&self) -> Result<(u16, u16)>;
}

/// Crossterm on stdout. Dropping an entered backend leaves the terminal.
pub struct CrosstermBackend {
    entered: bool,
    mouse: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self {
            entered: false,
            mouse: false,
        }
    }

    pub fn mouse_captured(&self) -> bool {
        self.mouse
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, EnableBracketedPaste, Hide)?;
            self.entered = true;
            debug!(target: "terminal", "entered");
            self.set_mouse_capture(true)?;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            self.set_mouse_capture(false)?;
            execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
            debug!(target: "terminal", "left");
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }

    fn set_mouse_capture(&mut self, on: bool) -> Result<()> {
        if self.mouse == on || !self.entered {
            return Ok(());
        }
        if on {
            execute!(stdout(), EnableMouseCapture)?;
        } else {
            execute!(stdout(), DisableMouseCapture)?;
        }
        self.mouse = on;
        debug!(target: "terminal", on, "mouse_capture");
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        Ok(size()?)
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        if let Err(err) = self.leave() {
            warn!(target: "terminal", %err, "leave_failed");
        }
    }
}

/// Best-effort restore for paths that do not own the backend (panic hook).
pub fn restore() {
    let _ = execute!(
        stdout(),
        DisableMouseCapture,
        DisableBracketedPaste,
        LeaveAlternateScreen,
        Show
    );
    let _ = disable_raw_mode();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_toggle_is_ignored_before_enter() {
        let mut b = CrosstermBackend::new();
        b.set_mouse_capture(true).unwrap();
        assert!(!b.mouse_captured());
        // Leaving a backend that never entered touches nothing.
        b.leave().unwrap();
    }
}
