//! Terminal Setup
//!
//! Raw mode, the alternate screen, and a non-blocking stdin byte source.
//! [`TerminalGuard`] undoes the setup when dropped, and the panic hook
//! undoes it before the panic message is printed.

use std::io::{self, Stdout};
use std::os::fd::{AsRawFd, RawFd};
use std::panic;

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use neurallink_conductor::ByteSource;

// ============================================================================
// Stdin
// ============================================================================

/// Reads whatever bytes stdin has ready, never waiting
#[derive(Debug)]
pub struct StdinSource {
    fd: RawFd,
}

impl StdinSource {
    /// Source over the process's stdin
    #[must_use]
    pub fn new() -> Self {
        Self {
            fd: io::stdin().as_raw_fd(),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSource for StdinSource {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `pfd` is a single valid pollfd for the duration of the call.
        let ready = unsafe { libc::poll(&mut pfd, 1, 0) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(0);
            }
            return Err(err);
        }
        if ready == 0 {
            return Ok(0);
        }
        if pfd.revents & libc::POLLIN == 0 {
            if pfd.revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0 {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            return Ok(0);
        }

        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        match n {
            0 => Err(io::ErrorKind::UnexpectedEof.into()),
            n if n < 0 => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => Ok(0),
                    _ => Err(err),
                }
            }
            // Positive and at most `buf.len()`.
            n => Ok(n.unsigned_abs()),
        }
    }
}

// ============================================================================
// Screen
// ============================================================================

/// Terminal in raw mode on the alternate screen; restored on drop
pub struct TerminalGuard {
    restored: bool,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen, returning the guard and a
    /// ratatui terminal over stdout
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be switched into raw mode or
    /// the alternate screen.
    pub fn enter() -> anyhow::Result<(Self, Terminal<CrosstermBackend<Stdout>>)> {
        enable_raw_mode()?;
        let guard = Self { restored: false };

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        Ok((guard, terminal))
    }

    /// Leave the alternate screen and raw mode
    ///
    /// # Errors
    ///
    /// Returns the first error hit while restoring; later steps still run.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        let screen = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let raw = disable_raw_mode();
        screen.and(raw)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!(error = %e, "failed to restore terminal");
        }
    }
}

/// Restore the terminal before the default panic output is printed
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}
