//! neurallink entry point
//!
//! Loads configuration, starts file logging, takes over the terminal and runs
//! the session until the operator leaves.
//!
//! Usage:
//!   neurallink
//!
//! Configuration comes from `$NEURALLINK_CONFIG` or the platform config
//! directory, with environment variables layered on top.

use std::io::{self, IsTerminal};

use tokio::runtime::Handle;

use neurallink_conductor::load_config;
use neurallink_tui::logging::init_logging;
use neurallink_tui::renderer::TerminalRenderer;
use neurallink_tui::terminal::{install_panic_hook, StdinSource, TerminalGuard};
use neurallink_tui::App;

/// Printed after the terminal is restored
const EXIT_BANNER: &str = "◢◤ NEURAL LINK TERMINATED ◥◣";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("neurallink: invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("neurallink: a terminal (TTY) is required");
        eprintln!();
        eprintln!("stdin and stdout must both be attached to a terminal.");
        eprintln!("Over SSH, pass -t to allocate one.");
        std::process::exit(1);
    }

    let _log_guard = init_logging(&config.logging)?;
    for warning in config.warnings() {
        tracing::warn!(%warning, "ignored configuration value");
    }

    install_panic_hook();
    let (mut guard, terminal) = TerminalGuard::enter()?;

    let result = async {
        let renderer = TerminalRenderer::new(terminal)?;
        let mut app = App::new(&config, StdinSource::new(), renderer, Handle::current())?;
        app.run().await
    }
    .await;

    guard.restore()?;

    match result {
        Ok(()) => {
            println!("{EXIT_BANNER}");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "session failed");
            Err(e)
        }
    }
}
