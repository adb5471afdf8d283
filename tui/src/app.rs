//! Main Application
//!
//! Wires configuration into a [`SessionCoordinator`] and drives it from an
//! interval timer. The loop also listens for SIGTERM and SIGHUP so a killed
//! session still abandons its work and restores the terminal.
//!
//! ```text
//!   interval ──tick──▶ SessionCoordinator ──ViewModel──▶ TerminalRenderer
//!   SIGTERM/SIGHUP ──▶ break ──▶ shutdown()
//! ```

use std::sync::Arc;
use std::time::Duration;

use ratatui::backend::Backend;
use tokio::runtime::Handle;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::MissedTickBehavior;

use neurallink_conductor::config::{BackendSettings, SpeakerSettings};
use neurallink_conductor::{
    AppConfig, BackendKind, ByteSource, CommandSpeaker, EchoBackend, ModelBackend, OllamaBackend,
    PlaybackDevice, SessionCoordinator, SimulatedSpeaker, SpeakerKind, TickOutcome,
};

use crate::renderer::TerminalRenderer;

/// Pretend thinking time for the echo backend
const ECHO_LATENCY: Duration = Duration::from_millis(600);

/// Model backend chosen by `settings`
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_backend(
    settings: &BackendSettings,
    runtime: Handle,
) -> anyhow::Result<Arc<dyn ModelBackend>> {
    let backend: Arc<dyn ModelBackend> = match settings.kind {
        BackendKind::Ollama => Arc::new(OllamaBackend::new(
            settings.url.clone(),
            settings.model.clone(),
            settings.system_prompt.clone(),
            settings.timeout,
            runtime,
        )?),
        BackendKind::Echo => Arc::new(EchoBackend::new(ECHO_LATENCY)),
    };
    Ok(backend)
}

/// Playback device chosen by `settings`
#[must_use]
pub fn build_speaker(settings: &SpeakerSettings) -> Arc<dyn PlaybackDevice> {
    match settings.kind {
        SpeakerKind::Command => Arc::new(CommandSpeaker::new(
            settings.device.clone(),
            settings.command.clone(),
            settings.language.clone(),
        )),
        SpeakerKind::Simulated => Arc::new(SimulatedSpeaker::new(settings.device.clone())),
    }
}

/// A running session and the timer that drives it
pub struct App<S: ByteSource, B: Backend> {
    coordinator: SessionCoordinator<S, TerminalRenderer<B>>,
    tick_period: Duration,
}

impl<S: ByteSource, B: Backend> App<S, B> {
    /// Build the session described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the model backend cannot be created.
    pub fn new(
        config: &AppConfig,
        source: S,
        renderer: TerminalRenderer<B>,
        runtime: Handle,
    ) -> anyhow::Result<Self> {
        let backend = build_backend(&config.backend, runtime.clone())?;
        let speaker = build_speaker(&config.speaker);
        tracing::info!(
            backend = backend.name(),
            speaker = speaker.name(),
            fps = config.ui.tick_rate,
            source = %config.source(),
            "session starting"
        );

        let coordinator =
            SessionCoordinator::new(&config.ui, source, renderer, backend, speaker, runtime);
        Ok(Self {
            coordinator,
            tick_period: Duration::from_secs(1) / config.ui.tick_rate.max(1),
        })
    }

    /// Tick until the operator leaves or a termination signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the signal handlers cannot be installed.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut interval = tokio::time::interval(self.tick_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sighup = signal(SignalKind::hangup())?;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.coordinator.tick() == TickOutcome::Shutdown {
                        break;
                    }
                }
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM");
                    break;
                }
                _ = sighup.recv() => {
                    tracing::info!("received SIGHUP");
                    break;
                }
            }
        }

        self.coordinator.shutdown();
        Ok(())
    }

    /// The session being driven
    #[must_use]
    pub fn coordinator(&self) -> &SessionCoordinator<S, TerminalRenderer<B>> {
        &self.coordinator
    }

    /// Mutable access to the renderer, for restoring the terminal
    pub fn renderer_mut(&mut self) -> &mut TerminalRenderer<B> {
        self.coordinator.renderer_mut()
    }
}
