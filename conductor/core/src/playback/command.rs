//! Speaker driven by an external player command.
//!
//! The command template is split on whitespace and each word has its
//! placeholders substituted, so a reply containing spaces stays one argument:
//!
//! | Placeholder | Value |
//! |---|---|
//! | `{device}` | configured speaker name |
//! | `{url}` | Google Translate TTS URL for the reply |
//! | `{text}` | the reply itself |
//! | `{lang}` | TTS language code |

use std::io::Read;
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{PlaybackDevice, PlaybackError};

/// Default speaker name
pub const DEFAULT_SPEAKER_DEVICE: &str = "Kontor";

/// Default player: cast the TTS URL with `catt`
pub const DEFAULT_SPEAKER_COMMAND: &str = "catt -d {device} cast {url}";

/// Default TTS language
pub const DEFAULT_TTS_LANGUAGE: &str = "sv";

const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// How often a running player is checked for exit
const WAIT_INTERVAL: Duration = Duration::from_millis(20);

/// Player stderr kept for diagnosis; older output is dropped
const STDERR_TAIL: usize = 4096;

/// How long to wait for stderr after the player exited. A background
/// process the player left behind may keep the pipe open.
const STDERR_GRACE: Duration = Duration::from_millis(200);

/// Phrases players print when the speaker is not on the network
const NOT_FOUND_MARKERS: [&str; 3] = ["not found", "no devices", "could not find"];

/// Build the Google Translate TTS URL for `text`
pub fn tts_url(text: &str, language: &str) -> Result<String, PlaybackError> {
    reqwest::Url::parse_with_params(
        TTS_ENDPOINT,
        &[("ie", "UTF-8"), ("q", text), ("tl", language), ("client", "tw-ob")],
    )
    .map(String::from)
    .map_err(|e| PlaybackError::Failed(format!("cannot build TTS URL: {e}")))
}

/// Read `pipe` to the end on its own thread, keeping the last
/// [`STDERR_TAIL`] bytes, so a chatty player never blocks on a full pipe
fn drain_stderr(mut pipe: ChildStderr) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let spawned = std::thread::Builder::new()
        .name("player-stderr".into())
        .spawn(move || {
            let mut tail = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        tail.extend_from_slice(&chunk[..n]);
                        if tail.len() > STDERR_TAIL {
                            tail.drain(..tail.len() - STDERR_TAIL);
                        }
                    }
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&tail).into_owned());
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "cannot read player stderr");
    }
    rx
}

/// The running player and whether it was told to stop
#[derive(Debug, Default)]
struct Player {
    child: Option<Child>,
    /// Set by `stop`, cleared by `arm`
    stopped: bool,
}

/// Runs the configured player once per reply
#[derive(Debug)]
pub struct CommandSpeaker {
    device: String,
    template: String,
    language: String,
    /// Shared between `speak` on the blocking pool and `stop` on the loop
    player: Mutex<Player>,
}

impl CommandSpeaker {
    /// Speaker for `device` using the player `template`
    pub fn new(
        device: impl Into<String>,
        template: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            template: template.into(),
            language: language.into(),
            player: Mutex::new(Player::default()),
        }
    }

    /// Expanded argv for speaking `text`
    fn argv(&self, text: &str) -> Result<Vec<String>, PlaybackError> {
        let url = tts_url(text, &self.language)?;
        let argv: Vec<String> = self
            .template
            .split_whitespace()
            .map(|word| {
                word.replace("{device}", &self.device)
                    .replace("{url}", &url)
                    .replace("{lang}", &self.language)
                    .replace("{text}", text)
            })
            .collect();
        if argv.is_empty() {
            return Err(PlaybackError::Failed("speaker command is empty".into()));
        }
        Ok(argv)
    }

    /// Poll the player until it exits. The child stays in the slot until
    /// then, so a player killed by `stop` is still reaped here.
    fn wait(&self) -> Result<(ExitStatus, bool), PlaybackError> {
        loop {
            {
                let mut player = self.player.lock();
                let stopped = player.stopped;
                let Some(child) = player.child.as_mut() else {
                    return Err(PlaybackError::Failed("player disappeared".into()));
                };
                let exited = child
                    .try_wait()
                    .map_err(|e| PlaybackError::Failed(format!("waiting for player: {e}")))?;
                if let Some(status) = exited {
                    player.child = None;
                    return Ok((status, stopped));
                }
            }
            std::thread::sleep(WAIT_INTERVAL);
        }
    }
}

impl PlaybackDevice for CommandSpeaker {
    fn name(&self) -> &str {
        &self.device
    }

    fn speak(&self, text: &str) -> Result<(), PlaybackError> {
        let argv = self.argv(text)?;
        let (program, args) = argv.split_at(1);
        let program = &program[0];

        if self.player.lock().stopped {
            tracing::info!(device = %self.device, "playback stopped before it started");
            return Ok(());
        }

        tracing::debug!(device = %self.device, %program, "starting player");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    PlaybackError::Failed(format!("player `{program}` is not installed"))
                }
                _ => PlaybackError::Failed(format!("cannot start `{program}`: {e}")),
            })?;
        let stderr = child.stderr.take().map(drain_stderr);

        {
            let mut player = self.player.lock();
            // A stop that landed while the player was starting
            if player.stopped {
                if let Err(e) = child.kill() {
                    tracing::debug!(error = %e, "player already gone");
                }
            }
            player.child = Some(child);
        }

        let (status, stopped) = self.wait()?;
        if stopped {
            tracing::info!(device = %self.device, "playback stopped");
            return Ok(());
        }
        if status.success() {
            return Ok(());
        }

        let stderr = stderr
            .and_then(|rx| rx.recv_timeout(STDERR_GRACE).ok())
            .unwrap_or_default();
        let lowered = stderr.to_lowercase();
        if NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
            tracing::warn!(device = %self.device, "speaker not found");
            return Err(PlaybackError::DeviceNotFound(self.device.clone()));
        }
        let detail = stderr.lines().last().unwrap_or("").trim().to_string();
        tracing::warn!(device = %self.device, %status, %detail, "player failed");
        Err(PlaybackError::Failed(format!("player exited with {status}")))
    }

    fn stop(&self) {
        let mut player = self.player.lock();
        player.stopped = true;
        if let Some(child) = player.child.as_mut() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "player already gone");
            }
        }
    }

    fn arm(&self) {
        self.player.lock().stopped = false;
    }
}
