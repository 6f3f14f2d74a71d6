//! Decoder backed by an external scanning program.
//!
//! The program (for example `zbarcam --raw`) owns the camera and prints one
//! decoded payload per line on stdout. Anything it prints on stderr is
//! treated as decoder noise. Camera settings are passed to the program as
//! `ASSETSCAN_*` environment variables for wrapper scripts to honor.

use std::io::ErrorKind;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::decoder::{CameraConstraints, DecodeEvent, DecoderConfig, DecoderError, QrDecoder};

/// Runs an external program as the QR decoder.
///
/// The child process is killed when the decoder is stopped or dropped.
#[derive(Debug)]
pub struct CommandDecoder {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
    readers: Vec<JoinHandle<()>>,
}

impl CommandDecoder {
    /// Create a decoder for `command`, whose first element is the program.
    #[must_use]
    pub fn new(command: &[String]) -> Self {
        let (program, args) = command.split_first().map_or_else(
            || (String::new(), Vec::new()),
            |(program, args)| (program.clone(), args.to_vec()),
        );
        Self {
            program,
            args,
            child: None,
            readers: Vec::new(),
        }
    }

    /// The program that will be run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Drop for CommandDecoder {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}

#[async_trait::async_trait]
impl QrDecoder for CommandDecoder {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn start(
        &mut self,
        constraints: &CameraConstraints,
        config: &DecoderConfig,
        events: mpsc::Sender<DecodeEvent>,
    ) -> Result<(), DecoderError> {
        if self.child.is_some() {
            return Err(DecoderError::AlreadyRunning);
        }
        if self.program.is_empty() {
            return Err(DecoderError::DeviceUnavailable(
                "no scanner command configured".to_string(),
            ));
        }

        debug!(program = %self.program, args = ?self.args, "Spawning decoder");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("ASSETSCAN_FACING_MODE", &constraints.facing_mode)
            .env("ASSETSCAN_FPS", config.fps.to_string())
            .env("ASSETSCAN_QRBOX_WIDTH", config.qrbox_width.to_string())
            .env("ASSETSCAN_QRBOX_HEIGHT", config.qrbox_height.to_string())
            .env("ASSETSCAN_ASPECT_RATIO", config.aspect_ratio.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let message = format!("{}: {e}", self.program);
                match e.kind() {
                    ErrorKind::NotFound => DecoderError::DeviceUnavailable(message),
                    ErrorKind::PermissionDenied => DecoderError::PermissionDenied(message),
                    _ => DecoderError::StartFailed(message),
                }
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.start_kill();
            return Err(DecoderError::StartFailed(
                "decoder output is not available".to_string(),
            ));
        };

        let payloads = events.clone();
        self.readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let payload = line.trim_end_matches('\r');
                if payload.is_empty() {
                    continue;
                }
                if payloads
                    .send(DecodeEvent::Decoded(payload.to_string()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }));

        self.readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                // Noise is best-effort; drop it when the consumer is behind
                if let Err(mpsc::error::TrySendError::Closed(_)) =
                    events.try_send(DecodeEvent::Noise(line))
                {
                    break;
                }
            }
        }));

        self.child = Some(child);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DecoderError> {
        for reader in self.readers.drain(..) {
            reader.abort();
        }
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if child
            .try_wait()
            .map_err(|e| DecoderError::StopFailed(e.to_string()))?
            .is_some()
        {
            return Ok(());
        }
        child
            .kill()
            .await
            .map_err(|e| DecoderError::StopFailed(e.to_string()))
    }
}
