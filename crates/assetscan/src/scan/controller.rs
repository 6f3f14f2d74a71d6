//! Scan session lifecycle.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use super::decoder::{CameraConstraints, DecodeEvent, DecoderConfig, DecoderFactory, QrDecoder};
use crate::config::ScannerConfig;
use crate::error::{Error, Result};
use crate::lookup::{LookupService, Match};

/// Lifecycle state of the scan controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// No session; the camera is free.
    #[default]
    Idle,
    /// The camera is being acquired.
    Starting,
    /// The decoder is running.
    Active,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEnd {
    /// A payload was decoded.
    Decoded(String),
    /// The session was cancelled through a [`ScanHandle`].
    Cancelled,
    /// The decoder stopped producing events.
    Closed,
}

/// Result of a decode-then-lookup scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome<'a> {
    /// The payload matched a record.
    Found {
        /// The decoded payload.
        payload: String,
        /// The matched record.
        found: Match<'a>,
    },
    /// The payload matched nothing.
    NotFound {
        /// The decoded payload.
        payload: String,
    },
    /// The session was cancelled before anything was decoded.
    Cancelled,
}

/// A cloneable handle that cancels the active scan session.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    cancel: Arc<watch::Sender<bool>>,
}

impl ScanHandle {
    /// Cancel the active session. No lookup is performed for it.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Check if a cancellation is pending.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Puts the controller back to `Idle` unless committed, including when the
/// start future is dropped or unwinds.
struct StateGuard<'a> {
    state: &'a mut ScanState,
    armed: bool,
}

impl<'a> StateGuard<'a> {
    fn enter(state: &'a mut ScanState, entering: ScanState) -> Self {
        *state = entering;
        Self { state, armed: true }
    }

    fn commit(mut self, next: ScanState) {
        *self.state = next;
        self.armed = false;
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.state = ScanState::Idle;
        }
    }
}

/// Owns the camera for at most one scan session at a time.
///
/// Sessions are decode-then-stop: the first decoded payload ends the session.
/// Every exit path returns the controller to [`ScanState::Idle`].
pub struct ScanController<F: DecoderFactory> {
    factory: F,
    constraints: CameraConstraints,
    config: DecoderConfig,
    event_buffer: usize,
    state: ScanState,
    decoder: Option<F::Decoder>,
    events: Option<mpsc::Receiver<DecodeEvent>>,
    cancel: Arc<watch::Sender<bool>>,
}

impl<F: DecoderFactory> fmt::Debug for ScanController<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanController")
            .field("state", &self.state)
            .field("constraints", &self.constraints)
            .field("config", &self.config)
            .field("has_decoder", &self.decoder.is_some())
            .finish_non_exhaustive()
    }
}

impl<F: DecoderFactory> ScanController<F> {
    /// Create an idle controller.
    #[must_use]
    pub fn new(factory: F, scanner: &ScannerConfig) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            factory,
            constraints: CameraConstraints::from(scanner),
            config: DecoderConfig::from(scanner),
            event_buffer: scanner.event_buffer.max(1),
            state: ScanState::Idle,
            decoder: None,
            events: None,
            cancel: Arc::new(cancel),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Check if a session holds the camera.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ScanState::Active
    }

    /// A handle that can cancel sessions of this controller.
    #[must_use]
    pub fn handle(&self) -> ScanHandle {
        ScanHandle {
            cancel: Arc::clone(&self.cancel),
        }
    }

    /// Acquire the camera and start decoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScanInProgress`] if a session is already running and
    /// [`Error::Camera`] if the decoder fails to start. In both cases no new
    /// session exists afterwards.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != ScanState::Idle {
            return Err(Error::ScanInProgress);
        }
        self.cancel.send_replace(false);

        let (tx, rx) = mpsc::channel(self.event_buffer);
        let mut decoder = self.factory.create();
        let name = decoder.name();
        debug!(decoder = name, "Starting scan session");

        let guard = StateGuard::enter(&mut self.state, ScanState::Starting);
        if let Err(err) = decoder.start(&self.constraints, &self.config, tx).await {
            warn!(decoder = name, error = %err, "Scanner failed to start");
            if let Err(stop_err) = decoder.stop().await {
                debug!(decoder = name, error = %stop_err, "Teardown after failed start");
            }
            decoder.clear();
            return Err(Error::camera(err.to_string()));
        }
        guard.commit(ScanState::Active);

        self.decoder = Some(decoder);
        self.events = Some(rx);
        info!(decoder = name, "Scan session active");
        Ok(())
    }

    /// Wait for the active session to end, then stop it.
    ///
    /// Decoder noise is discarded. Returns [`ScanEnd::Closed`] immediately
    /// when no session is active.
    pub async fn wait_for_decode(&mut self) -> ScanEnd {
        let Some(events) = self.events.as_mut() else {
            return ScanEnd::Closed;
        };
        let mut cancel = self.cancel.subscribe();

        let end = loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(DecodeEvent::Decoded(payload)) => break ScanEnd::Decoded(payload),
                    Some(DecodeEvent::Noise(message)) => trace!(%message, "Decode miss"),
                    None => break ScanEnd::Closed,
                },
                _ = cancel.wait_for(|cancelled| *cancelled) => break ScanEnd::Cancelled,
            }
        };

        self.stop().await;
        match &end {
            ScanEnd::Decoded(payload) => info!(%payload, "QR code scanned"),
            ScanEnd::Cancelled => info!("Scan cancelled"),
            ScanEnd::Closed => warn!("Decoder stopped without a result"),
        }
        end
    }

    /// Run one session and look the decoded payload up.
    ///
    /// The session is stopped before the lookup is issued, and exactly one
    /// lookup is issued per decoded payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Camera`] if the camera cannot be acquired or the
    /// decoder stops without a result, and [`Error::ScanInProgress`] if a
    /// session is already running.
    pub async fn scan_once<'a>(&mut self, lookup: &'a LookupService) -> Result<ScanOutcome<'a>> {
        self.start().await?;
        match self.wait_for_decode().await {
            ScanEnd::Decoded(payload) => Ok(match lookup.find(&payload) {
                Some(found) => ScanOutcome::Found { payload, found },
                None => ScanOutcome::NotFound { payload },
            }),
            ScanEnd::Cancelled => Ok(ScanOutcome::Cancelled),
            ScanEnd::Closed => Err(Error::camera("decoder stopped without a result")),
        }
    }

    /// Stop the active session, if any.
    ///
    /// Idempotent. Teardown errors are logged and the controller always ends
    /// up [`ScanState::Idle`].
    pub async fn stop(&mut self) {
        self.events = None;
        if let Some(mut decoder) = self.decoder.take() {
            if self.state == ScanState::Active {
                if let Err(err) = decoder.stop().await {
                    warn!(decoder = decoder.name(), error = %err, "Error stopping scanner");
                }
                decoder.clear();
            }
            debug!(decoder = decoder.name(), "Scan session stopped");
        }
        self.state = ScanState::Idle;
    }
}
