//! The interactive lookup session.
//!
//! A [`Session`] owns everything a lookup front end needs for the life of
//! the process: the configuration, the lookup service, the scan controller,
//! and what is currently shown to the user.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lookup::{validate_query, LookupService, Match, MatchTier};
use crate::record::{AssetRecord, AssetStats};
use crate::scan::{DecoderFactory, ScanController, ScanHandle, ScanOutcome};

const VALIDATION_MESSAGE: &str = "Please enter an asset tag or QR code";
const CAMERA_MESSAGE: &str = "Unable to access camera. Please check permissions.";
const LOAD_MESSAGE: &str = "Failed to load asset database. Please reload.";

static IDLE: UiState = UiState::Idle;

/// What kind of problem a notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The query was empty.
    Validation,
    /// Nothing matched.
    NotFound,
    /// The asset database failed to load.
    Load,
    /// The camera could not be used.
    Camera,
}

/// A user-facing message that may expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// What the notice reports.
    pub kind: NoticeKind,
    /// The text shown.
    pub message: String,
    shown_at: Instant,
    timeout: Option<Duration>,
}

impl Notice {
    fn transient(kind: NoticeKind, message: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kind,
            message: message.into(),
            shown_at: Instant::now(),
            timeout: Some(timeout),
        }
    }

    fn persistent(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            shown_at: Instant::now(),
            timeout: None,
        }
    }

    /// Check whether the notice has timed out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.timeout
            .is_some_and(|timeout| self.shown_at.elapsed() >= timeout)
    }
}

/// A record being displayed, detached from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shown {
    /// Key of the matched record.
    pub key: String,
    /// Tier the query matched in.
    pub tier: MatchTier,
    /// The matched record.
    pub record: AssetRecord,
    /// The decoded QR payload, for scan results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Shown {
    fn new(found: Match<'_>, payload: Option<String>) -> Self {
        Self {
            key: found.key.to_string(),
            tier: found.tier,
            record: found.record.clone(),
            payload,
        }
    }
}

/// What the user currently sees.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    /// Nothing to show.
    #[default]
    Idle,
    /// A lookup is in flight.
    Searching,
    /// A notice is shown.
    Error(Notice),
    /// A record is shown.
    Details(Shown),
}

/// Process-scoped lookup context.
pub struct Session<F: DecoderFactory> {
    config: Config,
    lookup: LookupService,
    scanner: ScanController<F>,
    state: UiState,
}

impl<F: DecoderFactory> fmt::Debug for Session<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("lookup", &self.lookup)
            .field("scanner", &self.scanner)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<F: DecoderFactory> Session<F> {
    /// Create a session with no asset database loaded.
    #[must_use]
    pub fn new(config: Config, factory: F) -> Self {
        let scanner = ScanController::new(factory, &config.scanner);
        Self {
            config,
            lookup: LookupService::new(),
            scanner,
            state: UiState::Idle,
        }
    }

    /// Create a session and load the configured asset database.
    ///
    /// A load failure leaves the session usable, with every lookup
    /// not-found, and shows a notice that does not expire.
    #[must_use]
    pub fn open(config: Config, factory: F) -> Self {
        let mut session = Self::new(config, factory);
        if let Err(err) = session.load() {
            error!("{err}");
            session.state = UiState::Error(Notice::persistent(NoticeKind::Load, LOAD_MESSAGE));
        }
        session
    }

    /// Load the configured asset database into the lookup service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the file cannot be read or parsed, and
    /// [`Error::AlreadyInitialized`] if a database is already loaded.
    pub fn load(&self) -> Result<()> {
        let catalog = crate::lookup::Catalog::load(&self.config.lookup.data_path)?;
        self.lookup.initialize(catalog)
    }

    /// The session's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The lookup service.
    #[must_use]
    pub fn lookup(&self) -> &LookupService {
        &self.lookup
    }

    /// Record and quantity totals of the loaded database.
    #[must_use]
    pub fn stats(&self) -> AssetStats {
        self.lookup.stats()
    }

    /// What the user currently sees. Expired notices read as idle.
    #[must_use]
    pub fn state(&self) -> &UiState {
        match &self.state {
            UiState::Error(notice) if notice.is_expired() => &IDLE,
            state => state,
        }
    }

    /// Clear whatever is shown.
    pub fn dismiss(&mut self) {
        self.state = UiState::Idle;
    }

    /// A handle that cancels a running scan.
    #[must_use]
    pub fn scan_handle(&self) -> ScanHandle {
        self.scanner.handle()
    }

    /// Look up a typed query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty query and
    /// [`Error::NotFound`] when nothing matches. Either way a notice is
    /// shown.
    pub async fn search(&mut self, raw: &str) -> Result<Shown> {
        let query = match validate_query(raw) {
            Ok(query) => query,
            Err(err) => {
                self.notify(NoticeKind::Validation, VALIDATION_MESSAGE);
                return Err(err);
            }
        };

        self.state = UiState::Searching;
        tokio::time::sleep(self.config.result_delay()).await;

        let found = self.lookup.find(query).map(|m| Shown::new(m, None));
        match found {
            Some(shown) => {
                self.state = UiState::Details(shown.clone());
                Ok(shown)
            }
            None => {
                self.notify(NoticeKind::NotFound, format!("Asset not found: \"{query}\""));
                Err(Error::not_found(query))
            }
        }
    }

    /// Run one scan session and look the decoded payload up.
    ///
    /// Returns `Ok(None)` if the scan was cancelled through
    /// [`scan_handle`](Self::scan_handle).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Camera`] if the camera cannot be used and
    /// [`Error::NotFound`] when the payload matches nothing. Either way a
    /// notice is shown.
    pub async fn scan(&mut self) -> Result<Option<Shown>> {
        let timeout = self.config.notice_timeout();
        let (payload, found) = match self.scanner.scan_once(&self.lookup).await {
            Ok(ScanOutcome::Found { payload, found }) => {
                let shown = Shown::new(found, Some(payload.clone()));
                (payload, Some(shown))
            }
            Ok(ScanOutcome::NotFound { payload }) => (payload, None),
            Ok(ScanOutcome::Cancelled) => {
                self.state = UiState::Idle;
                return Ok(None);
            }
            Err(err) => {
                if err.is_camera_error() {
                    self.state = UiState::Error(Notice::transient(
                        NoticeKind::Camera,
                        CAMERA_MESSAGE,
                        timeout,
                    ));
                }
                return Err(err);
            }
        };

        self.state = UiState::Searching;
        tokio::time::sleep(self.config.result_delay()).await;

        if let Some(shown) = found {
            info!(key = %shown.key, "Showing scanned asset");
            self.state = UiState::Details(shown.clone());
            return Ok(Some(shown));
        }
        self.notify(
            NoticeKind::NotFound,
            format!("Asset not found for QR code: \"{payload}\""),
        );
        Err(Error::not_found(payload))
    }

    fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.state = UiState::Error(Notice::transient(
            kind,
            message,
            self.config.notice_timeout(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::sync::mpsc;

    use super::*;
    use crate::record::AssetMap;
    use crate::scan::{CameraConstraints, DecodeEvent, DecoderConfig, DecoderError, QrDecoder};

    #[derive(Debug)]
    struct ScriptedDecoder {
        payload: Option<String>,
        sender: Option<mpsc::Sender<DecodeEvent>>,
    }

    #[async_trait::async_trait]
    impl QrDecoder for ScriptedDecoder {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn start(
            &mut self,
            _constraints: &CameraConstraints,
            _config: &DecoderConfig,
            events: mpsc::Sender<DecodeEvent>,
        ) -> std::result::Result<(), DecoderError> {
            let Some(payload) = self.payload.take() else {
                return Err(DecoderError::PermissionDenied("denied".to_string()));
            };
            events.try_send(DecodeEvent::Decoded(payload)).unwrap();
            self.sender = Some(events);
            Ok(())
        }

        async fn stop(&mut self) -> std::result::Result<(), DecoderError> {
            self.sender = None;
            Ok(())
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.lookup.result_delay_ms = 0;
        config
    }

    fn session(
        payload: Option<&str>,
    ) -> Session<impl DecoderFactory<Decoder = ScriptedDecoder>> {
        let payload = payload.map(String::from);
        let session = Session::new(config(), move || ScriptedDecoder {
            payload: payload.clone(),
            sender: None,
        });
        session
            .lookup()
            .initialize(
                vec![
                    ("AB-100".to_string(), AssetRecord::with_tag("AB-100")),
                    ("ASSET-0".to_string(), AssetRecord::with_tag("QR-7")),
                ]
                .into_iter()
                .collect::<AssetMap>(),
            )
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_search_found() {
        let mut session = session(None);

        let shown = session.search("  ab-100 ").await.unwrap();
        assert_eq!(shown.key, "AB-100");
        assert_eq!(shown.tier, MatchTier::KeyIgnoreCase);
        assert!(matches!(session.state(), UiState::Details(s) if s.key == "AB-100"));
    }

    #[tokio::test]
    async fn test_search_empty_is_validation_notice() {
        let mut session = session(None);

        let err = session.search("   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation));
        match session.state() {
            UiState::Error(notice) => {
                assert_eq!(notice.kind, NoticeKind::Validation);
                assert_eq!(notice.message, VALIDATION_MESSAGE);
            }
            other => panic!("Expected notice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_not_found_notice() {
        let mut session = session(None);

        let err = session.search("ZZ-9").await.unwrap_err();
        assert!(err.is_not_found());
        match session.state() {
            UiState::Error(notice) => {
                assert_eq!(notice.kind, NoticeKind::NotFound);
                assert_eq!(notice.message, "Asset not found: \"ZZ-9\"");
            }
            other => panic!("Expected notice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_notice_expires() {
        let mut config = config();
        config.lookup.notice_timeout_ms = 0;
        let mut session = Session::new(config, || ScriptedDecoder {
            payload: None,
            sender: None,
        });

        let _ = session.search("").await;
        assert_eq!(session.state(), &UiState::Idle);
    }

    #[tokio::test]
    async fn test_scan_found_by_tag() {
        let mut session = session(Some("qr-7"));

        let shown = session.scan().await.unwrap().unwrap();
        assert_eq!(shown.key, "ASSET-0");
        assert_eq!(shown.payload.as_deref(), Some("qr-7"));
        assert!(matches!(session.state(), UiState::Details(_)));
    }

    #[tokio::test]
    async fn test_scan_not_found_notice() {
        let mut session = session(Some("NOPE"));

        let err = session.scan().await.unwrap_err();
        assert!(err.is_not_found());
        match session.state() {
            UiState::Error(notice) => {
                assert_eq!(notice.message, "Asset not found for QR code: \"NOPE\"");
            }
            other => panic!("Expected notice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scan_payload_is_not_trimmed() {
        let mut session = session(Some(" AB-100"));

        assert!(session.scan().await.unwrap_err().is_not_found());
        assert!(matches!(
            session.state(),
            UiState::Error(notice) if notice.message == "Asset not found for QR code: \" AB-100\""
        ));
    }

    #[tokio::test]
    async fn test_scan_camera_failure() {
        let mut session = session(None);

        let err = session.scan().await.unwrap_err();
        assert!(err.is_camera_error());
        match session.state() {
            UiState::Error(notice) => {
                assert_eq!(notice.kind, NoticeKind::Camera);
                assert_eq!(notice.message, CAMERA_MESSAGE);
            }
            other => panic!("Expected notice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_open_with_missing_database() {
        let mut config = config();
        config.lookup.data_path = PathBuf::from("/nonexistent/assets.json");
        let mut session = Session::open(config, || ScriptedDecoder {
            payload: None,
            sender: None,
        });

        match session.state() {
            UiState::Error(notice) => {
                assert_eq!(notice.kind, NoticeKind::Load);
                assert_eq!(notice.message, LOAD_MESSAGE);
                assert!(!notice.is_expired());
            }
            other => panic!("Expected notice, got {other:?}"),
        }
        assert!(session.search("AB-100").await.unwrap_err().is_not_found());
        assert_eq!(session.stats(), AssetStats::default());
    }

    #[tokio::test]
    async fn test_open_loads_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.json");
        std::fs::write(&path, r#"{"AB-100": {"fullUniqueAssetTag": "AB-100", "quantity": 4}}"#)
            .unwrap();

        let mut config = config();
        config.lookup.data_path = path;
        let session = Session::open(config, || ScriptedDecoder {
            payload: None,
            sender: None,
        });

        assert_eq!(session.state(), &UiState::Idle);
        assert_eq!(session.stats().total_quantity, 4);
        assert!(matches!(session.load(), Err(Error::AlreadyInitialized)));
    }

    #[tokio::test]
    async fn test_dismiss() {
        let mut session = session(None);
        let _ = session.search("ZZ-9").await;
        session.dismiss();
        assert_eq!(session.state(), &UiState::Idle);
    }
}
