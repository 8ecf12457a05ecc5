//! One check-in view as a single task.
//!
//! The station task owns the session and the scan loop; decode callbacks,
//! fetch results and the revert timer are all handled on that task, one at a
//! time. Fetches run on their own task and report back through a channel, so
//! a scan that arrives mid-refresh is classified against the installed list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use super::scanner::{ScanLoop, ScanReply};
use super::store::{Readiness, SessionStore};
use crate::models::{
    AccessToken, DataSource, DisplayStatus, EventCheckInSession, ValidIdsPayload,
};
use crate::services::ValidIdsSource;
use crate::utils::error::CheckInError;

const COMMAND_BUFFER: usize = 32;

type FetchResult = Result<ValidIdsPayload, CheckInError>;

#[derive(Debug, Error)]
pub enum StationError {
    #[error("{0}")]
    NotReady(String),

    #[error("Camera access was denied")]
    CameraBlocked,

    #[error("Check-in view is closed")]
    Closed,
}

/// Error callback of the camera widget.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ScannerFault {
    PermissionDenied(String),
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraState {
    Active,
    Blocked,
}

/// Everything the gate display renders.
#[derive(Debug, Clone, Serialize)]
pub struct StationSnapshot {
    pub event_id: String,
    pub title: String,
    pub event_name: Option<String>,
    pub data_source: DataSource,
    pub readiness: Readiness,
    pub status: DisplayStatus,
    pub message: String,
    pub checked_in: usize,
    pub valid: usize,
    pub synced_at: Option<DateTime<Utc>>,
    pub refreshing: bool,
    pub camera: CameraState,
}

enum Command {
    Scan {
        raw: String,
        reply: oneshot::Sender<Result<ScanReply, StationError>>,
    },
    Fault(ScannerFault),
    Retry,
    Snapshot(oneshot::Sender<StationSnapshot>),
    Close(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct StationHandle {
    event_id: String,
    commands: mpsc::Sender<Command>,
}

impl StationHandle {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub async fn scan(&self, raw: impl Into<String>) -> Result<ScanReply, StationError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Scan {
            raw: raw.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| StationError::Closed)?
    }

    pub async fn report_fault(&self, fault: ScannerFault) -> Result<(), StationError> {
        self.send(Command::Fault(fault)).await
    }

    pub async fn retry(&self) -> Result<(), StationError> {
        self.send(Command::Retry).await
    }

    pub async fn snapshot(&self) -> Result<StationSnapshot, StationError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        rx.await.map_err(|_| StationError::Closed)
    }

    /// Stops the station and waits for it to wind down. Closing twice is a no-op.
    pub async fn close(&self) {
        let (ack, rx) = oneshot::channel();
        if self.send(Command::Close(ack)).await.is_ok() {
            let _ = rx.await;
        }
    }

    async fn send(&self, command: Command) -> Result<(), StationError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| StationError::Closed)
    }
}

pub struct Station<S> {
    store: Arc<SessionStore<S>>,
    token: AccessToken,
    session: EventCheckInSession,
    readiness: Readiness,
    scanner: ScanLoop,
    camera: CameraState,
    fetch: Option<JoinHandle<()>>,
    results: mpsc::Sender<FetchResult>,
}

impl<S: ValidIdsSource> Station<S> {
    /// Opens a check-in view: validates the link, installs any cached list and
    /// starts the first refresh in the background.
    pub async fn open(
        store: Arc<SessionStore<S>>,
        event_id: &str,
        token: Option<&str>,
        display_window: Duration,
    ) -> Result<StationHandle, CheckInError> {
        let token = SessionStore::<S>::validate(event_id, token)?;
        let (session, readiness) = store.open_cached(event_id).await;

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (mut station, results_rx) =
            Station::new(store, token, session, readiness, display_window);
        station.start_refresh();

        info!(event_id, data_source = ?station.session.data_source(), "Check-in view opened");
        tokio::spawn(station.run(commands_rx, results_rx));

        Ok(StationHandle {
            event_id: event_id.to_string(),
            commands: commands_tx,
        })
    }

    fn new(
        store: Arc<SessionStore<S>>,
        token: AccessToken,
        session: EventCheckInSession,
        readiness: Readiness,
        display_window: Duration,
    ) -> (Self, mpsc::Receiver<FetchResult>) {
        // At most one fetch exists at a time, so one slot is enough.
        let (results_tx, results_rx) = mpsc::channel(1);

        let station = Station {
            store,
            token,
            session,
            readiness,
            scanner: ScanLoop::new(display_window),
            camera: CameraState::Active,
            fetch: None,
            results: results_tx,
        };
        (station, results_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut results: mpsc::Receiver<FetchResult>,
    ) {
        loop {
            let revert_at = self.scanner.revert_deadline();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Close(ack)) => {
                        self.shutdown();
                        let _ = ack.send(());
                        break;
                    }
                    Some(command) => self.handle(command),
                    None => {
                        self.shutdown();
                        break;
                    }
                },
                Some(result) = results.recv() => {
                    self.fetch = None;
                    self.readiness = self.store.apply(&mut self.session, result).await;
                }
                _ = sleep_until(revert_at.unwrap_or_else(Instant::now)), if revert_at.is_some() => {
                    self.scanner.expire(Instant::now());
                }
            }
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Scan { raw, reply } => {
                let _ = reply.send(self.scan(&raw));
            }
            Command::Fault(fault) => self.on_fault(fault),
            Command::Retry => self.retry(),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Close(_) => {}
        }
    }

    fn scan(&mut self, raw: &str) -> Result<ScanReply, StationError> {
        if self.camera == CameraState::Blocked {
            return Err(StationError::CameraBlocked);
        }
        if !self.readiness.can_scan() {
            return Err(StationError::NotReady(self.idle_message()));
        }
        Ok(self.scanner.on_decode(raw, &mut self.session, Instant::now()))
    }

    fn on_fault(&mut self, fault: ScannerFault) {
        match fault {
            ScannerFault::PermissionDenied(message) => {
                warn!(event_id = self.session.event_id(), message = %message, "Camera permission denied");
                self.camera = CameraState::Blocked;
                self.scanner.cancel();
            }
            ScannerFault::Other(message) => {
                debug!(event_id = self.session.event_id(), message = %message, "Scanner fault");
            }
        }
    }

    fn retry(&mut self) {
        if matches!(self.readiness, Readiness::Failed { retryable: false, .. }) {
            debug!(event_id = self.session.event_id(), "Retry ignored, access link was rejected");
            return;
        }
        if !self.session.has_allow_list() {
            self.readiness = Readiness::Loading;
        }
        self.start_refresh();
    }

    /// The fetch counts as in flight until `run` has consumed its result.
    fn start_refresh(&mut self) {
        if self.fetch.is_some() {
            debug!(event_id = self.session.event_id(), "Refresh already in flight");
            return;
        }

        let store = Arc::clone(&self.store);
        let results = self.results.clone();
        let event_id = self.session.event_id().to_string();
        let token = self.token.clone();

        self.fetch = Some(tokio::spawn(async move {
            let result = store.fetch(&event_id, &token).await;
            let _ = results.send(result).await;
        }));
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.fetch.take() {
            task.abort();
        }
        self.scanner.cancel();
        info!(
            event_id = self.session.event_id(),
            checked_in = self.session.checked_in_count(),
            "Check-in view closed, scanner stopped"
        );
    }

    fn idle_message(&self) -> String {
        if self.camera == CameraState::Blocked {
            return "Camera access was denied. Allow camera access and reopen the scanner."
                .to_string();
        }
        match &self.readiness {
            Readiness::Loading => "Downloading event data...".to_string(),
            Readiness::Ready => format!("Ready to scan for: {}", self.session.title()),
            Readiness::Offline { .. } => {
                format!("Offline Mode: Ready to scan for {}", self.session.title())
            }
            Readiness::Failed { message, .. } => message.clone(),
        }
    }

    fn snapshot(&self) -> StationSnapshot {
        let message = match self.scanner.showing() {
            Some(outcome) => outcome.message.clone(),
            None => self.idle_message(),
        };

        StationSnapshot {
            event_id: self.session.event_id().to_string(),
            title: self.session.title(),
            event_name: self.session.event_name().map(str::to_string),
            data_source: self.session.data_source(),
            readiness: self.readiness.clone(),
            status: self.scanner.status(),
            message,
            checked_in: self.session.checked_in_count(),
            valid: self.session.valid_count(),
            synced_at: self.session.synced_at(),
            refreshing: self.fetch.is_some(),
            camera: self.camera,
        }
    }
}
