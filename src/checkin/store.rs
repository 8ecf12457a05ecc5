//! Stale-while-revalidate loading of the per-event allow-list.
//!
//! The cached copy is installed first so the gate can scan offline straight
//! away; the network result then either replaces it (and is persisted) or
//! is folded into the session as an offline/failed state. Errors never
//! escape this boundary except configuration errors, which stop the view
//! from opening at all.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::{AccessToken, EventCheckInSession, ValidIdsPayload};
use crate::services::{LocalStorage, ValidIdsSource};
use crate::utils::error::{CheckInError, ErrorKind};

/// Whether the scanner can accept tickets, and why not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    Loading,
    Ready,
    /// Serving the last-known-good list after a failed refresh.
    Offline { reason: String },
    Failed {
        kind: ErrorKind,
        message: String,
        retryable: bool,
    },
}

impl Readiness {
    pub fn can_scan(&self) -> bool {
        matches!(self, Readiness::Ready | Readiness::Offline { .. })
    }

    fn failed(err: &CheckInError) -> Self {
        Readiness::Failed {
            kind: err.kind(),
            message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}

pub struct SessionStore<S> {
    storage: LocalStorage,
    source: S,
}

impl<S: ValidIdsSource> SessionStore<S> {
    pub fn new(storage: LocalStorage, source: S) -> Self {
        Self { storage, source }
    }

    /// Rejects a missing event id or access token before any I/O happens.
    pub fn validate(event_id: &str, token: Option<&str>) -> Result<AccessToken, CheckInError> {
        if event_id.trim().is_empty() {
            return Err(CheckInError::MissingEventId);
        }
        AccessToken::parse(token).ok_or(CheckInError::MissingAccessToken)
    }

    /// Session populated from the local cache, or empty if there is none.
    pub async fn open_cached(&self, event_id: &str) -> (EventCheckInSession, Readiness) {
        match self.storage.load_event(event_id).await {
            Some(cached) => {
                info!(
                    event_id,
                    valid = cached.valid_ticket_ids.len(),
                    "Using cached event data while refreshing"
                );
                (
                    EventCheckInSession::from_cache(event_id, cached),
                    Readiness::Ready,
                )
            }
            None => (EventCheckInSession::new(event_id), Readiness::Loading),
        }
    }

    pub async fn fetch(
        &self,
        event_id: &str,
        token: &AccessToken,
    ) -> Result<ValidIdsPayload, CheckInError> {
        self.source.fetch_valid_ids(event_id, token).await
    }

    /// Folds a fetch result into the session.
    pub async fn apply(
        &self,
        session: &mut EventCheckInSession,
        result: Result<ValidIdsPayload, CheckInError>,
    ) -> Readiness {
        let event_id = session.event_id().to_string();

        match result {
            Ok(payload) => {
                let (event_name, ids) = payload.ticket_ids();
                session.install_live(event_name, ids, Utc::now());
                info!(
                    event_id = %event_id,
                    valid = session.valid_count(),
                    data_source = ?session.data_source(),
                    "Installed live allow-list"
                );

                if let Some(doc) = session.to_cache_document() {
                    if let Err(e) = self.storage.save_event(&event_id, &doc).await {
                        warn!(event_id = %event_id, error = %e, "Failed to persist event data");
                    }
                }
                Readiness::Ready
            }
            Err(err) if err.is_rejection() => {
                warn!(event_id = %event_id, error = %err, "Allow-list rejected by backend");
                session.revoke();
                Readiness::failed(&err)
            }
            Err(err) if session.has_allow_list() => {
                warn!(event_id = %event_id, error = %err, "Refresh failed, continuing offline");
                session.demote_to_cached();
                Readiness::Offline {
                    reason: err.to_string(),
                }
            }
            Err(err) => {
                warn!(event_id = %event_id, error = %err, "No event data available");
                Readiness::failed(&err)
            }
        }
    }

    /// Cached read followed by an awaited refresh.
    pub async fn load(
        &self,
        event_id: &str,
        token: Option<&str>,
    ) -> Result<(EventCheckInSession, Readiness), CheckInError> {
        let token = Self::validate(event_id, token)?;
        let (mut session, _) = self.open_cached(event_id).await;
        let readiness = self.refresh(&mut session, &token).await;
        Ok((session, readiness))
    }

    pub async fn refresh(
        &self,
        session: &mut EventCheckInSession,
        token: &AccessToken,
    ) -> Readiness {
        let event_id = session.event_id().to_string();
        let result = self.fetch(&event_id, token).await;
        self.apply(session, result).await
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }
}
