use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::event::CachedEventData;
use super::ticket::TicketIdentifier;

/// Where the installed allow-list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Cached,
    Unavailable,
}

/// Access token from the check-in link. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Blank tokens are treated as missing.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self(token.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Check-in state for one event view.
///
/// `checked_in` only ever grows; it lives for the lifetime of the view and is
/// never written to the local cache.
#[derive(Debug, Clone)]
pub struct EventCheckInSession {
    event_id: String,
    event_name: Option<String>,
    valid_ticket_ids: HashSet<TicketIdentifier>,
    checked_in: HashSet<TicketIdentifier>,
    data_source: DataSource,
    synced_at: Option<DateTime<Utc>>,
}

impl EventCheckInSession {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_name: None,
            valid_ticket_ids: HashSet::new(),
            checked_in: HashSet::new(),
            data_source: DataSource::Unavailable,
            synced_at: None,
        }
    }

    pub fn from_cache(event_id: impl Into<String>, cached: CachedEventData) -> Self {
        let mut session = Self::new(event_id);
        session.event_name = Some(cached.event_name);
        session.valid_ticket_ids = cached.valid_ticket_ids.into_iter().collect();
        session.synced_at = cached.synced_at;
        session.data_source = DataSource::Cached;
        session
    }

    pub fn install_live(
        &mut self,
        event_name: String,
        ids: impl IntoIterator<Item = TicketIdentifier>,
        synced_at: DateTime<Utc>,
    ) {
        self.event_name = Some(event_name);
        self.valid_ticket_ids = ids.into_iter().collect();
        self.synced_at = Some(synced_at);
        self.data_source = DataSource::Live;
    }

    /// A refresh failed: whatever is installed is now last-known-good.
    pub fn demote_to_cached(&mut self) {
        if self.data_source == DataSource::Live {
            self.data_source = DataSource::Cached;
        }
    }

    /// Drops the allow-list after the backend rejected the request.
    pub fn revoke(&mut self) {
        self.valid_ticket_ids.clear();
        self.data_source = DataSource::Unavailable;
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_name(&self) -> Option<&str> {
        self.event_name.as_deref()
    }

    /// Header text, falling back to the event id until a name is known.
    pub fn title(&self) -> String {
        match &self.event_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Event ID: {}", self.event_id),
        }
    }

    pub fn data_source(&self) -> DataSource {
        self.data_source
    }

    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    pub fn has_allow_list(&self) -> bool {
        self.data_source != DataSource::Unavailable
    }

    pub fn is_valid(&self, id: &TicketIdentifier) -> bool {
        self.valid_ticket_ids.contains(id)
    }

    pub fn is_checked_in(&self, id: &TicketIdentifier) -> bool {
        self.checked_in.contains(id)
    }

    /// Admits `id` if it is on the allow-list. Returns whether it was newly added.
    pub fn check_in(&mut self, id: &TicketIdentifier) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        self.checked_in.insert(id.clone())
    }

    pub fn checked_in_count(&self) -> usize {
        self.checked_in.len()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_ticket_ids.len()
    }

    pub fn checked_in(&self) -> &HashSet<TicketIdentifier> {
        &self.checked_in
    }

    pub fn to_cache_document(&self) -> Option<CachedEventData> {
        let event_name = self.event_name.clone()?;
        let mut valid_ticket_ids: Vec<TicketIdentifier> =
            self.valid_ticket_ids.iter().cloned().collect();
        valid_ticket_ids.sort();

        Some(CachedEventData {
            event_name,
            valid_ticket_ids,
            synced_at: self.synced_at,
        })
    }
}
