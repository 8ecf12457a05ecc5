use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ticket::TicketIdentifier;

/// Body of the backend's valid-ids endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidIdsPayload {
    pub event_name: String,
    pub valid_ticket_ids: Vec<RawTicketId>,
}

/// Ticket ids arrive as strings or as bare JSON numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTicketId {
    Text(String),
    Number(serde_json::Number),
}

impl RawTicketId {
    pub fn into_identifier(self) -> Option<TicketIdentifier> {
        match self {
            RawTicketId::Text(text) => TicketIdentifier::new(text.trim()),
            RawTicketId::Number(number) => TicketIdentifier::new(number.to_string()),
        }
    }
}

impl ValidIdsPayload {
    pub fn ticket_ids(self) -> (String, Vec<TicketIdentifier>) {
        let ids = self
            .valid_ticket_ids
            .into_iter()
            .filter_map(RawTicketId::into_identifier)
            .collect();
        (self.event_name, ids)
    }
}

/// Document persisted under `event_data_<eventId>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEventData {
    pub event_name: String,
    pub valid_ticket_ids: Vec<TicketIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

pub fn storage_key(event_id: &str) -> String {
    format!("event_data_{}", event_id)
}
