use serde::Serialize;

use super::ticket::TicketIdentifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    NewValid,
    Duplicate,
    Invalid,
    Unparseable,
}

/// Colour shown by the gate display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Idle,
    Success,
    Warning,
    Error,
}

/// Classification of a single decode event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub kind: OutcomeKind,
    pub ticket_id: Option<TicketIdentifier>,
    pub message: String,
}

impl ScanOutcome {
    pub fn new_valid(id: TicketIdentifier) -> Self {
        let message = format!("SUCCESS: Welcome! Ticket {}... is valid.", id.short());
        Self {
            kind: OutcomeKind::NewValid,
            ticket_id: Some(id),
            message,
        }
    }

    pub fn duplicate(id: TicketIdentifier) -> Self {
        let message = format!(
            "ALREADY SCANNED: Ticket {}... has already been checked in.",
            id.short()
        );
        Self {
            kind: OutcomeKind::Duplicate,
            ticket_id: Some(id),
            message,
        }
    }

    pub fn invalid(id: TicketIdentifier) -> Self {
        let message = format!(
            "INVALID TICKET: Code {}... is not valid for this event.",
            id.short()
        );
        Self {
            kind: OutcomeKind::Invalid,
            ticket_id: Some(id),
            message,
        }
    }

    pub fn unparseable() -> Self {
        Self {
            kind: OutcomeKind::Unparseable,
            ticket_id: None,
            message: "INVALID QR CODE: This code is not a valid event ticket.".to_string(),
        }
    }

    pub fn status(&self) -> DisplayStatus {
        match self.kind {
            OutcomeKind::NewValid => DisplayStatus::Success,
            OutcomeKind::Duplicate => DisplayStatus::Warning,
            OutcomeKind::Invalid | OutcomeKind::Unparseable => DisplayStatus::Error,
        }
    }
}
