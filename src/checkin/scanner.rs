use serde::Serialize;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

use super::classify::classify;
use super::extract::extract;
use crate::models::{DisplayStatus, EventCheckInSession, ScanOutcome, TicketIdentifier};

pub const DEFAULT_DISPLAY_WINDOW: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScanReply {
    /// Same raw text as the decode still on screen.
    Ignored,
    Processed(ScanOutcome),
}

/// Debounce and display-window state between decode callbacks.
///
/// The debounce memory and the revert deadline are always set and cleared
/// together, so a revert can only clear the memory of the scan that armed it.
#[derive(Debug)]
pub struct ScanLoop {
    window: Duration,
    last_raw: Option<String>,
    showing: Option<ScanOutcome>,
    revert_at: Option<Instant>,
}

impl ScanLoop {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_raw: None,
            showing: None,
            revert_at: None,
        }
    }

    pub fn on_decode(
        &mut self,
        raw: &str,
        session: &mut EventCheckInSession,
        now: Instant,
    ) -> ScanReply {
        // The timer may not have fired yet even though the window is over.
        self.expire(now);

        if self.last_raw.as_deref() == Some(raw) {
            debug!(event_id = session.event_id(), "Ignoring repeated decode");
            return ScanReply::Ignored;
        }

        let outcome = classify(extract(raw), session);
        info!(
            event_id = session.event_id(),
            ticket = outcome.ticket_id.as_ref().map(TicketIdentifier::short),
            outcome = ?outcome.kind,
            checked_in = session.checked_in_count(),
            "Scan processed"
        );

        self.last_raw = Some(raw.to_string());
        self.showing = Some(outcome.clone());
        self.revert_at = Some(now + self.window);

        ScanReply::Processed(outcome)
    }

    /// Returns to idle once the display window is over.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.revert_at {
            Some(at) if now >= at => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    /// Drops the pending revert along with the debounce memory.
    pub fn cancel(&mut self) {
        self.last_raw = None;
        self.showing = None;
        self.revert_at = None;
    }

    pub fn revert_deadline(&self) -> Option<Instant> {
        self.revert_at
    }

    pub fn showing(&self) -> Option<&ScanOutcome> {
        self.showing.as_ref()
    }

    pub fn status(&self) -> DisplayStatus {
        self.showing
            .as_ref()
            .map_or(DisplayStatus::Idle, ScanOutcome::status)
    }
}
