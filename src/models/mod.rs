pub mod event;
pub mod outcome;
pub mod session;
pub mod ticket;

pub use event::{storage_key, CachedEventData, ValidIdsPayload};
pub use outcome::{DisplayStatus, OutcomeKind, ScanOutcome};
pub use session::{AccessToken, DataSource, EventCheckInSession};
pub use ticket::TicketIdentifier;
