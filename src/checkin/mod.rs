pub mod classify;
pub mod extract;
pub mod scanner;
pub mod station;
pub mod store;

pub use classify::classify;
pub use extract::extract;
pub use scanner::{ScanLoop, ScanReply, DEFAULT_DISPLAY_WINDOW};
pub use station::{CameraState, ScannerFault, Station, StationError, StationHandle, StationSnapshot};
pub use store::{Readiness, SessionStore};
