pub mod storage;
pub mod valid_ids;

pub use storage::LocalStorage;
pub use valid_ids::{HttpValidIdsClient, ValidIdsSource};
